// Type aliases used across models
pub type BrokerId = i32;
pub type TopicName = String;
pub type PartitionId = i32;

// Module declarations
mod assignment;
mod broker;
mod topic;

// Re-exports
pub use assignment::Assignment;
pub use broker::BrokerInfo;
pub use topic::{PartitionInfo, TopicSnapshot, TopicSpec, TopicState};
