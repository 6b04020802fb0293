// Kafka Topic Reconciler Library
// Converges a topic's live partitions, replicas and config to a declared spec

pub mod actions;
pub mod adjust;
pub mod admin;
pub mod config;
pub mod error;
pub mod inspect;
pub mod memory;
pub mod models;
pub mod placement;
pub mod reconciler;
pub mod resource;

pub use actions::{Action, ReconcileReport, ReportSummary};
pub use adjust::{grow_replicas, shrink_replicas};
pub use admin::{AdminClient, AdminResult};
pub use config::{ClientConfig, ReconcilerConfig, SaslMechanism};
pub use error::{AdminError, ConfigError, EntryError, ErrorKind, ReconcileError, Result, StrategyError, Transition};
pub use inspect::effective_replication_factor;
pub use models::{Assignment, BrokerId, BrokerInfo, PartitionId, PartitionInfo, TopicSnapshot, TopicSpec, TopicState};
pub use placement::{PartitionExtender, PlacementStrategies, ReplicaAssigner};
pub use reconciler::Reconciler;
pub use resource::TopicResource;
