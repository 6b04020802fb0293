use serde::{Deserialize, Serialize};
use super::{BrokerId, PartitionId};

/// Desired replica placement for one partition.
///
/// The first replica is the preferred leader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub partition: PartitionId,
    pub replicas: Vec<BrokerId>,
}

impl Assignment {
    pub fn new(partition: PartitionId, replicas: Vec<BrokerId>) -> Self {
        Self {
            partition,
            replicas,
        }
    }

    pub fn contains(&self, broker: BrokerId) -> bool {
        self.replicas.contains(&broker)
    }
}
