use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use super::{Assignment, BrokerId, PartitionId, TopicName};

/// Desired state of a topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSpec {
    pub name: TopicName,
    pub partitions: u32,
    pub replication_factor: u32,
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

impl TopicSpec {
    pub fn new(name: impl Into<TopicName>, partitions: u32, replication_factor: u32) -> Self {
        Self {
            name: name.into(),
            partitions,
            replication_factor,
            config: BTreeMap::new(),
        }
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }
}

/// Live state of a topic as read from the cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicState {
    pub name: TopicName,
    pub partitions: Vec<PartitionInfo>,
    pub config: BTreeMap<String, String>,
    pub version: i64,
}

impl TopicState {
    pub fn partition_count(&self) -> u32 {
        self.partitions.len() as u32
    }

    /// Current placement of every partition, in partition order
    pub fn to_assignments(&self) -> Vec<Assignment> {
        self.partitions
            .iter()
            .map(|p| Assignment::new(p.id, p.replicas.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionInfo {
    pub id: PartitionId,
    pub leader: BrokerId,
    pub replicas: Vec<BrokerId>,
}

impl PartitionInfo {
    pub fn new(id: PartitionId, leader: BrokerId, replicas: Vec<BrokerId>) -> Self {
        Self {
            id,
            leader,
            replicas,
        }
    }
}

/// Resource state handed back to the caller for persistence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSnapshot {
    pub name: TopicName,
    pub partitions: u32,
    pub replication_factor: u32,
    pub config: BTreeMap<String, String>,
    pub version: i64,
}

impl TopicSnapshot {
    pub fn from_spec(spec: &TopicSpec, version: i64) -> Self {
        Self {
            name: spec.name.clone(),
            partitions: spec.partitions,
            replication_factor: spec.replication_factor,
            config: spec.config.clone(),
            version,
        }
    }

    /// The desired spec that would reproduce this snapshot
    pub fn to_spec(&self) -> TopicSpec {
        TopicSpec {
            name: self.name.clone(),
            partitions: self.partitions,
            replication_factor: self.replication_factor,
            config: self.config.clone(),
        }
    }
}
