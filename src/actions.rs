use crate::error::Transition;
use crate::models::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A mutation issued against the cluster during a reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Overwrite topic configuration entries
    AlterConfig {
        topic: TopicName,
        entries: BTreeMap<String, String>,
    },

    /// Move every partition to a new replica set
    ReassignPartitions {
        topic: TopicName,
        from_replication_factor: u32,
        to_replication_factor: u32,
        assignments: Vec<Assignment>,
    },

    /// Create new partitions
    AddPartitions {
        topic: TopicName,
        from_count: u32,
        to_count: u32,
        assignments: Vec<Assignment>,
    },
}

impl Action {
    pub fn transition(&self) -> Transition {
        match self {
            Action::AlterConfig { .. } => Transition::Configuration,
            Action::ReassignPartitions { .. } => Transition::ReplicationFactor,
            Action::AddPartitions { .. } => Transition::PartitionCount,
        }
    }

    /// Get the brokers that receive replicas from this action
    pub fn affected_brokers(&self) -> Vec<BrokerId> {
        match self {
            Action::AlterConfig { .. } => Vec::new(),
            Action::ReassignPartitions { assignments, .. }
            | Action::AddPartitions { assignments, .. } => assignments
                .iter()
                .flat_map(|a| a.replicas.iter().copied())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> String {
        match self {
            Action::AlterConfig { topic, entries } => {
                format!("Set {} config entries on {}", entries.len(), topic)
            }
            Action::ReassignPartitions {
                topic,
                from_replication_factor,
                to_replication_factor,
                assignments,
            } => format!(
                "Reassign {} partitions of {} from replication factor {} to {}",
                assignments.len(),
                topic,
                from_replication_factor,
                to_replication_factor
            ),
            Action::AddPartitions {
                topic,
                from_count,
                to_count,
                ..
            } => format!(
                "Add {} partitions to {} ({} -> {})",
                to_count - from_count,
                topic,
                from_count,
                to_count
            ),
        }
    }
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// State to persist for the resource
    pub snapshot: TopicSnapshot,
    /// Mutations accepted by the cluster, in the order they were issued
    pub actions: Vec<Action>,
    pub metadata: ReportMetadata,
}

impl ReconcileReport {
    pub(crate) fn new(snapshot: TopicSnapshot, actions: Vec<Action>, started_at: DateTime<Utc>) -> Self {
        Self {
            snapshot,
            actions,
            metadata: ReportMetadata {
                started_at,
                finished_at: Utc::now(),
            },
        }
    }

    /// Check if the pass changed nothing
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn summary(&self) -> ReportSummary {
        let mut config_changes = 0;
        let mut reassigned_partitions = 0;
        let mut added_partitions = 0;

        for action in &self.actions {
            match action {
                Action::AlterConfig { entries, .. } => config_changes += entries.len(),
                Action::ReassignPartitions { assignments, .. } => {
                    reassigned_partitions += assignments.len()
                }
                Action::AddPartitions { assignments, .. } => added_partitions += assignments.len(),
            }
        }

        ReportSummary {
            topic: self.snapshot.name.clone(),
            total_actions: self.actions.len(),
            config_changes,
            reassigned_partitions,
            added_partitions,
            duration_ms: (self.metadata.finished_at - self.metadata.started_at).num_milliseconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub topic: TopicName,
    pub total_actions: usize,
    pub config_changes: usize,
    pub reassigned_partitions: usize,
    pub added_partitions: usize,
    pub duration_ms: i64,
}

impl std::fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Topic: {}, Actions: {}, Config Entries: {}, Reassigned: {}, Added: {}, Duration: {}ms",
            self.topic,
            self.total_actions,
            self.config_changes,
            self.reassigned_partitions,
            self.added_partitions,
            self.duration_ms
        )
    }
}
