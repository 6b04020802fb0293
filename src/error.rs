//! Error types

use std::fmt;
use thiserror::Error;

use crate::models::{BrokerId, PartitionId, TopicName};

/// Result type for reconciliation operations
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Broad classification of a [`ReconcileError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The desired spec breaks a static invariant. Never retried.
    Validation,
    /// Live cluster state failed a consistency check
    InconsistentState,
    /// The admin API call failed or was refused outright
    Transport,
    /// Some entries of a multi-entry mutation failed; the rest were applied
    PartialMutation,
    /// A placement strategy rejected the request before any mutation
    Strategy,
}

/// Which convergence step of a reconciliation pass failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Configuration,
    ReplicationFactor,
    PartitionCount,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Transition::Configuration => "configuration",
            Transition::ReplicationFactor => "replication factor",
            Transition::PartitionCount => "partition count",
        };
        f.write_str(name)
    }
}

/// A single rejected entry inside an otherwise accepted admin request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryError {
    /// Config key, partition id or topic name the error refers to
    pub entry: String,
    pub message: String,
}

impl EntryError {
    pub fn new(entry: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            entry: entry.into(),
            message: message.into(),
        }
    }

    pub fn partition(partition: PartitionId, message: impl Into<String>) -> Self {
        Self::new(partition.to_string(), message)
    }
}

impl fmt::Display for EntryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.entry, self.message)
    }
}

fn join_entries(failures: &[EntryError]) -> String {
    failures
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Failures reported by the admin client
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("topic not found: {0}")]
    TopicNotFound(TopicName),

    #[error("broker not found: {0}")]
    BrokerNotFound(BrokerId),

    #[error("request timeout")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request failed: {0}")]
    Request(String),
}

/// Failures reported by a placement strategy
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("not enough racks: need {required}, have {available}")]
    InsufficientRacks { required: usize, available: usize },

    #[error("not enough brokers: need {required}, have {available}")]
    InsufficientBrokers { required: usize, available: usize },

    #[error("extended assignment has {actual} partitions, expected {expected}")]
    UnexpectedLength { expected: usize, actual: usize },

    #[error("extended assignment changed existing partition {0}")]
    ExistingPartitionChanged(PartitionId),

    #[error("extended assignment reuses partition id {0}")]
    DuplicatePartition(PartitionId),

    #[error("{0}")]
    Rejected(String),
}

/// Reconciliation errors
#[derive(Debug, Error)]
pub enum ReconcileError {
    // ==================== Validation ====================
    #[error("invalid topic spec: {0}")]
    InvalidSpec(String),

    #[error("replication factor {desired} exceeds broker count {brokers}")]
    CapacityExceeded { desired: u32, brokers: usize },

    #[error("partition count can't be reduced from {live} to {desired}")]
    PartitionReduction { live: u32, desired: u32 },

    // ==================== Inconsistent state ====================
    #[error("replica count isn't the same across partitions: {expected} != {found} (partition {partition})")]
    InconsistentReplication {
        partition: PartitionId,
        expected: usize,
        found: usize,
    },

    #[error("topic {0} has no partitions")]
    EmptyTopic(TopicName),

    #[error("partition {partition} ended up with {reached} replicas instead of {desired}")]
    ReplicaCountUnreachable {
        partition: PartitionId,
        desired: u32,
        reached: usize,
    },

    // ==================== Transport ====================
    #[error("admin request failed: {0}")]
    Admin(#[from] AdminError),

    #[error("{operation} rejected: {}", join_entries(.failures))]
    Rejected {
        operation: &'static str,
        failures: Vec<EntryError>,
    },

    // ==================== Partial mutation ====================
    #[error("{operation} partially failed: {}", join_entries(.failures))]
    PartialMutation {
        operation: &'static str,
        failures: Vec<EntryError>,
    },

    // ==================== Strategy ====================
    #[error("placement strategy failed: {0}")]
    Strategy(#[from] StrategyError),

    #[error("unable to update topic {topic} {transition}: {source}")]
    Transition {
        topic: TopicName,
        transition: Transition,
        #[source]
        source: Box<ReconcileError>,
    },
}

impl ReconcileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReconcileError::InvalidSpec(_)
            | ReconcileError::CapacityExceeded { .. }
            | ReconcileError::PartitionReduction { .. } => ErrorKind::Validation,
            ReconcileError::InconsistentReplication { .. }
            | ReconcileError::EmptyTopic(_)
            | ReconcileError::ReplicaCountUnreachable { .. } => ErrorKind::InconsistentState,
            ReconcileError::Admin(_) | ReconcileError::Rejected { .. } => ErrorKind::Transport,
            ReconcileError::PartialMutation { .. } => ErrorKind::PartialMutation,
            ReconcileError::Strategy(_) => ErrorKind::Strategy,
            ReconcileError::Transition { source, .. } => source.kind(),
        }
    }

    /// The transition this error was raised in, if any
    pub fn transition(&self) -> Option<Transition> {
        match self {
            ReconcileError::Transition { transition, .. } => Some(*transition),
            _ => None,
        }
    }

    /// Innermost error, looking through transition context
    pub fn root(&self) -> &ReconcileError {
        match self {
            ReconcileError::Transition { source, .. } => source.root(),
            other => other,
        }
    }

    pub(crate) fn in_transition(self, topic: &str, transition: Transition) -> Self {
        ReconcileError::Transition {
            topic: topic.to_string(),
            transition,
            source: Box::new(self),
        }
    }
}

/// Errors raised while loading client configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to detect SASL mechanism: {0}")]
    UnknownSaslMechanism(String),

    #[error("SASL mechanism {mechanism} requires {field}")]
    MissingCredential {
        mechanism: &'static str,
        field: &'static str,
    },

    #[error("no bootstrap servers configured")]
    NoBootstrapServers,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_looks_through_transition() {
        let err = ReconcileError::CapacityExceeded {
            desired: 4,
            brokers: 3,
        }
        .in_transition("orders", Transition::ReplicationFactor);

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.transition(), Some(Transition::ReplicationFactor));
        assert!(matches!(
            err.root(),
            ReconcileError::CapacityExceeded { desired: 4, .. }
        ));
        assert_eq!(
            err.to_string(),
            "unable to update topic orders replication factor: replication factor 4 exceeds broker count 3"
        );
    }

    #[test]
    fn test_partial_mutation_lists_every_entry() {
        let err = ReconcileError::PartialMutation {
            operation: "reassign partitions",
            failures: vec![
                EntryError::partition(0, "invalid replica"),
                EntryError::partition(3, "broker offline"),
            ],
        };

        assert_eq!(err.kind(), ErrorKind::PartialMutation);
        assert_eq!(
            err.to_string(),
            "reassign partitions partially failed: 0: invalid replica, 3: broker offline"
        );
    }

    #[test]
    fn test_admin_and_strategy_conversions() {
        let admin: ReconcileError = AdminError::Timeout.into();
        assert_eq!(admin.kind(), ErrorKind::Transport);

        let strategy: ReconcileError = StrategyError::InsufficientRacks {
            required: 3,
            available: 2,
        }
        .into();
        assert_eq!(strategy.kind(), ErrorKind::Strategy);
    }
}
