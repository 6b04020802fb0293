//! Pluggable placement strategies and checks on what they return.
//!
//! The strategies themselves live outside this crate. The reconciler builds
//! them per pass from fresh broker and topic inventory.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::StrategyError;
use crate::models::{Assignment, BrokerId, BrokerInfo, PartitionId, TopicState};

/// Result type for strategy calls
pub type StrategyResult<T> = std::result::Result<T, StrategyError>;

/// Resolves adjusted replica lists into a topology-valid assignment.
///
/// Used for replication factor changes. The returned assignment is applied
/// as-is.
pub trait ReplicaAssigner: Send + Sync {
    /// Name of this strategy
    fn name(&self) -> &str;

    fn assign(&self, topic: &str, assignments: Vec<Assignment>) -> StrategyResult<Vec<Assignment>>;
}

/// Proposes placement for new partitions.
///
/// `extend` returns the current assignments followed by `extra` new ones.
pub trait PartitionExtender: Send + Sync {
    /// Name of this strategy
    fn name(&self) -> &str;

    fn extend(&self, topic: &str, current: &[Assignment], extra: usize) -> StrategyResult<Vec<Assignment>>;
}

/// Builds strategies from the inventory read during a pass
pub trait PlacementStrategies: Send + Sync {
    /// `other_topics` never contains the topic being reconciled, so its
    /// current placement is not counted twice.
    fn assigner(&self, brokers: &[BrokerInfo], other_topics: &[TopicState]) -> Box<dyn ReplicaAssigner>;

    fn extender(&self, brokers: &[BrokerInfo], rack_aware: bool) -> Box<dyn PartitionExtender>;
}

/// Several replicas of one partition placed in the same rack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RackCollision {
    pub partition: PartitionId,
    pub rack: String,
    pub brokers: Vec<BrokerId>,
}

/// Find partitions that place more than one replica in a rack.
///
/// Brokers without a rack, or missing from `brokers`, are ignored.
pub fn rack_collisions(assignments: &[Assignment], brokers: &[BrokerInfo]) -> Vec<RackCollision> {
    let racks: HashMap<BrokerId, &str> = brokers
        .iter()
        .filter_map(|b| b.rack().map(|rack| (b.id, rack)))
        .collect();

    let mut collisions = Vec::new();
    for assignment in assignments {
        let mut by_rack: BTreeMap<&str, Vec<BrokerId>> = BTreeMap::new();
        for replica in &assignment.replicas {
            if let Some(rack) = racks.get(replica) {
                by_rack.entry(*rack).or_default().push(*replica);
            }
        }

        for (rack, members) in by_rack {
            if members.len() > 1 {
                collisions.push(RackCollision {
                    partition: assignment.partition,
                    rack: rack.to_string(),
                    brokers: members,
                });
            }
        }
    }

    collisions
}

/// Pick the newly proposed partitions out of an extender result.
///
/// Extenders append new partitions after the existing ones. This checks that
/// contract (length, untouched prefix, fresh partition ids) rather than
/// trusting it.
pub fn new_partitions(
    current: &[Assignment],
    mut extended: Vec<Assignment>,
    extra: usize,
) -> StrategyResult<Vec<Assignment>> {
    let expected = current.len() + extra;
    if extended.len() != expected {
        return Err(StrategyError::UnexpectedLength {
            expected,
            actual: extended.len(),
        });
    }

    for (existing, proposed) in current.iter().zip(&extended) {
        if existing.partition != proposed.partition {
            return Err(StrategyError::ExistingPartitionChanged(existing.partition));
        }
    }

    let tail = extended.split_off(current.len());
    let mut seen: HashSet<PartitionId> = current.iter().map(|a| a.partition).collect();
    for assignment in &tail {
        if !seen.insert(assignment.partition) {
            return Err(StrategyError::DuplicatePartition(assignment.partition));
        }
    }

    Ok(tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brokers() -> Vec<BrokerInfo> {
        vec![
            BrokerInfo::new(1, Some("a".to_string())),
            BrokerInfo::new(2, Some("a".to_string())),
            BrokerInfo::new(3, Some("b".to_string())),
            BrokerInfo::new(4, Some(String::new())),
        ]
    }

    #[test]
    fn test_rack_collisions() {
        let assignments = vec![
            Assignment::new(0, vec![1, 3]),
            Assignment::new(1, vec![1, 2, 3]),
            Assignment::new(2, vec![4, 3]),
        ];

        let collisions = rack_collisions(&assignments, &brokers());
        assert_eq!(
            collisions,
            vec![RackCollision {
                partition: 1,
                rack: "a".to_string(),
                brokers: vec![1, 2],
            }]
        );
    }

    #[test]
    fn test_no_collisions_without_racks() {
        let brokers = vec![BrokerInfo::new(1, None), BrokerInfo::new(2, None)];
        let assignments = vec![Assignment::new(0, vec![1, 2])];
        assert!(rack_collisions(&assignments, &brokers).is_empty());
    }

    #[test]
    fn test_new_partitions_takes_tail() {
        let current = vec![Assignment::new(0, vec![1]), Assignment::new(1, vec![2])];
        let mut extended = current.clone();
        extended.push(Assignment::new(2, vec![3]));
        extended.push(Assignment::new(3, vec![1]));

        let tail = new_partitions(&current, extended, 2).unwrap();
        assert_eq!(tail, vec![Assignment::new(2, vec![3]), Assignment::new(3, vec![1])]);
    }

    #[test]
    fn test_new_partitions_rejects_wrong_length() {
        let current = vec![Assignment::new(0, vec![1])];
        let extended = vec![Assignment::new(0, vec![1]), Assignment::new(1, vec![2])];

        assert!(matches!(
            new_partitions(&current, extended, 2),
            Err(StrategyError::UnexpectedLength {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_new_partitions_rejects_interleaving() {
        let current = vec![Assignment::new(0, vec![1]), Assignment::new(1, vec![2])];
        let extended = vec![
            Assignment::new(0, vec![1]),
            Assignment::new(2, vec![3]),
            Assignment::new(1, vec![2]),
        ];

        assert!(matches!(
            new_partitions(&current, extended, 1),
            Err(StrategyError::ExistingPartitionChanged(1))
        ));
    }

    #[test]
    fn test_new_partitions_rejects_reused_id() {
        let current = vec![Assignment::new(0, vec![1])];
        let extended = vec![
            Assignment::new(0, vec![1]),
            Assignment::new(1, vec![2]),
            Assignment::new(1, vec![3]),
        ];

        assert!(matches!(
            new_partitions(&current, extended, 2),
            Err(StrategyError::DuplicatePartition(1))
        ));
    }
}
