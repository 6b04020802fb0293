use crate::error::{ReconcileError, Result};
use crate::models::TopicState;

/// Replication factor of a topic as seen in its live partition metadata.
///
/// Every partition must carry the same number of replicas; the first
/// partition that disagrees with partition 0 is reported.
pub fn effective_replication_factor(topic: &TopicState) -> Result<u32> {
    let mut partitions = topic.partitions.iter();
    let first = partitions
        .next()
        .ok_or_else(|| ReconcileError::EmptyTopic(topic.name.clone()))?;
    let expected = first.replicas.len();

    for partition in partitions {
        if partition.replicas.len() != expected {
            return Err(ReconcileError::InconsistentReplication {
                partition: partition.id,
                expected,
                found: partition.replicas.len(),
            });
        }
    }

    Ok(expected as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::PartitionInfo;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn topic(replicas: Vec<Vec<i32>>) -> TopicState {
        TopicState {
            name: "orders".to_string(),
            partitions: replicas
                .into_iter()
                .enumerate()
                .map(|(i, r)| PartitionInfo::new(i as i32, r[0], r))
                .collect(),
            config: BTreeMap::new(),
            version: 0,
        }
    }

    #[test]
    fn test_uniform_topic() {
        let state = topic(vec![vec![1, 2, 3], vec![2, 3, 1], vec![3, 1, 2]]);
        assert_eq!(effective_replication_factor(&state).unwrap(), 3);
    }

    #[test]
    fn test_reports_first_mismatch() {
        let state = topic(vec![vec![1, 2], vec![2, 3], vec![3], vec![1]]);
        let err = effective_replication_factor(&state).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InconsistentState);
        assert!(matches!(
            err,
            ReconcileError::InconsistentReplication {
                partition: 2,
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn test_empty_topic_is_an_error() {
        let state = topic(vec![]);
        assert!(matches!(
            effective_replication_factor(&state),
            Err(ReconcileError::EmptyTopic(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_uniform_lengths(len in 1usize..6, partitions in 1usize..20) {
            let state = topic((0..partitions).map(|_| (0..len as i32).collect()).collect());
            prop_assert_eq!(effective_replication_factor(&state).unwrap(), len as u32);
        }

        #[test]
        fn prop_any_deviation_fails(len in 2usize..6, partitions in 2usize..20, odd in 1usize..20) {
            let odd = odd % partitions;
            let state = topic(
                (0..partitions)
                    .map(|i| {
                        let n = if i == odd { len - 1 } else { len };
                        (0..n as i32).collect()
                    })
                    .collect(),
            );
            prop_assert!(effective_replication_factor(&state).is_err());
        }
    }
}
