use std::sync::Arc;

use topic_reconciler::memory::{MemoryCluster, MemoryPlacement, Operation};
use topic_reconciler::*;

fn racked_cluster() -> Arc<MemoryCluster> {
    let cluster = MemoryCluster::new();
    for id in 1..=4 {
        let rack = if id <= 2 { "a" } else { "b" };
        cluster.add_broker(BrokerInfo::new(id, Some(rack.to_string())));
    }
    Arc::new(cluster)
}

fn resource(cluster: &Arc<MemoryCluster>) -> TopicResource<Arc<MemoryCluster>, MemoryPlacement> {
    TopicResource::new(Reconciler::new(cluster.clone(), MemoryPlacement::new()))
}

#[test]
fn test_second_pass_is_a_no_op() {
    let cluster = racked_cluster();
    let resource = resource(&cluster);
    resource.create(TopicSpec::new("orders", 2, 1)).unwrap();

    let desired = TopicSpec::new("orders", 4, 3).with_config("retention.ms", "1000");
    let first = resource.update(desired.clone()).unwrap();
    assert_eq!(
        first
            .actions
            .iter()
            .map(|a| a.transition())
            .collect::<Vec<_>>(),
        vec![
            Transition::Configuration,
            Transition::ReplicationFactor,
            Transition::PartitionCount
        ]
    );

    cluster.clear_requests();
    let second = resource.update(desired.clone()).unwrap();
    assert!(second.is_empty());
    assert!(!cluster.requests().iter().any(|op| op.is_mutation()));

    let snapshot = resource.read("orders").unwrap().unwrap();
    assert_eq!(snapshot.to_spec(), desired);
}

#[test]
fn test_grow_then_shrink_preserves_leaders() {
    let cluster = racked_cluster();
    let resource = resource(&cluster);
    resource.create(TopicSpec::new("orders", 4, 2)).unwrap();
    let leaders: Vec<BrokerId> = cluster
        .topic_state("orders")
        .unwrap()
        .partitions
        .iter()
        .map(|p| p.leader)
        .collect();

    resource.update(TopicSpec::new("orders", 4, 4)).unwrap();
    resource.update(TopicSpec::new("orders", 4, 1)).unwrap();

    let topic = cluster.topic_state("orders").unwrap();
    for (partition, leader) in topic.partitions.iter().zip(leaders) {
        assert_eq!(partition.replicas, vec![leader]);
        assert_eq!(partition.leader, leader);
    }
}

#[test]
fn test_scenario_c_shrink_keeps_leader_and_tail() {
    let cluster = racked_cluster();
    cluster.add_broker(BrokerInfo::new(5, Some("b".to_string())));
    cluster.insert_topic(TopicState {
        name: "orders".to_string(),
        partitions: vec![PartitionInfo::new(0, 2, vec![2, 1, 3, 5, 4])],
        config: Default::default(),
        version: 7,
    });
    let resource = resource(&cluster);

    let report = resource.update(TopicSpec::new("orders", 1, 2)).unwrap();

    assert_eq!(cluster.topic_state("orders").unwrap().partitions[0].replicas, vec![2, 4]);
    assert_eq!(report.snapshot.version, 8);
    assert_eq!(report.snapshot.version, resource.describe("orders").unwrap().version);
}

#[test]
fn test_snapshot_carries_version_after_mutations() {
    let cluster = racked_cluster();
    let resource = resource(&cluster);
    resource.create(TopicSpec::new("orders", 1, 1)).unwrap();

    let report = resource.update(TopicSpec::new("orders", 2, 2)).unwrap();
    assert_eq!(report.snapshot.version, 2);
    assert_eq!(resource.read("orders").unwrap().unwrap().version, 2);

    let unchanged = resource.update(TopicSpec::new("orders", 2, 2)).unwrap();
    assert!(unchanged.is_empty());
    assert_eq!(unchanged.snapshot.version, 2);
}

#[test]
fn test_removed_config_key_converges() {
    let cluster = racked_cluster();
    let resource = resource(&cluster);
    resource
        .create(
            TopicSpec::new("orders", 1, 1)
                .with_config("cleanup.policy", "compact")
                .with_config("retention.ms", "1000"),
        )
        .unwrap();

    let desired = TopicSpec::new("orders", 1, 1).with_config("retention.ms", "1000");
    let first = resource.update(desired.clone()).unwrap();
    assert_eq!(first.actions.len(), 1);

    let second = resource.update(desired.clone()).unwrap();
    assert!(second.is_empty());
    assert_eq!(resource.read("orders").unwrap().unwrap().config, desired.config);
}

#[test]
fn test_partition_reduction_makes_no_requests_past_the_read() {
    let cluster = racked_cluster();
    let resource = resource(&cluster);
    resource.create(TopicSpec::new("orders", 6, 1)).unwrap();
    cluster.clear_requests();

    let err = resource.update(TopicSpec::new("orders", 3, 1)).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(cluster.requests(), vec![Operation::Topic]);
}

#[test]
fn test_inconsistent_replication_is_reported() {
    let cluster = racked_cluster();
    cluster.insert_topic(TopicState {
        name: "orders".to_string(),
        partitions: vec![
            PartitionInfo::new(0, 1, vec![1, 2, 3]),
            PartitionInfo::new(1, 1, vec![1, 2]),
        ],
        config: Default::default(),
        version: 0,
    });
    let resource = resource(&cluster);

    let err = resource.update(TopicSpec::new("orders", 2, 3)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InconsistentState);
    assert!(resource.read("orders").is_err());
}

#[test]
fn test_partial_reassignment_lists_every_rejection() {
    let cluster = racked_cluster();
    let resource = resource(&cluster);
    resource.create(TopicSpec::new("orders", 3, 1)).unwrap();
    cluster.reject_partition(0);
    cluster.reject_partition(2);

    let err = resource.update(TopicSpec::new("orders", 3, 2)).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PartialMutation);
    assert_eq!(err.transition(), Some(Transition::ReplicationFactor));
    match err.root() {
        ReconcileError::PartialMutation { failures, .. } => {
            let entries: Vec<_> = failures.iter().map(|f| f.entry.as_str()).collect();
            assert_eq!(entries, vec!["0", "2"]);
        }
        other => panic!("unexpected error: {}", other),
    }

    // Partition 1 was accepted and is not rolled back
    let topic = cluster.topic_state("orders").unwrap();
    assert_eq!(topic.partitions[1].replicas.len(), 2);
    assert_eq!(topic.partitions[0].replicas.len(), 1);
}

#[test]
fn test_strategy_failure_aborts_before_mutation() {
    let cluster = racked_cluster();
    TopicResource::new(Reconciler::new(cluster.clone(), MemoryPlacement::new()))
        .create(TopicSpec::new("orders", 1, 1))
        .unwrap();
    let resource = TopicResource::new(Reconciler::new(
        cluster.clone(),
        MemoryPlacement::new().failing_assign("not enough racks"),
    ));
    cluster.clear_requests();

    let err = resource.update(TopicSpec::new("orders", 1, 2)).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Strategy);
    assert!(!cluster.requests().iter().any(|op| op.is_mutation()));
}

#[test]
fn test_transport_failure_during_transition() {
    let cluster = racked_cluster();
    let resource = resource(&cluster);
    resource.create(TopicSpec::new("orders", 1, 1)).unwrap();
    cluster.fail(Operation::AddPartitions, "broker unavailable");

    let err = resource.update(TopicSpec::new("orders", 2, 1)).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(err.transition(), Some(Transition::PartitionCount));
    assert!(err.to_string().starts_with("unable to update topic orders partition count"));
}

#[test]
fn test_shared_client_across_threads() {
    let cluster = racked_cluster();
    let setup = resource(&cluster);
    for name in ["orders", "payments", "audit"] {
        setup.create(TopicSpec::new(name, 1, 1)).unwrap();
    }

    let handles: Vec<_> = ["orders", "payments", "audit"]
        .into_iter()
        .map(|name| {
            let cluster = cluster.clone();
            std::thread::spawn(move || {
                resource(&cluster)
                    .update(TopicSpec::new(name, 3, 2))
                    .map(|report| report.actions.len())
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), 2);
    }
    for name in ["orders", "payments", "audit"] {
        let snapshot = setup.describe(name).unwrap();
        assert_eq!((snapshot.partitions, snapshot.replication_factor), (3, 2));
    }
}
