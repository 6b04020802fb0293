use std::sync::Arc;

use topic_reconciler::memory::{MemoryCluster, MemoryPlacement};
use topic_reconciler::*;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("Kafka Topic Reconciler - Example Usage\n");

    match ClientConfig::from_env() {
        Ok(client) => println!("Client config: {:?}\n", client),
        Err(e) => println!("Client config error: {}\n", e),
    }

    // Create a sample cluster with three racks
    let cluster = Arc::new(create_sample_cluster());
    let resource = TopicResource::new(
        Reconciler::new(cluster.clone(), MemoryPlacement::new()).with_config(ReconcilerConfig::from_env()),
    );

    println!("=== Creating Topic ===");
    let created = resource
        .create(TopicSpec::new("orders", 3, 2).with_config("retention.ms", "86400000"))
        .and_then(|_| resource.describe("orders"));
    match created {
        Ok(snapshot) => println!("{:?}\n", snapshot),
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    }

    let steps = [
        (
            "Growing Replication Factor and Partitions",
            TopicSpec::new("orders", 5, 3).with_config("retention.ms", "86400000"),
        ),
        (
            "Changing Config and Shrinking Replication Factor",
            TopicSpec::new("orders", 5, 2)
                .with_config("retention.ms", "3600000")
                .with_config("cleanup.policy", "compact"),
        ),
        (
            "Reducing Partitions",
            TopicSpec::new("orders", 2, 2),
        ),
    ];

    for (title, desired) in steps {
        println!("=== {} ===", title);
        match resource.update(desired) {
            Ok(report) => {
                println!("{}", report.summary());
                for (i, action) in report.actions.iter().enumerate() {
                    println!("{}. {}", i + 1, action.description());
                }
                print_topic(&cluster);
            }
            Err(e) => println!("Error ({:?}): {}", e.kind(), e),
        }
        println!();
    }
}

fn create_sample_cluster() -> MemoryCluster {
    let cluster = MemoryCluster::new();
    for id in 1..=6 {
        let rack = format!("rack-{}", (id - 1) % 3 + 1);
        cluster.add_broker(BrokerInfo::new(id, Some(rack)));
    }
    cluster
}

fn print_topic(cluster: &MemoryCluster) {
    if let Some(topic) = cluster.topic_state("orders") {
        for partition in &topic.partitions {
            println!(
                "  partition {} leader {} replicas {:?}",
                partition.id, partition.leader, partition.replicas
            );
        }
        println!("  config {:?}", topic.config);
    }
}
