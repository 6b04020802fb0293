use chrono::Utc;
use tracing::{debug, info, warn};

use crate::actions::{Action, ReconcileReport};
use crate::adjust::{grow_replicas, shrink_replicas};
use crate::admin::AdminClient;
use crate::config::ReconcilerConfig;
use crate::error::{ReconcileError, Result, Transition};
use crate::inspect::effective_replication_factor;
use crate::models::*;
use crate::placement::{new_partitions, rack_collisions, PlacementStrategies};

/// Converges one topic's live state to its desired spec.
///
/// A pass runs up to three transitions in a fixed order: configuration,
/// replication factor, partition count. Each one reads what it needs fresh
/// from the admin client. A failed transition stops the pass; whatever was
/// applied before it stays applied.
pub struct Reconciler<A, P> {
    admin: A,
    placement: P,
    config: ReconcilerConfig,
}

impl<A: AdminClient, P: PlacementStrategies> Reconciler<A, P> {
    pub fn new(admin: A, placement: P) -> Self {
        Self {
            admin,
            placement,
            config: ReconcilerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ReconcilerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn admin(&self) -> &A {
        &self.admin
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Transitions a pass would run, without touching the cluster
    pub fn plan(&self, desired: &TopicSpec, live: &TopicState) -> Result<Vec<Transition>> {
        validate(desired, live)?;

        let mut transitions = Vec::new();
        if desired.config != live.config {
            transitions.push(Transition::Configuration);
        }

        let present = effective_replication_factor(live)
            .map_err(|e| e.in_transition(&desired.name, Transition::ReplicationFactor))?;
        if desired.replication_factor != present {
            transitions.push(Transition::ReplicationFactor);
        }

        if desired.partitions != live.partition_count() {
            transitions.push(Transition::PartitionCount);
        }

        Ok(transitions)
    }

    /// Run one reconciliation pass
    pub fn reconcile(&self, desired: TopicSpec, live: &TopicState) -> Result<ReconcileReport> {
        let started_at = Utc::now();
        let transitions = self.plan(&desired, live)?;

        if transitions.is_empty() {
            debug!(topic = %desired.name, "Topic is up to date");
        }

        let mut actions = Vec::new();
        for transition in transitions {
            let applied = match transition {
                Transition::Configuration => self.sync_config(&desired),
                Transition::ReplicationFactor => self.change_replication_factor(&desired),
                Transition::PartitionCount => self.change_partition_count(&desired),
            }
            .map_err(|e| e.in_transition(&desired.name, transition))?;

            if let Some(action) = applied {
                info!(topic = %desired.name, %transition, "{}", action.description());
                actions.push(action);
            }
        }

        let version = if actions.is_empty() {
            live.version
        } else {
            self.admin.topic(&desired.name, false)?.version
        };
        let snapshot = TopicSnapshot::from_spec(&desired, version);
        Ok(ReconcileReport::new(snapshot, actions, started_at))
    }

    fn sync_config(&self, desired: &TopicSpec) -> Result<Option<Action>> {
        debug!(topic = %desired.name, entries = desired.config.len(), "Altering topic config");

        let failures = self.admin.alter_config(&desired.name, &desired.config)?;
        if !failures.is_empty() {
            for failure in &failures {
                warn!(topic = %desired.name, entry = %failure.entry, "Config entry rejected: {}", failure.message);
            }
            return Err(ReconcileError::PartialMutation {
                operation: "alter config",
                failures,
            });
        }

        Ok(Some(Action::AlterConfig {
            topic: desired.name.clone(),
            entries: desired.config.clone(),
        }))
    }

    fn change_replication_factor(&self, desired: &TopicSpec) -> Result<Option<Action>> {
        let name = &desired.name;

        let broker_ids = self.admin.broker_ids()?;
        if desired.replication_factor as usize > broker_ids.len() {
            return Err(ReconcileError::CapacityExceeded {
                desired: desired.replication_factor,
                brokers: broker_ids.len(),
            });
        }

        let topic = self.admin.topic(name, false)?;
        let present = effective_replication_factor(&topic)?;
        if present == desired.replication_factor {
            debug!(topic = %name, replication_factor = present, "Replication factor already converged");
            return Ok(None);
        }

        let brokers = self.admin.brokers(&broker_ids)?;
        let other_topics: Vec<TopicState> = self
            .admin
            .topics(None, false)?
            .into_iter()
            .filter(|t| t.name != *name)
            .collect();
        debug!(
            topic = %name,
            brokers = brokers.len(),
            other_topics = other_topics.len(),
            "Read cluster inventory"
        );

        let target = desired.replication_factor as usize;
        let growing = desired.replication_factor > present;
        let adjusted = topic
            .partitions
            .iter()
            .map(|p| {
                let replicas = if growing {
                    grow_replicas(target, &p.replicas, &broker_ids)
                } else {
                    shrink_replicas(target, &p.replicas, p.leader)
                };
                if replicas.len() != target {
                    return Err(ReconcileError::ReplicaCountUnreachable {
                        partition: p.id,
                        desired: desired.replication_factor,
                        reached: replicas.len(),
                    });
                }
                Ok(Assignment::new(p.id, replicas))
            })
            .collect::<Result<Vec<_>>>()?;

        let assigner = self.placement.assigner(&brokers, &other_topics);
        debug!(topic = %name, strategy = assigner.name(), "Assigning replicas");
        let assignments = assigner.assign(name, adjusted)?;

        for collision in rack_collisions(&assignments, &brokers) {
            warn!(
                topic = %name,
                partition = collision.partition,
                rack = %collision.rack,
                brokers = ?collision.brokers,
                "Multiple replicas placed in one rack"
            );
        }

        let failures = self
            .admin
            .reassign_partitions(name, &assignments, self.config.reassignment_timeout)?;
        if !failures.is_empty() {
            for failure in &failures {
                warn!(topic = %name, partition = %failure.entry, "Reassignment rejected: {}", failure.message);
            }
            return Err(ReconcileError::PartialMutation {
                operation: "reassign partitions",
                failures,
            });
        }

        Ok(Some(Action::ReassignPartitions {
            topic: name.clone(),
            from_replication_factor: present,
            to_replication_factor: desired.replication_factor,
            assignments,
        }))
    }

    fn change_partition_count(&self, desired: &TopicSpec) -> Result<Option<Action>> {
        let name = &desired.name;

        let broker_ids = self.admin.broker_ids()?;
        let brokers = self.admin.brokers(&broker_ids)?;
        let topic = self.admin.topic(name, false)?;

        let live = topic.partition_count();
        if desired.partitions < live {
            return Err(ReconcileError::PartitionReduction {
                live,
                desired: desired.partitions,
            });
        }
        if desired.partitions == live {
            debug!(topic = %name, partitions = live, "Partition count already converged");
            return Ok(None);
        }

        let extra = (desired.partitions - live) as usize;
        let current = topic.to_assignments();
        let extender = self.placement.extender(&brokers, self.config.rack_aware_extension);
        debug!(topic = %name, strategy = extender.name(), extra, "Extending partitions");

        let extended = extender.extend(name, &current, extra)?;
        let added = new_partitions(&current, extended, extra)?;

        for collision in rack_collisions(&added, &brokers) {
            warn!(
                topic = %name,
                partition = collision.partition,
                rack = %collision.rack,
                brokers = ?collision.brokers,
                "Multiple replicas placed in one rack"
            );
        }

        self.admin.add_partitions(name, &added)?;

        Ok(Some(Action::AddPartitions {
            topic: name.clone(),
            from_count: live,
            to_count: desired.partitions,
            assignments: added,
        }))
    }
}

/// Static checks that need no cluster reads
fn validate(desired: &TopicSpec, live: &TopicState) -> Result<()> {
    if desired.name.is_empty() {
        return Err(ReconcileError::InvalidSpec("topic name is empty".to_string()));
    }
    if desired.name != live.name {
        return Err(ReconcileError::InvalidSpec(format!(
            "topic name can't change from {} to {}",
            live.name, desired.name
        )));
    }
    if desired.partitions == 0 {
        return Err(ReconcileError::InvalidSpec(
            "partition count must be at least 1".to_string(),
        ));
    }
    if desired.replication_factor == 0 {
        return Err(ReconcileError::InvalidSpec(
            "replication factor must be at least 1".to_string(),
        ));
    }
    if desired.partitions < live.partition_count() {
        return Err(ReconcileError::PartitionReduction {
            live: live.partition_count(),
            desired: desired.partitions,
        });
    }
    Ok(())
}
