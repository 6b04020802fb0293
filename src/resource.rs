//! Declarative topic resource.
//!
//! Wraps a [`Reconciler`] with the create, read, update and delete lifecycle
//! a resource framework drives, plus import and a read-only describe.

use tracing::{debug, info, warn};

use crate::actions::ReconcileReport;
use crate::admin::AdminClient;
use crate::error::{AdminError, ReconcileError, Result};
use crate::inspect::effective_replication_factor;
use crate::models::*;
use crate::placement::PlacementStrategies;
use crate::reconciler::Reconciler;

pub struct TopicResource<A, P> {
    reconciler: Reconciler<A, P>,
}

impl<A: AdminClient, P: PlacementStrategies> TopicResource<A, P> {
    pub fn new(reconciler: Reconciler<A, P>) -> Self {
        Self { reconciler }
    }

    pub fn reconciler(&self) -> &Reconciler<A, P> {
        &self.reconciler
    }

    /// Create the topic and return its state as read back from the cluster
    pub fn create(&self, spec: TopicSpec) -> Result<TopicSnapshot> {
        if spec.name.is_empty() || spec.partitions == 0 || spec.replication_factor == 0 {
            return Err(ReconcileError::InvalidSpec(format!(
                "topic {:?} needs a name, at least one partition and a replication factor of at least 1",
                spec.name
            )));
        }

        info!(
            topic = %spec.name,
            partitions = spec.partitions,
            replication_factor = spec.replication_factor,
            "Creating topic"
        );
        let failures = self.admin().create_topic(&spec)?;
        if !failures.is_empty() {
            return Err(ReconcileError::Rejected {
                operation: "create topic",
                failures,
            });
        }

        self.snapshot(&spec.name)
    }

    /// Refresh state. `None` means the topic is gone and should be dropped
    /// from persisted state.
    pub fn read(&self, name: &str) -> Result<Option<TopicSnapshot>> {
        match self.snapshot(name) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(ReconcileError::Admin(AdminError::TopicNotFound(_))) => {
                warn!(topic = %name, "Topic not found, removing from state");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Reconcile against freshly read live state
    pub fn update(&self, desired: TopicSpec) -> Result<ReconcileReport> {
        let live = self.admin().topic(&desired.name, true)?;
        self.reconciler.reconcile(desired, &live)
    }

    /// Issue a single delete request
    pub fn delete(&self, name: &str) -> Result<()> {
        info!(topic = %name, "Deleting topic");
        let failures = self.admin().delete_topic(name)?;
        if !failures.is_empty() {
            return Err(ReconcileError::Rejected {
                operation: "delete topic",
                failures,
            });
        }
        Ok(())
    }

    /// Adopt an existing topic; the id is the topic name
    pub fn import(&self, id: &str) -> Result<TopicSnapshot> {
        debug!(topic = %id, "Importing topic");
        self.snapshot(id)
    }

    /// Read-only lookup of a topic
    pub fn describe(&self, name: &str) -> Result<TopicSnapshot> {
        self.snapshot(name)
    }

    fn admin(&self) -> &A {
        self.reconciler.admin()
    }

    fn snapshot(&self, name: &str) -> Result<TopicSnapshot> {
        let topic = self.admin().topic(name, true)?;
        let replication_factor = effective_replication_factor(&topic)?;
        Ok(TopicSnapshot {
            name: topic.name.clone(),
            partitions: topic.partition_count(),
            replication_factor,
            config: topic.config,
            version: topic.version,
        })
    }
}
