//! Boundary to the cluster admin API.
//!
//! Implementations own transport and connection lifecycle. Calls are blocking
//! and a single client may be shared by concurrent topic reconciliations.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::{AdminError, EntryError};
use crate::models::{Assignment, BrokerId, BrokerInfo, TopicSpec, TopicState};

/// Result type for admin calls
pub type AdminResult<T> = std::result::Result<T, AdminError>;

/// Read and mutation operations against a broker cluster.
///
/// Multi-entry mutations report per-entry rejections in the `Ok` value; an
/// `Err` means the request as a whole failed.
pub trait AdminClient: Send + Sync {
    /// Fetch one topic. Fails with [`AdminError::TopicNotFound`] when absent.
    fn topic(&self, name: &str, with_config: bool) -> AdminResult<TopicState>;

    /// Fetch every topic, or only the named ones when `filter` is set
    fn topics(&self, filter: Option<&[String]>, with_config: bool) -> AdminResult<Vec<TopicState>>;

    fn broker_ids(&self) -> AdminResult<Vec<BrokerId>>;

    fn brokers(&self, ids: &[BrokerId]) -> AdminResult<Vec<BrokerInfo>>;

    fn create_topic(&self, spec: &TopicSpec) -> AdminResult<Vec<EntryError>>;

    /// Replace the topic's config with `entries`. Keys not supplied are
    /// reset to the broker default, as with a non-incremental alter.
    fn alter_config(&self, topic: &str, entries: &BTreeMap<String, String>) -> AdminResult<Vec<EntryError>>;

    /// Submit a reassignment. The cluster moves data asynchronously; the
    /// response only says whether each partition was accepted.
    fn reassign_partitions(
        &self,
        topic: &str,
        assignments: &[Assignment],
        timeout: Duration,
    ) -> AdminResult<Vec<EntryError>>;

    /// Create the given partitions. All-or-nothing from the caller's view.
    fn add_partitions(&self, topic: &str, assignments: &[Assignment]) -> AdminResult<()>;

    fn delete_topic(&self, topic: &str) -> AdminResult<Vec<EntryError>>;
}

impl<T: AdminClient + ?Sized> AdminClient for std::sync::Arc<T> {
    fn topic(&self, name: &str, with_config: bool) -> AdminResult<TopicState> {
        (**self).topic(name, with_config)
    }

    fn topics(&self, filter: Option<&[String]>, with_config: bool) -> AdminResult<Vec<TopicState>> {
        (**self).topics(filter, with_config)
    }

    fn broker_ids(&self) -> AdminResult<Vec<BrokerId>> {
        (**self).broker_ids()
    }

    fn brokers(&self, ids: &[BrokerId]) -> AdminResult<Vec<BrokerInfo>> {
        (**self).brokers(ids)
    }

    fn create_topic(&self, spec: &TopicSpec) -> AdminResult<Vec<EntryError>> {
        (**self).create_topic(spec)
    }

    fn alter_config(&self, topic: &str, entries: &BTreeMap<String, String>) -> AdminResult<Vec<EntryError>> {
        (**self).alter_config(topic, entries)
    }

    fn reassign_partitions(
        &self,
        topic: &str,
        assignments: &[Assignment],
        timeout: Duration,
    ) -> AdminResult<Vec<EntryError>> {
        (**self).reassign_partitions(topic, assignments, timeout)
    }

    fn add_partitions(&self, topic: &str, assignments: &[Assignment]) -> AdminResult<()> {
        (**self).add_partitions(topic, assignments)
    }

    fn delete_topic(&self, topic: &str) -> AdminResult<Vec<EntryError>> {
        (**self).delete_topic(topic)
    }
}
