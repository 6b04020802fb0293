//! In-process cluster model implementing [`AdminClient`].
//!
//! Mutations apply immediately. Every call is recorded so callers can check
//! which requests a pass issued, and failures can be injected per operation,
//! per config key and per partition.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::admin::{AdminClient, AdminResult};
use crate::error::{AdminError, EntryError, StrategyError};
use crate::models::*;
use crate::placement::{PartitionExtender, PlacementStrategies, ReplicaAssigner, StrategyResult};

/// Admin operations, as recorded by [`MemoryCluster::requests`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Topic,
    Topics,
    BrokerIds,
    Brokers,
    CreateTopic,
    AlterConfig,
    ReassignPartitions,
    AddPartitions,
    DeleteTopic,
}

impl Operation {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Operation::CreateTopic
                | Operation::AlterConfig
                | Operation::ReassignPartitions
                | Operation::AddPartitions
                | Operation::DeleteTopic
        )
    }
}

#[derive(Debug, Default)]
struct ClusterState {
    brokers: BTreeMap<BrokerId, BrokerInfo>,
    topics: BTreeMap<TopicName, TopicState>,
    requests: Vec<Operation>,
    failures: HashMap<Operation, String>,
    rejected_keys: HashSet<String>,
    rejected_partitions: HashSet<PartitionId>,
    last_timeout: Option<Duration>,
}

impl ClusterState {
    fn record(&mut self, operation: Operation) -> AdminResult<()> {
        self.requests.push(operation);
        match self.failures.get(&operation) {
            Some(message) => Err(AdminError::Request(message.clone())),
            None => Ok(()),
        }
    }

    fn topic_mut(&mut self, name: &str) -> AdminResult<&mut TopicState> {
        self.topics
            .get_mut(name)
            .ok_or_else(|| AdminError::TopicNotFound(name.to_string()))
    }
}

/// A broker cluster held in memory
#[derive(Debug, Default)]
pub struct MemoryCluster {
    state: Mutex<ClusterState>,
}

impl MemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cluster with brokers `1..=count`, none of them racked
    pub fn with_brokers(count: i32) -> Self {
        let cluster = Self::new();
        for id in 1..=count {
            cluster.add_broker(BrokerInfo::new(id, None));
        }
        cluster
    }

    pub fn add_broker(&self, broker: BrokerInfo) {
        self.state.lock().brokers.insert(broker.id, broker);
    }

    pub fn remove_broker(&self, id: BrokerId) -> Option<BrokerInfo> {
        self.state.lock().brokers.remove(&id)
    }

    /// Insert or replace a topic as-is, without any validation
    pub fn insert_topic(&self, topic: TopicState) {
        self.state.lock().topics.insert(topic.name.clone(), topic);
    }

    /// Current state of a topic, bypassing request recording
    pub fn topic_state(&self, name: &str) -> Option<TopicState> {
        self.state.lock().topics.get(name).cloned()
    }

    /// Make every future call of `operation` fail as a whole
    pub fn fail(&self, operation: Operation, message: impl Into<String>) {
        self.state.lock().failures.insert(operation, message.into());
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.lock();
        state.failures.clear();
        state.rejected_keys.clear();
        state.rejected_partitions.clear();
    }

    /// Reject this config key in alter-config requests
    pub fn reject_config_key(&self, key: impl Into<String>) {
        self.state.lock().rejected_keys.insert(key.into());
    }

    /// Reject this partition in reassignment requests
    pub fn reject_partition(&self, partition: PartitionId) {
        self.state.lock().rejected_partitions.insert(partition);
    }

    /// Every admin call made so far, in order
    pub fn requests(&self) -> Vec<Operation> {
        self.state.lock().requests.clone()
    }

    pub fn clear_requests(&self) {
        self.state.lock().requests.clear();
    }

    /// Timeout passed with the last reassignment request
    pub fn last_reassignment_timeout(&self) -> Option<Duration> {
        self.state.lock().last_timeout
    }
}

impl AdminClient for MemoryCluster {
    fn topic(&self, name: &str, with_config: bool) -> AdminResult<TopicState> {
        let mut state = self.state.lock();
        state.record(Operation::Topic)?;

        let mut topic = state
            .topics
            .get(name)
            .cloned()
            .ok_or_else(|| AdminError::TopicNotFound(name.to_string()))?;
        if !with_config {
            topic.config.clear();
        }
        Ok(topic)
    }

    fn topics(&self, filter: Option<&[String]>, with_config: bool) -> AdminResult<Vec<TopicState>> {
        let mut state = self.state.lock();
        state.record(Operation::Topics)?;

        Ok(state
            .topics
            .values()
            .filter(|t| filter.map_or(true, |names| names.contains(&t.name)))
            .cloned()
            .map(|mut t| {
                if !with_config {
                    t.config.clear();
                }
                t
            })
            .collect())
    }

    fn broker_ids(&self) -> AdminResult<Vec<BrokerId>> {
        let mut state = self.state.lock();
        state.record(Operation::BrokerIds)?;
        Ok(state.brokers.keys().copied().collect())
    }

    fn brokers(&self, ids: &[BrokerId]) -> AdminResult<Vec<BrokerInfo>> {
        let mut state = self.state.lock();
        state.record(Operation::Brokers)?;

        ids.iter()
            .map(|id| {
                state
                    .brokers
                    .get(id)
                    .cloned()
                    .ok_or(AdminError::BrokerNotFound(*id))
            })
            .collect()
    }

    fn create_topic(&self, spec: &TopicSpec) -> AdminResult<Vec<EntryError>> {
        let mut state = self.state.lock();
        state.record(Operation::CreateTopic)?;

        if state.topics.contains_key(&spec.name) {
            return Ok(vec![EntryError::new(&spec.name, "topic already exists")]);
        }

        let ids: Vec<BrokerId> = state.brokers.keys().copied().collect();
        let rf = spec.replication_factor as usize;
        if rf == 0 || rf > ids.len() {
            return Ok(vec![EntryError::new(
                &spec.name,
                format!("replication factor {} larger than available brokers {}", rf, ids.len()),
            )]);
        }

        let partitions = (0..spec.partitions as usize)
            .map(|p| {
                let replicas: Vec<BrokerId> = (0..rf).map(|i| ids[(p + i) % ids.len()]).collect();
                PartitionInfo::new(p as PartitionId, replicas[0], replicas)
            })
            .collect();

        state.topics.insert(
            spec.name.clone(),
            TopicState {
                name: spec.name.clone(),
                partitions,
                config: spec.config.clone(),
                version: 0,
            },
        );
        Ok(Vec::new())
    }

    fn alter_config(&self, topic: &str, entries: &BTreeMap<String, String>) -> AdminResult<Vec<EntryError>> {
        let mut state = self.state.lock();
        state.record(Operation::AlterConfig)?;

        let rejected = state.rejected_keys.clone();
        let live = state.topic_mut(topic)?;
        let mut failures = Vec::new();
        let mut config = BTreeMap::new();
        for (key, value) in entries {
            if rejected.contains(key) {
                failures.push(EntryError::new(key, "invalid config value"));
            } else {
                config.insert(key.clone(), value.clone());
            }
        }
        live.config = config;
        live.version += 1;
        Ok(failures)
    }

    fn reassign_partitions(
        &self,
        topic: &str,
        assignments: &[Assignment],
        timeout: Duration,
    ) -> AdminResult<Vec<EntryError>> {
        let mut state = self.state.lock();
        state.record(Operation::ReassignPartitions)?;
        state.last_timeout = Some(timeout);

        let rejected = state.rejected_partitions.clone();
        let known: HashSet<BrokerId> = state.brokers.keys().copied().collect();
        let live = state.topic_mut(topic)?;

        let mut failures = Vec::new();
        let mut applied = false;
        for assignment in assignments {
            if rejected.contains(&assignment.partition) {
                failures.push(EntryError::partition(assignment.partition, "reassignment rejected"));
                continue;
            }
            if let Some(missing) = assignment.replicas.iter().find(|b| !known.contains(*b)) {
                failures.push(EntryError::partition(
                    assignment.partition,
                    format!("unknown broker {}", missing),
                ));
                continue;
            }
            let Some(partition) = live.partitions.iter_mut().find(|p| p.id == assignment.partition) else {
                failures.push(EntryError::partition(assignment.partition, "unknown partition"));
                continue;
            };

            partition.replicas = assignment.replicas.clone();
            if !assignment.contains(partition.leader) {
                if let Some(first) = partition.replicas.first() {
                    partition.leader = *first;
                }
            }
            applied = true;
        }

        if applied {
            live.version += 1;
        }
        Ok(failures)
    }

    fn add_partitions(&self, topic: &str, assignments: &[Assignment]) -> AdminResult<()> {
        let mut state = self.state.lock();
        state.record(Operation::AddPartitions)?;

        let live = state.topic_mut(topic)?;
        let mut next = live.partitions.len() as PartitionId;
        for assignment in assignments {
            if assignment.partition != next {
                return Err(AdminError::Request(format!(
                    "expected partition {}, got {}",
                    next, assignment.partition
                )));
            }
            if assignment.replicas.is_empty() {
                return Err(AdminError::Request(format!(
                    "partition {} has no replicas",
                    assignment.partition
                )));
            }
            next += 1;
        }

        for assignment in assignments {
            live.partitions.push(PartitionInfo::new(
                assignment.partition,
                assignment.replicas[0],
                assignment.replicas.clone(),
            ));
        }
        live.version += 1;
        Ok(())
    }

    fn delete_topic(&self, topic: &str) -> AdminResult<Vec<EntryError>> {
        let mut state = self.state.lock();
        state.record(Operation::DeleteTopic)?;

        match state.topics.remove(topic) {
            Some(_) => Ok(Vec::new()),
            None => Ok(vec![EntryError::new(topic, "unknown topic")]),
        }
    }
}

/// A strategy construction, as recorded by [`MemoryPlacement::calls`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementCall {
    Assigner {
        brokers: Vec<BrokerId>,
        other_topics: Vec<TopicName>,
    },
    Extender {
        brokers: Vec<BrokerId>,
        rack_aware: bool,
    },
}

/// Placement strategies for tests and demos.
///
/// The assigner keeps the adjusted lists as they are. The extender places
/// each new partition round-robin over the brokers it was built with.
#[derive(Debug, Clone, Default)]
pub struct MemoryPlacement {
    calls: Arc<Mutex<Vec<PlacementCall>>>,
    assign_error: Option<String>,
    extend_error: Option<String>,
    extension: Option<Vec<Assignment>>,
}

impl MemoryPlacement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_assign(mut self, message: impl Into<String>) -> Self {
        self.assign_error = Some(message.into());
        self
    }

    pub fn failing_extend(mut self, message: impl Into<String>) -> Self {
        self.extend_error = Some(message.into());
        self
    }

    /// Make the extender return exactly these assignments
    pub fn with_extension(mut self, extension: Vec<Assignment>) -> Self {
        self.extension = Some(extension);
        self
    }

    pub fn calls(&self) -> Vec<PlacementCall> {
        self.calls.lock().clone()
    }
}

impl PlacementStrategies for MemoryPlacement {
    fn assigner(&self, brokers: &[BrokerInfo], other_topics: &[TopicState]) -> Box<dyn ReplicaAssigner> {
        self.calls.lock().push(PlacementCall::Assigner {
            brokers: brokers.iter().map(|b| b.id).collect(),
            other_topics: other_topics.iter().map(|t| t.name.clone()).collect(),
        });
        Box::new(KeepAssigner {
            error: self.assign_error.clone(),
        })
    }

    fn extender(&self, brokers: &[BrokerInfo], rack_aware: bool) -> Box<dyn PartitionExtender> {
        self.calls.lock().push(PlacementCall::Extender {
            brokers: brokers.iter().map(|b| b.id).collect(),
            rack_aware,
        });
        Box::new(RoundRobinExtender {
            brokers: brokers.iter().map(|b| b.id).collect(),
            error: self.extend_error.clone(),
            extension: self.extension.clone(),
        })
    }
}

struct KeepAssigner {
    error: Option<String>,
}

impl ReplicaAssigner for KeepAssigner {
    fn name(&self) -> &str {
        "keep"
    }

    fn assign(&self, _topic: &str, assignments: Vec<Assignment>) -> StrategyResult<Vec<Assignment>> {
        match &self.error {
            Some(message) => Err(StrategyError::Rejected(message.clone())),
            None => Ok(assignments),
        }
    }
}

struct RoundRobinExtender {
    brokers: Vec<BrokerId>,
    error: Option<String>,
    extension: Option<Vec<Assignment>>,
}

impl PartitionExtender for RoundRobinExtender {
    fn name(&self) -> &str {
        "round-robin"
    }

    fn extend(&self, _topic: &str, current: &[Assignment], extra: usize) -> StrategyResult<Vec<Assignment>> {
        if let Some(message) = &self.error {
            return Err(StrategyError::Rejected(message.clone()));
        }
        if let Some(extension) = &self.extension {
            return Ok(extension.clone());
        }

        let width = current.first().map_or(1, |a| a.replicas.len());
        if width > self.brokers.len() {
            return Err(StrategyError::InsufficientBrokers {
                required: width,
                available: self.brokers.len(),
            });
        }

        let mut extended = current.to_vec();
        let start = current.len();
        for offset in 0..extra {
            let partition = start + offset;
            let replicas = (0..width)
                .map(|i| self.brokers[(partition + i) % self.brokers.len()])
                .collect();
            extended.push(Assignment::new(partition as PartitionId, replicas));
        }
        Ok(extended)
    }
}
