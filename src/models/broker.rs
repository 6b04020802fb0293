use serde::{Deserialize, Serialize};
use super::BrokerId;

/// A broker as reported by the cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerInfo {
    pub id: BrokerId,
    pub rack: Option<String>,
}

impl BrokerInfo {
    pub fn new(id: BrokerId, rack: Option<String>) -> Self {
        Self { id, rack }
    }

    /// Rack of this broker, `None` when the broker is not rack aware.
    ///
    /// Clusters without rack awareness may report an empty string instead of
    /// omitting the rack, so both are treated the same.
    pub fn rack(&self) -> Option<&str> {
        self.rack.as_deref().filter(|rack| !rack.is_empty())
    }
}
