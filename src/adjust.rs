//! Per-partition replica list adjustment.
//!
//! Both functions are pure. The caller decides the direction once per topic
//! and only calls them when the desired count differs from the present one.

use crate::models::BrokerId;

/// Grow `replicas` towards `desired` entries.
///
/// Brokers are taken from `broker_pool` in iteration order: a partition gets
/// the first pool brokers it does not already hold. Existing replicas keep
/// their position. If the pool runs out first, the partially grown list is
/// returned and the caller must treat the shortfall as an error.
pub fn grow_replicas(desired: usize, replicas: &[BrokerId], broker_pool: &[BrokerId]) -> Vec<BrokerId> {
    let mut grown = replicas.to_vec();
    if grown.len() >= desired {
        return grown;
    }

    for &broker in broker_pool {
        if !grown.contains(&broker) {
            grown.push(broker);
        }
        if grown.len() == desired {
            break;
        }
    }

    grown
}

/// Shrink `replicas` down to `desired` entries without touching `leader`.
///
/// Non-leader replicas are dropped one at a time, earliest first, so the
/// replicas at the end of the list survive. Returns the input unchanged when
/// it is already short enough. Stops early if only leader entries are left.
pub fn shrink_replicas(desired: usize, replicas: &[BrokerId], leader: BrokerId) -> Vec<BrokerId> {
    let mut shrunk = replicas.to_vec();

    while shrunk.len() > desired {
        let Some(victim) = shrunk.iter().position(|&id| id != leader) else {
            break;
        };
        shrunk = shrunk
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != victim)
            .map(|(_, &id)| id)
            .collect();
    }

    shrunk
}
