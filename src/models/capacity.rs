//! Resource capacity model.
//!
//! Resources are shared kitchen pools: burners, hands, oven slots.
//! Each has an integer ceiling on simultaneous demand. Resources that
//! are not listed have capacity 1.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Capacity used for resources missing from the map.
pub const DEFAULT_CAPACITY: u32 = 1;

/// Resource name → maximum simultaneous demand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capacity {
    limits: BTreeMap<String, u32>,
}

impl Capacity {
    /// Creates an empty capacity map (every resource defaults to 1).
    pub fn new() -> Self {
        Self::default()
    }

    /// Default home kitchen: one stove, one pair of hands, one oven.
    pub fn kitchen() -> Self {
        Self::new()
            .with_limit("stove", 1)
            .with_limit("hands", 1)
            .with_limit("oven", 1)
    }

    /// Sets the ceiling for a resource.
    pub fn with_limit(mut self, resource: impl Into<String>, limit: u32) -> Self {
        self.limits.insert(resource.into(), limit);
        self
    }

    /// Sets the ceiling for a resource in place.
    pub fn set(&mut self, resource: impl Into<String>, limit: u32) {
        self.limits.insert(resource.into(), limit);
    }

    /// Effective ceiling for `resource`.
    pub fn of(&self, resource: &str) -> u32 {
        self.limits
            .get(resource)
            .copied()
            .unwrap_or(DEFAULT_CAPACITY)
    }

    /// Explicitly listed resources and their ceilings.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.limits.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, u32)> for Capacity {
    fn from_iter<I: IntoIterator<Item = (K, u32)>>(iter: I) -> Self {
        Self {
            limits: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
