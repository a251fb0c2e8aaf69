//! Graph execution settings

use serde::{Deserialize, Serialize};

/// Default multiplier for the per-tick execution cap
pub const DEFAULT_ITERATION_CAP_FACTOR: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// A tick may run at most `iteration_cap_factor × node count` nodes
    pub iteration_cap_factor: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            iteration_cap_factor: DEFAULT_ITERATION_CAP_FACTOR,
        }
    }
}

impl GraphConfig {
    pub fn iteration_cap(&self, node_count: usize) -> usize {
        self.iteration_cap_factor.saturating_mul(node_count)
    }
}
