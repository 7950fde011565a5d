// config.rs - Registry tuning knobs

use serde::{Deserialize, Serialize};

/// Initial capacities used when a registry and its pools are created.
///
/// Capacities are hints only; every container grows on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Reserved slots in the live-entity set.
    pub entity_capacity: usize,
    /// Reserved slots in each newly registered component pool.
    pub component_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            entity_capacity: 1024,
            component_capacity: 256,
        }
    }
}
