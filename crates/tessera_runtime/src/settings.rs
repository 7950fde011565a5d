//! Runtime settings, loaded from an optional JSON file

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tessera_core::ecs::RegistryConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub registry: RegistryConfig,
    pub simulation: SimulationSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Total ticks to run before exiting.
    pub ticks: u64,
    pub tick_rate_hz: u32,
    /// Projectiles created at the start of every tick.
    pub spawn_per_tick: u32,
    /// Ticks a projectile lives before it queues itself for destruction.
    pub projectile_lifetime: u32,
    /// Tick at which the world is snapshotted and round-tripped through
    /// the binary archive.
    pub snapshot_tick: Option<u64>,
    /// Where to write the snapshot archive, if anywhere.
    pub save_path: Option<PathBuf>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            ticks: 600,
            tick_rate_hz: 60,
            spawn_per_tick: 32,
            projectile_lifetime: 90,
            snapshot_tick: Some(300),
            save_path: None,
        }
    }
}

impl Settings {
    /// Defaults when `path` is `None`, otherwise the parsed file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        let settings: Self = serde_json::from_str(&text)
            .with_context(|| format!("invalid settings in {}", path.display()))?;
        settings
            .validate()
            .with_context(|| format!("invalid settings in {}", path.display()))?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.simulation.tick_rate_hz > 0,
            "simulation.tick_rate_hz must be at least 1"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "simulation": { "ticks": 10, "snapshot_tick": null } }"#)
                .unwrap();
        assert_eq!(settings.simulation.ticks, 10);
        assert_eq!(settings.simulation.snapshot_tick, None);
        assert_eq!(settings.simulation.tick_rate_hz, 60);
        assert_eq!(settings.registry, RegistryConfig::default());
    }

    #[test]
    fn no_path_means_defaults() {
        assert_eq!(Settings::load(None).unwrap(), Settings::default());
    }

    #[test]
    fn zero_tick_rate_is_an_error() {
        let name = format!("tessera-settings-{}.json", std::process::id());
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, r#"{ "simulation": { "tick_rate_hz": 0 } }"#).unwrap();
        let result = Settings::load(Some(&path));
        std::fs::remove_file(&path).unwrap();

        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("tick_rate_hz must be at least 1"));
    }
}
