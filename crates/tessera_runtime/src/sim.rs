// sim.rs - Projectile demo world driven at a fixed tick rate
//
// Each tick: spawn a volley, integrate gravity and motion, age lifetimes
// (queueing expired projectiles for destruction), then flush the queue.

use crate::clock::SimulationClock;
use crate::settings::Settings;
use anyhow::{ensure, Context, Result};
use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use tessera_core::define_component;
use tessera_core::ecs::Registry;
use tessera_core::spawn;

const GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Transform {
    pub position: Vec3,
    pub scale: f32,
}
define_component!(Transform, 1, "Transform");

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Velocity {
    pub linear: Vec3,
}
define_component!(Velocity, 2, "Velocity");

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Lifetime {
    pub remaining_ticks: u32,
}
define_component!(Lifetime, 3, "Lifetime");

/// Marks entities fired by the spawner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projectile;
// SAFETY: zero-sized, so every (empty) bit pattern is valid.
unsafe impl Zeroable for Projectile {}
unsafe impl Pod for Projectile {}
define_component!(Projectile, 4, "Projectile");

type World = (Transform, Velocity, Lifetime, Projectile);

pub struct Simulation {
    registry: Registry,
    clock: SimulationClock,
    settings: Settings,
}

/// Outcome of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub spawned: u32,
    pub destroyed: usize,
    pub alive: usize,
}

impl Simulation {
    pub fn new(settings: Settings) -> Self {
        let mut registry = Registry::with_config(settings.registry.clone());
        registry.register_set::<World>();
        Self {
            registry,
            clock: SimulationClock::new(settings.simulation.tick_rate_hz),
            settings,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn step(&mut self) -> TickReport {
        let dt = self.clock.delta_seconds();
        let spawned = self.spawn_volley();

        self.registry
            .view::<Velocity>()
            .each(|velocity| velocity.linear += GRAVITY * dt);
        self.registry
            .view::<(Transform, Velocity)>()
            .each(|transform, velocity| transform.position += velocity.linear * dt);

        let (mut lifetimes, queue) = self.registry.view_and_queue::<Lifetime>();
        lifetimes.each_with_entity(|entity, lifetime| {
            lifetime.remaining_ticks = lifetime.remaining_ticks.saturating_sub(1);
            if lifetime.remaining_ticks == 0 {
                queue.push(entity);
            }
        });

        let destroyed = self.registry.remove_requested_entities();
        self.clock.advance_tick();

        TickReport {
            spawned,
            destroyed,
            alive: self.registry.len(),
        }
    }

    fn spawn_volley(&mut self) -> u32 {
        let count = self.settings.simulation.spawn_per_tick;
        let lifetime = self.settings.simulation.projectile_lifetime.max(1);
        let tick = self.clock.tick_count() as f32;
        for i in 0..count {
            let angle = (i as f32 / count.max(1) as f32) * std::f32::consts::TAU + tick * 0.01;
            spawn!(
                self.registry,
                Transform { position: Vec3::ZERO, scale: 1.0 },
                Velocity { linear: Vec3::new(angle.cos() * 5.0, 12.0, angle.sin() * 5.0) },
                Lifetime { remaining_ticks: lifetime },
                Projectile,
            );
        }
        count
    }

    /// Snapshot the world, push it through the binary archive and check
    /// the restored copy matches. Returns the archive size in bytes.
    pub fn round_trip_snapshot(&self) -> Result<usize> {
        let snapshot = self.registry.snapshot::<World>();
        let mut archive = Vec::new();
        snapshot
            .serialize(&mut archive)
            .context("failed to serialize snapshot")?;

        let mut restored = Registry::with_config(self.settings.registry.clone());
        restored.register_set::<World>();
        restored
            .deserialize(archive.as_slice())
            .context("failed to restore snapshot")?;

        ensure!(
            restored.live_entities() == snapshot.live_entities(),
            "restored registry has {} entities, snapshot has {}",
            restored.len(),
            snapshot.len()
        );
        for &entity in snapshot.live_entities() {
            ensure!(
                restored.try_get_component::<Transform>(entity)
                    == snapshot.try_get_component::<Transform>(entity),
                "transform of {entity} changed across the round trip"
            );
        }

        if let Some(path) = &self.settings.simulation.save_path {
            std::fs::write(path, &archive)
                .with_context(|| format!("failed to write archive to {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = archive.len(), "snapshot saved");
        }
        Ok(archive.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SimulationSettings;

    fn settings(spawn_per_tick: u32, projectile_lifetime: u32) -> Settings {
        Settings {
            simulation: SimulationSettings {
                spawn_per_tick,
                projectile_lifetime,
                ..SimulationSettings::default()
            },
            ..Settings::default()
        }
    }

    #[test]
    fn population_reaches_steady_state() {
        let mut sim = Simulation::new(settings(4, 3));
        let reports: Vec<TickReport> = (0..6).map(|_| sim.step()).collect();

        assert_eq!(reports[0], TickReport { spawned: 4, destroyed: 0, alive: 4 });
        assert_eq!(reports[1].alive, 8);
        assert_eq!(reports[2], TickReport { spawned: 4, destroyed: 4, alive: 8 });
        assert_eq!(reports[5].alive, 8);
        assert_eq!(sim.clock().tick_count(), 6);
    }

    #[test]
    fn projectiles_move_under_gravity() {
        let mut sim = Simulation::new(settings(1, 100));
        sim.step();
        sim.step();
        let registry = sim.registry();
        let first = registry.live_entities()[0];
        let transform = registry.get_component::<Transform>(first);
        let velocity = registry.get_component::<Velocity>(first);
        assert!(transform.position.y > 0.0);
        assert!(velocity.linear.y < 12.0);
        assert!(registry.has_component::<Projectile>(first));
    }

    #[test]
    fn snapshot_round_trip_succeeds() {
        let mut sim = Simulation::new(settings(8, 5));
        for _ in 0..7 {
            sim.step();
        }
        let bytes = sim.round_trip_snapshot().unwrap();
        assert!(bytes > 0);
    }
}
