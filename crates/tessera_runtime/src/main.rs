//! Tessera Runtime
//!
//! Headless binary that drives the projectile demo world at a fixed tick
//! rate and exercises snapshots plus the binary archive.
//!
//! Usage: `tessera [settings.json]`

mod clock;
mod settings;
mod sim;

use anyhow::Result;
use settings::Settings;
use sim::Simulation;
use std::path::PathBuf;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    tracing::info!("Tessera v{}", tessera_core::VERSION);
    let settings_path = std::env::args_os().nth(1).map(PathBuf::from);
    let settings = Settings::load(settings_path.as_deref())?;
    tracing::info!(?settings, "settings loaded");

    let ticks = settings.simulation.ticks;
    let report_every = u64::from(settings.simulation.tick_rate_hz);
    let snapshot_tick = settings.simulation.snapshot_tick;
    let mut sim = Simulation::new(settings);

    for tick in 1..=ticks {
        let report = sim.step();
        if tick % report_every == 0 {
            tracing::info!(
                tick,
                alive = report.alive,
                destroyed = report.destroyed,
                sim_time = ?sim.clock().total_time(),
                "tick summary"
            );
        }
        if snapshot_tick == Some(tick) {
            let bytes = sim.round_trip_snapshot()?;
            tracing::info!(tick, bytes, "snapshot round trip verified");
        }
    }

    let counters = sim.registry().counters();
    for (name, value) in counters.iter() {
        tracing::info!(counter = name, value, "lifecycle counter");
    }
    tracing::info!(alive = sim.registry().len(), "simulation finished");
    Ok(())
}
