//! Deterministic simulation clock
//!
//! Fixed tick rate; the simulation advances in whole ticks only.

use std::time::Duration;

/// Tick counter with a fixed step.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    tick_duration: Duration,
    tick_count: u64,
    accumulated_time: Duration,
}

impl SimulationClock {
    /// # Panics
    /// Panics if `tick_rate_hz` is zero.
    pub fn new(tick_rate_hz: u32) -> Self {
        assert!(tick_rate_hz > 0, "tick rate must be positive");
        Self {
            tick_duration: Duration::from_secs(1) / tick_rate_hz,
            tick_count: 0,
            accumulated_time: Duration::ZERO,
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Step length in seconds, for integrating velocities.
    pub fn delta_seconds(&self) -> f32 {
        self.tick_duration.as_secs_f32()
    }

    pub fn advance_tick(&mut self) {
        self.tick_count += 1;
        self.accumulated_time += self.tick_duration;
    }

    pub fn total_time(&self) -> Duration {
        self.accumulated_time
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixty_ticks_make_one_second() {
        let mut clock = SimulationClock::new(60);
        for _ in 0..60 {
            clock.advance_tick();
        }
        assert_eq!(clock.tick_count(), 60);
        let drift = clock.total_time().as_secs_f64() - 1.0;
        assert!(drift.abs() < 1e-6);
    }

    #[test]
    #[should_panic(expected = "tick rate must be positive")]
    fn zero_rate_is_rejected() {
        SimulationClock::new(0);
    }
}
