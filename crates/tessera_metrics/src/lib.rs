//! Tessera Metrics - named counters for registry instrumentation
//!
//! Counters vanish entirely in production builds via the `metrics` feature.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable counter collection (default: disabled)
//!
//! # Usage
//!
//! ```ignore
//! use tessera_metrics::Counter;
//!
//! let mut counter = Counter::new();
//! counter.increment("entities_created", 1);
//! assert_eq!(counter.get("entities_created"), 1);
//! ```
//!
//! Without the `metrics` feature, `Counter` is a zero-sized stub whose
//! methods do nothing and whose reads always return zero.

#[cfg(feature = "metrics")]
mod counter;

#[cfg(feature = "metrics")]
pub use counter::Counter;

/// Execute code only when metrics are enabled in the calling crate.
#[macro_export]
macro_rules! metrics {
    ($($tt:tt)*) => {
        #[cfg(feature = "metrics")]
        {
            $($tt)*
        }
    };
}

// ============================================================================
// No-op stub when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct Counter;

#[cfg(not(feature = "metrics"))]
impl Counter {
    pub fn new() -> Self { Self }
    pub fn increment(&mut self, _name: &'static str, _value: usize) {}
    pub fn get(&self, _name: &str) -> usize { 0 }
    pub fn reset_all(&mut self) {}
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, usize)> { std::iter::empty() }
}
