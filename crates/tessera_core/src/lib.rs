//! Tessera Engine Core
//!
//! Entity-component storage for the simulation:
//! - Sparse-set component containers with O(1) insert/remove/lookup
//! - Multi-component views anchored on the smallest container
//! - A registry owning entity lifecycle, deferred destruction,
//!   snapshots and binary persistence

pub mod ecs;

pub use bytemuck;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
