//! Sparse-set entity component system.
//!
//! Every component type lives in its own [`ComponentPool`]: a packed array
//! of values kept in lockstep with a [`SparseSet`] of owning entities.
//! The [`Registry`] owns one type-erased pool per registered type, the
//! live entity set and the deferred destroy queue. [`View`]s join pools
//! by walking the smallest one.

mod component;
mod config;
mod entity;
pub(crate) mod erased;
mod error;
mod macros;
pub(crate) mod persist;
mod pool;
mod query;
mod registry;
mod sparse_set;
mod view;

pub use component::{Component, ComponentId, ComponentInfo};
pub use config::RegistryConfig;
pub use entity::{Entity, EntityIdGenerator};
pub use error::PersistError;
pub use pool::ComponentPool;
pub use query::ComponentSet;
pub use registry::{DestroyQueue, Registry};
pub use sparse_set::{SortAlgorithm, SparseSet};
pub use view::{View, ViewIter};
