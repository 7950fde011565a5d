//! Entity handles and the id generator that mints them.
//!
//! Entities are plain 64-bit keys. They carry no data and never own storage;
//! every component container indexes its sparse table by the raw id.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity handle (opaque ID)
///
/// Ids are handed out by a monotonically increasing generator and are never
/// reused within one registry, so a stale handle simply stops matching.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity(u64);

impl Entity {
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u64 {
        self.0
    }

    /// Slot in a sparse `indirect` table.
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic id source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityIdGenerator {
    next: u64,
}

impl EntityIdGenerator {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Resume from a persisted generator state.
    pub(crate) fn resume_at(next: u64) -> Self {
        Self { next }
    }

    /// The id the next call to [`allocate`](Self::allocate) will return.
    pub fn peek(&self) -> u64 {
        self.next
    }

    pub fn allocate(&mut self) -> Entity {
        let id = self.next;
        self.next = self
            .next
            .checked_add(1)
            .unwrap_or_else(|| panic!("entity id space exhausted"));
        Entity(id)
    }
}
