// pool.rs - Typed component container
//
// Pairs a dense component array with a SparseSet. Both arrays are edited
// through one dense position obtained from the set, so they never drift.
// Zero-sized tag types keep no component array at all.

use crate::ecs::persist::{read_bytes, read_u32, write_u32};
use crate::ecs::{Component, ComponentInfo, Entity, PersistError, SortAlgorithm, SparseSet};
use std::cmp::Ordering;
use std::io::{Read, Write};
use std::mem::size_of;

/// Dense storage for every `T` attached to an entity.
#[derive(Debug, Clone)]
pub struct ComponentPool<T: Component> {
    set: SparseSet,
    components: Vec<T>,
    /// Single instance standing in for every member of a tag pool.
    shared: T,
}

impl<T: Component> Default for ComponentPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> ComponentPool<T> {
    /// Data-less marker components allocate no dense array.
    pub const IS_TAG: bool = size_of::<T>() == 0;

    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            set: SparseSet::with_capacity(capacity),
            components: if Self::IS_TAG {
                Vec::new()
            } else {
                Vec::with_capacity(capacity)
            },
            shared: T::zeroed(),
        }
    }

    pub fn info(&self) -> ComponentInfo {
        ComponentInfo::of::<T>()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.set.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.set.contains(entity)
    }

    /// The membership set backing this pool.
    #[inline]
    pub fn sparse_set(&self) -> &SparseSet {
        &self.set
    }

    #[inline]
    pub fn entities(&self) -> &[Entity] {
        self.set.entities()
    }

    /// Dense component array, index-for-index with [`entities`](Self::entities).
    /// Always empty for tag pools.
    #[inline]
    pub fn components(&self) -> &[T] {
        &self.components
    }

    /// Attach `value` to `entity` and return the stored component.
    ///
    /// # Panics
    /// Panics if `entity` already has a `T`.
    pub fn insert(&mut self, entity: Entity, value: T) -> &mut T {
        assert!(
            !self.set.contains(entity),
            "{entity:?} already has a {} component",
            T::NAME
        );
        if Self::IS_TAG {
            self.set.insert(entity);
            return &mut self.shared;
        }
        // Grow the value array first so a failed push leaves no dangling member.
        self.components.push(value);
        let pos = self.set.insert(entity);
        debug_assert_eq!(pos + 1, self.components.len());
        &mut self.components[pos]
    }

    /// Detach `T` from `entity`, returning the removed value.
    ///
    /// # Panics
    /// Panics if `entity` has no `T`.
    pub fn remove(&mut self, entity: Entity) -> T {
        assert!(
            self.set.contains(entity),
            "{entity:?} has no {} component to remove",
            T::NAME
        );
        let pos = self.set.remove(entity);
        if Self::IS_TAG {
            return self.shared;
        }
        self.components.swap_remove(pos)
    }

    /// # Panics
    /// Panics if `entity` has no `T`.
    pub fn get(&self, entity: Entity) -> &T {
        match self.try_get(entity) {
            Some(value) => value,
            None => panic!("{entity:?} has no {} component", T::NAME),
        }
    }

    /// # Panics
    /// Panics if `entity` has no `T`.
    pub fn get_mut(&mut self, entity: Entity) -> &mut T {
        match self.set.try_index_of(entity) {
            Some(_) if Self::IS_TAG => &mut self.shared,
            Some(pos) => &mut self.components[pos],
            None => panic!("{entity:?} has no {} component", T::NAME),
        }
    }

    pub fn try_get(&self, entity: Entity) -> Option<&T> {
        let pos = self.set.try_index_of(entity)?;
        if Self::IS_TAG {
            return Some(&self.shared);
        }
        Some(&self.components[pos])
    }

    pub fn try_get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        let pos = self.set.try_index_of(entity)?;
        if Self::IS_TAG {
            return Some(&mut self.shared);
        }
        Some(&mut self.components[pos])
    }

    /// Iterate `(entity, component)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        let shared = &self.shared;
        self.set
            .entities()
            .iter()
            .enumerate()
            .map(move |(pos, &entity)| {
                let value = if Self::IS_TAG {
                    shared
                } else {
                    &self.components[pos]
                };
                (entity, value)
            })
    }

    /// Visit every member mutably in dense order.
    pub fn for_each_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(Entity, &mut T),
    {
        if Self::IS_TAG {
            for &entity in self.set.entities() {
                f(entity, &mut self.shared);
            }
            return;
        }
        for (&entity, value) in self.set.entities().iter().zip(self.components.iter_mut()) {
            f(entity, value);
        }
    }

    /// Sort members by component value, moving components in lockstep.
    /// Tag pools have nothing to compare and are left as they are.
    pub fn sort_by<F>(&mut self, mut compare: F, algorithm: SortAlgorithm)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        if Self::IS_TAG {
            return;
        }
        let components = &self.components;
        let order = self
            .set
            .sorted_order(|a, b| compare(&components[a], &components[b]), algorithm);
        self.apply_order(&order);
    }

    /// Sort members by entity, moving components in lockstep.
    pub fn sort_entities_by<F>(&mut self, mut compare: F, algorithm: SortAlgorithm)
    where
        F: FnMut(&Entity, &Entity) -> Ordering,
    {
        let entities = self.set.entities();
        let order = self
            .set
            .sorted_order(|a, b| compare(&entities[a], &entities[b]), algorithm);
        self.apply_order(&order);
    }

    /// Follow `other`'s entity order for shared members.
    pub fn sort_like(&mut self, other: &SparseSet) {
        let order = self.set.order_like(other);
        self.apply_order(&order);
    }

    pub fn clear(&mut self) {
        self.set.clear();
        self.components.clear();
    }

    fn apply_order(&mut self, order: &[usize]) {
        if !Self::IS_TAG {
            self.components = order.iter().map(|&from| self.components[from]).collect();
        }
        self.set.permute(order);
    }

    /// Write this pool's block: stride, dense entities, raw component bytes.
    pub(crate) fn write_block(&self, writer: &mut dyn Write) -> Result<(), PersistError> {
        write_u32(writer, size_of::<T>() as u32)?;
        self.set.write_to(writer)?;
        if !Self::IS_TAG {
            writer.write_all(bytemuck::cast_slice(self.components.as_slice()))?;
        }
        Ok(())
    }

    /// Read a block written by [`write_block`](Self::write_block) into a fresh pool.
    pub(crate) fn read_block(reader: &mut dyn Read, next_id: u64) -> Result<Self, PersistError> {
        let stride = read_u32(reader)? as usize;
        if stride != size_of::<T>() {
            return Err(PersistError::StrideMismatch {
                component_id: T::ID,
                name: T::NAME,
                expected: size_of::<T>(),
                actual: stride,
            });
        }
        let set = SparseSet::read_from(reader, T::NAME, next_id)?;
        let components = if Self::IS_TAG {
            Vec::new()
        } else {
            let bytes = read_bytes(reader, set.len() * stride)?;
            bytes
                .chunks_exact(stride)
                .map(bytemuck::pod_read_unaligned::<T>)
                .collect()
        };
        Ok(Self {
            set,
            components,
            shared: T::zeroed(),
        })
    }
}
