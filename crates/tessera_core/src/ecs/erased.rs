// erased.rs - Type-erased pool storage owned by the registry
//
// The registry is not generic over component types. Each pool is boxed
// behind `ErasedPool`, whose vtable carries the per-type operations the
// registry needs generically: remove an entity, deep-clone, clear, persist.

use crate::ecs::{Component, ComponentId, ComponentInfo, ComponentPool, Entity, PersistError};
use std::any::Any;
use std::io::{Read, Write};

pub(crate) trait ErasedPool: Any + Send + Sync {
    fn info(&self) -> ComponentInfo;

    fn has_member(&self, entity: Entity) -> bool;

    fn members(&self) -> &[Entity];

    /// Drop `entity`'s component. Caller checks membership first.
    fn remove_member(&mut self, entity: Entity);

    fn clone_boxed(&self) -> Box<dyn ErasedPool>;

    fn clear_members(&mut self);

    fn save_block(&self, writer: &mut dyn Write) -> Result<(), PersistError>;

    /// Parse a block into a new pool of the same component type. Member ids
    /// must be below `next_id`.
    fn load_block(
        &self,
        reader: &mut dyn Read,
        next_id: u64,
    ) -> Result<Box<dyn ErasedPool>, PersistError>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedPool for ComponentPool<T> {
    fn info(&self) -> ComponentInfo {
        ComponentInfo::of::<T>()
    }

    fn has_member(&self, entity: Entity) -> bool {
        self.contains(entity)
    }

    fn members(&self) -> &[Entity] {
        self.entities()
    }

    fn remove_member(&mut self, entity: Entity) {
        self.remove(entity);
    }

    fn clone_boxed(&self) -> Box<dyn ErasedPool> {
        Box::new(self.clone())
    }

    fn clear_members(&mut self) {
        self.clear();
    }

    fn save_block(&self, writer: &mut dyn Write) -> Result<(), PersistError> {
        self.write_block(writer)
    }

    fn load_block(
        &self,
        reader: &mut dyn Read,
        next_id: u64,
    ) -> Result<Box<dyn ErasedPool>, PersistError> {
        Ok(Box::new(ComponentPool::<T>::read_block(reader, next_id)?))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Registration record: the stable component id plus the boxed pool.
pub(crate) struct PoolEntry {
    pub(crate) id: ComponentId,
    pub(crate) pool: Box<dyn ErasedPool>,
}

impl PoolEntry {
    fn new<T: Component>(capacity: usize) -> Self {
        Self {
            id: T::ID,
            pool: Box::new(ComponentPool::<T>::with_capacity(capacity)),
        }
    }

    pub(crate) fn typed<T: Component>(&self) -> &ComponentPool<T> {
        match self.pool.as_any().downcast_ref::<ComponentPool<T>>() {
            Some(pool) => pool,
            None => id_collision::<T>(self.pool.info()),
        }
    }

    pub(crate) fn typed_mut<T: Component>(&mut self) -> &mut ComponentPool<T> {
        let registered = self.pool.info();
        match self.pool.as_any_mut().downcast_mut::<ComponentPool<T>>() {
            Some(pool) => pool,
            None => id_collision::<T>(registered),
        }
    }
}

impl Clone for PoolEntry {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            pool: self.pool.clone_boxed(),
        }
    }
}

#[cold]
fn id_collision<T: Component>(registered: ComponentInfo) -> ! {
    panic!(
        "component id {} is claimed by both {} and {}",
        T::ID,
        registered.name,
        T::NAME
    )
}

/// Every registered pool, located by linear scan over component ids.
///
/// The number of component types in a process is small and fixed, so the
/// scan beats hashing in practice.
#[derive(Clone, Default)]
pub struct PoolTable {
    pub(crate) entries: Vec<PoolEntry>,
    /// Initial capacity handed to newly registered pools.
    pub(crate) component_capacity: usize,
}

impl PoolTable {
    pub(crate) fn new(component_capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            component_capacity,
        }
    }

    #[inline]
    pub(crate) fn slot_of(&self, id: ComponentId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    /// Slot for `T`, registering an empty pool on first use.
    ///
    /// The pool is fully built before the record is pushed, so a panic
    /// during construction leaves the table unchanged.
    pub(crate) fn assure<T: Component>(&mut self) -> usize {
        if let Some(slot) = self.slot_of(T::ID) {
            self.entries[slot].typed::<T>();
            return slot;
        }
        let entry = PoolEntry::new::<T>(self.component_capacity);
        self.entries.push(entry);
        tracing::debug!(
            component = T::NAME,
            id = T::ID,
            tag = ComponentPool::<T>::IS_TAG,
            "registered component pool"
        );
        self.entries.len() - 1
    }

    pub(crate) fn get<T: Component>(&self) -> Option<&ComponentPool<T>> {
        self.slot_of(T::ID).map(|slot| self.entries[slot].typed::<T>())
    }

    pub(crate) fn get_mut<T: Component>(&mut self) -> &mut ComponentPool<T> {
        let slot = self.assure::<T>();
        self.entries[slot].typed_mut::<T>()
    }

    /// Borrow several distinct entries mutably at once.
    ///
    /// # Panics
    /// Panics if a slot is listed twice, i.e. a component set names one
    /// component type more than once.
    pub(crate) fn disjoint_mut<const N: usize>(&mut self, slots: [usize; N]) -> [&mut PoolEntry; N] {
        match self.entries.get_disjoint_mut(slots) {
            Ok(entries) => entries,
            Err(err) => panic!("component set borrows one pool twice: {err}"),
        }
    }

    pub(crate) fn infos(&self) -> impl Iterator<Item = ComponentInfo> + '_ {
        self.entries.iter().map(|entry| entry.pool.info())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::{Pod, Zeroable};

    #[repr(C)]
    #[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
    struct Charge {
        amount: u16,
    }
    crate::define_component!(Charge, 301, "Charge");

    #[repr(C)]
    #[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
    struct Impostor {
        amount: u16,
    }
    crate::define_component!(Impostor, 301, "Impostor");

    #[repr(C)]
    #[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
    struct Spin {
        rate: f32,
    }
    crate::define_component!(Spin, 302, "Spin");

    #[test]
    fn assure_registers_once() {
        let mut table = PoolTable::new(4);
        let first = table.assure::<Charge>();
        let second = table.assure::<Charge>();
        assert_eq!(first, second);
        assert_eq!(table.entries.len(), 1);
        assert!(table.get::<Spin>().is_none());
    }

    #[test]
    fn erased_remove_and_clone_reach_the_typed_pool() {
        let mut table = PoolTable::default();
        let e = Entity::from_raw(3);
        table.get_mut::<Charge>().insert(e, Charge { amount: 9 });

        let copy = table.entries[0].clone();
        table.entries[0].pool.remove_member(e);

        assert!(!table.entries[0].pool.has_member(e));
        assert_eq!(copy.typed::<Charge>().get(e), &Charge { amount: 9 });
    }

    #[test]
    #[should_panic(expected = "claimed by both Charge and Impostor")]
    fn id_collision_is_loud() {
        let mut table = PoolTable::default();
        table.assure::<Charge>();
        table.assure::<Impostor>();
    }

    #[test]
    #[should_panic(expected = "borrows one pool twice")]
    fn disjoint_borrow_rejects_duplicates() {
        let mut table = PoolTable::default();
        let slot = table.assure::<Spin>();
        table.disjoint_mut([slot, slot]);
    }
}
