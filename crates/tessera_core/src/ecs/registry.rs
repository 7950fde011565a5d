// registry.rs - Entity lifecycle and heterogeneous component storage
//
// The Registry owns one type-erased pool per component type, the set of
// live entities, and the destroy queue. Destruction is deferred: systems
// enqueue entities mid-frame and the game loop purges them at a sync point.

use crate::ecs::erased::PoolTable;
use crate::ecs::{
    Component, ComponentInfo, ComponentPool, ComponentSet, Entity, EntityIdGenerator,
    RegistryConfig, SortAlgorithm, SparseSet, View,
};
use std::cmp::Ordering;
use tessera_metrics::{metrics, Counter};

/// Entities waiting for [`Registry::remove_requested_entities`].
#[derive(Debug, Clone, Default)]
pub struct DestroyQueue {
    entities: Vec<Entity>,
}

impl DestroyQueue {
    /// Queue `entity` for removal at the next flush.
    ///
    /// Queuing the same entity twice is harmless; the second request is
    /// skipped when the queue is drained.
    pub fn push(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }

    pub fn as_slice(&self) -> &[Entity] {
        &self.entities
    }

    pub(crate) fn from_vec(entities: Vec<Entity>) -> Self {
        Self { entities }
    }
}

/// Owner of every entity and component in a world.
///
/// `&self` accessors never register pools: asking about a component type
/// nobody has used yet behaves like asking an empty pool. `&mut self`
/// entry points register pools on first use.
#[derive(Clone)]
pub struct Registry {
    pub(crate) pools: PoolTable,
    pub(crate) live: SparseSet,
    pub(crate) pending: DestroyQueue,
    pub(crate) ids: EntityIdGenerator,
    config: RegistryConfig,
    counters: Counter,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            pools: PoolTable::new(config.component_capacity),
            live: SparseSet::with_capacity(config.entity_capacity),
            pending: DestroyQueue::default(),
            ids: EntityIdGenerator::new(),
            config,
            counters: Counter::new(),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Lifecycle counters (all zero unless the `metrics` feature is on).
    pub fn counters(&self) -> &Counter {
        &self.counters
    }

    // ------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------

    /// Allocate a fresh entity. Ids are never reused.
    pub fn create(&mut self) -> Entity {
        let entity = self.ids.allocate();
        self.live.insert(entity);
        metrics! {
            self.counters.increment("entities_created", 1);
        }
        entity
    }

    /// Allocate an entity and attach every component of `components`.
    ///
    /// Returns the entity plus exclusive references to the stored values.
    ///
    /// # Panics
    /// Panics if the set names one component type twice.
    pub fn create_with<Q: ComponentSet>(&mut self, components: Q) -> (Entity, Q::Muts<'_>) {
        let infos = Q::infos();
        for (i, info) in infos.iter().enumerate() {
            assert!(
                infos[..i].iter().all(|seen| seen.id != info.id),
                "component set names {} twice",
                info.name
            );
        }
        let entity = self.create();
        components.insert_into(&mut self.pools, entity);
        match Q::fetch_from(Q::pools_mut(&mut self.pools), entity) {
            Some(muts) => (entity, muts),
            None => unreachable!("components of {entity} were just inserted"),
        }
    }

    /// Request destruction of `entity` at the next
    /// [`remove_requested_entities`](Self::remove_requested_entities).
    ///
    /// The entity stays alive, and all its components stay readable, until
    /// the queue is flushed.
    pub fn destroy(&mut self, entity: Entity) {
        debug_assert!(self.live.contains(entity), "destroy of dead entity {entity}");
        self.pending.push(entity);
        metrics! {
            self.counters.increment("entities_queued", 1);
        }
    }

    /// Purge every queued entity from every pool and from the live set.
    ///
    /// Returns the number of entities actually removed. Requests for
    /// entities that are already gone are skipped.
    pub fn remove_requested_entities(&mut self) -> usize {
        let mut queue = std::mem::take(&mut self.pending.entities);
        let mut removed = 0;
        for &entity in &queue {
            if !self.live.contains(entity) {
                tracing::warn!(%entity, "ignoring destroy request for an entity that is not alive");
                continue;
            }
            for entry in &mut self.pools.entries {
                if entry.pool.has_member(entity) {
                    entry.pool.remove_member(entity);
                }
            }
            self.live.remove(entity);
            removed += 1;
        }
        queue.clear();
        self.pending.entities = queue;

        if removed > 0 {
            tracing::trace!(removed, alive = self.live.len(), "flushed destroy queue");
        }
        metrics! {
            self.counters.increment("entities_purged", removed);
        }
        removed
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.live.contains(entity)
    }

    pub fn is_pending_destroy(&self, entity: Entity) -> bool {
        self.pending.contains(entity)
    }

    /// Live entities in dense order.
    pub fn live_entities(&self) -> &[Entity] {
        self.live.entities()
    }

    pub fn pending_destroy(&self) -> &DestroyQueue {
        &self.pending
    }

    /// Number of live entities, including those queued for destruction.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Remove every entity and component. Registered pools stay registered
    /// and the id generator keeps counting, so old handles stay dead.
    pub fn clear(&mut self) {
        for entry in &mut self.pools.entries {
            entry.pool.clear_members();
        }
        self.live.clear();
        self.pending.entities.clear();
        tracing::debug!(pools = self.pools.entries.len(), "registry cleared");
    }

    // ------------------------------------------------------------------
    // Component types
    // ------------------------------------------------------------------

    /// Create the pool for `T` if it does not exist yet.
    pub fn register<T: Component>(&mut self) {
        self.pools.assure::<T>();
    }

    /// Register every component type in `Q`.
    pub fn register_set<Q: ComponentSet>(&mut self) {
        Q::register(&mut self.pools);
    }

    pub fn is_registered<T: Component>(&self) -> bool {
        self.pools.slot_of(T::ID).is_some()
    }

    /// Layout of every registered component type, in registration order.
    pub fn registered_components(&self) -> impl Iterator<Item = ComponentInfo> + '_ {
        self.pools.infos()
    }

    // ------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------

    /// Attach `value` to `entity` and return the stored value.
    ///
    /// # Panics
    /// Panics if `entity` already has a `T`.
    pub fn add_component<T: Component>(&mut self, entity: Entity, value: T) -> &mut T {
        debug_assert!(self.live.contains(entity), "add {} to dead entity {entity}", T::NAME);
        self.pools.get_mut::<T>().insert(entity, value)
    }

    /// Detach and return `entity`'s `T`.
    ///
    /// # Panics
    /// Panics if `entity` has no `T`.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> T {
        self.pools.get_mut::<T>().remove(entity)
    }

    /// True when `entity` has every component of `Q`.
    pub fn has_component<Q: ComponentSet>(&self, entity: Entity) -> bool {
        Q::contained_in(&self.pools, entity)
    }

    /// # Panics
    /// Panics if `entity` lacks any component of `Q`.
    pub fn get_component<Q: ComponentSet>(&self, entity: Entity) -> Q::Refs<'_> {
        match Q::fetch(&self.pools, entity) {
            Some(refs) => refs,
            None => missing::<Q>(entity),
        }
    }

    /// # Panics
    /// Panics if `entity` lacks any component of `Q`, or if `Q` names one
    /// type twice.
    pub fn get_component_mut<Q: ComponentSet>(&mut self, entity: Entity) -> Q::Muts<'_> {
        match Q::fetch_from(Q::pools_mut(&mut self.pools), entity) {
            Some(muts) => muts,
            None => missing::<Q>(entity),
        }
    }

    pub fn try_get_component<Q: ComponentSet>(&self, entity: Entity) -> Option<Q::Refs<'_>> {
        Q::fetch(&self.pools, entity)
    }

    pub fn try_get_component_mut<Q: ComponentSet>(&mut self, entity: Entity) -> Option<Q::Muts<'_>> {
        Q::fetch_from(Q::pools_mut(&mut self.pools), entity)
    }

    /// Number of entities holding a `T`.
    pub fn component_count<T: Component>(&self) -> usize {
        self.pools.get::<T>().map_or(0, ComponentPool::len)
    }

    /// The typed pool for `T`, if registered.
    pub fn pool<T: Component>(&self) -> Option<&ComponentPool<T>> {
        self.pools.get::<T>()
    }

    /// The typed pool for `T`, registering it on first use.
    pub fn pool_mut<T: Component>(&mut self) -> &mut ComponentPool<T> {
        self.pools.get_mut::<T>()
    }

    // ------------------------------------------------------------------
    // Ordering
    // ------------------------------------------------------------------

    /// Reorder `T`'s pool by component value.
    pub fn sort_by<T, F>(&mut self, compare: F, algorithm: SortAlgorithm)
    where
        T: Component,
        F: FnMut(&T, &T) -> Ordering,
    {
        self.pools.get_mut::<T>().sort_by(compare, algorithm);
    }

    /// Reorder `T`'s pool by entity.
    pub fn sort_entities_by<T, F>(&mut self, compare: F, algorithm: SortAlgorithm)
    where
        T: Component,
        F: FnMut(&Entity, &Entity) -> Ordering,
    {
        self.pools.get_mut::<T>().sort_entities_by(compare, algorithm);
    }

    /// Reorder `T`'s pool so entities shared with `U` come first, in `U`'s
    /// order. Iterating both pools afterwards walks memory in lockstep.
    ///
    /// # Panics
    /// Panics if `T` and `U` are the same type.
    pub fn sort_like<T: Component, U: Component>(&mut self) {
        let slots = [self.pools.assure::<T>(), self.pools.assure::<U>()];
        let [target, reference] = self.pools.disjoint_mut(slots);
        target
            .typed_mut::<T>()
            .sort_like(reference.typed::<U>().sparse_set());
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// Borrow the pools of `Q` for iteration.
    ///
    /// # Panics
    /// Panics if `Q` names one type twice.
    pub fn view<Q: ComponentSet>(&mut self) -> View<'_, Q> {
        View::new(Q::pools_mut(&mut self.pools))
    }

    /// A view plus the destroy queue, so a system can request destruction
    /// while it iterates.
    pub fn view_and_queue<Q: ComponentSet>(&mut self) -> (View<'_, Q>, &mut DestroyQueue) {
        (View::new(Q::pools_mut(&mut self.pools)), &mut self.pending)
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Deep copy of the entity lifecycle state plus the pools of `Q`.
    ///
    /// The snapshot shares nothing with `self`. Its counters start at zero.
    ///
    /// # Panics
    /// Panics if a type in `Q` has never been registered.
    pub fn snapshot<Q: ComponentSet>(&self) -> Registry {
        let mut pools = PoolTable::new(self.pools.component_capacity);
        for info in Q::infos() {
            let Some(slot) = self.pools.slot_of(info.id) else {
                panic!("cannot snapshot {}: component type was never registered", info.name);
            };
            if pools.slot_of(info.id).is_none() {
                pools.entries.push(self.pools.entries[slot].clone());
            }
        }
        tracing::debug!(
            pools = pools.entries.len(),
            entities = self.live.len(),
            "registry snapshot taken"
        );
        Registry {
            pools,
            live: self.live.clone(),
            pending: self.pending.clone(),
            ids: self.ids.clone(),
            config: self.config.clone(),
            counters: Counter::new(),
        }
    }
}

#[cold]
fn missing<Q: ComponentSet>(entity: Entity) -> ! {
    let names: Vec<&str> = Q::infos().iter().map(|info| info.name).collect();
    panic!("entity {entity} is missing one of [{}]", names.join(", "))
}
