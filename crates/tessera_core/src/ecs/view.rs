// view.rs - Iteration over entities holding every component of a set
//
// A View borrows each pool of its set exclusively for its whole lifetime,
// so adding or removing components while a view is alive does not compile.
// Scans walk the smallest pool and skip entities missing from the others.

use crate::ecs::{Component, ComponentPool, ComponentSet, Entity};

/// Borrowed window over the pools named by `Q`.
///
/// Obtained from [`Registry::view`](crate::ecs::Registry::view).
pub struct View<'w, Q: ComponentSet> {
    pools: Q::Pools<'w>,
}

impl<'w, Q: ComponentSet> View<'w, Q> {
    pub(crate) fn new(pools: Q::Pools<'w>) -> Self {
        Self { pools }
    }

    /// Upper bound on the number of matching entities: the length of the
    /// smallest pool in the set.
    pub fn size(&self) -> usize {
        Q::size(&self.pools)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        Q::contains_all(&self.pools, entity)
    }

    /// # Panics
    /// Panics if `entity` lacks any component of the set.
    pub fn get(&self, entity: Entity) -> Q::Refs<'_> {
        match Q::get_refs(&self.pools, entity) {
            Some(refs) => refs,
            None => missing::<Q>(entity),
        }
    }

    pub fn try_get(&self, entity: Entity) -> Option<Q::Refs<'_>> {
        Q::get_refs(&self.pools, entity)
    }

    /// # Panics
    /// Panics if `entity` lacks any component of the set.
    pub fn get_mut(&mut self, entity: Entity) -> Q::Muts<'_> {
        match Q::get_muts(&mut self.pools, entity) {
            Some(muts) => muts,
            None => missing::<Q>(entity),
        }
    }

    pub fn try_get_mut(&mut self, entity: Entity) -> Option<Q::Muts<'_>> {
        Q::get_muts(&mut self.pools, entity)
    }

    /// One component of the set for `entity`.
    ///
    /// # Panics
    /// Panics if `T` is not part of the set or `entity` has no `T`.
    pub fn component<T: Component>(&self, entity: Entity) -> &T {
        self.pool::<T>().get(entity)
    }

    /// # Panics
    /// Panics if `T` is not part of the set or `entity` has no `T`.
    pub fn component_mut<T: Component>(&mut self, entity: Entity) -> &mut T {
        self.pool_mut::<T>().get_mut(entity)
    }

    /// Direct access to one of the viewed pools.
    ///
    /// # Panics
    /// Panics if `T` is not part of the set.
    pub fn pool<T: Component>(&self) -> &ComponentPool<T> {
        match Q::pool_ref::<T>(&self.pools) {
            Some(pool) => pool,
            None => not_in_set::<Q, T>(),
        }
    }

    pub fn pool_mut<T: Component>(&mut self) -> &mut ComponentPool<T> {
        match Q::pool_mut::<T>(&mut self.pools) {
            Some(pool) => pool,
            None => not_in_set::<Q, T>(),
        }
    }

    /// Matching entities in scan order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + use<'_, 'w, Q> {
        self.iter().map(|(entity, _)| entity)
    }

    pub fn iter(&self) -> ViewIter<'_, 'w, Q> {
        let anchor = Q::anchor(&self.pools);
        ViewIter {
            pools: &self.pools,
            candidates: Q::anchor_entities(&self.pools, anchor),
            next: 0,
        }
    }
}

/// Single-component views have nothing to filter and walk the dense
/// arrays directly.
impl<C: Component> View<'_, C> {
    pub fn each<F: FnMut(&mut C)>(&mut self, mut f: F) {
        self.pools.for_each_mut(|_, component| f(component));
    }

    pub fn each_with_entity<F: FnMut(Entity, &mut C)>(&mut self, f: F) {
        self.pools.for_each_mut(f);
    }
}

macro_rules! impl_each {
    ($(($ty:ident, $var:ident)),+) => {
        impl<$($ty: Component),+> View<'_, ($($ty,)+)> {
            /// Call `f` with every matching entity's components.
            pub fn each<Func: FnMut($(&mut $ty),+)>(&mut self, mut f: Func) {
                self.each_with_entity(|_, $($var),+| f($($var),+));
            }

            pub fn each_with_entity<Func: FnMut(Entity, $(&mut $ty),+)>(&mut self, mut f: Func) {
                let anchor = <($($ty,)+) as ComponentSet>::anchor(&self.pools);
                let count = <($($ty,)+) as ComponentSet>::anchor_entities(&self.pools, anchor).len();
                for pos in 0..count {
                    let entity = <($($ty,)+) as ComponentSet>::anchor_entities(&self.pools, anchor)[pos];
                    if let Some(($($var,)+)) = <($($ty,)+) as ComponentSet>::get_muts(&mut self.pools, entity) {
                        f(entity, $($var),+);
                    }
                }
            }
        }
    };
}

impl_each!((A, a), (B, b));
impl_each!((A, a), (B, b), (C, c));
impl_each!((A, a), (B, b), (C, c), (D, d));
impl_each!((A, a), (B, b), (C, c), (D, d), (E, e));
impl_each!((A, a), (B, b), (C, c), (D, d), (E, e), (F, f_));
impl_each!((A, a), (B, b), (C, c), (D, d), (E, e), (F, f_), (G, g));
impl_each!((A, a), (B, b), (C, c), (D, d), (E, e), (F, f_), (G, g), (H, h));

/// Iterator over `(entity, shared refs)` for every match of a view.
pub struct ViewIter<'v, 'w, Q: ComponentSet> {
    pools: &'v Q::Pools<'w>,
    candidates: &'v [Entity],
    next: usize,
}

impl<'v, 'w, Q: ComponentSet> Iterator for ViewIter<'v, 'w, Q> {
    type Item = (Entity, Q::Refs<'v>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&entity) = self.candidates.get(self.next) {
            self.next += 1;
            if let Some(refs) = Q::get_refs(self.pools, entity) {
                return Some((entity, refs));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.candidates.len() - self.next))
    }
}

impl<'v, 'w, Q: ComponentSet> IntoIterator for &'v View<'w, Q> {
    type Item = (Entity, Q::Refs<'v>);
    type IntoIter = ViewIter<'v, 'w, Q>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cold]
fn missing<Q: ComponentSet>(entity: Entity) -> ! {
    let names: Vec<&str> = Q::infos().iter().map(|info| info.name).collect();
    panic!("entity {entity} is missing one of [{}]", names.join(", "))
}

#[cold]
fn not_in_set<Q: ComponentSet, T: Component>() -> ! {
    let names: Vec<&str> = Q::infos().iter().map(|info| info.name).collect();
    panic!("{} is not part of the viewed set [{}]", T::NAME, names.join(", "))
}
