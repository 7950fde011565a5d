// query.rs - Compile-time component sets
//
// A ComponentSet is either a single component type or a tuple of 2 to 8
// of them. It resolves the set's pools in one pass and fetches shared or
// exclusive references for one entity. Registry accessors and View are
// written once against this trait instead of once per arity.

use crate::ecs::erased::PoolTable;
use crate::ecs::{Component, ComponentInfo, ComponentPool, Entity};
use std::any::Any;

mod sealed {
    pub trait Sealed {}
}

/// A statically known list of component types.
///
/// Implemented for every [`Component`] and for tuples of 2 to 8 components.
/// Listing one type twice is rejected with a panic wherever the set needs
/// exclusive access to its pools.
pub trait ComponentSet: sealed::Sealed + Sized + 'static {
    /// Shared references, one per component.
    type Refs<'a>;
    /// Exclusive references, one per component.
    type Muts<'a>;
    /// Exclusive borrows of every pool in the set.
    type Pools<'a>;

    #[doc(hidden)]
    fn infos() -> Vec<ComponentInfo>;

    #[doc(hidden)]
    fn register(table: &mut PoolTable);

    #[doc(hidden)]
    fn insert_into(self, table: &mut PoolTable, entity: Entity);

    #[doc(hidden)]
    fn contained_in(table: &PoolTable, entity: Entity) -> bool;

    #[doc(hidden)]
    fn fetch(table: &PoolTable, entity: Entity) -> Option<Self::Refs<'_>>;

    #[doc(hidden)]
    fn pools_mut(table: &mut PoolTable) -> Self::Pools<'_>;

    #[doc(hidden)]
    fn fetch_from<'a>(pools: Self::Pools<'a>, entity: Entity) -> Option<Self::Muts<'a>>;

    /// Position of the smallest pool in the set.
    #[doc(hidden)]
    fn anchor(pools: &Self::Pools<'_>) -> usize;

    #[doc(hidden)]
    fn anchor_entities<'p>(pools: &'p Self::Pools<'_>, anchor: usize) -> &'p [Entity];

    #[doc(hidden)]
    fn size(pools: &Self::Pools<'_>) -> usize;

    #[doc(hidden)]
    fn contains_all(pools: &Self::Pools<'_>, entity: Entity) -> bool;

    #[doc(hidden)]
    fn get_refs<'p>(pools: &'p Self::Pools<'_>, entity: Entity) -> Option<Self::Refs<'p>>;

    #[doc(hidden)]
    fn get_muts<'p>(pools: &'p mut Self::Pools<'_>, entity: Entity) -> Option<Self::Muts<'p>>;

    #[doc(hidden)]
    fn pool_ref<'p, T: Component>(pools: &'p Self::Pools<'_>) -> Option<&'p ComponentPool<T>>;

    #[doc(hidden)]
    fn pool_mut<'p, T: Component>(pools: &'p mut Self::Pools<'_>) -> Option<&'p mut ComponentPool<T>>;
}

impl<C: Component> sealed::Sealed for C {}

impl<C: Component> ComponentSet for C {
    type Refs<'a> = &'a C;
    type Muts<'a> = &'a mut C;
    type Pools<'a> = &'a mut ComponentPool<C>;

    fn infos() -> Vec<ComponentInfo> {
        vec![ComponentInfo::of::<C>()]
    }

    fn register(table: &mut PoolTable) {
        table.assure::<C>();
    }

    fn insert_into(self, table: &mut PoolTable, entity: Entity) {
        table.get_mut::<C>().insert(entity, self);
    }

    fn contained_in(table: &PoolTable, entity: Entity) -> bool {
        table.get::<C>().is_some_and(|pool| pool.contains(entity))
    }

    fn fetch(table: &PoolTable, entity: Entity) -> Option<&C> {
        table.get::<C>()?.try_get(entity)
    }

    fn pools_mut(table: &mut PoolTable) -> &mut ComponentPool<C> {
        table.get_mut::<C>()
    }

    fn fetch_from<'a>(pools: Self::Pools<'a>, entity: Entity) -> Option<Self::Muts<'a>> {
        pools.try_get_mut(entity)
    }

    fn anchor(_pools: &Self::Pools<'_>) -> usize {
        0
    }

    fn anchor_entities<'p>(pools: &'p Self::Pools<'_>, _anchor: usize) -> &'p [Entity] {
        pools.entities()
    }

    fn size(pools: &Self::Pools<'_>) -> usize {
        pools.len()
    }

    fn contains_all(pools: &Self::Pools<'_>, entity: Entity) -> bool {
        pools.contains(entity)
    }

    fn get_refs<'p>(pools: &'p Self::Pools<'_>, entity: Entity) -> Option<Self::Refs<'p>> {
        pools.try_get(entity)
    }

    fn get_muts<'p>(pools: &'p mut Self::Pools<'_>, entity: Entity) -> Option<Self::Muts<'p>> {
        pools.try_get_mut(entity)
    }

    fn pool_ref<'p, T: Component>(pools: &'p Self::Pools<'_>) -> Option<&'p ComponentPool<T>> {
        (&**pools as &dyn Any).downcast_ref()
    }

    fn pool_mut<'p, T: Component>(pools: &'p mut Self::Pools<'_>) -> Option<&'p mut ComponentPool<T>> {
        (&mut **pools as &mut dyn Any).downcast_mut()
    }
}

macro_rules! impl_component_set {
    ($count:literal; $(($ty:ident, $var:ident, $idx:tt)),+) => {
        impl<$($ty: Component),+> sealed::Sealed for ($($ty,)+) {}

        impl<$($ty: Component),+> ComponentSet for ($($ty,)+) {
            type Refs<'a> = ($(&'a $ty,)+);
            type Muts<'a> = ($(&'a mut $ty,)+);
            type Pools<'a> = ($(&'a mut ComponentPool<$ty>,)+);

            fn infos() -> Vec<ComponentInfo> {
                vec![$(ComponentInfo::of::<$ty>()),+]
            }

            fn register(table: &mut PoolTable) {
                $(table.assure::<$ty>();)+
            }

            fn insert_into(self, table: &mut PoolTable, entity: Entity) {
                let ($($var,)+) = self;
                $(table.get_mut::<$ty>().insert(entity, $var);)+
            }

            fn contained_in(table: &PoolTable, entity: Entity) -> bool {
                $(table.get::<$ty>().is_some_and(|pool| pool.contains(entity)))&&+
            }

            fn fetch(table: &PoolTable, entity: Entity) -> Option<Self::Refs<'_>> {
                Some(($(table.get::<$ty>()?.try_get(entity)?,)+))
            }

            fn pools_mut(table: &mut PoolTable) -> Self::Pools<'_> {
                let slots = [$(table.assure::<$ty>()),+];
                let [$($var),+] = table.disjoint_mut(slots);
                ($($var.typed_mut::<$ty>(),)+)
            }

            fn fetch_from<'a>(pools: Self::Pools<'a>, entity: Entity) -> Option<Self::Muts<'a>> {
                let ($($var,)+) = pools;
                $(if !$var.contains(entity) { return None; })+
                Some(($($var.get_mut(entity),)+))
            }

            fn anchor(pools: &Self::Pools<'_>) -> usize {
                let lens: [usize; $count] = [$(pools.$idx.len()),+];
                let mut best = 0;
                for (i, &len) in lens.iter().enumerate() {
                    if len < lens[best] {
                        best = i;
                    }
                }
                best
            }

            fn anchor_entities<'p>(pools: &'p Self::Pools<'_>, anchor: usize) -> &'p [Entity] {
                $(if anchor == $idx { return pools.$idx.entities(); })+
                unreachable!("anchor {anchor} outside a set of {}", $count)
            }

            fn size(pools: &Self::Pools<'_>) -> usize {
                let lens: [usize; $count] = [$(pools.$idx.len()),+];
                lens.into_iter().min().unwrap_or(0)
            }

            fn contains_all(pools: &Self::Pools<'_>, entity: Entity) -> bool {
                $(pools.$idx.contains(entity))&&+
            }

            fn get_refs<'p>(pools: &'p Self::Pools<'_>, entity: Entity) -> Option<Self::Refs<'p>> {
                Some(($(pools.$idx.try_get(entity)?,)+))
            }

            fn get_muts<'p>(pools: &'p mut Self::Pools<'_>, entity: Entity) -> Option<Self::Muts<'p>> {
                if !Self::contains_all(pools, entity) {
                    return None;
                }
                let ($($var,)+) = pools;
                Some(($($var.get_mut(entity),)+))
            }

            fn pool_ref<'p, T: Component>(pools: &'p Self::Pools<'_>) -> Option<&'p ComponentPool<T>> {
                $(
                    if let Some(pool) = (&*pools.$idx as &dyn Any).downcast_ref::<ComponentPool<T>>() {
                        return Some(pool);
                    }
                )+
                None
            }

            fn pool_mut<'p, T: Component>(pools: &'p mut Self::Pools<'_>) -> Option<&'p mut ComponentPool<T>> {
                let ($($var,)+) = pools;
                $(
                    if let Some(pool) = (&mut **$var as &mut dyn Any).downcast_mut::<ComponentPool<T>>() {
                        return Some(pool);
                    }
                )+
                None
            }
        }
    };
}

impl_component_set!(2; (A, a, 0), (B, b, 1));
impl_component_set!(3; (A, a, 0), (B, b, 1), (C, c, 2));
impl_component_set!(4; (A, a, 0), (B, b, 1), (C, c, 2), (D, d, 3));
impl_component_set!(5; (A, a, 0), (B, b, 1), (C, c, 2), (D, d, 3), (E, e, 4));
impl_component_set!(6; (A, a, 0), (B, b, 1), (C, c, 2), (D, d, 3), (E, e, 4), (F, f, 5));
impl_component_set!(7; (A, a, 0), (B, b, 1), (C, c, 2), (D, d, 3), (E, e, 4), (F, f, 5), (G, g, 6));
impl_component_set!(8; (A, a, 0), (B, b, 1), (C, c, 2), (D, d, 3), (E, e, 4), (F, f, 5), (G, g, 6), (H, h, 7));

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::{Pod, Zeroable};

    #[repr(C)]
    #[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
    struct Heat {
        kelvin: f32,
    }
    crate::define_component!(Heat, 401, "Heat");

    #[repr(C)]
    #[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
    struct Fuel {
        litres: f32,
    }
    crate::define_component!(Fuel, 402, "Fuel");

    fn e(id: u64) -> Entity {
        Entity::from_raw(id)
    }

    #[test]
    fn tuple_insert_and_fetch() {
        let mut table = PoolTable::default();
        <(Heat, Fuel)>::insert_into((Heat { kelvin: 300.0 }, Fuel { litres: 2.0 }), &mut table, e(0));
        Heat { kelvin: 10.0 }.insert_into(&mut table, e(1));

        assert!(<(Heat, Fuel)>::contained_in(&table, e(0)));
        assert!(!<(Heat, Fuel)>::contained_in(&table, e(1)));
        let (heat, fuel) = <(Heat, Fuel)>::fetch(&table, e(0)).unwrap();
        assert_eq!(heat.kelvin, 300.0);
        assert_eq!(fuel.litres, 2.0);
        assert!(<(Heat, Fuel)>::fetch(&table, e(1)).is_none());
    }

    #[test]
    fn single_component_fetch_from() {
        let mut table = PoolTable::default();
        <Heat as ComponentSet>::insert_into(Heat { kelvin: 1.0 }, &mut table, e(7));

        let pools = <Heat as ComponentSet>::pools_mut(&mut table);
        let heat = <Heat as ComponentSet>::fetch_from(pools, e(7)).unwrap();
        heat.kelvin = 2.0;
        let pools = <Heat as ComponentSet>::pools_mut(&mut table);
        assert!(<Heat as ComponentSet>::fetch_from(pools, e(8)).is_none());
        assert_eq!(<Heat as ComponentSet>::fetch(&table, e(7)).unwrap().kelvin, 2.0);
    }

    #[test]
    fn anchor_is_the_smallest_pool() {
        let mut table = PoolTable::default();
        for id in 0..5 {
            Heat { kelvin: 1.0 }.insert_into(&mut table, e(id));
        }
        Fuel { litres: 1.0 }.insert_into(&mut table, e(3));

        let pools = <(Heat, Fuel)>::pools_mut(&mut table);
        assert_eq!(<(Heat, Fuel)>::anchor(&pools), 1);
        assert_eq!(<(Heat, Fuel)>::size(&pools), 1);
        assert_eq!(<(Heat, Fuel)>::anchor_entities(&pools, 1), &[e(3)]);
    }

    #[test]
    fn pool_lookup_by_type() {
        let mut table = PoolTable::default();
        let mut pools = <(Heat, Fuel)>::pools_mut(&mut table);
        assert!(<(Heat, Fuel)>::pool_ref::<Fuel>(&pools).is_some());
        <(Heat, Fuel)>::pool_mut::<Heat>(&mut pools)
            .unwrap()
            .insert(e(2), Heat { kelvin: 5.0 });
        assert!(<(Heat, Fuel)>::pool_ref::<Heat>(&pools).unwrap().contains(e(2)));
    }

    #[test]
    #[should_panic(expected = "borrows one pool twice")]
    fn repeated_type_is_rejected() {
        let mut table = PoolTable::default();
        let _pools = <(Heat, Heat)>::pools_mut(&mut table);
    }
}
