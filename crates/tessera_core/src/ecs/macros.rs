//! Convenience macros for entity spawning

/// Create an entity and attach components in one call.
///
/// Expands to [`Registry::create_with`](crate::ecs::Registry::create_with)
/// and evaluates to the new entity. Up to eight components are accepted.
///
/// # Examples
///
/// ```ignore
/// // Single component
/// let entity = spawn!(registry, Position { x: 0.0, y: 0.0 });
///
/// // Multiple components
/// let entity = spawn!(registry,
///     Position { x: 0.0, y: 0.0 },
///     Velocity { x: 1.0, y: 1.0 },
///     Enemy,
/// );
/// ```
#[macro_export]
macro_rules! spawn {
    ($registry:expr, $component:expr $(,)?) => {
        $registry.create_with($component).0
    };
    ($registry:expr $(, $component:expr)+ $(,)?) => {
        $registry.create_with(($($component,)+)).0
    };
}

#[cfg(test)]
mod tests {
    use crate::ecs::Registry;
    use bytemuck::{Pod, Zeroable};

    #[repr(C)]
    #[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
    struct Score {
        points: u32,
    }
    crate::define_component!(Score, 801, "Score");

    #[repr(C)]
    #[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
    struct Lives {
        count: u8,
    }
    crate::define_component!(Lives, 802, "Lives");

    #[test]
    fn spawn_attaches_every_component() {
        let mut registry = Registry::new();
        let solo = crate::spawn!(registry, Score { points: 1 });
        let pair = crate::spawn!(registry, Score { points: 2 }, Lives { count: 3 },);

        assert!(registry.has_component::<Score>(solo));
        assert!(!registry.has_component::<Lives>(solo));
        let (score, lives) = registry.get_component::<(Score, Lives)>(pair);
        assert_eq!((score.points, lives.count), (2, 3));
    }
}
