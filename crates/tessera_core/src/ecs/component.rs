// component.rs - Component identity and layout metadata
//
// Components are identified by u32 IDs, not Rust TypeIds.
// The ID is stable across processes, so archives can name their blocks by it.

use bytemuck::Pod;
use std::mem::{align_of, size_of};

pub type ComponentId = u32;

/// Trait for component payloads.
///
/// Components are plain old data: `Pod` lets persistence write the dense
/// array as raw bytes and lets snapshots copy values without running any
/// user code. A zero-sized type is a *tag*; its container stores no values.
pub trait Component: Pod + Send + Sync {
    /// Process-wide unique component ID.
    const ID: ComponentId;

    /// Human-readable name for diagnostics.
    const NAME: &'static str;
}

/// Layout description of a registered component type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComponentInfo {
    pub id: ComponentId,
    pub name: &'static str,
    pub size: usize,
    pub align: usize,
}

impl ComponentInfo {
    pub fn of<T: Component>() -> Self {
        Self {
            id: T::ID,
            name: T::NAME,
            size: size_of::<T>(),
            align: align_of::<T>(),
        }
    }

    /// True for data-less marker components.
    #[inline]
    pub fn is_tag(&self) -> bool {
        self.size == 0
    }
}

/// Helper macro to implement the Component trait.
///
/// # Example
/// ```ignore
/// #[repr(C)]
/// #[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
/// struct Position { x: f32, y: f32 }
///
/// define_component!(Position, 1, "Position");
/// ```
#[macro_export]
macro_rules! define_component {
    ($ty:ty, $id:expr, $name:expr) => {
        impl $crate::ecs::Component for $ty {
            const ID: $crate::ecs::ComponentId = $id;
            const NAME: &'static str = $name;
        }
    };
}
