// persist.rs - Binary registry archives
//
// Layout (all integers little-endian):
//   u64   next entity id
//   u64   live count, then that many u64 entity ids
//   u64   pending count, then that many u64 entity ids
//   u32   pool count
//   per pool:
//     u32   component id
//     u32   stride in bytes (0 for tags)
//     u64   member count, then that many u64 entity ids
//     raw   member count * stride bytes of component data
//
// The format carries no version. Reader and writer must agree on every
// component's id and layout.

use crate::ecs::erased::ErasedPool;
use crate::ecs::{DestroyQueue, Entity, EntityIdGenerator, PersistError, Registry, SparseSet};
use std::io::{Read, Write};

pub(crate) fn write_u32(writer: &mut dyn Write, value: u32) -> Result<(), PersistError> {
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}

pub(crate) fn write_u64(writer: &mut dyn Write, value: u64) -> Result<(), PersistError> {
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}

pub(crate) fn read_u32(reader: &mut dyn Read) -> Result<u32, PersistError> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub(crate) fn read_u64(reader: &mut dyn Read) -> Result<u64, PersistError> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Read exactly `len` bytes without trusting `len` for the allocation.
pub(crate) fn read_bytes(reader: &mut dyn Read, len: usize) -> Result<Vec<u8>, PersistError> {
    let mut bytes = Vec::new();
    reader.take(len as u64).read_to_end(&mut bytes)?;
    if bytes.len() != len {
        return Err(PersistError::Corrupt {
            reason: format!("expected {len} bytes of component data, found {}", bytes.len()),
        });
    }
    Ok(bytes)
}

impl Registry {
    /// Write every entity, the destroy queue and every registered pool.
    pub fn serialize<W: Write>(&self, mut writer: W) -> Result<(), PersistError> {
        let writer: &mut dyn Write = &mut writer;

        write_u64(writer, self.ids.peek())?;
        self.live.write_to(writer)?;
        write_u64(writer, self.pending.len() as u64)?;
        for entity in self.pending.as_slice() {
            write_u64(writer, entity.id())?;
        }

        write_u32(writer, self.pools.entries.len() as u32)?;
        for entry in &self.pools.entries {
            write_u32(writer, entry.id)?;
            entry.pool.save_block(writer)?;
        }
        writer.flush()?;

        tracing::debug!(
            entities = self.live.len(),
            pending = self.pending.len(),
            pools = self.pools.entries.len(),
            "registry serialized"
        );
        Ok(())
    }

    /// Replace this registry's contents with an archive written by
    /// [`serialize`](Self::serialize).
    ///
    /// Every component type in the archive must already be registered here.
    /// Registered pools absent from the archive end up empty. On error the
    /// registry is left untouched.
    pub fn deserialize<R: Read>(&mut self, mut reader: R) -> Result<(), PersistError> {
        let reader: &mut dyn Read = &mut reader;

        let next_id = read_u64(reader)?;
        let live = SparseSet::read_from(reader, "live entities", next_id)?;

        let pending_count = read_u64(reader)?;
        let mut pending = Vec::new();
        for _ in 0..pending_count {
            let entity = Entity::from_raw(read_u64(reader)?);
            if !live.contains(entity) {
                return Err(PersistError::Corrupt {
                    reason: format!("pending entity {entity} is not alive"),
                });
            }
            pending.push(entity);
        }

        let pool_count = read_u32(reader)?;
        let mut loaded: Vec<(usize, Box<dyn ErasedPool>)> = Vec::new();
        for _ in 0..pool_count {
            let component_id = read_u32(reader)?;
            let slot = self
                .pools
                .slot_of(component_id)
                .ok_or(PersistError::UnknownComponent { component_id })?;
            if loaded.iter().any(|(seen, _)| *seen == slot) {
                return Err(PersistError::Corrupt {
                    reason: format!("component id {component_id} appears twice"),
                });
            }
            let pool = self.pools.entries[slot].pool.load_block(reader, next_id)?;
            if let Some(stray) = pool.members().iter().find(|&&e| !live.contains(e)) {
                return Err(PersistError::Corrupt {
                    reason: format!("{} holds a component for dead entity {stray}", pool.info().name),
                });
            }
            loaded.push((slot, pool));
        }

        for entry in &mut self.pools.entries {
            entry.pool.clear_members();
        }
        for (slot, pool) in loaded {
            self.pools.entries[slot].pool = pool;
        }
        self.live = live;
        self.pending = DestroyQueue::from_vec(pending);
        self.ids = EntityIdGenerator::resume_at(next_id);

        tracing::debug!(
            entities = self.live.len(),
            pending = self.pending.len(),
            pools = pool_count,
            "registry deserialized"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::{Pod, Zeroable};

    #[repr(C)]
    #[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
    struct Position {
        x: f32,
        y: f32,
    }
    crate::define_component!(Position, 701, "Position");

    #[repr(C)]
    #[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
    struct Ammo {
        rounds: u16,
        clips: u16,
    }
    crate::define_component!(Ammo, 702, "Ammo");

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Enemy;
    unsafe impl Zeroable for Enemy {}
    unsafe impl Pod for Enemy {}
    crate::define_component!(Enemy, 703, "Enemy");

    fn empty_target() -> Registry {
        let mut registry = Registry::new();
        registry.register_set::<(Position, Ammo, Enemy)>();
        registry
    }

    fn populated() -> Registry {
        let mut registry = Registry::new();
        for i in 0..4 {
            let e = registry.create();
            registry.add_component(e, Position { x: i as f32, y: -(i as f32) });
            if i % 2 == 0 {
                registry.add_component(e, Ammo { rounds: 30, clips: i as u16 });
                registry.add_component(e, Enemy);
            }
        }
        let doomed = Entity::from_raw(3);
        registry.destroy(doomed);
        registry
    }

    fn archive(registry: &Registry) -> Vec<u8> {
        let mut bytes = Vec::new();
        registry.serialize(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn round_trip_restores_everything() {
        let source = populated();
        let mut target = empty_target();
        target.deserialize(archive(&source).as_slice()).unwrap();

        assert_eq!(target.live_entities(), source.live_entities());
        assert_eq!(target.pending_destroy().as_slice(), &[Entity::from_raw(3)]);
        for &e in source.live_entities() {
            assert_eq!(
                target.try_get_component::<Position>(e),
                source.try_get_component::<Position>(e)
            );
            assert_eq!(
                target.try_get_component::<Ammo>(e),
                source.try_get_component::<Ammo>(e)
            );
            assert_eq!(
                target.has_component::<Enemy>(e),
                source.has_component::<Enemy>(e)
            );
        }

        let fresh = target.create();
        assert_eq!(fresh.id(), 4);
        assert_eq!(target.remove_requested_entities(), 1);
    }

    #[test]
    fn dense_order_survives_the_round_trip() {
        let mut source = populated();
        source.sort_entities_by::<Position, _>(|a, b| b.cmp(a), Default::default());

        let mut target = empty_target();
        target.deserialize(archive(&source).as_slice()).unwrap();

        assert_eq!(
            target.pool::<Position>().unwrap().entities(),
            source.pool::<Position>().unwrap().entities()
        );
    }

    #[test]
    fn registered_pools_missing_from_the_archive_are_emptied() {
        let mut source = Registry::new();
        let e = source.create();
        source.add_component(e, Position { x: 1.0, y: 1.0 });

        let mut target = empty_target();
        let stale = target.create();
        target.add_component(stale, Ammo { rounds: 1, clips: 1 });

        target.deserialize(archive(&source).as_slice()).unwrap();
        assert_eq!(target.component_count::<Ammo>(), 0);
        assert_eq!(target.component_count::<Position>(), 1);
    }

    #[test]
    fn unknown_component_is_rejected_without_side_effects() {
        let source = populated();
        let mut target = Registry::new();
        target.register::<Position>();
        let keep = target.create();
        target.add_component(keep, Position { x: 7.0, y: 7.0 });

        let err = target.deserialize(archive(&source).as_slice()).unwrap_err();
        assert!(matches!(err, PersistError::UnknownComponent { component_id: 702 }));
        assert_eq!(target.live_entities(), &[keep]);
        assert_eq!(target.get_component::<Position>(keep).x, 7.0);
    }

    #[test]
    fn truncated_archive_is_an_io_error() {
        let bytes = archive(&populated());
        let mut target = empty_target();
        let err = target.deserialize(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(err, PersistError::Corrupt { .. } | PersistError::Io(_)));
        assert!(target.is_empty());
    }

    #[test]
    fn live_id_beyond_generator_is_corrupt() {
        let mut bytes = archive(&populated());
        bytes[..8].copy_from_slice(&1u64.to_le_bytes());
        let mut target = empty_target();
        let err = target.deserialize(bytes.as_slice()).unwrap_err();
        assert!(matches!(err, PersistError::Corrupt { .. }));
    }

    #[test]
    fn huge_live_id_is_an_error_not_a_panic() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&u64::MAX.to_le_bytes());
        bytes.extend_from_slice(&1u64.to_le_bytes());
        bytes.extend_from_slice(&(u64::MAX - 1).to_le_bytes());
        bytes.extend_from_slice(&0u64.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());

        let mut target = empty_target();
        let err = target.deserialize(bytes.as_slice()).unwrap_err();
        assert!(matches!(err, PersistError::Corrupt { .. }));
        assert!(target.is_empty());
    }

    #[test]
    fn pool_member_beyond_generator_is_corrupt() {
        let mut source = Registry::new();
        source.register_set::<(Position, Ammo, Enemy)>();
        let e = source.create();
        source.add_component(e, Enemy);
        let mut bytes = archive(&source);
        // Tail is the Enemy block: stride, count, then the one member id.
        let len = bytes.len();
        bytes[len - 8..].copy_from_slice(&(u64::MAX - 1).to_le_bytes());

        let mut target = empty_target();
        let err = target.deserialize(bytes.as_slice()).unwrap_err();
        assert!(matches!(err, PersistError::Corrupt { .. }));
    }

    #[test]
    fn read_bytes_rejects_short_input() {
        let mut input: &[u8] = &[1, 2, 3];
        assert!(read_bytes(&mut input, 4).is_err());
        let mut input: &[u8] = &[1, 2, 3];
        assert_eq!(read_bytes(&mut input, 3).unwrap(), vec![1, 2, 3]);
    }
}
