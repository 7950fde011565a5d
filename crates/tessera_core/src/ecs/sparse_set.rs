// sparse_set.rs - Entity -> dense position mapping shared by every container
//
// `entities` is packed with no holes and reordered by swap-pop on removal.
// `indirect` is indexed by raw entity id and holds a dense position or ABSENT.
// Invariant: indirect[entities[i].id] == i for every i < entities.len().

use crate::ecs::persist::{read_u64, write_u64};
use crate::ecs::{Entity, PersistError};
use std::cmp::Ordering;
use std::io::{Read, Write};

/// Sentinel stored in `indirect` for entities without a dense slot.
const ABSENT: usize = usize::MAX;

/// Ordering strategy for [`SparseSet::sort_by`] and the typed container sorts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortAlgorithm {
    /// Merge sort; equal elements keep their relative order.
    #[default]
    Stable,
    /// Pattern-defeating quicksort; fastest on shuffled data.
    Unstable,
    /// Insertion sort; near-linear when the container is almost sorted,
    /// which is the usual case when re-sorting every frame.
    Insertion,
}

/// Sparse set of entities.
///
/// Membership, insertion and removal are O(1) amortized; iteration walks a
/// dense array. The set knows nothing about component payloads, typed
/// containers keep their values index-for-index with [`entities`](Self::entities).
#[derive(Debug, Clone, Default)]
pub struct SparseSet {
    entities: Vec<Entity>,
    indirect: Vec<usize>,
}

impl SparseSet {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            indirect: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entities: Vec::with_capacity(capacity),
            indirect: Vec::with_capacity(capacity),
        }
    }

    /// Rebuild a set from a dense entity array, e.g. after loading it.
    pub fn from_entities(entities: Vec<Entity>) -> Result<Self, PersistError> {
        Self::rebuild(entities, "entity list")
    }

    fn rebuild(entities: Vec<Entity>, section: &'static str) -> Result<Self, PersistError> {
        let mut set = Self {
            entities,
            indirect: Vec::new(),
        };
        for pos in 0..set.entities.len() {
            let entity = set.entities[pos];
            if set.contains(entity) {
                return Err(PersistError::DuplicateEntity { entity, section });
            }
            set.try_ensure_indirect(entity)?;
            set.indirect[entity.index()] = pos;
        }
        Ok(set)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Dense entity array, in iteration order.
    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn reserve(&mut self, additional: usize) {
        self.entities.reserve(additional);
    }

    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.try_index_of(entity).is_some()
    }

    /// Dense position of `entity`, or `None` if it is not a member.
    #[inline]
    pub fn try_index_of(&self, entity: Entity) -> Option<usize> {
        match self.indirect.get(entity.index()) {
            Some(&pos) if pos != ABSENT => Some(pos),
            _ => None,
        }
    }

    /// Dense position of `entity`.
    ///
    /// # Panics
    /// Panics if `entity` is not a member.
    #[inline]
    pub fn index_of(&self, entity: Entity) -> usize {
        match self.try_index_of(entity) {
            Some(pos) => pos,
            None => panic!("{entity:?} is not a member of this sparse set"),
        }
    }

    /// Append `entity` to the dense array.
    ///
    /// # Panics
    /// Panics if `entity` is already a member.
    pub fn insert(&mut self, entity: Entity) -> usize {
        assert!(
            !self.contains(entity),
            "{entity:?} is already a member of this sparse set"
        );
        self.ensure_indirect(entity);
        let pos = self.entities.len();
        self.entities.push(entity);
        self.indirect[entity.index()] = pos;
        pos
    }

    /// Swap-pop `entity` out of the dense array and return the position it
    /// vacated. Typed containers erase their value at the same position.
    ///
    /// # Panics
    /// Panics if `entity` is not a member.
    pub fn remove(&mut self, entity: Entity) -> usize {
        let pos = self.index_of(entity);
        let last = self.entities[self.entities.len() - 1];
        self.entities.swap_remove(pos);
        self.indirect[last.index()] = pos;
        self.indirect[entity.index()] = ABSENT;
        debug_assert!(self.entities.get(pos).map_or(true, |e| self.indirect[e.index()] == pos));
        pos
    }

    pub fn clear(&mut self) {
        for entity in self.entities.drain(..) {
            self.indirect[entity.index()] = ABSENT;
        }
    }

    /// Sort the dense array with a comparator over entities.
    pub fn sort_by<F>(&mut self, mut compare: F, algorithm: SortAlgorithm)
    where
        F: FnMut(&Entity, &Entity) -> Ordering,
    {
        let order = self.sorted_order(
            |a, b| compare(&self.entities[a], &self.entities[b]),
            algorithm,
        );
        self.permute(&order);
    }

    /// Move the entities that are also members of `other` into `other`'s
    /// relative order, ahead of the entities `other` does not contain.
    pub fn sort_like(&mut self, other: &SparseSet) {
        let order = self.order_like(other);
        self.permute(&order);
    }

    pub(crate) fn order_like(&self, other: &SparseSet) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.len());
        order.extend(other.entities.iter().filter_map(|&e| self.try_index_of(e)));
        order.extend(
            self.entities
                .iter()
                .enumerate()
                .filter(|&(_, &e)| !other.contains(e))
                .map(|(pos, _)| pos),
        );
        order
    }

    /// Dense positions `0..len` arranged by `compare`.
    pub(crate) fn sorted_order<F>(&self, mut compare: F, algorithm: SortAlgorithm) -> Vec<usize>
    where
        F: FnMut(usize, usize) -> Ordering,
    {
        let mut order: Vec<usize> = (0..self.len()).collect();
        match algorithm {
            SortAlgorithm::Stable => order.sort_by(|&a, &b| compare(a, b)),
            SortAlgorithm::Unstable => order.sort_unstable_by(|&a, &b| compare(a, b)),
            SortAlgorithm::Insertion => {
                for i in 1..order.len() {
                    let mut j = i;
                    while j > 0 && compare(order[j - 1], order[j]) == Ordering::Greater {
                        order.swap(j - 1, j);
                        j -= 1;
                    }
                }
            }
        }
        order
    }

    /// Reorder so that new position `i` holds the entity previously at
    /// `order[i]`, fixing `indirect` for every slot that moved.
    pub(crate) fn permute(&mut self, order: &[usize]) {
        debug_assert_eq!(order.len(), self.entities.len());
        let permuted: Vec<Entity> = order.iter().map(|&from| self.entities[from]).collect();
        for (pos, (&from, entity)) in order.iter().zip(&permuted).enumerate() {
            if from != pos {
                self.indirect[entity.index()] = pos;
            }
        }
        self.entities = permuted;
    }

    /// Persist the dense entity array. `indirect` is derived data and is
    /// rebuilt on load.
    pub fn write_to(&self, writer: &mut dyn Write) -> Result<(), PersistError> {
        write_u64(writer, self.entities.len() as u64)?;
        for entity in &self.entities {
            write_u64(writer, entity.id())?;
        }
        Ok(())
    }

    /// Read a dense entity array written by [`write_to`](Self::write_to).
    ///
    /// Every id must be below `next_id`, the generator state stored with it.
    pub fn read_from(
        reader: &mut dyn Read,
        section: &'static str,
        next_id: u64,
    ) -> Result<Self, PersistError> {
        let count = read_u64(reader)?;
        let mut entities = Vec::new();
        for _ in 0..count {
            let entity = Entity::from_raw(read_u64(reader)?);
            if entity.id() >= next_id {
                return Err(PersistError::Corrupt {
                    reason: format!(
                        "{section} holds {entity}, which was never allocated (next id {next_id})"
                    ),
                });
            }
            entities.push(entity);
        }
        Self::rebuild(entities, section)
    }

    fn ensure_indirect(&mut self, entity: Entity) {
        let idx = entity.index();
        if idx >= self.indirect.len() {
            self.indirect.resize(idx + 1, ABSENT);
        }
    }

    /// Like `ensure_indirect`, for ids that come from outside the process.
    fn try_ensure_indirect(&mut self, entity: Entity) -> Result<(), PersistError> {
        let too_large = || PersistError::Corrupt {
            reason: format!("entity {entity} is too large to index"),
        };
        let idx = usize::try_from(entity.id()).map_err(|_| too_large())?;
        if idx >= self.indirect.len() {
            let additional = (idx - self.indirect.len()).saturating_add(1);
            self.indirect
                .try_reserve_exact(additional)
                .map_err(|_| too_large())?;
            self.indirect.resize(idx + 1, ABSENT);
        }
        Ok(())
    }
}
