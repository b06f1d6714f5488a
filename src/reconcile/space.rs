//! Spaces and positions.
//!
//! A space is an ordered, sparse map from position to slot. Concrete items
//! use a single position (0); dynamic items mirror every physical node their
//! nested region exposes, one dense position each.

use std::collections::BTreeMap;
use std::mem;

use crate::surface::Surface;

use super::record::Record;

/// Content of one position.
pub(crate) enum Slot<S: Surface> {
    /// A node mounted by this region
    Mounted(Record<S>),
    /// A node mounted by a nested region, tracked for index arithmetic
    Mirror(S::Node),
    /// A removed node whose position is kept
    Tombstone,
}

impl<S: Surface> Slot<S> {
    pub(crate) fn is_occupied(&self) -> bool {
        !matches!(self, Slot::Tombstone)
    }

    /// Physical handle, unless this is a tombstone.
    pub(crate) fn handle(&self) -> Option<&S::Node> {
        match self {
            Slot::Mounted(record) => Some(&record.handle),
            Slot::Mirror(node) => Some(node),
            Slot::Tombstone => None,
        }
    }
}

pub(crate) struct Space<S: Surface> {
    positions: BTreeMap<usize, Slot<S>>,
}

impl<S: Surface> Default for Space<S> {
    fn default() -> Self {
        Self {
            positions: BTreeMap::new(),
        }
    }
}

impl<S: Surface> Space<S> {
    /// Number of occupied positions.
    pub(crate) fn occupied(&self) -> usize {
        self.positions.values().filter(|slot| slot.is_occupied()).count()
    }

    /// Number of occupied positions strictly below `position`.
    pub(crate) fn rank(&self, position: usize) -> usize {
        self.positions
            .range(..position)
            .filter(|(_, slot)| slot.is_occupied())
            .count()
    }

    pub(crate) fn get(&self, position: usize) -> Option<&Slot<S>> {
        self.positions.get(&position)
    }

    pub(crate) fn get_mut(&mut self, position: usize) -> Option<&mut Slot<S>> {
        self.positions.get_mut(&position)
    }

    /// Place `slot` at `position`.
    ///
    /// A tombstone there is overwritten. An occupied position shifts every
    /// position at or after it right by one first.
    pub(crate) fn insert(&mut self, position: usize, slot: Slot<S>) {
        if self.positions.get(&position).is_some_and(Slot::is_occupied) {
            let tail = self.positions.split_off(&position);
            self.positions
                .extend(tail.into_iter().map(|(key, slot)| (key + 1, slot)));
        }
        self.positions.insert(position, slot);
    }

    /// Take the occupant of `position`, leaving a tombstone.
    pub(crate) fn tombstone(&mut self, position: usize) -> Option<Slot<S>> {
        let slot = self.positions.get_mut(&position)?;
        if !slot.is_occupied() {
            return None;
        }
        Some(mem::replace(slot, Slot::Tombstone))
    }

    /// Free `position` and shift every later position left by one.
    pub(crate) fn remove(&mut self, position: usize) -> Option<Slot<S>> {
        let slot = self.positions.remove(&position)?;
        let tail = self.positions.split_off(&position);
        self.positions
            .extend(tail.into_iter().map(|(key, slot)| (key - 1, slot)));
        Some(slot)
    }

    /// Highest occupied position.
    pub(crate) fn last_occupied(&self) -> Option<usize> {
        self.positions
            .iter()
            .rev()
            .find(|(_, slot)| slot.is_occupied())
            .map(|(&position, _)| position)
    }

    /// Handles of the occupied positions, in position order.
    pub(crate) fn handles(&self) -> impl Iterator<Item = &S::Node> {
        self.positions.values().filter_map(Slot::handle)
    }

    /// Remove every slot, in position order.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = Slot<S>> + use<S> {
        mem::take(&mut self.positions).into_values()
    }
}
