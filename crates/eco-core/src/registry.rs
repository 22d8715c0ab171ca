//! Entity Registry
//!
//! Owns every live organism, keyed by a stable index. Indices come from a
//! monotonic counter and are retired on removal, never handed out again, so
//! the grid engine never sees an index change meaning underneath it.

use eco_events::Position;
use std::collections::HashMap;

use crate::components::{Organism, Sex};
use crate::error::InitError;
use crate::grid::GridEngine;

/// The arena all cross-organism references (parents, offspring, movement
/// factors) point into by index.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    organisms: HashMap<u32, Organism>,
    next_index: u32,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the next successful allocation will receive.
    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    /// Places a new organism on the grid and registers it.
    ///
    /// The counter only advances when the grid accepts the placement, and a
    /// rejected organism is never registered.
    pub fn allocate(
        &mut self,
        grid: &mut dyn GridEngine,
        position: Position,
        sex: Sex,
    ) -> Result<u32, InitError> {
        let index = self.next_index;
        if !grid.place_entity(index, position) {
            return Err(InitError::PlacementRejected { index, position });
        }
        Ok(self.insert(Organism::new(index, sex)))
    }

    /// Like [`allocate`](Self::allocate), but places the organism into the
    /// conflicted slot of an occupied cell. Used for births.
    pub fn allocate_contested(
        &mut self,
        grid: &mut dyn GridEngine,
        position: Position,
        sex: Sex,
    ) -> Result<u32, InitError> {
        let index = self.next_index;
        if !grid.place_contested(index, position) {
            return Err(InitError::ContestedPlacementRejected { index, position });
        }
        Ok(self.insert(Organism::new(index, sex)))
    }

    fn insert(&mut self, organism: Organism) -> u32 {
        let index = organism.index();
        self.organisms.insert(index, organism);
        self.next_index += 1;
        tracing::debug!("Registered organism {}", index);
        index
    }

    /// Removes an organism. Removing a retired index is a no-op.
    pub fn remove(&mut self, index: u32) -> Option<Organism> {
        self.organisms.remove(&index)
    }

    pub fn get(&self, index: u32) -> Option<&Organism> {
        self.organisms.get(&index)
    }

    pub fn get_mut(&mut self, index: u32) -> Option<&mut Organism> {
        self.organisms.get_mut(&index)
    }

    /// Looks up a live organism's index. `None` if retired or never used.
    pub fn lookup(&self, index: u32) -> Option<u32> {
        self.organisms.get(&index).map(Organism::index)
    }

    pub fn contains(&self, index: u32) -> bool {
        self.organisms.contains_key(&index)
    }

    /// Live indices in ascending order, for deterministic traversal.
    pub fn sorted_indices(&self) -> Vec<u32> {
        let mut indices: Vec<u32> = self.organisms.keys().copied().collect();
        indices.sort_unstable();
        indices
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u32, &Organism)> {
        self.organisms.iter()
    }

    pub fn len(&self) -> usize {
        self.organisms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.organisms.is_empty()
    }

    /// Empties the registry and restarts the counter. Only for resetting
    /// between runs; never call it mid-tick.
    pub fn clear(&mut self) {
        self.organisms.clear();
        self.next_index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    #[test]
    fn test_allocate_assigns_sequential_indices() {
        let mut grid = Grid::new(5, 5, 1);
        let mut registry = EntityRegistry::new();

        let a = registry.allocate(&mut grid, Position::new(0, 0), Sex::Female).unwrap();
        let b = registry.allocate(&mut grid, Position::new(1, 0), Sex::Male).unwrap();
        assert_eq!((a, b), (0, 1));
        assert_eq!(registry.get(b).unwrap().index(), b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_rejected_placement_is_not_registered() {
        let mut grid = Grid::new(5, 5, 1);
        let mut registry = EntityRegistry::new();
        registry.allocate(&mut grid, Position::new(0, 0), Sex::Female).unwrap();

        let err = registry
            .allocate(&mut grid, Position::new(0, 0), Sex::Male)
            .unwrap_err();
        assert_eq!(
            err,
            InitError::PlacementRejected {
                index: 1,
                position: Position::new(0, 0)
            }
        );
        assert!(registry
            .allocate(&mut grid, Position::new(7, 7), Sex::Male)
            .is_err());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.next_index(), 1);
    }

    #[test]
    fn test_indices_are_never_reused() {
        let mut grid = Grid::new(5, 5, 1);
        let mut registry = EntityRegistry::new();
        for x in 0..3 {
            registry.allocate(&mut grid, Position::new(x, 0), Sex::Male).unwrap();
        }

        assert!(registry.remove(1).is_some());
        assert!(registry.remove(1).is_none());
        assert_eq!(registry.lookup(1), None);
        assert_eq!(registry.lookup(2), Some(2));

        let next = registry.allocate(&mut grid, Position::new(4, 4), Sex::Male).unwrap();
        assert_eq!(next, 3);
        assert_eq!(registry.sorted_indices(), vec![0, 2, 3]);
        for (key, organism) in registry.iter() {
            assert_eq!(*key, organism.index());
        }
    }

    #[test]
    fn test_clear_resets_counter() {
        let mut grid = Grid::new(5, 5, 1);
        let mut registry = EntityRegistry::new();
        registry.allocate(&mut grid, Position::new(0, 0), Sex::Male).unwrap();
        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(registry.next_index(), 0);
    }
}
