//! In-Process Grid Engine
//!
//! A bounded grid with one settled occupant per cell. An organism that moves
//! onto an occupied cell (or is born into one) waits in that cell's conflicted
//! slot until the conflict is resolved, either by one party leaving the grid
//! or by [`GridEngine::default_conflict_handler`].

use eco_events::Position;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

use super::{GridEngine, MovementFactor};

/// Factor strengths are divided by this before weighting candidate cells.
const FACTOR_SCALE: f64 = 100.0;
const MAX_EXPONENT: f64 = 50.0;

#[derive(Debug, Clone)]
struct GridObject {
    /// Settled cell. `None` for a newborn still waiting in a conflicted slot.
    cell: Option<Position>,
    /// Occupied cell this object is contesting.
    contested: Option<Position>,
    alive: bool,
    speed: u32,
    vision: Option<u32>,
    factors: Vec<MovementFactor>,
}

impl GridObject {
    fn new(cell: Option<Position>, contested: Option<Position>) -> Self {
        Self {
            cell,
            contested,
            alive: true,
            speed: 1,
            vision: None,
            factors: Vec::new(),
        }
    }

    fn position(&self) -> Option<Position> {
        self.contested.or(self.cell)
    }
}

/// The reference [`GridEngine`].
#[derive(Debug)]
pub struct Grid {
    x_size: i32,
    y_size: i32,
    scale: Option<f64>,
    objects: HashMap<u32, GridObject>,
    occupants: HashMap<Position, u32>,
    /// Contested cell -> contender waiting on it.
    contests: HashMap<Position, u32>,
    rng: SmallRng,
}

impl Grid {
    pub fn new(x_size: i32, y_size: i32, seed: u64) -> Self {
        Self {
            x_size,
            y_size,
            scale: None,
            objects: HashMap::new(),
            occupants: HashMap::new(),
            contests: HashMap::new(),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn in_bounds(&self, position: Position) -> bool {
        (0..self.x_size).contains(&position.x) && (0..self.y_size).contains(&position.y)
    }

    /// Number of objects on the grid, settled or contesting.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Whether `index` could settle on `position`.
    fn is_free_for(&self, position: Position, index: u32) -> bool {
        self.in_bounds(position)
            && self.occupants.get(&position).map_or(true, |&o| o == index)
            && self.contests.get(&position).map_or(true, |&c| c == index)
    }

    /// In-bounds cells exactly `radius` king moves from `center`, in x-then-y
    /// order.
    fn ring(&self, center: Position, radius: u32) -> Vec<Position> {
        let r = radius as i32;
        let mut cells = Vec::new();
        for x in center.x - r..=center.x + r {
            for y in center.y - r..=center.y + r {
                let cell = Position::new(x, y);
                if center.chebyshev_distance(&cell) == radius && self.in_bounds(cell) {
                    cells.push(cell);
                }
            }
        }
        cells
    }

    /// Relative preference for moving to `cell`, given the visible factors.
    fn weight(&self, cell: Position, factors: &[(Position, f64)]) -> f64 {
        let pull: f64 = factors
            .iter()
            .map(|(source, strength)| strength / (1.0 + cell.distance(source)))
            .sum();
        (pull / FACTOR_SCALE).clamp(-MAX_EXPONENT, MAX_EXPONENT).exp()
    }

    /// Factors the object can currently perceive, resolved to positions.
    fn visible_factors(&self, object: &GridObject, from: Position) -> Vec<(Position, f64)> {
        object
            .factors
            .iter()
            .filter_map(|factor| {
                let source = self.objects.get(&factor.source)?.position()?;
                let limit = match (factor.visibility, object.vision) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                };
                let visible = limit.map_or(true, |l| from.distance(&source) <= f64::from(l));
                visible.then_some((source, factor.strength))
            })
            .collect()
    }

    fn choose_weighted(&mut self, candidates: &[Position], weights: &[f64]) -> Option<Position> {
        let total: f64 = weights.iter().sum();
        if candidates.is_empty() || total <= 0.0 {
            return None;
        }
        let r = self.rng.gen::<f64>() * total;
        let mut cumulative = 0.0;
        for (cell, weight) in candidates.iter().zip(weights) {
            cumulative += weight;
            if r < cumulative {
                return Some(*cell);
            }
        }
        candidates.last().copied()
    }

    /// Settles `index` on `cell`, vacating wherever it was.
    fn settle(&mut self, index: u32, cell: Position) {
        let Some(object) = self.objects.get_mut(&index) else {
            return;
        };
        if let Some(contested) = object.contested.take() {
            self.contests.remove(&contested);
        }
        if let Some(old) = object.cell.replace(cell) {
            if self.occupants.get(&old) == Some(&index) {
                self.occupants.remove(&old);
            }
        }
        self.occupants.insert(cell, index);
    }
}

impl GridEngine for Grid {
    fn size(&self) -> (i32, i32) {
        (self.x_size, self.y_size)
    }

    fn scale(&self) -> Option<f64> {
        self.scale
    }

    fn set_scale(&mut self, scale: f64) {
        self.scale = Some(scale);
    }

    fn place_entity(&mut self, index: u32, position: Position) -> bool {
        if self.objects.contains_key(&index) || !self.is_free_for(position, index) {
            return false;
        }
        self.objects
            .insert(index, GridObject::new(Some(position), None));
        self.occupants.insert(position, index);
        true
    }

    fn place_contested(&mut self, index: u32, position: Position) -> bool {
        if self.objects.contains_key(&index)
            || !self.in_bounds(position)
            || !self.occupants.contains_key(&position)
            || self.contests.contains_key(&position)
        {
            return false;
        }
        self.objects
            .insert(index, GridObject::new(None, Some(position)));
        self.contests.insert(position, index);
        true
    }

    fn position(&self, index: u32) -> Option<Position> {
        self.objects.get(&index)?.position()
    }

    fn occupant(&self, position: Position) -> Option<u32> {
        self.occupants.get(&position).copied()
    }

    fn set_movement(&mut self, index: u32, speed: u32, vision: Option<u32>) {
        if let Some(object) = self.objects.get_mut(&index) {
            object.speed = speed;
            object.vision = vision;
        }
    }

    fn update_position(&mut self, index: u32) -> bool {
        let Some(object) = self.objects.get(&index) else {
            return true;
        };
        if object.contested.is_some() {
            return false;
        }
        let Some(from) = object.cell else {
            return true;
        };

        let factors = self.visible_factors(object, from);
        let candidates: Vec<Position> = (1..=object.speed)
            .flat_map(|radius| self.ring(from, radius))
            .filter(|cell| !self.contests.contains_key(cell))
            .collect();
        let weights: Vec<f64> = candidates
            .iter()
            .map(|cell| self.weight(*cell, &factors))
            .collect();

        let Some(target) = self.choose_weighted(&candidates, &weights) else {
            return true;
        };
        match self.occupants.get(&target) {
            Some(&other) if other != index => {
                if let Some(object) = self.objects.get_mut(&index) {
                    object.contested = Some(target);
                }
                self.contests.insert(target, index);
                false
            }
            _ => {
                self.settle(index, target);
                true
            }
        }
    }

    fn get_conflict(&self, index: u32) -> Option<u32> {
        let contested = self.objects.get(&index)?.contested?;
        self.occupants.get(&contested).copied()
    }

    fn default_conflict_handler(&mut self, index: u32) -> bool {
        let Some(contested) = self.objects.get(&index).and_then(|o| o.contested) else {
            return false;
        };

        let max_radius = self.x_size.max(self.y_size).max(1) as u32;
        let destination = (1..=max_radius).find_map(|radius| {
            self.ring(contested, radius)
                .into_iter()
                .find(|cell| self.is_free_for(*cell, index))
        });

        match destination {
            Some(cell) => {
                self.settle(index, cell);
                true
            }
            None => false,
        }
    }

    fn is_alive(&self, index: u32) -> bool {
        self.objects.get(&index).map_or(false, |o| o.alive)
    }

    fn die(&mut self, index: u32) {
        if let Some(object) = self.objects.get_mut(&index) {
            object.alive = false;
        }
    }

    fn remove_from_grid(&mut self, index: u32) -> bool {
        let Some(object) = self.objects.remove(&index) else {
            return false;
        };
        if let Some(contested) = object.contested {
            self.contests.remove(&contested);
        }
        if let Some(cell) = object.cell {
            if self.occupants.get(&cell) == Some(&index) {
                self.occupants.remove(&cell);
            }
            // Whoever was contesting the vacated cell gets it.
            if let Some(&contender) = self.contests.get(&cell) {
                self.settle(contender, cell);
            }
        }
        true
    }

    fn add_factor_from_organism(
        &mut self,
        owner: u32,
        source: u32,
        strength: f64,
        visibility: Option<u32>,
    ) {
        if let Some(object) = self.objects.get_mut(&owner) {
            object
                .factors
                .push(MovementFactor::new(source, strength, visibility));
        }
    }

    fn cleanup_organism(&mut self, owner: u32, other: u32) {
        if let Some(object) = self.objects.get_mut(&owner) {
            object.factors.retain(|f| f.source != other);
        }
    }

    fn factors(&self, owner: u32) -> Vec<MovementFactor> {
        self.objects
            .get(&owner)
            .map(|o| o.factors.clone())
            .unwrap_or_default()
    }

    fn update(&mut self) -> bool {
        self.contests.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement() {
        let mut grid = Grid::new(9, 9, 1);
        assert!(grid.place_entity(0, Position::new(0, 0)));
        assert_eq!(grid.occupant(Position::new(0, 0)), Some(0));

        // Occupied, out of bounds, and duplicate index all fail.
        assert!(!grid.place_entity(1, Position::new(0, 0)));
        assert!(!grid.place_entity(1, Position::new(9, 0)));
        assert!(!grid.place_entity(1, Position::new(-1, 3)));
        assert!(!grid.place_entity(0, Position::new(4, 4)));
        assert_eq!(grid.object_count(), 1);
        assert!(grid.update());
    }

    #[test]
    fn test_ring_is_truncated_at_corners() {
        let grid = Grid::new(9, 9, 1);
        assert_eq!(grid.ring(Position::new(0, 0), 1).len(), 3);
        assert_eq!(grid.ring(Position::new(4, 4), 1).len(), 8);
        assert_eq!(grid.ring(Position::new(4, 4), 2).len(), 16);
    }

    #[test]
    fn test_move_into_occupied_cell_conflicts() {
        // A 1x2 grid leaves exactly one place to go.
        let mut grid = Grid::new(1, 2, 3);
        assert!(grid.place_entity(0, Position::new(0, 0)));
        assert!(grid.place_entity(1, Position::new(0, 1)));

        assert!(!grid.update_position(0));
        assert_eq!(grid.get_conflict(0), Some(1));
        assert_eq!(grid.position(0), Some(Position::new(0, 1)));
        assert!(!grid.update());

        // Nothing else is free, but 0's own old cell is.
        assert!(grid.default_conflict_handler(0));
        assert_eq!(grid.position(0), Some(Position::new(0, 0)));
        assert_eq!(grid.get_conflict(0), None);
        assert!(grid.update());
    }

    #[test]
    fn test_default_handler_requires_conflict() {
        let mut grid = Grid::new(5, 5, 3);
        assert!(grid.place_entity(0, Position::new(2, 2)));
        assert!(!grid.default_conflict_handler(0));
        assert!(!grid.default_conflict_handler(42));
    }

    #[test]
    fn test_contested_placement_and_relocation() {
        let mut grid = Grid::new(3, 3, 3);
        assert!(grid.place_entity(0, Position::new(1, 1)));
        assert!(!grid.place_contested(1, Position::new(0, 0)));
        assert!(grid.place_contested(1, Position::new(1, 1)));
        assert!(!grid.place_contested(2, Position::new(1, 1)));

        assert_eq!(grid.get_conflict(1), Some(0));
        assert!(grid.default_conflict_handler(1));
        let moved = grid.position(1).unwrap();
        assert_ne!(moved, Position::new(1, 1));
        assert_eq!(moved.chebyshev_distance(&Position::new(1, 1)), 1);
        assert!(grid.update());
    }

    #[test]
    fn test_default_handler_fails_when_full() {
        let mut grid = Grid::new(1, 1, 3);
        assert!(grid.place_entity(0, Position::new(0, 0)));
        assert!(grid.place_contested(1, Position::new(0, 0)));
        assert!(!grid.default_conflict_handler(1));
    }

    #[test]
    fn test_removing_occupant_promotes_contender() {
        let mut grid = Grid::new(1, 2, 3);
        assert!(grid.place_entity(0, Position::new(0, 0)));
        assert!(grid.place_entity(1, Position::new(0, 1)));
        assert!(!grid.update_position(0));

        assert!(grid.remove_from_grid(1));
        assert!(!grid.remove_from_grid(1));
        assert_eq!(grid.occupant(Position::new(0, 1)), Some(0));
        assert_eq!(grid.occupant(Position::new(0, 0)), None);
        assert!(grid.update());
    }

    #[test]
    fn test_removing_contender_clears_conflict() {
        let mut grid = Grid::new(3, 3, 3);
        assert!(grid.place_entity(0, Position::new(1, 1)));
        assert!(grid.place_contested(1, Position::new(1, 1)));
        assert!(grid.remove_from_grid(1));
        assert!(grid.update());
        assert_eq!(grid.occupant(Position::new(1, 1)), Some(0));
    }

    #[test]
    fn test_attraction_biases_movement() {
        let mut toward = 0;
        for seed in 0..200 {
            let mut grid = Grid::new(9, 1, seed);
            assert!(grid.place_entity(0, Position::new(4, 0)));
            assert!(grid.place_entity(1, Position::new(8, 0)));
            grid.add_factor_from_organism(0, 1, 3000.0, None);
            assert!(grid.update_position(0));
            if grid.position(0) == Some(Position::new(5, 0)) {
                toward += 1;
            }
        }
        assert!(toward > 150, "moved toward attractor {} of 200 times", toward);
    }

    #[test]
    fn test_factor_cleanup() {
        let mut grid = Grid::new(5, 5, 3);
        assert!(grid.place_entity(0, Position::new(0, 0)));
        grid.add_factor_from_organism(0, 1, 10.0, Some(3));
        grid.add_factor_from_organism(0, 2, -10.0, None);
        grid.cleanup_organism(0, 1);
        let factors = grid.factors(0);
        assert_eq!(factors.len(), 1);
        assert_eq!(factors[0].source, 2);
    }

    #[test]
    fn test_die_marks_dead() {
        let mut grid = Grid::new(5, 5, 3);
        assert!(grid.place_entity(0, Position::new(0, 0)));
        assert!(grid.is_alive(0));
        grid.die(0);
        assert!(!grid.is_alive(0));
        assert!(!grid.is_alive(7));
    }
}
