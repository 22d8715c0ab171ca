//! Grid Engine Contract
//!
//! The core never stores cell occupancy itself. It talks to a grid engine
//! through [`GridEngine`]: place an organism, ask it to move, learn who it
//! collided with, and hand the engine movement factors that bias where
//! organisms go. [`cells::Grid`] is the in-process implementation.

pub mod cells;

use eco_events::Position;
use std::fmt;

pub use cells::Grid;

/// A directional attraction (positive strength) or repulsion (negative)
/// toward another organism, held by the organism it affects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementFactor {
    /// Index of the organism the factor points at.
    pub source: u32,
    pub strength: f64,
    /// How far away, in cells, the factor can be perceived. `None` is unlimited.
    pub visibility: Option<u32>,
}

impl MovementFactor {
    pub fn new(source: u32, strength: f64, visibility: Option<u32>) -> Self {
        Self {
            source,
            strength,
            visibility,
        }
    }
}

/// Operations the core needs from the grid engine. Organisms are identified
/// by their registry index throughout.
pub trait GridEngine: fmt::Debug {
    /// Grid dimensions as (x, y).
    fn size(&self) -> (i32, i32);

    /// Side length of one cell, once a species has set it.
    fn scale(&self) -> Option<f64>;

    fn set_scale(&mut self, scale: f64);

    /// Places an organism on a free cell. False if out of bounds or occupied.
    fn place_entity(&mut self, index: u32, position: Position) -> bool;

    /// Places an organism into the conflicted slot of an occupied cell, as a
    /// newborn sharing its parent's cell. False if the cell is out of bounds,
    /// empty, or already contested.
    fn place_contested(&mut self, index: u32, position: Position) -> bool;

    /// Current position, or the contested cell for an organism in conflict.
    fn position(&self, index: u32) -> Option<Position>;

    /// The organism settled on a cell, if any.
    fn occupant(&self, position: Position) -> Option<u32>;

    /// Sets how many cells an organism may move per tick and how far it sees.
    fn set_movement(&mut self, index: u32, speed: u32, vision: Option<u32>);

    /// Moves an organism one step. False means it collided with another
    /// occupant; the caller must then resolve the conflict.
    fn update_position(&mut self, index: u32) -> bool;

    /// Index of the occupant an organism is in conflict with.
    fn get_conflict(&self, index: u32) -> Option<u32>;

    /// Moves a conflicting organism off the contested cell. False if the
    /// organism was not in conflict or the conflict could not be resolved.
    fn default_conflict_handler(&mut self, index: u32) -> bool;

    fn is_alive(&self, index: u32) -> bool;

    /// Marks an organism dead. It stays on the grid until removed.
    fn die(&mut self, index: u32);

    /// Removes an organism from the grid. Safe to call more than once;
    /// returns true only when something was removed.
    fn remove_from_grid(&mut self, index: u32) -> bool;

    /// Gives `owner` a movement factor pointing at `source`.
    fn add_factor_from_organism(
        &mut self,
        owner: u32,
        source: u32,
        strength: f64,
        visibility: Option<u32>,
    );

    /// Drops every factor `owner` holds that points at `other`.
    fn cleanup_organism(&mut self, owner: u32, other: u32);

    /// Factors currently held by `owner`.
    fn factors(&self, owner: u32) -> Vec<MovementFactor>;

    /// Commits the tick. False while any conflict is unresolved.
    fn update(&mut self) -> bool;
}
