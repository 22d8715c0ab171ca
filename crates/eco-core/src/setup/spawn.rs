//! Organism Spawning
//!
//! Places the organisms a run configuration asks for on random,
//! non-repeating cells.

use eco_events::Position;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;
use thiserror::Error;

use super::library::{Library, LibraryError};
use crate::config::Config;
use crate::ecosystem::Ecosystem;
use crate::error::SimError;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("cannot place organism, no space left on the {x_size}x{y_size} grid")]
    NoSpace { x_size: i32, y_size: i32 },
    #[error(transparent)]
    Library(#[from] LibraryError),
}

/// Hands out every cell of a grid exactly once, in random order.
#[derive(Debug)]
pub struct CellPicker {
    x_size: i32,
    y_size: i32,
    cells: Vec<Position>,
}

impl CellPicker {
    pub fn new(x_size: i32, y_size: i32, seed: u64) -> Self {
        let mut cells: Vec<Position> = (0..x_size)
            .flat_map(|x| (0..y_size).map(move |y| Position::new(x, y)))
            .collect();
        let mut rng = SmallRng::seed_from_u64(seed);
        cells.shuffle(&mut rng);
        Self {
            x_size,
            y_size,
            cells,
        }
    }

    pub fn next_cell(&mut self) -> Result<Position, SetupError> {
        self.cells.pop().ok_or(SetupError::NoSpace {
            x_size: self.x_size,
            y_size: self.y_size,
        })
    }

    pub fn remaining(&self) -> usize {
        self.cells.len()
    }
}

/// What initial spawning produced.
#[derive(Debug, Default, Clone)]
pub struct SpawnSummary {
    pub total: usize,
    pub skipped: usize,
    pub by_species: BTreeMap<String, usize>,
}

/// Spawns every organism batch in `config`.
///
/// An organism the grid refuses to place is logged and skipped. Running out
/// of cells, or a library that cannot be read, fails the whole setup.
pub fn spawn_all(config: &Config, eco: &mut Ecosystem) -> Result<SpawnSummary, SetupError> {
    let sim = &config.simulation;
    let mut picker = CellPicker::new(sim.grid_x_size, sim.grid_y_size, sim.seed);
    let mut summary = SpawnSummary::default();

    for batch in &config.organisms {
        let library = Library::new(&batch.library);
        for _ in 0..batch.quantity {
            let position = picker.next_cell()?;
            match library.load_organism(&batch.name, eco, position) {
                Ok(_) => {
                    summary.total += 1;
                    *summary.by_species.entry(batch.name.clone()).or_default() += 1;
                }
                Err(LibraryError::Sim(SimError::Init(e))) => {
                    tracing::warn!("Skipping '{}': {}", batch.name, e);
                    summary.skipped += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
    Ok(summary)
}
