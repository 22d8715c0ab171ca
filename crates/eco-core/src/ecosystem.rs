//! Ecosystem Context
//!
//! The process-scoped state a run operates on: the grid engine, the entity
//! registry, the handler set, the seeded RNG, the clock and the event buffer.
//! It is built at simulation start, passed by `&mut` into every operation,
//! and dropped at the end. Nothing here is global.

use eco_events::{EventKind, Position, SimTimestamp};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::sync::Arc;

use crate::components::{metabolism, AttributeTree, Organism, Sex};
use crate::error::{InitError, SimError};
use crate::events::TickEvents;
use crate::grid::GridEngine;
use crate::handlers::HandlerSet;
use crate::registry::EntityRegistry;

/// Cells moved per tick when `Movement.Speed` is not set.
pub const DEFAULT_SPEED: u32 = 1;

#[derive(Debug)]
pub struct Ecosystem {
    pub(crate) grid: Box<dyn GridEngine>,
    pub(crate) registry: EntityRegistry,
    pub(crate) handlers: Arc<HandlerSet>,
    pub(crate) rng: SmallRng,
    seconds_per_tick: f64,
    tick: u64,
    pub(crate) events: TickEvents,
}

impl Ecosystem {
    pub fn new(
        grid: Box<dyn GridEngine>,
        handlers: HandlerSet,
        seed: u64,
        seconds_per_tick: f64,
    ) -> Self {
        Self {
            grid,
            registry: EntityRegistry::new(),
            handlers: Arc::new(handlers),
            rng: SmallRng::seed_from_u64(seed),
            seconds_per_tick,
            tick: 0,
            events: TickEvents::new(),
        }
    }

    /// An ecosystem running the built-in handlers.
    pub fn with_builtin_handlers(grid: Box<dyn GridEngine>, seed: u64, seconds_per_tick: f64) -> Self {
        Self::new(grid, HandlerSet::with_builtin(), seed, seconds_per_tick)
    }

    pub fn grid(&self) -> &dyn GridEngine {
        self.grid.as_ref()
    }

    pub fn grid_mut(&mut self) -> &mut dyn GridEngine {
        self.grid.as_mut()
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn handlers(&self) -> &HandlerSet {
        &self.handlers
    }

    pub fn organism(&self, index: u32) -> Option<&Organism> {
        self.registry.get(index)
    }

    pub fn organism_mut(&mut self, index: u32) -> Option<&mut Organism> {
        self.registry.get_mut(index)
    }

    pub fn is_alive(&self, index: u32) -> bool {
        self.registry.get(index).map_or(false, Organism::is_alive)
    }

    pub fn position(&self, index: u32) -> Option<Position> {
        self.grid.position(index)
    }

    pub fn population(&self) -> usize {
        self.registry.len()
    }

    pub fn seconds_per_tick(&self) -> f64 {
        self.seconds_per_tick
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn timestamp(&self) -> SimTimestamp {
        SimTimestamp::new(self.tick, self.seconds_per_tick)
    }

    pub fn events(&self) -> &TickEvents {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<eco_events::Event> {
        self.events.drain()
    }

    pub(crate) fn record(&mut self, kind: EventKind) {
        let timestamp = self.timestamp();
        self.events.record(timestamp, kind);
    }

    /// Places a new organism of random sex at `position`. The organism has
    /// no attributes, and so no handlers, until
    /// [`set_attributes`](Self::set_attributes) is called.
    pub fn allocate(&mut self, position: Position) -> Result<u32, InitError> {
        let sex = Sex::random(&mut self.rng);
        self.registry.allocate(self.grid.as_mut(), position, sex)
    }

    /// Assigns an organism's attributes.
    ///
    /// The first assignment also binds handlers, builds the metabolism the
    /// attributes describe, configures movement on the grid and creates
    /// movement factors toward every other organism.
    /// Later assignments only replace the tree.
    pub fn set_attributes(&mut self, index: u32, attributes: AttributeTree) -> Result<(), SimError> {
        let organism = self
            .registry
            .get_mut(index)
            .ok_or(SimError::UnknownOrganism { index })?;
        tracing::debug!("Setting attributes of organism {} to {}", index, attributes);

        if !organism.assign_attributes(attributes) {
            return Ok(());
        }
        self.handlers.bind(organism);
        if let Some(initial) = metabolism::from_attributes(organism.attributes()) {
            if !metabolism::declares_rate(organism.attributes()) {
                tracing::warn!("Using zero metabolic rate for organism {}", index);
            }
            organism.set_metabolism(initial);
        }

        let speed = organism
            .attributes()
            .get_f64("Movement.Speed")
            .map(|speed| speed.max(0.0).round() as u32)
            .unwrap_or(DEFAULT_SPEED);
        let vision = vision_of(organism);
        self.grid.set_movement(index, speed, vision);

        self.setup_relations(index);
        Ok(())
    }

    /// Allocates an organism at `position` and assigns its attributes.
    pub fn spawn(&mut self, position: Position, attributes: AttributeTree) -> Result<u32, SimError> {
        let index = self.allocate(position)?;
        self.set_attributes(index, attributes)?;

        let species = self
            .organism(index)
            .and_then(|o| o.scientific_name().ok())
            .unwrap_or_default();
        tracing::info!("Adding organism {} ({}) at {}", index, species, position);
        self.record(EventKind::Spawned {
            index,
            species,
            position,
        });
        Ok(index)
    }

    /// Runs one tick: updates every organism live at the start of the tick,
    /// in index order, then advances the grid.
    ///
    /// Organisms born during the tick wait for the next one. A fatal error
    /// ends the tick immediately; other errors are logged and that
    /// organism's update is abandoned.
    pub fn run_tick(&mut self) -> Result<(), SimError> {
        tracing::debug!("Running tick {}", self.tick);

        for index in self.registry.sorted_indices() {
            if !self.registry.contains(index) {
                continue;
            }
            match self.update_organism(index) {
                Ok(_) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => tracing::warn!("Update of organism {} failed: {}", index, e),
            }
        }

        if !self.grid.update() {
            tracing::error!("Grid update failed at tick {}", self.tick);
            return Err(SimError::EngineUpdate { tick: self.tick });
        }

        self.tick += 1;
        Ok(())
    }

    /// Runs `ticks` ticks, stopping at the first fatal error.
    pub fn run(&mut self, ticks: u64) -> Result<(), SimError> {
        for _ in 0..ticks {
            self.run_tick()?;
        }
        Ok(())
    }

    /// Removes every organism and restarts the clock and the index counter,
    /// keeping the grid engine and handlers.
    pub fn reset(&mut self) {
        for index in self.registry.sorted_indices() {
            self.grid.remove_from_grid(index);
        }
        self.registry.clear();
        self.events.clear();
        self.tick = 0;
    }
}

/// Factor visibility radius in cells. `None` is unlimited.
pub(crate) fn vision_of(organism: &Organism) -> Option<u32> {
    organism
        .attributes()
        .get_f64("Movement.Vision")
        .ok()
        .map(|vision| vision.max(0.0).round() as u32)
}
