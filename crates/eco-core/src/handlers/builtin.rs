//! Built-in handlers registered by [`HandlerSet::with_builtin`].
//!
//! [`HandlerSet::with_builtin`]: super::HandlerSet::with_builtin

use eco_events::DeathCause;

use super::{Handler, StaticFilters};
use crate::components::{metabolism, Organism};
use crate::ecosystem::Ecosystem;
use crate::error::SimError;

/// Kingdoms that move around the grid.
pub const ANIMAL_KINGDOMS: [&str; 2] = ["Opisthokonta", "Animalia"];

/// Runs the metabolism of anything that declares one, and kills organisms
/// that starve.
pub struct MetabolismHandler {
    filters: StaticFilters,
}

impl MetabolismHandler {
    pub fn new() -> Self {
        Self {
            filters: StaticFilters::new(),
        }
    }
}

impl Default for MetabolismHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for MetabolismHandler {
    fn name(&self) -> &str {
        "MetabolismHandler"
    }

    fn static_filters(&self) -> &StaticFilters {
        &self.filters
    }

    fn dynamic_filter(&self, organism: &Organism) -> bool {
        organism.metabolism().is_some() || organism.attribute("Metabolism.InitialEnergy").is_ok()
    }

    fn run(&self, eco: &mut Ecosystem, index: u32) -> Result<(), SimError> {
        let seconds = eco.seconds_per_tick();
        let organism = eco
            .organism_mut(index)
            .ok_or(SimError::UnknownOrganism { index })?;

        // Normally built on attribute assignment; a tree replaced later may
        // only now declare one.
        if organism.metabolism().is_none() {
            tracing::debug!("Initializing metabolism for organism {}", index);
            let attributes = organism.attributes();
            if !metabolism::declares_rate(attributes) {
                tracing::warn!("Using zero metabolic rate for organism {}", index);
            }
            let initial = metabolism::from_attributes(attributes).ok_or_else(|| {
                SimError::InvalidAttribute {
                    index,
                    reason: "Metabolism.InitialEnergy is not a number".to_string(),
                }
            })?;
            organism.set_metabolism(initial);
        }

        let starving = match organism.metabolism_mut() {
            Some(metabolism) => {
                metabolism.update(seconds);
                metabolism.is_starving()
            }
            None => false,
        };
        if starving {
            tracing::info!("Organism {} starved", index);
            eco.die(index, DeathCause::Starvation);
        }
        Ok(())
    }
}

/// Moves animals and resolves the conflicts their moves cause.
pub struct AnimalHandler {
    filters: StaticFilters,
}

impl AnimalHandler {
    pub fn new() -> Self {
        Self {
            filters: StaticFilters::new().filter("Taxonomy.Kingdom", ANIMAL_KINGDOMS),
        }
    }
}

impl Default for AnimalHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for AnimalHandler {
    fn name(&self) -> &str {
        "AnimalHandler"
    }

    fn static_filters(&self) -> &StaticFilters {
        &self.filters
    }

    fn run(&self, eco: &mut Ecosystem, index: u32) -> Result<(), SimError> {
        tracing::debug!("Old position of {}: {:?}", index, eco.position(index));

        if !eco.grid_mut().update_position(index) {
            eco.handle_conflict(index)?;
        }

        tracing::debug!("New position of {}: {:?}", index, eco.position(index));
        Ok(())
    }
}
