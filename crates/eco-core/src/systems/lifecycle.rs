//! Organism Lifecycle
//!
//! The per-tick update, gestation and birth, and death.

use eco_events::{DeathCause, EventKind};
use std::sync::Arc;

use crate::components::{Organism, Sex};
use crate::ecosystem::Ecosystem;
use crate::error::SimError;

impl Ecosystem {
    /// Updates one organism for the current tick.
    ///
    /// Returns `Ok(false)` without doing anything if the organism is dead or
    /// retired. Otherwise counts a tick of gestation (giving birth when the
    /// pregnancy comes due), runs the bound handlers in registration order and
    /// returns `Ok(true)`. Once a handler kills the organism the remaining
    /// handlers are skipped.
    pub fn update_organism(&mut self, index: u32) -> Result<bool, SimError> {
        tracing::debug!("Updating organism {}", index);
        let Some(organism) = self.registry.get_mut(index) else {
            return Ok(false);
        };
        if !organism.is_alive() {
            tracing::info!("Organism {} is dead", index);
            return Ok(false);
        }

        if let Some(pregnancy) = organism.advance_gestation() {
            tracing::info!(
                "Organism {} gives birth after {} ticks",
                index,
                pregnancy.elapsed
            );
            self.make_offspring(index)?;
        }

        self.dispatch(index)?;
        Ok(true)
    }

    fn dispatch(&mut self, index: u32) -> Result<(), SimError> {
        let bound = match self.registry.get(index) {
            Some(organism) => organism.handlers().to_vec(),
            None => return Ok(()),
        };
        let handlers = Arc::clone(&self.handlers);

        for id in bound {
            let Some(handler) = handlers.get(id) else {
                continue;
            };
            let Some(organism) = self.registry.get(index).filter(|o| o.is_alive()) else {
                tracing::debug!("Organism {} died, skipping remaining handlers", index);
                break;
            };
            if handler.dynamic_filter(organism) {
                tracing::debug!("Running handler '{}' on organism {}", handler.name(), index);
                handler.run(self, index)?;
            }
        }
        Ok(())
    }

    /// Kills an organism: marks it dead, tells the grid engine, takes it off
    /// the grid, retires its index and removes every movement factor that
    /// points at it. Killing a retired index does nothing.
    pub fn die(&mut self, index: u32, cause: DeathCause) {
        let Some(organism) = self.registry.get_mut(index) else {
            return;
        };
        tracing::info!("Organism {} is dying", index);
        organism.mark_dead();

        self.grid.die(index);
        if !self.grid.remove_from_grid(index) {
            tracing::warn!("Organism {} was not on the grid", index);
        }
        self.registry.remove(index);
        self.cleanup_relations(index);
        self.record(EventKind::Died { index, cause });
    }

    /// Creates an offspring of `parent` in the parent's cell and resolves
    /// the resulting conflict with the parent. The offspring inherits the
    /// parent's full attribute tree and gets a random sex.
    pub fn make_offspring(&mut self, parent: u32) -> Result<u32, SimError> {
        let attributes = self
            .registry
            .get(parent)
            .map(|o| o.attributes().clone())
            .ok_or(SimError::UnknownOrganism { index: parent })?;
        let position = self
            .grid
            .position(parent)
            .ok_or(SimError::UnknownOrganism { index: parent })?;

        let sex = Sex::random(&mut self.rng);
        let child = self
            .registry
            .allocate_contested(self.grid.as_mut(), position, sex)?;
        if let Some(organism) = self.registry.get_mut(child) {
            organism.set_parent(parent);
        }
        if let Some(organism) = self.registry.get_mut(parent) {
            organism.add_offspring(child);
        }
        tracing::info!("Organism {} born to {} at {}", child, parent, position);
        self.record(EventKind::Born {
            index: child,
            parent,
            position,
        });

        self.set_attributes(child, attributes)?;
        self.handle_conflict(child)?;
        Ok(child)
    }

    /// Indices of the organism's offspring that are still alive.
    pub fn living_offspring(&self, parent: u32) -> Vec<u32> {
        self.registry
            .get(parent)
            .map(|o| {
                o.offspring()
                    .iter()
                    .copied()
                    .filter(|&child| self.registry.get(child).map_or(false, Organism::is_alive))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::AttributeTree;
    use crate::grid::Grid;
    use crate::handlers::{Handler, HandlerSet, StaticFilters};
    use eco_events::Position;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Kills whatever it runs on.
    struct Reaper {
        filters: StaticFilters,
    }

    impl Handler for Reaper {
        fn name(&self) -> &str {
            "Reaper"
        }

        fn static_filters(&self) -> &StaticFilters {
            &self.filters
        }

        fn run(&self, eco: &mut Ecosystem, index: u32) -> Result<(), SimError> {
            eco.die(index, DeathCause::Removed);
            Ok(())
        }
    }

    /// Counts its runs.
    struct Counter {
        filters: StaticFilters,
        runs: Arc<AtomicUsize>,
    }

    impl Handler for Counter {
        fn name(&self) -> &str {
            "Counter"
        }

        fn static_filters(&self) -> &StaticFilters {
            &self.filters
        }

        fn dynamic_filter(&self, organism: &Organism) -> bool {
            organism.sex() == Sex::Female
        }

        fn run(&self, _eco: &mut Ecosystem, _index: u32) -> Result<(), SimError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn species() -> AttributeTree {
        AttributeTree::new().with(
            "Taxonomy",
            AttributeTree::new().with("Genus", "Test").with("Species", "Subject"),
        )
    }

    #[test]
    fn test_dynamic_filter_gates_each_tick() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut handlers = HandlerSet::new();
        handlers.register(Box::new(Counter {
            filters: StaticFilters::new(),
            runs: Arc::clone(&runs),
        }));
        let mut eco = Ecosystem::new(Box::new(Grid::new(4, 4, 1)), handlers, 1, 60.0);

        let female = eco.allocate(Position::new(0, 0)).unwrap();
        eco.organism_mut(female).unwrap().set_sex(Sex::Female);
        eco.set_attributes(female, species()).unwrap();
        let male = eco.allocate(Position::new(3, 3)).unwrap();
        eco.organism_mut(male).unwrap().set_sex(Sex::Male);
        eco.set_attributes(male, species()).unwrap();

        eco.run(3).unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_dead_organism_skips_remaining_handlers() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut handlers = HandlerSet::new();
        handlers.register(Box::new(Reaper {
            filters: StaticFilters::new(),
        }));
        handlers.register(Box::new(Counter {
            filters: StaticFilters::new(),
            runs: Arc::clone(&runs),
        }));
        let mut eco = Ecosystem::new(Box::new(Grid::new(4, 4, 1)), handlers, 1, 60.0);

        let index = eco.allocate(Position::new(1, 1)).unwrap();
        eco.organism_mut(index).unwrap().set_sex(Sex::Female);
        eco.set_attributes(index, species()).unwrap();
        assert_eq!(eco.organism(index).unwrap().handlers().len(), 2);

        assert!(eco.update_organism(index).unwrap());
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(!eco.is_alive(index));
        assert!(!eco.update_organism(index).unwrap());
        assert_eq!(eco.grid_mut().occupant(Position::new(1, 1)), None);
    }

    #[test]
    fn test_die_is_idempotent() {
        let mut eco = Ecosystem::new(Box::new(Grid::new(4, 4, 1)), HandlerSet::new(), 1, 60.0);
        let index = eco.spawn(Position::new(2, 2), species()).unwrap();
        eco.drain_events();

        eco.die(index, DeathCause::Removed);
        eco.die(index, DeathCause::Removed);
        assert_eq!(eco.population(), 0);
        assert_eq!(eco.drain_events().len(), 1);
        assert!(!eco.grid().is_alive(index));
    }

    #[test]
    fn test_make_offspring_inherits_attributes() {
        let mut eco = Ecosystem::new(Box::new(Grid::new(4, 4, 1)), HandlerSet::new(), 1, 60.0);
        let parent = eco.spawn(Position::new(0, 0), species()).unwrap();

        let child = eco.make_offspring(parent).unwrap();
        let organism = eco.organism(child).unwrap();
        assert_eq!(organism.parent(), Some(parent));
        assert_eq!(organism.attributes(), eco.organism(parent).unwrap().attributes());
        assert_eq!(eco.living_offspring(parent), vec![child]);

        // The fallback moved the child next to its parent.
        let position = eco.position(child).unwrap();
        assert_eq!(position.chebyshev_distance(&Position::new(0, 0)), 1);
        assert!(eco.grid_mut().update());
    }
}
