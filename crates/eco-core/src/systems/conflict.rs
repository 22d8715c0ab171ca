//! Conflict Resolution
//!
//! Runs when the grid engine reports that an organism tried to enter an
//! occupied cell. The contender `A` and the occupant `B` are resolved in
//! order:
//!
//! 1. Predation. If `A` eats `B` (or else `B` eats `A`), the predator
//!    absorbs the prey's energy and the prey dies. Resolution ends here.
//! 2. Mating. Same species, opposite sex, neither pregnant, neither the
//!    other's parent: both must want to mate, then the female's conception
//!    probability decides.
//! 3. The grid engine's default handler relocates the contender.
//!
//! Any disagreement with the grid engine about whether a conflict exists is
//! a [`ConflictError`] and ends the run.

use eco_events::{ticks_from_days, DeathCause, EventKind};
use rand::Rng;

use crate::components::{Organism, Pregnancy, Sex};
use crate::ecosystem::Ecosystem;
use crate::error::{ConflictError, SimError};

/// Samples a gestation length in days from a normal distribution, clamped
/// at zero.
pub fn sample_gestation_days(rng: &mut impl Rng, mean: f64, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return mean.max(0.0);
    }
    let u1: f64 = rng.gen::<f64>().clamp(f64::MIN_POSITIVE, 1.0);
    let u2: f64 = rng.gen::<f64>();
    let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
    (mean + z * std_dev).max(0.0)
}

fn fatal(error: ConflictError) -> SimError {
    tracing::error!("Conflict resolution failed: {}", error);
    SimError::Conflict(error)
}

impl Ecosystem {
    /// Resolves the conflict the grid engine reports for `index`.
    pub fn handle_conflict(&mut self, index: u32) -> Result<(), SimError> {
        let occupant = self
            .grid
            .get_conflict(index)
            .ok_or_else(|| fatal(ConflictError::NotConflicted { index }))?;
        tracing::debug!("Organism {} conflicts with {}", index, occupant);

        if occupant == index {
            return Err(fatal(ConflictError::SelfConflict { index }));
        }
        if !self.registry.contains(index) {
            return Err(SimError::UnknownOrganism { index });
        }
        if !self.registry.contains(occupant) {
            return Err(fatal(ConflictError::UnknownOccupant { index, occupant }));
        }

        if self.resolve_predation(index, occupant) {
            return Ok(());
        }
        self.resolve_mating(index, occupant);
        self.resolve_by_default(index, occupant)
    }

    /// Returns true if one organism ate the other.
    fn resolve_predation(&mut self, a: u32, b: u32) -> bool {
        let (Some(first), Some(second)) = (self.registry.get(a), self.registry.get(b)) else {
            return false;
        };
        let (predator, prey) = if first.preys_on(second) {
            (a, b)
        } else if second.preys_on(first) {
            (b, a)
        } else {
            return false;
        };

        let energy = self
            .registry
            .get(prey)
            .and_then(Organism::energy)
            .unwrap_or(0.0);
        match self.registry.get_mut(predator).and_then(|o| o.metabolism_mut()) {
            Some(metabolism) => metabolism.consume(energy),
            None => tracing::warn!("Organism {} has no metabolism to absorb prey", predator),
        }

        tracing::info!("Organism {} is consuming organism {}", predator, prey);
        self.record(EventKind::Predation {
            predator,
            prey,
            energy,
        });
        self.die(prey, DeathCause::Predation { predator });
        true
    }

    /// Attempts mating. Returns true on conception.
    fn resolve_mating(&mut self, a: u32, b: u32) -> bool {
        let (Some(first), Some(second)) = (self.registry.get(a), self.registry.get(b)) else {
            return false;
        };
        if !first.same_species(second)
            || first.sex() == second.sex()
            || first.is_pregnant()
            || second.is_pregnant()
            || first.parent() == Some(b)
            || second.parent() == Some(a)
        {
            return false;
        }

        let (female, male) = if first.sex() == Sex::Female {
            (first, second)
        } else {
            (second, first)
        };
        let (Ok(female_wants), Ok(male_wants)) = (
            female.attributes().get_f64("Reproduction.WantsSex"),
            male.attributes().get_f64("Reproduction.WantsSex"),
        ) else {
            return false;
        };
        let reproduction = female.attributes();
        let (Ok(conception), Ok(mean), Ok(std_dev)) = (
            reproduction.get_f64("Reproduction.ConceptionProbability"),
            reproduction.get_f64("Reproduction.GestationMean"),
            reproduction.get_f64("Reproduction.GestationStdDev"),
        ) else {
            tracing::warn!(
                "Organism {} lacks reproduction parameters, cannot conceive",
                female.index()
            );
            return false;
        };
        let (female, male) = (female.index(), male.index());

        if !self.rng.gen_bool(female_wants.clamp(0.0, 1.0))
            || !self.rng.gen_bool(male_wants.clamp(0.0, 1.0))
        {
            return false;
        }
        if !self.rng.gen_bool(conception.clamp(0.0, 1.0)) {
            tracing::debug!("Organisms {} and {} mated without conception", female, male);
            return false;
        }

        let days = sample_gestation_days(&mut self.rng, mean, std_dev);
        let required = ticks_from_days(days, self.seconds_per_tick());
        let conceived = self
            .registry
            .get_mut(female)
            .map_or(false, |o| o.conceive(Pregnancy::new(required, male)));
        if conceived {
            tracing::info!(
                "Organism {} conceived with {}, due in {:.1} ticks",
                female,
                male,
                required
            );
            self.record(EventKind::Conceived {
                female,
                male,
                gestation_ticks: required,
            });
        }
        conceived
    }

    fn resolve_by_default(&mut self, index: u32, occupant: u32) -> Result<(), SimError> {
        tracing::debug!("Using default conflict handler for {}", index);
        if !self.grid.default_conflict_handler(index) {
            return Err(fatal(ConflictError::FallbackFailed { index }));
        }
        if let Some(position) = self.grid.position(index) {
            self.record(EventKind::Relocated {
                index,
                occupant,
                position,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_gestation_without_spread_is_exact() {
        let mut rng = SmallRng::seed_from_u64(5);
        assert_eq!(sample_gestation_days(&mut rng, 2.0, 0.0), 2.0);
        assert_eq!(sample_gestation_days(&mut rng, -1.0, 0.0), 0.0);
    }

    #[test]
    fn test_gestation_sampling() {
        let mut rng = SmallRng::seed_from_u64(5);
        let samples: Vec<f64> = (0..2000)
            .map(|_| sample_gestation_days(&mut rng, 30.0, 3.0))
            .collect();
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        assert!((mean - 30.0).abs() < 0.5, "sample mean {}", mean);
        assert!(samples.iter().all(|&d| d >= 0.0));
    }
}
