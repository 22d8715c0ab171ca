//! Relationship Graph
//!
//! Movement factors between organisms: predators are drawn to prey, prey
//! avoid predators, and potential mates are drawn to each other. Factors are
//! created when an organism first gets attributes and torn down when either
//! end dies. The grid engine stores them but never cleans them up on its own.

use crate::components::Organism;
use crate::ecosystem::{vision_of, Ecosystem};

pub const DEFAULT_PREY_ATTRACTION: f64 = 100.0;
pub const DEFAULT_PREDATOR_AVERSION: f64 = 100.0;
pub const DEFAULT_MATE_ATTRACTION: f64 = 50.0;

fn strength(organism: &Organism, key: &str, default: f64) -> f64 {
    organism
        .attributes()
        .get_f64(&format!("Movement.{}", key))
        .unwrap_or(default)
}

/// Strengths of the factors `owner` should hold toward `other`.
fn factors_toward(owner: &Organism, other: &Organism) -> Vec<f64> {
    let mut factors = Vec::new();
    if owner.preys_on(other) {
        factors.push(strength(owner, "PreyAttraction", DEFAULT_PREY_ATTRACTION));
    }
    if other.preys_on(owner) {
        factors.push(-strength(owner, "PredatorAversion", DEFAULT_PREDATOR_AVERSION));
    }
    if owner.same_species(other) && owner.sex() != other.sex() {
        factors.push(strength(owner, "MateAttraction", DEFAULT_MATE_ATTRACTION));
    }
    factors
}

impl Ecosystem {
    /// Creates factors in both directions between `index` and every other
    /// organism that already has attributes.
    pub(crate) fn setup_relations(&mut self, index: u32) {
        let Some(subject) = self.registry.get(index) else {
            return;
        };

        let mut pending = Vec::new();
        for other in self.registry.sorted_indices() {
            if other == index {
                continue;
            }
            let Some(peer) = self.registry.get(other).filter(|o| o.has_attributes()) else {
                continue;
            };
            for strength in factors_toward(subject, peer) {
                pending.push((index, other, strength, vision_of(subject)));
            }
            for strength in factors_toward(peer, subject) {
                pending.push((other, index, strength, vision_of(peer)));
            }
        }

        tracing::debug!("Adding {} movement factors for organism {}", pending.len(), index);
        for (owner, source, strength, visibility) in pending {
            self.grid
                .add_factor_from_organism(owner, source, strength, visibility);
        }
    }

    /// Asks every surviving organism to drop factors that point at `dead`.
    pub(crate) fn cleanup_relations(&mut self, dead: u32) {
        for other in self.registry.sorted_indices() {
            self.grid.cleanup_organism(other, dead);
        }
    }
}
