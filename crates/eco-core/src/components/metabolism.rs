//! Metabolism Capability
//!
//! The core treats metabolism as an opaque capability: it asks how much
//! energy is stored, tells it that time passed, and hands a predator the
//! prey's energy. The two implementations here are deliberately simple
//! constant-rate stand-ins.

use std::fmt;

use crate::components::attributes::AttributeTree;

/// Energy bookkeeping for one organism. Energy is in joules.
pub trait Metabolism: fmt::Debug {
    /// Current stored energy.
    fn energy(&self) -> f64;

    /// Advances the metabolism by `seconds` of simulated time.
    fn update(&mut self, seconds: f64);

    /// Spends (positive) or gains (negative) energy.
    fn use_energy(&mut self, amount: f64);

    /// Absorbs another organism's stored energy in full.
    fn consume(&mut self, energy: f64) {
        self.use_energy(-energy);
    }

    /// Whether the organism has run out of energy.
    fn is_starving(&self) -> bool {
        self.energy() <= 0.0
    }
}

/// Animal stand-in: a constant basal drain in watts.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimalMetabolism {
    energy: f64,
    basal_rate: f64,
}

impl AnimalMetabolism {
    pub fn new(energy: f64, basal_rate: f64) -> Self {
        Self { energy, basal_rate }
    }

    pub fn basal_rate(&self) -> f64 {
        self.basal_rate
    }
}

impl Metabolism for AnimalMetabolism {
    fn energy(&self) -> f64 {
        self.energy
    }

    fn update(&mut self, seconds: f64) {
        self.use_energy(self.basal_rate * seconds);
    }

    fn use_energy(&mut self, amount: f64) {
        self.energy -= amount;
    }
}

/// Plant stand-in: constant net production in watts.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantMetabolism {
    energy: f64,
    production_rate: f64,
}

impl PlantMetabolism {
    pub fn new(energy: f64, production_rate: f64) -> Self {
        Self {
            energy,
            production_rate,
        }
    }
}

impl Metabolism for PlantMetabolism {
    fn energy(&self) -> f64 {
        self.energy
    }

    fn update(&mut self, seconds: f64) {
        self.energy += self.production_rate * seconds;
    }

    fn use_energy(&mut self, amount: f64) {
        self.energy -= amount;
    }
}

/// Builds the stand-in metabolism an organism's attributes describe.
///
/// Returns `None` when the attributes carry no `Metabolism.InitialEnergy`.
/// Plants (`Taxonomy.Kingdom = "Plantae"`) get a [`PlantMetabolism`] driven by
/// `Metabolism.ProductionRate`; everything else gets an [`AnimalMetabolism`]
/// driven by `Metabolism.BasalRate`. Missing rates default to zero.
pub fn from_attributes(attributes: &AttributeTree) -> Option<Box<dyn Metabolism>> {
    let energy = attributes.get_f64("Metabolism.InitialEnergy").ok()?;
    let is_plant = attributes
        .get_str("Taxonomy.Kingdom")
        .map_or(false, |kingdom| kingdom == "Plantae");

    if is_plant {
        let rate = attributes.get_f64("Metabolism.ProductionRate").unwrap_or(0.0);
        Some(Box::new(PlantMetabolism::new(energy, rate)))
    } else {
        let rate = attributes.get_f64("Metabolism.BasalRate").unwrap_or(0.0);
        Some(Box::new(AnimalMetabolism::new(energy, rate)))
    }
}

/// True if the attributes set either metabolic rate.
pub fn declares_rate(attributes: &AttributeTree) -> bool {
    attributes.get_f64("Metabolism.BasalRate").is_ok()
        || attributes.get_f64("Metabolism.ProductionRate").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_animal_drain_and_starvation() {
        let mut metabolism = AnimalMetabolism::new(100.0, 2.0);
        metabolism.update(10.0);
        assert_eq!(metabolism.energy(), 80.0);
        assert!(!metabolism.is_starving());

        metabolism.update(40.0);
        assert!(metabolism.is_starving());
    }

    #[test]
    fn test_consume_adds_prey_energy() {
        let mut predator = AnimalMetabolism::new(50.0, 1.0);
        let prey = PlantMetabolism::new(30.0, 0.0);
        predator.consume(prey.energy());
        assert_eq!(predator.energy(), 80.0);
    }

    #[test]
    fn test_from_attributes() {
        let plant = AttributeTree::from_toml_str(
            r#"
            [Taxonomy]
            Kingdom = "Plantae"
            [Metabolism]
            InitialEnergy = 10.0
            ProductionRate = 1.0
            "#,
        )
        .unwrap();
        let mut metabolism = from_attributes(&plant).unwrap();
        metabolism.update(5.0);
        assert_eq!(metabolism.energy(), 15.0);

        assert!(declares_rate(&plant));
        assert!(from_attributes(&AttributeTree::new()).is_none());
        assert!(!declares_rate(&AttributeTree::new()));
    }
}
