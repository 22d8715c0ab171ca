//! Organism Components
//!
//! Per-organism state: identity, sex, life state, attributes, bound handlers
//! and offspring links. Organisms live in the
//! [`EntityRegistry`](crate::registry::EntityRegistry); every reference to
//! another organism is an index into it.

use rand::Rng;
use std::fmt;

use crate::components::attributes::{AttributeTree, AttributeValue};
use crate::components::metabolism::Metabolism;
use crate::error::LookupError;
use crate::handlers::HandlerId;

/// Biological sex, which gates mating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    /// Picks either sex with equal probability.
    pub fn random(rng: &mut impl Rng) -> Self {
        if rng.gen_bool(0.5) {
            Sex::Female
        } else {
            Sex::Male
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Sex::Female => Sex::Male,
            Sex::Male => Sex::Female,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Female => write!(f, "female"),
            Sex::Male => write!(f, "male"),
        }
    }
}

/// An ongoing pregnancy.
#[derive(Debug, Clone, PartialEq)]
pub struct Pregnancy {
    /// Ticks since conception.
    pub elapsed: u32,
    /// Ticks until birth, sampled at conception.
    pub required: f64,
    /// Index of the father at conception time.
    pub father: u32,
}

impl Pregnancy {
    pub fn new(required: f64, father: u32) -> Self {
        Self {
            elapsed: 0,
            required,
            father,
        }
    }

    pub fn is_due(&self) -> bool {
        f64::from(self.elapsed) >= self.required
    }
}

/// Where an organism is in its life.
#[derive(Debug, Clone, PartialEq)]
pub enum LifeState {
    Alive { pregnancy: Option<Pregnancy> },
    Dead,
}

/// A grid-resident simulation subject.
#[derive(Debug)]
pub struct Organism {
    index: u32,
    sex: Sex,
    state: LifeState,
    attributes: AttributeTree,
    attributes_assigned: bool,
    handlers: Vec<HandlerId>,
    parent: Option<u32>,
    offspring: Vec<u32>,
    metabolism: Option<Box<dyn Metabolism>>,
}

impl Organism {
    pub fn new(index: u32, sex: Sex) -> Self {
        Self {
            index,
            sex,
            state: LifeState::Alive { pregnancy: None },
            attributes: AttributeTree::new(),
            attributes_assigned: false,
            handlers: Vec::new(),
            parent: None,
            offspring: Vec::new(),
            metabolism: None,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    pub fn set_sex(&mut self, sex: Sex) {
        self.sex = sex;
    }

    pub fn state(&self) -> &LifeState {
        &self.state
    }

    pub fn is_alive(&self) -> bool {
        matches!(self.state, LifeState::Alive { .. })
    }

    pub fn pregnancy(&self) -> Option<&Pregnancy> {
        match &self.state {
            LifeState::Alive { pregnancy } => pregnancy.as_ref(),
            LifeState::Dead => None,
        }
    }

    pub fn is_pregnant(&self) -> bool {
        self.pregnancy().is_some()
    }

    pub fn gestation_elapsed(&self) -> u32 {
        self.pregnancy().map_or(0, |p| p.elapsed)
    }

    pub fn gestation_required(&self) -> f64 {
        self.pregnancy().map_or(0.0, |p| p.required)
    }

    pub fn attributes(&self) -> &AttributeTree {
        &self.attributes
    }

    /// Shorthand for a dotted lookup on this organism's attributes.
    pub fn attribute(&self, path: &str) -> Result<&AttributeValue, LookupError> {
        self.attributes.get(path)
    }

    pub fn has_attributes(&self) -> bool {
        self.attributes_assigned
    }

    pub fn handlers(&self) -> &[HandlerId] {
        &self.handlers
    }

    pub fn parent(&self) -> Option<u32> {
        self.parent
    }

    pub fn offspring(&self) -> &[u32] {
        &self.offspring
    }

    pub fn metabolism(&self) -> Option<&dyn Metabolism> {
        self.metabolism.as_deref()
    }

    pub fn metabolism_mut(&mut self) -> Option<&mut (dyn Metabolism + 'static)> {
        self.metabolism.as_deref_mut()
    }

    pub fn set_metabolism(&mut self, metabolism: Box<dyn Metabolism>) {
        self.metabolism = Some(metabolism);
    }

    /// Stored energy, if the organism has a metabolism.
    pub fn energy(&self) -> Option<f64> {
        self.metabolism().map(|m| m.energy())
    }

    /// "Genus species" from the taxonomy attributes.
    pub fn scientific_name(&self) -> Result<String, LookupError> {
        Ok(format!(
            "{} {}",
            self.attributes.get_str("Taxonomy.Genus")?,
            self.attributes.get_str("Taxonomy.Species")?
        ))
    }

    /// Scientific names listed under `Prey`. Empty if the species eats nothing.
    pub fn prey(&self) -> Vec<&str> {
        self.attributes
            .get_list("Prey")
            .map(|values| values.iter().filter_map(AttributeValue::as_str).collect())
            .unwrap_or_default()
    }

    pub fn preys_on(&self, other: &Organism) -> bool {
        match other.scientific_name() {
            Ok(name) => self.prey().contains(&name.as_str()),
            Err(_) => false,
        }
    }

    pub fn same_species(&self, other: &Organism) -> bool {
        match (self.scientific_name(), other.scientific_name()) {
            (Ok(ours), Ok(theirs)) => ours == theirs,
            _ => false,
        }
    }

    /// Replaces the attribute tree. Returns true on the first assignment,
    /// which is the only one that binds handlers and movement factors.
    pub(crate) fn assign_attributes(&mut self, attributes: AttributeTree) -> bool {
        self.attributes = attributes;
        let first = !self.attributes_assigned;
        self.attributes_assigned = true;
        first
    }

    pub(crate) fn add_handler(&mut self, handler: HandlerId) {
        self.handlers.push(handler);
    }

    pub(crate) fn set_parent(&mut self, parent: u32) {
        self.parent = Some(parent);
    }

    pub(crate) fn add_offspring(&mut self, child: u32) {
        self.offspring.push(child);
    }

    pub(crate) fn mark_dead(&mut self) {
        self.state = LifeState::Dead;
    }

    /// Starts a pregnancy. No effect unless alive and not already pregnant.
    pub(crate) fn conceive(&mut self, pregnancy: Pregnancy) -> bool {
        match &mut self.state {
            LifeState::Alive { pregnancy: slot @ None } => {
                *slot = Some(pregnancy);
                true
            }
            _ => false,
        }
    }

    /// Counts one tick of gestation. Returns the finished pregnancy when it
    /// comes due, leaving the organism no longer pregnant.
    pub(crate) fn advance_gestation(&mut self) -> Option<Pregnancy> {
        let LifeState::Alive { pregnancy } = &mut self.state else {
            return None;
        };
        let current = pregnancy.as_mut()?;
        current.elapsed += 1;
        if current.is_due() {
            pregnancy.take()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn fox() -> Organism {
        let mut organism = Organism::new(0, Sex::Female);
        organism.assign_attributes(
            AttributeTree::from_toml_str(
                r#"
                Prey = ["Lepus europaeus"]
                [Taxonomy]
                Genus = "Vulpes"
                Species = "vulpes"
                "#,
            )
            .unwrap(),
        );
        organism
    }

    fn hare() -> Organism {
        let mut organism = Organism::new(1, Sex::Male);
        organism.assign_attributes(
            AttributeTree::new().with(
                "Taxonomy",
                AttributeTree::new()
                    .with("Genus", "Lepus")
                    .with("Species", "europaeus"),
            ),
        );
        organism
    }

    #[test]
    fn test_scientific_name_and_prey() {
        let fox = fox();
        let hare = hare();
        assert_eq!(fox.scientific_name().unwrap(), "Vulpes vulpes");
        assert!(fox.preys_on(&hare));
        assert!(!hare.preys_on(&fox));
        assert!(hare.prey().is_empty());
        assert!(!fox.same_species(&hare));
    }

    #[test]
    fn test_missing_taxonomy() {
        let organism = Organism::new(3, Sex::Male);
        assert!(organism.scientific_name().is_err());
        assert!(!fox().preys_on(&organism));
    }

    #[test]
    fn test_first_assignment_only() {
        let mut organism = Organism::new(0, Sex::Male);
        assert!(organism.assign_attributes(AttributeTree::new()));
        assert!(!organism.assign_attributes(AttributeTree::new().with("Scale", 1.0)));
        assert!(organism.has_attributes());
        assert_eq!(organism.attributes().get_f64("Scale").unwrap(), 1.0);
    }

    #[test]
    fn test_gestation_cycle() {
        let mut organism = Organism::new(0, Sex::Female);
        assert!(organism.conceive(Pregnancy::new(2.0, 5)));
        assert!(!organism.conceive(Pregnancy::new(9.0, 6)));

        assert!(organism.advance_gestation().is_none());
        assert_eq!(organism.gestation_elapsed(), 1);
        assert!(organism.is_pregnant());

        let finished = organism.advance_gestation().unwrap();
        assert_eq!(finished.father, 5);
        assert!(!organism.is_pregnant());
        assert!(organism.advance_gestation().is_none());
    }

    #[test]
    fn test_dead_cannot_conceive() {
        let mut organism = Organism::new(0, Sex::Female);
        organism.mark_dead();
        assert!(!organism.is_alive());
        assert!(!organism.conceive(Pregnancy::new(1.0, 1)));
    }

    #[test]
    fn test_random_sex_is_seeded() {
        let mut a = SmallRng::seed_from_u64(7);
        let mut b = SmallRng::seed_from_u64(7);
        let first: Vec<Sex> = (0..20).map(|_| Sex::random(&mut a)).collect();
        let second: Vec<Sex> = (0..20).map(|_| Sex::random(&mut b)).collect();
        assert_eq!(first, second);
        assert_eq!(Sex::Female.opposite(), Sex::Male);
    }
}
