//! Organism Components
//!
//! Attributes, organism state and the metabolism capability.

pub mod attributes;
pub mod metabolism;
pub mod organism;

pub use attributes::{AttributeTree, AttributeValue};
pub use metabolism::{AnimalMetabolism, Metabolism, PlantMetabolism};
pub use organism::{LifeState, Organism, Pregnancy, Sex};
