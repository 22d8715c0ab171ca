//! Simulation Systems
//!
//! Per-tick organism updates, death and birth, conflict resolution and
//! relationship graph maintenance. Each system extends
//! [`Ecosystem`](crate::ecosystem::Ecosystem) with the operations it owns.

pub mod conflict;
pub mod lifecycle;
pub mod relations;

pub use conflict::sample_gestation_days;
pub use relations::{DEFAULT_MATE_ATTRACTION, DEFAULT_PREDATOR_AVERSION, DEFAULT_PREY_ATTRACTION};
