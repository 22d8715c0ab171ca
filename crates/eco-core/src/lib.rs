//! Ecosystem Simulation Engine Library
//!
//! Organisms compete, feed and reproduce on a shared grid. This crate owns
//! the organism registry, the handler framework, the life/death/pregnancy
//! state machine and conflict resolution; the grid itself sits behind the
//! [`GridEngine`] trait.

pub mod components;
pub mod config;
pub mod ecosystem;
pub mod error;
pub mod events;
pub mod grid;
pub mod handlers;
pub mod output;
pub mod pacing;
pub mod registry;
pub mod setup;
pub mod systems;

pub use components::{AttributeTree, AttributeValue, LifeState, Metabolism, Organism, Pregnancy, Sex};
pub use config::{Config, ConfigError};
pub use ecosystem::Ecosystem;
pub use error::{ConflictError, InitError, LookupError, SimError};
pub use grid::{Grid, GridEngine, MovementFactor};
pub use handlers::{Handler, HandlerId, HandlerSet, StaticFilters};
pub use registry::EntityRegistry;
