//! Shared event and snapshot types for the ecosystem simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! The core engine produces these values; log readers and visualizations
//! consume them.

pub mod event;
pub mod position;
pub mod snapshot;
pub mod timestamp;

pub use event::{generate_event_id, DeathCause, Event, EventKind};
pub use position::Position;
pub use snapshot::{generate_snapshot_id, OrganismSnapshot, SpeciesCount, WorldSnapshot};
pub use timestamp::{ticks_from_days, SimTimestamp, SECONDS_PER_DAY};
