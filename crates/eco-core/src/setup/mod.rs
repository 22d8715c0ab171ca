//! World Setup
//!
//! Species library loading and initial organism placement.

pub mod library;
pub mod spawn;

pub use library::{species_file_name, Library, LibraryError};
pub use spawn::{spawn_all, CellPicker, SetupError, SpawnSummary};
