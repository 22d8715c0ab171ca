//! Error Types
//!
//! Recoverable errors (`InitError`, `LookupError`) signal bad input or
//! configuration. `ConflictError` and engine update failures signal that the
//! registry and the grid engine disagree, and are fatal for the run.

use eco_events::Position;
use thiserror::Error;

/// An organism could not be placed on the grid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    #[error("grid engine rejected placement of organism {index} at {position}")]
    PlacementRejected { index: u32, position: Position },
    #[error("grid engine rejected contested placement of organism {index} at {position}")]
    ContestedPlacementRejected { index: u32, position: Position },
}

/// A dotted attribute path did not resolve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("attribute path '{path}' does not resolve: no '{segment}'")]
    Missing { path: String, segment: String },
    #[error("attribute '{path}' is not {expected}")]
    WrongType { path: String, expected: &'static str },
}

/// Conflict resolution broke an invariant shared with the grid engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictError {
    #[error("organism {index} is in conflict with itself")]
    SelfConflict { index: u32 },
    #[error("organism {index} has no pending conflict")]
    NotConflicted { index: u32 },
    #[error("organism {index} conflicts with unregistered occupant {occupant}")]
    UnknownOccupant { index: u32, occupant: u32 },
    #[error("default conflict handler failed for organism {index}")]
    FallbackFailed { index: u32 },
}

/// Errors returned by ecosystem operations.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Init(#[from] InitError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Conflict(#[from] ConflictError),
    #[error("grid update failed at tick {tick}")]
    EngineUpdate { tick: u64 },
    #[error("no live organism with index {index}")]
    UnknownOrganism { index: u32 },
    #[error("organism {index} has invalid attributes: {reason}")]
    InvalidAttribute { index: u32, reason: String },
}

impl SimError {
    /// Whether the error means the run cannot safely continue.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SimError::Conflict(_) | SimError::EngineUpdate { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(SimError::from(ConflictError::SelfConflict { index: 1 }).is_fatal());
        assert!(SimError::EngineUpdate { tick: 3 }.is_fatal());

        let init = InitError::PlacementRejected {
            index: 0,
            position: Position::new(-1, 0),
        };
        assert!(!SimError::from(init).is_fatal());
        assert!(!SimError::UnknownOrganism { index: 9 }.is_fatal());
    }

    #[test]
    fn test_messages() {
        let err = LookupError::Missing {
            path: "Taxonomy.Genus".to_string(),
            segment: "Genus".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "attribute path 'Taxonomy.Genus' does not resolve: no 'Genus'"
        );
    }
}
