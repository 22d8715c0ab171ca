//! Snapshot Types
//!
//! Serialization structs for world snapshots. A snapshot is the read-only view
//! a visualization gets of the simulation: index, position, liveness and
//! scientific name of every organism, plus a few population counts.

use serde::{Deserialize, Serialize};

use crate::{Position, SimTimestamp};

/// Generates a snapshot ID with the given sequence number.
pub fn generate_snapshot_id(sequence: u64) -> String {
    format!("snap_{:06}", sequence)
}

/// One organism as seen by the visualization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganismSnapshot {
    pub index: u32,
    pub position: Position,
    pub alive: bool,
    /// "Genus species", or `None` when the taxonomy is incomplete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scientific_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(default)]
    pub pregnant: bool,
}

/// Live population of one species.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesCount {
    pub scientific_name: String,
    pub count: usize,
}

/// Complete world snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub snapshot_id: String,
    pub timestamp: SimTimestamp,
    pub triggered_by: String,
    pub grid_size: (i32, i32),
    #[serde(default)]
    pub organisms: Vec<OrganismSnapshot>,
    #[serde(default)]
    pub species: Vec<SpeciesCount>,
}

impl WorldSnapshot {
    pub fn new(
        snapshot_id: impl Into<String>,
        timestamp: SimTimestamp,
        triggered_by: impl Into<String>,
        grid_size: (i32, i32),
    ) -> Self {
        Self {
            snapshot_id: snapshot_id.into(),
            timestamp,
            triggered_by: triggered_by.into(),
            grid_size,
            organisms: Vec::new(),
            species: Vec::new(),
        }
    }

    /// Total number of organisms in the snapshot.
    pub fn population(&self) -> usize {
        self.organisms.len()
    }

    /// Looks up an organism by index.
    pub fn organism(&self, index: u32) -> Option<&OrganismSnapshot> {
        self.organisms.iter().find(|o| o.index == index)
    }
}
