//! Event Types
//!
//! Lifecycle events emitted by the core engine, one JSON object per line in
//! the event log.

use serde::{Deserialize, Serialize};

use crate::{Position, SimTimestamp};

/// Generates an event ID with the given sequence number.
pub fn generate_event_id(sequence: u64) -> String {
    format!("evt_{:08}", sequence)
}

/// Why an organism died.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeathCause {
    /// Eaten by another organism.
    Predation { predator: u32 },
    /// Metabolism ran out of stored energy.
    Starvation,
    /// Removed by an explicit call outside the normal lifecycle.
    Removed,
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// An organism was placed on the grid at simulation setup.
    Spawned {
        index: u32,
        species: String,
        position: Position,
    },
    /// An organism was born to a parent.
    Born {
        index: u32,
        parent: u32,
        position: Position,
    },
    /// An organism died.
    Died {
        index: u32,
        cause: DeathCause,
    },
    /// A predator absorbed its prey's stored energy.
    Predation {
        predator: u32,
        prey: u32,
        energy: f64,
    },
    /// A female became pregnant.
    Conceived {
        female: u32,
        male: u32,
        gestation_ticks: f64,
    },
    /// The grid engine moved a conflicting organism off the contested cell.
    Relocated {
        index: u32,
        occupant: u32,
        position: Position,
    },
}

/// A single logged event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub timestamp: SimTimestamp,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    pub fn new(event_id: impl Into<String>, timestamp: SimTimestamp, kind: EventKind) -> Self {
        Self {
            event_id: event_id.into(),
            timestamp,
            kind,
        }
    }

    /// Organism indices this event involves, primary subject first.
    pub fn organisms(&self) -> Vec<u32> {
        match &self.kind {
            EventKind::Spawned { index, .. } | EventKind::Died { index, .. } => vec![*index],
            EventKind::Born { index, parent, .. } => vec![*index, *parent],
            EventKind::Predation { predator, prey, .. } => vec![*predator, *prey],
            EventKind::Conceived { female, male, .. } => vec![*female, *male],
            EventKind::Relocated {
                index, occupant, ..
            } => vec![*index, *occupant],
        }
    }

    /// Serializes the event as a single JSONL line (without trailing newline).
    pub fn to_jsonl(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parses an event from a JSONL line.
    pub fn from_jsonl(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }
}
