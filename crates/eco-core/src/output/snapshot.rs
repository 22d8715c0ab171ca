//! Snapshot Generation
//!
//! Captures the read-only view of the ecosystem a visualization consumes:
//! each organism's index, position, liveness and scientific name.

use eco_events::{generate_snapshot_id, OrganismSnapshot, SpeciesCount, WorldSnapshot};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ecosystem::Ecosystem;

/// Tracks snapshot ids and the periodic snapshot schedule.
#[derive(Debug)]
pub struct SnapshotGenerator {
    next_snapshot_id: u64,
    snapshot_interval: u64,
    last_snapshot_tick: Option<u64>,
}

impl SnapshotGenerator {
    pub fn new(snapshot_interval: u64) -> Self {
        Self {
            next_snapshot_id: 1,
            snapshot_interval,
            last_snapshot_tick: None,
        }
    }

    /// A zero interval disables periodic snapshots.
    pub fn should_snapshot(&self, current_tick: u64) -> bool {
        self.snapshot_interval > 0
            && current_tick % self.snapshot_interval == 0
            && self.last_snapshot_tick != Some(current_tick)
    }

    pub fn next_id(&mut self) -> String {
        let id = generate_snapshot_id(self.next_snapshot_id);
        self.next_snapshot_id += 1;
        id
    }

    pub fn mark_snapshot(&mut self, tick: u64) {
        self.last_snapshot_tick = Some(tick);
    }

    /// True if the most recent snapshot was taken at `tick`.
    pub fn has_snapshot(&self, tick: u64) -> bool {
        self.last_snapshot_tick == Some(tick)
    }

    pub fn snapshot_count(&self) -> u64 {
        self.next_snapshot_id - 1
    }
}

/// Generate a complete world snapshot
pub fn generate_snapshot(
    eco: &Ecosystem,
    generator: &mut SnapshotGenerator,
    triggered_by: &str,
) -> WorldSnapshot {
    let mut snapshot = WorldSnapshot::new(
        generator.next_id(),
        eco.timestamp(),
        triggered_by,
        eco.grid().size(),
    );
    let mut species: BTreeMap<String, usize> = BTreeMap::new();

    for index in eco.registry().sorted_indices() {
        let (Some(organism), Some(position)) = (eco.organism(index), eco.position(index)) else {
            continue;
        };
        let scientific_name = organism.scientific_name().ok();
        if let Some(name) = &scientific_name {
            *species.entry(name.clone()).or_default() += 1;
        }

        snapshot.organisms.push(OrganismSnapshot {
            index,
            position,
            alive: organism.is_alive(),
            scientific_name,
            sex: Some(organism.sex().to_string()),
            pregnant: organism.is_pregnant(),
        });
    }

    snapshot.species = species
        .into_iter()
        .map(|(scientific_name, count)| SpeciesCount {
            scientific_name,
            count,
        })
        .collect();
    generator.mark_snapshot(eco.tick());
    snapshot
}

/// Write snapshot to file
pub fn write_snapshot(snapshot: &WorldSnapshot, path: impl AsRef<Path>) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, json)?;
    Ok(())
}

/// Write snapshot into `<output>/snapshots/`, named by tick
pub fn write_snapshot_to_dir(
    snapshot: &WorldSnapshot,
    output: impl AsRef<Path>,
) -> std::io::Result<PathBuf> {
    let dir = output.as_ref().join("snapshots");
    fs::create_dir_all(&dir)?;
    let path = dir.join(format!("snap_{:06}.json", snapshot.timestamp.tick));
    write_snapshot(snapshot, &path)?;
    Ok(path)
}

/// Write current state (overwrites each time)
pub fn write_current_state(
    snapshot: &WorldSnapshot,
    output: impl AsRef<Path>,
) -> std::io::Result<()> {
    write_snapshot(snapshot, output.as_ref().join("current_state.json"))
}
