//! Determinism verification tests
//!
//! Tests to ensure the simulation produces identical results given the same seed.

use eco_core::components::{AttributeTree, Sex};
use eco_core::output::{generate_snapshot, SnapshotGenerator};
use eco_core::setup::CellPicker;
use eco_core::{Ecosystem, Grid};
use eco_events::{Event, WorldSnapshot, SECONDS_PER_DAY};

fn species(genus: &str, species: &str, prey: &[&str], energy: f64) -> AttributeTree {
    let prey: Vec<&str> = prey.to_vec();
    AttributeTree::new()
        .with(
            "Taxonomy",
            AttributeTree::new()
                .with("Kingdom", "Animalia")
                .with("Genus", genus)
                .with("Species", species),
        )
        .with("Prey", prey)
        .with(
            "Reproduction",
            AttributeTree::new()
                .with("WantsSex", 0.5)
                .with("ConceptionProbability", 0.8)
                .with("GestationMean", 3.0)
                .with("GestationStdDev", 1.0),
        )
        .with(
            "Metabolism",
            AttributeTree::new()
                .with("InitialEnergy", energy)
                .with("BasalRate", 1.0 / SECONDS_PER_DAY),
        )
        .with("Movement", AttributeTree::new().with("Speed", 2.0).with("Vision", 8.0))
}

/// Runs a mixed fox and hare population and returns everything it produced.
fn run(seed: u64, ticks: u64) -> (Vec<Event>, WorldSnapshot) {
    let mut eco = Ecosystem::with_builtin_handlers(Box::new(Grid::new(16, 16, seed)), seed, SECONDS_PER_DAY);
    let mut picker = CellPicker::new(16, 16, seed);

    for i in 0..30 {
        let attributes = if i % 5 == 0 {
            species("Vulpes", "vulpes", &["Lepus europaeus"], 40.0)
        } else {
            species("Lepus", "europaeus", &[], 25.0)
        };
        eco.spawn(picker.next_cell().unwrap(), attributes).unwrap();
    }

    let mut events = eco.drain_events();
    for _ in 0..ticks {
        eco.run_tick().unwrap();
        events.extend(eco.drain_events());
    }
    let snapshot = generate_snapshot(&eco, &mut SnapshotGenerator::new(1), "test");
    (events, snapshot)
}

#[test]
fn test_same_seed_same_run() {
    let (events1, snapshot1) = run(42, 40);
    let (events2, snapshot2) = run(42, 40);

    assert_eq!(events1, events2, "Event streams should be identical with same seed");
    assert_eq!(snapshot1, snapshot2, "Final state should be identical with same seed");
}

#[test]
fn test_different_seeds_diverge() {
    let (events1, snapshot1) = run(42, 20);
    let (events2, snapshot2) = run(43, 20);

    assert!(
        events1 != events2 || snapshot1 != snapshot2,
        "Different seeds should produce different runs"
    );
}

#[test]
fn test_run_exercises_lifecycle() {
    let (events, snapshot) = run(7, 60);

    let kinds: Vec<&str> = events
        .iter()
        .map(|e| match e.kind {
            eco_events::EventKind::Spawned { .. } => "spawned",
            eco_events::EventKind::Born { .. } => "born",
            eco_events::EventKind::Died { .. } => "died",
            eco_events::EventKind::Predation { .. } => "predation",
            eco_events::EventKind::Conceived { .. } => "conceived",
            eco_events::EventKind::Relocated { .. } => "relocated",
        })
        .collect();
    assert_eq!(kinds.iter().filter(|k| **k == "spawned").count(), 30);
    assert!(kinds.contains(&"relocated"));
    assert!(kinds.contains(&"died"));

    // Every organism in the final snapshot is alive and on its own cell.
    let mut cells: Vec<_> = snapshot.organisms.iter().map(|o| o.position).collect();
    cells.sort();
    cells.dedup();
    assert_eq!(cells.len(), snapshot.population());
    assert!(snapshot.organisms.iter().all(|o| o.alive));
}

#[test]
fn test_sex_assignment_is_seeded() {
    let sexes = |seed: u64| -> Vec<Sex> {
        let mut eco = Ecosystem::with_builtin_handlers(Box::new(Grid::new(8, 1, seed)), seed, 60.0);
        (0..8)
            .map(|x| {
                let index = eco.allocate((x, 0).into()).unwrap();
                eco.organism(index).unwrap().sex()
            })
            .collect()
    };
    assert_eq!(sexes(5), sexes(5));
}
