//! Whole-match reproducibility through the public surface.

use arena_core::prelude::*;
use arena_test_utils::determinism::{
    find_first_divergence, run_parallel_simulations_scoped, step, verify_determinism,
    verify_serialization_determinism,
};
use arena_test_utils::fixtures::point;

/// Both lanes contested, AI reinforcements on, a spell already cast.
/// Still in the deployment phase.
fn contested_setup() -> Simulation {
    let mut sim = Simulation::new(SimConfig::with_seed(2024)).unwrap();
    sim.deploy(UnitKind::Knight, point(-5.0, -4.0), Team::Player)
        .unwrap();
    sim.spawn_unit(Team::Enemy, UnitKind::Barbarian, point(-5.0, 3.0))
        .unwrap();
    sim.spawn_unit(Team::Enemy, UnitKind::Dragon, point(5.0, 4.0))
        .unwrap();
    sim.spawn_unit(Team::Player, UnitKind::Musketeer, point(5.0, -6.0))
        .unwrap();
    sim.cast_spell(UnitKind::Zap, point(-5.0, 3.0), Team::Player)
        .unwrap();
    sim
}

fn contested_match() -> Simulation {
    let mut sim = contested_setup();
    sim.start_battle().unwrap();
    sim
}

#[test]
fn test_contested_match_is_reproducible() {
    let result = verify_determinism(3, 900, contested_match, step, Simulation::state_hash);
    result.assert_deterministic();
}

#[test]
fn test_contested_match_never_diverges() {
    assert_eq!(find_first_divergence(contested_match, 400), None);
}

#[test]
fn test_restored_match_continues_identically() {
    assert!(verify_serialization_determinism(contested_match, 250));
}

#[test]
fn test_threads_agree_on_contested_match() {
    run_parallel_simulations_scoped(contested_match, 4, 400).assert_deterministic();
}

#[test]
fn test_session_schedule_is_reproducible() {
    let run = || {
        let mut session = Session::new(contested_setup());
        session.start().unwrap();
        let mut events = 0;
        // Uneven wall-clock chunks exercise timer interleaving.
        for chunk in [37, 250, 999, 1, 1000, 3713] {
            events += session.advance(chunk).unwrap().len();
        }
        (session.simulation().state_hash(), events)
    };
    assert_eq!(run(), run());
}
