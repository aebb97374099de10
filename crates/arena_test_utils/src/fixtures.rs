//! Test fixtures and helpers.
//!
//! Pre-built configurations and battles for consistent testing.

use arena_core::prelude::*;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> Fixed {
    Fixed::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> Fixed {
    Fixed::from_num(n)
}

/// A ground-level point on the field.
#[must_use]
pub fn point(x: f64, z: f64) -> Vec3Fixed {
    Vec3Fixed::new(fixed_f(x), Fixed::ZERO, fixed_f(z))
}

/// Default rules with the AI switched off.
#[must_use]
pub fn quiet_config() -> SimConfig {
    let mut config = SimConfig::default();
    config.ai.enabled = false;
    config
}

/// A simulation already in the battle phase.
///
/// # Panics
///
/// Panics if the configuration is invalid.
#[must_use]
pub fn battle(config: SimConfig) -> Simulation {
    let mut sim = Simulation::new(config).expect("fixture config must be valid");
    sim.start_battle().expect("fresh simulation starts");
    sim
}

/// Two entities one unit apart at midfield, away from every tower.
///
/// The player's knight (range 1.5, damage 10, attack speed 10, hp 100)
/// faces an enemy goblin with 25 hp. Returns `(sim, knight, goblin)`.
///
/// # Panics
///
/// Panics if the standard catalog lacks either kind.
#[must_use]
pub fn duel() -> (Simulation, EntityId, EntityId) {
    let mut sim = battle(quiet_config());
    let knight = sim
        .spawn_unit(Team::Player, UnitKind::Knight, point(0.0, -0.5))
        .expect("knight row");
    let goblin = sim
        .spawn_unit(Team::Enemy, UnitKind::Goblin, point(0.0, 0.5))
        .expect("goblin row");
    (sim, knight, goblin)
}

/// Hit points of a live entity, `None` once it was purged.
#[must_use]
pub fn hp(sim: &Simulation, id: EntityId) -> Option<Fixed> {
    sim.entity(id).map(|e| e.health.current)
}
