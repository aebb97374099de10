//! Move-or-attack decisions and lane routing.
//!
//! When targeting finds nothing within detection range, mobile units fall
//! back to a structure: building-only units head for the nearest enemy
//! building anywhere, everything else stays in its lane and heads for the
//! nearest ordinary enemy building there, then the enemy king.
//!
//! A fallback target is a real target. It is written back as the entity's
//! current target and attacked once in range.

use crate::catalog::UnitDefinition;
use crate::components::{EntityId, Lane};
use crate::math::{Fixed, Vec3Fixed};
use crate::store::{EntityView, WorldSnapshot};
use crate::targeting::within_range;

/// What an entity does with its resolved target this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Nothing to do.
    Idle,
    /// Step to the given position.
    Move(Vec3Fixed),
    /// Target is within attack range; combat decides whether to strike.
    Engage(EntityId),
}

/// Choose a structure to march on when no enemy is in detection range.
///
/// Buildings never get a fallback target.
#[must_use]
pub fn fallback_target(
    snapshot: &WorldSnapshot,
    unit: &EntityView,
    def: &UnitDefinition,
) -> Option<EntityId> {
    if unit.is_building || !def.target_class.accepts(false) {
        return None;
    }

    let buildings = || {
        snapshot
            .enemies_of(unit.team)
            .filter(|v| v.is_building && v.is_alive())
    };

    if def.targets_buildings_only {
        return nearest(unit, buildings());
    }

    let lane = Lane::of(unit.position.x);
    nearest(
        unit,
        buildings().filter(|v| !v.is_king && Lane::of(v.position.x) == lane),
    )
    .or_else(|| nearest(unit, buildings().filter(|v| v.is_king)))
}

fn nearest<'a>(
    unit: &EntityView,
    candidates: impl Iterator<Item = &'a EntityView>,
) -> Option<EntityId> {
    let mut best: Option<(EntityId, Fixed)> = None;
    for candidate in candidates {
        let dist_sq = unit.position.distance_squared(candidate.position);
        match best {
            None => best = Some((candidate.id, dist_sq)),
            Some((_, best_dist)) if dist_sq < best_dist => best = Some((candidate.id, dist_sq)),
            _ => {}
        }
    }
    best.map(|(id, _)| id)
}

/// One movement step of `speed` from `from` toward `to`.
///
/// Ground units move on the ground plane and keep their height; flying
/// units move along the full three-dimensional direction.
#[must_use]
pub fn step_toward(from: Vec3Fixed, to: Vec3Fixed, speed: Fixed, flying: bool) -> Vec3Fixed {
    let delta = to - from;
    let direction = if flying {
        delta.normalize()
    } else {
        delta.horizontal().normalize()
    };
    from + direction.scale(speed)
}

/// Decide between stepping toward the target and engaging it.
#[must_use]
pub fn decide_action(unit: &EntityView, def: &UnitDefinition, target: &EntityView) -> Action {
    if within_range(unit, target, def.attack_range) {
        return Action::Engage(target.id);
    }

    if unit.is_building {
        return Action::Idle;
    }

    Action::Move(step_toward(
        unit.position,
        target.position,
        def.movement_speed,
        unit.is_flying,
    ))
}
