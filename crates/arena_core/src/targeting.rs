//! Target validation and acquisition.
//!
//! Runs once per entity per tick against the tick-start
//! [`WorldSnapshot`]. A held target id is revalidated lazily here, on read;
//! nothing clears references eagerly when an entity dies.

use crate::catalog::UnitDefinition;
use crate::components::EntityId;
use crate::math::Fixed;
use crate::store::{EntityView, WorldSnapshot};

/// How an entity's target was settled this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetResolution {
    /// The held target is still valid.
    Kept(EntityId),
    /// A new target was picked by scanning enemies.
    Acquired(EntityId),
    /// Nothing eligible within detection range.
    None,
}

impl TargetResolution {
    /// The resolved target id, if any.
    #[must_use]
    pub fn target(self) -> Option<EntityId> {
        match self {
            Self::Kept(id) | Self::Acquired(id) => Some(id),
            Self::None => None,
        }
    }
}

/// Whether `range` reaches from `a` to `b` (straight-line, all three axes).
#[must_use]
pub fn within_range(a: &EntityView, b: &EntityView, range: Fixed) -> bool {
    a.position.distance_squared(b.position) <= range * range
}

/// Team, liveness, air/ground and building-only rules. Range is checked
/// separately.
#[must_use]
pub fn is_eligible(attacker: &EntityView, def: &UnitDefinition, candidate: &EntityView) -> bool {
    candidate.team != attacker.team
        && candidate.is_alive()
        && def.target_class.accepts(candidate.is_flying)
        && (!def.targets_buildings_only || candidate.is_building)
}

/// Revalidate the target held at tick start.
///
/// The held id is rejected when it no longer resolves in the snapshot,
/// fails eligibility, or has left detection range.
#[must_use]
pub fn validate_target(
    snapshot: &WorldSnapshot,
    attacker: &EntityView,
    def: &UnitDefinition,
) -> Option<EntityId> {
    let id = attacker.target?;
    let candidate = snapshot.get(id)?;

    (is_eligible(attacker, def, candidate)
        && within_range(attacker, candidate, def.detection_range))
    .then_some(id)
}

/// Pick the nearest eligible enemy within detection range.
///
/// Candidates are scanned in ascending id order and only a strictly
/// closer one replaces the current best, so ties go to the lower id.
#[must_use]
pub fn acquire_target(
    snapshot: &WorldSnapshot,
    attacker: &EntityView,
    def: &UnitDefinition,
) -> Option<EntityId> {
    let range_sq = def.detection_range * def.detection_range;
    let mut best: Option<(EntityId, Fixed)> = None;

    for candidate in snapshot.enemies_of(attacker.team) {
        if !is_eligible(attacker, def, candidate) {
            continue;
        }

        let dist_sq = attacker.position.distance_squared(candidate.position);
        if dist_sq > range_sq {
            continue;
        }

        match best {
            None => best = Some((candidate.id, dist_sq)),
            Some((_, best_dist)) if dist_sq < best_dist => best = Some((candidate.id, dist_sq)),
            _ => {}
        }
    }

    best.map(|(id, _)| id)
}

/// Validate the held target, falling back to a fresh scan.
#[must_use]
pub fn resolve_target(
    snapshot: &WorldSnapshot,
    attacker: &EntityView,
    def: &UnitDefinition,
) -> TargetResolution {
    if let Some(id) = validate_target(snapshot, attacker, def) {
        return TargetResolution::Kept(id);
    }

    match acquire_target(snapshot, attacker, def) {
        Some(id) => TargetResolution::Acquired(id),
        None => TargetResolution::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, UnitKind};
    use crate::components::Team;
    use crate::math::Vec3Fixed;
    use crate::store::{Entity, EntityStore};

    fn at(x: f64, z: f64) -> Vec3Fixed {
        Vec3Fixed::new(Fixed::from_num(x), Fixed::ZERO, Fixed::from_num(z))
    }

    fn spawn(store: &mut EntityStore, team: Team, kind: UnitKind, x: f64, z: f64) -> EntityId {
        store.insert(Entity::new(team, kind, at(x, z), Fixed::from_num(100)))
    }

    fn setup() -> (Catalog, EntityStore) {
        (Catalog::standard().unwrap(), EntityStore::new())
    }

    #[test]
    fn test_acquire_nearest_enemy() {
        let (catalog, mut store) = setup();
        let knight = spawn(&mut store, Team::Player, UnitKind::Knight, 0.0, 0.0);
        let far = spawn(&mut store, Team::Enemy, UnitKind::Goblin, 0.0, 2.5);
        let near = spawn(&mut store, Team::Enemy, UnitKind::Goblin, 0.0, 1.0);
        spawn(&mut store, Team::Player, UnitKind::Goblin, 0.0, 0.5);

        let snapshot = WorldSnapshot::capture(&store, &catalog).unwrap();
        let view = snapshot.get(knight).unwrap();
        let def = catalog.unit(UnitKind::Knight).unwrap();

        assert_eq!(acquire_target(&snapshot, view, def), Some(near));
        assert_ne!(acquire_target(&snapshot, view, def), Some(far));
    }

    #[test]
    fn test_tie_goes_to_lower_id() {
        let (catalog, mut store) = setup();
        let knight = spawn(&mut store, Team::Player, UnitKind::Knight, 0.0, 0.0);
        let first = spawn(&mut store, Team::Enemy, UnitKind::Goblin, -1.0, 0.0);
        spawn(&mut store, Team::Enemy, UnitKind::Goblin, 1.0, 0.0);

        let snapshot = WorldSnapshot::capture(&store, &catalog).unwrap();
        let def = catalog.unit(UnitKind::Knight).unwrap();
        assert_eq!(
            acquire_target(&snapshot, snapshot.get(knight).unwrap(), def),
            Some(first)
        );
    }

    #[test]
    fn test_ground_only_ignores_flyers() {
        let (catalog, mut store) = setup();
        let knight = spawn(&mut store, Team::Player, UnitKind::Knight, 0.0, 0.0);
        let archer = spawn(&mut store, Team::Player, UnitKind::Archer, 0.0, -1.0);
        let minion = spawn(&mut store, Team::Enemy, UnitKind::Minion, 0.0, 1.0);

        let snapshot = WorldSnapshot::capture(&store, &catalog).unwrap();
        let knight_def = catalog.unit(UnitKind::Knight).unwrap();
        let archer_def = catalog.unit(UnitKind::Archer).unwrap();

        assert_eq!(
            acquire_target(&snapshot, snapshot.get(knight).unwrap(), knight_def),
            None
        );
        assert_eq!(
            acquire_target(&snapshot, snapshot.get(archer).unwrap(), archer_def),
            Some(minion)
        );
    }

    #[test]
    fn test_building_only_units_skip_troops() {
        let (catalog, mut store) = setup();
        let hog = spawn(&mut store, Team::Player, UnitKind::HogRider, 0.0, 0.0);
        spawn(&mut store, Team::Enemy, UnitKind::Knight, 0.0, 1.0);
        let cannon = spawn(&mut store, Team::Enemy, UnitKind::Cannon, 0.0, 6.0);

        let snapshot = WorldSnapshot::capture(&store, &catalog).unwrap();
        let def = catalog.unit(UnitKind::HogRider).unwrap();
        assert_eq!(
            acquire_target(&snapshot, snapshot.get(hog).unwrap(), def),
            Some(cannon)
        );
    }

    #[test]
    fn test_stale_target_is_dropped() {
        let (catalog, mut store) = setup();
        let knight = spawn(&mut store, Team::Player, UnitKind::Knight, 0.0, 0.0);
        let goblin = spawn(&mut store, Team::Enemy, UnitKind::Goblin, 0.0, 1.0);
        store.get_mut(knight).unwrap().attack.target = Some(goblin);
        store.remove(goblin);

        let snapshot = WorldSnapshot::capture(&store, &catalog).unwrap();
        let def = catalog.unit(UnitKind::Knight).unwrap();
        let view = snapshot.get(knight).unwrap();
        assert_eq!(view.target, Some(goblin));
        assert_eq!(validate_target(&snapshot, view, def), None);
        assert_eq!(resolve_target(&snapshot, view, def), TargetResolution::None);
    }

    #[test]
    fn test_target_outside_detection_is_dropped() {
        let (catalog, mut store) = setup();
        let knight = spawn(&mut store, Team::Player, UnitKind::Knight, 0.0, 0.0);
        let goblin = spawn(&mut store, Team::Enemy, UnitKind::Goblin, 0.0, 3.5);
        store.get_mut(knight).unwrap().attack.target = Some(goblin);

        let snapshot = WorldSnapshot::capture(&store, &catalog).unwrap();
        let def = catalog.unit(UnitKind::Knight).unwrap();
        assert_eq!(
            validate_target(&snapshot, snapshot.get(knight).unwrap(), def),
            None
        );
    }

    #[test]
    fn test_valid_target_is_kept_over_closer_enemy() {
        let (catalog, mut store) = setup();
        let knight = spawn(&mut store, Team::Player, UnitKind::Knight, 0.0, 0.0);
        let held = spawn(&mut store, Team::Enemy, UnitKind::Goblin, 0.0, 2.0);
        spawn(&mut store, Team::Enemy, UnitKind::Goblin, 0.0, 1.0);
        store.get_mut(knight).unwrap().attack.target = Some(held);

        let snapshot = WorldSnapshot::capture(&store, &catalog).unwrap();
        let def = catalog.unit(UnitKind::Knight).unwrap();
        assert_eq!(
            resolve_target(&snapshot, snapshot.get(knight).unwrap(), def),
            TargetResolution::Kept(held)
        );
    }
}
