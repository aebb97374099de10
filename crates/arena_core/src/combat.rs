//! Damage generation and application.
//!
//! Every function here either reads the tick-start snapshot and returns
//! [`DamageEvent`]s, or applies a finished batch of them. Nothing applies
//! damage while decisions for the same tick are still being made.

use serde::{Deserialize, Serialize};

use crate::catalog::UnitDefinition;
use crate::components::{EntityId, Team};
use crate::config::{SimConfig, SplashPolicy};
use crate::error::{GameError, Result};
use crate::math::{fixed_serde, Fixed, Vec3Fixed};
use crate::store::{EntityStore, EntityView, WorldSnapshot};

/// Why hit points were lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageCause {
    /// Primary hit of an attack.
    Attack,
    /// Reduced damage near a primary hit.
    Splash,
    /// Self-inflicted wear of decaying buildings.
    Decay,
    /// Instant area spell.
    Spell,
}

/// A single application of damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageEvent {
    /// Entity responsible (`None` for spells).
    pub source: Option<EntityId>,
    /// Entity losing hit points.
    pub target: EntityId,
    /// Hit points removed.
    #[serde(with = "fixed_serde")]
    pub amount: Fixed,
    /// Why.
    pub cause: DamageCause,
}

/// Splash tuning taken from the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplashRules {
    /// Fraction of attack damage dealt to splash victims.
    pub fraction: Fixed,
    /// Who splash may hit.
    pub policy: SplashPolicy,
}

impl SplashRules {
    /// Rules from a simulation config.
    #[must_use]
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            fraction: config.splash_fraction,
            policy: config.splash_policy,
        }
    }
}

impl Default for SplashRules {
    fn default() -> Self {
        Self {
            fraction: Fixed::from_num(0.5),
            policy: SplashPolicy::EnemyOnly,
        }
    }
}

/// Hit points a decaying unit loses each tick.
#[must_use]
pub fn decay_per_tick(def: &UnitDefinition, tick_rate: u32) -> Option<Fixed> {
    def.health_decay_per_second
        .filter(|per_second| *per_second > Fixed::ZERO)
        .map(|per_second| per_second / Fixed::from_num(tick_rate.max(1)))
}

/// Damage from one attack: the primary hit plus any splash.
///
/// Splash victims are measured on the ground plane from the primary
/// target, must be alive at tick start, and are filtered by the splash
/// policy. The attacker's target class only picks the primary; splash
/// lands on air and ground alike.
#[must_use]
pub fn attack_damage(
    snapshot: &WorldSnapshot,
    attacker: &EntityView,
    def: &UnitDefinition,
    primary: &EntityView,
    rules: SplashRules,
) -> Vec<DamageEvent> {
    let mut events = vec![DamageEvent {
        source: Some(attacker.id),
        target: primary.id,
        amount: def.attack_damage,
        cause: DamageCause::Attack,
    }];

    let Some(radius) = def.splash_radius.filter(|r| *r > Fixed::ZERO) else {
        return events;
    };
    let radius_sq = radius * radius;
    let splash_amount = def.attack_damage * rules.fraction;

    for victim in snapshot.iter() {
        if victim.id == primary.id || victim.id == attacker.id || !victim.is_alive() {
            continue;
        }
        if rules.policy == SplashPolicy::EnemyOnly && victim.team != primary.team {
            continue;
        }
        if victim.position.horizontal_distance_squared(primary.position) > radius_sq {
            continue;
        }

        events.push(DamageEvent {
            source: Some(attacker.id),
            target: victim.id,
            amount: splash_amount,
            cause: DamageCause::Splash,
        });
    }

    events
}

/// Damage from a spell cast by `team` at `point`.
///
/// Hits every living enemy within the spell radius (ground-plane
/// distance), air and ground alike. Spells with a target cap hit the
/// highest-hp victims first, ties by lower id.
#[must_use]
pub fn spell_damage(
    snapshot: &WorldSnapshot,
    team: Team,
    def: &UnitDefinition,
    point: Vec3Fixed,
    default_radius: Fixed,
) -> Vec<DamageEvent> {
    let radius = def
        .splash_radius
        .filter(|r| *r > Fixed::ZERO)
        .unwrap_or(default_radius);
    let radius_sq = radius * radius;

    let mut victims: Vec<&EntityView> = snapshot
        .enemies_of(team)
        .filter(|v| v.is_alive() && v.position.horizontal_distance_squared(point) <= radius_sq)
        .collect();

    if let Some(cap) = def.max_targets {
        victims.sort_by(|a, b| b.hp.cmp(&a.hp).then(a.id.cmp(&b.id)));
        victims.truncate(cap as usize);
        victims.sort_by_key(|v| v.id);
    }

    victims
        .into_iter()
        .map(|v| DamageEvent {
            source: None,
            target: v.id,
            amount: def.attack_damage,
            cause: DamageCause::Spell,
        })
        .collect()
}

/// Apply a batch of damage events to the store.
///
/// Every target must exist before anything is written; a dangling target
/// aborts the whole batch.
///
/// # Errors
///
/// [`GameError::InvariantViolation`] naming the first missing target.
pub fn apply_damage(store: &mut EntityStore, events: &[DamageEvent]) -> Result<()> {
    if let Some(missing) = events.iter().find(|e| !store.contains(e.target)) {
        return Err(GameError::InvariantViolation(format!(
            "damage targets missing entity {}",
            missing.target
        )));
    }

    for event in events {
        if let Some(entity) = store.get_mut(event.target) {
            entity.health.apply_damage(event.amount);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, UnitKind};
    use crate::store::Entity;

    fn at(x: f64, z: f64) -> Vec3Fixed {
        Vec3Fixed::new(Fixed::from_num(x), Fixed::ZERO, Fixed::from_num(z))
    }

    fn splash_def() -> UnitDefinition {
        let catalog = Catalog::standard().unwrap();
        let mut def = catalog.unit(UnitKind::Valkyrie).unwrap().clone();
        def.attack_damage = Fixed::from_num(20);
        def.splash_radius = Some(Fixed::from_num(2));
        def
    }

    #[test]
    fn test_splash_halves_damage_inside_radius() {
        let catalog = Catalog::standard().unwrap();
        let mut store = EntityStore::new();
        let attacker = store.insert(Entity::new(
            Team::Player,
            UnitKind::Valkyrie,
            at(0.0, -1.0),
            Fixed::from_num(140),
        ));
        let primary = store.insert(Entity::new(
            Team::Enemy,
            UnitKind::Knight,
            at(0.0, 0.0),
            Fixed::from_num(100),
        ));
        let near = store.insert(Entity::new(
            Team::Enemy,
            UnitKind::Knight,
            at(1.8, 0.0),
            Fixed::from_num(100),
        ));
        let outside = store.insert(Entity::new(
            Team::Enemy,
            UnitKind::Knight,
            at(2.5, 0.0),
            Fixed::from_num(100),
        ));

        let snapshot = WorldSnapshot::capture(&store, &catalog).unwrap();
        let events = attack_damage(
            &snapshot,
            snapshot.get(attacker).unwrap(),
            &splash_def(),
            snapshot.get(primary).unwrap(),
            SplashRules::default(),
        );

        let amount_for = |id| {
            events
                .iter()
                .filter(|e| e.target == id)
                .map(|e| e.amount)
                .sum::<Fixed>()
        };
        assert_eq!(amount_for(primary), Fixed::from_num(20));
        assert_eq!(amount_for(near), Fixed::from_num(10));
        assert_eq!(amount_for(outside), Fixed::ZERO);
    }

    #[test]
    fn test_splash_policy_controls_friendly_fire() {
        let catalog = Catalog::standard().unwrap();
        let mut store = EntityStore::new();
        let attacker = store.insert(Entity::new(
            Team::Player,
            UnitKind::Valkyrie,
            at(0.0, -1.0),
            Fixed::from_num(140),
        ));
        let primary = store.insert(Entity::new(
            Team::Enemy,
            UnitKind::Knight,
            at(0.0, 0.0),
            Fixed::from_num(100),
        ));
        let ally = store.insert(Entity::new(
            Team::Player,
            UnitKind::Knight,
            at(0.5, 0.0),
            Fixed::from_num(100),
        ));

        let snapshot = WorldSnapshot::capture(&store, &catalog).unwrap();
        let attacker_view = snapshot.get(attacker).unwrap();
        let primary_view = snapshot.get(primary).unwrap();

        let enemy_only = attack_damage(
            &snapshot,
            attacker_view,
            &splash_def(),
            primary_view,
            SplashRules::default(),
        );
        assert!(enemy_only.iter().all(|e| e.target != ally));

        let all_nearby = attack_damage(
            &snapshot,
            attacker_view,
            &splash_def(),
            primary_view,
            SplashRules {
                policy: SplashPolicy::AllNearby,
                ..SplashRules::default()
            },
        );
        assert!(all_nearby.iter().any(|e| e.target == ally));
        assert!(all_nearby.iter().all(|e| e.target != attacker));
    }

    #[test]
    fn test_ground_splash_reaches_flyers() {
        let catalog = Catalog::standard().unwrap();
        let mut store = EntityStore::new();
        let attacker = store.insert(Entity::new(
            Team::Player,
            UnitKind::Valkyrie,
            at(0.0, -1.0),
            Fixed::from_num(140),
        ));
        let primary = store.insert(Entity::new(
            Team::Enemy,
            UnitKind::Knight,
            at(0.0, 0.0),
            Fixed::from_num(100),
        ));
        let minion = store.insert(Entity::new(
            Team::Enemy,
            UnitKind::Minion,
            Vec3Fixed::new(Fixed::from_num(1), Fixed::from_num(1.5), Fixed::ZERO),
            Fixed::from_num(35),
        ));

        let snapshot = WorldSnapshot::capture(&store, &catalog).unwrap();
        let valkyrie = catalog.unit(UnitKind::Valkyrie).unwrap();
        assert!(!valkyrie.target_class.accepts(true));

        let events = attack_damage(
            &snapshot,
            snapshot.get(attacker).unwrap(),
            valkyrie,
            snapshot.get(primary).unwrap(),
            SplashRules::default(),
        );

        assert!(events.contains(&DamageEvent {
            source: Some(attacker),
            target: minion,
            amount: Fixed::from_num(6),
            cause: DamageCause::Splash,
        }));
    }

    #[test]
    fn test_decay_scaled_to_tick_rate() {
        let catalog = Catalog::standard().unwrap();
        let cannon = catalog.unit(UnitKind::Cannon).unwrap();
        assert_eq!(
            decay_per_tick(cannon, 10),
            Some(Fixed::from_num(2) / Fixed::from_num(10))
        );
        assert_eq!(decay_per_tick(catalog.unit(UnitKind::Knight).unwrap(), 10), None);
    }

    #[test]
    fn test_spell_hits_enemies_in_radius_only() {
        let catalog = Catalog::standard().unwrap();
        let mut store = EntityStore::new();
        let own = store.insert(Entity::new(
            Team::Player,
            UnitKind::Knight,
            at(0.0, 0.0),
            Fixed::from_num(100),
        ));
        let hit = store.insert(Entity::new(
            Team::Enemy,
            UnitKind::Minion,
            at(1.0, 1.0),
            Fixed::from_num(35),
        ));
        let missed = store.insert(Entity::new(
            Team::Enemy,
            UnitKind::Knight,
            at(4.0, 0.0),
            Fixed::from_num(100),
        ));

        let snapshot = WorldSnapshot::capture(&store, &catalog).unwrap();
        let fireball = catalog.unit(UnitKind::Fireball).unwrap();
        let events = spell_damage(
            &snapshot,
            Team::Player,
            fireball,
            at(0.0, 0.0),
            Fixed::from_num(2.5),
        );

        let targets: Vec<EntityId> = events.iter().map(|e| e.target).collect();
        assert_eq!(targets, vec![hit]);
        assert!(!targets.contains(&own));
        assert!(!targets.contains(&missed));
        assert!(events.iter().all(|e| e.source.is_none()));
    }

    #[test]
    fn test_capped_spell_prefers_highest_hp() {
        let catalog = Catalog::standard().unwrap();
        let mut store = EntityStore::new();
        let hp = [50, 200, 10, 200, 120];
        let ids: Vec<EntityId> = hp
            .iter()
            .map(|&h| {
                store.insert(Entity::new(
                    Team::Enemy,
                    UnitKind::Knight,
                    at(0.0, 0.0),
                    Fixed::from_num(h),
                ))
            })
            .collect();

        let snapshot = WorldSnapshot::capture(&store, &catalog).unwrap();
        let lightning = catalog.unit(UnitKind::Lightning).unwrap();
        let events = spell_damage(
            &snapshot,
            Team::Player,
            lightning,
            at(0.0, 0.0),
            Fixed::from_num(2.5),
        );

        let targets: Vec<EntityId> = events.iter().map(|e| e.target).collect();
        assert_eq!(targets, vec![ids[1], ids[3], ids[4]]);
    }

    #[test]
    fn test_apply_damage_is_all_or_nothing() {
        let mut store = EntityStore::new();
        let id = store.insert(Entity::new(
            Team::Enemy,
            UnitKind::Knight,
            at(0.0, 0.0),
            Fixed::from_num(100),
        ));
        let events = [
            DamageEvent {
                source: None,
                target: id,
                amount: Fixed::from_num(10),
                cause: DamageCause::Spell,
            },
            DamageEvent {
                source: None,
                target: 999,
                amount: Fixed::from_num(10),
                cause: DamageCause::Spell,
            },
        ];

        let err = apply_damage(&mut store, &events).unwrap_err();
        assert!(err.is_invariant_violation());
        assert_eq!(store.get(id).unwrap().health.current, Fixed::from_num(100));

        apply_damage(&mut store, &events[..1]).unwrap();
        assert_eq!(store.get(id).unwrap().health.current, Fixed::from_num(90));
    }
}
