//! Core simulation loop.
//!
//! The simulation runs at a fixed tick rate and processes all battle logic
//! deterministically.
//!
//! # Determinism
//!
//! - No floating-point math (uses fixed-point via [`Fixed`])
//! - The only randomness is the seeded AI generator, owned and serialized
//!   with the simulation
//! - Entities are always processed in ascending id order
//! - Same inputs always produce same outputs
//!
//! # Example
//!
//! ```
//! use arena_core::prelude::*;
//!
//! let mut config = SimConfig::default();
//! config.ai.enabled = false;
//! let mut sim = Simulation::new(config).unwrap();
//! sim.start_battle().unwrap();
//!
//! let point = Vec3Fixed::new(Fixed::from_num(-3), Fixed::ZERO, Fixed::from_num(-6));
//! let deployed = sim.deploy(UnitKind::Knight, point, Team::Player).unwrap();
//! assert_eq!(deployed.entities.len(), 1);
//!
//! let events = sim.tick().unwrap();
//! assert_eq!(events.tick, 1);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, UnitKind};
use crate::combat::{
    apply_damage, attack_damage, decay_per_tick, spell_damage, DamageCause, DamageEvent,
    SplashRules,
};
use crate::components::{EntityId, Team};
use crate::config::SimConfig;
use crate::error::{GameError, Result};
use crate::events::{GameEvent, TickEvents};
use crate::math::{fixed_serde, Fixed, Vec3Fixed};
use crate::pathing::{decide_action, fallback_target, Action};
use crate::spawn::{formation_offsets, AiSpawner, DeployRejection, ElixirPool, FieldBounds};
use crate::store::{Entity, EntityStore, WorldSnapshot};
use crate::targeting::resolve_target;
use crate::victory::{check_kings, resolve_timeout, GamePhase, MatchOutcome};

/// Distance of the crown towers from the centre line.
const TOWER_DEPTH: i32 = 10;
/// Distance of the king tower from the centre line.
const KING_DEPTH: i32 = 13;
/// Lateral offset of the crown towers.
const TOWER_LATERAL: i32 = 5;

/// Read-only description of one entity for presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderEntity {
    /// Entity id.
    pub id: EntityId,
    /// Owning team.
    pub team: Team,
    /// Unit kind.
    pub kind: UnitKind,
    /// World position.
    pub position: Vec3Fixed,
    /// Current hit points.
    #[serde(with = "fixed_serde")]
    pub hp: Fixed,
    /// Maximum hit points.
    #[serde(with = "fixed_serde")]
    pub max_hp: Fixed,
    /// King structure flag.
    pub is_king: bool,
}

/// Result of a successful deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    /// Entities created, in id order.
    pub entities: Vec<EntityId>,
    /// `Spawned` notifications.
    pub events: Vec<GameEvent>,
}

/// Result of a successful spell cast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpellCast {
    /// Damage applied.
    pub damage: Vec<DamageEvent>,
    /// Notifications in emission order.
    pub events: Vec<GameEvent>,
    /// Set if the spell destroyed a king.
    pub outcome: Option<MatchOutcome>,
}

/// Buffered per-entity outcome of the decision pass.
#[derive(Debug, Clone, Copy)]
struct EntityUpdate {
    id: EntityId,
    position: Vec3Fixed,
    target: Option<EntityId>,
    cooldown: u32,
}

/// The main battle simulation.
///
/// # System Execution Order
///
/// Each battle tick:
/// 1. **King check** - a missing king ends the match before anything else
/// 2. **Elixir** - both pools regenerate
/// 3. **Reinforcements** - the AI scheduler may spawn a unit
/// 4. **Decisions** - every entity reads the tick-start snapshot: decay,
///    cooldown, targeting, lane fallback, move or attack
/// 5. **Commit** - buffered updates and all damage are applied together
/// 6. **Purge** - entities at or below zero hit points are removed
/// 7. **Kings** - a destroyed king ends the match
///
/// The tick works on a staged copy of the mutable state and swaps it in
/// only when every step succeeded, so an aborted tick writes nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    /// Battle ticks processed.
    tick: u64,
    /// Lifecycle phase.
    phase: GamePhase,
    /// Live entities.
    store: EntityStore,
    /// Unit and card tables.
    catalog: Catalog,
    /// Tuning.
    config: SimConfig,
    /// Elixir, indexed by [`Team::index`].
    elixir: [ElixirPool; 2],
    /// Scripted opponent, if enabled.
    ai: Option<AiSpawner>,
    /// Battle clock.
    seconds_remaining: u32,
    /// Set once the match has ended.
    outcome: Option<MatchOutcome>,
}

impl Simulation {
    /// Create a simulation with the standard catalog.
    ///
    /// Both teams' towers are placed and the match waits in
    /// [`GamePhase::Deployment`] until [`start_battle`](Self::start_battle).
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the embedded
    /// catalog fails to load.
    pub fn new(config: SimConfig) -> Result<Self> {
        Self::with_catalog(config, Catalog::standard()?)
    }

    /// Create a simulation with a custom catalog.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidState`] for an invalid configuration,
    /// [`GameError::DataParseError`] for an inconsistent catalog.
    pub fn with_catalog(config: SimConfig, catalog: Catalog) -> Result<Self> {
        if let Some(problem) = config.validate().first() {
            return Err(GameError::InvalidState(format!("invalid config: {problem}")));
        }
        if let Some(problem) = catalog.validate().first() {
            return Err(GameError::DataParseError {
                path: "catalog".to_string(),
                message: problem.clone(),
            });
        }

        let pool = ElixirPool::from_config(&config.elixir, config.elixir_per_tick());
        let ai = config.ai.enabled.then(|| {
            AiSpawner::new(
                Team::Enemy,
                config.ai.clone(),
                ChaCha8Rng::seed_from_u64(config.seed),
            )
        });

        let mut sim = Self {
            tick: 0,
            phase: GamePhase::Deployment,
            store: EntityStore::new(),
            seconds_remaining: config.battle_duration_secs,
            elixir: [pool; 2],
            ai,
            catalog,
            config,
            outcome: None,
        };
        sim.place_towers()?;
        Ok(sim)
    }

    fn place_towers(&mut self) -> Result<()> {
        for team in Team::BOTH {
            let sign = team.home_sign();
            let tower = self.catalog.unit(UnitKind::Tower)?;
            for lateral in [-TOWER_LATERAL, TOWER_LATERAL] {
                let position = Vec3Fixed::new(
                    Fixed::from_num(lateral),
                    tower.vertical_offset,
                    Fixed::from_num(TOWER_DEPTH) * sign,
                );
                self.store.insert(
                    Entity::new(team, UnitKind::Tower, position, tower.max_hp).crown_tower(),
                );
            }

            let king = self.catalog.unit(UnitKind::KingTower)?;
            let position = Vec3Fixed::new(
                Fixed::ZERO,
                king.vertical_offset,
                Fixed::from_num(KING_DEPTH) * sign,
            );
            self.store
                .insert(Entity::new(team, UnitKind::KingTower, position, king.max_hp).king());
        }
        Ok(())
    }

    /// Leave the deployment phase and start the battle clock.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidState`] unless the match is in
    /// [`GamePhase::Deployment`].
    pub fn start_battle(&mut self) -> Result<()> {
        if self.phase != GamePhase::Deployment {
            return Err(GameError::InvalidState(format!(
                "cannot start battle from {:?}",
                self.phase
            )));
        }
        self.phase = GamePhase::Battle;
        tracing::info!(
            seconds = self.seconds_remaining,
            entities = self.store.len(),
            "Battle started"
        );
        Ok(())
    }

    /// Advance the simulation by one tick.
    ///
    /// Outside [`GamePhase::Battle`] this is a no-op returning empty events
    /// and the tick counter does not move.
    ///
    /// # Errors
    ///
    /// [`GameError::InvariantViolation`] if an entity's kind is missing from
    /// the catalog or a buffered update references a missing entity. The
    /// tick is then aborted and nothing is written.
    pub fn tick(&mut self) -> Result<TickEvents> {
        let mut events = TickEvents {
            tick: self.tick,
            ..TickEvents::default()
        };

        if self.phase != GamePhase::Battle {
            return Ok(events);
        }

        if let Some(outcome) = check_kings(&self.store, self.tick) {
            self.finish(outcome);
            events.events.push(GameEvent::MatchEnded(outcome));
            events.outcome = Some(outcome);
            return Ok(events);
        }

        let next_tick = self.tick + 1;
        let mut store = self.store.clone();
        let mut elixir = self.elixir;
        let mut ai = self.ai.clone();

        // 1. Elixir
        for pool in &mut elixir {
            pool.regenerate();
        }

        // 2. Reinforcements
        if let Some(order) = ai.as_mut().and_then(|ai| ai.tick(&self.config.field)) {
            let def = self.catalog.unit(order.kind).map_err(|e| {
                GameError::InvariantViolation(format!("AI pool entry {}: {e}", order.kind))
            })?;
            let count = self.catalog.card(order.kind).map_or(1, |c| c.spawn_count);
            let spawned = spawn_group(
                &mut store,
                &self.config,
                order.team,
                order.kind,
                def.max_hp,
                def.vertical_offset,
                count,
                (order.x, order.z),
            );
            for id in spawned {
                events.events.push(GameEvent::Spawned {
                    entity: id,
                    kind: order.kind,
                    team: order.team,
                });
                events.spawned.push(id);
            }
        }

        // 3. Decisions against the tick-start snapshot
        let snapshot = WorldSnapshot::capture(&store, &self.catalog)?;
        let rules = SplashRules::from_config(&self.config);
        let mut updates = Vec::with_capacity(snapshot.len());
        let mut damage = Vec::new();

        for view in snapshot.iter() {
            let def = self.catalog.unit(view.kind).map_err(|e| {
                GameError::InvariantViolation(format!("entity {}: {e}", view.id))
            })?;

            if let Some(amount) = decay_per_tick(def, self.config.tick_rate) {
                damage.push(DamageEvent {
                    source: Some(view.id),
                    target: view.id,
                    amount,
                    cause: DamageCause::Decay,
                });
            }

            let mut cooldown = view.cooldown.saturating_sub(1);
            let target = resolve_target(&snapshot, view, def)
                .target()
                .or_else(|| fallback_target(&snapshot, view, def));
            let mut position = view.position;

            if let Some(target_id) = target {
                let target_view = snapshot.get(target_id).ok_or_else(|| {
                    GameError::InvariantViolation(format!(
                        "entity {} resolved missing target {target_id}",
                        view.id
                    ))
                })?;

                match decide_action(view, def, target_view) {
                    Action::Move(next) => position = next,
                    Action::Engage(primary) if cooldown == 0 => {
                        cooldown = def.attack_speed;
                        events.events.push(GameEvent::Attacked {
                            attacker: view.id,
                            target: primary,
                        });
                        damage.extend(attack_damage(&snapshot, view, def, target_view, rules));
                    }
                    Action::Engage(_) | Action::Idle => {}
                }
            }

            updates.push(EntityUpdate {
                id: view.id,
                position,
                target,
                cooldown,
            });
        }

        // 4. Commit
        if let Some(missing) = updates.iter().find(|u| !store.contains(u.id)) {
            return Err(GameError::InvariantViolation(format!(
                "update for missing entity {}",
                missing.id
            )));
        }
        apply_damage(&mut store, &damage)?;
        for update in &updates {
            if let Some(entity) = store.get_mut(update.id) {
                entity.position = update.position;
                entity.attack.target = update.target;
                entity.attack.cooldown = update.cooldown;
            }
        }
        events
            .events
            .extend(damage.iter().map(GameEvent::from_damage));
        events.damage_events = damage;

        // 5. Purge
        for dead in store.purge_dead() {
            events.events.push(GameEvent::Destroyed {
                entity: dead.id,
                kind: dead.kind,
                team: dead.team,
                was_king: dead.is_king,
            });
            events.deaths.push(dead.id);
        }

        let outcome = check_kings(&store, next_tick);

        self.store = store;
        self.elixir = elixir;
        self.ai = ai;
        self.tick = next_tick;
        events.tick = next_tick;

        if let Some(outcome) = outcome {
            self.finish(outcome);
            events.events.push(GameEvent::MatchEnded(outcome));
            events.outcome = Some(outcome);
        }

        #[cfg(feature = "debug-validation")]
        self.check_invariants()?;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        Ok(events)
    }

    /// One second of the battle clock.
    ///
    /// At zero the match is decided by [`resolve_timeout`], which still
    /// lets a missing king take precedence. Returns the outcome if the
    /// match ended; does nothing outside [`GamePhase::Battle`].
    pub fn advance_clock(&mut self) -> Option<MatchOutcome> {
        if self.phase != GamePhase::Battle {
            return None;
        }

        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        if self.seconds_remaining > 0 {
            return None;
        }

        let outcome = resolve_timeout(&self.store, self.tick);
        self.finish(outcome);
        Some(outcome)
    }

    fn finish(&mut self, outcome: MatchOutcome) {
        self.phase = GamePhase::Ended;
        self.outcome = Some(outcome);
        tracing::info!(
            tick = outcome.tick,
            winner = ?outcome.winner,
            reason = ?outcome.reason,
            crown_towers = ?outcome.crown_towers,
            "Match ended"
        );
    }

    /// Deploy a unit card for `team` at `point`.
    ///
    /// The point's height is ignored; units stand at their vertical offset.
    /// Multi-unit cards are laid out in a formation around the point.
    ///
    /// # Errors
    ///
    /// [`GameError::Rejected`] if the match is over, the card is a spell or
    /// not deployable, the point is off the field or on the opponent's
    /// half, or the team cannot afford it. The store is unchanged.
    pub fn deploy(&mut self, kind: UnitKind, point: Vec3Fixed, team: Team) -> Result<Deployment> {
        if self.phase == GamePhase::Ended {
            return Err(DeployRejection::GameEnded.into());
        }
        let card = self
            .catalog
            .card(kind)
            .ok_or(DeployRejection::UnknownCard { kind })?;
        if card.is_spell {
            return Err(DeployRejection::IsASpell { kind }.into());
        }
        FieldBounds::from_config(&self.config.field).check_deploy(team, point.x, point.z)?;

        let pool = &mut self.elixir[team.index()];
        if !pool.can_afford(card.cost) {
            return Err(DeployRejection::Unaffordable {
                cost: card.cost,
                available: pool.whole(),
            }
            .into());
        }
        let def = self
            .catalog
            .unit(kind)
            .map_err(|_| DeployRejection::UnknownCard { kind })?;

        pool.spend(card.cost)?;
        let entities = spawn_group(
            &mut self.store,
            &self.config,
            team,
            kind,
            def.max_hp,
            def.vertical_offset,
            card.spawn_count,
            (point.x, point.z),
        );

        tracing::debug!(
            tick = self.tick,
            %team,
            %kind,
            count = entities.len(),
            "Deployed"
        );

        let events = entities
            .iter()
            .map(|&entity| GameEvent::Spawned { entity, kind, team })
            .collect();
        Ok(Deployment { entities, events })
    }

    /// Cast a spell card for `team` at `point`.
    ///
    /// Damage lands immediately on every enemy within the spell radius;
    /// no entity is created. Spells may target anywhere on the field.
    ///
    /// # Errors
    ///
    /// [`GameError::Rejected`] for an ended match, a non-spell card, a point
    /// off the field or insufficient elixir.
    /// [`GameError::InvariantViolation`] if the store is corrupt; nothing
    /// is applied in that case.
    pub fn cast_spell(&mut self, kind: UnitKind, point: Vec3Fixed, team: Team) -> Result<SpellCast> {
        if self.phase == GamePhase::Ended {
            return Err(DeployRejection::GameEnded.into());
        }
        let card = self
            .catalog
            .card(kind)
            .ok_or(DeployRejection::UnknownCard { kind })?;
        if !card.is_spell {
            return Err(DeployRejection::NotASpell { kind }.into());
        }
        if !FieldBounds::from_config(&self.config.field).contains(point.x, point.z) {
            return Err(DeployRejection::OutOfBounds.into());
        }
        let cost = card.cost;
        if !self.elixir[team.index()].can_afford(cost) {
            return Err(DeployRejection::Unaffordable {
                cost,
                available: self.elixir[team.index()].whole(),
            }
            .into());
        }
        let def = self
            .catalog
            .unit(kind)
            .map_err(|_| DeployRejection::UnknownCard { kind })?;

        let snapshot = WorldSnapshot::capture(&self.store, &self.catalog)?;
        let damage = spell_damage(
            &snapshot,
            team,
            def,
            point,
            self.config.default_spell_radius,
        );
        apply_damage(&mut self.store, &damage)?;
        self.elixir[team.index()].spend(cost)?;

        let mut events = vec![GameEvent::SpellCast {
            kind,
            team,
            hits: u32::try_from(damage.len()).unwrap_or(u32::MAX),
        }];
        events.extend(damage.iter().map(GameEvent::from_damage));
        for dead in self.store.purge_dead() {
            events.push(GameEvent::Destroyed {
                entity: dead.id,
                kind: dead.kind,
                team: dead.team,
                was_king: dead.is_king,
            });
        }

        let outcome = check_kings(&self.store, self.tick);
        if let Some(outcome) = outcome {
            self.finish(outcome);
            events.push(GameEvent::MatchEnded(outcome));
        }

        tracing::debug!(tick = self.tick, %team, %kind, hits = damage.len(), "Spell cast");
        Ok(SpellCast {
            damage,
            events,
            outcome,
        })
    }

    /// Place a single unit exactly at `position`, bypassing elixir and
    /// half-field rules. Used by scripted scenarios.
    ///
    /// A spawned `tower` counts as a crown tower and a spawned
    /// `king_tower` becomes its team's king, like the initial layout.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownUnitType`] if the kind has no unit row,
    /// [`GameError::InvalidState`] once the match has ended or for a
    /// `king_tower` when the team still has a king.
    pub fn spawn_unit(&mut self, team: Team, kind: UnitKind, position: Vec3Fixed) -> Result<EntityId> {
        if self.phase == GamePhase::Ended {
            return Err(GameError::InvalidState("match has ended".to_string()));
        }
        let def = self.catalog.unit(kind)?;
        if kind == UnitKind::KingTower && self.store.king_of(team).is_some() {
            return Err(GameError::InvalidState(format!("{team} already has a king")));
        }
        let entity = Entity::new(team, kind, position, def.max_hp);
        let entity = match kind {
            UnitKind::KingTower => entity.king(),
            UnitKind::Tower => entity.crown_tower(),
            _ => entity,
        };
        Ok(self.store.insert(entity))
    }

    /// Live entities for drawing, in id order.
    #[must_use]
    pub fn render_view(&self) -> Vec<RenderEntity> {
        self.store
            .iter_sorted()
            .map(|e| RenderEntity {
                id: e.id,
                team: e.team,
                kind: e.kind,
                position: e.position,
                hp: e.health.current,
                max_hp: e.health.max,
                is_king: e.is_king,
            })
            .collect()
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Terminal result, once the match has ended.
    #[must_use]
    pub const fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    /// Elixir available to a team.
    #[must_use]
    pub fn elixir(&self, team: Team) -> Fixed {
        self.elixir[team.index()].amount()
    }

    /// Seconds left on the battle clock.
    #[must_use]
    pub const fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    /// Battle ticks processed so far.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Look up a live entity.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.store.get(id)
    }

    /// Surviving crown towers (king included) of a team.
    #[must_use]
    pub fn structure_count(&self, team: Team) -> u32 {
        self.store.crown_tower_count(team)
    }

    /// The entity store.
    #[must_use]
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// The unit and card tables in use.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Verify the structural invariants of the store.
    ///
    /// Between ticks every stored entity has positive hit points, each
    /// team has at most one king, and every held target id is below the
    /// id counter.
    ///
    /// # Errors
    ///
    /// [`GameError::InvariantViolation`] describing the first breach.
    pub fn check_invariants(&self) -> Result<()> {
        let next_id = self.store.next_id();
        for team in Team::BOTH {
            let kings = self
                .store
                .iter_sorted()
                .filter(|e| e.team == team && e.is_king)
                .count();
            if kings > 1 {
                return Err(GameError::InvariantViolation(format!(
                    "{team} has {kings} kings"
                )));
            }
        }
        for entity in self.store.iter_sorted() {
            if entity.health.is_dead() {
                return Err(GameError::InvariantViolation(format!(
                    "entity {} stored with {} hp",
                    entity.id, entity.health.current
                )));
            }
            if entity.attack.target.is_some_and(|t| t >= next_id) {
                return Err(GameError::InvariantViolation(format!(
                    "entity {} targets unassigned id",
                    entity.id
                )));
            }
        }
        Ok(())
    }

    /// Calculate a hash of the current simulation state.
    ///
    /// Used for determinism checks. Two simulations with identical state
    /// produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.phase.hash(&mut hasher);
        self.seconds_remaining.hash(&mut hasher);
        self.outcome.hash(&mut hasher);
        for pool in &self.elixir {
            pool.amount().to_bits().hash(&mut hasher);
        }
        if let Some(ai) = &self.ai {
            ai.counter().hash(&mut hasher);
        }

        self.store.len().hash(&mut hasher);
        for entity in self.store.iter_sorted() {
            entity.id.hash(&mut hasher);
            entity.team.hash(&mut hasher);
            entity.kind.hash(&mut hasher);
            entity.position.x.to_bits().hash(&mut hasher);
            entity.position.y.to_bits().hash(&mut hasher);
            entity.position.z.to_bits().hash(&mut hasher);
            entity.health.current.to_bits().hash(&mut hasher);
            entity.attack.target.hash(&mut hasher);
            entity.attack.cooldown.hash(&mut hasher);
            entity.is_king.hash(&mut hasher);
        }

        hasher.finish()
    }

    /// Serialize the simulation state for replay or snapshots.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize simulation: {e}")))
    }

    /// Deserialize simulation state from bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data).map_err(|e| {
            GameError::InvalidState(format!("Failed to deserialize simulation: {e}"))
        })
    }
}

/// Insert `count` units of `kind` in formation around `center`, kept on
/// the team's half of the field.
fn spawn_group(
    store: &mut EntityStore,
    config: &SimConfig,
    team: Team,
    kind: UnitKind,
    max_hp: Fixed,
    height: Fixed,
    count: u32,
    center: (Fixed, Fixed),
) -> Vec<EntityId> {
    let bounds = FieldBounds::from_config(&config.field);
    formation_offsets(count, config.formation_spacing)
        .into_iter()
        .map(|(dx, dz)| {
            let (x, z) = bounds.clamp_to_half(team, center.0 + dx, center.1 + dz);
            store.insert(Entity::new(team, kind, Vec3Fixed::new(x, height, z), max_hp))
        })
        .collect()
}
