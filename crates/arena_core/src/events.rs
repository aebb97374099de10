//! Fire-and-forget notifications produced by the simulation.
//!
//! The core returns events by value from [`tick`](crate::simulation::Simulation::tick),
//! [`deploy`](crate::simulation::Simulation::deploy) and
//! [`cast_spell`](crate::simulation::Simulation::cast_spell). Audio, UI and
//! metrics consumers receive them through an [`EventSink`] after the fact;
//! nothing in the simulation waits on a consumer.

use serde::{Deserialize, Serialize};

use crate::catalog::UnitKind;
use crate::combat::{DamageCause, DamageEvent};
use crate::components::{EntityId, Team};
use crate::math::{fixed_serde, Fixed};
use crate::victory::MatchOutcome;

/// Coarse notification category, as consumed by audio and UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// An entity entered the field.
    Spawn,
    /// An entity started an attack.
    Attack,
    /// An entity lost hit points.
    Damage,
    /// An entity was removed.
    Destroy,
    /// A spell landed.
    Spell,
    /// The player won.
    Victory,
    /// The player lost.
    Defeat,
    /// Nobody won.
    Draw,
}

/// Something that happened during a tick or a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// An entity was created.
    Spawned {
        /// New entity.
        entity: EntityId,
        /// Its kind.
        kind: UnitKind,
        /// Its team.
        team: Team,
    },
    /// An attack triggered.
    Attacked {
        /// Attacking entity.
        attacker: EntityId,
        /// Primary target.
        target: EntityId,
    },
    /// Hit points were subtracted.
    Damaged {
        /// Entity that lost hit points.
        target: EntityId,
        /// Responsible entity, if any.
        source: Option<EntityId>,
        /// Hit points removed.
        #[serde(with = "fixed_serde")]
        amount: Fixed,
        /// Why.
        cause: DamageCause,
    },
    /// An entity was purged after reaching zero hit points.
    Destroyed {
        /// Removed entity.
        entity: EntityId,
        /// Its kind.
        kind: UnitKind,
        /// Its team.
        team: Team,
        /// Whether it was a king structure.
        was_king: bool,
    },
    /// A spell was cast.
    SpellCast {
        /// Spell kind.
        kind: UnitKind,
        /// Casting team.
        team: Team,
        /// Entities hit.
        hits: u32,
    },
    /// The match reached its terminal state.
    MatchEnded(MatchOutcome),
}

impl GameEvent {
    /// Notification category, with victory and defeat seen from the
    /// player's side.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Spawned { .. } => EventKind::Spawn,
            Self::Attacked { .. } => EventKind::Attack,
            Self::Damaged { .. } => EventKind::Damage,
            Self::Destroyed { .. } => EventKind::Destroy,
            Self::SpellCast { .. } => EventKind::Spell,
            Self::MatchEnded(outcome) => match outcome.winner {
                Some(Team::Player) => EventKind::Victory,
                Some(Team::Enemy) => EventKind::Defeat,
                None => EventKind::Draw,
            },
        }
    }

    /// Entity the notification is about, if any.
    #[must_use]
    pub fn entity(&self) -> Option<EntityId> {
        match self {
            Self::Spawned { entity, .. } | Self::Destroyed { entity, .. } => Some(*entity),
            Self::Attacked { attacker, .. } => Some(*attacker),
            Self::Damaged { target, .. } => Some(*target),
            Self::SpellCast { .. } | Self::MatchEnded(_) => None,
        }
    }

    pub(crate) fn from_damage(event: &DamageEvent) -> Self {
        Self::Damaged {
            target: event.target,
            source: event.source,
            amount: event.amount,
            cause: event.cause,
        }
    }
}

/// Receiver for `(kind, entity)` notifications.
pub trait EventSink {
    /// Called once per event, in emission order.
    fn on_entity_event(&mut self, kind: EventKind, entity: Option<EntityId>);
}

impl EventSink for Vec<(EventKind, Option<EntityId>)> {
    fn on_entity_event(&mut self, kind: EventKind, entity: Option<EntityId>) {
        self.push((kind, entity));
    }
}

/// Deliver a batch of events to a sink.
pub fn dispatch<S: EventSink + ?Sized>(events: &[GameEvent], sink: &mut S) {
    for event in events {
        sink.on_entity_event(event.kind(), event.entity());
    }
}

/// Everything a tick produced.
///
/// These events can be used by the presentation layer to trigger effects,
/// sounds, animations, etc.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickEvents {
    /// Tick number after this step (unchanged for an idle step).
    pub tick: u64,
    /// Ordered notifications.
    pub events: Vec<GameEvent>,
    /// Damage applied this tick.
    pub damage_events: Vec<DamageEvent>,
    /// Entities that died this tick.
    pub deaths: Vec<EntityId>,
    /// Entities spawned this tick.
    pub spawned: Vec<EntityId>,
    /// Set on the tick that ended the match.
    pub outcome: Option<MatchOutcome>,
}

impl TickEvents {
    /// Whether the tick did nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
            && self.damage_events.is_empty()
            && self.deaths.is_empty()
            && self.spawned.is_empty()
            && self.outcome.is_none()
    }

    /// Deliver this tick's notifications to a sink.
    pub fn dispatch<S: EventSink + ?Sized>(&self, sink: &mut S) {
        dispatch(&self.events, sink);
    }
}
