//! Per-entity state shared by the simulation systems.
//!
//! Everything here is plain data with fixed-point fields so that an
//! [`Entity`](crate::store::Entity) can be copied into a tick snapshot,
//! hashed and serialized without loss.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed};

/// Unique identifier for entities. Assigned by a monotonic counter and never
/// reused within a session.
pub type EntityId = u64;

/// The two sides of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    /// The human-controlled side, defending the negative-z half.
    Player,
    /// The opponent, defending the positive-z half.
    Enemy,
}

impl Team {
    /// Both teams, player first.
    pub const BOTH: [Self; 2] = [Self::Player, Self::Enemy];

    /// The other team.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Enemy,
            Self::Enemy => Self::Player,
        }
    }

    /// Sign of the z axis on this team's half (-1 for the player).
    #[must_use]
    pub fn home_sign(self) -> Fixed {
        match self {
            Self::Player => -Fixed::ONE,
            Self::Enemy => Fixed::ONE,
        }
    }

    /// Stable index for per-team arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Player => 0,
            Self::Enemy => 1,
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Player => f.write_str("player"),
            Self::Enemy => f.write_str("enemy"),
        }
    }
}

/// Left or right half of the field, split at x = 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lane {
    /// x < 0.
    Left,
    /// x >= 0.
    Right,
}

impl Lane {
    /// Lane containing the given cross-field coordinate.
    #[must_use]
    pub fn of(x: Fixed) -> Self {
        if x < Fixed::ZERO {
            Self::Left
        } else {
            Self::Right
        }
    }
}

/// Hit points.
///
/// `current` is signed: several simultaneous hits may push it below zero
/// before the entity is purged at the end of the tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Health {
    /// Current hit points.
    #[serde(with = "fixed_serde")]
    pub current: Fixed,
    /// Maximum hit points.
    #[serde(with = "fixed_serde")]
    pub max: Fixed,
}

impl Health {
    /// Create new health at full hit points.
    #[must_use]
    pub const fn new(max: Fixed) -> Self {
        Self { current: max, max }
    }

    /// Dead entities are purged at the end of the tick.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.current <= Fixed::ZERO
    }

    /// Subtract damage. No clamping.
    pub fn apply_damage(&mut self, amount: Fixed) {
        self.current -= amount;
    }

    /// Current health as a fraction of maximum (0 when dead).
    #[must_use]
    pub fn fraction(&self) -> Fixed {
        if self.max <= Fixed::ZERO || self.current <= Fixed::ZERO {
            Fixed::ZERO
        } else {
            self.current / self.max
        }
    }
}

/// Target tracking and attack cooldown.
///
/// `target` is a weak reference: an id looked up in the live set every tick,
/// never trusted without revalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AttackTarget {
    /// The entity being targeted.
    pub target: Option<EntityId>,
    /// Ticks until the entity can attack again.
    pub cooldown: u32,
}

impl AttackTarget {
    /// Create with no target and no cooldown.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            target: None,
            cooldown: 0,
        }
    }

    /// Check if ready to attack.
    #[must_use]
    pub const fn can_attack(&self) -> bool {
        self.cooldown == 0
    }

    /// Decrement cooldown by one tick, flooring at zero.
    pub fn tick_cooldown(&mut self) {
        self.cooldown = self.cooldown.saturating_sub(1);
    }

    /// Start the cooldown after an attack.
    pub fn reset_cooldown(&mut self, attack_speed: u32) {
        self.cooldown = attack_speed;
    }
}
