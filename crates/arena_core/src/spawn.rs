//! Deployment gating and scripted reinforcements.
//!
//! Player deployments pay elixir and must land on the deploying team's half
//! of the field. The opponent's reinforcements arrive on a fixed cadence,
//! drawn from a pool with a seeded generator, and cost nothing.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::UnitKind;
use crate::components::Team;
use crate::config::{AiConfig, ElixirConfig, FieldConfig};
use crate::math::{fixed_serde, Fixed};

/// Why a deployment or spell was refused. None of these are errors in the
/// simulation; the command is simply dropped and the store is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DeployRejection {
    /// The match is over.
    #[error("the match has ended")]
    GameEnded,
    /// The point lies outside the field.
    #[error("point is outside the field")]
    OutOfBounds,
    /// The point lies on the opponent's half.
    #[error("point is on the opponent's half")]
    WrongHalf,
    /// Not enough elixir.
    #[error("card costs {cost} elixir, {available} available")]
    Unaffordable {
        /// Card cost.
        cost: u32,
        /// Whole elixir available.
        available: u32,
    },
    /// Unit cards go through `deploy`, not `cast_spell`.
    #[error("'{kind}' is not a spell")]
    NotASpell {
        /// Card that was cast.
        kind: UnitKind,
    },
    /// Spell cards go through `cast_spell`, not `deploy`.
    #[error("'{kind}' is a spell")]
    IsASpell {
        /// Card that was deployed.
        kind: UnitKind,
    },
    /// No card exists for this kind (crown towers).
    #[error("'{kind}' cannot be deployed")]
    UnknownCard {
        /// Kind without a card.
        kind: UnitKind,
    },
}

/// Regenerating elixir for one team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElixirPool {
    #[serde(with = "fixed_serde")]
    amount: Fixed,
    #[serde(with = "fixed_serde")]
    cap: Fixed,
    #[serde(with = "fixed_serde")]
    regen_per_tick: Fixed,
}

impl ElixirPool {
    /// Create a pool.
    #[must_use]
    pub fn new(starting: Fixed, cap: Fixed, regen_per_tick: Fixed) -> Self {
        Self {
            amount: starting.min(cap),
            cap,
            regen_per_tick,
        }
    }

    /// Pool from configuration.
    #[must_use]
    pub fn from_config(config: &ElixirConfig, regen_per_tick: Fixed) -> Self {
        Self::new(config.starting, config.cap, regen_per_tick)
    }

    /// Current elixir, fractional.
    #[must_use]
    pub fn amount(&self) -> Fixed {
        self.amount
    }

    /// Whole elixir available to spend.
    #[must_use]
    pub fn whole(&self) -> u32 {
        self.amount.to_num::<i64>().clamp(0, i64::from(u32::MAX)) as u32
    }

    /// Gain one tick of regeneration, stopping at the cap.
    pub fn regenerate(&mut self) {
        self.amount = (self.amount + self.regen_per_tick).min(self.cap);
    }

    /// Check whether `cost` can be paid.
    #[must_use]
    pub fn can_afford(&self, cost: u32) -> bool {
        self.amount >= Fixed::from_num(cost)
    }

    /// Pay `cost`, or report the shortfall.
    pub fn spend(&mut self, cost: u32) -> Result<(), DeployRejection> {
        if !self.can_afford(cost) {
            return Err(DeployRejection::Unaffordable {
                cost,
                available: self.whole(),
            });
        }
        self.amount -= Fixed::from_num(cost);
        Ok(())
    }
}

/// Field geometry checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldBounds {
    half_width: Fixed,
    half_length: Fixed,
}

impl FieldBounds {
    /// Bounds from configuration.
    #[must_use]
    pub fn from_config(config: &FieldConfig) -> Self {
        Self {
            half_width: config.half_width,
            half_length: config.half_length,
        }
    }

    /// Whether a ground point lies on the field.
    #[must_use]
    pub fn contains(&self, x: Fixed, z: Fixed) -> bool {
        x.abs() <= self.half_width && z.abs() <= self.half_length
    }

    /// Whether a ground point lies on `team`'s half. The centre line
    /// belongs to both halves.
    #[must_use]
    pub fn on_half(&self, team: Team, z: Fixed) -> bool {
        match team {
            Team::Player => z <= Fixed::ZERO,
            Team::Enemy => z >= Fixed::ZERO,
        }
    }

    /// Check a deployment point for `team`.
    pub fn check_deploy(&self, team: Team, x: Fixed, z: Fixed) -> Result<(), DeployRejection> {
        if !self.contains(x, z) {
            return Err(DeployRejection::OutOfBounds);
        }
        if !self.on_half(team, z) {
            return Err(DeployRejection::WrongHalf);
        }
        Ok(())
    }

    /// Pull a point back onto the field and onto `team`'s half.
    #[must_use]
    pub fn clamp_to_half(&self, team: Team, x: Fixed, z: Fixed) -> (Fixed, Fixed) {
        let x = x.clamp(-self.half_width, self.half_width);
        let z = match team {
            Team::Player => z.clamp(-self.half_length, Fixed::ZERO),
            Team::Enemy => z.clamp(Fixed::ZERO, self.half_length),
        };
        (x, z)
    }
}

/// Ground-plane offsets for a multi-unit deployment.
///
/// Units are laid out on the smallest square grid that fits them, centred
/// on the deployment point, `spacing` apart. A single unit gets no offset.
#[must_use]
pub fn formation_offsets(count: u32, spacing: Fixed) -> Vec<(Fixed, Fixed)> {
    if count == 0 {
        return Vec::new();
    }

    let mut columns = 1u32;
    while columns * columns < count {
        columns += 1;
    }
    let rows = count.div_ceil(columns);
    let half = Fixed::from_num(2);

    (0..count)
        .map(|i| {
            let col = i % columns;
            let row = i / columns;
            let x = (Fixed::from_num(col) - Fixed::from_num(columns - 1) / half) * spacing;
            let z = (Fixed::from_num(row) - Fixed::from_num(rows - 1) / half) * spacing;
            (x, z)
        })
        .collect()
}

/// A reinforcement requested by the AI scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnOrder {
    /// Team receiving the unit.
    pub team: Team,
    /// Kind to spawn.
    pub kind: UnitKind,
    /// Ground x.
    pub x: Fixed,
    /// Ground z.
    pub z: Fixed,
}

/// Fixed-cadence opponent spawner.
///
/// A counter advances every battle tick; when it reaches the interval it
/// resets and a unit kind is drawn from the pool together with a point in
/// the spawn band on the AI's half.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiSpawner {
    team: Team,
    config: AiConfig,
    counter: u32,
    rng: ChaCha8Rng,
}

impl AiSpawner {
    /// Create a spawner for `team` using the given random source.
    #[must_use]
    pub fn new(team: Team, config: AiConfig, rng: ChaCha8Rng) -> Self {
        Self {
            team,
            config,
            counter: 0,
            rng,
        }
    }

    /// Team this spawner reinforces.
    #[must_use]
    pub fn team(&self) -> Team {
        self.team
    }

    /// Ticks counted since the last spawn.
    #[must_use]
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Advance one tick. Returns an order on the threshold tick.
    pub fn tick(&mut self, field: &FieldConfig) -> Option<SpawnOrder> {
        if !self.config.enabled || self.config.pool.is_empty() {
            return None;
        }

        self.counter += 1;
        if self.counter < self.config.spawn_interval_ticks {
            return None;
        }
        self.counter = 0;

        let kind = self.config.pool[self.rng.gen_range(0..self.config.pool.len())];

        // Positions are drawn in tenths so no floats touch the generator.
        let width_tenths = (field.half_width - Fixed::ONE)
            .max(Fixed::ZERO)
            .saturating_mul_int(10)
            .to_num::<i32>();
        let near = self.config.band_near.saturating_mul_int(10).to_num::<i32>();
        let far = self.config.band_far.saturating_mul_int(10).to_num::<i32>();

        let x = Fixed::from_num(self.rng.gen_range(-width_tenths..=width_tenths)) / 10;
        let depth = Fixed::from_num(self.rng.gen_range(near..=far.max(near))) / 10;
        let z = depth * self.team.home_sign();

        Some(SpawnOrder {
            team: self.team,
            kind,
            x,
            z,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_elixir_regenerates_to_cap() {
        let mut pool = ElixirPool::new(Fixed::from_num(9), Fixed::from_num(10), Fixed::from_num(0.4));
        pool.regenerate();
        pool.regenerate();
        pool.regenerate();
        assert_eq!(pool.amount(), Fixed::from_num(10));
    }

    #[test]
    fn test_spend_rejects_shortfall() {
        let mut pool = ElixirPool::new(Fixed::from_num(3.5), Fixed::from_num(10), Fixed::ZERO);
        assert_eq!(
            pool.spend(4),
            Err(DeployRejection::Unaffordable {
                cost: 4,
                available: 3
            })
        );
        assert_eq!(pool.amount(), Fixed::from_num(3.5));
        pool.spend(3).unwrap();
        assert_eq!(pool.amount(), Fixed::from_num(0.5));
    }

    #[test]
    fn test_deploy_halves() {
        let bounds = FieldBounds::from_config(&FieldConfig::default());
        let f = Fixed::from_num::<f64>;

        assert!(bounds.check_deploy(Team::Player, f(2.0), f(-5.0)).is_ok());
        assert!(bounds.check_deploy(Team::Player, f(2.0), f(0.0)).is_ok());
        assert_eq!(
            bounds.check_deploy(Team::Player, f(2.0), f(5.0)),
            Err(DeployRejection::WrongHalf)
        );
        assert_eq!(
            bounds.check_deploy(Team::Enemy, f(2.0), f(-0.5)),
            Err(DeployRejection::WrongHalf)
        );
        assert_eq!(
            bounds.check_deploy(Team::Player, f(11.0), f(-5.0)),
            Err(DeployRejection::OutOfBounds)
        );
    }

    #[test]
    fn test_formation_offsets_are_distinct_and_centred() {
        let spacing = Fixed::from_num(0.6);
        assert_eq!(formation_offsets(1, spacing), vec![(Fixed::ZERO, Fixed::ZERO)]);

        let four = formation_offsets(4, spacing);
        assert_eq!(four.len(), 4);
        let sum_x: Fixed = four.iter().map(|(x, _)| *x).sum();
        let sum_z: Fixed = four.iter().map(|(_, z)| *z).sum();
        assert_eq!(sum_x, Fixed::ZERO);
        assert_eq!(sum_z, Fixed::ZERO);

        for (i, a) in four.iter().enumerate() {
            for b in &four[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(formation_offsets(3, spacing).len(), 3);
    }

    #[test]
    fn test_ai_spawner_cadence_and_half() {
        let config = AiConfig {
            spawn_interval_ticks: 5,
            ..AiConfig::default()
        };
        let mut spawner = AiSpawner::new(Team::Enemy, config, ChaCha8Rng::seed_from_u64(1));
        let field = FieldConfig::default();

        let orders: Vec<Option<SpawnOrder>> = (0..10).map(|_| spawner.tick(&field)).collect();
        let fired: Vec<usize> = orders
            .iter()
            .enumerate()
            .filter_map(|(i, o)| o.map(|_| i))
            .collect();
        assert_eq!(fired, vec![4, 9]);

        for order in orders.into_iter().flatten() {
            assert_eq!(order.team, Team::Enemy);
            assert!(order.z >= Fixed::from_num(9) && order.z <= Fixed::from_num(13));
            assert!(order.x.abs() <= Fixed::from_num(9));
        }
    }

    #[test]
    fn test_ai_spawner_is_reproducible() {
        let field = FieldConfig::default();
        let run = |seed| {
            let mut spawner = AiSpawner::new(
                Team::Enemy,
                AiConfig {
                    spawn_interval_ticks: 1,
                    ..AiConfig::default()
                },
                ChaCha8Rng::seed_from_u64(seed),
            );
            (0..20)
                .filter_map(|_| spawner.tick(&field))
                .map(|o| (o.kind, o.x, o.z))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(7), run(7));
        assert_ne!(run(7), run(8));
    }

    #[test]
    fn test_disabled_ai_never_spawns() {
        let mut spawner = AiSpawner::new(
            Team::Enemy,
            AiConfig {
                enabled: false,
                spawn_interval_ticks: 1,
                ..AiConfig::default()
            },
            ChaCha8Rng::seed_from_u64(0),
        );
        let field = FieldConfig::default();
        assert!((0..10).all(|_| spawner.tick(&field).is_none()));
    }
}
