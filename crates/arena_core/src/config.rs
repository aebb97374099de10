//! Simulation tuning knobs.
//!
//! Defaults reproduce the standard ruleset. A RON file may override any
//! subset of fields:
//!
//! ```ron
//! SimConfig(
//!     battle_duration_secs: 60,
//!     elixir: (per_second: 0.7),
//!     splash_policy: all_nearby,
//! )
//! ```

use serde::{Deserialize, Serialize};

use crate::catalog::UnitKind;
use crate::error::{GameError, Result};
use crate::math::{fixed_decimal, Fixed};

/// Who splash damage may hit besides the primary target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplashPolicy {
    /// Only entities on the primary target's team.
    #[default]
    EnemyOnly,
    /// Every entity near the primary target except the attacker itself.
    AllNearby,
}

/// Field extents. The field spans `[-half_width, half_width]` across and
/// `[-half_length, half_length]` along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Half of the field width (x).
    #[serde(with = "fixed_decimal")]
    pub half_width: Fixed,
    /// Half of the field length (z).
    #[serde(with = "fixed_decimal")]
    pub half_length: Fixed,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            half_width: Fixed::from_num(10),
            half_length: Fixed::from_num(15),
        }
    }
}

/// Elixir pool tuning, identical for both teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElixirConfig {
    /// Elixir available when the session starts.
    #[serde(with = "fixed_decimal")]
    pub starting: Fixed,
    /// Regeneration stops here.
    #[serde(with = "fixed_decimal")]
    pub cap: Fixed,
    /// Regeneration rate during battle.
    #[serde(with = "fixed_decimal")]
    pub per_second: Fixed,
}

impl Default for ElixirConfig {
    fn default() -> Self {
        Self {
            starting: Fixed::from_num(5),
            cap: Fixed::from_num(10),
            per_second: Fixed::from_num(0.35),
        }
    }
}

/// Scripted opponent cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Disable to play both sides by hand.
    pub enabled: bool,
    /// Ticks between reinforcements.
    pub spawn_interval_ticks: u32,
    /// Kinds drawn from uniformly.
    pub pool: Vec<UnitKind>,
    /// Spawn band along z, measured from the centre line into the AI half.
    #[serde(with = "fixed_decimal")]
    pub band_near: Fixed,
    /// Far edge of the spawn band.
    #[serde(with = "fixed_decimal")]
    pub band_far: Fixed,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            spawn_interval_ticks: 60,
            pool: vec![
                UnitKind::Knight,
                UnitKind::Archer,
                UnitKind::Giant,
                UnitKind::Goblin,
                UnitKind::Musketeer,
                UnitKind::Valkyrie,
                UnitKind::Minion,
                UnitKind::HogRider,
            ],
            band_near: Fixed::from_num(9),
            band_far: Fixed::from_num(13),
        }
    }
}

/// Complete simulation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Simulation steps per second.
    pub tick_rate: u32,
    /// Length of the battle clock.
    pub battle_duration_secs: u32,
    /// Field extents.
    pub field: FieldConfig,
    /// Elixir tuning.
    pub elixir: ElixirConfig,
    /// Scripted opponent.
    pub ai: AiConfig,
    /// Fraction of attack damage dealt to splash victims.
    #[serde(with = "fixed_decimal")]
    pub splash_fraction: Fixed,
    /// Who splash may hit.
    pub splash_policy: SplashPolicy,
    /// Distance between units of a multi-unit deployment.
    #[serde(with = "fixed_decimal")]
    pub formation_spacing: Fixed,
    /// Radius for spells whose row has no splash radius.
    #[serde(with = "fixed_decimal")]
    pub default_spell_radius: Fixed,
    /// Seed for the AI's random source.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate: 10,
            battle_duration_secs: 180,
            field: FieldConfig::default(),
            elixir: ElixirConfig::default(),
            ai: AiConfig::default(),
            splash_fraction: Fixed::from_num(0.5),
            splash_policy: SplashPolicy::EnemyOnly,
            formation_spacing: Fixed::from_num(0.6),
            default_spell_radius: Fixed::from_num(2.5),
            seed: 0,
        }
    }
}

impl SimConfig {
    /// Default configuration with the given seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Parse a RON configuration. Missing fields take their defaults.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let config: Self = ron::from_str(source).map_err(|e| GameError::DataParseError {
            path: "config.ron".to_string(),
            message: e.to_string(),
        })?;
        let problems = config.validate();
        if let Some(first) = problems.first() {
            return Err(GameError::DataParseError {
                path: "config.ron".to_string(),
                message: first.clone(),
            });
        }
        Ok(config)
    }

    /// Milliseconds between ticks.
    #[must_use]
    pub fn tick_interval_ms(&self) -> u32 {
        1000 / self.tick_rate.max(1)
    }

    /// Elixir gained per tick.
    #[must_use]
    pub fn elixir_per_tick(&self) -> Fixed {
        self.elixir.per_second / Fixed::from_num(self.tick_rate.max(1))
    }

    /// Sanity-check values. Returns every problem found.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.tick_rate == 0 || self.tick_rate > 1000 {
            problems.push(format!("tick_rate {} must be in 1..=1000", self.tick_rate));
        }
        if self.battle_duration_secs == 0 {
            problems.push("battle_duration_secs must be positive".to_string());
        }
        if self.field.half_width <= Fixed::ZERO || self.field.half_length <= Fixed::ZERO {
            problems.push("field extents must be positive".to_string());
        }
        if self.elixir.cap < Fixed::ZERO || self.elixir.starting > self.elixir.cap {
            problems.push("starting elixir must be within [0, cap]".to_string());
        }
        if self.elixir.per_second < Fixed::ZERO {
            problems.push("elixir regeneration must not be negative".to_string());
        }
        if self.ai.enabled && self.ai.pool.is_empty() {
            problems.push("enabled AI needs a non-empty pool".to_string());
        }
        if self.ai.enabled && self.ai.spawn_interval_ticks == 0 {
            problems.push("AI spawn interval must be positive".to_string());
        }
        if self.ai.band_near > self.ai.band_far || self.ai.band_far > self.field.half_length {
            problems.push("AI spawn band must lie inside the AI half".to_string());
        }
        if self.splash_fraction < Fixed::ZERO || self.splash_fraction > Fixed::ONE {
            problems.push("splash_fraction must be within [0, 1]".to_string());
        }

        problems
    }
}
