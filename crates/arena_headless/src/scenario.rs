//! Scenario loading and configuration.
//!
//! Scenarios define the starting field for headless testing: rule overrides,
//! units placed before the battle starts, and deployments scripted to happen
//! at given ticks.

use std::path::Path;

use arena_core::prelude::*;
use std::result::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::protocol::ground_point;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// A coordinate cannot be represented on the field.
    #[error("Invalid coordinate ({x}, {z}) in scenario")]
    InvalidCoordinate {
        /// Across.
        x: f64,
        /// Along.
        z: f64,
    },
    /// The simulation refused the scenario.
    #[error("Scenario could not be set up: {0}")]
    Simulation(#[from] GameError),
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Changes to the default rules.
    #[serde(default)]
    pub rules: RuleOverrides,
    /// Units standing on the field before the battle starts.
    #[serde(default)]
    pub placements: Vec<UnitPlacement>,
    /// Card plays issued at fixed ticks.
    #[serde(default)]
    pub script: Vec<ScriptedDeployment>,
    /// Hard stop for runs that outlast the battle clock.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
}

fn default_max_ticks() -> u64 {
    // Three minutes at 10 ticks per second, plus slack.
    2_000
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: "Open Field".to_string(),
            description: "Towers only, default rules".to_string(),
            rules: RuleOverrides::default(),
            placements: Vec::new(),
            script: Vec::new(),
            max_ticks: default_max_ticks(),
        }
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let scenario: Scenario = ron::from_str(&contents)?;
        Ok(scenario)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Look up a built-in scenario by name, falling back to a RON file path.
    pub fn resolve(name_or_path: &str) -> Result<Self, ScenarioError> {
        match name_or_path {
            "open_field" | "default" => Ok(Self::default()),
            "lane_push" => Ok(Self::lane_push()),
            "duel" => Ok(Self::duel()),
            path => Self::load(path),
        }
    }

    /// Both sides commit to the left lane in the first seconds.
    #[must_use]
    pub fn lane_push() -> Self {
        Self {
            name: "Lane Push".to_string(),
            description: "Giant and wizard push left against a valkyrie".to_string(),
            rules: RuleOverrides::default(),
            placements: Vec::new(),
            script: vec![
                ScriptedDeployment::new(0, Team::Player, UnitKind::Giant, -5.0, -6.0),
                ScriptedDeployment::new(20, Team::Enemy, UnitKind::Valkyrie, -5.0, 6.0),
                ScriptedDeployment::new(150, Team::Player, UnitKind::Wizard, -4.0, -8.0),
            ],
            max_ticks: default_max_ticks(),
        }
    }

    /// A knight and a goblin one unit apart at midfield, AI off.
    #[must_use]
    pub fn duel() -> Self {
        Self {
            name: "Duel".to_string(),
            description: "Knight against goblin at midfield".to_string(),
            rules: RuleOverrides {
                ai_enabled: Some(false),
                ..RuleOverrides::default()
            },
            placements: vec![
                UnitPlacement::new(Team::Player, UnitKind::Knight, 0.0, -0.5),
                UnitPlacement::new(Team::Enemy, UnitKind::Goblin, 0.0, 0.5),
            ],
            script: Vec::new(),
            max_ticks: 100,
        }
    }

    /// Rules for this scenario with an optional seed override.
    #[must_use]
    pub fn config(&self, seed: Option<u64>) -> SimConfig {
        let mut config = SimConfig::default();
        self.rules.apply(&mut config);
        if let Some(seed) = seed {
            config.seed = seed;
        }
        config
    }

    /// Build a simulation with placements applied, still in the deployment
    /// phase.
    pub fn build(&self, seed: Option<u64>) -> Result<Simulation, ScenarioError> {
        let mut sim = Simulation::new(self.config(seed))?;
        for placement in &self.placements {
            let position = ground_point(placement.x, placement.z).ok_or(
                ScenarioError::InvalidCoordinate {
                    x: placement.x,
                    z: placement.z,
                },
            )?;
            let height = sim.catalog().unit(placement.kind)?.vertical_offset;
            sim.spawn_unit(
                placement.team,
                placement.kind,
                Vec3Fixed::new(position.x, height, position.z),
            )?;
        }
        Ok(sim)
    }

    /// Scripted plays due at `tick`, in file order.
    pub fn due_at(&self, tick: u64) -> impl Iterator<Item = &ScriptedDeployment> {
        self.script.iter().filter(move |d| d.tick == tick)
    }

    /// Issue every scripted play due at the simulation's current tick.
    ///
    /// Refused plays are logged and skipped; returns the plays that landed.
    pub fn apply_script(&self, sim: &mut Simulation) -> Result<Vec<CardPlay>, ScenarioError> {
        let mut landed = Vec::new();
        for play in self.due_at(sim.current_tick()) {
            let point = ground_point(play.x, play.z)
                .ok_or(ScenarioError::InvalidCoordinate { x: play.x, z: play.z })?;
            match play_card(sim, play.card, point, play.team) {
                Ok(card) => landed.push(card),
                Err(GameError::Rejected(reason)) => {
                    warn!(tick = play.tick, card = %play.card, %reason, "scripted play refused");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(landed)
    }
}

/// An accepted card play and what it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardPlay {
    /// Playing team.
    pub team: Team,
    /// Card played.
    pub card: UnitKind,
    /// Elixir paid.
    pub cost: u32,
    /// Whether it was a spell.
    pub is_spell: bool,
    /// Notifications emitted by the play.
    pub events: Vec<GameEvent>,
}

/// Play a card, routing spells to `cast_spell` and everything else to
/// `deploy`.
pub fn play_card(
    sim: &mut Simulation,
    card: UnitKind,
    point: Vec3Fixed,
    team: Team,
) -> arena_core::error::Result<CardPlay> {
    let (cost, is_spell) = sim
        .catalog()
        .card(card)
        .map_or((0, false), |c| (c.cost, c.is_spell));
    let events = if is_spell {
        sim.cast_spell(card, point, team)?.events
    } else {
        sim.deploy(card, point, team)?.events
    };
    Ok(CardPlay {
        team,
        card,
        cost,
        is_spell,
        events,
    })
}

/// Optional changes to [`SimConfig`]; unset fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleOverrides {
    /// Random seed.
    pub seed: Option<u64>,
    /// Battle clock length.
    pub battle_duration_secs: Option<u32>,
    /// Elixir at the start.
    pub starting_elixir: Option<f64>,
    /// Whether the scripted opponent spawns reinforcements.
    pub ai_enabled: Option<bool>,
    /// Ticks between reinforcements.
    pub ai_interval_ticks: Option<u32>,
    /// Who splash damage may hit.
    pub splash_policy: Option<SplashPolicy>,
}

impl RuleOverrides {
    /// Write every set field into `config`.
    pub fn apply(&self, config: &mut SimConfig) {
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(secs) = self.battle_duration_secs {
            config.battle_duration_secs = secs;
        }
        if let Some(elixir) = self.starting_elixir.and_then(Fixed::checked_from_num) {
            config.elixir.starting = elixir;
        }
        if let Some(enabled) = self.ai_enabled {
            config.ai.enabled = enabled;
        }
        if let Some(interval) = self.ai_interval_ticks {
            config.ai.spawn_interval_ticks = interval;
        }
        if let Some(policy) = self.splash_policy {
            config.splash_policy = policy;
        }
    }
}

/// A unit standing on the field at scenario start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitPlacement {
    /// Owning team.
    pub team: Team,
    /// Unit kind.
    pub kind: UnitKind,
    /// Across the field.
    pub x: f64,
    /// Along the field.
    pub z: f64,
}

impl UnitPlacement {
    /// Create a new unit placement.
    #[must_use]
    pub fn new(team: Team, kind: UnitKind, x: f64, z: f64) -> Self {
        Self { team, kind, x, z }
    }
}

/// A card play issued when the simulation reaches `tick`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedDeployment {
    /// Tick counter value at which to play.
    pub tick: u64,
    /// Playing team.
    pub team: Team,
    /// Card to play.
    pub card: UnitKind,
    /// Across the field.
    pub x: f64,
    /// Along the field.
    pub z: f64,
}

impl ScriptedDeployment {
    /// Create a scripted play.
    #[must_use]
    pub fn new(tick: u64, team: Team, card: UnitKind, x: f64, z: f64) -> Self {
        Self {
            tick,
            team,
            card,
            x,
            z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scenario() {
        let scenario = Scenario::default();
        assert!(scenario.placements.is_empty());
        let sim = scenario.build(None).unwrap();
        assert_eq!(sim.render_view().len(), 6);
        assert_eq!(sim.phase(), GamePhase::Deployment);
    }

    #[test]
    fn test_duel_scenario_places_units() {
        let sim = Scenario::duel().build(Some(3)).unwrap();
        assert_eq!(sim.render_view().len(), 8);
        assert!(!sim.config().ai.enabled);
        assert_eq!(sim.config().seed, 3);
    }

    #[test]
    fn test_rule_overrides_apply() {
        let rules = RuleOverrides {
            battle_duration_secs: Some(30),
            starting_elixir: Some(7.0),
            splash_policy: Some(SplashPolicy::AllNearby),
            ..RuleOverrides::default()
        };
        let mut config = SimConfig::default();
        rules.apply(&mut config);
        assert_eq!(config.battle_duration_secs, 30);
        assert_eq!(config.elixir.starting, Fixed::from_num(7));
        assert_eq!(config.splash_policy, SplashPolicy::AllNearby);
        assert_eq!(config.tick_rate, 10);
    }

    #[test]
    fn test_script_runs_at_its_tick() {
        let scenario = Scenario::lane_push();
        let mut sim = scenario.build(Some(1)).unwrap();
        sim.start_battle().unwrap();

        let opening = scenario.apply_script(&mut sim).unwrap();
        assert_eq!(opening.len(), 1);
        assert_eq!(opening[0].card, UnitKind::Giant);
        assert_eq!(opening[0].cost, 5);
        assert_eq!(sim.render_view().len(), 7);
        for _ in 0..20 {
            sim.tick().unwrap();
        }
        assert_eq!(scenario.apply_script(&mut sim).unwrap().len(), 1);
    }

    #[test]
    fn test_refused_script_play_is_skipped() {
        let scenario = Scenario {
            script: vec![ScriptedDeployment::new(
                0,
                Team::Player,
                UnitKind::Knight,
                0.0,
                5.0,
            )],
            ..Scenario::default()
        };
        let mut sim = scenario.build(None).unwrap();
        sim.start_battle().unwrap();
        assert!(scenario.apply_script(&mut sim).unwrap().is_empty());
    }

    #[test]
    fn test_parse_from_ron() {
        let ron = r#"
            Scenario(
                name: "Test",
                rules: (ai_enabled: Some(false), battle_duration_secs: Some(60)),
                placements: [
                    (team: player, kind: knight, x: -2.0, z: -3.0),
                ],
                script: [
                    (tick: 10, team: enemy, card: zap, x: -2.0, z: -3.0),
                ],
            )
        "#;
        let scenario = Scenario::from_ron_str(ron).unwrap();
        assert_eq!(scenario.name, "Test");
        assert_eq!(scenario.max_ticks, 2_000);
        assert_eq!(scenario.placements[0].kind, UnitKind::Knight);
        assert_eq!(scenario.script[0].card, UnitKind::Zap);
        assert_eq!(scenario.config(None).battle_duration_secs, 60);
    }

    #[test]
    fn test_bundled_scenario_parses() {
        let scenario =
            Scenario::from_ron_str(include_str!("../scenarios/bridge_rush.ron")).unwrap();
        let sim = scenario.build(None).unwrap();
        assert!(sim.render_view().len() > 6);
    }

    #[test]
    fn test_resolve_missing_file() {
        assert!(matches!(
            Scenario::resolve("does/not/exist.ron"),
            Err(ScenarioError::FileNotFound(_))
        ));
    }
}
