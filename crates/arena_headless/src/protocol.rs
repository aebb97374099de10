//! JSON protocol for headless battle control.
//!
//! The headless runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the controller
//! **Output (stdout):** Battle state updates and responses
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready","version":"1.0","tick":0}`
//! 2. Controller deploys during the deployment phase, then sends `start`
//! 3. `tick` and `advance` drive the battle clock and report events
//! 4. On match end, outputs `{"type":"game_over","result":"victory"|"defeat"|"draw",...}`
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","tick":0}
//! -> {"cmd":"deploy","card":"knight","x":-5.0,"z":-4.0}
//! <- {"type":"deployed","card":"knight","entities":[7]}
//! -> {"cmd":"start"}
//! <- {"type":"ack","cmd":"start"}
//! -> {"cmd":"tick","count":30}
//! <- {"type":"events","tick":30,"events":[...]}
//! -> {"cmd":"deploy","card":"giant","x":0.0,"z":4.0}
//! <- {"type":"rejected","cmd":"deploy","reason":"wrong_half"}
//! ```

use arena_core::prelude::*;
use std::result::Result;
use serde::{Deserialize, Serialize};

/// Protocol version reported in the ready line.
pub const PROTOCOL_VERSION: &str = "1.0";

// ============================================================================
// Input Commands (controller -> runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Leave the deployment phase and start the battle clock.
    Start,

    /// Advance by N simulation ticks of wall time (default: 1).
    Tick {
        #[serde(default = "default_tick_count")]
        count: u32,
    },

    /// Advance wall time by a number of milliseconds.
    Advance { ms: u64 },

    /// Deploy a unit or building card.
    Deploy {
        card: String,
        x: f64,
        z: f64,
        #[serde(default = "default_team")]
        team: Team,
    },

    /// Cast a spell card.
    Cast {
        spell: String,
        x: f64,
        z: f64,
        #[serde(default = "default_team")]
        team: Team,
    },

    /// Query current battle state without advancing time.
    Query,

    /// Report the state hash (for determinism verification).
    Hash,

    /// Quit the runner.
    Quit,
}

fn default_tick_count() -> u32 {
    1
}

fn default_team() -> Team {
    Team::Player
}

// ============================================================================
// Output Responses (runner -> controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready { version: String, tick: u64 },

    /// Acknowledgment of a command.
    Ack { cmd: String },

    /// Error processing a command.
    Error {
        message: String,
        cmd: Option<String>,
    },

    /// A card was deployed.
    Deployed {
        card: String,
        entities: Vec<EntityId>,
    },

    /// A deployment or spell was refused; nothing changed.
    Rejected {
        cmd: String,
        #[serde(flatten)]
        rejection: DeployRejection,
    },

    /// A spell landed.
    SpellCast {
        spell: String,
        hits: u32,
        total_damage: f64,
    },

    /// Current battle state.
    State(StateSnapshot),

    /// Notifications produced by a `tick` or `advance`.
    Events { tick: u64, events: Vec<GameEvent> },

    /// The match has ended.
    GameOver {
        result: MatchResult,
        reason: EndReason,
        ticks: u64,
        crown_towers: [u32; 2],
    },

    /// State hash for determinism verification.
    StateHash { tick: u64, hash: u64 },

    /// Goodbye message before shutdown.
    Bye,
}

// ============================================================================
// State Types
// ============================================================================

/// Full battle state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub tick: u64,
    pub phase: GamePhase,
    pub seconds_remaining: u32,
    pub elixir: ElixirState,
    pub entities: Vec<EntityState>,
    pub hash: u64,
}

/// State of a single entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub id: EntityId,
    pub kind: String,
    pub team: Team,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub hp: f64,
    pub max_hp: f64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_king: bool,
}

/// Elixir of both teams.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElixirState {
    pub player: f64,
    pub enemy: f64,
}

/// Match result from the player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchResult {
    Victory,
    Defeat,
    Draw,
}

impl From<&MatchOutcome> for MatchResult {
    fn from(outcome: &MatchOutcome) -> Self {
        match outcome.winner {
            Some(Team::Player) => Self::Victory,
            Some(Team::Enemy) => Self::Defeat,
            None => Self::Draw,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response.
    pub fn ready(tick: u64) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            tick,
        }
    }

    /// Create an acknowledgment.
    pub fn ack(cmd: &str) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Create a game-over response.
    pub fn game_over(outcome: &MatchOutcome) -> Self {
        Self::GameOver {
            result: MatchResult::from(outcome),
            reason: outcome.reason,
            ticks: outcome.tick,
            crown_towers: outcome.crown_towers,
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"type":"error","message":"Serialization failed: {}"}}"#,
                e
            )
        });
        json.push('\n');
        json
    }
}

impl StateSnapshot {
    /// Capture the current state of a simulation.
    pub fn capture(sim: &Simulation) -> Self {
        let entities = sim
            .render_view()
            .into_iter()
            .map(|e| EntityState {
                id: e.id,
                kind: e.kind.name().to_string(),
                team: e.team,
                x: e.position.x.to_num(),
                y: e.position.y.to_num(),
                z: e.position.z.to_num(),
                hp: e.hp.to_num(),
                max_hp: e.max_hp.to_num(),
                is_king: e.is_king,
            })
            .collect();

        Self {
            tick: sim.current_tick(),
            phase: sim.phase(),
            seconds_remaining: sim.seconds_remaining(),
            elixir: ElixirState {
                player: sim.elixir(Team::Player).to_num(),
                enemy: sim.elixir(Team::Enemy).to_num(),
            },
            entities,
            hash: sim.state_hash(),
        }
    }
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for acknowledgment.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Tick { .. } => "tick",
            Self::Advance { .. } => "advance",
            Self::Deploy { .. } => "deploy",
            Self::Cast { .. } => "cast",
            Self::Query => "query",
            Self::Hash => "hash",
            Self::Quit => "quit",
        }
    }
}

/// Convert a protocol coordinate to a ground point.
///
/// Returns `None` for NaN, infinities and values outside the fixed-point range.
pub fn ground_point(x: f64, z: f64) -> Option<Vec3Fixed> {
    let x = Fixed::checked_from_num(x)?;
    let z = Fixed::checked_from_num(z)?;
    Some(Vec3Fixed::new(x, Fixed::ZERO, z))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tick_command() {
        let json = r#"{"cmd":"tick","count":60}"#;
        let cmd = Command::from_json(json).unwrap();
        assert!(matches!(cmd, Command::Tick { count: 60 }));
    }

    #[test]
    fn test_default_tick_count() {
        let json = r#"{"cmd":"tick"}"#;
        let cmd = Command::from_json(json).unwrap();
        assert!(matches!(cmd, Command::Tick { count: 1 }));
    }

    #[test]
    fn test_parse_deploy_defaults_to_player() {
        let json = r#"{"cmd":"deploy","card":"knight","x":-5.0,"z":-4.0}"#;
        let cmd = Command::from_json(json).unwrap();
        assert_eq!(
            cmd,
            Command::Deploy {
                card: "knight".to_string(),
                x: -5.0,
                z: -4.0,
                team: Team::Player,
            }
        );
    }

    #[test]
    fn test_parse_cast_for_enemy() {
        let json = r#"{"cmd":"cast","spell":"zap","x":0.0,"z":-3.0,"team":"enemy"}"#;
        let cmd = Command::from_json(json).unwrap();
        assert!(matches!(cmd, Command::Cast { team: Team::Enemy, .. }));
        assert_eq!(cmd.name(), "cast");
    }

    #[test]
    fn test_rejection_is_flattened() {
        let resp = Response::Rejected {
            cmd: "deploy".to_string(),
            rejection: DeployRejection::Unaffordable {
                cost: 5,
                available: 3,
            },
        };
        let json = resp.to_json_line();
        assert!(json.contains(r#""type":"rejected""#));
        assert!(json.contains(r#""reason":"unaffordable""#));
        assert!(json.contains(r#""cost":5"#));
        assert!(json.ends_with('\n'));
    }

    #[test]
    fn test_game_over_is_player_relative() {
        let outcome = MatchOutcome {
            winner: Some(Team::Enemy),
            reason: EndReason::Timeout,
            tick: 1800,
            crown_towers: [1, 2],
        };
        let json = Response::game_over(&outcome).to_json_line();
        assert!(json.contains(r#""result":"defeat""#));
        assert!(json.contains(r#""reason":"timeout""#));
    }

    #[test]
    fn test_ground_point_rejects_nan() {
        assert!(ground_point(f64::NAN, 0.0).is_none());
        assert!(ground_point(0.0, f64::INFINITY).is_none());
        assert_eq!(
            ground_point(1.5, -2.0),
            Some(Vec3Fixed::new(
                Fixed::from_num(1.5),
                Fixed::ZERO,
                Fixed::from_num(-2)
            ))
        );
    }

    #[test]
    fn test_unknown_command_fails_to_parse() {
        assert!(Command::from_json(r#"{"cmd":"teleport"}"#).is_err());
    }
}
