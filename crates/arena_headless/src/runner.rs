//! Headless battle runner implementation.
//!
//! Reads one JSON [`Command`] per line and answers with JSON [`Response`]
//! lines. Time only moves when the controller sends `tick` or `advance`,
//! so a session is fully reproducible from its command log.

use std::io::{self, BufRead, Write};

use arena_core::prelude::*;
use std::result::Result;
use tracing::{debug, warn};

use crate::protocol::{ground_point, Command, Response, StateSnapshot};
use crate::scenario::{Scenario, ScenarioError};

/// Headless runner configuration.
#[derive(Debug, Clone, Default)]
pub struct HeadlessConfig {
    /// Output state after every tick (vs only on query).
    pub auto_state_output: bool,
    /// Scenario name or RON path to load on startup.
    pub scenario: Option<String>,
    /// Seed override for the scenario.
    pub seed: Option<u64>,
}

/// Line-oriented controller for one match.
pub struct HeadlessRunner {
    config: HeadlessConfig,
    scenario: Scenario,
    session: Session,
    tick_ms: u64,
    /// Tick at which the scenario script last ran.
    scripted_tick: Option<u64>,
    game_over_sent: bool,
}

impl HeadlessRunner {
    /// Create a runner on the open field.
    pub fn new() -> Result<Self, ScenarioError> {
        Self::with_config(HeadlessConfig::default())
    }

    /// Create a runner with custom configuration.
    pub fn with_config(config: HeadlessConfig) -> Result<Self, ScenarioError> {
        let scenario = match &config.scenario {
            Some(name) => Scenario::resolve(name)?,
            None => Scenario::default(),
        };
        let sim = scenario.build(config.seed)?;
        let tick_ms = u64::from(sim.config().tick_interval_ms());
        Ok(Self {
            config,
            scenario,
            session: Session::new(sim),
            tick_ms,
            scripted_tick: None,
            game_over_sent: false,
        })
    }

    /// The simulation being driven.
    #[must_use]
    pub fn simulation(&self) -> &Simulation {
        self.session.simulation()
    }

    /// Run the command loop until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, reader: R, mut writer: W) -> io::Result<()> {
        let tick = self.simulation().current_tick();
        writer.write_all(Response::ready(tick).to_json_line().as_bytes())?;
        writer.flush()?;

        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (responses, quit) = match Command::from_json(line) {
                Ok(cmd) => {
                    let quit = cmd == Command::Quit;
                    (self.handle(cmd), quit)
                }
                Err(e) => {
                    warn!(%line, error = %e, "Unparseable command");
                    (vec![Response::error(format!("Invalid command: {e}"), None)], false)
                }
            };

            for response in responses {
                writer.write_all(response.to_json_line().as_bytes())?;
            }
            writer.flush()?;

            if quit {
                break;
            }
        }
        Ok(())
    }

    /// Execute one command.
    pub fn handle(&mut self, cmd: Command) -> Vec<Response> {
        let cmd_name = cmd.name();
        debug!(cmd = cmd_name, "Handling command");

        match cmd {
            Command::Start => match self.session.start() {
                Ok(()) => vec![Response::ack(cmd_name)],
                Err(e) => vec![Response::error(e.to_string(), Some(cmd_name))],
            },

            Command::Tick { count } => self.advance(self.tick_ms * u64::from(count), cmd_name),

            Command::Advance { ms } => self.advance(ms, cmd_name),

            Command::Deploy { card, x, z, team } => {
                let Some(kind) = UnitKind::from_name(&card) else {
                    return vec![Response::error(format!("Unknown card '{card}'"), Some(cmd_name))];
                };
                let Some(point) = ground_point(x, z) else {
                    return vec![rejected(cmd_name, DeployRejection::OutOfBounds)];
                };
                match self.session.simulation_mut().deploy(kind, point, team) {
                    Ok(deployment) => vec![Response::Deployed {
                        card,
                        entities: deployment.entities,
                    }],
                    Err(e) => self.refusal(e, cmd_name),
                }
            }

            Command::Cast { spell, x, z, team } => {
                let Some(kind) = UnitKind::from_name(&spell) else {
                    return vec![Response::error(format!("Unknown card '{spell}'"), Some(cmd_name))];
                };
                let Some(point) = ground_point(x, z) else {
                    return vec![rejected(cmd_name, DeployRejection::OutOfBounds)];
                };
                match self.session.simulation_mut().cast_spell(kind, point, team) {
                    Ok(cast) => {
                        let total_damage: Fixed = cast.damage.iter().map(|d| d.amount).sum();
                        let mut responses = vec![Response::SpellCast {
                            spell,
                            hits: u32::try_from(cast.damage.len()).unwrap_or(u32::MAX),
                            total_damage: total_damage.to_num(),
                        }];
                        if cast.outcome.is_some() {
                            self.session.stop();
                        }
                        responses.extend(self.game_over());
                        responses
                    }
                    Err(e) => self.refusal(e, cmd_name),
                }
            }

            Command::Query => vec![Response::State(StateSnapshot::capture(self.simulation()))],

            Command::Hash => {
                let sim = self.simulation();
                vec![Response::StateHash {
                    tick: sim.current_tick(),
                    hash: sim.state_hash(),
                }]
            }

            Command::Quit => vec![Response::Bye],
        }
    }

    /// Let wall time pass one tick interval at a time, running the scenario
    /// script before each tick.
    fn advance(&mut self, ms: u64, cmd_name: &str) -> Vec<Response> {
        if self.simulation().phase() == GamePhase::Deployment {
            return vec![Response::error("battle has not started", Some(cmd_name))];
        }

        let mut events = Vec::new();
        let mut remaining = ms;
        while remaining > 0 && self.session.is_running() {
            let tick = self.simulation().current_tick();
            if self.scripted_tick != Some(tick) {
                self.scripted_tick = Some(tick);
                match self.scenario.apply_script(self.session.simulation_mut()) {
                    Ok(plays) => events.extend(plays.into_iter().flat_map(|p| p.events)),
                    Err(e) => return vec![Response::error(e.to_string(), Some(cmd_name))],
                }
            }

            let step = remaining.min(self.tick_ms);
            match self.session.advance(step) {
                Ok(fired) => events.extend(fired),
                Err(e) => return vec![Response::error(e.to_string(), Some(cmd_name))],
            }
            remaining -= step;
        }

        let sim = self.simulation();
        let mut responses = vec![Response::Events {
            tick: sim.current_tick(),
            events,
        }];
        if self.config.auto_state_output {
            responses.push(Response::State(StateSnapshot::capture(sim)));
        }
        responses.extend(self.game_over());
        responses
    }

    /// The game-over line, once.
    fn game_over(&mut self) -> Option<Response> {
        if self.game_over_sent {
            return None;
        }
        let outcome = self.simulation().outcome()?;
        self.game_over_sent = true;
        Some(Response::game_over(&outcome))
    }

    fn refusal(&self, error: GameError, cmd_name: &str) -> Vec<Response> {
        match error {
            GameError::Rejected(reason) => {
                warn!(cmd = cmd_name, %reason, tick = self.simulation().current_tick(), "Play refused");
                vec![rejected(cmd_name, reason)]
            }
            other => vec![Response::error(other.to_string(), Some(cmd_name))],
        }
    }
}

fn rejected(cmd_name: &str, rejection: DeployRejection) -> Response {
    Response::Rejected {
        cmd: cmd_name.to_string(),
        rejection,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_runner() -> HeadlessRunner {
        let config = HeadlessConfig {
            scenario: Some("duel".to_string()),
            ..HeadlessConfig::default()
        };
        HeadlessRunner::with_config(config).unwrap()
    }

    fn run_lines(runner: &mut HeadlessRunner, input: &str) -> Vec<serde_json::Value> {
        let mut out = Vec::new();
        runner.run(input.as_bytes(), &mut out).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_ready_line_comes_first() {
        let lines = run_lines(&mut quiet_runner(), "");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["type"], "ready");
        assert_eq!(lines[0]["version"], "1.0");
    }

    #[test]
    fn test_tick_before_start_is_an_error() {
        let lines = run_lines(&mut quiet_runner(), "{\"cmd\":\"tick\"}\n");
        assert_eq!(lines[1]["type"], "error");
        assert_eq!(lines[1]["cmd"], "tick");
    }

    #[test]
    fn test_session_walkthrough() {
        let input = [
            r#"{"cmd":"deploy","card":"knight","x":-5.0,"z":-4.0}"#,
            r#"{"cmd":"start"}"#,
            r#"{"cmd":"tick","count":30}"#,
            r#"{"cmd":"deploy","card":"giant","x":0.0,"z":4.0}"#,
            r#"{"cmd":"hash"}"#,
            r#"{"cmd":"quit"}"#,
            r#"{"cmd":"query"}"#,
        ]
        .join("\n");
        let lines = run_lines(&mut quiet_runner(), &input);

        let types: Vec<&str> = lines.iter().map(|l| l["type"].as_str().unwrap()).collect();
        assert_eq!(
            types,
            ["ready", "deployed", "ack", "events", "rejected", "state_hash", "bye"]
        );
        assert_eq!(lines[3]["tick"], 30);
        assert_eq!(lines[4]["reason"], "wrong_half");
        assert_eq!(lines[5]["tick"], 30);
    }

    #[test]
    fn test_garbage_line_reports_error_and_continues() {
        let lines = run_lines(&mut quiet_runner(), "not json\n{\"cmd\":\"hash\"}\n");
        assert_eq!(lines[1]["type"], "error");
        assert_eq!(lines[2]["type"], "state_hash");
    }

    #[test]
    fn test_unknown_card_is_an_error() {
        let mut runner = quiet_runner();
        let responses = runner.handle(Command::Deploy {
            card: "dragon_knight".to_string(),
            x: 0.0,
            z: -3.0,
            team: Team::Player,
        });
        assert!(matches!(responses[0], Response::Error { .. }));
    }

    #[test]
    fn test_non_finite_coordinate_is_rejected() {
        let mut runner = quiet_runner();
        let hash = runner.simulation().state_hash();
        let responses = runner.handle(Command::Cast {
            spell: "zap".to_string(),
            x: f64::NAN,
            z: 0.0,
            team: Team::Player,
        });
        assert_eq!(
            responses,
            vec![rejected("cast", DeployRejection::OutOfBounds)]
        );
        assert_eq!(runner.simulation().state_hash(), hash);
    }

    #[test]
    fn test_auto_state_follows_events() {
        let mut runner = HeadlessRunner::with_config(HeadlessConfig {
            auto_state_output: true,
            scenario: Some("duel".to_string()),
            seed: None,
        })
        .unwrap();
        runner.handle(Command::Start);
        let responses = runner.handle(Command::Advance { ms: 250 });

        assert!(matches!(responses[0], Response::Events { tick: 2, .. }));
        assert!(matches!(responses[1], Response::State(_)));
    }

    #[test]
    fn test_game_over_is_reported_once() {
        let mut runner = HeadlessRunner::with_config(HeadlessConfig {
            scenario: Some("duel".to_string()),
            ..HeadlessConfig::default()
        })
        .unwrap();
        runner.handle(Command::Start);

        // Default clock is 180 seconds.
        let responses = runner.handle(Command::Advance { ms: 180_000 });
        let game_overs: Vec<_> = responses
            .iter()
            .filter_map(|r| match r {
                Response::GameOver { reason, ticks, .. } => Some((*reason, *ticks)),
                _ => None,
            })
            .collect();
        assert_eq!(game_overs, vec![(EndReason::Timeout, 1800)]);

        let later = runner.handle(Command::Tick { count: 5 });
        assert_eq!(later.len(), 1);
        assert!(matches!(later[0], Response::Events { ref events, .. } if events.is_empty()));
    }

    #[test]
    fn test_scenario_script_fires_during_ticks() {
        let mut runner = HeadlessRunner::with_config(HeadlessConfig {
            scenario: Some("lane_push".to_string()),
            ..HeadlessConfig::default()
        })
        .unwrap();
        runner.handle(Command::Start);
        let responses = runner.handle(Command::Tick { count: 1 });

        let Response::Events { events, .. } = &responses[0] else {
            panic!("expected events, got {responses:?}");
        };
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::Spawned {
                kind: UnitKind::Giant,
                team: Team::Player,
                ..
            }
        )));
    }
}
