//! Complete match execution for headless testing.
//!
//! A match is a [`Scenario`] driven through a [`Session`] one tick interval
//! at a time. Scripted plays and bots act between timer firings, and every
//! notification feeds a [`MetricsCollector`].
//!
//! All loops are bounded: a match stops at its king, its clock or
//! `max_ticks`, whichever comes first.

use std::time::Instant;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use arena_core::prelude::*;
use std::result::Result;

use crate::metrics::{GameMetrics, MetricsCollector};
use crate::scenario::{CardPlay, Scenario, ScenarioError};
use crate::strategies::{BotProfile, DeckBot};

/// Maximum entities we'll ever allow in a single match.
/// Guards against runaway spawning in hand-written scenarios.
const MAX_ENTITIES: usize = 2_000;

/// Progress logging interval (ticks).
const PROGRESS_LOG_INTERVAL: u64 = 500;

/// Errors that abort a match.
#[derive(Error, Debug)]
pub enum RunError {
    /// The scenario could not be built or scripted.
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    /// The simulation failed.
    #[error(transparent)]
    Simulation(#[from] GameError),
    /// The field filled up past [`MAX_ENTITIES`].
    #[error("entity count {count} exceeded {MAX_ENTITIES} at tick {tick}")]
    EntityOverflow {
        /// Live entities.
        count: usize,
        /// Tick of the check.
        tick: u64,
    },
}

/// Configuration for a single match.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Random seed for determinism.
    pub seed: u64,
    /// Maximum ticks before the match is cut off.
    pub max_ticks: u64,
    /// Scenario to play.
    pub scenario: Scenario,
    /// Bot for the player side, if any.
    pub player: Option<BotProfile>,
    /// Bot for the enemy side. `None` leaves the enemy to the built-in
    /// reinforcement scheduler.
    pub opponent: Option<BotProfile>,
    /// Game ID for tracking.
    pub game_id: String,
}

impl GameConfig {
    /// A balanced player bot against the built-in scheduler.
    #[must_use]
    pub fn new(scenario: Scenario, seed: u64) -> Self {
        Self {
            seed,
            max_ticks: scenario.max_ticks,
            game_id: format!("game_{seed:06}"),
            scenario,
            player: Some(BotProfile::default()),
            opponent: None,
        }
    }
}

/// Result of a completed match.
#[derive(Debug, Clone)]
pub struct GameResult {
    /// Collected metrics.
    pub metrics: GameMetrics,
    /// Hash of the final state.
    pub final_state_hash: u64,
    /// Terminal result, `None` if the match hit `max_ticks`.
    pub outcome: Option<MatchOutcome>,
}

/// Run a complete match.
pub fn run_game(config: GameConfig) -> Result<GameResult, RunError> {
    let game_start = Instant::now();
    info!(
        game_id = %config.game_id,
        seed = config.seed,
        max_ticks = config.max_ticks,
        scenario = %config.scenario.name,
        "Starting match"
    );

    let mut scenario = config.scenario;
    if config.opponent.is_some() {
        scenario.rules.ai_enabled = Some(false);
    }
    let sim = scenario.build(Some(config.seed))?;

    let mut collector = MetricsCollector::new(&config.game_id, &scenario.name, config.seed);
    collector.watch(&sim);

    let mut bots = Vec::new();
    for (team, profile, salt) in [
        (Team::Player, config.player, 0x5eed_0001),
        (Team::Enemy, config.opponent, 0x5eed_0002),
    ] {
        if let Some(profile) = profile {
            bots.push(DeckBot::new(team, profile, sim.catalog(), config.seed ^ salt)?);
        }
    }

    let tick_ms = u64::from(sim.config().tick_interval_ms());
    let mut session = Session::new(sim);
    session.start()?;

    while session.simulation().phase() != GamePhase::Ended
        && session.simulation().current_tick() < config.max_ticks
    {
        let sim = session.simulation_mut();
        let tick = sim.current_tick();

        let entity_count = sim.store().len();
        if entity_count > MAX_ENTITIES {
            error!(tick, entity_count, "Entity count exceeded maximum, aborting match");
            return Err(RunError::EntityOverflow {
                count: entity_count,
                tick,
            });
        }

        for play in scenario.apply_script(sim)? {
            record_play(&mut collector, &play);
        }

        for bot in &mut bots {
            let Some((play, result)) = bot.act(sim) else {
                continue;
            };
            match result {
                Ok(played) => record_play(&mut collector, &played),
                Err(GameError::Rejected(reason)) => {
                    debug!(tick, team = %bot.team(), card = %play.card, %reason, "Bot play refused");
                    collector.on_rejected(bot.team());
                }
                Err(e) => return Err(e.into()),
            }
        }

        let events = session.advance(tick_ms)?;
        let tick = session.simulation().current_tick();
        collector.set_tick(tick);
        collector.observe(&events);

        if tick % PROGRESS_LOG_INTERVAL == 0 && tick > 0 {
            let sim = session.simulation();
            debug!(
                tick,
                entities = sim.store().len(),
                seconds_remaining = sim.seconds_remaining(),
                player_towers = sim.structure_count(Team::Player),
                enemy_towers = sim.structure_count(Team::Enemy),
                "Match progress"
            );
        }
    }

    let sim = session.simulation();
    let outcome = sim.outcome();
    if outcome.is_none() {
        warn!(
            game_id = %config.game_id,
            ticks = sim.current_tick(),
            "Match cut off at max_ticks"
        );
    }

    let final_state_hash = sim.state_hash();
    let metrics = collector.finalize(outcome.as_ref(), final_state_hash);

    info!(
        game_id = %metrics.game_id,
        ticks = metrics.duration_ticks,
        winner = ?metrics.winner,
        condition = %metrics.win_condition,
        elapsed_ms = game_start.elapsed().as_millis() as u64,
        "Match finished"
    );

    Ok(GameResult {
        metrics,
        final_state_hash,
        outcome,
    })
}

fn record_play(collector: &mut MetricsCollector, play: &CardPlay) {
    collector.on_play(play.team, play.card, play.cost, play.is_spell);
    collector.observe(&play.events);
}
