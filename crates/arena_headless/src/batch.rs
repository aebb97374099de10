//! Batch match runner for balance testing.
//!
//! Runs many matches in parallel using rayon, one seed per match, and
//! collects their metrics into a [`BatchSummary`].

use crate::game_runner::{run_game, GameConfig};
use crate::metrics::{BatchSummary, GameMetrics};
use crate::scenario::Scenario;
use crate::strategies::BotProfile;
use arena_core::prelude::Team;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Scenario name or RON path
    pub scenario: String,
    /// Number of matches to run
    pub game_count: u32,
    /// Maximum parallel matches (0 = use rayon default)
    pub parallel_games: u32,
    /// Output directory for results
    pub output_dir: PathBuf,
    /// Starting seed for deterministic runs
    pub seed_start: u64,
    /// Maximum ticks per match (0 = the scenario's own limit)
    pub max_ticks: u64,
    /// Bot profile for the player side
    pub player_bot: Option<String>,
    /// Bot profile for the enemy side (None = built-in scheduler)
    pub opponent_bot: Option<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scenario: "open_field".to_string(),
            game_count: 100,
            parallel_games: 0,
            output_dir: PathBuf::from("results"),
            seed_start: 0,
            max_ticks: 0,
            player_bot: Some("balanced".to_string()),
            opponent_bot: None,
        }
    }
}

impl BatchConfig {
    /// Create config for a specific scenario
    pub fn new(scenario: &str, game_count: u32) -> Self {
        Self {
            scenario: scenario.to_string(),
            game_count,
            ..Default::default()
        }
    }

    /// Set output directory
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set seed start
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set bot profiles for both sides
    pub fn with_bots(mut self, player: &str, opponent: &str) -> Self {
        self.player_bot = Some(player.to_string());
        self.opponent_bot = Some(opponent.to_string());
        self
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual match metrics
    pub games: Vec<GameMetrics>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Error during batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Match index
    pub game_index: u32,
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

/// Progress tracking for batch runs
#[derive(Debug)]
pub struct BatchProgress {
    /// Total matches
    pub total: u32,
    /// Completed matches
    pub completed: Arc<AtomicU32>,
    /// Start time
    pub start_time: Instant,
    /// Partial results for live stats
    partial_wins: Arc<Mutex<HashMap<Team, u32>>>,
}

impl BatchProgress {
    /// Create new progress tracker
    pub fn new(total: u32) -> Self {
        Self {
            total,
            completed: Arc::new(AtomicU32::new(0)),
            start_time: Instant::now(),
            partial_wins: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record a completed match
    pub fn record_completion(&self, winner: Option<Team>) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        if let Some(team) = winner {
            if let Ok(mut wins) = self.partial_wins.lock() {
                *wins.entry(team).or_insert(0) += 1;
            }
        }
    }

    /// Get current completion count
    pub fn current(&self) -> u32 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Get completion percentage
    pub fn percentage(&self) -> f64 {
        f64::from(self.current()) / f64::from(self.total.max(1)) * 100.0
    }

    /// Get estimated time remaining
    pub fn eta(&self) -> Duration {
        let completed = self.current();
        if completed == 0 {
            return Duration::from_secs(0);
        }

        let elapsed = self.start_time.elapsed();
        let per_game = elapsed.as_secs_f64() / f64::from(completed);
        let remaining = self.total.saturating_sub(completed);
        Duration::from_secs_f64(per_game * f64::from(remaining))
    }

    /// Get current win rates
    pub fn current_win_rates(&self) -> HashMap<Team, f64> {
        let completed = self.current();
        if completed == 0 {
            return HashMap::new();
        }

        match self.partial_wins.lock() {
            Ok(wins) => wins
                .iter()
                .map(|(team, n)| (*team, f64::from(*n) / f64::from(completed)))
                .collect(),
            Err(_) => HashMap::new(),
        }
    }

    /// Log a progress line with the running win rates.
    pub fn report(&self) {
        let eta = self.eta();
        let rates = self.current_win_rates();
        let rate = |team| rates.get(&team).copied().unwrap_or(0.0) * 100.0;
        info!(
            completed = self.current(),
            total = self.total,
            eta_secs = eta.as_secs(),
            "Batch {:.1}% done, player {:.1}% / enemy {:.1}% wins so far",
            self.percentage(),
            rate(Team::Player),
            rate(Team::Enemy),
        );
    }
}

fn resolve_bot(name: Option<&String>) -> Result<Option<BotProfile>, String> {
    name.map(|n| BotProfile::resolve(n).map_err(|e| e.to_string()))
        .transpose()
}

/// Run a single match of the batch.
fn run_single_game(seed: u64, config: &BatchConfig) -> Result<GameMetrics, String> {
    let scenario = Scenario::resolve(&config.scenario).map_err(|e| e.to_string())?;

    let mut game_config = GameConfig::new(scenario, seed);
    if config.max_ticks > 0 {
        game_config.max_ticks = config.max_ticks;
    }
    game_config.player = resolve_bot(config.player_bot.as_ref())?;
    game_config.opponent = resolve_bot(config.opponent_bot.as_ref())?;

    run_game(game_config)
        .map(|result| result.metrics)
        .map_err(|e| e.to_string())
}

/// Run a batch of matches
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    let progress = Arc::new(BatchProgress::new(config.game_count));

    info!(
        "Starting batch run: {} matches of '{}'",
        config.game_count, config.scenario
    );

    let play = |i: u32| {
        let seed = config.seed_start.wrapping_add(u64::from(i));
        match run_single_game(seed, &config) {
            Ok(metrics) => {
                progress.record_completion(metrics.winner);
                let completed = progress.current();
                if completed % 10 == 0 {
                    debug!("Progress: {}/{}", completed, config.game_count);
                }
                if completed % 100 == 0 {
                    progress.report();
                }
                Ok(metrics)
            }
            Err(message) => {
                warn!(match_index = i, seed, "Match failed: {message}");
                Err(BatchError {
                    game_index: i,
                    seed,
                    message,
                })
            }
        }
    };

    // A dedicated pool keeps repeated batches in one process independent.
    let pool = (config.parallel_games > 0)
        .then(|| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(config.parallel_games as usize)
                .build()
        })
        .transpose()
        .unwrap_or_else(|e| {
            warn!("Falling back to the global thread pool: {e}");
            None
        });

    let run_all = || -> Vec<Result<GameMetrics, BatchError>> {
        (0..config.game_count).into_par_iter().map(play).collect()
    };
    let results = match &pool {
        Some(pool) => pool.install(run_all),
        None => run_all(),
    };

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let games: Vec<GameMetrics> = games.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} matches in {:.1}s ({:.1} matches/sec)",
        games.len(),
        duration_seconds,
        games.len() as f64 / duration_seconds.max(f64::EPSILON)
    );

    BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    }
}

/// Verify determinism by running the same seed several times and comparing
/// final state hashes.
pub fn verify_determinism(config: &BatchConfig, seed: u64, runs: u32) -> Result<bool, String> {
    let mut first: Option<u64> = None;
    for run in 0..runs.max(1) {
        let hash = run_single_game(seed, config)?.final_state_hash;
        match first {
            None => first = Some(hash),
            Some(expected) if expected != hash => {
                warn!(seed, run, expected, hash, "Final state diverged");
                return Ok(false);
            }
            Some(_) => {}
        }
    }
    Ok(true)
}
