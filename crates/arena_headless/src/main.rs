//! Headless arena battle runner.
//!
//! This binary runs battles without graphics, controlled via JSON on
//! stdin/stdout. Designed for bots, CI testing and balance runs.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p arena_headless
//!
//! # Interactive mode on a scripted scenario
//! cargo run -p arena_headless -- run --scenario crates/arena_headless/scenarios/bridge_rush.ron
//!
//! # Run one bot match and watch it
//! cargo run -p arena_headless -- simulate --scenario lane_push --show-every 100
//!
//! # Run batch balance test
//! cargo run -p arena_headless -- batch --count 1000 --player rush --opponent patient
//!
//! # Verify determinism
//! cargo run -p arena_headless -- verify --seed 12345 --runs 5
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arena_core::prelude::*;
use std::result::Result;
use arena_headless::{
    ascii_visualizer::{render_file, render_simulation, AsciiConfig},
    batch::{run_batch, verify_determinism, BatchConfig},
    game_runner::{run_game, GameConfig},
    runner::{HeadlessConfig, HeadlessRunner},
    scenario::Scenario,
    strategies::{BotProfile, DeckBot},
};

#[derive(Parser)]
#[command(name = "arena_headless")]
#[command(about = "Headless arena battle runner for bots and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single interactive match over stdin/stdout
    Run {
        /// Scenario name or RON file to load
        #[arg(short, long)]
        scenario: Option<String>,

        /// Seed override
        #[arg(long)]
        seed: Option<u64>,

        /// Output state after every tick
        #[arg(long)]
        auto_state: bool,
    },

    /// Run batch of matches for balance testing
    Batch {
        /// Scenario to run
        #[arg(short, long, default_value = "open_field")]
        scenario: String,

        /// Number of matches to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel matches (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Starting random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Maximum ticks per match (0 = scenario limit)
        #[arg(long, default_value = "0")]
        max_ticks: u64,

        /// Player bot profile (name or RON file)
        #[arg(long, default_value = "balanced")]
        player: String,

        /// Enemy bot profile; omit to use the built-in scheduler
        #[arg(long)]
        opponent: Option<String>,
    },

    /// Verify determinism by running same seed multiple times
    Verify {
        /// Scenario to test
        #[arg(short, long, default_value = "lane_push")]
        scenario: String,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },

    /// Play one bot match and print the field as ASCII art
    Simulate {
        /// Scenario to play
        #[arg(short, long, default_value = "open_field")]
        scenario: String,

        /// Random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Player bot profile
        #[arg(long, default_value = "balanced")]
        player: String,

        /// Enemy bot profile; omit to use the built-in scheduler
        #[arg(long)]
        opponent: Option<String>,

        /// Print the field every N ticks (0 = only at the end)
        #[arg(long, default_value = "0")]
        show_every: u64,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Display a saved state snapshot as ASCII art
    Visualize {
        /// State JSON file
        #[arg(short, long)]
        path: PathBuf,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is for the protocol
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    let result = match cli.command {
        Some(Commands::Run {
            scenario,
            seed,
            auto_state,
        }) => cmd_run(scenario, seed, auto_state),
        Some(Commands::Batch {
            scenario,
            count,
            parallel,
            output,
            seed,
            max_ticks,
            player,
            opponent,
        }) => cmd_batch(BatchConfig {
            scenario,
            game_count: count,
            parallel_games: parallel,
            output_dir: output,
            seed_start: seed,
            max_ticks,
            player_bot: Some(player),
            opponent_bot: opponent,
        }),
        Some(Commands::Verify {
            scenario,
            seed,
            runs,
        }) => cmd_verify(scenario, seed, runs),
        Some(Commands::Simulate {
            scenario,
            seed,
            player,
            opponent,
            show_every,
            no_color,
        }) => cmd_simulate(&scenario, seed, &player, opponent.as_deref(), show_every, no_color),
        Some(Commands::Visualize { path, no_color }) => cmd_visualize(&path, no_color),
        None => cmd_run(None, None, false),
    };

    match result {
        Ok(code) => code,
        Err(message) => {
            tracing::error!("{message}");
            eprintln!("FATAL: {message}");
            ExitCode::FAILURE
        }
    }
}

/// Run a single interactive match
fn cmd_run(scenario: Option<String>, seed: Option<u64>, auto_state: bool) -> Result<ExitCode, String> {
    tracing::info!("Starting interactive session");

    let config = HeadlessConfig {
        auto_state_output: auto_state,
        scenario,
        seed,
    };

    let mut runner = HeadlessRunner::with_config(config).map_err(|e| e.to_string())?;
    runner
        .run(io::stdin().lock(), io::stdout().lock())
        .map_err(|e| format!("I/O error: {e}"))?;
    Ok(ExitCode::SUCCESS)
}

/// Run batch of matches for balance testing
fn cmd_batch(config: BatchConfig) -> Result<ExitCode, String> {
    let output = config.output_dir.clone();
    std::fs::create_dir_all(&output)
        .map_err(|e| format!("Cannot create output directory '{}': {e}", output.display()))?;

    tracing::info!(
        scenario = %config.scenario,
        count = config.game_count,
        parallel = config.parallel_games,
        seed = config.seed_start,
        output = %output.display(),
        "Batch configuration"
    );

    let results = run_batch(config);

    let results_path = output.join("batch_results.json");
    results
        .save(&results_path)
        .map_err(|e| format!("Failed to save results: {e}"))?;

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Matches played: {}", results.games.len());
    if !results.errors.is_empty() {
        eprintln!("Matches failed: {}", results.errors.len());
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!();
    for team in Team::BOTH {
        eprintln!("  {:<8} wins: {:>5.1}%", team, summary.win_rate(team) * 100.0);
    }
    eprintln!("  draws       : {}", summary.draws);
    eprintln!(
        "  king kills  : {}  timeouts: {}  cut off: {}",
        summary.king_kills, summary.timeouts, summary.unfinished
    );
    eprintln!("  avg length  : {:.0} ticks", summary.avg_duration_ticks);
    if let Some(team) = summary.dominant_team(0.1) {
        eprintln!("\n  Imbalance: {team} wins more than 60% of matches");
    }
    eprintln!("\nResults saved to: {}", results_path.display());

    if results.games.is_empty() && !results.errors.is_empty() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Verify determinism
fn cmd_verify(scenario: String, seed: u64, runs: u32) -> Result<ExitCode, String> {
    tracing::info!(%scenario, seed, runs, "Verifying determinism");

    let config = BatchConfig::new(&scenario, 1);
    if verify_determinism(&config, seed, runs)? {
        eprintln!("✓ Determinism verified: {runs} runs of seed {seed} produced identical state");
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("✗ Determinism FAILED: runs of seed {seed} diverged");
        Ok(ExitCode::FAILURE)
    }
}

/// Play one match, printing the field along the way
fn cmd_simulate(
    scenario: &str,
    seed: u64,
    player: &str,
    opponent: Option<&str>,
    show_every: u64,
    no_color: bool,
) -> Result<ExitCode, String> {
    let ascii = AsciiConfig {
        use_color: !no_color,
        ..AsciiConfig::default()
    };
    let scenario = Scenario::resolve(scenario).map_err(|e| e.to_string())?;
    let player = BotProfile::resolve(player).map_err(|e| e.to_string())?;
    let opponent = opponent
        .map(BotProfile::resolve)
        .transpose()
        .map_err(|e| e.to_string())?;

    if show_every == 0 {
        let mut config = GameConfig::new(scenario, seed);
        config.player = Some(player);
        config.opponent = opponent;
        let result = run_game(config).map_err(|e| e.to_string())?;
        println!("{}", serde_json::to_string_pretty(&result.metrics).map_err(|e| e.to_string())?);
        return Ok(ExitCode::SUCCESS);
    }

    // Step by hand so the field can be drawn between ticks.
    let mut scenario = scenario;
    if opponent.is_some() {
        scenario.rules.ai_enabled = Some(false);
    }
    let sim = scenario.build(Some(seed)).map_err(|e| e.to_string())?;
    let mut bots = vec![DeckBot::new(Team::Player, player, sim.catalog(), seed).map_err(|e| e.to_string())?];
    if let Some(profile) = opponent {
        bots.push(
            DeckBot::new(Team::Enemy, profile, sim.catalog(), seed.wrapping_add(1))
                .map_err(|e| e.to_string())?,
        );
    }
    let tick_ms = u64::from(sim.config().tick_interval_ms());

    let mut session = Session::new(sim);
    session.start().map_err(|e| e.to_string())?;
    while session.simulation().phase() != GamePhase::Ended
        && session.simulation().current_tick() < scenario.max_ticks
    {
        let sim = session.simulation_mut();
        scenario.apply_script(sim).map_err(|e| e.to_string())?;
        for bot in &mut bots {
            if let Some((_, Err(e))) = bot.act(sim) {
                if e.rejection().is_none() {
                    return Err(e.to_string());
                }
            }
        }
        session.advance(tick_ms).map_err(|e| e.to_string())?;
        if session.simulation().current_tick() % show_every == 0 {
            println!("{}", render_simulation(session.simulation(), &ascii));
        }
    }

    let sim = session.simulation();
    println!("{}", render_simulation(sim, &ascii));
    match sim.outcome() {
        Some(outcome) => eprintln!(
            "Match over at tick {}: {:?} winner={:?} crowns={:?}",
            outcome.tick, outcome.reason, outcome.winner, outcome.crown_towers
        ),
        None => eprintln!("Match cut off at tick {}", sim.current_tick()),
    }
    Ok(ExitCode::SUCCESS)
}

/// Show a saved state
fn cmd_visualize(path: &std::path::Path, no_color: bool) -> Result<ExitCode, String> {
    let ascii = AsciiConfig {
        use_color: !no_color,
        ..AsciiConfig::default()
    };
    let art = render_file(path, &ascii).map_err(|e| format!("{}: {e}", path.display()))?;
    print!("{art}");
    Ok(ExitCode::SUCCESS)
}
