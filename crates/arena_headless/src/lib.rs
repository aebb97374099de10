//! Headless battle runner for bot testing and CI verification.
//!
//! This crate drives an [`arena_core`] match without graphics. It can be
//! controlled via JSON commands on stdin, with match state written to
//! stdout, or run whole bot-versus-bot batches in parallel. This enables:
//!
//! - **Bot testing**: An agent can play a match without a client
//! - **CI verification**: Automated testing of game logic and determinism
//! - **Balance runs**: Win rates of deck profiles over thousands of seeds
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from controller (start, advance, deploy, cast, etc.)
//! - **stdout**: State updates and responses (JSON)
//! - **stderr**: Debug logs (human-readable)
//!
//! See [`protocol`] module for the full command/response specification.
//!
//! # Example
//!
//! ```bash
//! # Run interactively
//! printf '{"cmd":"start"}\n{"cmd":"advance","ms":1000}\n' | cargo run -p arena_headless
//!
//! # Run a scripted scenario
//! cargo run -p arena_headless -- run --scenario crates/arena_headless/scenarios/bridge_rush.ron
//!
//! # Verify determinism
//! cargo run -p arena_headless -- verify --seed 12345 --runs 5
//! ```

#![forbid(unsafe_code)]

pub mod ascii_visualizer;
pub mod batch;
pub mod game_runner;
pub mod metrics;
pub mod protocol;
pub mod runner;
pub mod scenario;
pub mod strategies;

pub use ascii_visualizer::{render_simulation, render_snapshot, AsciiConfig};
pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults};
pub use game_runner::{run_game, GameConfig, GameResult, RunError};
pub use metrics::{BatchSummary, GameMetrics, MetricsCollector, TeamMetrics};
pub use protocol::{Command, Response, StateSnapshot};
pub use runner::{HeadlessConfig, HeadlessRunner};
pub use scenario::{CardPlay, Scenario, ScenarioError};
pub use strategies::{BotProfile, DeckBot};
