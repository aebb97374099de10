//! # Arena Core
//!
//! Deterministic battle simulation for a two-lane arena game.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No unseeded randomness
//! - No floating-point math in the tick (uses fixed-point)
//!
//! This separation enables:
//! - Headless batch simulation
//! - Snapshot and replay
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`catalog`] - Unit and card tables
//! - [`store`] - Entity storage and the per-tick snapshot
//! - [`targeting`] - Target validation and acquisition
//! - [`pathing`] - Move-or-attack decisions and lane fallback
//! - [`combat`] - Attack, splash, decay and spell damage
//! - [`victory`] - Match phases and win conditions
//! - [`spawn`] - Elixir, deployment rules and AI reinforcements
//! - [`simulation`] - Core simulation loop
//! - [`clock`] - Tick and battle-clock timers
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod catalog;
pub mod clock;
pub mod combat;
pub mod components;
pub mod config;
pub mod error;
pub mod events;
pub mod math;
pub mod pathing;
pub mod simulation;
pub mod spawn;
pub mod store;
pub mod targeting;
pub mod victory;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::catalog::{Catalog, CardDefinition, Deck, UnitDefinition, UnitKind};
    pub use crate::clock::Session;
    pub use crate::combat::{DamageCause, DamageEvent};
    pub use crate::components::*;
    pub use crate::config::{SimConfig, SplashPolicy};
    pub use crate::error::{GameError, Result};
    pub use crate::events::{EventKind, EventSink, GameEvent, TickEvents};
    pub use crate::math::{Fixed, Vec3Fixed};
    pub use crate::simulation::{Deployment, RenderEntity, Simulation, SpellCast};
    pub use crate::spawn::DeployRejection;
    pub use crate::store::{Entity, EntityStore};
    pub use crate::victory::{EndReason, GamePhase, MatchOutcome};
}
