//! Error types for the battle simulation.
//!
//! Normal gameplay outcomes (no target, out of range, not enough elixir)
//! are never fatal. Targeting misses are policy branches; refused commands
//! come back as [`GameError::Rejected`] carrying a [`DeployRejection`] and
//! leave the store untouched. Everything else is broken data or a broken
//! invariant.

use thiserror::Error;

use crate::components::EntityId;
use crate::spawn::DeployRejection;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// Internal consistency was broken (dangling reference at commit time,
    /// unit kind missing from the catalog mid-tick). The tick that hit this
    /// was aborted without writing anything.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// A unit kind was looked up that the catalog does not define.
    #[error("Unknown unit type: {0}")]
    UnknownUnitType(String),

    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// A deck did not satisfy the deck-building rules.
    #[error("Invalid deck: {0}")]
    InvalidDeck(String),

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// A deployment or spell was refused. Nothing changed.
    #[error("Command rejected: {0}")]
    Rejected(#[from] DeployRejection),
}

impl GameError {
    /// Whether this error belongs to the fatal class that aborts a tick.
    #[must_use]
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvariantViolation(_))
    }

    /// The rejection reason, if this is a refused command.
    #[must_use]
    pub fn rejection(&self) -> Option<&DeployRejection> {
        match self {
            Self::Rejected(reason) => Some(reason),
            _ => None,
        }
    }
}
