//! Data validation utilities.
//!
//! A data directory holds `units.ron` and `cards.ron`, plus an optional
//! `config.ron` with rule overrides. Validation parses every file and runs
//! the cross-table checks the simulation relies on at load time.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use arena_core::catalog::{Catalog, STANDARD_CARDS_RON, STANDARD_UNITS_RON};
use arena_core::config::SimConfig;
use arena_core::error::GameError;

/// Unit table file name.
pub const UNITS_FILE: &str = "units.ron";
/// Card table file name.
pub const CARDS_FILE: &str = "cards.ron";
/// Optional rule file name.
pub const CONFIG_FILE: &str = "config.ron";

/// Errors that stop validation before any checks run.
#[derive(Error, Debug)]
pub enum ValidateError {
    /// A required file is missing.
    #[error("Required data file not found: {0}")]
    Missing(PathBuf),
    /// A file could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// A file could not be parsed.
    #[error(transparent)]
    Parse(#[from] GameError),
    /// Tables parsed but failed validation.
    #[error("{} problem(s) found, first: {}", .0.len(), .0.first().map_or("", String::as_str))]
    Invalid(Vec<String>),
    /// A template could not be written.
    #[error("Failed to write template: {0}")]
    Write(String),
}

/// Summary of a successful validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Unit rows loaded.
    pub units: usize,
    /// Card rows loaded.
    pub cards: usize,
    /// Spell cards among them.
    pub spells: usize,
    /// Whether a rule file was present and checked.
    pub has_config: bool,
}

fn read(path: &Path) -> Result<String, ValidateError> {
    if !path.exists() {
        return Err(ValidateError::Missing(path.to_path_buf()));
    }
    std::fs::read_to_string(path).map_err(|source| ValidateError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Validate all RON data files in a directory.
///
/// # Errors
///
/// Returns an error if a required file is missing, any file fails to
/// parse, or the tables fail the consistency checks. Every problem is
/// logged before returning.
pub fn validate_data_directory(path: &Path) -> Result<ValidationReport, ValidateError> {
    info!(dir = %path.display(), "Validating data directory");

    let units = read(&path.join(UNITS_FILE))?;
    let cards = read(&path.join(CARDS_FILE))?;
    let catalog = Catalog::from_ron_strs(&units, &cards)?;

    let mut problems = catalog.validate();

    let config_path = path.join(CONFIG_FILE);
    let has_config = config_path.exists();
    if has_config {
        let source = read(&config_path)?;
        let config: SimConfig = ron::from_str(&source).map_err(|e| GameError::DataParseError {
            path: CONFIG_FILE.to_string(),
            message: e.to_string(),
        })?;
        problems.extend(config.validate());

        for kind in &config.ai.pool {
            match catalog.card(*kind) {
                Some(card) if card.is_spell => {
                    problems.push(format!("AI pool entry '{kind}' is a spell"));
                }
                Some(_) => {}
                None => problems.push(format!("AI pool entry '{kind}' has no card")),
            }
        }
    } else {
        debug!("No {CONFIG_FILE}, using default rules");
    }

    if !problems.is_empty() {
        for problem in &problems {
            warn!("{problem}");
        }
        return Err(ValidateError::Invalid(problems));
    }

    let report = ValidationReport {
        units: catalog.units().count(),
        cards: catalog.cards().count(),
        spells: catalog.cards().filter(|card| card.is_spell).count(),
        has_config,
    };
    info!(
        units = report.units,
        cards = report.cards,
        spells = report.spells,
        "Data directory is valid"
    );
    Ok(report)
}

/// Write the built-in tables and default rules into `dir` as a starting
/// point for custom data.
///
/// # Errors
///
/// Returns an error if the directory or a file cannot be written.
pub fn write_defaults(dir: &Path) -> Result<(), ValidateError> {
    let config = ron::ser::to_string_pretty(&SimConfig::default(), ron::ser::PrettyConfig::default())
        .map_err(|e| ValidateError::Write(e.to_string()))?;

    std::fs::create_dir_all(dir).map_err(|e| ValidateError::Write(e.to_string()))?;
    for (name, contents) in [
        (UNITS_FILE, STANDARD_UNITS_RON),
        (CARDS_FILE, STANDARD_CARDS_RON),
        (CONFIG_FILE, config.as_str()),
    ] {
        let target = dir.join(name);
        std::fs::write(&target, contents)
            .map_err(|e| ValidateError::Write(format!("{}: {e}", target.display())))?;
        debug!(file = %target.display(), "Wrote template");
    }
    Ok(())
}
