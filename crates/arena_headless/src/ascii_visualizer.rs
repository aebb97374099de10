//! ASCII battle visualizer.
//!
//! Draws a [`StateSnapshot`] as a top-down grid for quick terminal review.
//! The enemy half is at the top, the centre line is drawn as `~`, enemy
//! entities are uppercase and player entities lowercase.

use std::collections::BTreeMap;
use std::path::Path;

use arena_core::config::FieldConfig;
use arena_core::prelude::*;

use crate::protocol::{EntityState, StateSnapshot};

/// ASCII visualization configuration.
#[derive(Debug, Clone)]
pub struct AsciiConfig {
    /// Columns across the field.
    pub width: usize,
    /// Rows along the field.
    pub height: usize,
    /// Show the legend and unit counts.
    pub show_legend: bool,
    /// Use colored output (ANSI).
    pub use_color: bool,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            width: 40,
            height: 30,
            show_legend: true,
            use_color: true,
        }
    }
}

/// ANSI color codes.
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";

    pub const BLUE: &str = "\x1b[34m";
    pub const RED: &str = "\x1b[31m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const GREEN: &str = "\x1b[32m";
    pub const GRAY: &str = "\x1b[90m";
}

/// Character for an entity, cased by team.
fn unit_char(entity: &EntityState) -> char {
    let base = if entity.is_king {
        '@'
    } else {
        match UnitKind::from_name(&entity.kind) {
            Some(UnitKind::Tower) => 'T',
            Some(
                UnitKind::Cannon
                | UnitKind::Tesla
                | UnitKind::InfernoTower
                | UnitKind::Xbow
                | UnitKind::Mortar,
            ) => '#',
            _ => entity
                .kind
                .chars()
                .next()
                .map_or('?', |c| c.to_ascii_uppercase()),
        }
    };

    match entity.team {
        Team::Player => base.to_ascii_lowercase(),
        Team::Enemy => base,
    }
}

fn team_color(team: Team) -> &'static str {
    match team {
        Team::Player => colors::BLUE,
        Team::Enemy => colors::RED,
    }
}

fn health_color(fraction: f64) -> &'static str {
    if fraction > 0.66 {
        colors::GREEN
    } else if fraction > 0.33 {
        colors::YELLOW
    } else {
        colors::RED
    }
}

/// Grid cell of a field position, or `None` off the field.
fn cell(x: f64, z: f64, field: &FieldConfig, config: &AsciiConfig) -> Option<(usize, usize)> {
    let half_width: f64 = field.half_width.to_num();
    let half_length: f64 = field.half_length.to_num();
    if x.abs() > half_width || z.abs() > half_length {
        return None;
    }

    let cols = config.width.max(1) as f64;
    let rows = config.height.max(1) as f64;
    let col = ((x + half_width) / (2.0 * half_width) * cols) as usize;
    // Enemy half (positive z) at the top.
    let row = ((half_length - z) / (2.0 * half_length) * rows) as usize;
    Some((
        row.min(config.height.saturating_sub(1)),
        col.min(config.width.saturating_sub(1)),
    ))
}

/// Render a snapshot as ASCII art.
pub fn render_snapshot(
    state: &StateSnapshot,
    field: &FieldConfig,
    config: &AsciiConfig,
) -> String {
    let paint = |code: &'static str| if config.use_color { code } else { "" };
    let reset = paint(colors::RESET);

    let centre_row = config.height / 2;
    let mut grid: Vec<Vec<(char, &'static str)>> = (0..config.height)
        .map(|row| {
            let blank = if row == centre_row { '~' } else { '.' };
            vec![(blank, paint(colors::GRAY)); config.width]
        })
        .collect();

    // (entities, damaged) per team.
    let mut counts: BTreeMap<Team, (u32, u32)> = BTreeMap::new();

    // Structures first so units standing on them stay visible.
    let mut ordered: Vec<&EntityState> = state.entities.iter().collect();
    ordered.sort_by_key(|e| !matches!(unit_char(e).to_ascii_uppercase(), 'T' | '@' | '#'));

    for entity in ordered {
        let entry = counts.entry(entity.team).or_insert((0, 0));
        entry.0 += 1;
        let fraction = entity.hp / entity.max_hp.max(f64::EPSILON);
        if fraction < 1.0 {
            entry.1 += 1;
        }

        let Some((row, col)) = cell(entity.x, entity.z, field, config) else {
            continue;
        };
        let color = if fraction < 1.0 {
            health_color(fraction)
        } else {
            team_color(entity.team)
        };
        grid[row][col] = (unit_char(entity), paint(color));
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{}╔══ Tick: {} │ {:?} │ {}s left ══╗{}\n",
        paint(colors::BOLD),
        state.tick,
        state.phase,
        state.seconds_remaining,
        reset
    ));

    output.push('║');
    output.push_str(&"═".repeat(config.width));
    output.push_str("║\n");

    for row in &grid {
        output.push('║');
        for (ch, color) in row {
            if color.is_empty() {
                output.push(*ch);
            } else {
                output.push_str(color);
                output.push(*ch);
                output.push_str(reset);
            }
        }
        output.push_str("║\n");
    }

    if config.show_legend {
        output.push_str("╠══ LEGEND ");
        output.push_str(&"═".repeat(config.width.saturating_sub(10)));
        output.push_str("╣\n");
        output.push_str("║ @=king T=tower #=building (lower=player UPPER=enemy)\n");
        output.push_str(&format!(
            "║ elixir: player {:.1}, enemy {:.1}\n",
            state.elixir.player, state.elixir.enemy
        ));
        output.push_str("║ ");
        for (team, (total, damaged)) in &counts {
            output.push_str(&format!(
                "{}{}{}: {} entities ({} damaged) ",
                paint(team_color(*team)),
                team,
                reset,
                total,
                damaged
            ));
        }
        output.push('\n');
    }

    output.push('╚');
    output.push_str(&"═".repeat(config.width));
    output.push_str("╝\n");

    output
}

/// Render the live state of a simulation.
pub fn render_simulation(sim: &Simulation, config: &AsciiConfig) -> String {
    render_snapshot(&StateSnapshot::capture(sim), &sim.config().field, config)
}

/// Render a snapshot saved as JSON (for example a `state` line from the
/// headless protocol) on the default field.
pub fn render_file(path: &Path, config: &AsciiConfig) -> std::io::Result<String> {
    let json = std::fs::read_to_string(path)?;
    let state: StateSnapshot = serde_json::from_str(&json)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    Ok(render_snapshot(&state, &FieldConfig::default(), config))
}
