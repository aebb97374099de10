//! Scripted bot opponents for headless playtesting.
//!
//! A [`DeckBot`] holds an eight-card [`Deck`] and, at a fixed decision
//! interval, plays a random affordable card on its own half. Spells are
//! aimed at the enemy closest to the bot's king. Every choice comes from a
//! seeded ChaCha generator, so a bot replays identically for a given seed.

use std::path::Path;

use arena_core::prelude::*;
use std::result::Result;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scenario::{play_card, CardPlay};

/// Error type for profile loading.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// File not found.
    #[error("Bot profile not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read bot profile: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse bot profile: {0}")]
    ParseError(#[from] ron::error::SpannedError),
}

/// Tuning for a bot's play style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotProfile {
    /// Profile name.
    pub name: String,
    /// Ticks between decisions.
    pub decision_interval_ticks: u64,
    /// Elixir the bot waits for before playing anything.
    pub min_elixir: u32,
    /// Closest deploy depth from the centre line, in tenths of a unit.
    pub depth_near_tenths: u32,
    /// Farthest deploy depth from the centre line, in tenths of a unit.
    pub depth_far_tenths: u32,
    /// Cards to play, by name. Empty means the starter deck.
    #[serde(default)]
    pub deck: Vec<UnitKind>,
}

impl Default for BotProfile {
    fn default() -> Self {
        Self {
            name: "Balanced".to_string(),
            decision_interval_ticks: 30,
            min_elixir: 4,
            depth_near_tenths: 20,
            depth_far_tenths: 80,
            deck: Vec::new(),
        }
    }
}

impl BotProfile {
    /// Load a profile from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ProfileError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ProfileError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(ron::from_str(&contents)?)
    }

    /// Plays whatever it can afford, as often as possible, near the bridge.
    #[must_use]
    pub fn rush() -> Self {
        Self {
            name: "Rush".to_string(),
            decision_interval_ticks: 10,
            min_elixir: 0,
            depth_near_tenths: 5,
            depth_far_tenths: 30,
            deck: vec![
                UnitKind::Goblin,
                UnitKind::Skeleton,
                UnitKind::Knight,
                UnitKind::HogRider,
                UnitKind::Minipekka,
                UnitKind::Barbarian,
                UnitKind::Zap,
                UnitKind::Bomber,
            ],
        }
    }

    /// Saves up and drops large pushes from the back.
    #[must_use]
    pub fn patient() -> Self {
        Self {
            name: "Patient".to_string(),
            decision_interval_ticks: 50,
            min_elixir: 8,
            depth_near_tenths: 60,
            depth_far_tenths: 110,
            deck: vec![
                UnitKind::Giant,
                UnitKind::Pekka,
                UnitKind::Wizard,
                UnitKind::Musketeer,
                UnitKind::Valkyrie,
                UnitKind::Lightning,
                UnitKind::InfernoTower,
                UnitKind::Archer,
            ],
        }
    }

    /// Built-in profile by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "balanced" => Some(Self::default()),
            "rush" => Some(Self::rush()),
            "patient" => Some(Self::patient()),
            _ => None,
        }
    }

    /// Built-in profile by name, or a RON file path.
    pub fn resolve(name_or_path: &str) -> Result<Self, ProfileError> {
        match Self::from_name(name_or_path) {
            Some(profile) => Ok(profile),
            None => Self::load(name_or_path),
        }
    }

    /// The deck this profile plays.
    pub fn build_deck(&self, catalog: &Catalog) -> arena_core::error::Result<Deck> {
        if self.deck.is_empty() {
            Deck::quick(catalog)
        } else {
            Deck::new(self.deck.clone(), catalog)
        }
    }
}

/// A card play chosen by a bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotPlay {
    /// Card to play.
    pub card: UnitKind,
    /// Where to play it.
    pub point: Vec3Fixed,
    /// Whether this goes through `cast_spell`.
    pub is_spell: bool,
}

/// Seeded card-playing bot.
#[derive(Debug, Clone)]
pub struct DeckBot {
    team: Team,
    deck: Deck,
    profile: BotProfile,
    rng: ChaCha8Rng,
    next_decision: u64,
    plays: u32,
}

impl DeckBot {
    /// Create a bot for `team`.
    pub fn new(team: Team, profile: BotProfile, catalog: &Catalog, seed: u64) -> arena_core::error::Result<Self> {
        let deck = profile.build_deck(catalog)?;
        Ok(Self {
            team,
            deck,
            rng: ChaCha8Rng::seed_from_u64(seed),
            next_decision: profile.decision_interval_ticks,
            profile,
            plays: 0,
        })
    }

    /// Team the bot plays for.
    #[must_use]
    pub fn team(&self) -> Team {
        self.team
    }

    /// Profile in use.
    #[must_use]
    pub fn profile(&self) -> &BotProfile {
        &self.profile
    }

    /// Cards played so far.
    #[must_use]
    pub fn plays(&self) -> u32 {
        self.plays
    }

    /// Pick a play if a decision is due at the simulation's current tick.
    pub fn decide(&mut self, sim: &Simulation) -> Option<BotPlay> {
        if sim.phase() != GamePhase::Battle || sim.current_tick() < self.next_decision {
            return None;
        }
        self.next_decision = sim.current_tick() + self.profile.decision_interval_ticks.max(1);

        let elixir = sim.elixir(self.team);
        if elixir < Fixed::from_num(self.profile.min_elixir) {
            return None;
        }

        let affordable: Vec<(UnitKind, bool)> = self
            .deck
            .cards()
            .iter()
            .filter_map(|&kind| {
                let card = sim.catalog().card(kind)?;
                (Fixed::from_num(card.cost) <= elixir).then_some((kind, card.is_spell))
            })
            .collect();
        if affordable.is_empty() {
            return None;
        }

        let (card, is_spell) = affordable[self.rng.gen_range(0..affordable.len())];
        let point = if is_spell {
            self.spell_target(sim)?
        } else {
            self.deploy_point(sim.config())
        };

        self.plays += 1;
        Some(BotPlay {
            card,
            point,
            is_spell,
        })
    }

    /// Decide and issue the play against the simulation.
    ///
    /// The play comes back together with its result so callers can count
    /// refusals.
    pub fn act(&mut self, sim: &mut Simulation) -> Option<(BotPlay, arena_core::error::Result<CardPlay>)> {
        let play = self.decide(sim)?;
        let result = play_card(sim, play.card, play.point, self.team);
        Some((play, result))
    }

    fn deploy_point(&mut self, config: &SimConfig) -> Vec3Fixed {
        let reach = (config.field.half_width - Fixed::ONE).max(Fixed::ZERO);
        let reach_tenths: i32 = (reach * 10).to_num();
        let x = Fixed::from_num(self.rng.gen_range(-reach_tenths..=reach_tenths)) / 10;

        let near = self.profile.depth_near_tenths.max(1);
        let far = self.profile.depth_far_tenths.max(near);
        let depth = Fixed::from_num(self.rng.gen_range(near..=far)) / 10;
        let depth = depth.min(config.field.half_length);

        Vec3Fixed::new(x, Fixed::ZERO, depth * self.team.home_sign())
    }

    /// The enemy standing closest to our king, ground distance.
    fn spell_target(&self, sim: &Simulation) -> Option<Vec3Fixed> {
        let king = sim.store().king_of(self.team)?.position;
        sim.render_view()
            .into_iter()
            .filter(|e| e.team != self.team)
            .min_by_key(|e| (e.position.horizontal_distance_squared(king), e.id))
            .map(|e| e.position.horizontal())
    }
}
