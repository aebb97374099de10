//! Data-driven unit and card catalog.
//!
//! Every type-specific behaviour in the simulation (building-only targeting,
//! immobile buildings, flying eligibility, self-decay, splash) is read from a
//! [`UnitDefinition`] row. There is no per-type code path anywhere in the
//! tick loop.
//!
//! The standard tables live in `data/units.ron` and `data/cards.ron` and are
//! embedded at compile time.
//!
//! # Example
//!
//! ```
//! use arena_core::catalog::{Catalog, UnitKind};
//! use arena_core::math::Fixed;
//!
//! let catalog = Catalog::standard().unwrap();
//! let knight = catalog.unit(UnitKind::Knight).unwrap();
//! assert_eq!(knight.max_hp, Fixed::from_num(100));
//! assert_eq!(catalog.card(UnitKind::Knight).unwrap().cost, 3);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::{fixed_decimal, option_fixed_decimal, Fixed};

/// Embedded standard unit table.
pub const STANDARD_UNITS_RON: &str = include_str!("../data/units.ron");

/// Embedded standard card table.
pub const STANDARD_CARDS_RON: &str = include_str!("../data/cards.ron");

/// Number of cards in a deck.
pub const DECK_SIZE: usize = 8;

/// Every unit, building, tower and spell type known to the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Melee all-rounder.
    Knight,
    /// Ranged, hits air and ground.
    Archer,
    /// Slow tank that only attacks buildings.
    Giant,
    /// Fast rider that only attacks buildings.
    HogRider,
    /// Crown tower guarding a lane.
    Tower,
    /// The must-destroy crown tower.
    KingTower,
    /// Ground-only defensive building.
    Cannon,
    /// Defensive building that hits air and ground.
    Tesla,
    /// High-rate defensive building.
    InfernoTower,
    /// Long-range siege building.
    Xbow,
    /// Splash siege building.
    Mortar,
    /// Flying splash attacker.
    Dragon,
    /// Flying bomber that only attacks buildings.
    Balloon,
    /// Light flying attacker.
    Minion,
    /// Melee splash attacker.
    Valkyrie,
    /// Ranged splash attacker.
    Wizard,
    /// Ranged splash attacker, ground only.
    Bomber,
    /// Long-range single-target attacker.
    Musketeer,
    /// Ranged attacker.
    Witch,
    /// Heavy melee attacker.
    Pekka,
    /// Light heavy-hitter.
    Minipekka,
    /// Fast melee attacker.
    Prince,
    /// Melee swarm unit.
    Barbarian,
    /// Cheap fast swarm unit.
    Goblin,
    /// Cheapest swarm unit.
    Skeleton,
    /// Ranged building-only tank.
    RoyalGiant,
    /// Area damage spell.
    Fireball,
    /// Wide low-damage spell.
    Arrows,
    /// Spell striking the strongest few enemies.
    Lightning,
    /// Small instant spell.
    Zap,
    /// Heavy small-area spell.
    Rocket,
}

impl UnitKind {
    /// All kinds in declaration order.
    pub const ALL: [Self; 31] = [
        Self::Knight,
        Self::Archer,
        Self::Giant,
        Self::HogRider,
        Self::Tower,
        Self::KingTower,
        Self::Cannon,
        Self::Tesla,
        Self::InfernoTower,
        Self::Xbow,
        Self::Mortar,
        Self::Dragon,
        Self::Balloon,
        Self::Minion,
        Self::Valkyrie,
        Self::Wizard,
        Self::Bomber,
        Self::Musketeer,
        Self::Witch,
        Self::Pekka,
        Self::Minipekka,
        Self::Prince,
        Self::Barbarian,
        Self::Goblin,
        Self::Skeleton,
        Self::RoyalGiant,
        Self::Fireball,
        Self::Arrows,
        Self::Lightning,
        Self::Zap,
        Self::Rocket,
    ];

    /// Stable snake_case name, matching the data files and the protocol.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Knight => "knight",
            Self::Archer => "archer",
            Self::Giant => "giant",
            Self::HogRider => "hog_rider",
            Self::Tower => "tower",
            Self::KingTower => "king_tower",
            Self::Cannon => "cannon",
            Self::Tesla => "tesla",
            Self::InfernoTower => "inferno_tower",
            Self::Xbow => "xbow",
            Self::Mortar => "mortar",
            Self::Dragon => "dragon",
            Self::Balloon => "balloon",
            Self::Minion => "minion",
            Self::Valkyrie => "valkyrie",
            Self::Wizard => "wizard",
            Self::Bomber => "bomber",
            Self::Musketeer => "musketeer",
            Self::Witch => "witch",
            Self::Pekka => "pekka",
            Self::Minipekka => "minipekka",
            Self::Prince => "prince",
            Self::Barbarian => "barbarian",
            Self::Goblin => "goblin",
            Self::Skeleton => "skeleton",
            Self::RoyalGiant => "royal_giant",
            Self::Fireball => "fireball",
            Self::Arrows => "arrows",
            Self::Lightning => "lightning",
            Self::Zap => "zap",
            Self::Rocket => "rocket",
        }
    }

    /// Look a kind up by its snake_case name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Which targets an attacker may strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetClass {
    /// Only non-flying targets (buildings included).
    #[default]
    Ground,
    /// Only flying targets.
    Air,
    /// Anything.
    Both,
}

impl TargetClass {
    /// Whether a target with the given flying flag is compatible.
    #[must_use]
    pub const fn accepts(self, target_is_flying: bool) -> bool {
        match self {
            Self::Ground => !target_is_flying,
            Self::Air => target_is_flying,
            Self::Both => true,
        }
    }
}

/// Immutable combat statistics for one unit type.
///
/// Ranges and speeds are in world units, `attack_speed` is the cooldown in
/// ticks between attacks and `movement_speed` is world units per tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDefinition {
    /// Type this row describes.
    pub kind: UnitKind,
    /// Starting and maximum hit points.
    #[serde(default, with = "fixed_decimal")]
    pub max_hp: Fixed,
    /// Damage per attack (or per cast for spells).
    #[serde(with = "fixed_decimal")]
    pub attack_damage: Fixed,
    /// Maximum distance at which an acquired target can be struck.
    #[serde(default, with = "fixed_decimal")]
    pub attack_range: Fixed,
    /// Maximum distance at which a target can be acquired.
    #[serde(default, with = "fixed_decimal")]
    pub detection_range: Fixed,
    /// Cooldown in ticks between attacks.
    #[serde(default)]
    pub attack_speed: u32,
    /// World units moved per tick.
    #[serde(default, with = "fixed_decimal")]
    pub movement_speed: Fixed,
    /// Initial height. Used for distance, otherwise only for rendering.
    #[serde(default, with = "fixed_decimal")]
    pub vertical_offset: Fixed,
    /// Buildings never move.
    #[serde(default)]
    pub is_building: bool,
    /// Flying units are only hit by air-capable attackers.
    #[serde(default)]
    pub is_flying: bool,
    /// Hit points lost per second regardless of combat.
    #[serde(default, with = "option_fixed_decimal")]
    pub health_decay_per_second: Option<Fixed>,
    /// Area radius for splash attackers and spells.
    #[serde(default, with = "option_fixed_decimal")]
    pub splash_radius: Option<Fixed>,
    /// Which targets this unit may strike.
    #[serde(default)]
    pub target_class: TargetClass,
    /// Siege units that ignore everything except buildings.
    #[serde(default)]
    pub targets_buildings_only: bool,
    /// Spells only: cap on the number of entities one cast hits.
    #[serde(default)]
    pub max_targets: Option<u32>,
}

impl UnitDefinition {
    /// Whether this unit damages entities around its primary target.
    #[must_use]
    pub fn has_splash(&self) -> bool {
        self.splash_radius.is_some_and(|r| r > Fixed::ZERO)
    }
}

/// Card rarity, carried for deck-building front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    /// Common.
    #[default]
    Common,
    /// Rare.
    Rare,
    /// Epic.
    Epic,
    /// Legendary.
    Legendary,
}

/// Deployment metadata for a playable card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDefinition {
    /// Unit or spell this card deploys.
    pub kind: UnitKind,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// One-line description for card pickers.
    #[serde(default)]
    pub description: String,
    /// Elixir cost.
    pub cost: u32,
    /// Entities created by one deployment.
    #[serde(default = "default_spawn_count")]
    pub spawn_count: u32,
    /// Spells apply instant area damage instead of creating entities.
    #[serde(default)]
    pub is_spell: bool,
    /// Rarity.
    #[serde(default)]
    pub rarity: Rarity,
}

fn default_spawn_count() -> u32 {
    1
}

/// Lookup tables for units and cards, keyed by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    units: BTreeMap<UnitKind, UnitDefinition>,
    cards: BTreeMap<UnitKind, CardDefinition>,
}

impl Catalog {
    /// Load the embedded standard tables.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParseError`] if the embedded tables are
    /// malformed or fail validation.
    pub fn standard() -> Result<Self> {
        let catalog = Self::from_ron_strs(STANDARD_UNITS_RON, STANDARD_CARDS_RON)?;
        let problems = catalog.validate();
        if let Some(first) = problems.first() {
            return Err(GameError::DataParseError {
                path: "units.ron".to_string(),
                message: format!("{first} ({} problems in total)", problems.len()),
            });
        }
        Ok(catalog)
    }

    /// Parse unit and card tables from RON source.
    ///
    /// Duplicate rows are rejected. No cross-table validation is done here;
    /// call [`Catalog::validate`] for that.
    pub fn from_ron_strs(units: &str, cards: &str) -> Result<Self> {
        let unit_rows: Vec<UnitDefinition> =
            ron::from_str(units).map_err(|e| GameError::DataParseError {
                path: "units.ron".to_string(),
                message: e.to_string(),
            })?;
        let card_rows: Vec<CardDefinition> =
            ron::from_str(cards).map_err(|e| GameError::DataParseError {
                path: "cards.ron".to_string(),
                message: e.to_string(),
            })?;

        Self::from_rows(unit_rows, card_rows)
    }

    /// Build a catalog from already-deserialized rows.
    pub fn from_rows(
        unit_rows: Vec<UnitDefinition>,
        card_rows: Vec<CardDefinition>,
    ) -> Result<Self> {
        let mut units = BTreeMap::new();
        for row in unit_rows {
            let kind = row.kind;
            if units.insert(kind, row).is_some() {
                return Err(GameError::DataParseError {
                    path: "units.ron".to_string(),
                    message: format!("duplicate unit '{kind}'"),
                });
            }
        }

        let mut cards = BTreeMap::new();
        for row in card_rows {
            let kind = row.kind;
            if cards.insert(kind, row).is_some() {
                return Err(GameError::DataParseError {
                    path: "cards.ron".to_string(),
                    message: format!("duplicate card '{kind}'"),
                });
            }
        }

        Ok(Self { units, cards })
    }

    /// Combat statistics for a kind.
    pub fn unit(&self, kind: UnitKind) -> Result<&UnitDefinition> {
        self.units
            .get(&kind)
            .ok_or_else(|| GameError::UnknownUnitType(kind.name().to_string()))
    }

    /// Card metadata for a kind. Towers have no card.
    #[must_use]
    pub fn card(&self, kind: UnitKind) -> Option<&CardDefinition> {
        self.cards.get(&kind)
    }

    /// All unit rows in kind order.
    pub fn units(&self) -> impl Iterator<Item = &UnitDefinition> {
        self.units.values()
    }

    /// All card rows in kind order.
    pub fn cards(&self) -> impl Iterator<Item = &CardDefinition> {
        self.cards.values()
    }

    /// Check cross-table consistency and stat sanity.
    ///
    /// Returns every problem found; an empty list means the catalog is
    /// usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        for card in self.cards.values() {
            let Some(unit) = self.units.get(&card.kind) else {
                problems.push(format!("card '{}' has no unit definition", card.kind));
                continue;
            };

            if card.is_spell {
                if unit.attack_damage <= Fixed::ZERO {
                    problems.push(format!("spell '{}' deals no damage", card.kind));
                }
                if unit.max_hp != Fixed::ZERO {
                    problems.push(format!("spell '{}' must not have hit points", card.kind));
                }
            } else if card.spawn_count == 0 {
                problems.push(format!("card '{}' spawns nothing", card.kind));
            }
        }

        let spells: BTreeSet<UnitKind> = self
            .cards
            .values()
            .filter(|card| card.is_spell)
            .map(|card| card.kind)
            .collect();

        for unit in self.units.values() {
            if spells.contains(&unit.kind) {
                continue;
            }
            if unit.max_hp <= Fixed::ZERO {
                problems.push(format!("unit '{}' has no hit points", unit.kind));
            }
            if unit.attack_speed == 0 {
                problems.push(format!("unit '{}' has zero attack speed", unit.kind));
            }
            if unit.detection_range < unit.attack_range {
                problems.push(format!(
                    "unit '{}' detection range is shorter than its attack range",
                    unit.kind
                ));
            }
            if unit.is_building && unit.movement_speed != Fixed::ZERO {
                problems.push(format!("building '{}' has a movement speed", unit.kind));
            }
            if !unit.is_building && unit.movement_speed <= Fixed::ZERO {
                problems.push(format!("unit '{}' cannot move", unit.kind));
            }
            if unit.max_targets.is_some() {
                problems.push(format!("only spells may cap targets ('{}')", unit.kind));
            }
        }

        for kind in [UnitKind::Tower, UnitKind::KingTower] {
            match self.units.get(&kind) {
                Some(unit) if !unit.is_building => {
                    problems.push(format!("crown tower '{kind}' must be a building"));
                }
                None => problems.push(format!("crown tower '{kind}' is missing")),
                Some(_) => {}
            }
        }

        problems
    }
}

/// An eight-card hand of distinct deployable cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    cards: Vec<UnitKind>,
}

impl Deck {
    /// Build a deck, checking it against the catalog.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidDeck`] unless there are exactly [`DECK_SIZE`]
    /// distinct cards, each with a card definition.
    pub fn new(cards: Vec<UnitKind>, catalog: &Catalog) -> Result<Self> {
        if cards.len() != DECK_SIZE {
            return Err(GameError::InvalidDeck(format!(
                "expected {DECK_SIZE} cards, got {}",
                cards.len()
            )));
        }

        let mut seen = BTreeSet::new();
        for &kind in &cards {
            if !seen.insert(kind) {
                return Err(GameError::InvalidDeck(format!("'{kind}' appears twice")));
            }
            if catalog.card(kind).is_none() {
                return Err(GameError::InvalidDeck(format!("'{kind}' is not a card")));
            }
        }

        Ok(Self { cards })
    }

    /// Ready-made starter deck.
    pub fn quick(catalog: &Catalog) -> Result<Self> {
        Self::new(
            vec![
                UnitKind::Knight,
                UnitKind::Archer,
                UnitKind::Giant,
                UnitKind::Wizard,
                UnitKind::Fireball,
                UnitKind::Cannon,
                UnitKind::HogRider,
                UnitKind::Musketeer,
            ],
            catalog,
        )
    }

    /// Cards in deck order.
    #[must_use]
    pub fn cards(&self) -> &[UnitKind] {
        &self.cards
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_loads_and_validates() {
        let catalog = Catalog::standard().unwrap();
        assert!(catalog.validate().is_empty(), "{:?}", catalog.validate());
        for kind in UnitKind::ALL {
            assert!(catalog.unit(kind).is_ok(), "missing unit {kind}");
        }
        assert!(catalog.card(UnitKind::Tower).is_none());
        assert!(catalog.card(UnitKind::KingTower).is_none());
    }

    #[test]
    fn test_standard_stats() {
        let catalog = Catalog::standard().unwrap();

        let archer = catalog.unit(UnitKind::Archer).unwrap();
        assert_eq!(archer.attack_range, Fixed::from_num(4));
        assert_eq!(archer.target_class, TargetClass::Both);

        let mortar = catalog.unit(UnitKind::Mortar).unwrap();
        assert!(mortar.is_building);
        assert_eq!(mortar.health_decay_per_second, Some(Fixed::from_num(2)));
        assert_eq!(mortar.splash_radius, Some(Fixed::from_num(2)));

        let hog = catalog.unit(UnitKind::HogRider).unwrap();
        assert!(hog.targets_buildings_only);

        let lightning = catalog.unit(UnitKind::Lightning).unwrap();
        assert_eq!(lightning.max_targets, Some(3));
        assert!(catalog.card(UnitKind::Lightning).unwrap().is_spell);

        let skeletons = catalog.card(UnitKind::Skeleton).unwrap();
        assert_eq!(skeletons.spawn_count, 4);
        assert_eq!(skeletons.cost, 1);
    }

    #[test]
    fn test_card_presentation_and_heights() {
        let catalog = Catalog::standard().unwrap();

        let pekka = catalog.card(UnitKind::Pekka).unwrap();
        assert_eq!(pekka.name, "P.E.K.K.A");
        assert_eq!(pekka.rarity, Rarity::Legendary);
        assert_eq!(catalog.card(UnitKind::Dragon).unwrap().name, "Baby Dragon");
        assert_eq!(catalog.card(UnitKind::RoyalGiant).unwrap().rarity, Rarity::Legendary);
        assert_eq!(catalog.card(UnitKind::Rocket).unwrap().rarity, Rarity::Epic);
        assert_eq!(catalog.card(UnitKind::InfernoTower).unwrap().rarity, Rarity::Epic);
        assert_eq!(catalog.card(UnitKind::Tesla).unwrap().rarity, Rarity::Rare);
        assert_eq!(catalog.card(UnitKind::Zap).unwrap().rarity, Rarity::Common);
        assert!(catalog.cards().all(|card| !card.name.is_empty() && !card.description.is_empty()));

        let height = |kind| catalog.unit(kind).unwrap().vertical_offset;
        assert_eq!(height(UnitKind::Tower), Fixed::from_num(1.5));
        assert_eq!(height(UnitKind::Pekka), Fixed::from_num(1.5));
        assert_eq!(height(UnitKind::Prince), Fixed::from_num(0.7));
        assert_eq!(height(UnitKind::HogRider), Fixed::from_num(0.4));
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in UnitKind::ALL {
            assert_eq!(UnitKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(UnitKind::from_name("dragon_rider"), None);
    }

    #[test]
    fn test_target_class_accepts() {
        assert!(TargetClass::Ground.accepts(false));
        assert!(!TargetClass::Ground.accepts(true));
        assert!(TargetClass::Air.accepts(true));
        assert!(!TargetClass::Air.accepts(false));
        assert!(TargetClass::Both.accepts(true));
        assert!(TargetClass::Both.accepts(false));
    }

    #[test]
    fn test_duplicate_rows_rejected() {
        let units = "[(kind: knight, max_hp: 1.0, attack_damage: 1.0), (kind: knight, max_hp: 2.0, attack_damage: 1.0)]";
        let err = Catalog::from_ron_strs(units, "[]").unwrap_err();
        assert!(matches!(err, GameError::DataParseError { .. }));
    }

    #[test]
    fn test_validate_reports_problems() {
        let units = r"[
            (kind: knight, max_hp: 10.0, attack_damage: 1.0, attack_range: 3.0,
             detection_range: 2.0, attack_speed: 5, movement_speed: 0.1),
            (kind: cannon, max_hp: 10.0, attack_damage: 1.0, attack_range: 1.0,
             detection_range: 1.0, attack_speed: 5, movement_speed: 0.1, is_building: true),
        ]";
        let cards = "[(kind: knight, cost: 3), (kind: zap, cost: 2, is_spell: true)]";
        let catalog = Catalog::from_ron_strs(units, cards).unwrap();
        let problems = catalog.validate();

        assert!(problems.iter().any(|p| p.contains("detection range")));
        assert!(problems.iter().any(|p| p.contains("building 'cannon'")));
        assert!(problems.iter().any(|p| p.contains("card 'zap'")));
        assert!(problems.iter().any(|p| p.contains("'tower' is missing")));
    }

    #[test]
    fn test_deck_rules() {
        let catalog = Catalog::standard().unwrap();
        assert_eq!(Deck::quick(&catalog).unwrap().cards().len(), DECK_SIZE);

        let short = Deck::new(vec![UnitKind::Knight], &catalog);
        assert!(matches!(short, Err(GameError::InvalidDeck(_))));

        let mut cards = Deck::quick(&catalog).unwrap().cards().to_vec();
        cards[7] = UnitKind::Knight;
        assert!(matches!(
            Deck::new(cards.clone(), &catalog),
            Err(GameError::InvalidDeck(_))
        ));

        cards[7] = UnitKind::Tower;
        assert!(matches!(
            Deck::new(cards, &catalog),
            Err(GameError::InvalidDeck(_))
        ));
    }
}
