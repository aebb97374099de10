//! Proptest strategies for simulation inputs.
//!
//! These generate random but reproducible placements and commands for
//! property-based testing.

use arena_core::prelude::*;
use proptest::prelude::*;

/// A unit placed directly into a simulation.
#[derive(Debug, Clone, Copy)]
pub struct Placement {
    /// Owning team.
    pub team: Team,
    /// Unit kind (never a spell or a crown tower).
    pub kind: UnitKind,
    /// Where it stands.
    pub position: Vec3Fixed,
}

/// Kinds that exist as entities on the field.
const FIELD_KINDS: [UnitKind; 24] = [
    UnitKind::Knight,
    UnitKind::Archer,
    UnitKind::Giant,
    UnitKind::HogRider,
    UnitKind::Cannon,
    UnitKind::Tesla,
    UnitKind::InfernoTower,
    UnitKind::Xbow,
    UnitKind::Mortar,
    UnitKind::Dragon,
    UnitKind::Balloon,
    UnitKind::Minion,
    UnitKind::Valkyrie,
    UnitKind::Wizard,
    UnitKind::Bomber,
    UnitKind::Musketeer,
    UnitKind::Witch,
    UnitKind::Pekka,
    UnitKind::Minipekka,
    UnitKind::Prince,
    UnitKind::Barbarian,
    UnitKind::Goblin,
    UnitKind::Skeleton,
    UnitKind::RoyalGiant,
];

/// Spell kinds.
const SPELL_KINDS: [UnitKind; 5] = [
    UnitKind::Fireball,
    UnitKind::Arrows,
    UnitKind::Lightning,
    UnitKind::Zap,
    UnitKind::Rocket,
];

/// Either team.
pub fn arb_team() -> impl Strategy<Value = Team> {
    prop_oneof![Just(Team::Player), Just(Team::Enemy)]
}

/// A troop or building kind.
pub fn arb_field_kind() -> impl Strategy<Value = UnitKind> {
    proptest::sample::select(FIELD_KINDS.to_vec())
}

/// A spell kind.
pub fn arb_spell_kind() -> impl Strategy<Value = UnitKind> {
    proptest::sample::select(SPELL_KINDS.to_vec())
}

/// A coordinate in tenths, converted exactly to fixed-point.
pub fn arb_coordinate(half_extent: i32) -> impl Strategy<Value = Fixed> {
    (-half_extent * 10..=half_extent * 10).prop_map(|tenths| Fixed::from_num(tenths) / 10)
}

/// A ground point anywhere on the standard field.
pub fn arb_field_point() -> impl Strategy<Value = Vec3Fixed> {
    (arb_coordinate(10), arb_coordinate(15)).prop_map(|(x, z)| Vec3Fixed::new(x, Fixed::ZERO, z))
}

/// A placement on the owning team's half.
pub fn arb_placement() -> impl Strategy<Value = Placement> {
    (arb_team(), arb_field_kind(), arb_coordinate(9), 1i32..=120).prop_map(
        |(team, kind, x, depth_tenths)| {
            let z = Fixed::from_num(depth_tenths) / 10 * team.home_sign();
            Placement {
                team,
                kind,
                position: Vec3Fixed::new(x, Fixed::ZERO, z),
            }
        },
    )
}

/// Up to `max` placements.
pub fn arb_placements(max: usize) -> impl Strategy<Value = Vec<Placement>> {
    proptest::collection::vec(arb_placement(), 0..=max)
}
