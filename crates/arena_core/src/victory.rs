//! Match phases and win conditions.
//!
//! Two ways to end a battle:
//! - a king structure is missing from the live set: the other team wins
//!   immediately;
//! - the battle clock runs out: the team with more crown towers standing
//!   wins, equal counts draw.
//!
//! King loss is always checked first, so it beats a timeout that lands in
//! the same step.

use serde::{Deserialize, Serialize};

use crate::components::Team;
use crate::store::EntityStore;

/// Match lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Towers are placed, the clock has not started, ticks are idle.
    #[default]
    Deployment,
    /// Ticks run and the clock counts down.
    Battle,
    /// Terminal. Nothing mutates any more.
    Ended,
}

/// Why the match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// A king structure fell.
    KingDestroyed,
    /// The battle clock reached zero.
    Timeout,
}

/// Terminal result of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// Winning team, `None` for a draw.
    pub winner: Option<Team>,
    /// How the match ended.
    pub reason: EndReason,
    /// Tick at which it ended.
    pub tick: u64,
    /// Surviving crown towers, indexed by [`Team::index`].
    pub crown_towers: [u32; 2],
}

impl MatchOutcome {
    /// Whether nobody won.
    #[must_use]
    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }
}

fn crown_towers(store: &EntityStore) -> [u32; 2] {
    [
        store.crown_tower_count(Team::Player),
        store.crown_tower_count(Team::Enemy),
    ]
}

/// Check both king structures.
///
/// Returns `None` while both stand. If only one is gone the other team
/// wins; if both fell in the same tick the match is a draw.
#[must_use]
pub fn check_kings(store: &EntityStore, tick: u64) -> Option<MatchOutcome> {
    let player_king = store.king_of(Team::Player).is_some();
    let enemy_king = store.king_of(Team::Enemy).is_some();

    let winner = match (player_king, enemy_king) {
        (true, true) => return None,
        (true, false) => Some(Team::Player),
        (false, true) => Some(Team::Enemy),
        (false, false) => None,
    };

    Some(MatchOutcome {
        winner,
        reason: EndReason::KingDestroyed,
        tick,
        crown_towers: crown_towers(store),
    })
}

/// Decide the match when the clock runs out.
///
/// Kings are checked first; otherwise more surviving crown towers wins.
#[must_use]
pub fn resolve_timeout(store: &EntityStore, tick: u64) -> MatchOutcome {
    if let Some(outcome) = check_kings(store, tick) {
        return outcome;
    }

    let counts = crown_towers(store);
    let winner = match counts[0].cmp(&counts[1]) {
        std::cmp::Ordering::Greater => Some(Team::Player),
        std::cmp::Ordering::Less => Some(Team::Enemy),
        std::cmp::Ordering::Equal => None,
    };

    MatchOutcome {
        winner,
        reason: EndReason::Timeout,
        tick,
        crown_towers: counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::UnitKind;
    use crate::math::{Fixed, Vec3Fixed};
    use crate::store::Entity;

    fn tower(team: Team) -> Entity {
        Entity::new(team, UnitKind::Tower, Vec3Fixed::ZERO, Fixed::from_num(300)).crown_tower()
    }

    fn king(team: Team) -> Entity {
        Entity::new(team, UnitKind::KingTower, Vec3Fixed::ZERO, Fixed::from_num(500)).king()
    }

    #[test]
    fn test_both_kings_standing() {
        let mut store = EntityStore::new();
        store.insert(king(Team::Player));
        store.insert(king(Team::Enemy));
        assert!(check_kings(&store, 1).is_none());
    }

    #[test]
    fn test_missing_king_loses() {
        let mut store = EntityStore::new();
        store.insert(king(Team::Player));
        store.insert(tower(Team::Enemy));

        let outcome = check_kings(&store, 42).unwrap();
        assert_eq!(outcome.winner, Some(Team::Player));
        assert_eq!(outcome.reason, EndReason::KingDestroyed);
        assert_eq!(outcome.tick, 42);
    }

    #[test]
    fn test_both_kings_missing_is_draw() {
        let store = EntityStore::new();
        let outcome = check_kings(&store, 3).unwrap();
        assert!(outcome.is_draw());
    }

    #[test]
    fn test_timeout_more_towers_wins() {
        let mut store = EntityStore::new();
        store.insert(king(Team::Player));
        store.insert(tower(Team::Player));
        store.insert(king(Team::Enemy));

        let outcome = resolve_timeout(&store, 1800);
        assert_eq!(outcome.winner, Some(Team::Player));
        assert_eq!(outcome.reason, EndReason::Timeout);
        assert_eq!(outcome.crown_towers, [2, 1]);
    }

    #[test]
    fn test_timeout_equal_towers_draws() {
        let mut store = EntityStore::new();
        store.insert(king(Team::Player));
        store.insert(king(Team::Enemy));
        assert!(resolve_timeout(&store, 1800).is_draw());
    }

    #[test]
    fn test_timeout_defers_to_king_loss() {
        let mut store = EntityStore::new();
        store.insert(king(Team::Player));
        store.insert(tower(Team::Enemy));
        store.insert(tower(Team::Enemy));

        let outcome = resolve_timeout(&store, 1800);
        assert_eq!(outcome.reason, EndReason::KingDestroyed);
        assert_eq!(outcome.winner, Some(Team::Player));
    }
}
