//! Match metrics collection for balance analysis.
//!
//! A [`MetricsCollector`] watches the events a match produces and the
//! plays each side makes, then folds them into a [`GameMetrics`] record.
//! [`BatchSummary`] aggregates many records.

use std::collections::HashMap;

use arena_core::events::dispatch;
use arena_core::prelude::*;
use serde::{Deserialize, Serialize};

/// Complete metrics for a single match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameMetrics {
    /// Unique game identifier.
    pub game_id: String,
    /// Scenario name.
    pub scenario: String,
    /// Random seed used.
    pub seed: u64,
    /// Total match duration in ticks.
    pub duration_ticks: u64,
    /// Winning team (None = draw or unfinished).
    pub winner: Option<Team>,
    /// How the match ended: `king_destroyed`, `timeout` or `max_ticks`.
    pub win_condition: String,
    /// Surviving crown towers, player first.
    pub crown_towers: [u32; 2],
    /// Player-side metrics.
    pub player: TeamMetrics,
    /// Enemy-side metrics.
    pub enemy: TeamMetrics,
    /// Notifications seen, by category.
    pub event_counts: HashMap<EventKind, u32>,
    /// Final simulation state hash (for determinism validation).
    pub final_state_hash: u64,
}

impl GameMetrics {
    /// Create a new game metrics instance.
    #[must_use]
    pub fn new(game_id: impl Into<String>, scenario: impl Into<String>, seed: u64) -> Self {
        Self {
            game_id: game_id.into(),
            scenario: scenario.into(),
            seed,
            ..Default::default()
        }
    }

    /// Metrics of one team.
    #[must_use]
    pub fn team(&self, team: Team) -> &TeamMetrics {
        match team {
            Team::Player => &self.player,
            Team::Enemy => &self.enemy,
        }
    }

    /// Mutable metrics of one team.
    pub fn team_mut(&mut self, team: Team) -> &mut TeamMetrics {
        match team {
            Team::Player => &mut self.player,
            Team::Enemy => &mut self.enemy,
        }
    }

    /// Finalize the match with its outcome.
    pub fn finalize(&mut self, duration: u64, outcome: Option<&MatchOutcome>) {
        self.duration_ticks = duration;
        match outcome {
            Some(outcome) => {
                self.winner = outcome.winner;
                self.crown_towers = outcome.crown_towers;
                self.win_condition = match outcome.reason {
                    EndReason::KingDestroyed => "king_destroyed",
                    EndReason::Timeout => "timeout",
                }
                .to_string();
            }
            None => {
                self.winner = None;
                self.win_condition = "max_ticks".to_string();
            }
        }
    }
}

/// Metrics for one side of a match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamMetrics {
    // === Cards ===
    /// Cards played, by kind name.
    pub cards_played: HashMap<String, u32>,
    /// Spells among them.
    pub spells_cast: u32,
    /// Elixir spent on accepted plays.
    pub elixir_spent: u32,
    /// Plays the simulation refused.
    pub rejected_plays: u32,

    // === Combat ===
    /// Own entities destroyed.
    pub units_lost: u32,
    /// Enemy entities destroyed.
    pub kills: u32,
    /// Enemy crown towers destroyed, king included.
    pub towers_destroyed: u32,
    /// Hit points removed from enemies.
    pub damage_dealt: f64,
    /// Hit points lost, decay included.
    pub damage_taken: f64,
    /// Kill/death ratio.
    pub kd_ratio: f64,

    // === Timing ===
    /// Tick of the side's first attack.
    pub first_attack_tick: Option<u64>,
}

impl TeamMetrics {
    /// Record an accepted card play.
    pub fn record_play(&mut self, card: UnitKind, cost: u32, is_spell: bool) {
        *self.cards_played.entry(card.name().to_string()).or_default() += 1;
        self.elixir_spent += cost;
        if is_spell {
            self.spells_cast += 1;
        }
    }

    /// Total cards played.
    #[must_use]
    pub fn total_plays(&self) -> u32 {
        self.cards_played.values().sum()
    }

    /// Calculate final stats.
    ///
    /// A flawless side reports its kill count as the ratio, which keeps the
    /// value finite for JSON.
    pub fn calculate_derived_stats(&mut self) {
        self.kd_ratio = f64::from(self.kills) / f64::from(self.units_lost.max(1));
    }
}

/// Summary statistics across multiple matches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total matches played.
    pub total_games: u32,
    /// Matches won by each team.
    pub wins_by_team: HashMap<Team, u32>,
    /// Win rates by team.
    pub win_rates: HashMap<Team, f64>,
    /// Draws count.
    pub draws: u32,
    /// Matches decided by a king falling.
    pub king_kills: u32,
    /// Matches decided on the clock.
    pub timeouts: u32,
    /// Matches cut off before a result.
    pub unfinished: u32,
    /// Average match duration in ticks.
    pub avg_duration_ticks: f64,
    /// Shortest match.
    pub min_duration_ticks: u64,
    /// Longest match.
    pub max_duration_ticks: u64,

    // === Aggregated Stats ===
    /// Average cards played per match by team.
    pub avg_plays: HashMap<Team, f64>,
    /// Average elixir spent per match by team.
    pub avg_elixir_spent: HashMap<Team, f64>,
    /// Average K/D ratio by team.
    pub avg_kd_ratio: HashMap<Team, f64>,
    /// Average first attack tick by team.
    pub avg_first_attack_tick: HashMap<Team, f64>,
}

impl BatchSummary {
    /// Calculate summary from a list of game metrics.
    #[must_use]
    pub fn from_games(games: &[GameMetrics]) -> Self {
        if games.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            total_games: games.len() as u32,
            min_duration_ticks: u64::MAX,
            ..Default::default()
        };

        let mut duration_sum = 0u64;
        let mut plays: HashMap<Team, Vec<u32>> = HashMap::new();
        let mut elixir: HashMap<Team, Vec<u32>> = HashMap::new();
        let mut kd: HashMap<Team, Vec<f64>> = HashMap::new();
        let mut first_attack: HashMap<Team, Vec<u64>> = HashMap::new();

        for game in games {
            duration_sum += game.duration_ticks;
            summary.min_duration_ticks = summary.min_duration_ticks.min(game.duration_ticks);
            summary.max_duration_ticks = summary.max_duration_ticks.max(game.duration_ticks);

            match game.win_condition.as_str() {
                "king_destroyed" => summary.king_kills += 1,
                "timeout" => summary.timeouts += 1,
                _ => summary.unfinished += 1,
            }
            match game.winner {
                Some(team) => *summary.wins_by_team.entry(team).or_default() += 1,
                None => summary.draws += 1,
            }

            for team in Team::BOTH {
                let side = game.team(team);
                plays.entry(team).or_default().push(side.total_plays());
                elixir.entry(team).or_default().push(side.elixir_spent);
                kd.entry(team).or_default().push(side.kd_ratio);
                if let Some(tick) = side.first_attack_tick {
                    first_attack.entry(team).or_default().push(tick);
                }
            }
        }

        summary.avg_duration_ticks = duration_sum as f64 / games.len() as f64;

        for (team, wins) in &summary.wins_by_team {
            summary
                .win_rates
                .insert(*team, f64::from(*wins) / f64::from(summary.total_games));
        }

        for (team, values) in plays {
            let avg = f64::from(values.iter().sum::<u32>()) / values.len() as f64;
            summary.avg_plays.insert(team, avg);
        }

        for (team, values) in elixir {
            let avg = f64::from(values.iter().sum::<u32>()) / values.len() as f64;
            summary.avg_elixir_spent.insert(team, avg);
        }

        for (team, values) in kd {
            let avg = values.iter().sum::<f64>() / values.len() as f64;
            summary.avg_kd_ratio.insert(team, avg);
        }

        for (team, values) in first_attack {
            let avg = values.iter().sum::<u64>() as f64 / values.len() as f64;
            summary.avg_first_attack_tick.insert(team, avg);
        }

        summary
    }

    /// Win rate of a team, zero if it never won.
    #[must_use]
    pub fn win_rate(&self, team: Team) -> f64 {
        self.win_rates.get(&team).copied().unwrap_or(0.0)
    }

    /// Check if the sides are within `threshold` of an even split.
    #[must_use]
    pub fn is_balanced(&self, threshold: f64) -> bool {
        self.win_rates
            .values()
            .all(|rate| (rate - 0.5).abs() <= threshold)
    }

    /// Get the dominant team (if any).
    #[must_use]
    pub fn dominant_team(&self, threshold: f64) -> Option<Team> {
        Team::BOTH
            .into_iter()
            .find(|team| self.win_rate(*team) > 0.5 + threshold)
    }
}

/// Metrics collector that tracks events during a match.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    /// Current match metrics.
    metrics: GameMetrics,
    /// Current tick.
    current_tick: u64,
    /// Owner of every entity seen so far. Ids are never reused.
    owners: HashMap<EntityId, Team>,
}

impl MetricsCollector {
    /// Create a new metrics collector.
    #[must_use]
    pub fn new(game_id: &str, scenario: &str, seed: u64) -> Self {
        Self {
            metrics: GameMetrics::new(game_id, scenario, seed),
            ..Default::default()
        }
    }

    /// Learn the owners of entities that exist without a spawn event,
    /// such as towers and scripted placements.
    pub fn watch(&mut self, sim: &Simulation) {
        for entity in sim.render_view() {
            self.owners.insert(entity.id, entity.team);
        }
    }

    /// Update the current tick.
    pub fn set_tick(&mut self, tick: u64) {
        self.current_tick = tick;
    }

    /// Record an accepted card play.
    pub fn on_play(&mut self, team: Team, card: UnitKind, cost: u32, is_spell: bool) {
        self.metrics.team_mut(team).record_play(card, cost, is_spell);
    }

    /// Record a refused card play.
    pub fn on_rejected(&mut self, team: Team) {
        self.metrics.team_mut(team).rejected_plays += 1;
    }

    /// Fold a batch of notifications into the metrics.
    pub fn observe(&mut self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::Spawned { entity, team, .. } => {
                    self.owners.insert(*entity, *team);
                }
                GameEvent::Damaged {
                    target,
                    source,
                    amount,
                    cause,
                } => self.on_damage(*target, *source, *amount, *cause),
                GameEvent::Destroyed { kind, team, .. } => {
                    self.metrics.team_mut(*team).units_lost += 1;
                    let victor = self.metrics.team_mut(team.opponent());
                    victor.kills += 1;
                    if matches!(kind, UnitKind::Tower | UnitKind::KingTower) {
                        victor.towers_destroyed += 1;
                    }
                }
                _ => {}
            }
        }
        dispatch(events, self);
    }

    fn on_damage(
        &mut self,
        target: EntityId,
        source: Option<EntityId>,
        amount: Fixed,
        cause: DamageCause,
    ) {
        let Some(&victim) = self.owners.get(&target) else {
            return;
        };
        let amount: f64 = amount.to_num();
        self.metrics.team_mut(victim).damage_taken += amount;
        if cause == DamageCause::Decay {
            return;
        }
        // Spells carry no source; they only ever hit the caster's opponent.
        let dealer = source
            .and_then(|id| self.owners.get(&id).copied())
            .unwrap_or(victim.opponent());
        if dealer != victim {
            self.metrics.team_mut(dealer).damage_dealt += amount;
        }
    }

    /// Finalize and return the metrics.
    #[must_use]
    pub fn finalize(
        mut self,
        outcome: Option<&MatchOutcome>,
        final_state_hash: u64,
    ) -> GameMetrics {
        self.metrics.finalize(self.current_tick, outcome);
        self.metrics.final_state_hash = final_state_hash;
        self.metrics.player.calculate_derived_stats();
        self.metrics.enemy.calculate_derived_stats();
        self.metrics
    }

    /// Get current metrics (immutable).
    #[must_use]
    pub fn current(&self) -> &GameMetrics {
        &self.metrics
    }
}

impl EventSink for MetricsCollector {
    fn on_entity_event(&mut self, kind: EventKind, entity: Option<EntityId>) {
        *self.metrics.event_counts.entry(kind).or_default() += 1;

        if kind == EventKind::Attack {
            let Some(team) = entity.and_then(|id| self.owners.get(&id).copied()) else {
                return;
            };
            let tick = self.current_tick;
            self.metrics
                .team_mut(team)
                .first_attack_tick
                .get_or_insert(tick);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_test_utils::fixtures::duel;

    #[test]
    fn test_game_metrics_new() {
        let metrics = GameMetrics::new("game_001", "duel", 12345);
        assert_eq!(metrics.game_id, "game_001");
        assert_eq!(metrics.seed, 12345);
    }

    #[test]
    fn test_team_metrics_recording() {
        let mut side = TeamMetrics::default();
        side.record_play(UnitKind::Knight, 3, false);
        side.record_play(UnitKind::Knight, 3, false);
        side.record_play(UnitKind::Zap, 2, true);

        assert_eq!(side.cards_played.get("knight"), Some(&2));
        assert_eq!(side.total_plays(), 3);
        assert_eq!(side.elixir_spent, 8);
        assert_eq!(side.spells_cast, 1);
    }

    #[test]
    fn test_kd_ratio_calculation() {
        let mut side = TeamMetrics {
            kills: 2,
            units_lost: 1,
            ..Default::default()
        };
        side.calculate_derived_stats();

        assert!((side.kd_ratio - 2.0).abs() < 0.001);
    }

    #[test]
    fn test_batch_summary() {
        let mut game1 = GameMetrics::new("g1", "test", 1);
        game1.finalize(
            1000,
            Some(&MatchOutcome {
                winner: Some(Team::Player),
                reason: EndReason::KingDestroyed,
                tick: 1000,
                crown_towers: [3, 0],
            }),
        );

        let mut game2 = GameMetrics::new("g2", "test", 2);
        game2.finalize(
            2000,
            Some(&MatchOutcome {
                winner: None,
                reason: EndReason::Timeout,
                tick: 2000,
                crown_towers: [2, 2],
            }),
        );

        let summary = BatchSummary::from_games(&[game1, game2]);

        assert_eq!(summary.total_games, 2);
        assert_eq!(summary.wins_by_team.get(&Team::Player), Some(&1));
        assert_eq!(summary.draws, 1);
        assert_eq!(summary.king_kills, 1);
        assert_eq!(summary.timeouts, 1);
        assert_eq!(summary.min_duration_ticks, 1000);
        assert!((summary.avg_duration_ticks - 1500.0).abs() < 0.001);
    }

    #[test]
    fn test_balance_check() {
        let mut summary = BatchSummary::default();
        summary.win_rates.insert(Team::Player, 0.52);
        summary.win_rates.insert(Team::Enemy, 0.48);

        assert!(summary.is_balanced(0.1));
        assert!(!summary.is_balanced(0.01));
        assert_eq!(summary.dominant_team(0.01), Some(Team::Player));
        assert_eq!(summary.dominant_team(0.1), None);
    }

    #[test]
    fn test_collector_follows_a_duel() {
        let (mut sim, _knight, goblin) = duel();
        let mut collector = MetricsCollector::new("duel", "duel", 0);
        collector.watch(&sim);

        while sim.entity(goblin).is_some() {
            let events = sim.tick().unwrap();
            collector.set_tick(events.tick);
            collector.observe(&events.events);
        }

        let metrics = collector.finalize(sim.outcome().as_ref(), sim.state_hash());
        assert_eq!(metrics.player.first_attack_tick, Some(1));
        assert_eq!(metrics.player.kills, 1);
        assert_eq!(metrics.enemy.units_lost, 1);
        assert!(metrics.player.damage_dealt >= 25.0);
        assert_eq!(metrics.win_condition, "max_ticks");
        assert_eq!(metrics.event_counts.get(&EventKind::Destroy), Some(&1));
    }
}
