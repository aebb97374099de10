//! Wall-clock scheduling of a match.
//!
//! A [`Session`] drives a [`Simulation`] with two independent timers: the
//! fast tick timer and the one-second battle clock. Time is supplied by the
//! caller in milliseconds, so the same schedule replays identically in
//! tests, in the headless runner and behind a real event loop.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::events::GameEvent;
use crate::simulation::Simulation;
use crate::victory::GamePhase;

/// Battle clock period.
pub const CLOCK_INTERVAL_MS: u64 = 1000;

/// A repeating deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalTimer {
    period_ms: u64,
    next_ms: u64,
    running: bool,
}

impl IntervalTimer {
    /// A stopped timer with the given period (at least 1 ms).
    #[must_use]
    pub fn new(period_ms: u64) -> Self {
        Self {
            period_ms: period_ms.max(1),
            next_ms: 0,
            running: false,
        }
    }

    /// Start counting from `now_ms`; the first firing is one period later.
    pub fn start(&mut self, now_ms: u64) {
        self.next_ms = now_ms.saturating_add(self.period_ms);
        self.running = true;
    }

    /// Stop the timer. Stopping a stopped timer does nothing.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Whether the timer is running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Period in milliseconds.
    #[must_use]
    pub const fn period_ms(&self) -> u64 {
        self.period_ms
    }

    /// Next firing time, if running.
    #[must_use]
    pub fn deadline(&self) -> Option<u64> {
        self.running.then_some(self.next_ms)
    }

    /// Advance to the next deadline. A timer whose next deadline would
    /// pass the end of the millisecond range stops.
    fn fire(&mut self) {
        match self.next_ms.checked_add(self.period_ms) {
            Some(next) => self.next_ms = next,
            None => self.running = false,
        }
    }
}

/// A simulation paired with its tick and clock timers.
#[derive(Debug, Clone)]
pub struct Session {
    sim: Simulation,
    tick_timer: IntervalTimer,
    clock_timer: IntervalTimer,
    now_ms: u64,
}

impl Session {
    /// Wrap a simulation. Timers stay stopped until [`start`](Self::start).
    #[must_use]
    pub fn new(sim: Simulation) -> Self {
        let tick_ms = u64::from(sim.config().tick_interval_ms());
        Self {
            sim,
            tick_timer: IntervalTimer::new(tick_ms),
            clock_timer: IntervalTimer::new(CLOCK_INTERVAL_MS),
            now_ms: 0,
        }
    }

    /// Start the battle and both timers.
    ///
    /// # Errors
    ///
    /// Propagates [`Simulation::start_battle`] failures.
    pub fn start(&mut self) -> Result<()> {
        self.sim.start_battle()?;
        self.tick_timer.start(self.now_ms);
        self.clock_timer.start(self.now_ms);
        Ok(())
    }

    /// Stop both timers. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.tick_timer.stop();
        self.clock_timer.stop();
    }

    /// Let `elapsed_ms` of wall time pass.
    ///
    /// Every timer deadline inside the window fires in time order; when
    /// both fall on the same instant the tick runs first. Both timers stop
    /// as soon as the match ends, so later deadlines in the window are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Propagates a failed tick. Time stops at the failing deadline.
    pub fn advance(&mut self, elapsed_ms: u64) -> Result<Vec<GameEvent>> {
        let until = self.now_ms.saturating_add(elapsed_ms);
        let mut events = Vec::new();

        loop {
            let tick_due = self.tick_timer.deadline().filter(|&t| t <= until);
            let clock_due = self.clock_timer.deadline().filter(|&t| t <= until);

            let (at_ms, is_tick) = match (tick_due, clock_due) {
                (None, None) => break,
                (Some(t), Some(c)) if t <= c => (t, true),
                (Some(t), None) => (t, true),
                (_, Some(c)) => (c, false),
            };
            self.now_ms = at_ms;

            if is_tick {
                self.tick_timer.fire();
                events.extend(self.sim.tick()?.events);
            } else {
                self.clock_timer.fire();
                if let Some(outcome) = self.sim.advance_clock() {
                    events.push(GameEvent::MatchEnded(outcome));
                }
            }

            if self.sim.phase() == GamePhase::Ended {
                self.stop();
            }
        }

        self.now_ms = until;
        Ok(events)
    }

    /// Milliseconds elapsed since the session was created.
    #[must_use]
    pub const fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Whether either timer is still running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.tick_timer.is_running() || self.clock_timer.is_running()
    }

    /// The wrapped simulation.
    #[must_use]
    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Mutable access for deployments between timer firings.
    pub fn simulation_mut(&mut self) -> &mut Simulation {
        &mut self.sim
    }

    /// Unwrap the simulation.
    #[must_use]
    pub fn into_simulation(self) -> Simulation {
        self.sim
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::victory::EndReason;

    fn session(duration_secs: u32) -> Session {
        let mut config = SimConfig::default();
        config.ai.enabled = false;
        config.battle_duration_secs = duration_secs;
        Session::new(Simulation::new(config).unwrap())
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut timer = IntervalTimer::new(100);
        timer.stop();
        assert!(!timer.is_running());
        timer.start(0);
        assert_eq!(timer.deadline(), Some(100));
        timer.stop();
        timer.stop();
        assert_eq!(timer.deadline(), None);
    }

    #[test]
    fn test_ticks_follow_elapsed_time() {
        let mut s = session(180);
        s.start().unwrap();
        s.advance(250).unwrap();
        assert_eq!(s.simulation().current_tick(), 2);
        s.advance(750).unwrap();
        assert_eq!(s.simulation().current_tick(), 10);
        assert_eq!(s.simulation().seconds_remaining(), 179);
        assert_eq!(s.now_ms(), 1000);
    }

    #[test]
    fn test_nothing_fires_before_start() {
        let mut s = session(180);
        assert!(s.advance(5000).unwrap().is_empty());
        assert_eq!(s.simulation().current_tick(), 0);
        assert!(!s.is_running());
    }

    #[test]
    fn test_timeout_stops_both_timers() {
        let mut s = session(2);
        s.start().unwrap();
        let events = s.advance(10_000).unwrap();

        let outcome = s.simulation().outcome().unwrap();
        assert_eq!(outcome.reason, EndReason::Timeout);
        // The tick sharing the final second's deadline runs before the clock.
        assert_eq!(s.simulation().current_tick(), 20);
        assert!(!s.is_running());
        assert!(matches!(events.last(), Some(GameEvent::MatchEnded(_))));

        s.stop();
        assert!(s.advance(1000).unwrap().is_empty());
    }

    #[test]
    fn test_timer_saturates_at_end_of_time() {
        let mut timer = IntervalTimer::new(10);
        timer.start(u64::MAX - 5);
        assert_eq!(timer.deadline(), Some(u64::MAX));
        timer.fire();
        assert!(!timer.is_running());
    }

    #[test]
    fn test_huge_advance_saturates() {
        let mut s = session(2);
        s.start().unwrap();
        s.advance(500).unwrap();
        let events = s.advance(u64::MAX).unwrap();

        assert_eq!(s.now_ms(), u64::MAX);
        assert_eq!(s.simulation().current_tick(), 20);
        assert!(matches!(events.last(), Some(GameEvent::MatchEnded(_))));
        assert!(s.advance(u64::MAX).unwrap().is_empty());
        assert_eq!(s.now_ms(), u64::MAX);
    }
}
