//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! Batch runs, replays and snapshot restore all assume that a seed plus a
//! command schedule fully determines a match. Sources of non-determinism
//! include:
//!
//! - **Floating-point math**: We use fixed-point arithmetic via
//!   [`arena_core::math::Fixed`] throughout the tick.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   We always iterate in sorted entity ID order.
//!
//! - **Randomness**: The AI draws from a ChaCha generator seeded from the
//!   config and serialized with the simulation.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual rules (targeting, splash, decay)
//! 2. **Property tests**: Random inputs must still produce deterministic outputs
//! 3. **Integration tests**: Full matches are reproducible
//! 4. **Parallel tests**: Running N simulations in parallel all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use arena_core::simulation::Simulation;

/// Distinct values in a list of final hashes, sorted.
fn distinct(hashes: &[u64]) -> Vec<u64> {
    let mut unique = hashes.to_vec();
    unique.sort_unstable();
    unique.dedup();
    unique
}

/// Result of repeated sequential runs of one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether every run ended in the same state.
    pub is_deterministic: bool,
    /// Final state hash of each run.
    pub hashes: Vec<u64>,
    /// Ticks simulated per run.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Distinct final hashes (one for a deterministic match).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        distinct(&self.hashes)
    }

    /// Panic with every hash if the runs diverged.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        assert!(
            self.is_deterministic,
            "match is non-deterministic after {} ticks: {} runs, {} distinct hashes {:?}",
            self.ticks,
            self.hashes.len(),
            self.unique_hashes().len(),
            self.hashes
        );
    }
}

/// Result of copies of one match run side by side on threads.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// Final state hash of each copy.
    pub hashes: Vec<u64>,
    /// Ticks each copy ran.
    pub ticks: u64,
    /// Number of copies.
    pub num_sims: usize,
}

impl ParallelSimResult {
    /// Whether every copy ended in the same state.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Panic with every hash if the copies diverged.
    ///
    /// # Panics
    ///
    /// Panics if the copies produced different hashes.
    pub fn assert_deterministic(&self) {
        assert!(
            self.is_deterministic(),
            "parallel matches diverged after {} ticks: {} copies, {} distinct hashes {:?}",
            self.ticks,
            self.num_sims,
            distinct(&self.hashes).len(),
            self.hashes
        );
    }
}

/// Advance a simulation one tick inside a test harness.
///
/// # Panics
///
/// Panics if the tick reports an invariant violation.
pub fn step(sim: &mut Simulation) {
    if let Err(e) = sim.tick() {
        panic!("tick {} failed: {e}", sim.current_tick());
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one tick
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```ignore
/// use arena_test_utils::determinism::{step, verify_determinism};
///
/// let result = verify_determinism(
///     5,   // Run 5 times
///     100, // 100 ticks each
///     || setup_lane_push(),
///     step,
///     |sim| sim.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Simplified determinism verification for [`Simulation`].
///
/// Runs the simulation twice with identical setup and verifies the final
/// state hashes match exactly.
pub fn verify_simulation_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let result = verify_determinism(2, num_ticks, &setup_fn, step, Simulation::state_hash);
    result.is_deterministic
}

/// Run N simulations on scoped threads and collect final hashes.
///
/// Catches non-determinism that only shows up under thread scheduling or
/// memory layout differences.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_simulations_scoped<F>(
    setup_fn: F,
    num_sims: usize,
    num_ticks: u64,
) -> ParallelSimResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..num_ticks {
                        step(&mut sim);
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });

    ParallelSimResult {
        hashes,
        ticks: num_ticks,
        num_sims,
    }
}

/// Compare two simulation runs tick-by-tick, finding first divergence.
///
/// # Returns
///
/// `None` if simulations are deterministic, `Some(tick)` if they diverge
/// at that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        step(&mut sim1);
        step(&mut sim2);

        if sim1.state_hash() != sim2.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Verify that a serialization round-trip preserves simulation state and
/// that the restored copy keeps evolving identically.
pub fn verify_serialization_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let mut sim = setup_fn();

    for _ in 0..num_ticks {
        step(&mut sim);
    }

    let Ok(bytes) = sim.serialize() else {
        return false;
    };
    let Ok(mut restored) = Simulation::deserialize(&bytes) else {
        return false;
    };

    if restored.state_hash() != sim.state_hash() {
        return false;
    }

    for _ in 0..num_ticks {
        step(&mut sim);
        step(&mut restored);
    }

    restored.state_hash() == sim.state_hash()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{battle, point, quiet_config};
    use arena_core::prelude::*;
    use proptest::prelude::*;

    // =========================================================================
    // Basic determinism tests
    // =========================================================================

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_towers_only_determinism() {
        assert!(verify_simulation_determinism(|| battle(quiet_config()), 100));
    }

    #[test]
    fn test_ai_match_determinism() {
        assert!(verify_simulation_determinism(
            || battle(SimConfig::with_seed(99)),
            600
        ));
    }

    #[test]
    fn test_different_seeds_diverge() {
        let run = |seed| {
            let mut sim = battle(SimConfig::with_seed(seed));
            for _ in 0..200 {
                step(&mut sim);
            }
            sim.state_hash()
        };
        assert_ne!(run(1), run(2));
    }

    #[test]
    fn test_find_divergence_on_deterministic_sim() {
        let divergence = find_first_divergence(setup_lane_push, 300);
        assert!(divergence.is_none(), "Expected no divergence");
    }

    // =========================================================================
    // Serialization round-trip tests
    // =========================================================================

    #[test]
    fn test_serialization_preserves_fresh_battle() {
        assert!(verify_serialization_determinism(
            || battle(quiet_config()),
            0
        ));
    }

    #[test]
    fn test_serialization_preserves_rng_state() {
        assert!(verify_serialization_determinism(
            || battle(SimConfig::with_seed(17)),
            130
        ));
    }

    // =========================================================================
    // Scenario determinism
    // =========================================================================

    fn setup_lane_push() -> Simulation {
        let mut sim = battle(SimConfig::with_seed(4));
        sim.deploy(UnitKind::Giant, point(-5.0, -6.0), Team::Player)
            .unwrap();
        sim.spawn_unit(Team::Player, UnitKind::Wizard, point(-4.0, -7.0))
            .unwrap();
        sim.spawn_unit(Team::Enemy, UnitKind::Valkyrie, point(-5.0, 6.0))
            .unwrap();
        sim.spawn_unit(Team::Enemy, UnitKind::Minion, point(4.0, 5.0))
            .unwrap();
        sim
    }

    #[test]
    fn test_lane_push_determinism() {
        let result = verify_determinism(3, 500, setup_lane_push, step, Simulation::state_hash);
        result.assert_deterministic();
    }

    #[test]
    fn test_parallel_lane_push() {
        let result = run_parallel_simulations_scoped(setup_lane_push, 4, 300);
        result.assert_deterministic();
    }

    proptest! {
        #[test]
        fn prop_random_deployments_are_deterministic(
            placements in crate::strategies::arb_placements(6),
            seed in any::<u64>(),
        ) {
            let setup = move || {
                let mut sim = battle(SimConfig::with_seed(seed));
                for p in &placements {
                    let _ = sim.spawn_unit(p.team, p.kind, p.position);
                }
                sim
            };

            let result = verify_determinism(2, 150, setup, step, Simulation::state_hash);
            prop_assert!(result.is_deterministic);
        }
    }

    // =========================================================================
    // Stress tests (only run explicitly with --ignored)
    // =========================================================================

    #[test]
    #[ignore = "Long-running stress test"]
    fn stress_test_full_length_matches() {
        let result = run_parallel_simulations_scoped(
            || battle(SimConfig::with_seed(1234)),
            8,
            1800,
        );
        result.assert_deterministic();
    }
}
