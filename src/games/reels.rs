//! Reel selection
//!
//! Boards are drawn from curated corpora rather than spun per position, so a
//! board taken from the winning corpus always pays and one from the losing
//! corpus never does. The evaluator tests pin both corpora to that rule.

use crate::games::types::{Reels, Symbol};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::{Arc, Mutex};

use Symbol::{Banana, Coconut, Empty, Kong, OneBar, Palm, Sun, ThreeBar, TwoBar};

/// Boards that always pay: every triple plus every ordering of three distinct BARs
pub const WINNING_COMBINATIONS: [Reels; 14] = [
    [Kong, Kong, Kong],
    [Sun, Sun, Sun],
    [Palm, Palm, Palm],
    [Coconut, Coconut, Coconut],
    [Banana, Banana, Banana],
    [ThreeBar, ThreeBar, ThreeBar],
    [TwoBar, TwoBar, TwoBar],
    [OneBar, OneBar, OneBar],
    [OneBar, TwoBar, ThreeBar],
    [ThreeBar, OneBar, TwoBar],
    [TwoBar, ThreeBar, OneBar],
    [OneBar, ThreeBar, TwoBar],
    [TwoBar, OneBar, ThreeBar],
    [ThreeBar, TwoBar, OneBar],
];

/// Boards that never pay
pub const LOSING_COMBINATIONS: [Reels; 20] = [
    // no match
    [Kong, Sun, Palm],
    [Banana, Coconut, OneBar],
    [ThreeBar, Sun, Banana],
    [Palm, Kong, TwoBar],
    [Sun, ThreeBar, Coconut],
    [OneBar, Palm, Kong],
    // empty stops
    [Kong, Empty, Kong],
    [Sun, Empty, Sun],
    [Empty, Kong, Sun],
    [Kong, Sun, Empty],
    [Empty, Empty, Kong],
    [Kong, Empty, Empty],
    [Empty, Empty, Empty],
    [Palm, Empty, Banana],
    [Empty, ThreeBar, Empty],
    // two of three
    [Kong, Kong, Sun],
    [Banana, Palm, Banana],
    [OneBar, TwoBar, OneBar],
    [Sun, Sun, Kong],
    [ThreeBar, Coconut, ThreeBar],
];

/// Source of uniform indices for corpus draws.
///
/// Implementations are shared across concurrent spins and must be safe to
/// call from many tasks at once.
pub trait RandomSource: Send + Sync {
    /// Uniform index in `0..upper`. `upper` is never zero.
    fn pick(&self, upper: usize) -> usize;
}

/// `StdRng` behind a mutex
pub struct SharedRng {
    inner: Mutex<StdRng>,
}

impl SharedRng {
    /// Seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self {
            inner: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic sequence, for tests and replays
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SharedRng {
    fn pick(&self, upper: usize) -> usize {
        // A poisoned lock still holds a usable generator
        let mut rng = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.gen_range(0..upper)
    }
}

/// Draws winning and losing boards
#[derive(Clone)]
pub struct ReelGenerator {
    source: Arc<dyn RandomSource>,
}

impl ReelGenerator {
    pub fn new(source: Arc<dyn RandomSource>) -> Self {
        Self { source }
    }

    /// Generator over a fresh entropy-seeded source
    pub fn from_entropy() -> Self {
        Self::new(Arc::new(SharedRng::from_entropy()))
    }

    /// A board guaranteed to win
    pub fn generate_winning_reels(&self) -> Reels {
        WINNING_COMBINATIONS[self.source.pick(WINNING_COMBINATIONS.len())]
    }

    /// A board guaranteed to lose
    pub fn generate_losing_reels(&self) -> Reels {
        LOSING_COMBINATIONS[self.source.pick(LOSING_COMBINATIONS.len())]
    }
}

impl Default for ReelGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}
