//! Deterministic random number generation for combat rolls.
//!
//! ## Key Features
//!
//! - **Deterministic**: same seed produces the identical battle
//! - **Serializable**: O(1) state capture and restore for snapshots
//! - **Context streams**: independent sequences for separate concerns
//!   (critical rolls vs random targeting) so adding a random policy does not
//!   shift the crit sequence
//!
//! ```
//! use charge_battle::core::CombatRng;
//!
//! let mut a = CombatRng::new(7);
//! let mut b = CombatRng::new(7);
//! assert_eq!(a.roll(0.5), b.roll(0.5));
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Deterministic RNG backed by ChaCha8.
#[derive(Clone, Debug)]
pub struct CombatRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl CombatRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Create an independent stream for a specific context.
    ///
    /// The same context always produces the same stream from the same seed.
    /// Stream seeds use `FxHasher`, whose output is fixed across toolchains.
    #[must_use]
    pub fn for_context(&self, context: &str) -> Self {
        let mut hasher = FxHasher::default();
        self.seed.hash(&mut hasher);
        context.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Seed this stream was created from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return true with the given probability.
    ///
    /// Probabilities are clamped to `0.0..=1.0`; `0.0` never consumes a
    /// "true" and `1.0` always succeeds.
    pub fn roll(&mut self, probability: f64) -> bool {
        if probability <= 0.0 {
            return false;
        }
        if probability >= 1.0 {
            return true;
        }
        self.inner.gen_bool(probability)
    }

    /// Generate a random usize in the given range.
    pub fn gen_range_usize(&mut self, range: std::ops::Range<usize>) -> usize {
        self.inner.gen_range(range)
    }

    /// Choose a random element from a slice.
    #[must_use]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.inner)
    }

    /// Get the current state for serialization.
    #[must_use]
    pub fn state(&self) -> CombatRngState {
        CombatRngState {
            seed: self.seed,
            word_pos: self.inner.get_word_pos(),
        }
    }

    /// Restore from a saved state.
    #[must_use]
    pub fn from_state(state: &CombatRngState) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(state.seed);
        inner.set_word_pos(state.word_pos);
        Self {
            inner,
            seed: state.seed,
        }
    }
}

/// Serializable RNG state for checkpointing.
///
/// Uses the ChaCha8 word position, so capture is O(1) regardless of how many
/// rolls have been made.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatRngState {
    /// Original seed
    pub seed: u64,
    /// ChaCha8 word position (128-bit counter)
    pub word_pos: u128,
}

/// The streams a battle draws from.
///
/// Critical and passive rolls use `combat`; random target picks use
/// `targeting`. Both are captured by `state`, so a restored battle continues
/// exactly where the original left off.
#[derive(Clone, Debug)]
pub struct BattleRng {
    pub combat: CombatRng,
    pub targeting: CombatRng,
}

impl BattleRng {
    /// Derive both streams from one battle seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let root = CombatRng::new(seed);
        Self {
            combat: root.for_context("combat"),
            targeting: root.for_context("targeting"),
        }
    }

    #[must_use]
    pub fn state(&self) -> BattleRngState {
        BattleRngState {
            combat: self.combat.state(),
            targeting: self.targeting.state(),
        }
    }

    #[must_use]
    pub fn from_state(state: &BattleRngState) -> Self {
        Self {
            combat: CombatRng::from_state(&state.combat),
            targeting: CombatRng::from_state(&state.targeting),
        }
    }
}

/// Serializable state of both battle streams.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleRngState {
    pub combat: CombatRngState,
    pub targeting: CombatRngState,
}
