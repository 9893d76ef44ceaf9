//! Random number source used by the banter scheduler.
//!
//! The engine only needs a uniform integer in an inclusive range, so the
//! trait is that one method. Tests inject a scripted source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform integer source.
pub trait RandomSource: Send {
    /// A uniformly distributed integer in `low..=high`. Callers guarantee
    /// `low <= high`.
    fn int_inclusive(&mut self, low: u32, high: u32) -> u32;
}

/// [`RandomSource`] backed by `rand`'s standard generator.
#[derive(Debug, Clone)]
pub struct StdRandom(StdRng);

impl StdRandom {
    /// Seeded from operating-system entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }

    /// Deterministic generator for replays and tests.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl Default for StdRandom {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl RandomSource for StdRandom {
    fn int_inclusive(&mut self, low: u32, high: u32) -> u32 {
        self.0.gen_range(low..=high)
    }
}

impl<F> RandomSource for F
where
    F: FnMut(u32, u32) -> u32 + Send,
{
    fn int_inclusive(&mut self, low: u32, high: u32) -> u32 {
        self(low, high)
    }
}
