//! Deterministic pseudo-random sequence.
//!
//! Every engine owns its own [`Sequence`], seeded from a hash of the record
//! text, so two engines built from the same record draw the same numbers in
//! the same order. Scheduling draws from no other source of randomness.

/// FNV-1a, 64 bit.
pub fn hash_text(text: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    text.bytes()
        .fold(OFFSET, |h, b| (h ^ b as u64).wrapping_mul(PRIME))
}

#[derive(Debug)]
pub struct Sequence {
    rng: fastrand::Rng,
}

impl Sequence {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Uniform index in `[0, n)`. `n` must be non-zero.
    pub fn below(&mut self, n: usize) -> usize {
        self.rng.usize(..n)
    }

    /// A random sort key, used as the last tie-break.
    pub fn key(&mut self) -> u32 {
        self.rng.u32(..)
    }
}
