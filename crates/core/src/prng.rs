//! Deterministic PRNG based on the Xorshift64 algorithm.
//!
//! Used to shuffle the noise permutation table, so that one seed always
//! reproduces the same animation. Pure integer arithmetic, identical output on
//! every platform.

/// Xorshift64 deterministic PRNG with shifts (13, 7, 17).
///
/// A seed of 0 is replaced with a non-zero fallback, since 0 is a fixed point
/// of the algorithm.
#[derive(Debug, Clone)]
pub struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    const FALLBACK_SEED: u64 = 0x5EED_DEAD_BEEF_CAFE;

    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { Self::FALLBACK_SEED } else { seed },
        }
    }

    /// Advances the state and returns the next 64-bit value.
    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// Returns a uniformly distributed f64 in [0, 1) from the upper 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Returns an index in `[0, bound)`.
    ///
    /// Scales a unit float rather than taking a modulus, matching the
    /// `floor(random() * bound)` idiom of an unbiased Fisher–Yates draw.
    ///
    /// # Panics
    ///
    /// Panics if `bound` is 0.
    pub fn next_index(&mut self, bound: usize) -> usize {
        assert!(bound > 0, "next_index bound must be non-zero");
        ((self.next_f64() * bound as f64) as usize).min(bound - 1)
    }

    /// Shuffles `items` in place with a Fisher–Yates pass from the back.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_index(i + 1);
            items.swap(i, j);
        }
    }
}
