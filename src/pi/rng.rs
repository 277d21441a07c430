//! Xorshift PRNG for experiment jitter
//!
//! Deterministic, tiny, and good enough to decorrelate iteration timing;
//! not for anything cryptographic.

/// Default seed (Marsaglia's xorshift32 example constant)
pub const DEFAULT_SEED: u32 = 2_463_534_242;

/// Xorshift32 generator
#[derive(Debug, Clone)]
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    /// Create a generator. A zero seed would be a fixed point, so it falls
    /// back to the default.
    pub const fn new(seed: u32) -> Self {
        XorShift32 {
            state: if seed == 0 { DEFAULT_SEED } else { seed },
        }
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform draw from `lo..=hi`; returns `lo` when the range is empty
    pub fn range(&mut self, lo: u32, hi: u32) -> u32 {
        if hi <= lo {
            return lo;
        }
        let span = (hi - lo) + 1;
        lo + self.next_u32() % span
    }

    /// `base` plus a symmetric draw from `-jitter..=+jitter`, clamped to
    /// the `u32` range
    pub fn jittered(&mut self, base: u32, jitter: u32) -> u32 {
        if jitter == 0 {
            return base;
        }
        // Widened so neither the span nor base + delta can overflow.
        let span = 2 * jitter as u64 + 1;
        let delta = (self.next_u32() as u64 % span) as i64 - jitter as i64;
        let value = base as i64 + delta;
        value.clamp(0, u32::MAX as i64) as u32
    }
}
