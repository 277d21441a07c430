//! Wait-time statistics accumulator
//!
//! Running count/min/max/sum over one aggregation window, reset after each
//! summary emission.

use crate::types::Tick;

/// Window accumulator for High's measured wait ticks
#[derive(Debug, Clone)]
pub struct WaitStats {
    count: u32,
    min: Tick,
    max: Tick,
    sum: u64,
}

impl WaitStats {
    pub const fn new() -> Self {
        WaitStats {
            count: 0,
            min: Tick::MAX,
            max: 0,
            sum: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = WaitStats::new();
    }

    pub fn add(&mut self, value: Tick) {
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
        self.sum += value as u64;
        self.count += 1;
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Minimum observed; `Tick::MAX` while empty
    #[inline]
    pub fn min(&self) -> Tick {
        self.min
    }

    #[inline]
    pub fn max(&self) -> Tick {
        self.max
    }

    /// Integer mean of the window; 0 while empty
    pub fn avg(&self) -> Tick {
        if self.count == 0 {
            0
        } else {
            (self.sum / self.count as u64) as Tick
        }
    }
}

impl Default for WaitStats {
    fn default() -> Self {
        Self::new()
    }
}
