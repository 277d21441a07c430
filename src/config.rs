//! Compile-time configuration
//!
//! All tunables in one place. Experiment timing values are in scheduler
//! ticks; spin factors are loop iterations whose absolute duration is
//! clock-speed dependent and must be recalibrated per target.

use crate::pi::LockMode;

// ============ Protocol ============

/// Receive ring capacity in bytes (must be a power of two)
pub const CFG_RX_RING_SIZE: usize = 128;

/// Streaming parser working buffer; bounds the largest acceptable frame
pub const CFG_MAX_FRAME_LEN: usize = 64;

/// Maximum normalized parameters one command may carry
pub const CFG_MAX_PARAMS: usize = 5;

// ============ Experiment: lock discipline ============

/// Locking discipline for the shared lock, selected at build time
#[cfg(feature = "no-pi")]
pub const CFG_LOCK_MODE: LockMode = LockMode::SemNoPi;
#[cfg(not(feature = "no-pi"))]
pub const CFG_LOCK_MODE: LockMode = LockMode::MutexPi;

/// Per-iteration jitter profile (de-phases the schedule so results are not
/// perfectly periodic lockstep)
pub const CFG_REALISTIC_PROFILE: bool = cfg!(feature = "realistic");

// ============ Experiment: timing knobs ============

/// Ticks Low holds the lock each iteration
pub const CFG_LOW_HOLD_TICKS: u32 = 50;

/// Symmetric jitter band applied to Low's hold when the realistic profile
/// is on (clamped at zero)
pub const CFG_LOW_HOLD_JITTER_TICKS: u32 = 5;

/// High sleeps 0..=this many ticks before kicking Low each iteration
pub const CFG_HIGH_START_JITTER_TICKS: u32 = 3;

/// Medium's busy-loop intensity per spin step
pub const CFG_MEDIUM_SPIN_FACTOR: u32 = 10_000;

/// Realistic profile draws Medium's intensity uniformly from this range
pub const CFG_MEDIUM_SPIN_FACTOR_MIN: u32 = 8_000;
pub const CFG_MEDIUM_SPIN_FACTOR_MAX: u32 = 14_000;

/// Optional CPU work inside Low's critical section (0 disables)
pub const CFG_LOW_CRIT_SPIN_STEPS: u32 = 0;
pub const CFG_LOW_CRIT_SPIN_FACTOR: u32 = 5_000;

/// Iterations before High terminates its loop
pub const CFG_ITERATION_COUNT: u32 = 500;

/// Iterations per aggregate statistics window
pub const CFG_STATS_WINDOW: u32 = 50;

/// Starvation guard: Medium yields one tick after this much accumulated
/// run time while High is waiting. Without it, in the non-inheriting mode
/// Low could never be scheduled to release the lock.
pub const CFG_MEDIUM_PAUSE_TICKS: u32 = 20;
