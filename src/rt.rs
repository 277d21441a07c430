//! Collaborator interfaces
//!
//! Everything the core consumes from the outside world (scheduler time,
//! per-task event flags, the shared lock, serial transmit, the watchdog)
//! comes through these narrow traits. The firmware integration binds them
//! to the RTOS and HAL; the host simulator binds them to a deterministic
//! scheduler.

use crate::error::DiagResult;
use crate::types::{FlagMask, SpinUnits, TaskRole, Tick};

/// Monotonic scheduler time
pub trait Clock {
    /// Current tick count (wraps)
    fn tick_now(&self) -> Tick;

    /// Sleep the calling task for `ticks` scheduler ticks (0 = no-op)
    fn delay(&self, ticks: Tick);
}

/// Lightweight per-task event flags
///
/// Flags are sticky: a set flag stays pending until a waiter consumes it,
/// so a signal sent before the receiver reaches its wait is not lost.
pub trait Signals {
    /// Block until any flag in `mask` is pending for the calling task,
    /// then clear the matched flags
    fn flag_wait(&self, mask: FlagMask);

    /// Set `mask` on `target`'s pending flags, waking it if it is waiting
    /// on any of them
    fn flag_set(&self, target: TaskRole, mask: FlagMask);
}

/// The experiment's shared mutual-exclusion resource
///
/// Blocking acquire with no timeout: the experiment measures unbounded
/// worst-case wait in the non-inheriting discipline. Whether the lock
/// inherits priority is a property of the bound implementation.
pub trait SharedLock {
    fn acquire(&self);
    fn release(&self);
}

/// Uninterruptible bounded busy-work
///
/// Models real critical-section or CPU-bound cost. `units` is a loop
/// iteration count, not a time unit; calibrate per target.
pub trait CpuWork {
    fn spin(&self, units: SpinUnits);
}

/// Watchdog refresh hook
pub trait WatchdogFeed {
    fn refresh(&self);
}

/// Blocking serial transmit
pub trait SerialTx {
    /// Write all of `bytes`, blocking until complete or timeout
    fn write(&mut self, bytes: &[u8]) -> DiagResult<()>;
}

/// Everything an experiment task needs from the scheduler
pub trait PiServices: Clock + Signals + SharedLock + CpuWork + WatchdogFeed {}

impl<T: Clock + Signals + SharedLock + CpuWork + WatchdogFeed> PiServices for T {}

/// Default `CpuWork` for Cortex-M targets: a NOP loop
pub struct NopSpin;

impl CpuWork for NopSpin {
    fn spin(&self, units: SpinUnits) {
        for _ in 0..units {
            #[cfg(target_arch = "arm")]
            cortex_m::asm::nop();
            #[cfg(not(target_arch = "arm"))]
            core::hint::spin_loop();
        }
    }
}
