//! Core type definitions for the diagnostics firmware

/// Tick counter type (monotonic, wraps)
pub type Tick = u32;

/// Command identifier as carried on the wire
pub type CmdId = u8;

/// Per-task event flag mask
pub type FlagMask = u32;

/// Busy-work intensity (loop iterations, target-dependent duration)
pub type SpinUnits = u32;

/// Task identities used for flag targeting in the experiment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TaskRole {
    /// Resource holder (lowest priority)
    Low = 0,
    /// CPU hog while High is blocked
    Medium = 1,
    /// Driver and measurer (highest priority)
    High = 2,
}
