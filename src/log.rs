//! Logging macros for the diagnostics core
//!
//! Forward to defmt on ARM targets when the feature is enabled; compile to
//! nothing everywhere else so host tests link without a defmt sink.

/// Debug message
#[cfg(all(feature = "defmt", target_arch = "arm"))]
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => { defmt::debug!($($arg)*) };
}

/// Info message
#[cfg(all(feature = "defmt", target_arch = "arm"))]
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => { defmt::info!($($arg)*) };
}

/// Error message
#[cfg(all(feature = "defmt", target_arch = "arm"))]
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => { defmt::error!($($arg)*) };
}

/// Trace message
#[cfg(all(feature = "defmt", target_arch = "arm"))]
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => { defmt::trace!($($arg)*) };
}

/// Warning message
#[cfg(all(feature = "defmt", target_arch = "arm"))]
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => { defmt::warn!($($arg)*) };
}

// No-op versions when defmt is disabled or off-target. Arguments are still
// name-checked (borrowed, never moved or formatted) so callsites compile
// identically on host and target.
#[cfg(not(all(feature = "defmt", target_arch = "arm")))]
#[macro_export]
macro_rules! debug {
    ($s:literal $(, $arg:expr)* $(,)?) => {{ $(let _ = &$arg;)* }};
}
#[cfg(not(all(feature = "defmt", target_arch = "arm")))]
#[macro_export]
macro_rules! info {
    ($s:literal $(, $arg:expr)* $(,)?) => {{ $(let _ = &$arg;)* }};
}
#[cfg(not(all(feature = "defmt", target_arch = "arm")))]
#[macro_export]
macro_rules! error {
    ($s:literal $(, $arg:expr)* $(,)?) => {{ $(let _ = &$arg;)* }};
}
#[cfg(not(all(feature = "defmt", target_arch = "arm")))]
#[macro_export]
macro_rules! trace {
    ($s:literal $(, $arg:expr)* $(,)?) => {{ $(let _ = &$arg;)* }};
}
#[cfg(not(all(feature = "defmt", target_arch = "arm")))]
#[macro_export]
macro_rules! warn {
    ($s:literal $(, $arg:expr)* $(,)?) => {{ $(let _ = &$arg;)* }};
}
