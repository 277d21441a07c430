//! Real-time diagnostics firmware core
//!
//! Two loosely related subsystems sharing one codebase:
//! - A streaming binary-protocol engine: byte ring buffer, framing with an
//!   8-bit additive checksum, a byte-at-a-time parser state machine, and a
//!   unified command dispatcher
//! - A priority-inversion measurement experiment: three tasks at fixed
//!   priorities contending for one shared lock, with statistics over
//!   High's lock-wait time under two locking disciplines
//!
//! The RTOS, peripherals, and watchdog are consumed only through the narrow
//! collaborator traits in [`rt`].

#![cfg_attr(not(feature = "sim"), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

// ============ Critical Section ============

#[cfg(target_arch = "arm")]
mod cs_impl {
    use cortex_m::interrupt;
    use cortex_m::register::primask;
    use critical_section::{set_impl, Impl, RawRestoreState};

    struct SingleCoreCriticalSection;
    set_impl!(SingleCoreCriticalSection);

    unsafe impl Impl for SingleCoreCriticalSection {
        unsafe fn acquire() -> RawRestoreState {
            let was_active = primask::read().is_active();
            interrupt::disable();
            was_active
        }

        unsafe fn release(was_active: RawRestoreState) {
            if was_active {
                unsafe { interrupt::enable() }
            }
        }
    }
}

// ============ Modules ============

pub mod log;
mod lang_items;

pub mod config;
pub mod error;
pub mod pi;
pub mod proto;
pub mod rt;
pub mod types;

#[cfg(feature = "sim")]
pub mod sim;

// ============ Re-exports ============

pub use config::*;
pub use error::DiagError;
pub use error::DiagResult;
pub use pi::LockMode;
pub use proto::cmd::{Command, DeviceOps};
pub use proto::packet::FrameParser;
pub use proto::ring::ByteRing;
pub use types::*;
