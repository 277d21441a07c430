//! Byte ring buffer
//!
//! Single-producer/single-consumer across an interrupt/task boundary.
//! Cursors are monotonically increasing `u16`s masked on access, stored as
//! atomics so neither side relies on compiler volatility alone. Capacity
//! must be a power of two so masking replaces modulo.
//!
//! Overrun policy: `push` never fails or blocks. When the buffer is full
//! the oldest unread byte is dropped to make room (producer wins). No
//! backpressure reaches the producer, so under sustained overrun data is
//! lost, but the loss is counted and observable via [`ByteRing::overruns`].

use core::cell::UnsafeCell;

use portable_atomic::{AtomicU16, AtomicU32, Ordering};

/// Fixed-capacity SPSC byte ring
pub struct ByteRing<const N: usize> {
    buf: UnsafeCell<[u8; N]>,
    /// Write cursor, producer side (ISR or poll loop)
    head: AtomicU16,
    /// Read cursor, consumer side (parser drain)
    tail: AtomicU16,
    overruns: AtomicU32,
}

// SPSC discipline is the caller's contract; the cursors are atomic and each
// cell is written by exactly one side at a time.
unsafe impl<const N: usize> Sync for ByteRing<N> {}

impl<const N: usize> ByteRing<N> {
    const MASK: u16 = (N - 1) as u16;
    const CAPACITY_IS_POW2: () = assert!(N.is_power_of_two() && N <= u16::MAX as usize / 2);

    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let _ = Self::CAPACITY_IS_POW2;
        ByteRing {
            buf: UnsafeCell::new([0; N]),
            head: AtomicU16::new(0),
            tail: AtomicU16::new(0),
            overruns: AtomicU32::new(0),
        }
    }

    /// Number of unread bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.head
            .load(Ordering::Acquire)
            .wrapping_sub(self.tail.load(Ordering::Acquire)) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes dropped to date by the overwrite-on-full policy
    #[inline]
    pub fn overruns(&self) -> u32 {
        self.overruns.load(Ordering::Relaxed)
    }

    /// Producer-side push. O(1), always succeeds; drops the oldest unread
    /// byte when full. Must only be called from the producer context.
    pub fn push(&self, byte: u8) {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);

        if head.wrapping_sub(tail) as usize == N {
            // Full: advance the read cursor past the oldest byte. Races
            // with a concurrent pop are excluded by the consumer using
            // pop_cs when a producer can interrupt it.
            self.tail.store(tail.wrapping_add(1), Ordering::Release);
            self.overruns.fetch_add(1, Ordering::Relaxed);
        }

        unsafe {
            (*self.buf.get())[(head & Self::MASK) as usize] = byte;
        }
        self.head.store(head.wrapping_add(1), Ordering::Release);
    }

    /// Consumer-side pop. O(1), non-blocking; `None` leaves both cursors
    /// untouched. Use only where the producer cannot run concurrently
    /// (same context, or interrupts already masked).
    pub fn pop(&self) -> Option<u8> {
        let tail = self.tail.load(Ordering::Relaxed);
        if self.head.load(Ordering::Acquire) == tail {
            return None;
        }

        let byte = unsafe { (*self.buf.get())[(tail & Self::MASK) as usize] };
        self.tail.store(tail.wrapping_add(1), Ordering::Release);
        Some(byte)
    }

    /// Consumer-side pop with interrupts masked for the check-and-advance,
    /// avoiding a lost byte if the ISR-side push overruns mid-pop.
    pub fn pop_cs(&self) -> Option<u8> {
        critical_section::with(|_| self.pop())
    }

    /// Drop all unread bytes
    pub fn clear(&self) {
        critical_section::with(|_| {
            let head = self.head.load(Ordering::Relaxed);
            self.tail.store(head, Ordering::Release);
        });
    }
}

impl<const N: usize> Default for ByteRing<N> {
    fn default() -> Self {
        Self::new()
    }
}
