//! Packet protocol engine
//!
//! Raw bytes arrive asynchronously (ISR or poll) and are pushed into a
//! [`ring::ByteRing`]; a task drains them through the [`packet::FrameParser`]
//! and hands validated payloads to the [`cmd`] dispatcher. Framing errors
//! are dropped locally; this protocol has no retransmission or
//! acknowledgment, so reliability is the next layer's problem.

pub mod cmd;
pub mod packet;
pub mod ring;

use crate::debug;
use crate::error::DiagResult;
use crate::rt::SerialTx;
use crate::types::CmdId;

use cmd::DeviceOps;
use packet::{FeedOutcome, FrameParser};
use ring::ByteRing;

/// Drain the receive ring through the parser and dispatch complete frames
///
/// Call from task context; uses the interrupt-masked pop path so the
/// ISR-side producer cannot race the cursor check. Every error is recovered
/// locally: framing rejects reset the parser, dispatch rejects are logged
/// by the dispatcher, and draining continues either way.
pub fn pump_rx<D: DeviceOps, const N: usize>(
    rx: &ByteRing<N>,
    parser: &mut FrameParser,
    dev: &mut D,
) {
    while let Some(byte) = rx.pop_cs() {
        match parser.feed(byte) {
            FeedOutcome::Pending => {}
            FeedOutcome::Frame(payload) => {
                packet::print_frame("rx frame", payload);
                let _ = cmd::dispatch_binary(dev, payload);
            }
            FeedOutcome::Rejected(err) => {
                debug!("frame rejected: {=u8}", err as u8);
            }
        }
    }
}

/// Build a frame and transmit it over `port`
///
/// Returns the frame's total byte length.
pub fn send_frame<S: SerialTx>(port: &mut S, cmd: CmdId, params: &[u8]) -> DiagResult<usize> {
    let mut buf = [0u8; crate::config::CFG_MAX_FRAME_LEN];
    let len = packet::build_frame(&mut buf, cmd, params)?;
    packet::print_frame("tx frame", &buf[..len]);
    port.write(&buf[..len])?;
    Ok(len)
}
