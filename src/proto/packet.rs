//! Wire framing, checksum, and the streaming parser
//!
//! Frame layout (byte stream):
//!
//! ```text
//! +--------+--------+--------+-------------+----------+
//! | HEADER | LENGTH |  CMD   |   PAYLOAD   | CHECKSUM |
//! +--------+--------+--------+-------------+----------+
//!   1 byte   1 byte   1 byte    N bytes       1 byte
//! ```
//!
//! LENGTH counts CMD plus PAYLOAD, so the total frame is LENGTH + 3 bytes.
//! LENGTH is at least 1 (the CMD byte), making the smallest valid frame 4
//! bytes. CHECKSUM is the low 8 bits of the sum of every preceding byte.
//!
//! Example: cmd 0x01, payload {0x10, 0x20} => LENGTH 0x03, checksum
//! 0xAA + 0x03 + 0x01 + 0x10 + 0x20 = 0xDE (low byte), byte stream
//! `AA 03 01 10 20 DE`.

use crate::config::CFG_MAX_FRAME_LEN;
use crate::error::{DiagError, DiagResult};
use crate::trace;
use crate::types::CmdId;

/// Fixed frame start byte
pub const FRAME_HEADER: u8 = 0xAA;

/// Fixed framing overhead: header, length, and checksum bytes
pub const MIN_FRAME_LEN: usize = 3;

/// 8-bit additive checksum: wrapping sum of `bytes`
///
/// The builder and the validator both use this one definition; the wire
/// arithmetic must stay byte-for-byte identical between them.
#[inline]
pub fn checksum(bytes: &[u8]) -> u8 {
    let mut sum: u8 = 0;
    for &b in bytes {
        sum = sum.wrapping_add(b);
    }
    sum
}

/// Build a complete frame into `out`, returning the total byte length
///
/// Pure function: no side effects beyond writing `out`. The result always
/// passes [`validate_frame`].
pub fn build_frame(out: &mut [u8], cmd: CmdId, params: &[u8]) -> DiagResult<usize> {
    let total = params.len() + MIN_FRAME_LEN + 1;
    if total > CFG_MAX_FRAME_LEN || params.len() > u8::MAX as usize - 1 {
        return Err(DiagError::BuildTooManyParams);
    }
    if total > out.len() {
        return Err(DiagError::BuildOverflow);
    }

    out[0] = FRAME_HEADER;
    out[1] = (1 + params.len()) as u8; // cmd + params
    out[2] = cmd;
    out[3..3 + params.len()].copy_from_slice(params);
    out[total - 1] = checksum(&out[..total - 1]);

    Ok(total)
}

/// Validate a complete frame in `buf`
///
/// Rejection order: too short, bad header, declared length disagrees with
/// the received length, checksum mismatch. LENGTH counts the CMD byte, so
/// a declared length of zero can never describe a well-formed frame and is
/// rejected as a length mismatch.
pub fn validate_frame(buf: &[u8]) -> DiagResult<()> {
    if buf.len() < MIN_FRAME_LEN {
        return Err(DiagError::FrameTooShort);
    }
    if buf[0] != FRAME_HEADER {
        return Err(DiagError::FrameBadHeader);
    }

    let payload_len = buf[1] as usize;
    if payload_len == 0 || payload_len + MIN_FRAME_LEN != buf.len() {
        return Err(DiagError::FrameLengthMismatch);
    }

    let expected = checksum(&buf[..buf.len() - 1]);
    if expected != buf[buf.len() - 1] {
        return Err(DiagError::FrameChecksum);
    }

    Ok(())
}

/// Validate `buf` and split it into (cmd, params)
pub fn parse_frame(buf: &[u8]) -> DiagResult<(CmdId, &[u8])> {
    validate_frame(buf)?;
    Ok((buf[2], &buf[3..buf.len() - 1]))
}

/// Hex-dump a frame (or any byte run) to the debug log
pub fn print_frame(msg: &str, bytes: &[u8]) {
    crate::debug!("{=str} ({=usize} bytes): {=[u8]:02x}", msg, bytes.len(), bytes);
}

// ============ Streaming parser ============

/// Parser states, one per frame field being awaited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    AwaitHeader,
    AwaitLength,
    AwaitPayload,
    AwaitChecksum,
}

/// Result of feeding one byte to the parser
#[derive(Debug, PartialEq, Eq)]
pub enum FeedOutcome<'a> {
    /// Mid-frame (or discarding noise before a header)
    Pending,
    /// A validated frame completed; the slice is CMD plus parameters
    Frame(&'a [u8]),
    /// A frame completed (or a length byte arrived) and was rejected
    Rejected(DiagError),
}

/// Byte-at-a-time frame reassembly
///
/// One instance per physical link. Driven strictly one byte at a time so it
/// resumes correctly however the transport fragments data: across DMA
/// chunks, ISR invocations, or polls. Resets to `AwaitHeader` after every
/// complete frame, accepted or not.
pub struct FrameParser {
    state: ParserState,
    buf: [u8; CFG_MAX_FRAME_LEN],
    idx: usize,
    payload_len: usize,
}

impl FrameParser {
    pub const fn new() -> Self {
        FrameParser {
            state: ParserState::AwaitHeader,
            buf: [0; CFG_MAX_FRAME_LEN],
            idx: 0,
            payload_len: 0,
        }
    }

    /// Current state (observable for tests and link diagnostics)
    #[inline]
    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Working-buffer index; zero whenever no frame is in progress
    #[inline]
    pub fn index(&self) -> usize {
        self.idx
    }

    /// Discard any partial frame and return to `AwaitHeader`
    pub fn reset(&mut self) {
        self.state = ParserState::AwaitHeader;
        self.idx = 0;
        self.payload_len = 0;
    }

    /// Feed one received byte
    ///
    /// Returns at most one completed frame per call. Validation happens
    /// only at frame completion, keeping the per-byte hot path O(1); the
    /// working buffer bounds how much a corrupt length field can make us
    /// buffer. A declared length that cannot fit that buffer is rejected
    /// immediately at the length byte rather than trusted.
    pub fn feed(&mut self, byte: u8) -> FeedOutcome<'_> {
        match self.state {
            ParserState::AwaitHeader => {
                if byte == FRAME_HEADER {
                    self.buf[0] = byte;
                    self.idx = 1;
                    self.state = ParserState::AwaitLength;
                } else {
                    trace!("frame: discarding noise byte {=u8}", byte);
                }
                FeedOutcome::Pending
            }

            ParserState::AwaitLength => {
                let declared = byte as usize;
                if declared == 0 {
                    // LENGTH must cover at least the CMD byte
                    self.reset();
                    return FeedOutcome::Rejected(DiagError::FrameLengthMismatch);
                }
                if declared + MIN_FRAME_LEN > CFG_MAX_FRAME_LEN {
                    self.reset();
                    return FeedOutcome::Rejected(DiagError::FrameOversize);
                }
                self.payload_len = declared;
                self.buf[self.idx] = byte;
                self.idx += 1;
                self.state = ParserState::AwaitPayload;
                FeedOutcome::Pending
            }

            ParserState::AwaitPayload => {
                self.buf[self.idx] = byte;
                self.idx += 1;
                // header + length + payload received; checksum remains
                if self.idx == self.payload_len + 2 {
                    self.state = ParserState::AwaitChecksum;
                }
                FeedOutcome::Pending
            }

            ParserState::AwaitChecksum => {
                self.buf[self.idx] = byte;
                self.idx += 1;

                let total = self.idx;
                let payload_len = self.payload_len;
                self.reset();

                match validate_frame(&self.buf[..total]) {
                    Ok(()) => FeedOutcome::Frame(&self.buf[2..2 + payload_len]),
                    Err(e) => FeedOutcome::Rejected(e),
                }
            }
        }
    }
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}
