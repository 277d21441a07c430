//! Error types for the diagnostics core
//!
//! Uses Rust's Result pattern throughout; every failure path is a checked
//! return plus a local recovery action.

/// Crate-wide error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DiagError {
    // ============ Framing errors ============
    // Discriminants follow the validator's rejection order.
    /// Frame shorter than the three-byte minimum
    FrameTooShort = 1,
    /// First byte is not the frame header constant
    FrameBadHeader = 2,
    /// Declared payload length disagrees with the received byte count
    FrameLengthMismatch = 3,
    /// 8-bit additive checksum mismatch
    FrameChecksum = 4,
    /// Declared frame would exceed the parser's working buffer
    FrameOversize = 5,

    // ============ Build errors ============
    /// Output buffer too small for the requested frame
    BuildOverflow = 10,
    /// Too many parameter bytes for one frame
    BuildTooManyParams = 11,

    // ============ Dispatch errors ============
    /// Command identifier at or past the INVALID sentinel
    CmdUnknown = 20,
    /// Command word not present in the table
    CmdUnknownName = 21,
    /// Handler received the wrong number of parameters
    CmdArgCount = 22,
    /// Parameter present but not usable (e.g. non-numeric where a number
    /// is required)
    CmdArgValue = 23,
    /// More parameters than the dispatcher can carry
    CmdTooManyArgs = 24,

    // ============ Transport errors ============
    /// Serial transmit did not complete
    SerialTx = 30,

    // ============ Startup errors ============
    /// A required primitive failed to initialize; nothing downstream can
    /// run correctly
    InitFailed = 40,
}

/// Result type alias for diagnostics operations
pub type DiagResult<T> = Result<T, DiagError>;

impl DiagError {
    /// True for transport-level framing errors: silently dropped by the
    /// parser, which resets and continues. Dispatch errors are logged
    /// instead; neither class ever escalates.
    #[inline]
    pub fn is_framing(self) -> bool {
        matches!(
            self,
            DiagError::FrameTooShort
                | DiagError::FrameBadHeader
                | DiagError::FrameLengthMismatch
                | DiagError::FrameChecksum
                | DiagError::FrameOversize
        )
    }
}
