use thiserror::Error;

/// A notification payload that cannot be decoded as a W820 frame.
///
/// Malformed frames are rejected before any field is written, so a bad
/// notification never leaves a half-updated reading behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedFrame {
    #[error("empty frame")]
    Empty,

    #[error("unknown frame type {0}")]
    UnknownType(u8),

    #[error("frame type {frame_type} too short: expected at least {expected} bytes, got {actual}")]
    TooShort {
        frame_type: u8,
        expected: usize,
        actual: usize,
    },
}
