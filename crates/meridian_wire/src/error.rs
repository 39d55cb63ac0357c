//! # Wire Error Types
//!
//! All errors the codec can report while decoding.
//!
//! Errors are frame-scoped: a failed decode drops that frame and nothing
//! else. Encode-side contract violations (a value out of range for its
//! declared width) are caller defects and assert instead - silent
//! truncation would corrupt the wire format for every client watching.

use thiserror::Error;

/// Errors that can occur while decoding a frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// Read past the end of the buffer.
    #[error("unexpected end of buffer: needed {needed} bytes, {available} available")]
    UnexpectedEof {
        /// Bytes the read required.
        needed: usize,
        /// Bytes left in the buffer.
        available: usize,
    },

    /// The frame's length prefix does not match the bytes on hand.
    #[error("frame length mismatch: header declares {declared} payload bytes, {available} available")]
    LengthMismatch {
        /// Payload length declared by the frame header.
        declared: usize,
        /// Bytes actually available after the header.
        available: usize,
    },

    /// Opcode not part of the protocol.
    #[error("unknown opcode: 0x{0:04x}")]
    UnknownOpcode(u16),

    /// Command byte outside the valid range for its opcode.
    #[error("unknown command {command} for opcode 0x{opcode:04x}")]
    UnknownCommand {
        /// Opcode whose payload was being decoded.
        opcode: u16,
        /// The out-of-range command byte.
        command: u8,
    },

    /// Enumeration discriminant with no declared variant.
    #[error("invalid discriminant {value} for {type_name}")]
    InvalidEnum {
        /// The enumeration being decoded.
        type_name: &'static str,
        /// The discriminant found on the wire.
        value: i64,
    },

    /// A flags value with bits set outside its declared groups.
    ///
    /// Unknown bits must round-trip as zero; a set one means the peer and
    /// this decoder disagree on the field list, so the frame is unsafe to
    /// parse further.
    #[error("flags 0x{flags:02x} set bits outside declared mask 0x{known:02x}")]
    UnknownFlags {
        /// The flags byte found on the wire.
        flags: u8,
        /// Union of all declared group bits.
        known: u8,
    },

    /// A boolean byte that was neither 0 nor 1.
    #[error("invalid boolean byte: {0}")]
    InvalidBool(u8),

    /// String bytes that did not decode in the declared encoding.
    #[error("malformed string payload ({encoding})")]
    MalformedString {
        /// Which of the two string encodings was in use.
        encoding: &'static str,
    },

    /// A fixed-layout value whose raw bytes were rejected.
    #[error("malformed raw value for {type_name}")]
    MalformedValue {
        /// The value type being decoded.
        type_name: &'static str,
    },

    /// An embedded sub-message whose declared length overruns its parent.
    #[error("sub-message length {declared} overruns remaining {available} bytes")]
    SubMessageOverrun {
        /// Length prefix of the sub-message.
        declared: usize,
        /// Bytes remaining in the parent payload.
        available: usize,
    },
}

/// Result type for decode operations.
pub type WireResult<T> = Result<T, WireError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WireError::UnknownCommand {
            opcode: 0x0021,
            command: 99,
        };
        assert_eq!(err.to_string(), "unknown command 99 for opcode 0x0021");

        let err = WireError::UnexpectedEof {
            needed: 4,
            available: 1,
        };
        assert!(err.to_string().contains("needed 4"));
    }
}
