//! # Frame Envelope & Command Multiplexing
//!
//! The outer shape of every message: `[length: u16][opcode: u16][payload]`.
//!
//! The length prefix counts payload bytes only and must match exactly -
//! decoding fails closed on a mismatch rather than guessing a boundary. A
//! handed-off frame is always complete; a frame that fails to build is
//! discarded whole and never reaches the transport.
//!
//! Most opcodes begin their payload with a command byte selecting one of
//! several payload shapes; the valid command range is scoped per opcode and
//! validated before any further dispatch. An unknown opcode or out-of-range
//! command drops that frame only - the stream is never resynchronized
//! byte-by-byte, and one bad frame is never misread as two.

use crate::error::{WireError, WireResult};
use crate::stream::{ByteReader, ByteWriter};
use crate::value::WireValue;
use crate::wire_enum;

/// Bytes of envelope ahead of the payload: u16 length plus u16 opcode.
pub const FRAME_HEADER_SIZE: usize = 4;

/// Largest payload a frame can declare.
pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize;

wire_enum! {
    /// Message families of the field protocol.
    ///
    /// The closed set of top-level operation codes. Per-opcode payload
    /// shapes live with their owning modules; game semantics live with the
    /// feature handlers above this crate.
    pub enum Opcode: u16 {
        /// Keep-alive probe; fixed empty payload, no command byte.
        Ping = 0x0001,
        /// Keep-alive response; fixed empty payload, no command byte.
        Pong = 0x0002,
        /// Batched per-tick actor state synchronization.
        ActorSync = 0x0021,
        /// Actor attribute updates, command-multiplexed.
        ActorUpdate = 0x0022,
        /// Field enter/leave bookkeeping, command-multiplexed.
        FieldEntry = 0x0023,
    }
}

/// One decoded frame envelope borrowing its payload.
///
/// The opcode is kept raw here: an unknown opcode must still split cleanly
/// off the stream so the frames behind it survive.
#[derive(Clone, Copy, Debug)]
pub struct Frame<'a> {
    /// Raw operation code as found on the wire.
    pub opcode: u16,
    /// Payload bytes, exactly as long as the header declared.
    pub payload: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Splits one frame off the front of a stream of concatenated frames.
    ///
    /// Returns the frame and the remaining bytes. On any failure nothing is
    /// consumed: a truncated frame reports [`WireError::LengthMismatch`]
    /// without touching bytes that belong to a later frame.
    pub fn split(stream: &'a [u8]) -> WireResult<(Self, &'a [u8])> {
        if stream.len() < FRAME_HEADER_SIZE {
            return Err(WireError::UnexpectedEof {
                needed: FRAME_HEADER_SIZE,
                available: stream.len(),
            });
        }
        let length = usize::from(u16::from_le_bytes([stream[0], stream[1]]));
        let opcode = u16::from_le_bytes([stream[2], stream[3]]);
        let body = &stream[FRAME_HEADER_SIZE..];
        if body.len() < length {
            return Err(WireError::LengthMismatch {
                declared: length,
                available: body.len(),
            });
        }
        let frame = Self {
            opcode,
            payload: &body[..length],
        };
        Ok((frame, &body[length..]))
    }

    /// Validates the raw opcode against the protocol's closed set.
    ///
    /// An unknown opcode is reported (and logged) so the caller drops this
    /// frame; the rest of the stream is unaffected.
    pub fn opcode(&self) -> WireResult<Opcode> {
        Opcode::from_raw(self.opcode).ok_or_else(|| {
            tracing::warn!(opcode = self.opcode, "dropping frame with unknown opcode");
            WireError::UnknownOpcode(self.opcode)
        })
    }

    /// Returns a cursor over the payload.
    #[must_use]
    pub const fn reader(&self) -> ByteReader<'a> {
        ByteReader::new(self.payload)
    }

    /// Reads this opcode's command byte, validating its opcode-scoped range.
    ///
    /// Must be the first read of a command-multiplexed payload. An
    /// undeclared command is reported as
    /// [`WireError::UnknownCommand`] carrying the opcode for the log line.
    pub fn read_command<C: WireValue>(&self, reader: &mut ByteReader<'a>) -> WireResult<C> {
        match C::read(reader) {
            Ok(command) => Ok(command),
            Err(WireError::InvalidEnum { value, .. }) => {
                tracing::warn!(
                    opcode = self.opcode,
                    command = value,
                    "dropping frame with out-of-range command"
                );
                Err(WireError::UnknownCommand {
                    opcode: self.opcode,
                    command: value as u8,
                })
            }
            Err(other) => Err(other),
        }
    }
}

/// Builder for one outgoing frame.
///
/// Opens with the opcode, accumulates the payload through the usual write
/// API, and finalizes the length prefix last - so a partially built frame
/// can never be emitted with a length that lies.
#[derive(Debug)]
pub struct FrameBuilder {
    writer: ByteWriter,
}

impl FrameBuilder {
    /// Opens a frame for the given opcode.
    #[must_use]
    pub fn open(opcode: Opcode) -> Self {
        let mut writer = ByteWriter::with_capacity(64);
        writer.write_u16(0); // length, patched on finish
        writer.write_u16(opcode as u16);
        Self { writer }
    }

    /// The payload writer.
    #[inline]
    pub fn payload(&mut self) -> &mut ByteWriter {
        &mut self.writer
    }

    /// Finalizes the length prefix and returns the complete frame bytes.
    ///
    /// # Panics
    ///
    /// A payload past [`MAX_PAYLOAD_SIZE`] cannot be framed; building one
    /// is an encode contract violation.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        let payload_len = self.writer.len() - FRAME_HEADER_SIZE;
        assert!(
            payload_len <= MAX_PAYLOAD_SIZE,
            "frame payload of {payload_len} bytes exceeds length prefix"
        );
        self.writer.patch_u16(0, payload_len as u16);
        self.writer.into_vec()
    }
}
