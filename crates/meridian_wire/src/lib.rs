//! # Meridian Wire - Field Server Protocol
//!
//! The binary wire protocol between the Meridian field server and its
//! game clients: a little-endian byte codec, the frame envelope that
//! multiplexes message families over one stream, and the per-tick actor
//! state-synchronization records broadcast inside it.
//!
//! ## Layers
//!
//! - **Stream** ([`stream`]): primitive little-endian reads and writes
//!   over growable buffers and borrowed slices
//! - **Quantization** ([`quant`]): fixed-point vector codecs trading
//!   precision for bytes on hot fields
//! - **Values & objects** ([`value`], [`object`]): uniform serialization
//!   traits for primitives, enums, and nested composites
//! - **Conditional fields** ([`conditional`]): flags-gated optional
//!   groups with presence derived from the data itself
//! - **Frames** ([`frame`]): `[length][opcode][payload]` envelopes and
//!   opcode-scoped command dispatch
//! - **State sync** ([`sync`]): the shared actor snapshot record and its
//!   variant kinds
//! - **Batching** ([`batch`]): pooled scratch buffers splicing
//!   length-prefixed per-actor blocks into one broadcast frame
//!
//! ## Wire Rules
//!
//! 1. **Little-endian everywhere** - every multi-byte integer and float
//! 2. **Encode asserts, decode returns** - a malformed value to encode is
//!    a local bug and panics; malformed bytes to decode come from the
//!    network and surface as [`WireError`]
//! 3. **Fail closed** - unknown flag bits, opcodes, commands, and enum
//!    values are rejected, never guessed at
//! 4. **Never desync** - length prefixes let readers drop what they
//!    cannot decode and keep their position in the stream

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod batch;
pub mod conditional;
pub mod error;
pub mod frame;
pub mod object;
pub mod quant;
pub mod stream;
pub mod sync;
pub mod value;

pub use batch::{decode_sync_batch, encode_sync_batch, BufferPool, PooledBuffer, SyncBatch};
pub use conditional::FieldFlags;
pub use error::{WireError, WireResult};
pub use frame::{Frame, FrameBuilder, Opcode, FRAME_HEADER_SIZE, MAX_PAYLOAD_SIZE};
pub use object::WireObject;
pub use quant::{CoordVec3, CubeVec3};
pub use stream::{ByteReader, ByteWriter};
pub use sync::{
    ActorState, ActorSubState, ActorSyncRecord, ActorUpdate, ActorUpdateMsg, StateSync, SyncKind,
};
pub use value::WireValue;
