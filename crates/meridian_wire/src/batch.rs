//! # Pooled Sub-Message Building
//!
//! Hot broadcast paths assemble many small per-actor blocks per tick.
//! Rather than allocate a scratch buffer per block, a shared
//! [`BufferPool`] recycles [`ByteWriter`]s: acquire a buffer, encode one
//! block into it, splice it into the parent stream behind a `u16` length
//! prefix, and the buffer goes back to the pool cleared.
//!
//! The length prefix is what keeps a batch robust: a reader that cannot
//! decode one block still knows where the next one starts, so a single
//! malformed record is dropped without desynchronizing the rest.

use std::ops::{Deref, DerefMut};

use meridian_core::ObjectPool;

use crate::error::WireResult;
use crate::frame::{Frame, FrameBuilder, Opcode};
use crate::stream::ByteWriter;
use crate::sync::{ActorSyncRecord, SyncKind};

/// A recycling pool of scratch [`ByteWriter`]s.
///
/// Buffers handed out by [`acquire`](Self::acquire) return to the pool
/// when the guard drops, cleared, so a later acquirer never observes a
/// previous user's bytes.
pub struct BufferPool {
    inner: ObjectPool<ByteWriter>,
}

impl BufferPool {
    /// Creates an empty pool; buffers are allocated on first demand.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: ObjectPool::new(ByteWriter::new),
        }
    }

    /// Takes a cleared buffer from the pool, allocating if none is idle.
    #[must_use]
    pub fn acquire(&self) -> PooledBuffer<'_> {
        PooledBuffer {
            writer: Some(self.inner.acquire()),
            pool: self,
        }
    }

    /// Number of buffers currently checked out.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.inner.outstanding()
    }

    /// Number of buffers idle in the pool.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.inner.idle()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

/// A scratch buffer checked out of a [`BufferPool`].
///
/// Dereferences to [`ByteWriter`]. Returns to its pool on every exit
/// path: either through [`splice_into`](Self::splice_into) or on drop,
/// cleared either way.
pub struct PooledBuffer<'a> {
    writer: Option<ByteWriter>,
    pool: &'a BufferPool,
}

impl PooledBuffer<'_> {
    /// Appends this buffer's contents to `parent` behind a `u16` length
    /// prefix, then returns the buffer to the pool.
    ///
    /// # Panics
    ///
    /// If the buffer holds more than `u16::MAX` bytes; sub-messages that
    /// large are an encoder bug, not a runtime condition.
    pub fn splice_into(mut self, parent: &mut ByteWriter) {
        let mut writer = self.writer.take().expect("buffer spliced twice");
        let bytes = writer.as_slice();
        assert!(
            bytes.len() <= usize::from(u16::MAX),
            "sub-message exceeds its u16 length prefix"
        );
        parent.write_u16(bytes.len() as u16);
        parent.write_bytes(bytes);
        writer.clear();
        self.pool.inner.release(writer);
    }
}

impl Deref for PooledBuffer<'_> {
    type Target = ByteWriter;

    fn deref(&self) -> &ByteWriter {
        self.writer.as_ref().expect("buffer spliced twice")
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut ByteWriter {
        self.writer.as_mut().expect("buffer spliced twice")
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            writer.clear();
            self.pool.inner.release(writer);
        }
    }
}

/// A decoded per-tick sync batch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SyncBatch {
    /// Successfully decoded records, paired with their actor ids.
    pub entries: Vec<(i32, ActorSyncRecord)>,
    /// Records dropped because their block failed to decode.
    pub skipped: usize,
}

/// Encodes one tick's sync records into a single [`Opcode::ActorSync`]
/// frame.
///
/// Layout: a `u8` record count, then per record an `i32` actor id and a
/// `u16`-length-prefixed state-sync block built through `pool`.
///
/// # Panics
///
/// If `entries` holds more than 255 records.
#[must_use]
pub fn encode_sync_batch(pool: &BufferPool, entries: &[(i32, ActorSyncRecord)]) -> Vec<u8> {
    assert!(
        entries.len() <= usize::from(u8::MAX),
        "sync batch exceeds its u8 record count"
    );

    let mut frame = FrameBuilder::open(Opcode::ActorSync);
    frame.payload().write_u8(entries.len() as u8);
    for (actor_id, record) in entries {
        frame.payload().write_i32(*actor_id);
        let mut buffer = pool.acquire();
        record.write_to(&mut buffer);
        buffer.splice_into(frame.payload());
    }
    frame.finish()
}

/// Decodes an [`Opcode::ActorSync`] payload.
///
/// `kind_of` resolves each actor id to the record kind its context
/// dictates. A block that fails to decode, or decodes short of its
/// declared length, is skipped; the length prefix keeps the remaining
/// blocks aligned. Errors are returned only for damage to the batch
/// structure itself.
pub fn decode_sync_batch(
    frame: &Frame<'_>,
    kind_of: impl Fn(i32) -> SyncKind,
) -> WireResult<SyncBatch> {
    let mut reader = frame.reader();
    let count = reader.read_u8()?;

    let mut batch = SyncBatch {
        entries: Vec::with_capacity(usize::from(count)),
        ..SyncBatch::default()
    };
    for _ in 0..count {
        let actor_id = reader.read_i32()?;
        let length = usize::from(reader.read_u16()?);
        let mut block = reader.sub_reader(length)?;
        match ActorSyncRecord::read_as(kind_of(actor_id), &mut block) {
            Ok(record) if block.remaining() == 0 => batch.entries.push((actor_id, record)),
            Ok(_) => {
                tracing::debug!(actor_id, "sync block longer than its record, dropping");
                batch.skipped += 1;
            }
            Err(error) => {
                tracing::debug!(actor_id, %error, "dropping malformed sync block");
                batch.skipped += 1;
            }
        }
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::Vec3;

    use crate::sync::{MinigameOutcome, MinigameResult, StateSync};

    fn movement(sync_number: i32) -> ActorSyncRecord {
        ActorSyncRecord::Movement(StateSync {
            position: Vec3::new(1.0, 2.0, 3.0),
            sync_mode: 2,
            sync_number,
            ..StateSync::default()
        })
    }

    #[test]
    fn test_buffer_returns_cleared() {
        let pool = BufferPool::new();
        {
            let mut buffer = pool.acquire();
            buffer.write_u32(0xDEAD_BEEF);
            assert_eq!(pool.outstanding(), 1);
        }
        assert_eq!(pool.outstanding(), 0);
        assert_eq!(pool.idle(), 1);

        let buffer = pool.acquire();
        assert_eq!(buffer.len(), 0);
    }

    #[test]
    fn test_splice_writes_length_prefix() {
        let pool = BufferPool::new();
        let mut parent = ByteWriter::new();

        let mut buffer = pool.acquire();
        buffer.write_u8(0xAA);
        buffer.write_u8(0xBB);
        buffer.splice_into(&mut parent);

        assert_eq!(parent.as_slice(), &[0x02, 0x00, 0xAA, 0xBB]);
        assert_eq!(pool.outstanding(), 0);
    }

    #[test]
    fn test_batch_roundtrip_mixed_kinds() {
        let pool = BufferPool::new();
        let entries = vec![
            (10, movement(1)),
            (
                11,
                ActorSyncRecord::Minigame {
                    base: StateSync {
                        sync_mode: 2,
                        sync_number: 2,
                        ..StateSync::default()
                    },
                    result: MinigameResult {
                        round: 1,
                        score: 300,
                        outcome: MinigameOutcome::InProgress,
                    },
                },
            ),
            (12, movement(3)),
        ];

        let bytes = encode_sync_batch(&pool, &entries);
        assert_eq!(pool.outstanding(), 0);

        let (frame, rest) = Frame::split(&bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(frame.opcode().unwrap(), Opcode::ActorSync);

        let batch = decode_sync_batch(&frame, |actor_id| {
            if actor_id == 11 {
                SyncKind::Minigame
            } else {
                SyncKind::Movement
            }
        })
        .unwrap();
        assert_eq!(batch.skipped, 0);
        assert_eq!(batch.entries, entries);
    }

    #[test]
    fn test_corrupt_block_skipped_without_desync() {
        let pool = BufferPool::new();
        let entries = vec![(10, movement(1)), (11, movement(2)), (12, movement(3))];
        let mut bytes = encode_sync_batch(&pool, &entries);

        // Corrupt the middle block's flags byte with a reserved bit. The
        // block starts after the frame header (4), count (1), first entry
        // (4 + 2 + 27), and the second entry's id and length prefix (4 + 2);
        // flags is the third byte of the record.
        let flags_offset = 4 + 1 + (4 + 2 + 27) + (4 + 2) + 2;
        bytes[flags_offset] = 0x80;

        let (frame, _) = Frame::split(&bytes).unwrap();
        let batch = decode_sync_batch(&frame, |_| SyncKind::Movement).unwrap();
        assert_eq!(batch.skipped, 1);
        assert_eq!(
            batch.entries.iter().map(|(id, _)| *id).collect::<Vec<_>>(),
            vec![10, 12]
        );
        assert_eq!(batch.entries[1].1, movement(3));
    }

    #[test]
    fn test_undersized_block_skipped() {
        let pool = BufferPool::new();

        // Hand-build a batch whose single block declares more bytes than
        // the record consumes.
        let mut frame = FrameBuilder::open(Opcode::ActorSync);
        frame.payload().write_u8(1);
        frame.payload().write_i32(7);
        let mut buffer = pool.acquire();
        movement(1).write_to(&mut buffer);
        buffer.write_u8(0); // trailing garbage inside the block
        buffer.splice_into(frame.payload());
        let bytes = frame.finish();

        let (frame, _) = Frame::split(&bytes).unwrap();
        let batch = decode_sync_batch(&frame, |_| SyncKind::Movement).unwrap();
        assert_eq!(batch.skipped, 1);
        assert!(batch.entries.is_empty());
    }

    #[test]
    fn test_empty_batch() {
        let pool = BufferPool::new();
        let bytes = encode_sync_batch(&pool, &[]);
        let (frame, _) = Frame::split(&bytes).unwrap();
        assert_eq!(frame.payload, &[0x00]);

        let batch = decode_sync_batch(&frame, |_| SyncKind::Movement).unwrap();
        assert!(batch.entries.is_empty());
        assert_eq!(batch.skipped, 0);
    }

    #[test]
    fn test_truncated_block_fails_structurally() {
        // A length prefix that runs past the payload is structural damage,
        // not a skippable record.
        let mut frame = FrameBuilder::open(Opcode::ActorSync);
        frame.payload().write_u8(1);
        frame.payload().write_i32(7);
        frame.payload().write_u16(500);
        frame.payload().write_u8(0xFF);
        let bytes = frame.finish();

        let (frame, _) = Frame::split(&bytes).unwrap();
        assert!(decode_sync_batch(&frame, |_| SyncKind::Movement).is_err());
    }
}
