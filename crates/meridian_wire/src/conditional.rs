//! # Conditional Field Protocol
//!
//! Flag-gated optional field groups, used pervasively to keep messages
//! compact.
//!
//! A flags byte precedes a declared, ordered list of (bit, field group)
//! pairs; bit *i* set means group *i* is present, in declared order.
//! Encoder and decoder must walk the same list - here that is enforced by
//! deriving the flags byte from which groups are actually present, so a
//! flag can never disagree with its payload.
//!
//! A record may carry more than one independent flags value (the actor
//! update family does); each gates only its own declared groups and the two
//! conditional blocks are serialized strictly one after the other, never
//! interleaved.

use crate::error::{WireError, WireResult};
use crate::stream::{ByteReader, ByteWriter};

/// An 8-bit flags value gating optional field groups.
///
/// Wraps the raw byte so group tests read as intent and unknown-bit
/// validation has one home.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FieldFlags(pub u8);

impl FieldFlags {
    /// Flags with no groups present.
    pub const NONE: Self = Self(0);

    /// Returns true if the group gated by `mask` is present.
    #[inline]
    #[must_use]
    pub const fn contains(self, mask: u8) -> bool {
        self.0 & mask != 0
    }

    /// Sets `mask` when `present`, building flags up group by group.
    #[inline]
    #[must_use]
    pub const fn with(self, mask: u8, present: bool) -> Self {
        if present {
            Self(self.0 | mask)
        } else {
            Self(self.0)
        }
    }

    /// Writes the flags byte ahead of its gated groups.
    #[inline]
    pub fn write(self, writer: &mut ByteWriter) {
        writer.write_u8(self.0);
    }

    /// Reads a flags byte, rejecting bits outside the declared groups.
    pub fn read(reader: &mut ByteReader<'_>, known: u8) -> WireResult<Self> {
        let flags = reader.read_u8()?;
        if flags & !known != 0 {
            return Err(WireError::UnknownFlags { flags, known });
        }
        Ok(Self(flags))
    }
}

/// Writes one gated group: invokes `encode` iff the group's bit is set.
///
/// Call once per declared group, in declared order, after writing the flags
/// byte itself.
#[inline]
pub fn write_group(
    writer: &mut ByteWriter,
    flags: FieldFlags,
    mask: u8,
    encode: impl FnOnce(&mut ByteWriter),
) {
    if flags.contains(mask) {
        encode(writer);
    }
}

/// Reads one gated group, mirroring [`write_group`].
///
/// Returns `Some` when the group's bit is set, `None` (consuming nothing)
/// when it is not.
#[inline]
pub fn read_group<T>(
    reader: &mut ByteReader<'_>,
    flags: FieldFlags,
    mask: u8,
    decode: impl FnOnce(&mut ByteReader<'_>) -> WireResult<T>,
) -> WireResult<Option<T>> {
    if flags.contains(mask) {
        decode(reader).map(Some)
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BIT_A: u8 = 1 << 0;
    const BIT_B: u8 = 1 << 1;
    const BIT_C: u8 = 1 << 2;
    const KNOWN: u8 = BIT_A | BIT_B | BIT_C;

    /// Toy record with three gated groups of different shapes.
    #[derive(Debug, Default, PartialEq)]
    struct Gated {
        a: Option<i32>,
        b: Option<String>,
        c: Option<(u8, u16)>,
    }

    impl Gated {
        fn flags(&self) -> FieldFlags {
            FieldFlags::NONE
                .with(BIT_A, self.a.is_some())
                .with(BIT_B, self.b.is_some())
                .with(BIT_C, self.c.is_some())
        }

        fn encode(&self, writer: &mut ByteWriter) {
            let flags = self.flags();
            flags.write(writer);
            write_group(writer, flags, BIT_A, |w| {
                w.write_i32(self.a.unwrap_or_default());
            });
            write_group(writer, flags, BIT_B, |w| {
                w.write_wide_str(self.b.as_deref().unwrap_or_default());
            });
            write_group(writer, flags, BIT_C, |w| {
                let (x, y) = self.c.unwrap_or_default();
                w.write_u8(x);
                w.write_u16(y);
            });
        }

        fn decode(reader: &mut ByteReader<'_>) -> WireResult<Self> {
            let flags = FieldFlags::read(reader, KNOWN)?;
            Ok(Self {
                a: read_group(reader, flags, BIT_A, |r| r.read_i32())?,
                b: read_group(reader, flags, BIT_B, |r| r.read_wide_str())?,
                c: read_group(reader, flags, BIT_C, |r| {
                    Ok((r.read_u8()?, r.read_u16()?))
                })?,
            })
        }
    }

    #[test]
    fn test_all_subsets_roundtrip() {
        for bits in 0..8u8 {
            let record = Gated {
                a: (bits & BIT_A != 0).then_some(-7),
                b: (bits & BIT_B != 0).then(|| "gm".to_string()),
                c: (bits & BIT_C != 0).then_some((3, 500)),
            };

            let mut writer = ByteWriter::new();
            record.encode(&mut writer);
            assert_eq!(writer.as_slice()[0], bits);

            let mut reader = ByteReader::new(writer.as_slice());
            let decoded = Gated::decode(&mut reader).unwrap();
            assert_eq!(decoded, record);
            assert_eq!(decoded.flags(), FieldFlags(bits));
            assert_eq!(reader.remaining(), 0);
        }
    }

    #[test]
    fn test_unknown_bit_fails_closed() {
        let mut writer = ByteWriter::new();
        writer.write_u8(1 << 5);
        let mut reader = ByteReader::new(writer.as_slice());
        assert_eq!(
            Gated::decode(&mut reader).unwrap_err(),
            WireError::UnknownFlags {
                flags: 1 << 5,
                known: KNOWN
            }
        );
    }

    #[test]
    fn test_absent_group_consumes_nothing() {
        let record = Gated {
            a: None,
            b: Some("x".to_string()),
            c: None,
        };
        let mut writer = ByteWriter::new();
        record.encode(&mut writer);
        // flags + (u16 count + one unit), nothing for A or C.
        assert_eq!(writer.len(), 1 + 2 + 2);
    }
}
