//! # Primitive Stream
//!
//! Sequential, forward-only byte stream access underneath every packet.
//!
//! ## Design
//!
//! - `ByteWriter` appends into a growable buffer; writes never fail
//! - `ByteReader` is a bounds-checked cursor over a received frame; a read
//!   past the end fails with [`WireError::UnexpectedEof`] and touches no
//!   shared state
//! - All multi-byte integers are little-endian, matching the client
//! - Strings come in two encodings: narrow (one-byte length prefix counting
//!   bytes) and wide (two-byte prefix counting UTF-16 code units)

use bytemuck::Pod;

use crate::error::{WireError, WireResult};
use crate::value::WireValue;

/// Growable byte buffer with append-only write operations.
///
/// Designed to be reused: the frame layer and the buffer pool call
/// [`ByteWriter::clear`] between frames so the backing allocation survives.
#[derive(Clone, Debug, Default)]
pub struct ByteWriter {
    buffer: Vec<u8>,
}

impl ByteWriter {
    /// Creates an empty writer.
    #[must_use]
    pub const fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Creates a writer with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of bytes written.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if no bytes have been written.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns the written bytes.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the writer, returning the written bytes.
    #[inline]
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.buffer
    }

    /// Resets the writer for reuse, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Writes a boolean as a single 0/1 byte.
    #[inline]
    pub fn write_bool(&mut self, value: bool) {
        self.buffer.push(u8::from(value));
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Writes a signed byte.
    #[inline]
    pub fn write_i8(&mut self, value: i8) {
        self.buffer.push(value as u8);
    }

    /// Writes a u16 in little-endian order.
    #[inline]
    pub fn write_u16(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes an i16 in little-endian order.
    #[inline]
    pub fn write_i16(&mut self, value: i16) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a u32 in little-endian order.
    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes an i32 in little-endian order.
    #[inline]
    pub fn write_i32(&mut self, value: i32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a u64 in little-endian order.
    #[inline]
    pub fn write_u64(&mut self, value: u64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes an i64 in little-endian order.
    #[inline]
    pub fn write_i64(&mut self, value: i64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes an IEEE-754 f32 in little-endian order.
    #[inline]
    pub fn write_f32(&mut self, value: f32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes raw bytes with no prefix or terminator.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Writes a value's default as a placeholder for a reserved field.
    ///
    /// The decoder still consumes reserved fields positionally, so they are
    /// written explicitly rather than omitted.
    #[inline]
    pub fn write_default<T: WireValue + Default>(&mut self) {
        T::default().write(self);
    }

    /// Writes a narrow string: one-byte length prefix counting bytes,
    /// followed by the raw bytes, no terminator.
    ///
    /// An empty string still emits its zero-length prefix.
    ///
    /// # Panics
    ///
    /// A string longer than 255 bytes cannot be represented in this
    /// encoding; passing one is an encode contract violation.
    pub fn write_str(&mut self, value: &str) {
        let bytes = value.as_bytes();
        assert!(
            bytes.len() <= usize::from(u8::MAX),
            "narrow string of {} bytes exceeds one-byte length prefix",
            bytes.len()
        );
        self.buffer.push(bytes.len() as u8);
        self.buffer.extend_from_slice(bytes);
    }

    /// Writes a wide string: two-byte prefix counting UTF-16 code units,
    /// followed by two little-endian bytes per unit.
    ///
    /// # Panics
    ///
    /// A string of more than 65535 UTF-16 units is an encode contract
    /// violation.
    pub fn write_wide_str(&mut self, value: &str) {
        let count = value.encode_utf16().count();
        assert!(
            count <= usize::from(u16::MAX),
            "wide string of {count} UTF-16 units exceeds two-byte length prefix"
        );
        self.write_u16(count as u16);
        for unit in value.encode_utf16() {
            self.write_u16(unit);
        }
    }

    /// Writes a fixed-layout value as its raw bytes.
    #[inline]
    pub fn write_pod<T: Pod>(&mut self, value: &T) {
        self.buffer.extend_from_slice(bytemuck::bytes_of(value));
    }

    /// Overwrites two previously written bytes with a little-endian u16.
    ///
    /// Used to back-patch a length prefix once the covered bytes are final.
    ///
    /// # Panics
    ///
    /// `offset + 2` must lie within the bytes already written.
    pub fn patch_u16(&mut self, offset: usize, value: u16) {
        assert!(
            offset + 2 <= self.buffer.len(),
            "patch offset {offset} outside written range"
        );
        self.buffer[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }
}

/// Bounds-checked forward-only cursor over a received frame.
#[derive(Clone, Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a reader over the given bytes.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Returns the number of unread bytes.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Returns the cursor position from the start of the buffer.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    fn take(&mut self, len: usize) -> WireResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(WireError::UnexpectedEof {
                needed: len,
                available: self.remaining(),
            });
        }
        let start = self.position;
        self.position += len;
        Ok(&self.data[start..start + len])
    }

    /// Reads a boolean byte, rejecting anything but 0 or 1.
    pub fn read_bool(&mut self) -> WireResult<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(WireError::InvalidBool(other)),
        }
    }

    /// Reads a single byte.
    pub fn read_u8(&mut self) -> WireResult<u8> {
        Ok(self.take(1)?[0])
    }

    /// Reads a signed byte.
    pub fn read_i8(&mut self) -> WireResult<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Reads a little-endian u16.
    pub fn read_u16(&mut self) -> WireResult<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Reads a little-endian i16.
    pub fn read_i16(&mut self) -> WireResult<i16> {
        let bytes = self.take(2)?;
        Ok(i16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Reads a little-endian u32.
    pub fn read_u32(&mut self) -> WireResult<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a little-endian i32.
    pub fn read_i32(&mut self) -> WireResult<i32> {
        let bytes = self.take(4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a little-endian u64.
    pub fn read_u64(&mut self) -> WireResult<u64> {
        let bytes = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(raw))
    }

    /// Reads a little-endian i64.
    pub fn read_i64(&mut self) -> WireResult<i64> {
        let bytes = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(i64::from_le_bytes(raw))
    }

    /// Reads a little-endian IEEE-754 f32.
    pub fn read_f32(&mut self) -> WireResult<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    /// Reads `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> WireResult<&'a [u8]> {
        self.take(len)
    }

    /// Advances the cursor without interpreting the bytes.
    pub fn skip(&mut self, len: usize) -> WireResult<()> {
        self.take(len).map(|_| ())
    }

    /// Reads a narrow string (one-byte length prefix counting bytes).
    pub fn read_str(&mut self) -> WireResult<String> {
        let len = usize::from(self.read_u8()?);
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| WireError::MalformedString { encoding: "narrow" })
    }

    /// Reads a wide string (two-byte prefix counting UTF-16 code units).
    pub fn read_wide_str(&mut self) -> WireResult<String> {
        let count = usize::from(self.read_u16()?);
        let mut units = Vec::with_capacity(count);
        for _ in 0..count {
            units.push(self.read_u16()?);
        }
        String::from_utf16(&units)
            .map_err(|_| WireError::MalformedString { encoding: "wide" })
    }

    /// Reads a fixed-layout value from its raw bytes.
    pub fn read_pod<T: Pod>(&mut self) -> WireResult<T> {
        let bytes = self.take(std::mem::size_of::<T>())?;
        bytemuck::try_pod_read_unaligned(bytes).map_err(|_| WireError::MalformedValue {
            type_name: std::any::type_name::<T>(),
        })
    }

    /// Splits off a reader over the next `len` bytes and advances past them.
    ///
    /// Lets a batch decoder confine a length-prefixed sub-message: however
    /// the sub-reader fails, the parent cursor is already past the record.
    pub fn sub_reader(&mut self, len: usize) -> WireResult<ByteReader<'a>> {
        if self.remaining() < len {
            return Err(WireError::SubMessageOverrun {
                declared: len,
                available: self.remaining(),
            });
        }
        Ok(ByteReader::new(self.take(len)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_roundtrip() {
        let mut writer = ByteWriter::new();
        writer.write_u8(0xAB);
        writer.write_i8(-5);
        writer.write_u16(0xBEEF);
        writer.write_i16(-1234);
        writer.write_u32(0xDEAD_BEEF);
        writer.write_i32(-1);
        writer.write_u64(0x0123_4567_89AB_CDEF);
        writer.write_i64(i64::MIN);
        writer.write_f32(1.5);
        writer.write_bool(true);

        let mut reader = ByteReader::new(writer.as_slice());
        assert_eq!(reader.read_u8().unwrap(), 0xAB);
        assert_eq!(reader.read_i8().unwrap(), -5);
        assert_eq!(reader.read_u16().unwrap(), 0xBEEF);
        assert_eq!(reader.read_i16().unwrap(), -1234);
        assert_eq!(reader.read_u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(reader.read_i32().unwrap(), -1);
        assert_eq!(reader.read_u64().unwrap(), 0x0123_4567_89AB_CDEF);
        assert_eq!(reader.read_i64().unwrap(), i64::MIN);
        assert_eq!(reader.read_f32().unwrap(), 1.5);
        assert!(reader.read_bool().unwrap());
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_little_endian_layout() {
        let mut writer = ByteWriter::new();
        writer.write_u16(0x1234);
        assert_eq!(writer.as_slice(), &[0x34, 0x12]);
    }

    #[test]
    fn test_read_past_end() {
        let mut reader = ByteReader::new(&[0x01, 0x02]);
        let err = reader.read_u32().unwrap_err();
        assert_eq!(
            err,
            WireError::UnexpectedEof {
                needed: 4,
                available: 2
            }
        );
        // Failed read consumed nothing; the two bytes are still readable.
        assert_eq!(reader.read_u16().unwrap(), 0x0201);
    }

    #[test]
    fn test_invalid_bool() {
        let mut reader = ByteReader::new(&[2]);
        assert_eq!(reader.read_bool().unwrap_err(), WireError::InvalidBool(2));
    }

    #[test]
    fn test_empty_narrow_string_is_single_zero_byte() {
        let mut writer = ByteWriter::new();
        writer.write_str("");
        assert_eq!(writer.as_slice(), &[0x00]);

        let mut reader = ByteReader::new(writer.as_slice());
        assert_eq!(reader.read_str().unwrap(), "");
    }

    #[test]
    fn test_wide_string_counts_units_not_bytes() {
        let mut writer = ByteWriter::new();
        writer.write_wide_str("AB");
        // Count of 2 units, then 'A' and 'B' as little-endian UTF-16.
        assert_eq!(writer.as_slice(), &[0x02, 0x00, 0x41, 0x00, 0x42, 0x00]);

        let mut reader = ByteReader::new(writer.as_slice());
        assert_eq!(reader.read_wide_str().unwrap(), "AB");
    }

    #[test]
    fn test_wide_string_non_bmp() {
        let mut writer = ByteWriter::new();
        writer.write_wide_str("a\u{1F600}"); // surrogate pair: 3 units
        let mut reader = ByteReader::new(writer.as_slice());
        assert_eq!(reader.read_u16().unwrap(), 3);

        let mut reader = ByteReader::new(writer.as_slice());
        assert_eq!(reader.read_wide_str().unwrap(), "a\u{1F600}");
    }

    #[test]
    fn test_default_writes_consume_positionally() {
        let mut writer = ByteWriter::new();
        writer.write_default::<u8>();
        writer.write_default::<i64>();
        writer.write_u16(77);

        let mut reader = ByteReader::new(writer.as_slice());
        assert_eq!(reader.read_u8().unwrap(), 0);
        assert_eq!(reader.read_i64().unwrap(), 0);
        assert_eq!(reader.read_u16().unwrap(), 77);
    }

    #[test]
    fn test_patch_u16() {
        let mut writer = ByteWriter::new();
        writer.write_u16(0); // placeholder
        writer.write_bytes(b"xyz");
        writer.patch_u16(0, 3);
        assert_eq!(writer.as_slice(), &[0x03, 0x00, b'x', b'y', b'z']);
    }

    #[test]
    fn test_sub_reader_confines_and_advances() {
        let mut writer = ByteWriter::new();
        writer.write_bytes(&[1, 2, 3, 4, 5]);
        let mut reader = ByteReader::new(writer.as_slice());

        let mut sub = reader.sub_reader(3).unwrap();
        assert_eq!(sub.read_u8().unwrap(), 1);
        assert!(sub.read_u32().is_err()); // confined to 3 bytes
        assert_eq!(reader.read_u8().unwrap(), 4); // parent already past them

        let err = reader.sub_reader(9).unwrap_err();
        assert_eq!(
            err,
            WireError::SubMessageOverrun {
                declared: 9,
                available: 1
            }
        );
    }
}
