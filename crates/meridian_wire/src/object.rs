//! # Composite Object Dispatch
//!
//! Write/read for types that define their own ordered multi-field encoding.
//!
//! A composite supplies both directions as a matched pair on one trait, so
//! the field order lives in exactly one file. That symmetry is still
//! maintained by hand - it is the single largest source of protocol bugs -
//! which is why every [`WireObject`] impl in this crate sits next to a
//! round-trip test exercising write and read together.

use crate::error::WireResult;
use crate::stream::{ByteReader, ByteWriter};
use crate::value::WireValue;

/// A composite type with its own ordered wire encoding.
///
/// Impls compose recursively: a composite may write values, strings,
/// collections, and other composites, in a fixed declared order identical
/// in both directions.
pub trait WireObject: Sized {
    /// Appends every field in declared order.
    fn write_to(&self, writer: &mut ByteWriter);

    /// Reads every field in the same declared order.
    fn read_from(reader: &mut ByteReader<'_>) -> WireResult<Self>;
}

impl ByteWriter {
    /// Writes a composite object.
    #[inline]
    pub fn write_object<T: WireObject>(&mut self, value: &T) {
        value.write_to(self);
    }

    /// Writes a collection as an i32 count followed by its elements.
    ///
    /// An empty collection still writes its zero count - the field is never
    /// omitted.
    pub fn write_collection<T: WireValue>(&mut self, values: &[T]) {
        self.write_i32(values.len() as i32);
        for value in values {
            self.write_value(value);
        }
    }

    /// Writes a collection of composites, count-prefixed the same way.
    pub fn write_object_collection<T: WireObject>(&mut self, values: &[T]) {
        self.write_i32(values.len() as i32);
        for value in values {
            self.write_object(value);
        }
    }
}

impl ByteReader<'_> {
    /// Reads a composite object.
    #[inline]
    pub fn read_object<T: WireObject>(&mut self) -> WireResult<T> {
        T::read_from(self)
    }

    /// Reads an i32-count-prefixed collection of values.
    pub fn read_collection<T: WireValue>(&mut self) -> WireResult<Vec<T>> {
        let count = self.read_i32()?.max(0) as usize;
        // Bound the reservation by what the buffer could possibly hold, so
        // a hostile count cannot balloon memory before the reads fail.
        let mut values = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            values.push(self.read_value()?);
        }
        Ok(values)
    }

    /// Reads an i32-count-prefixed collection of composites.
    pub fn read_object_collection<T: WireObject>(&mut self) -> WireResult<Vec<T>> {
        let count = self.read_i32()?.max(0) as usize;
        let mut values = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            values.push(self.read_object()?);
        }
        Ok(values)
    }
}
