//! # Generic Value Dispatch
//!
//! Type-driven write/read for enumerations and fixed-layout value types.
//!
//! Call sites never branch on a type tag: `writer.write_value(v)` and
//! `reader.read_value::<T>()` resolve at compile time through
//! [`WireValue`]. New value types join the protocol by implementing the
//! trait (or through [`wire_enum!`]), never by modifying the stream layer.
//! A type without an impl is a compile error, not a runtime one.

use meridian_core::Vec3;

use crate::error::WireResult;
use crate::stream::{ByteReader, ByteWriter};

/// A value with a defined wire encoding: a matched write/read pair.
///
/// The two directions must consume identical byte sequences; every impl is
/// expected to carry a round-trip test.
pub trait WireValue: Sized {
    /// Appends this value's wire form.
    fn write(&self, writer: &mut ByteWriter);

    /// Reads one value of this type from the cursor.
    fn read(reader: &mut ByteReader<'_>) -> WireResult<Self>;
}

macro_rules! primitive_wire_value {
    ($($ty:ty => $write:ident / $read:ident),* $(,)?) => {
        $(
            impl WireValue for $ty {
                #[inline]
                fn write(&self, writer: &mut ByteWriter) {
                    writer.$write(*self);
                }

                #[inline]
                fn read(reader: &mut ByteReader<'_>) -> WireResult<Self> {
                    reader.$read()
                }
            }
        )*
    };
}

primitive_wire_value! {
    bool => write_bool / read_bool,
    u8 => write_u8 / read_u8,
    i8 => write_i8 / read_i8,
    u16 => write_u16 / read_u16,
    i16 => write_i16 / read_i16,
    u32 => write_u32 / read_u32,
    i32 => write_i32 / read_i32,
    u64 => write_u64 / read_u64,
    i64 => write_i64 / read_i64,
    f32 => write_f32 / read_f32,
}

/// Full-precision vector form: three little-endian f32 components.
///
/// Used where compactness is not required; the bandwidth-sensitive forms
/// live in [`crate::quant`].
impl WireValue for Vec3 {
    #[inline]
    fn write(&self, writer: &mut ByteWriter) {
        writer.write_f32(self.x);
        writer.write_f32(self.y);
        writer.write_f32(self.z);
    }

    #[inline]
    fn read(reader: &mut ByteReader<'_>) -> WireResult<Self> {
        Ok(Self::new(
            reader.read_f32()?,
            reader.read_f32()?,
            reader.read_f32()?,
        ))
    }
}

impl ByteWriter {
    /// Writes any value with a defined wire encoding.
    #[inline]
    pub fn write_value<T: WireValue>(&mut self, value: &T) {
        value.write(self);
    }
}

impl ByteReader<'_> {
    /// Reads any value with a defined wire encoding.
    #[inline]
    pub fn read_value<T: WireValue>(&mut self) -> WireResult<T> {
        T::read(self)
    }
}

/// Declares a closed wire enumeration with its underlying integer width.
///
/// The single declaration generates both directions, so the write and read
/// sequences cannot drift apart. Discriminants may be non-contiguous;
/// anything not declared is rejected at decode with
/// [`WireError::InvalidEnum`](crate::error::WireError::InvalidEnum).
///
/// ```rust
/// use meridian_wire::wire_enum;
///
/// wire_enum! {
///     /// Payload shapes of the trade opcode.
///     pub enum TradeCommand: u8 {
///         Request = 0,
///         Error = 1,
///         Acknowledge = 2,
///         Decline = 4,
///     }
/// }
/// ```
#[macro_export]
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident: $repr:ty {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident = $value:expr
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
        #[repr($repr)]
        $vis enum $name {
            #[default]
            $(
                $(#[$variant_meta])*
                $variant = $value,
            )*
        }

        impl $name {
            /// Maps a raw discriminant to its variant, if declared.
            #[must_use]
            $vis fn from_raw(value: $repr) -> Option<Self> {
                match value {
                    $(
                        v if v == $name::$variant as $repr => Some($name::$variant),
                    )*
                    _ => None,
                }
            }
        }

        impl $crate::value::WireValue for $name {
            #[inline]
            fn write(&self, writer: &mut $crate::stream::ByteWriter) {
                <$repr as $crate::value::WireValue>::write(&(*self as $repr), writer);
            }

            fn read(
                reader: &mut $crate::stream::ByteReader<'_>,
            ) -> $crate::error::WireResult<Self> {
                let value = <$repr as $crate::value::WireValue>::read(reader)?;
                match value {
                    $(
                        v if v == $name::$variant as $repr => Ok($name::$variant),
                    )*
                    _ => Err($crate::error::WireError::InvalidEnum {
                        type_name: stringify!($name),
                        value: value as i64,
                    }),
                }
            }
        }
    };
}
