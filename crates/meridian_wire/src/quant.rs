//! # Quantized Vector Codec
//!
//! Fixed-point encodings for bandwidth-sensitive fields.
//!
//! A quantized field multiplies each component by a scale factor declared
//! per field (never per message), rounds half away from zero, and stores a
//! fixed-width signed integer. Decoding is the pure inverse division, so
//! `decode(encode(v))` recovers `v` within ±0.5/scale per axis.
//!
//! The codec never clamps: a value outside the target width is an
//! encode-side contract violation the caller must prevent, and it asserts
//! here rather than silently truncating onto the wire.
//!
//! Three concrete forms are used by the protocol:
//!
//! | form | width | scale | used for |
//! |---|---|---|---|
//! | [`CubeVec3`] | i8/axis | ×1 | cube/world-grid coordinates |
//! | [`CoordVec3`] | i16/axis | ×10 | live position and velocity sync |
//! | [`Vec3`] | f32/axis | - | full precision where size is no concern |

use bytemuck::{Pod, Zeroable};
use meridian_core::Vec3;

use crate::error::WireResult;
use crate::stream::{ByteReader, ByteWriter};
use crate::value::WireValue;

/// Scale factor of the deci forms (position, velocity, rotation).
pub const DECI_SCALE: f32 = 10.0;

/// Scale factor of the milli forms (tilt).
pub const MILLI_SCALE: f32 = 1000.0;

/// Quantizes one component: scale, then round half away from zero.
///
/// # Panics
///
/// The value must be finite and the scaled result must fit the declared
/// width (passed as `min..=max`); anything else is an encode contract
/// violation. NaN would otherwise saturate to 0 in the integer cast and
/// slip past the range check.
#[inline]
#[must_use]
pub fn quantize(value: f32, scale: f32, min: i64, max: i64) -> i64 {
    let scaled = (value * scale).round();
    assert!(scaled.is_finite(), "cannot quantize non-finite value {value}");
    let fixed = scaled as i64;
    assert!(
        (min..=max).contains(&fixed),
        "quantized value {fixed} (from {value} x{scale}) outside [{min}, {max}]"
    );
    fixed
}

/// Dequantizes one component: pure scale division, no clamping.
#[inline]
#[must_use]
pub fn dequantize(fixed: i64, scale: f32) -> f32 {
    fixed as f32 / scale
}

/// Quantizes an angle or coordinate into a ×10 i16, as the state-sync
/// rotation fields are carried.
#[inline]
#[must_use]
pub fn deci_i16(value: f32) -> i16 {
    quantize(value, DECI_SCALE, i64::from(i16::MIN), i64::from(i16::MAX)) as i16
}

/// Quantizes into a ×1000 i16 (the state-sync tilt field).
#[inline]
#[must_use]
pub fn milli_i16(value: f32) -> i16 {
    quantize(value, MILLI_SCALE, i64::from(i16::MIN), i64::from(i16::MAX)) as i16
}

/// Coarse grid vector: one signed byte per axis, scale ×1.
///
/// Carries cube/world-grid coordinates where a whole grid step per unit is
/// enough. Total size: 3 bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct CubeVec3 {
    /// Grid X.
    pub x: i8,
    /// Grid Y.
    pub y: i8,
    /// Grid Z.
    pub z: i8,
}

impl CubeVec3 {
    /// Size of the wire form in bytes.
    pub const SIZE: usize = 3;

    /// Quantizes a world-space vector onto the grid.
    #[must_use]
    pub fn from_world(v: Vec3) -> Self {
        Self {
            x: quantize(v.x, 1.0, i64::from(i8::MIN), i64::from(i8::MAX)) as i8,
            y: quantize(v.y, 1.0, i64::from(i8::MIN), i64::from(i8::MAX)) as i8,
            z: quantize(v.z, 1.0, i64::from(i8::MIN), i64::from(i8::MAX)) as i8,
        }
    }

    /// Recovers the world-space vector.
    #[must_use]
    pub fn to_world(self) -> Vec3 {
        Vec3::new(f32::from(self.x), f32::from(self.y), f32::from(self.z))
    }
}

impl WireValue for CubeVec3 {
    #[inline]
    fn write(&self, writer: &mut ByteWriter) {
        writer.write_pod(self);
    }

    #[inline]
    fn read(reader: &mut ByteReader<'_>) -> WireResult<Self> {
        reader.read_pod()
    }
}

/// Live sync vector: one i16 per axis at scale ×10.
///
/// The form position and velocity travel in every state-sync record; a
/// tenth of a world unit resolution at 6 bytes per vector. Total size: 6
/// bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct CoordVec3 {
    /// X component, world units ×10.
    pub x: i16,
    /// Y component, world units ×10.
    pub y: i16,
    /// Z component, world units ×10.
    pub z: i16,
}

impl CoordVec3 {
    /// Size of the wire form in bytes.
    pub const SIZE: usize = 6;

    /// Quantizes a world-space vector.
    #[must_use]
    pub fn from_world(v: Vec3) -> Self {
        Self {
            x: deci_i16(v.x),
            y: deci_i16(v.y),
            z: deci_i16(v.z),
        }
    }

    /// Recovers the world-space vector.
    #[must_use]
    pub fn to_world(self) -> Vec3 {
        Vec3::new(
            dequantize(i64::from(self.x), DECI_SCALE),
            dequantize(i64::from(self.y), DECI_SCALE),
            dequantize(i64::from(self.z), DECI_SCALE),
        )
    }
}

impl WireValue for CoordVec3 {
    #[inline]
    fn write(&self, writer: &mut ByteWriter) {
        writer.write_pod(self);
    }

    #[inline]
    fn read(reader: &mut ByteReader<'_>) -> WireResult<Self> {
        reader.read_pod()
    }
}
