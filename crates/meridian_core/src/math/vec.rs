//! World-space vector type.
//!
//! The client's coordinate system is right-handed with Z up; one world unit
//! is one centimeter. `Vec3` is deliberately plain data (`Pod`) so the
//! full-precision wire form is a direct memory copy.

use bytemuck::{Pod, Zeroable};

/// A 3D vector in world space.
///
/// Total size: 12 bytes, no padding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vec3 {
    /// X coordinate in world units.
    pub x: f32,
    /// Y coordinate in world units.
    pub y: f32,
    /// Z coordinate in world units.
    pub z: f32,
}

impl Vec3 {
    /// Size of the raw wire form in bytes.
    pub const SIZE: usize = 12;

    /// The zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Creates a new vector.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Returns the squared length.
    ///
    /// Avoids the sqrt call for magnitude comparisons.
    #[inline]
    #[must_use]
    pub fn length_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Returns true if every component is within `tolerance` of `other`.
    ///
    /// Used by quantization tests, where exact equality is not meaningful.
    #[inline]
    #[must_use]
    pub fn approx_eq(&self, other: Self, tolerance: f32) -> bool {
        (self.x - other.x).abs() <= tolerance
            && (self.y - other.y).abs() <= tolerance
            && (self.z - other.z).abs() <= tolerance
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}
