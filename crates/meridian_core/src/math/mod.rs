//! # Math
//!
//! World-space vector math shared by the codec and the simulation.

mod vec;

pub use vec::Vec3;
