//! # Meridian Core
//!
//! Shared primitives underneath the Meridian field server:
//!
//! - **Math**: world-space vectors in the client's coordinate system
//! - **Memory**: pre-allocated object pooling for per-tick workloads
//!
//! ## Architecture Rules
//!
//! 1. **No heap churn per tick** - pooled objects are reset, never freed
//! 2. **Plain data** - math types are `Pod` so they can go on the wire raw
//! 3. **Thread-safe where shared** - one pool serves many field instances

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod math;
pub mod memory;

pub use math::Vec3;
pub use memory::ObjectPool;
