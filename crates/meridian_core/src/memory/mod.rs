//! # Memory
//!
//! Pre-allocated object pooling for per-tick workloads.

mod pool;

pub use pool::ObjectPool;
