//! # Object Pool
//!
//! Thread-safe pool for objects that are acquired and released every tick.
//!
//! Unlike an allocator, the pool never frees: released objects go back on
//! the free list and are handed out again. One pool is shared by all field
//! instances on a host, so acquire and release must be safe to call
//! concurrently. An acquired object belongs exclusively to the caller until
//! it is released.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

/// A concurrent pool of reusable objects.
///
/// Objects are created on demand by the factory when the free list is
/// empty, so the pool never fails to acquire; it only grows to the
/// high-water mark of concurrent use.
///
/// # Example
///
/// ```rust
/// use meridian_core::ObjectPool;
///
/// let pool: ObjectPool<Vec<u8>> = ObjectPool::new(Vec::new);
/// let mut buffer = pool.acquire();
/// buffer.extend_from_slice(b"scratch");
/// buffer.clear(); // caller resets before release
/// pool.release(buffer);
/// assert_eq!(pool.outstanding(), 0);
/// ```
pub struct ObjectPool<T> {
    /// Released objects awaiting reuse.
    free: Mutex<Vec<T>>,
    /// Factory invoked when the free list is empty.
    factory: fn() -> T,
    /// Number of acquired objects not yet released.
    outstanding: AtomicUsize,
}

impl<T> ObjectPool<T> {
    /// Creates an empty pool with the given factory.
    ///
    /// No objects are created until first acquire.
    #[must_use]
    pub const fn new(factory: fn() -> T) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            factory,
            outstanding: AtomicUsize::new(0),
        }
    }

    /// Creates a pool pre-populated with `capacity` objects.
    #[must_use]
    pub fn with_capacity(factory: fn() -> T, capacity: usize) -> Self {
        let pool = Self::new(factory);
        {
            let mut free = pool.free.lock();
            free.reserve(capacity);
            for _ in 0..capacity {
                free.push(factory());
            }
        }
        pool
    }

    /// Takes an object from the pool, creating one if none are free.
    ///
    /// The object is in whatever state the releasing caller left it; users
    /// that need a clean object must reset it themselves (the wire layer's
    /// buffer pool does this on release, so a fresh buffer never exposes a
    /// prior frame's bytes).
    #[must_use]
    pub fn acquire(&self) -> T {
        self.outstanding.fetch_add(1, Ordering::Relaxed);
        self.free.lock().pop().unwrap_or_else(|| (self.factory)())
    }

    /// Returns an object to the free list.
    ///
    /// Only objects that came from [`acquire`](Self::acquire) on this pool
    /// may be released; debug builds assert the outstanding count cannot
    /// go below zero.
    pub fn release(&self, value: T) {
        debug_assert!(
            self.outstanding() > 0,
            "release of an object that was never acquired from this pool"
        );
        self.free.lock().push(value);
        self.outstanding.fetch_sub(1, Ordering::Relaxed);
    }

    /// Number of acquired objects not yet released.
    #[inline]
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Relaxed)
    }

    /// Number of objects currently sitting on the free list.
    #[inline]
    #[must_use]
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }
}
