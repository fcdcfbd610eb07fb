//! Counter store trait and the in-memory implementation.
//!
//! This module defines the `CounterStore` trait that holds per-key window
//! counters, along with the built-in DashMap-backed [`MemoryStore`].

mod entry;
mod memory;

pub use entry::WindowCounter;
pub use memory::{MemoryStore, SweepConfig, SweepInterval};

use crate::window::WindowPolicy;

/// Store of per-key window counters.
///
/// Every operation is synchronous and total. Implementations must be
/// thread-safe (`Send + Sync`), and `increment` must run the window check and
/// the increment as one atomic step per key.
///
/// # Example
///
/// ```
/// use admission_gate::storage::{CounterStore, MemoryStore};
/// use admission_gate::window::FixedWindow;
///
/// let store = MemoryStore::new();
/// let counter = store.increment("user:1", 1_000, &FixedWindow, 60_000);
/// assert_eq!(counter.count, 1);
/// assert_eq!(store.peek("user:1", 1_001, &FixedWindow, 60_000).count, 1);
/// ```
pub trait CounterStore: Send + Sync + 'static {
    /// Atomically count one request for `key`.
    ///
    /// The policy is consulted first: an expired window restarts at 0 before
    /// counting. A missing entry is created at 0. Returns the counter AFTER
    /// incrementing.
    fn increment(
        &self,
        key: &str,
        now_ms: u64,
        policy: &dyn WindowPolicy,
        window_ms: u64,
    ) -> WindowCounter;

    /// Read the counter for `key` without mutating it.
    ///
    /// Missing or expired entries read as an empty counter in a window
    /// opened at `now_ms`.
    fn peek(
        &self,
        key: &str,
        now_ms: u64,
        policy: &dyn WindowPolicy,
        window_ms: u64,
    ) -> WindowCounter;

    /// Clear the counter for one key, or every key when `key` is `None`.
    fn reset(&self, key: Option<&str>);

    /// Number of keys currently tracked.
    fn len(&self) -> usize;

    /// Whether no key is tracked.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: CounterStore + ?Sized> CounterStore for std::sync::Arc<S> {
    fn increment(
        &self,
        key: &str,
        now_ms: u64,
        policy: &dyn WindowPolicy,
        window_ms: u64,
    ) -> WindowCounter {
        (**self).increment(key, now_ms, policy, window_ms)
    }

    fn peek(
        &self,
        key: &str,
        now_ms: u64,
        policy: &dyn WindowPolicy,
        window_ms: u64,
    ) -> WindowCounter {
        (**self).peek(key, now_ms, policy, window_ms)
    }

    fn reset(&self, key: Option<&str>) {
        (**self).reset(key)
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}

impl<S: CounterStore + ?Sized> CounterStore for Box<S> {
    fn increment(
        &self,
        key: &str,
        now_ms: u64,
        policy: &dyn WindowPolicy,
        window_ms: u64,
    ) -> WindowCounter {
        (**self).increment(key, now_ms, policy, window_ms)
    }

    fn peek(
        &self,
        key: &str,
        now_ms: u64,
        policy: &dyn WindowPolicy,
        window_ms: u64,
    ) -> WindowCounter {
        (**self).peek(key, now_ms, policy, window_ms)
    }

    fn reset(&self, key: Option<&str>) {
        (**self).reset(key)
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}
