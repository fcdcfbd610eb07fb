//! Time sources for window bookkeeping.
//!
//! All window arithmetic is done in Unix epoch milliseconds. Production code
//! uses [`SystemClock`]; tests use [`ManualClock`] to cross window boundaries
//! without sleeping.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Source of the current time in Unix epoch milliseconds.
pub trait Clock: Send + Sync + 'static {
    /// Current timestamp in milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

/// Wall clock backed by [`std::time::SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        current_timestamp_ms()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying time, so a test can keep one handle and
/// give another to the limiter.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock frozen at `start_ms`.
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    /// Move the clock forward.
    ///
    /// Saturates at `u64::MAX` instead of wrapping.
    pub fn advance(&self, by: Duration) {
        let by = duration_ms(by);
        let _ = self
            .now
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.saturating_add(by))
            });
    }

    /// Jump to an absolute timestamp.
    pub fn set(&self, now_ms: u64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// Get the current timestamp in milliseconds since Unix epoch.
///
/// A system clock set before the epoch reads as 0.
pub fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(duration_ms)
        .unwrap_or(0)
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
