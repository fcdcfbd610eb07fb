//! In-memory counter store with expired-entry sweeping.
//!
//! This store uses `DashMap` for thread-safe concurrent access. Each entry
//! remembers when its window ends so that keys which stopped sending requests
//! can be swept instead of accumulating forever.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::clock::{Clock, SystemClock};
use crate::storage::{CounterStore, WindowCounter};
use crate::window::WindowPolicy;

/// When expired entries are swept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepInterval {
    /// Sweep every N increments.
    Requests(u64),
    /// Sweep from a background tokio task at fixed time intervals.
    Duration(Duration),
    /// Only sweep when [`MemoryStore::sweep_expired`] is called.
    Manual,
}

impl Default for SweepInterval {
    fn default() -> Self {
        Self::Requests(10_000)
    }
}

/// Sweep configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepConfig {
    /// When to trigger a sweep.
    pub interval: SweepInterval,
}

impl SweepConfig {
    /// Sweep every `count` increments.
    pub fn on_requests(count: u64) -> Self {
        Self {
            interval: SweepInterval::Requests(count),
        }
    }

    /// Sweep from a background task every `interval`.
    pub fn on_duration(interval: Duration) -> Self {
        Self {
            interval: SweepInterval::Duration(interval),
        }
    }

    /// Manual sweeping only.
    pub fn manual() -> Self {
        Self {
            interval: SweepInterval::Manual,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    counter: WindowCounter,
    /// End of the counter's window (Unix milliseconds).
    expires_at: u64,
}

impl Slot {
    fn record(&mut self, now_ms: u64, policy: &dyn WindowPolicy, window_ms: u64) -> WindowCounter {
        if policy.is_expired(&self.counter, now_ms, window_ms) {
            self.counter.restart(policy.window_start(now_ms, window_ms));
        }
        self.counter.bump();
        self.expires_at = policy.reset_at(&self.counter, window_ms);
        self.counter
    }
}

/// In-memory counter store.
///
/// The window check, restart and increment for a key all happen while the
/// DashMap shard holding that key is write-locked, so concurrent callers never
/// observe the same pre-increment count and concurrent inserts of different
/// keys cannot lose each other.
///
/// # Example
///
/// ```
/// use admission_gate::storage::{MemoryStore, SweepConfig};
///
/// // Default: sweep every 10000 increments
/// let store = MemoryStore::new();
///
/// // Manual sweeping only
/// let store = MemoryStore::with_sweep(SweepConfig::manual());
/// store.sweep_expired(admission_gate::clock::current_timestamp_ms());
/// ```
///
/// A background sweep judges expiry by the store's own clock, which must be
/// the limiter's clock. Use [`MemoryStore::with_sweep_clock`] when the
/// limiter is built with anything other than [`SystemClock`].
pub struct MemoryStore {
    data: Arc<DashMap<String, Slot>>,
    sweep_config: SweepConfig,
    clock: Arc<dyn Clock>,
    request_count: AtomicU64,
    sweep_lock: Mutex<()>,
    shutdown: Arc<Notify>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.data.len())
            .field("sweep_config", &self.sweep_config)
            .finish()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a new store with the default sweep configuration.
    pub fn new() -> Self {
        Self::with_sweep(SweepConfig::default())
    }

    /// Create a new store with a custom sweep configuration.
    ///
    /// [`SweepInterval::Duration`] spawns a background task and needs a
    /// running tokio runtime; without one the store logs a warning and falls
    /// back to manual sweeping.
    pub fn with_sweep(sweep_config: SweepConfig) -> Self {
        Self::with_sweep_clock(sweep_config, SystemClock)
    }

    /// Create a new store whose background sweep reads time from `clock`.
    ///
    /// Pass the same clock the limiter uses, otherwise the sweep can drop
    /// counters whose window is still open.
    pub fn with_sweep_clock<C: Clock>(sweep_config: SweepConfig, clock: C) -> Self {
        let store = Self {
            data: Arc::new(DashMap::new()),
            sweep_config,
            clock: Arc::new(clock),
            request_count: AtomicU64::new(0),
            sweep_lock: Mutex::new(()),
            shutdown: Arc::new(Notify::new()),
        };

        if let SweepInterval::Duration(interval) = store.sweep_config.interval {
            store.start_sweep_task(interval);
        }

        store
    }

    fn start_sweep_task(&self, interval: Duration) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                ?interval,
                "no tokio runtime available, background sweep disabled"
            );
            return;
        };

        let data = Arc::clone(&self.data);
        let clock = Arc::clone(&self.clock);
        let shutdown = Arc::clone(&self.shutdown);

        handle.spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        let removed = sweep_map(&data, clock.now_ms());
                        if removed > 0 {
                            tracing::trace!(removed, "swept expired rate limit counters");
                        }
                    }
                    _ = shutdown.notified() => {
                        break;
                    }
                }
            }
        });
    }

    /// Remove every entry whose window ended at or before `now_ms`.
    ///
    /// Returns the number of removed entries.
    pub fn sweep_expired(&self, now_ms: u64) -> usize {
        let _guard = self.sweep_lock.lock();
        sweep_map(&self.data, now_ms)
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.data.clear();
    }

    fn maybe_sweep(&self, now_ms: u64) {
        if let SweepInterval::Requests(threshold) = self.sweep_config.interval {
            let count = self.request_count.fetch_add(1, Ordering::Relaxed);
            if threshold > 0 && count > 0 && count % threshold == 0 {
                if let Some(_guard) = self.sweep_lock.try_lock() {
                    sweep_map(&self.data, now_ms);
                }
            }
        }
    }
}

impl Drop for MemoryStore {
    fn drop(&mut self) {
        self.shutdown.notify_one();
    }
}

fn sweep_map(data: &DashMap<String, Slot>, now_ms: u64) -> usize {
    let before = data.len();
    data.retain(|_, slot| slot.expires_at > now_ms);
    before.saturating_sub(data.len())
}

impl CounterStore for MemoryStore {
    fn increment(
        &self,
        key: &str,
        now_ms: u64,
        policy: &dyn WindowPolicy,
        window_ms: u64,
    ) -> WindowCounter {
        // Must run before any shard guard is taken below.
        self.maybe_sweep(now_ms);

        if let Some(mut slot) = self.data.get_mut(key) {
            return slot.record(now_ms, policy, window_ms);
        }

        self.data
            .entry(key.to_string())
            .or_insert_with(|| Slot {
                counter: WindowCounter::fresh(policy.window_start(now_ms, window_ms)),
                expires_at: 0,
            })
            .record(now_ms, policy, window_ms)
    }

    fn peek(
        &self,
        key: &str,
        now_ms: u64,
        policy: &dyn WindowPolicy,
        window_ms: u64,
    ) -> WindowCounter {
        match self.data.get(key) {
            Some(slot) if !policy.is_expired(&slot.counter, now_ms, window_ms) => slot.counter,
            _ => WindowCounter::fresh(policy.window_start(now_ms, window_ms)),
        }
    }

    fn reset(&self, key: Option<&str>) {
        match key {
            Some(key) => {
                self.data.remove(key);
            }
            None => self.clear(),
        }
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::limiter::RateLimiter;
    use crate::window::{AlignedWindow, FixedWindow};

    #[test]
    fn test_increment_creates_and_counts() {
        let store = MemoryStore::new();

        assert_eq!(store.increment("key1", 1_000, &FixedWindow, 60_000).count, 1);
        assert_eq!(store.increment("key1", 1_001, &FixedWindow, 60_000).count, 2);
        assert_eq!(store.increment("key2", 1_002, &FixedWindow, 60_000).count, 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_increment_restarts_expired_window() {
        let store = MemoryStore::new();

        store.increment("key1", 1_000, &FixedWindow, 1_000);
        store.increment("key1", 1_500, &FixedWindow, 1_000);

        // New window
        let counter = store.increment("key1", 2_000, &FixedWindow, 1_000);
        assert_eq!(counter, WindowCounter::new(1, 2_000));
    }

    #[test]
    fn test_peek_does_not_mutate() {
        let store = MemoryStore::new();
        store.increment("key1", 1_000, &FixedWindow, 60_000);

        let peeked = store.peek("key1", 1_000, &FixedWindow, 60_000);
        assert_eq!(peeked.count, 1);
        assert_eq!(store.peek("key1", 1_000, &FixedWindow, 60_000).count, 1);

        assert_eq!(store.peek("missing", 1_000, &FixedWindow, 60_000).count, 0);
        assert!(store.peek("missing", 1_000, &FixedWindow, 60_000).window_start_ms == 1_000);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_peek_expired_reads_as_fresh() {
        let store = MemoryStore::new();
        store.increment("key1", 12_100, &AlignedWindow, 1_000);

        let counter = store.peek("key1", 13_050, &AlignedWindow, 1_000);
        assert_eq!(counter, WindowCounter::fresh(13_000));
    }

    #[test]
    fn test_reset_single_and_all() {
        let store = MemoryStore::new();
        store.increment("a", 1_000, &FixedWindow, 60_000);
        store.increment("b", 1_000, &FixedWindow, 60_000);

        store.reset(Some("a"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.peek("b", 1_000, &FixedWindow, 60_000).count, 1);

        store.reset(None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_sweep_expired() {
        let store = MemoryStore::with_sweep(SweepConfig::manual());
        store.increment("old", 1_000, &FixedWindow, 1_000);
        store.increment("live", 1_900, &FixedWindow, 1_000);

        assert_eq!(store.sweep_expired(2_000), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.peek("live", 2_000, &FixedWindow, 1_000).count, 1);
    }

    #[test]
    fn test_request_based_sweep() {
        let store = MemoryStore::with_sweep(SweepConfig::on_requests(2));
        store.increment("old", 1_000, &FixedWindow, 1_000);
        store.increment("new", 5_000, &FixedWindow, 1_000);
        // Third increment trips the sweep before counting
        store.increment("new", 5_001, &FixedWindow, 1_000);

        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_zero_request_threshold_never_sweeps() {
        let store = MemoryStore::with_sweep(SweepConfig::on_requests(0));
        store.increment("old", 1_000, &FixedWindow, 1_000);
        store.increment("new", 5_000, &FixedWindow, 1_000);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_duration_sweep_without_runtime_falls_back() {
        let store = MemoryStore::with_sweep(SweepConfig::on_duration(Duration::from_millis(5)));
        store.increment("key", 1_000, &FixedWindow, 1_000);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_sweep_task() {
        let clock = ManualClock::new(1_000);
        let store = MemoryStore::with_sweep_clock(
            SweepConfig::on_duration(Duration::from_millis(50)),
            clock.clone(),
        );
        store.increment("stale", 1_000, &FixedWindow, 1_000);

        clock.set(2_000);
        tokio::time::sleep(Duration::from_millis(60)).await;
        tokio::task::yield_now().await;

        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_sweep_keeps_live_counters() {
        let clock = ManualClock::new(1_000_000);
        let store = MemoryStore::with_sweep_clock(
            SweepConfig::on_duration(Duration::from_millis(50)),
            clock.clone(),
        );
        let limiter = RateLimiter::builder()
            .limit(1)
            .window(Duration::from_secs(60))
            .store(store)
            .clock(clock.clone())
            .build();

        assert!(limiter.check(Some("k")).is_allowed());
        assert!(limiter.check(Some("k")).is_denied());

        tokio::time::sleep(Duration::from_millis(60)).await;
        tokio::task::yield_now().await;

        assert_eq!(limiter.store().len(), 1);
        assert!(limiter.check(Some("k")).is_denied());

        clock.advance(Duration::from_secs(60));
        tokio::time::sleep(Duration::from_millis(60)).await;
        tokio::task::yield_now().await;

        assert!(limiter.store().is_empty());
        assert!(limiter.check(Some("k")).is_allowed());
    }
}
