//! Window policies.
//!
//! A window policy answers one question for the counter store: is the count
//! held for a key still valid, or has its window ended? It never makes the
//! admission decision itself, so a different policy can be dropped in without
//! changing the evaluator.
//!
//! # Available Policies
//!
//! - **Fixed Window** (default): window opens at the first request for a key
//! - **Aligned Window**: windows aligned to multiples of the window length
//!   since the Unix epoch, shared by every key

use crate::storage::WindowCounter;

/// Window policy trait.
///
/// All arguments are Unix epoch milliseconds or millisecond durations.
/// `window_ms` is always at least 1.
pub trait WindowPolicy: Send + Sync + 'static {
    /// Get the policy name (for logging).
    fn name(&self) -> &'static str;

    /// Whether the counter's window has ended at `now_ms`.
    fn is_expired(&self, counter: &WindowCounter, now_ms: u64, window_ms: u64) -> bool;

    /// Start timestamp of a window opened at `now_ms`.
    fn window_start(&self, now_ms: u64, window_ms: u64) -> u64;

    /// Timestamp of the counter's next window boundary.
    fn reset_at(&self, counter: &WindowCounter, window_ms: u64) -> u64 {
        counter.window_start_ms.saturating_add(window_ms)
    }
}

impl<P: WindowPolicy + ?Sized> WindowPolicy for std::sync::Arc<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn is_expired(&self, counter: &WindowCounter, now_ms: u64, window_ms: u64) -> bool {
        (**self).is_expired(counter, now_ms, window_ms)
    }

    fn window_start(&self, now_ms: u64, window_ms: u64) -> u64 {
        (**self).window_start(now_ms, window_ms)
    }

    fn reset_at(&self, counter: &WindowCounter, window_ms: u64) -> u64 {
        (**self).reset_at(counter, window_ms)
    }
}

/// Fixed window anchored at the first request seen for a key.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedWindow;

impl FixedWindow {
    /// Create a new Fixed Window policy.
    pub fn new() -> Self {
        Self
    }
}

impl WindowPolicy for FixedWindow {
    fn name(&self) -> &'static str {
        "fixed_window"
    }

    fn is_expired(&self, counter: &WindowCounter, now_ms: u64, window_ms: u64) -> bool {
        now_ms >= self.reset_at(counter, window_ms)
    }

    fn window_start(&self, now_ms: u64, _window_ms: u64) -> u64 {
        now_ms
    }
}

/// Fixed window aligned to the Unix epoch.
///
/// Every key shares the same boundaries, so all counters reset together.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlignedWindow;

impl AlignedWindow {
    /// Create a new Aligned Window policy.
    pub fn new() -> Self {
        Self
    }
}

impl WindowPolicy for AlignedWindow {
    fn name(&self) -> &'static str {
        "aligned_window"
    }

    fn is_expired(&self, counter: &WindowCounter, now_ms: u64, window_ms: u64) -> bool {
        counter.window_start_ms != self.window_start(now_ms, window_ms)
    }

    fn window_start(&self, now_ms: u64, window_ms: u64) -> u64 {
        (now_ms / window_ms.max(1)) * window_ms.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_window_expiry() {
        let policy = FixedWindow::new();
        let counter = WindowCounter::new(3, 10_000);

        assert!(!policy.is_expired(&counter, 10_000, 1_000));
        assert!(!policy.is_expired(&counter, 10_999, 1_000));
        assert!(policy.is_expired(&counter, 11_000, 1_000));
        assert_eq!(policy.reset_at(&counter, 1_000), 11_000);
        assert_eq!(policy.window_start(12_345, 1_000), 12_345);
    }

    #[test]
    fn test_aligned_window_boundaries() {
        let policy = AlignedWindow::new();
        assert_eq!(policy.window_start(12_345, 1_000), 12_000);

        let counter = WindowCounter::new(1, 12_000);
        assert!(!policy.is_expired(&counter, 12_999, 1_000));
        assert!(policy.is_expired(&counter, 13_000, 1_000));
        assert_eq!(policy.reset_at(&counter, 1_000), 13_000);
    }

    #[test]
    fn test_reset_at_saturates() {
        let counter = WindowCounter::new(1, u64::MAX - 5);
        assert_eq!(FixedWindow.reset_at(&counter, 1_000), u64::MAX);
    }
}
