//! Per-key counter state.

use serde::{Deserialize, Serialize};

/// Usage of one key within its current window.
///
/// Stores hand out copies; the live value never leaves the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowCounter {
    /// Requests counted in the current window.
    pub count: u64,

    /// Window start timestamp (Unix milliseconds).
    pub window_start_ms: u64,
}

impl WindowCounter {
    /// Create a counter.
    pub fn new(count: u64, window_start_ms: u64) -> Self {
        Self {
            count,
            window_start_ms,
        }
    }

    /// An empty counter for a window opened at `window_start_ms`.
    pub fn fresh(window_start_ms: u64) -> Self {
        Self::new(0, window_start_ms)
    }

    /// Restart the count at 0 in a new window.
    pub fn restart(&mut self, window_start_ms: u64) {
        self.count = 0;
        self.window_start_ms = window_start_ms;
    }

    /// Count one request.
    pub fn bump(&mut self) -> u64 {
        self.count = self.count.saturating_add(1);
        self.count
    }
}
