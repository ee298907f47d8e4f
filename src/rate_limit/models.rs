use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::time::Instant;

/// Counter for one identifier in its current window.
#[derive(Debug, Clone)]
pub struct RateRecord {
    pub count: u32,
    pub window_start: Instant,
    pub reset_at: Instant,
}

impl RateRecord {
    pub fn open(now: Instant, window: Duration) -> Self {
        Self {
            count: 1,
            window_start: now,
            reset_at: now + window,
        }
    }

    /// The window is over once `now` passes `reset_at`.
    pub fn is_elapsed(&self, now: Instant) -> bool {
        now > self.reset_at
    }

    /// Length of the window this record was opened with.
    pub fn window(&self) -> Duration {
        self.reset_at.saturating_duration_since(self.window_start)
    }

    /// Time since the window opened.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.window_start)
    }
}

/// Outcome of a single [`check`](super::RateLimiter::check).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: Instant,
}

impl RateLimitDecision {
    /// Whole seconds until the window resets, rounded up.
    pub fn retry_after_secs(&self, now: Instant) -> u64 {
        ceil_secs(self.reset_at.saturating_duration_since(now))
    }

    /// Wall-clock reset time as Unix seconds, rounded up.
    pub fn reset_epoch_secs(&self, now: Instant) -> i64 {
        let until = self.reset_at.saturating_duration_since(now);
        let reset_ms = Utc::now().timestamp_millis() + until.as_millis() as i64;
        (reset_ms + 999).div_euclid(1000)
    }
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStats {
    pub tracked_identifiers: usize,
    pub identifiers: Vec<String>,
    pub active_windows: usize,
    pub expired_windows: usize,
    pub top_clients: Vec<ClientUsage>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClientUsage {
    pub client_id: String,
    pub request_count: u64,
}
