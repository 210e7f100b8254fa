use std::time::Duration;

use chrono::{DateTime, Utc};

/// One cached payload with the time it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: T,
    pub fetched_at: DateTime<Utc>,
    pub ttl: Duration,
    /// Set by `invalidate`; the data is kept but no longer counts as fresh.
    pub invalidated: bool,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T, fetched_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            data,
            fetched_at,
            ttl,
            invalidated: false,
        }
    }

    /// Age at `now`. Negative ages (clock skew) count as zero.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.fetched_at).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        !self.invalidated && self.age(now) < self.ttl
    }

    pub fn age_display(&self, now: DateTime<Utc>) -> String {
        let seconds = self.age(now).as_secs();
        if seconds < 5 {
            "just now".to_string()
        } else if seconds < 60 {
            format!("{}s ago", seconds)
        } else if seconds < 3600 {
            format!("{}m ago", seconds / 60)
        } else if seconds < 86_400 {
            let hours = seconds / 3600;
            if (seconds % 3600) / 60 >= 30 {
                // Round up: 1h 30m+ becomes 2h
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            format!("{}d ago", seconds / 86_400)
        }
    }
}
