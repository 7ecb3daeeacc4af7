//! Request rate limiting.
//!
//! Two variants, matching the original's two call sites: a sliding-window
//! limiter (`DashMap<String, VecDeque<i64>>`, trim-then-card — the
//! in-process analogue of a Redis ZSET) for authentication, and a coarser
//! fixed-window counter (`DashMap<String, (window_start, count)>`,
//! incr-then-expire) for general request ingress.

use std::collections::VecDeque;
use std::sync::Mutex;

use dashmap::DashMap;

/// Sliding-window limiter keyed by `"{route}:{identity}"`. Used on
/// authentication endpoints, which fail *closed* on any internal error —
/// there is no fallible path here, so that guarantee is structural.
pub struct SlidingWindowLimiter {
    windows: DashMap<String, Mutex<VecDeque<i64>>>,
    limit: u32,
    window_secs: i64,
}

impl SlidingWindowLimiter {
    pub fn new(limit: u32, window_secs: i64) -> Self {
        Self {
            windows: DashMap::new(),
            limit,
            window_secs,
        }
    }

    /// Returns `true` if the request at `now` (unix seconds) is allowed.
    /// Trims entries older than `now - window_secs`, then records `now`,
    /// then rejects if the resulting count exceeds `limit`.
    pub fn check(&self, key: &str, now: i64) -> bool {
        let entry = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| Mutex::new(VecDeque::new()));
        let mut timestamps = entry.lock().expect("rate limiter mutex poisoned");
        let cutoff = now - self.window_secs;
        while matches!(timestamps.front(), Some(ts) if *ts < cutoff) {
            timestamps.pop_front();
        }
        timestamps.push_back(now);
        timestamps.len() as u32 <= self.limit
    }
}

/// Fixed-window counter keyed the same way, used for non-sensitive request
/// ingress, which fails *open* on internal error (§4.5).
pub struct FixedWindowLimiter {
    windows: DashMap<String, (i64, u32)>,
    limit: u32,
    window_secs: i64,
}

impl FixedWindowLimiter {
    pub fn new(limit: u32, window_secs: i64) -> Self {
        Self {
            windows: DashMap::new(),
            limit,
            window_secs,
        }
    }

    pub fn check(&self, key: &str, now: i64) -> bool {
        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert((now, 0));
        if now - entry.0 >= self.window_secs {
            *entry = (now, 0);
        }
        entry.1 += 1;
        entry.1 <= self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sliding_window_allows_up_to_limit_then_rejects() {
        let limiter = SlidingWindowLimiter::new(3, 60);
        assert!(limiter.check("auth:1.2.3.4", 0));
        assert!(limiter.check("auth:1.2.3.4", 1));
        assert!(limiter.check("auth:1.2.3.4", 2));
        assert!(!limiter.check("auth:1.2.3.4", 3));
    }

    #[test]
    fn sliding_window_recovers_after_window_elapses() {
        let limiter = SlidingWindowLimiter::new(1, 10);
        assert!(limiter.check("k", 0));
        assert!(!limiter.check("k", 5));
        assert!(limiter.check("k", 11));
    }

    #[test]
    fn fixed_window_resets_at_boundary() {
        let limiter = FixedWindowLimiter::new(2, 60);
        assert!(limiter.check("k", 0));
        assert!(limiter.check("k", 1));
        assert!(!limiter.check("k", 2));
        assert!(limiter.check("k", 60));
    }
}
