//! Fixed-window rate limiting primitives

use std::time::Duration;

use serde::Deserialize;

/// Limits applied by the ingress guard
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub window_ms: u64,
    pub per_client_max: u32,
    pub global_max: u32,
    /// Key clients on the first `X-Forwarded-For` hop instead of the socket
    /// peer. Only safe behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
}

impl RateLimitConfig {
    pub fn new(window_ms: u64, per_client_max: u32, global_max: u32) -> Self {
        Self {
            window_ms,
            per_client_max,
            global_max,
            trust_forwarded_for: false,
        }
    }

    pub fn with_trusted_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new(1000, 3, 5)
    }
}

/// One counting window
///
/// A window that has run for `window_ms` or longer is expired; the next
/// request starts a fresh window with `count = 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateWindow {
    pub window_start: u64,
    pub count: u32,
    pub max: u32,
    pub window_ms: u64,
}

impl RateWindow {
    /// Opens a window for a first, admitted request
    pub fn open(now: u64, max: u32, window_ms: u64) -> Self {
        Self {
            window_start: now,
            count: 1,
            max,
            window_ms,
        }
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now.saturating_sub(self.window_start) >= self.window_ms
    }

    /// Whether one more request would be admitted
    pub fn has_capacity(&self, now: u64) -> bool {
        self.is_expired(now) || self.count < self.max
    }

    /// Admits one request; callers check [`has_capacity`](Self::has_capacity) first
    pub fn admit(&mut self, now: u64) {
        if self.is_expired(now) {
            self.window_start = now;
            self.count = 1;
        } else {
            self.count += 1;
        }
    }

    /// Requests still admissible in the current window
    pub fn remaining(&self, now: u64) -> u32 {
        if self.is_expired(now) {
            self.max
        } else {
            self.max.saturating_sub(self.count)
        }
    }

    /// Time until this window expires
    pub fn reset_in(&self, now: u64) -> Duration {
        let end = self.window_start.saturating_add(self.window_ms);
        Duration::from_millis(end.saturating_sub(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert_eq!(config.window_ms, 1000);
        assert_eq!(config.per_client_max, 3);
        assert_eq!(config.global_max, 5);
        assert_eq!(config.window(), Duration::from_secs(1));
    }

    #[test]
    fn test_window_fills_up() {
        let mut window = RateWindow::open(0, 3, 1000);
        assert!(window.has_capacity(10));

        window.admit(10);
        window.admit(20);
        assert_eq!(window.count, 3);
        assert!(!window.has_capacity(30));
        assert_eq!(window.remaining(30), 0);
    }

    #[test]
    fn test_window_expires_at_boundary() {
        let mut window = RateWindow::open(0, 1, 1000);
        assert!(!window.has_capacity(999));
        assert!(window.has_capacity(1000));

        window.admit(1000);
        assert_eq!(window.window_start, 1000);
        assert_eq!(window.count, 1);
    }

    #[test]
    fn test_reset_in() {
        let window = RateWindow::open(500, 3, 1000);
        assert_eq!(window.reset_in(800), Duration::from_millis(700));
        assert_eq!(window.reset_in(2000), Duration::ZERO);
    }
}
