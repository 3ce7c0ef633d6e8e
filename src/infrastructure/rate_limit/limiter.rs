//! Rate limiter implementation
//!
//! Fixed windows per client plus one shared global window. A request is
//! admitted only when both windows have room, and only then are both counted.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::domain::{Clock, RateLimitConfig, RateWindow, SystemClock};

/// Idle client windows are swept at most this often
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Result of a rate limit check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    /// Whether the request is allowed
    pub allowed: bool,
    /// Remaining requests for this client in the current window
    pub remaining: u32,
    /// Limit of the window that decided the outcome
    pub limit: u32,
    /// Time until that window resets
    pub reset_in: Duration,
    /// Which limit was hit (if any)
    pub limit_type: Option<LimitType>,
}

/// Type of rate limit that was hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitType {
    PerClient,
    Global,
}

impl LimitType {
    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::PerClient => "client_limit_exceeded",
            Self::Global => "global_limit_exceeded",
        }
    }
}

impl std::fmt::Display for LimitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PerClient => write!(f, "per_client"),
            Self::Global => write!(f, "global"),
        }
    }
}

#[derive(Debug, Default)]
struct LimiterState {
    clients: HashMap<String, RateWindow>,
    global: Option<RateWindow>,
    last_cleanup: u64,
}

/// Per-client and global fixed-window rate limiter
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    state: RwLock<LimiterState>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now_millis();

        Self {
            config,
            state: RwLock::new(LimiterState {
                last_cleanup: now,
                ..Default::default()
            }),
            clock,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Check both windows and count the request if it is admitted
    pub async fn check_and_record(&self, client_id: &str) -> RateLimitResult {
        let now = self.clock.now_millis();
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        self.maybe_cleanup(state, now);

        let config = &self.config;

        if let Some(window) = state.clients.get(client_id) {
            if !window.has_capacity(now) {
                return RateLimitResult {
                    allowed: false,
                    remaining: 0,
                    limit: config.per_client_max,
                    reset_in: window.reset_in(now),
                    limit_type: Some(LimitType::PerClient),
                };
            }
        }

        if let Some(ref window) = state.global {
            if !window.has_capacity(now) {
                let remaining = state
                    .clients
                    .get(client_id)
                    .map(|w| w.remaining(now))
                    .unwrap_or(config.per_client_max);

                return RateLimitResult {
                    allowed: false,
                    remaining,
                    limit: config.global_max,
                    reset_in: window.reset_in(now),
                    limit_type: Some(LimitType::Global),
                };
            }
        }

        match state.global {
            Some(ref mut window) => window.admit(now),
            None => state.global = Some(RateWindow::open(now, config.global_max, config.window_ms)),
        }

        let window = state
            .clients
            .entry(client_id.to_string())
            .and_modify(|w| w.admit(now))
            .or_insert_with(|| RateWindow::open(now, config.per_client_max, config.window_ms));

        RateLimitResult {
            allowed: true,
            remaining: window.remaining(now),
            limit: config.per_client_max,
            reset_in: window.reset_in(now),
            limit_type: None,
        }
    }

    /// Number of clients currently tracked
    pub async fn tracked_clients(&self) -> usize {
        self.state.read().await.clients.len()
    }

    fn maybe_cleanup(&self, state: &mut LimiterState, now: u64) {
        if now.saturating_sub(state.last_cleanup) < CLEANUP_INTERVAL.as_millis() as u64 {
            return;
        }

        state.last_cleanup = now;
        state.clients.retain(|_, window| !window.is_expired(now));
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::mock::ManualClock;

    fn limiter() -> (RateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let limiter = RateLimiter::with_clock(RateLimitConfig::default(), clock.clone());
        (limiter, clock)
    }

    #[tokio::test]
    async fn test_allows_first_request() {
        let (limiter, _) = limiter();

        let result = limiter.check_and_record("10.0.0.1").await;

        assert!(result.allowed);
        assert_eq!(result.remaining, 2);
        assert_eq!(result.limit, 3);
        assert_eq!(result.limit_type, None);
    }

    #[tokio::test]
    async fn test_blocks_fourth_request_from_same_client() {
        let (limiter, _) = limiter();

        for _ in 0..3 {
            assert!(limiter.check_and_record("10.0.0.1").await.allowed);
        }

        let result = limiter.check_and_record("10.0.0.1").await;
        assert!(!result.allowed);
        assert_eq!(result.remaining, 0);
        assert_eq!(result.limit_type, Some(LimitType::PerClient));
        assert_eq!(result.reset_in, Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_client_window_resets() {
        let (limiter, clock) = limiter();

        for _ in 0..3 {
            limiter.check_and_record("10.0.0.1").await;
        }
        assert!(!limiter.check_and_record("10.0.0.1").await.allowed);

        clock.advance(Duration::from_millis(1001));

        let result = limiter.check_and_record("10.0.0.1").await;
        assert!(result.allowed);
        assert_eq!(result.remaining, 2);
    }

    #[tokio::test]
    async fn test_window_boundary_is_exclusive() {
        let (limiter, clock) = limiter();

        for _ in 0..3 {
            limiter.check_and_record("a").await;
        }

        clock.advance(Duration::from_millis(999));
        assert!(!limiter.check_and_record("a").await.allowed);

        clock.advance(Duration::from_millis(1));
        assert!(limiter.check_and_record("a").await.allowed);
    }

    #[tokio::test]
    async fn test_global_limit_across_clients() {
        let (limiter, _) = limiter();

        for client in ["a", "b", "c", "d", "e"] {
            assert!(limiter.check_and_record(client).await.allowed);
        }

        let result = limiter.check_and_record("f").await;
        assert!(!result.allowed);
        assert_eq!(result.limit_type, Some(LimitType::Global));
        assert_eq!(result.limit, 5);
        assert_eq!(result.remaining, 3);
    }

    #[tokio::test]
    async fn test_global_rejection_does_not_consume_client_slot() {
        let (limiter, clock) = limiter();

        for client in ["a", "a", "b", "b", "c"] {
            limiter.check_and_record(client).await;
        }

        // Global window is full; "c" is rejected without being counted
        assert!(!limiter.check_and_record("c").await.allowed);

        clock.advance(Duration::from_millis(1000));

        let result = limiter.check_and_record("c").await;
        assert!(result.allowed);
        assert_eq!(result.remaining, 2);
    }

    #[tokio::test]
    async fn test_client_rejection_does_not_consume_global_slot() {
        let (limiter, _) = limiter();

        for _ in 0..3 {
            limiter.check_and_record("a").await;
        }
        for _ in 0..5 {
            assert!(!limiter.check_and_record("a").await.allowed);
        }

        assert!(limiter.check_and_record("b").await.allowed);
        assert!(limiter.check_and_record("b").await.allowed);
        assert_eq!(
            limiter.check_and_record("c").await.limit_type,
            Some(LimitType::Global)
        );
    }

    #[tokio::test]
    async fn test_idle_clients_are_cleaned_up() {
        let (limiter, clock) = limiter();

        limiter.check_and_record("a").await;
        limiter.check_and_record("b").await;
        assert_eq!(limiter.tracked_clients().await, 2);

        clock.advance(CLEANUP_INTERVAL);
        limiter.check_and_record("c").await;

        assert_eq!(limiter.tracked_clients().await, 1);
    }

    #[test]
    fn test_limit_type_codes() {
        assert_eq!(LimitType::PerClient.code(), "client_limit_exceeded");
        assert_eq!(LimitType::Global.code(), "global_limit_exceeded");
        assert_eq!(LimitType::Global.to_string(), "global");
    }
}
