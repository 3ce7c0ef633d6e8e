//! Time source shared by the cache and the rate limiter

use std::fmt::Debug;

/// Millisecond wall clock
pub trait Clock: Send + Sync + Debug {
    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> u64;
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}
