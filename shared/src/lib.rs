// shared/src/lib.rs

use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("not found")]
    NotFound,
    #[error("storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },
    #[error("serialization: {0}")]
    Serialization(String),
    #[error("internal: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TtlMs(pub u64);

impl TtlMs {
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * 1000)
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_millis(self.0)
    }

    /// True when an entry written at `written_ms` is still inside this TTL at `now_ms`.
    pub fn is_fresh(self, written_ms: i64, now_ms: i64) -> bool {
        now_ms - written_ms < self.0 as i64
    }
}

/// Wall clock in epoch milliseconds, the unit every cache timestamp uses.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub mod config;
pub mod rate_limit;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_freshness_is_strict() {
        let ttl = TtlMs(1000);
        assert!(ttl.is_fresh(0, 999));
        assert!(!ttl.is_fresh(0, 1000));
        assert!(!ttl.is_fresh(0, 5000));
    }

    #[test]
    fn ttl_from_secs() {
        assert_eq!(TtlMs::from_secs(300), TtlMs(300_000));
        assert_eq!(TtlMs::from_secs(2).as_duration(), Duration::from_secs(2));
    }
}
