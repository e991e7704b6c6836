//! Fetch results and cache policy

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where a served value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Fresh cached value
    Hit,
    /// Expired cached value served while a refresh runs
    Stale,
    /// No usable cached value; fetched from upstream
    Miss,
    /// Cache read skipped on request; fetched from upstream
    Bypass,
}

impl CacheStatus {
    /// Value used in the `X-Cache` response header
    pub fn as_header_value(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Stale => "STALE",
            CacheStatus::Miss => "MISS",
            CacheStatus::Bypass => "BYPASS",
        }
    }

    pub fn from_header_value(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "HIT" => Some(CacheStatus::Hit),
            "STALE" => Some(CacheStatus::Stale),
            "MISS" => Some(CacheStatus::Miss),
            "BYPASS" => Some(CacheStatus::Bypass),
            _ => None,
        }
    }
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_header_value().to_lowercase())
    }
}

/// Result of a cached fetch
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult<T> {
    pub data: T,
    pub is_stale: bool,
    pub status: CacheStatus,
}

impl<T> FetchResult<T> {
    pub fn new(data: T, status: CacheStatus) -> Self {
        Self {
            data,
            is_stale: status == CacheStatus::Stale,
            status,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchResult<U> {
        FetchResult {
            data: f(self.data),
            is_stale: self.is_stale,
            status: self.status,
        }
    }

    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<FetchResult<U>, E> {
        Ok(FetchResult {
            data: f(self.data)?,
            is_stale: self.is_stale,
            status: self.status,
        })
    }
}

/// Caching rules applied to a single fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Age after which an entry is stale
    pub ttl: Duration,
    /// How long a stale entry is retained past its TTL
    pub stale_window: Duration,
    /// Serve stale entries while refreshing in the background
    pub swr: bool,
    /// Skip the cache read (the fresh result is still written back)
    pub bypass: bool,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            stale_window: Duration::from_secs(86_400),
            swr: true,
            bypass: false,
        }
    }
}

impl FetchPolicy {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            ..Default::default()
        }
    }

    pub fn swr(mut self, enabled: bool) -> Self {
        self.swr = enabled;
        self
    }

    pub fn stale_window(mut self, window: Duration) -> Self {
        self.stale_window = window;
        self
    }

    pub fn bypass(mut self, bypass: bool) -> Self {
        self.bypass = bypass;
        self
    }

    /// TTL handed to the backing store
    pub fn retention(&self) -> Duration {
        if self.swr {
            self.ttl + self.stale_window
        } else {
            self.ttl
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_status_header_roundtrip() {
        for status in [
            CacheStatus::Hit,
            CacheStatus::Stale,
            CacheStatus::Miss,
            CacheStatus::Bypass,
        ] {
            assert_eq!(
                CacheStatus::from_header_value(status.as_header_value()),
                Some(status)
            );
        }
        assert_eq!(CacheStatus::from_header_value("stale"), Some(CacheStatus::Stale));
        assert_eq!(CacheStatus::from_header_value("nope"), None);
    }

    #[test]
    fn test_fetch_result_staleness_follows_status() {
        assert!(FetchResult::new(1, CacheStatus::Stale).is_stale);
        assert!(!FetchResult::new(1, CacheStatus::Hit).is_stale);
        assert!(!FetchResult::new(1, CacheStatus::Miss).is_stale);
    }

    #[test]
    fn test_fetch_result_map() {
        let result = FetchResult::new(2, CacheStatus::Stale).map(|v| v * 10);
        assert_eq!(result.data, 20);
        assert!(result.is_stale);
    }

    #[test]
    fn test_policy_retention() {
        let policy = FetchPolicy::with_ttl(Duration::from_secs(60))
            .stale_window(Duration::from_secs(600));
        assert_eq!(policy.retention(), Duration::from_secs(660));

        let no_swr = policy.swr(false);
        assert_eq!(no_swr.retention(), Duration::from_secs(60));
    }
}
