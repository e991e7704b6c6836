//! Stored cache entry with freshness metadata

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cached payload plus the metadata needed to decide staleness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    pub value: V,
    pub stored_at: DateTime<Utc>,
    pub ttl_seconds: u64,
}

impl<V> CacheEntry<V> {
    /// Creates an entry stamped with the current time
    pub fn new(value: V, ttl: Duration) -> Self {
        Self::stored_at(value, ttl, Utc::now())
    }

    /// Creates an entry with an explicit store time
    pub fn stored_at(value: V, ttl: Duration, stored_at: DateTime<Utc>) -> Self {
        Self {
            value,
            stored_at,
            ttl_seconds: ttl.as_secs(),
        }
    }

    /// Age of the entry at `now`; entries stamped in the future have age zero
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.stored_at).to_std().unwrap_or_default()
    }

    /// Stale once the age exceeds the TTL
    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        self.age_at(now) > Duration::from_secs(self.ttl_seconds)
    }

    pub fn is_stale(&self) -> bool {
        self.is_stale_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_fresh_entry() {
        let entry = CacheEntry::new("data", Duration::from_secs(60));
        assert!(!entry.is_stale());
    }

    #[test]
    fn test_entry_age_boundary() {
        let now = Utc::now();
        let entry = CacheEntry::stored_at(1, Duration::from_secs(60), now - TimeDelta::seconds(60));

        assert!(!entry.is_stale_at(now));
        assert!(entry.is_stale_at(now + TimeDelta::seconds(1)));
    }

    #[test]
    fn test_future_entry_has_zero_age() {
        let now = Utc::now();
        let entry = CacheEntry::stored_at(1, Duration::from_secs(0), now + TimeDelta::seconds(5));

        assert_eq!(entry.age_at(now), Duration::ZERO);
        assert!(!entry.is_stale_at(now));
    }

    #[test]
    fn test_entry_serialization() {
        let entry = CacheEntry::new(serde_json::json!({"name": "vue"}), Duration::from_secs(300));
        let json = serde_json::to_string(&entry).unwrap();
        let decoded: CacheEntry<serde_json::Value> = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded, entry);
        assert_eq!(decoded.ttl_seconds, 300);
    }
}
