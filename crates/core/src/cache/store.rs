//! TTL-bounded key/value store partitioned by namespace.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Cache-layer errors.
///
/// Callers on the read path treat every variant as a miss; none of these
/// is fatal to a request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// The namespace was not configured at store construction.
    #[error("unknown cache namespace: {0}")]
    UnknownNamespace(String),

    /// Payload could not be serialized for storage.
    #[error("cache payload serialization failed: {0}")]
    Serialize(String),

    /// Stored payload could not be deserialized into the requested type.
    #[error("cache payload deserialization failed: {0}")]
    Deserialize(String),
}

struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

struct Namespace {
    default_ttl: Duration,
    entries: DashMap<String, CacheEntry>,
}

/// Namespaced in-memory TTL cache.
///
/// Namespaces are fixed at construction; the namespace is part of the
/// store's internal addressing, so keys in different namespaces can never
/// collide.
pub struct CacheStore {
    namespaces: HashMap<String, Namespace>,
}

impl CacheStore {
    /// Build a store from `(namespace, default_ttl)` pairs.
    pub fn new<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = (S, Duration)>,
        S: Into<String>,
    {
        let namespaces = namespaces
            .into_iter()
            .map(|(name, default_ttl)| (name.into(), Namespace { default_ttl, entries: DashMap::new() }))
            .collect();
        Self { namespaces }
    }

    fn namespace(&self, namespace: &str) -> Result<&Namespace, CacheError> {
        self.namespaces
            .get(namespace)
            .ok_or_else(|| CacheError::UnknownNamespace(namespace.to_owned()))
    }

    /// Look up a value. Returns `None` on miss or expiry.
    pub fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, CacheError> {
        let ns = self.namespace(namespace)?;
        {
            let Some(entry) = ns.entries.get(key) else { return Ok(None) };
            if entry.expires_at > Instant::now() {
                return Ok(Some(entry.value.clone()));
            }
        }
        // Lazy eviction; re-check under the removal lock so a concurrent
        // overwrite with a fresh TTL is not thrown away.
        ns.entries.remove_if(key, |_, entry| entry.expires_at <= Instant::now());
        Ok(None)
    }

    /// Store a value. A `ttl_secs` of zero uses the namespace default.
    pub fn set(&self, namespace: &str, key: &str, value: Value, ttl_secs: u64) -> Result<(), CacheError> {
        let ttl = if ttl_secs == 0 {
            self.namespace(namespace)?.default_ttl
        } else {
            Duration::from_secs(ttl_secs)
        };
        self.set_with_ttl(namespace, key, value, ttl)
    }

    /// Store a value with an explicit TTL duration.
    pub fn set_with_ttl(&self, namespace: &str, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError> {
        let ns = self.namespace(namespace)?;
        ns.entries
            .insert(key.to_owned(), CacheEntry { value, expires_at: Instant::now() + ttl });
        Ok(())
    }

    /// Remove a key. Returns `true` only when a live entry was removed.
    pub fn delete(&self, namespace: &str, key: &str) -> Result<bool, CacheError> {
        let ns = self.namespace(namespace)?;
        Ok(ns
            .entries
            .remove(key)
            .is_some_and(|(_, entry)| entry.expires_at > Instant::now()))
    }

    /// Whether a live (non-expired) entry exists for the key.
    pub fn exists(&self, namespace: &str, key: &str) -> Result<bool, CacheError> {
        let ns = self.namespace(namespace)?;
        Ok(ns
            .entries
            .get(key)
            .is_some_and(|entry| entry.expires_at > Instant::now()))
    }

    /// Remaining TTL in whole seconds, or `-1` when the key is absent or
    /// expired.
    pub fn ttl_remaining(&self, namespace: &str, key: &str) -> Result<i64, CacheError> {
        let ns = self.namespace(namespace)?;
        let now = Instant::now();
        let remaining = ns.entries.get(key).and_then(|entry| {
            if entry.expires_at > now {
                Some(entry.expires_at.duration_since(now).as_secs() as i64)
            } else {
                None
            }
        });
        Ok(remaining.unwrap_or(-1))
    }

    /// Remove every key in the namespace. Other namespaces are untouched.
    pub fn flush(&self, namespace: &str) -> Result<(), CacheError> {
        self.namespace(namespace)?.entries.clear();
        Ok(())
    }

    /// Serialize `value` and store it under the key.
    pub fn set_json<T: Serialize>(&self, namespace: &str, key: &str, value: &T, ttl_secs: u64) -> Result<(), CacheError> {
        let value = serde_json::to_value(value).map_err(|e| CacheError::Serialize(e.to_string()))?;
        self.set(namespace, key, value, ttl_secs)
    }

    /// Look up a value and deserialize it into `T`.
    pub fn get_json<T: DeserializeOwned>(&self, namespace: &str, key: &str) -> Result<Option<T>, CacheError> {
        match self.get(namespace, key)? {
            None => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| CacheError::Deserialize(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> CacheStore {
        CacheStore::new([
            ("properties", Duration::from_secs(1800)),
            ("images", Duration::from_secs(3600)),
        ])
    }

    #[test]
    fn test_set_get_roundtrip() {
        let cache = store();
        cache.set("properties", "all", json!([1, 2, 3]), 0).unwrap();
        assert_eq!(cache.get("properties", "all").unwrap(), Some(json!([1, 2, 3])));
    }

    #[test]
    fn test_miss_is_not_an_error() {
        let cache = store();
        assert_eq!(cache.get("properties", "absent").unwrap(), None);
        assert!(!cache.exists("properties", "absent").unwrap());
        assert_eq!(cache.ttl_remaining("properties", "absent").unwrap(), -1);
    }

    #[test]
    fn test_unknown_namespace() {
        let cache = store();
        let result = cache.get("sessions", "k");
        assert!(matches!(result, Err(CacheError::UnknownNamespace(ns)) if ns == "sessions"));
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = store();
        cache
            .set_with_ttl("properties", "p1", json!("v"), Duration::from_millis(20))
            .unwrap();
        assert!(cache.exists("properties", "p1").unwrap());
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.get("properties", "p1").unwrap(), None);
        assert!(!cache.exists("properties", "p1").unwrap());
        assert_eq!(cache.ttl_remaining("properties", "p1").unwrap(), -1);
    }

    #[test]
    fn test_ttl_one_second_expires_after_two() {
        let cache = store();
        cache.set("properties", "p1", json!("v"), 1).unwrap();
        assert_eq!(cache.get("properties", "p1").unwrap(), Some(json!("v")));
        std::thread::sleep(Duration::from_secs(2));
        assert_eq!(cache.get("properties", "p1").unwrap(), None);
    }

    #[test]
    fn test_ttl_zero_uses_namespace_default() {
        let cache = store();
        cache.set("images", "i1", json!("v"), 0).unwrap();
        let remaining = cache.ttl_remaining("images", "i1").unwrap();
        assert!(remaining > 3590 && remaining <= 3600, "remaining = {remaining}");
    }

    #[test]
    fn test_explicit_ttl_overrides_default() {
        let cache = store();
        cache.set("images", "i1", json!("v"), 10).unwrap();
        let remaining = cache.ttl_remaining("images", "i1").unwrap();
        assert!(remaining <= 10, "remaining = {remaining}");
    }

    #[test]
    fn test_delete() {
        let cache = store();
        cache.set("properties", "p1", json!("v"), 0).unwrap();
        assert!(cache.delete("properties", "p1").unwrap());
        assert!(!cache.delete("properties", "p1").unwrap());
    }

    #[test]
    fn test_delete_expired_reports_absent() {
        let cache = store();
        cache
            .set_with_ttl("properties", "p1", json!("v"), Duration::from_millis(10))
            .unwrap();
        std::thread::sleep(Duration::from_millis(30));
        assert!(!cache.delete("properties", "p1").unwrap());
    }

    #[test]
    fn test_flush_is_namespace_isolated() {
        let cache = store();
        cache.set("properties", "p1", json!(1), 0).unwrap();
        cache.set("images", "i1", json!(2), 0).unwrap();
        cache.flush("properties").unwrap();
        assert_eq!(cache.get("properties", "p1").unwrap(), None);
        assert_eq!(cache.get("images", "i1").unwrap(), Some(json!(2)));
    }

    #[test]
    fn test_same_key_across_namespaces() {
        let cache = store();
        cache.set("properties", "k", json!("props"), 0).unwrap();
        cache.set("images", "k", json!("imgs"), 0).unwrap();
        assert_eq!(cache.get("properties", "k").unwrap(), Some(json!("props")));
        assert_eq!(cache.get("images", "k").unwrap(), Some(json!("imgs")));
    }

    #[test]
    fn test_json_helpers() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Row {
            id: String,
            price: u64,
        }

        let cache = store();
        let row = Row { id: "p-1".into(), price: 125_000 };
        cache.set_json("properties", "p-1", &row, 0).unwrap();
        let back: Option<Row> = cache.get_json("properties", "p-1").unwrap();
        assert_eq!(back, Some(row));
    }

    #[test]
    fn test_get_json_type_mismatch_is_error() {
        let cache = store();
        cache.set("properties", "p1", json!("not a number"), 0).unwrap();
        let result: Result<Option<u64>, _> = cache.get_json("properties", "p1");
        assert!(matches!(result, Err(CacheError::Deserialize(_))));
    }
}
