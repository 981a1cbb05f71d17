//! Namespaced in-memory cache with per-namespace TTL defaults.
//!
//! The store is partitioned into namespaces fixed at construction time,
//! each carrying its own default TTL and an independent flush scope.
//! Expired entries are evicted lazily on access: a read after expiry is a
//! miss, never a stale value.
//!
//! All operations are synchronous map operations. An ordinary miss or
//! expiry is a normal `None`/`false` return, not an error; the only error
//! conditions are addressing a namespace that was never configured and
//! payload (de)serialization.

mod store;

pub use store::{CacheError, CacheStore};

/// Namespace for the canonical property collection.
pub const NS_PROPERTIES: &str = "properties";

/// Namespace for image payloads and derived image metadata.
pub const NS_IMAGES: &str = "images";

/// Namespace for auxiliary campaign/content payloads.
pub const NS_CONTENT: &str = "content";
