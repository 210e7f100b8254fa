//! In-memory freshness cache for dashboard resources.
//!
//! This module provides the `ResourceCache`, a per-resource-key store of the
//! last successfully fetched payload. Each key has a TTL fixed when the cache
//! is built; an entry is fresh while `now - fetched_at < ttl`.
//!
//! The resource set is small and bounded, so there is no eviction. The cache
//! lives for the page session and is cleared wholesale on logout or when the
//! session is lost.

pub mod entry;
pub mod resource_cache;

pub use entry::CacheEntry;
pub use resource_cache::{ResourceCache, TtlPolicy};
