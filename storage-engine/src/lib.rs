//! Storage backends behind the folio ports: a Moka cache for edge responses
//! and an in-memory stand-in for browser session storage.

pub mod moka_cache;
pub mod session_storage;

pub use moka_cache::MokaCache;
pub use session_storage::MemorySessionStorage;

use folio::CachedResponse;
use folio::ports::CacheStore;
use shared::config::EdgeConfig;
use std::sync::Arc;

/// Shared edge response cache, keyed by request URL.
pub type EdgeCache = Arc<dyn CacheStore<String, CachedResponse>>;

/// Build the edge response cache described by `config`.
pub fn edge_cache(config: &EdgeConfig) -> EdgeCache {
    Arc::new(MokaCache::new(
        "edge-responses",
        Some(config.cache_capacity),
        Some(config.cache_retention),
    ))
}
