#![deny(clippy::all)]

use crate::domain::response::{DeleteResponse, GetResponse, PutResponse};
use async_trait::async_trait;
use shared::Result;

// Ports are the pluggable extension points for the storage behind each cache

/// Port for the shared edge response cache (e.g., Moka).
///
/// `get` returns `Error::NotFound` on a miss. Entries stay readable until the
/// backend evicts them; freshness is decided by the caller.
#[async_trait]
pub trait CacheStore<K, V>: Send + Sync + 'static {
    async fn put(&self, key: K, val: V) -> Result<PutResponse>;
    async fn get(&self, key: &K) -> Result<GetResponse<V>>;
    async fn delete(&self, key: &K) -> Result<DeleteResponse>;
}

/// Port for session-scoped key/value text storage, shaped like the browser's
/// `sessionStorage`. Writes may fail (quota); callers decide whether to care.
pub trait SessionStorage: Send + Sync + 'static {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: String) -> Result<()>;
}
