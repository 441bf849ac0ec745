use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};
use shared::TtlMs;

pub mod response {
    #[derive(Clone, Debug)]
    pub struct PutResponse {
        pub created: bool,
    }

    impl PutResponse {
        pub fn new(created: bool) -> Self {
            Self { created }
        }
    }

    #[derive(Clone, Debug)]
    pub struct GetResponse<V> {
        pub found: bool,
        pub value: V,
    }

    impl<V> GetResponse<V> {
        pub fn new(found: bool, value: V) -> Self {
            Self { found, value }
        }
    }

    #[derive(Clone, Debug)]
    pub struct DeleteResponse {
        pub deleted: bool,
    }

    impl DeleteResponse {
        pub fn new(deleted: bool) -> Self {
            Self { deleted }
        }
    }
}

/// Header stamped on every edge cache entry with its write time in epoch millis.
pub const CACHE_TIME_HEADER: &str = "sw-cache-time";

/// Session cache record, serialized as `{"ts": <epoch ms>, "data": ...}`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry<T> {
    pub ts: i64,
    pub data: T,
}

impl<T> CacheEntry<T> {
    pub fn new(ts: i64, data: T) -> Self {
        Self { ts, data }
    }

    pub fn is_fresh(&self, ttl: TtlMs, now_ms: i64) -> bool {
        ttl.is_fresh(self.ts, now_ms)
    }
}

/// What the client kept from a network response after consuming its body.
#[derive(Clone, Debug)]
pub struct ResponseHandle {
    pub url: String,
    pub status: StatusCode,
    pub headers: HeaderMap,
}

/// Result of every client fetch. `response` is `None` when served from cache.
#[derive(Clone, Debug)]
pub struct FetchResult<T> {
    pub payload: T,
    pub response: Option<ResponseHandle>,
}

impl<T> FetchResult<T> {
    pub fn from_network(payload: T, response: ResponseHandle) -> Self {
        Self {
            payload,
            response: Some(response),
        }
    }

    pub fn from_cache(payload: T) -> Self {
        Self {
            payload,
            response: None,
        }
    }

    pub fn is_cache_hit(&self) -> bool {
        self.response.is_none()
    }
}

/// A normalized HTTP response as held by the edge cache.
#[derive(Clone, Debug)]
pub struct CachedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl CachedResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Copy of this response stamped with its cache write time.
    pub fn stamped(&self, now_ms: i64) -> Self {
        let mut copy = self.clone();
        copy.headers
            .insert(CACHE_TIME_HEADER, HeaderValue::from(now_ms));
        copy
    }

    /// Write time from the embedded marker; `None` if missing, zero or garbled.
    pub fn cache_time(&self) -> Option<i64> {
        self.headers
            .get(CACHE_TIME_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|ts| *ts > 0)
    }

    /// Unmarked entries never count as fresh.
    pub fn is_fresh(&self, ttl: TtlMs, now_ms: i64) -> bool {
        self.cache_time()
            .is_some_and(|ts| ttl.is_fresh(ts, now_ms))
    }

    /// Unmarked entries never count as stale either; there is no age to judge.
    pub fn is_stale(&self, ttl: TtlMs, now_ms: i64) -> bool {
        self.cache_time()
            .is_some_and(|ts| now_ms - ts > ttl.0 as i64)
    }
}
