use crate::cors;
use crate::upstream::{GithubUpstream, UpstreamError};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use bytes::Bytes;
use folio::CachedResponse;
use shared::config::EdgeConfig;
use shared::rate_limit::{RATE_LIMIT_RESET, RATE_LIMIT_REMAINING};
use shared::{now_millis, Error, TtlMs};
use storage_engine::EdgeCache;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

pub const SERVICE_UNAVAILABLE_BODY: &str = "Service Unavailable";

/// Key under which a request's response is cached: the full inbound URL.
pub fn cache_key(scheme: &str, host: &str, path_and_query: &str) -> String {
    format!("{scheme}://{host}{path_and_query}")
}

/// Shields the upstream API behind a shared response cache.
///
/// Fresh entries are answered from the cache. Everything else goes upstream
/// once; a 200 is written back in the background. When the upstream cannot be
/// reached, any cached entry is served regardless of age (stale ones are
/// deleted afterwards) and a 503 is returned only if there is nothing cached.
pub struct EdgeProxy {
    cache: EdgeCache,
    upstream: GithubUpstream,
    ttl: TtlMs,
    max_age_secs: u64,
    tasks: TaskTracker,
}

impl EdgeProxy {
    pub fn new(config: &EdgeConfig, cache: EdgeCache) -> Result<Self, UpstreamError> {
        Ok(Self {
            cache,
            upstream: GithubUpstream::new(config)?,
            ttl: config.cache_ttl,
            max_age_secs: config.max_age_secs(),
            tasks: TaskTracker::new(),
        })
    }

    pub async fn handle(&self, key: &str, path_and_query: &str) -> CachedResponse {
        if let Some(hit) = self.lookup(key).await {
            if hit.is_fresh(self.ttl, now_millis()) {
                debug!("edge cache hit {}", key);
                return hit;
            }
        }

        match self.upstream.fetch(path_and_query).await {
            Ok(raw) => {
                let response = normalize(raw, self.max_age_secs);
                if response.status == StatusCode::OK {
                    self.store(key.to_string(), response.stamped(now_millis()));
                }
                response
            }
            Err(e) => {
                warn!("{} for {}", e, path_and_query);
                self.fallback(key).await
            }
        }
    }

    async fn fallback(&self, key: &str) -> CachedResponse {
        let Some(cached) = self.lookup(key).await else {
            return service_unavailable();
        };

        if cached.is_stale(self.ttl, now_millis()) {
            info!("serving stale {} and evicting it", key);
            self.evict(key.to_string());
        }
        cached
    }

    async fn lookup(&self, key: &str) -> Option<CachedResponse> {
        match self.cache.get(&key.to_string()).await {
            Ok(hit) => Some(hit.value),
            Err(Error::NotFound) => None,
            Err(e) => {
                warn!("edge cache read failed for {}: {}", key, e);
                None
            }
        }
    }

    fn store(&self, key: String, response: CachedResponse) {
        let cache = self.cache.clone();
        self.tasks.spawn(async move {
            if let Err(e) = cache.put(key.clone(), response).await {
                warn!("edge cache write failed for {}: {}", key, e);
            }
        });
    }

    fn evict(&self, key: String) {
        let cache = self.cache.clone();
        self.tasks.spawn(async move {
            if let Err(e) = cache.delete(&key).await {
                warn!("edge cache delete failed for {}: {}", key, e);
            }
        });
    }

    /// Wait for every background cache write and delete issued so far.
    pub async fn flush(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    /// Stop accepting background work and wait for what is in flight.
    pub async fn shutdown(&self) {
        self.tasks.close();
        self.tasks.wait().await;
    }
}

/// Rebuild an upstream response with the headers every edge response carries.
pub fn normalize(raw: CachedResponse, max_age_secs: u64) -> CachedResponse {
    let mut headers = cors::headers();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_str(&format!("public, max-age={max_age_secs}"))
            .unwrap_or_else(|_| HeaderValue::from_static("public, max-age=300")),
    );
    for name in [RATE_LIMIT_REMAINING, RATE_LIMIT_RESET] {
        passthrough(&raw.headers, &mut headers, HeaderName::from_static(name));
    }

    CachedResponse::new(raw.status, headers, raw.body)
}

fn passthrough(from: &HeaderMap, to: &mut HeaderMap, name: HeaderName) {
    let value = from
        .get(&name)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(""));
    to.insert(name, value);
}

pub fn service_unavailable() -> CachedResponse {
    let mut headers = cors::headers();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    CachedResponse::new(
        StatusCode::SERVICE_UNAVAILABLE,
        headers,
        Bytes::from_static(SERVICE_UNAVAILABLE_BODY.as_bytes()),
    )
}
