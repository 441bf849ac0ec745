use super::ClientError;
use crate::domain::{CacheEntry, FetchResult, ResponseHandle};
use crate::ports::SessionStorage;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::config::ClientConfig;
use shared::rate_limit::parse_rate_limit;
use shared::{Error, TtlMs, now_millis};
use std::sync::Arc;
use tracing::{debug, warn};

/// Namespace for per-URL entries in session storage.
pub const API_CACHE_PREFIX: &str = "nd_api_";

/// Fetches JSON from the edge and keeps a session-scoped TTL cache of the results.
#[derive(Clone)]
pub struct DataClient {
    http: Client,
    base_url: String,
    storage: Arc<dyn SessionStorage>,
    default_ttl: TtlMs,
}

impl DataClient {
    pub fn new(base_url: impl Into<String>, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            storage,
            default_ttl: ClientConfig::DEFAULT_TTL,
        }
    }

    pub fn from_config(config: &ClientConfig, storage: Arc<dyn SessionStorage>) -> Self {
        Self::new(config.edge_url.clone(), storage).with_default_ttl(config.cache_ttl)
    }

    pub fn with_default_ttl(mut self, ttl: TtlMs) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn default_ttl(&self) -> TtlMs {
        self.default_ttl
    }

    fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}{}", self.base_url, url)
        }
    }

    /// GET `url` and decode it as JSON.
    ///
    /// 403/429 with an exhausted rate limit become [`ClientError::RateLimited`];
    /// any other non-2xx becomes [`ClientError::Api`]; a 2xx without a JSON
    /// content type becomes [`ClientError::NonJsonResponse`].
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<FetchResult<T>, ClientError> {
        let target = self.resolve(url);
        let response = self.http.get(&target).send().await?;
        let status = response.status();

        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            if let Some(message) = parse_rate_limit(response.headers()) {
                warn!("{} for {}", message, url);
                return Err(ClientError::RateLimited(message));
            }
        }

        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
            });
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));
        if !is_json {
            return Err(ClientError::NonJsonResponse);
        }

        let handle = ResponseHandle {
            url: target,
            status,
            headers: response.headers().clone(),
        };
        let body = response.bytes().await?;
        let payload = serde_json::from_slice(&body)?;

        Ok(FetchResult::from_network(payload, handle))
    }

    /// [`fetch_json`](Self::fetch_json) behind the session cache, using the default TTL.
    pub async fn cached_fetch_json<T>(&self, url: &str) -> Result<FetchResult<T>, ClientError>
    where
        T: DeserializeOwned + Serialize,
    {
        self.cached_fetch_json_with_ttl(url, self.default_ttl).await
    }

    pub async fn cached_fetch_json_with_ttl<T>(
        &self,
        url: &str,
        ttl: TtlMs,
    ) -> Result<FetchResult<T>, ClientError>
    where
        T: DeserializeOwned + Serialize,
    {
        let key = format!("{API_CACHE_PREFIX}{url}");

        if let Some(data) = self.read_entry::<T>(&key, ttl) {
            debug!("Session cache hit for {}", url);
            return Ok(FetchResult::from_cache(data));
        }

        let result = self.fetch_json::<T>(url).await?;
        self.write_entry(&key, &result.payload);
        Ok(result)
    }

    /// Fresh cached data under `key`, or `None`. Unreadable entries count as a miss.
    pub fn read_entry<T: DeserializeOwned>(&self, key: &str, ttl: TtlMs) -> Option<T> {
        let raw = match self.storage.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                debug!("Session cache read failed for {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str::<CacheEntry<T>>(&raw) {
            Ok(entry) if entry.is_fresh(ttl, now_millis()) => Some(entry.data),
            Ok(_) => None,
            Err(e) => {
                debug!("Ignoring corrupt session cache entry {}: {}", key, e);
                None
            }
        }
    }

    /// Store `data` under `key` stamped with the current time. Failures are logged and dropped.
    pub fn write_entry<T: Serialize>(&self, key: &str, data: &T) {
        let result = serde_json::to_string(&CacheEntry::new(now_millis(), data))
            .map_err(|e| Error::Serialization(e.to_string()))
            .and_then(|raw| self.storage.set_item(key, raw));

        if let Err(e) = result {
            warn!("Session cache write skipped for {}: {}", key, e);
        }
    }
}

impl std::fmt::Debug for DataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataClient")
            .field("base_url", &self.base_url)
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}
