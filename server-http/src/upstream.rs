use axum::http::header::ACCEPT;
use folio::CachedResponse;
use reqwest::Client;
use shared::config::EdgeConfig;
use std::time::Duration;
use tracing::debug;

/// Media type pinned on every upstream request.
pub const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream timed out after {0:?}")]
    Timeout(Duration),
    #[error("upstream unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),
    #[error("failed to build upstream client: {0}")]
    Client(#[source] reqwest::Error),
}

/// HTTP client for the GitHub REST API.
///
/// Any status the upstream answers with is a success here; only transport
/// failures (refused, reset, timed out) are errors.
#[derive(Clone, Debug)]
pub struct GithubUpstream {
    http: Client,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl GithubUpstream {
    pub fn new(config: &EdgeConfig) -> Result<Self, UpstreamError> {
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.upstream_timeout)
            .build()
            .map_err(UpstreamError::Client)?;

        Ok(Self {
            http,
            base_url: config.upstream_base.clone(),
            token: config.github_token.clone(),
            timeout: config.upstream_timeout,
        })
    }

    /// GET `{base}{path_and_query}`, read to the end.
    pub async fn fetch(&self, path_and_query: &str) -> Result<CachedResponse, UpstreamError> {
        let url = format!("{}{}", self.base_url, path_and_query);
        debug!("upstream GET {}", url);

        let mut request = self.http.get(&url).header(ACCEPT, GITHUB_ACCEPT);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| self.classify(e))?;

        Ok(CachedResponse::new(status, headers, body))
    }

    fn classify(&self, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout(self.timeout)
        } else {
            UpstreamError::Unreachable(err)
        }
    }
}
