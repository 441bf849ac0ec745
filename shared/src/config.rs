use crate::TtlMs;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Edge proxy settings.
#[derive(Clone, Debug)]
pub struct EdgeConfig {
    pub host: String,
    pub http_port: u16,
    pub upstream_base: String,
    pub github_token: Option<String>,
    pub user_agent: String,
    pub cache_ttl: TtlMs,
    pub cache_retention: Duration,
    pub cache_capacity: u64,
    pub upstream_timeout: Duration,
}

impl EdgeConfig {
    const DEFAULT_HOST: &str = "0.0.0.0";
    const DEFAULT_HTTP_PORT: u16 = 8787;
    const DEFAULT_UPSTREAM_BASE: &str = "https://api.github.com";
    const DEFAULT_USER_AGENT: &str = "folio-edge";
    const DEFAULT_TTL_SECS: u64 = 300;
    const DEFAULT_RETENTION_SECS: u64 = 24 * 60 * 60;
    const DEFAULT_CAPACITY: u64 = 10_000;
    const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 10_000;

    pub fn from_env() -> Self {
        let github_token = std::env::var("GITHUB_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());
        if github_token.is_none() {
            warn!("GITHUB_TOKEN not set, upstream requests will be unauthenticated");
        }

        Self {
            host: std::env::var("FOLIO_HOST").unwrap_or_else(|_| Self::DEFAULT_HOST.to_string()),
            http_port: env_or("FOLIO_HTTP_PORT", Self::DEFAULT_HTTP_PORT),
            upstream_base: std::env::var("FOLIO_UPSTREAM_BASE")
                .unwrap_or_else(|_| Self::DEFAULT_UPSTREAM_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            github_token,
            user_agent: std::env::var("FOLIO_USER_AGENT")
                .unwrap_or_else(|_| Self::DEFAULT_USER_AGENT.to_string()),
            cache_ttl: TtlMs::from_secs(env_or("FOLIO_EDGE_TTL_SECS", Self::DEFAULT_TTL_SECS)),
            cache_retention: Duration::from_secs(env_or(
                "FOLIO_EDGE_RETENTION_SECS",
                Self::DEFAULT_RETENTION_SECS,
            )),
            cache_capacity: env_or("FOLIO_EDGE_CAPACITY", Self::DEFAULT_CAPACITY),
            upstream_timeout: Duration::from_millis(env_or(
                "FOLIO_UPSTREAM_TIMEOUT_MS",
                Self::DEFAULT_UPSTREAM_TIMEOUT_MS,
            )),
        }
    }

    /// Defaults pointed at a specific upstream, used by tests and local runs.
    pub fn for_upstream(upstream_base: impl Into<String>) -> Self {
        Self {
            host: Self::DEFAULT_HOST.to_string(),
            http_port: Self::DEFAULT_HTTP_PORT,
            upstream_base: upstream_base.into().trim_end_matches('/').to_string(),
            github_token: None,
            user_agent: Self::DEFAULT_USER_AGENT.to_string(),
            cache_ttl: TtlMs::from_secs(Self::DEFAULT_TTL_SECS),
            cache_retention: Duration::from_secs(Self::DEFAULT_RETENTION_SECS),
            cache_capacity: Self::DEFAULT_CAPACITY,
            upstream_timeout: Duration::from_millis(Self::DEFAULT_UPSTREAM_TIMEOUT_MS),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }

    /// `max-age` advertised to browsers, derived from the edge TTL.
    pub fn max_age_secs(&self) -> u64 {
        self.cache_ttl.0 / 1000
    }
}

/// Animation preferences handed to anything that moves on screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MotionConfig {
    pub reduced_motion: bool,
}

impl MotionConfig {
    pub fn from_env() -> Self {
        Self {
            reduced_motion: env_flag("FOLIO_REDUCED_MOTION"),
        }
    }
}

/// Where the site's data lives and which repositories it shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiteConfig {
    pub api_base: String,
    pub owner: String,
    pub repos: Vec<String>,
    pub card_repos: Vec<String>,
}

impl SiteConfig {
    const DEFAULT_API_BASE: &str = "/api/github";
    const DEFAULT_OWNER: &str = "jtn0123";
    const DEFAULT_REPOS: &str = "MegaBonk,VoltTracker,landing-page,satellite_processor,AudioWhisper";
    const DEFAULT_CARD_REPOS: &str = "MegaBonk,VoltTracker,satellite_processor,AudioWhisper";

    pub fn from_env() -> Self {
        Self {
            api_base: std::env::var("FOLIO_API_BASE")
                .unwrap_or_else(|_| Self::DEFAULT_API_BASE.to_string()),
            owner: std::env::var("FOLIO_OWNER").unwrap_or_else(|_| Self::DEFAULT_OWNER.to_string()),
            repos: split_list(
                &std::env::var("FOLIO_REPOS").unwrap_or_else(|_| Self::DEFAULT_REPOS.to_string()),
            ),
            card_repos: split_list(
                &std::env::var("FOLIO_CARD_REPOS")
                    .unwrap_or_else(|_| Self::DEFAULT_CARD_REPOS.to_string()),
            ),
        }
    }

    /// Proxy path for `/repos/{owner}/{repo}{suffix}`.
    pub fn repo_path(&self, repo: &str, suffix: &str) -> String {
        format!("{}/repos/{}/{}{}", self.api_base, self.owner, repo, suffix)
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            api_base: Self::DEFAULT_API_BASE.to_string(),
            owner: Self::DEFAULT_OWNER.to_string(),
            repos: split_list(Self::DEFAULT_REPOS),
            card_repos: split_list(Self::DEFAULT_CARD_REPOS),
        }
    }
}

/// Client data layer settings.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub edge_url: String,
    pub cache_ttl: TtlMs,
    pub site: SiteConfig,
    pub motion: MotionConfig,
}

impl ClientConfig {
    const DEFAULT_EDGE_URL: &str = "http://localhost:8787";
    pub const DEFAULT_TTL: TtlMs = TtlMs(30 * 60 * 1000);

    pub fn from_env() -> Self {
        Self {
            edge_url: std::env::var("FOLIO_EDGE_URL")
                .unwrap_or_else(|_| Self::DEFAULT_EDGE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            cache_ttl: std::env::var("FOLIO_CLIENT_TTL_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(TtlMs::from_secs)
                .unwrap_or(Self::DEFAULT_TTL),
            site: SiteConfig::from_env(),
            motion: MotionConfig::from_env(),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str) -> bool {
    matches!(
        std::env::var(key).as_deref().map(str::trim),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
