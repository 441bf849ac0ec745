use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use folio::domain::CACHE_TIME_HEADER;
use folio::{CacheStore, CachedResponse};
use server_http::{build_router, AppState, EdgeProxy};
use shared::config::EdgeConfig;
use shared::now_millis;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storage_engine::{EdgeCache, MokaCache};
use tower::ServiceExt;

const EDGE_HOST: &str = "edge.test";
const UNREACHABLE: &str = "http://127.0.0.1:1";

#[derive(Clone, Debug, Default)]
struct Seen {
    path_and_query: String,
    user_agent: Option<String>,
    accept: Option<String>,
    authorization: Option<String>,
}

/// Stand-in for the GitHub API that counts and records every request.
#[derive(Clone, Default)]
struct FakeGithub {
    hits: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl FakeGithub {
    fn record(&self, headers: &HeaderMap, uri: &Uri) {
        let value = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.hits.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(Seen {
            path_and_query: uri.path_and_query().map(|pq| pq.to_string()).unwrap_or_default(),
            user_agent: value(header::USER_AGENT),
            accept: value(header::ACCEPT),
            authorization: value(header::AUTHORIZATION),
        });
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn last(&self) -> Seen {
        self.seen.lock().unwrap().last().cloned().unwrap()
    }
}

async fn user(State(gh): State<FakeGithub>, headers: HeaderMap, uri: Uri) -> impl IntoResponse {
    gh.record(&headers, &uri);
    (
        [
            ("content-type", "application/json; charset=utf-8"),
            ("x-ratelimit-remaining", "59"),
            ("x-ratelimit-reset", "1700000000"),
            ("etag", "\"abc\""),
        ],
        r#"{"login":"octocat"}"#,
    )
}

async fn missing(State(gh): State<FakeGithub>, headers: HeaderMap, uri: Uri) -> impl IntoResponse {
    gh.record(&headers, &uri);
    (StatusCode::NOT_FOUND, r#"{"message":"Not Found"}"#)
}

async fn search(State(gh): State<FakeGithub>, headers: HeaderMap, uri: Uri) -> impl IntoResponse {
    gh.record(&headers, &uri);
    Json(serde_json::json!({ "query": uri.query() }))
}

async fn spawn_github() -> (String, FakeGithub) {
    let gh = FakeGithub::default();
    let app = Router::new()
        .route("/users/{name}", get(user))
        .route("/missing", get(missing))
        .route("/search/repositories", get(search))
        .with_state(gh.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), gh)
}

struct Edge {
    app: Router,
    proxy: Arc<EdgeProxy>,
    store: Arc<MokaCache<String, CachedResponse>>,
}

impl Edge {
    fn new(config: EdgeConfig) -> Self {
        let store: Arc<MokaCache<String, CachedResponse>> =
            Arc::new(MokaCache::new("edge-test", None, None));
        let cache: EdgeCache = store.clone();
        let proxy = Arc::new(EdgeProxy::new(&config, cache).unwrap());
        let app = build_router(AppState::new(proxy.clone()));
        Self { app, proxy, store }
    }

    fn for_upstream(base: &str) -> Self {
        let mut config = EdgeConfig::for_upstream(base);
        config.upstream_timeout = Duration::from_secs(2);
        Self::new(config)
    }

    async fn send(&self, method: Method, uri: &str) -> Response {
        self.send_with(method, uri, &[]).await
    }

    async fn send_with(&self, method: Method, uri: &str, extra: &[(&str, &str)]) -> Response {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::HOST, EDGE_HOST);
        for (name, value) in extra {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::empty()).unwrap();
        self.app.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str) -> Response {
        self.send(Method::GET, uri).await
    }

    async fn seed(&self, uri: &str, response: CachedResponse) {
        self.store
            .put(format!("http://{EDGE_HOST}{uri}"), response)
            .await
            .unwrap();
    }

    async fn cached(&self, uri: &str) -> Option<CachedResponse> {
        self.stored(&format!("http://{EDGE_HOST}{uri}")).await
    }

    async fn stored(&self, key: &str) -> Option<CachedResponse> {
        self.store.get(&key.to_string()).await.ok().map(|hit| hit.value)
    }
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn cached_user(written_ms: i64) -> CachedResponse {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
    CachedResponse::new(StatusCode::OK, headers, Bytes::from(r#"{"login":"cached"}"#))
        .stamped(written_ms)
}

#[tokio::test]
async fn test_preflight_is_answered_locally() {
    let (base, gh) = spawn_github().await;
    let edge = Edge::for_upstream(&base);

    let response = edge.send(Method::OPTIONS, "/api/github/users/octocat").await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let headers = response.headers().clone();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET, OPTIONS");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
    assert!(body_text(response).await.is_empty());
    assert_eq!(gh.hits(), 0);
}

#[tokio::test]
async fn test_upstream_response_is_normalized() {
    let (base, gh) = spawn_github().await;
    let edge = Edge::for_upstream(&base);

    let response = edge.get("/api/github/users/octocat").await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=300");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(headers["x-ratelimit-remaining"], "59");
    assert_eq!(headers["x-ratelimit-reset"], "1700000000");
    assert!(headers.get(header::ETAG).is_none());
    assert_eq!(body_text(response).await, r#"{"login":"octocat"}"#);

    let seen = gh.last();
    assert_eq!(seen.path_and_query, "/users/octocat");
    assert_eq!(seen.user_agent.as_deref(), Some("folio-edge"));
    assert_eq!(seen.accept.as_deref(), Some("application/vnd.github.v3+json"));
    assert_eq!(seen.authorization, None);
}

#[tokio::test]
async fn test_bearer_token_is_injected() {
    let (base, gh) = spawn_github().await;
    let mut config = EdgeConfig::for_upstream(&base);
    config.github_token = Some("ghp_secret".into());
    let edge = Edge::new(config);

    edge.get("/api/github/users/octocat").await;

    assert_eq!(gh.last().authorization.as_deref(), Some("Bearer ghp_secret"));
}

#[tokio::test]
async fn test_query_string_is_passed_through() {
    let (base, gh) = spawn_github().await;
    let edge = Edge::for_upstream(&base);

    let response = edge
        .get("/api/github/search/repositories?q=rust&sort=stars")
        .await;

    assert_eq!(gh.last().path_and_query, "/search/repositories?q=rust&sort=stars");
    assert_eq!(body_text(response).await, r#"{"query":"q=rust&sort=stars"}"#);
}

#[tokio::test]
async fn test_ok_response_is_cached_and_reused() {
    let (base, gh) = spawn_github().await;
    let edge = Edge::for_upstream(&base);

    edge.get("/api/github/users/octocat").await;
    edge.proxy.flush().await;

    let stored = edge.cached("/api/github/users/octocat").await.unwrap();
    assert!(stored.headers.contains_key(CACHE_TIME_HEADER));

    let second = edge.get("/api/github/users/octocat").await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(second.headers()["x-ratelimit-remaining"], "59");
    assert_eq!(body_text(second).await, r#"{"login":"octocat"}"#);
    assert_eq!(gh.hits(), 1);
}

#[tokio::test]
async fn test_forwarded_https_requests_get_their_own_key() {
    let (base, gh) = spawn_github().await;
    let edge = Edge::for_upstream(&base);

    let response = edge
        .send_with(
            Method::GET,
            "/api/github/users/octocat",
            &[("x-forwarded-proto", "https")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    edge.proxy.flush().await;

    assert!(edge.stored("https://edge.test/api/github/users/octocat").await.is_some());
    assert!(edge.cached("/api/github/users/octocat").await.is_none());

    edge.get("/api/github/users/octocat").await;
    assert_eq!(gh.hits(), 2);
}

#[tokio::test]
async fn test_error_status_passes_through_uncached() {
    let (base, gh) = spawn_github().await;
    let edge = Edge::for_upstream(&base);

    for _ in 0..2 {
        let response = edge.get("/api/github/missing").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["x-ratelimit-remaining"], "");
        assert_eq!(response.headers()["x-ratelimit-reset"], "");
        assert_eq!(body_text(response).await, r#"{"message":"Not Found"}"#);
        edge.proxy.flush().await;
    }

    assert!(edge.cached("/api/github/missing").await.is_none());
    assert_eq!(gh.hits(), 2);
}

#[tokio::test]
async fn test_concurrent_misses_each_reach_upstream() {
    let (base, gh) = spawn_github().await;
    let edge = Edge::for_upstream(&base);

    let (a, b) = tokio::join!(
        edge.get("/api/github/users/octocat"),
        edge.get("/api/github/users/octocat"),
    );

    assert_eq!(a.status(), StatusCode::OK);
    assert_eq!(b.status(), StatusCode::OK);
    assert_eq!(gh.hits(), 2);

    edge.proxy.flush().await;
    assert!(edge.cached("/api/github/users/octocat").await.is_some());
}

#[tokio::test]
async fn test_upstream_down_without_cache_is_503() {
    let edge = Edge::for_upstream(UNREACHABLE);

    let response = edge.get("/api/github/users/octocat").await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_text(response).await, "Service Unavailable");
}

#[tokio::test]
async fn test_fresh_entry_is_served_without_upstream() {
    let edge = Edge::for_upstream(UNREACHABLE);
    edge.seed("/api/github/users/octocat", cached_user(now_millis()))
        .await;

    let response = edge.get("/api/github/users/octocat").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, r#"{"login":"cached"}"#);
    edge.proxy.flush().await;
    assert!(edge.cached("/api/github/users/octocat").await.is_some());
}

#[tokio::test]
async fn test_upstream_down_serves_stale_entry_then_evicts_it() {
    let edge = Edge::for_upstream(UNREACHABLE);
    let ten_minutes_ago = now_millis() - 10 * 60 * 1000;
    edge.seed("/api/github/users/octocat", cached_user(ten_minutes_ago))
        .await;

    let response = edge.get("/api/github/users/octocat").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, r#"{"login":"cached"}"#);

    edge.proxy.flush().await;
    assert!(edge.cached("/api/github/users/octocat").await.is_none());

    let after = edge.get("/api/github/users/octocat").await;
    assert_eq!(after.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_upstream_down_keeps_unmarked_entry() {
    let edge = Edge::for_upstream(UNREACHABLE);
    let unmarked = CachedResponse::new(StatusCode::OK, HeaderMap::new(), Bytes::from("[]"));
    edge.seed("/api/github/users/octocat", unmarked).await;

    let response = edge.get("/api/github/users/octocat").await;

    assert_eq!(body_text(response).await, "[]");
    edge.proxy.flush().await;
    assert!(edge.cached("/api/github/users/octocat").await.is_some());
}

#[tokio::test]
async fn test_health() {
    let edge = Edge::for_upstream(UNREACHABLE);

    let response = edge.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, r#"{"message":"OK"}"#);
}
