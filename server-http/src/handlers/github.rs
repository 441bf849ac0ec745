use crate::cors;
use crate::proxy::cache_key;
use crate::routes::API_PREFIX;
use crate::state::AppState;
use axum::http::HeaderName;
use axum::{
    body::Body,
    extract::State,
    http::{header::HOST, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use folio::CachedResponse;

const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Scheme the client used, as reported by a TLS-terminating front; `http` otherwise.
fn forwarded_scheme(headers: &HeaderMap) -> &'static str {
    let proto = headers
        .get(X_FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim);
    match proto {
        Some(p) if p.eq_ignore_ascii_case("https") => "https",
        _ => "http",
    }
}

/// Axum adapter for a proxied or cached upstream response.
#[derive(Debug)]
pub struct EdgeResponse(pub CachedResponse);

impl IntoResponse for EdgeResponse {
    fn into_response(self) -> Response {
        let CachedResponse {
            status,
            headers,
            body,
        } = self.0;
        (status, headers, Body::from(body)).into_response()
    }
}

/// OPTIONS /api/github/*
pub async fn preflight() -> impl IntoResponse {
    (StatusCode::NO_CONTENT, cors::headers())
}

/// GET /api/github/*
pub async fn proxy_github(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
) -> EdgeResponse {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    let upstream_path = path_and_query
        .strip_prefix(API_PREFIX)
        .unwrap_or(path_and_query);

    let host = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or("localhost");

    let key = cache_key(forwarded_scheme(&headers), host, path_and_query);
    EdgeResponse(state.proxy.handle(&key, upstream_path).await)
}
