//! Page cache middleware.
//!
//! Serves fronted GET routes from the cache and stores successful responses
//! back. Within the TTL the cache is deliberately unaware of data changes;
//! mutating services call [`PageCache::invalidate_after_write`] explicitly.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument};

use super::{CachedPage, PageCache, PageKey};

const MAX_CACHED_BODY_BYTES: usize = 1024 * 1024;

#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn page_cache_layer(
    State(cache): State<Arc<PageCache>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !cache.config().enabled || request.method() != Method::GET {
        return next.run(request).await;
    }

    let path = request.uri().path().to_string();
    if !cache.fronts_path(&path) {
        return next.run(request).await;
    }

    let query = request.uri().query().unwrap_or("");
    let key = PageKey::new(path, query);

    if let Some(cached) = cache.lookup(&key) {
        debug!(target = "piazza::cache", outcome = "hit", "serving cached page");
        return build_response(cached);
    }

    debug!(target = "piazza::cache", outcome = "miss", "rendering page");
    let response = next.run(request).await;

    if response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_CACHED_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    let cached = CachedPage::new(
        parts.status.as_u16(),
        parts
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect(),
        bytes.clone(),
    );
    cache.insert(key, cached);

    Response::from_parts(parts, Body::from(bytes))
}

fn build_response(cached: CachedPage) -> Response {
    use axum::http::HeaderValue;

    let mut builder = Response::builder().status(cached.status);
    for (name, value) in cached.headers {
        if let Ok(header_value) = HeaderValue::from_str(&value) {
            builder = builder.header(name, header_value);
        }
    }

    builder
        .body(Body::from(cached.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
