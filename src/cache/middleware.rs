//! Response cache middleware for the home timeline.
//!
//! Serves stored bytes while an entry is fresh. Misses run the handler and
//! store the response when it is a cookie-free 200 small enough to buffer.
//! Store failures are logged and the request is computed live.

use std::sync::Arc;

use axum::{
    body::{Body, HttpBody},
    extract::State,
    http::{Method, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::counter;
use tracing::{debug, instrument, warn};

use super::{
    CacheConfig,
    store::{CachedPage, PageStore},
};

const MAX_CACHED_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct HomeCacheState {
    pub config: CacheConfig,
    pub store: Arc<dyn PageStore>,
}

impl HomeCacheState {
    pub fn new(config: CacheConfig, store: Arc<dyn PageStore>) -> Self {
        Self { config, store }
    }
}

#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn home_cache_layer(
    State(cache): State<HomeCacheState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !cache.config.enabled || request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = cache_key(&request);

    match cache.store.get(&key) {
        Ok(Some(page)) => {
            counter!("plaza_home_cache_hit_total").increment(1);
            debug!(cache = "home", outcome = "hit", key = %key, "serving cached page");
            return build_response(page);
        }
        Ok(None) => {
            counter!("plaza_home_cache_miss_total").increment(1);
            debug!(cache = "home", outcome = "miss", key = %key, "rendering page");
        }
        Err(err) => {
            warn!(cache = "home", key = %key, error = %err, "page cache lookup failed");
            return next.run(request).await;
        }
    }

    let response = next.run(request).await;
    if !should_store(&response) {
        return response;
    }
    if !fits_in_cache(&response) {
        debug!(cache = "home", key = %key, "page too large to cache");
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_CACHED_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(cache = "home", key = %key, error = %err, "failed to buffer response body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let page = CachedPage {
        status: parts.status,
        headers: parts
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect(),
        body: bytes.clone(),
    };

    if let Err(err) = cache.store.set(key.clone(), page, cache.config.home_ttl) {
        warn!(cache = "home", key = %key, error = %err, "failed to store rendered page");
    }

    Response::from_parts(parts, Body::from(bytes))
}

/// Path plus query string; each page number is cached on its own.
fn cache_key(request: &Request<Body>) -> String {
    match request.uri().query() {
        Some(query) => format!("{}?{}", request.uri().path(), query),
        None => request.uri().path().to_string(),
    }
}

fn should_store(response: &Response) -> bool {
    response.status() == StatusCode::OK && !response.headers().contains_key(header::SET_COOKIE)
}

/// Only bodies whose size is known up front and within the buffer limit are
/// collected, so an oversized page is still returned untouched.
fn fits_in_cache(response: &Response) -> bool {
    response
        .body()
        .size_hint()
        .upper()
        .is_some_and(|len| len <= MAX_CACHED_BODY_BYTES as u64)
}

fn build_response(page: CachedPage) -> Response {
    let mut builder = Response::builder().status(page.status);
    for (name, value) in page.headers {
        builder = builder.header(name, value);
    }
    builder
        .body(Body::from(page.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
