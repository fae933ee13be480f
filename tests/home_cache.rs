//! Home timeline page cache behaviour through the full router.

mod support;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use tower::ServiceExt;

use plaza::cache::{
    CacheConfig, CacheError, CachedPage, HomeCacheState, MemoryPageStore, PageStore,
};

use support::{EPOCH, InMemoryContent, body_to_string, router};

fn cache_config() -> CacheConfig {
    CacheConfig {
        enabled: true,
        home_ttl: Duration::from_secs(20),
        max_entries: 16,
    }
}

fn memory_cache() -> HomeCacheState {
    let config = cache_config();
    let store = Arc::new(MemoryPageStore::new(&config));
    HomeCacheState::new(config, store)
}

async fn get_body(app: &Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_string(response.into_body()).await)
}

#[tokio::test(start_paused = true)]
async fn home_page_stays_stale_until_ttl_expires() {
    let content = InMemoryContent::new();
    let leo = content.seed_user("leo");
    let post = content.add_post(&leo, "soon to be deleted", None, EPOCH);
    let app = router(&content, Some(memory_cache()));

    let (status, first) = get_body(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(first.contains("soon to be deleted"));

    content.remove_post(post.id);

    tokio::time::advance(Duration::from_secs(10)).await;
    let (_, body) = get_body(&app, "/").await;
    assert_eq!(body, first, "served from cache");

    tokio::time::advance(Duration::from_secs(11)).await;
    let (_, body) = get_body(&app, "/").await;
    assert!(!body.contains("soon to be deleted"), "recomputed after expiry");
}

#[tokio::test(start_paused = true)]
async fn new_posts_do_not_bust_the_cache() {
    let content = InMemoryContent::new();
    let leo = content.seed_user("leo");
    content.add_post(&leo, "first", None, EPOCH);
    let app = router(&content, Some(memory_cache()));

    get_body(&app, "/").await;
    content.add_post(&leo, "fresh news", None, EPOCH + time::Duration::minutes(1));

    let (_, body) = get_body(&app, "/").await;
    assert!(!body.contains("fresh news"));
}

#[tokio::test(start_paused = true)]
async fn each_page_number_is_cached_separately() {
    let content = InMemoryContent::new();
    let leo = content.seed_user("leo");
    content.add_posts(&leo, 15, EPOCH);
    let app = router(&content, Some(memory_cache()));

    let (_, first) = get_body(&app, "/").await;
    let (_, second) = get_body(&app, "/?page=2").await;

    assert!(first.contains("leo post #14"));
    assert!(second.contains("leo post #0"));
    assert!(!second.contains("leo post #14"));
}

#[tokio::test]
async fn disabled_cache_always_renders_live() {
    let content = InMemoryContent::new();
    let leo = content.seed_user("leo");
    let post = content.add_post(&leo, "short lived", None, EPOCH);
    let app = router(&content, None);

    get_body(&app, "/").await;
    content.remove_post(post.id);

    let (_, body) = get_body(&app, "/").await;
    assert!(!body.contains("short lived"));
}

#[derive(Default)]
struct BrokenStore {
    lookups: AtomicUsize,
}

impl PageStore for BrokenStore {
    fn get(&self, _key: &str) -> Result<Option<CachedPage>, CacheError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Unavailable("backend offline".to_string()))
    }

    fn set(&self, _key: String, _page: CachedPage, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("backend offline".to_string()))
    }
}

#[tokio::test]
async fn unavailable_store_falls_through_to_live_rendering() {
    let content = InMemoryContent::new();
    let leo = content.seed_user("leo");
    content.add_post(&leo, "still visible", None, EPOCH);

    let store = Arc::new(BrokenStore::default());
    let cache = HomeCacheState::new(cache_config(), store.clone());
    let app = router(&content, Some(cache));

    let (status, body) = get_body(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("still visible"));
    assert_eq!(store.lookups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn oversized_home_page_is_served_without_caching() {
    let content = InMemoryContent::new();
    let leo = content.seed_user("leo");
    let long_text = "a".repeat(120 * 1024);
    for minute in 0..10 {
        content.add_post(&leo, &long_text, None, EPOCH + time::Duration::minutes(minute));
    }

    let (live_status, live) = get_body(&router(&content, None), "/").await;
    let app = router(&content, Some(memory_cache()));
    let (status, body) = get_body(&app, "/").await;

    assert_eq!(live_status, StatusCode::OK);
    assert_eq!(status, StatusCode::OK);
    assert!(body.len() > 1024 * 1024);
    assert_eq!(body, live);

    content.add_post(&leo, "after the big ones", None, EPOCH + time::Duration::hours(1));
    let (_, body) = get_body(&app, "/").await;
    assert!(body.contains("after the big ones"), "large pages are rendered live");
}
