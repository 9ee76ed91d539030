//! The page cache's deliberate staleness window, exercised through the
//! real router.

mod support;

use std::time::Duration;

use axum::http::StatusCode;
use piazza::cache::PageCacheConfig;
use support::{TestApp, body_string, build_router, get};

fn cache_config(ttl: Duration) -> PageCacheConfig {
    PageCacheConfig {
        ttl,
        ..Default::default()
    }
}

#[tokio::test]
async fn deleted_post_stays_visible_until_the_cache_is_cleared() {
    let app = TestApp::with_cache(cache_config(Duration::from_secs(60)));
    let cache = app.cache.clone().expect("cache enabled");
    let router = build_router(&app);

    let author = app.store.seed_user("casual_poster");
    let post = app.store.seed_post(&author, None, "soon to vanish");

    cache.clear();
    let warm = get(&router, "/").await;
    assert_eq!(warm.status(), StatusCode::OK);
    assert!(body_string(warm).await.contains("soon to vanish"));

    // Out-of-band deletion: the cache is not told.
    app.store.remove_post(post.id);

    let stale = get(&router, "/").await;
    assert!(
        body_string(stale).await.contains("soon to vanish"),
        "cached page should still show the deleted post"
    );

    cache.clear();
    let fresh = get(&router, "/").await;
    assert!(!body_string(fresh).await.contains("soon to vanish"));
}

#[tokio::test]
async fn cached_entries_expire_after_the_ttl() {
    let app = TestApp::with_cache(cache_config(Duration::from_millis(20)));
    let router = build_router(&app);

    let author = app.store.seed_user("casual_poster");
    let post = app.store.seed_post(&author, None, "short lived entry");

    let warm = get(&router, "/").await;
    assert!(body_string(warm).await.contains("short lived entry"));

    app.store.remove_post(post.id);
    tokio::time::sleep(Duration::from_millis(40)).await;

    let fresh = get(&router, "/").await;
    assert!(!body_string(fresh).await.contains("short lived entry"));
}

#[tokio::test]
async fn authoring_deletes_invalidate_the_front_page() {
    let app = TestApp::with_cache(cache_config(Duration::from_secs(60)));
    let router = build_router(&app);

    let author = app.store.seed_user("casual_poster");
    let post = app.store.seed_post(&author, None, "managed removal");

    let warm = get(&router, "/").await;
    assert!(body_string(warm).await.contains("managed removal"));

    // Deleting through the service pings the cache.
    app.authoring
        .delete_post(author.id, post.id)
        .await
        .expect("deleted");

    let fresh = get(&router, "/").await;
    assert!(!body_string(fresh).await.contains("managed removal"));
}

#[tokio::test]
async fn pagination_variants_are_cached_independently() {
    let app = TestApp::with_cache(cache_config(Duration::from_secs(60)));
    let cache = app.cache.clone().expect("cache enabled");
    let router = build_router(&app);

    let author = app.store.seed_user("casual_poster");
    for index in 0..12 {
        app.store
            .seed_post(&author, None, &format!("numbered {index}"));
    }

    let page_one = get(&router, "/").await;
    assert!(body_string(page_one).await.contains("numbered 11"));

    let page_two = get(&router, "/?page=2").await;
    let page_two_body = body_string(page_two).await;
    assert!(page_two_body.contains("numbered 0"));
    assert!(!page_two_body.contains("numbered 11"));

    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn detail_pages_are_not_cached() {
    let app = TestApp::with_cache(cache_config(Duration::from_secs(60)));
    let cache = app.cache.clone().expect("cache enabled");
    let router = build_router(&app);

    let author = app.store.seed_user("casual_poster");
    let post = app.store.seed_post(&author, None, "detail view");

    let detail = get(&router, &format!("/posts/{}", post.id)).await;
    assert_eq!(detail.status(), StatusCode::OK);
    assert!(cache.is_empty());
}
