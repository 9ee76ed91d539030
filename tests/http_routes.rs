//! Route-level behavior: authentication gating, redirects, not-found pages.

mod support;

use axum::http::StatusCode;
use support::{
    TestApp, body_string, build_router, get, get_with_session, location, post_form,
    signed_in_user,
};

#[tokio::test]
async fn protected_routes_redirect_to_login_with_return_path() {
    let app = TestApp::new();
    let router = build_router(&app);

    for path in ["/create", "/follow"] {
        let response = get(&router, path).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(
            location(&response).as_deref(),
            Some(format!("/auth/login?next={path}").as_str())
        );
    }
}

#[tokio::test]
async fn public_routes_render_without_a_session() {
    let app = TestApp::new();
    app.store.seed_group("Weekend Hikes", "weekend-hikes");
    let author = app.store.seed_user("casual_poster");
    let post = app.store.seed_post(&author, None, "browsable post");
    let router = build_router(&app);

    for path in [
        "/".to_string(),
        "/group/weekend-hikes".to_string(),
        "/profile/casual_poster".to_string(),
        format!("/posts/{}", post.id),
        "/about/author".to_string(),
        "/about/tech".to_string(),
        "/auth/login".to_string(),
        "/auth/signup".to_string(),
    ] {
        let response = get(&router, &path).await;
        assert_eq!(response.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
async fn unknown_resources_render_the_not_found_page() {
    let app = TestApp::new();
    let router = build_router(&app);

    for path in [
        "/group/missing",
        "/profile/ghost",
        "/posts/not-a-uuid",
        "/no/such/route",
    ] {
        let response = get(&router, path).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
        assert!(body_string(response).await.contains("Page not found"));
    }
}

#[tokio::test]
async fn login_sets_a_session_cookie_and_redirects_to_next() {
    let app = TestApp::new();
    let router = build_router(&app);
    signed_in_user(&app, "casual_poster").await;

    let response = post_form(
        &router,
        "/auth/login",
        None,
        "username=casual_poster&password=correct%20horse&next=/follow",
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/follow"));
    let set_cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|value| value.to_str().ok())
        .expect("session cookie set");
    assert!(set_cookie.starts_with("piazza_session="));
    assert!(set_cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn bad_credentials_re_render_the_login_form() {
    let app = TestApp::new();
    let router = build_router(&app);
    signed_in_user(&app, "casual_poster").await;

    let response = post_form(
        &router,
        "/auth/login",
        None,
        "username=casual_poster&password=wrong&next=/",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        body_string(response)
            .await
            .contains("Invalid username or password")
    );
}

#[tokio::test]
async fn follow_route_records_the_pair_and_redirects_to_the_profile() {
    let app = TestApp::new();
    app.store.seed_user("author");
    let router = build_router(&app);
    let (_viewer, token) = signed_in_user(&app, "reader").await;

    let response = post_form(&router, "/profile/author/follow", Some(&token), "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/profile/author"));
    assert_eq!(app.store.follow_count(), 1);

    // Repeating the action is a silent no-op, as is unfollow afterwards.
    let again = post_form(&router, "/profile/author/follow", Some(&token), "").await;
    assert_eq!(again.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.store.follow_count(), 1);

    let unfollow = post_form(&router, "/profile/author/unfollow", Some(&token), "").await;
    assert_eq!(unfollow.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.store.follow_count(), 0);
}

#[tokio::test]
async fn follow_feed_renders_for_signed_in_viewers() {
    let app = TestApp::new();
    let author = app.store.seed_user("author");
    app.store.seed_post(&author, None, "from a followed author");
    let router = build_router(&app);
    let (viewer, token) = signed_in_user(&app, "reader").await;

    app.follows
        .follow(viewer.id, "author")
        .await
        .expect("follow");

    let response = get_with_session(&router, "/follow", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        body_string(response)
            .await
            .contains("from a followed author")
    );
}

#[tokio::test]
async fn non_author_edit_post_redirects_to_detail_and_leaves_the_post_alone() {
    let app = TestApp::new();
    let author = app.store.seed_user("author");
    let post = app.store.seed_post(&author, None, "original text");
    let router = build_router(&app);
    let (_intruder, token) = signed_in_user(&app, "intruder").await;

    let response = get_with_session(&router, &format!("/posts/{}/edit", post.id), &token).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response).as_deref(),
        Some(format!("/posts/{}", post.id).as_str())
    );
    assert_eq!(
        app.store.post_text(post.id).as_deref(),
        Some("original text")
    );
}

#[tokio::test]
async fn empty_comment_redirects_without_saving() {
    let app = TestApp::new();
    let author = app.store.seed_user("author");
    let post = app.store.seed_post(&author, None, "discuss");
    let router = build_router(&app);
    let (_commenter, token) = signed_in_user(&app, "reader").await;

    let response = post_form(
        &router,
        &format!("/posts/{}/comment", post.id),
        Some(&token),
        "text=",
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response).as_deref(),
        Some(format!("/posts/{}", post.id).as_str())
    );
    assert_eq!(app.store.comment_count(), 0);
}

#[tokio::test]
async fn valid_comment_is_saved_and_redirects_to_detail() {
    let app = TestApp::new();
    let author = app.store.seed_user("author");
    let post = app.store.seed_post(&author, None, "discuss");
    let router = build_router(&app);
    let (_commenter, token) = signed_in_user(&app, "reader").await;

    let response = post_form(
        &router,
        &format!("/posts/{}/comment", post.id),
        Some(&token),
        "text=well%20said",
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.store.comment_count(), 1);

    let detail = get(&router, &format!("/posts/{}", post.id)).await;
    assert!(body_string(detail).await.contains("well said"));
}

#[tokio::test]
async fn signup_route_creates_an_account_and_redirects_to_login() {
    let app = TestApp::new();
    let router = build_router(&app);

    let response = post_form(
        &router,
        "/auth/signup",
        None,
        "username=new_member&display_name=&password=long%20enough%20pw",
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/auth/login"));
    assert!(
        app.accounts
            .login("new_member", "long enough pw")
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn logout_clears_the_session() {
    let app = TestApp::new();
    let router = build_router(&app);
    let (_user, token) = signed_in_user(&app, "casual_poster").await;

    let response = post_form(&router, "/auth/logout", Some(&token), "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/"));

    // The old token no longer authenticates.
    let gated = get_with_session(&router, "/follow", &token).await;
    assert_eq!(gated.status(), StatusCode::SEE_OTHER);
}
