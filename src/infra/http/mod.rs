mod auth;
mod authoring;
mod follows;
mod middleware;
mod public;

pub use auth::{CurrentUser, MaybeUser, SESSION_COOKIE};

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use sqlx::Error as SqlxError;

use crate::application::error::ErrorReport;
use crate::application::{
    accounts::AccountService, authoring::AuthoringService, feed::FeedService,
    follows::FollowService, repos::GroupsRepo,
};
use crate::cache::{PageCache, page_cache_layer};
use crate::infra::db::PostgresRepositories;
use crate::infra::uploads::UploadStorage;

use self::middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
    pub authoring: Arc<AuthoringService>,
    pub follows: Arc<FollowService>,
    pub accounts: Arc<AccountService>,
    pub groups: Arc<dyn GroupsRepo>,
    pub uploads: Arc<UploadStorage>,
    pub db: Arc<PostgresRepositories>,
    pub page_cache: Option<Arc<PageCache>>,
    pub upload_limit_bytes: usize,
}

pub fn build_router(state: HttpState) -> Router {
    // Feed routes fronted by the page cache; everything else renders fresh.
    let cached_routes = Router::new()
        .route("/", get(public::index))
        .route("/follow", get(follows::follow_feed));

    let cached_routes = if let Some(cache) = state.page_cache.clone() {
        cached_routes.layer(axum_middleware::from_fn_with_state(
            cache,
            page_cache_layer,
        ))
    } else {
        cached_routes
    };

    let routes = Router::new()
        .route("/group/{slug}", get(public::group_index))
        .route("/profile/{username}", get(public::profile))
        .route("/posts/{id}", get(public::post_detail))
        .route(
            "/create",
            get(authoring::create_form).post(authoring::create_submit),
        )
        .route(
            "/posts/{id}/edit",
            get(authoring::edit_form).post(authoring::edit_submit),
        )
        .route("/posts/{id}/comment", post(authoring::add_comment))
        .route("/profile/{username}/follow", post(follows::follow))
        .route("/profile/{username}/unfollow", post(follows::unfollow))
        .route("/about/author", get(public::about_author))
        .route("/about/tech", get(public::about_tech))
        .route(
            "/auth/login",
            get(auth::login_form).post(auth::login_submit),
        )
        .route("/auth/logout", post(auth::logout))
        .route(
            "/auth/signup",
            get(auth::signup_form).post(auth::signup_submit),
        )
        .route("/uploads/{*path}", get(public::serve_upload))
        .route("/_health/db", get(public::db_health));

    let body_limit = state.upload_limit_bytes.saturating_add(64 * 1024);

    cached_routes
        .merge(routes)
        .fallback(public::fallback)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

fn db_health_response(result: Result<(), SqlxError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
