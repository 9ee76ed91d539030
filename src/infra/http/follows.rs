//! Follow feed and follow/unfollow actions.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use crate::application::error::HttpError;
use crate::application::follows::FollowError;
use crate::presentation::views::{
    FollowTemplate, LayoutContext, render_not_found_response, render_template_response,
};

use super::HttpState;
use super::auth::{CurrentUser, viewer_view};
use super::public::{PageQuery, feed_error_to_response};

const SOURCE: &str = "infra::http::follows";

pub async fn follow_feed(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PageQuery>,
) -> Response {
    let viewer = viewer_view(&Some(user.clone()));

    match state.feed.follow_page(user.id, query.number()).await {
        Ok(content) => {
            let view = LayoutContext::new(viewer, content);
            render_template_response(FollowTemplate { view }, StatusCode::OK)
        }
        Err(err) => feed_error_to_response(err, viewer),
    }
}

pub async fn follow(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> Response {
    match state.follows.follow(user.id, &username).await {
        // Every non-error outcome lands back on the profile, including the
        // silent self-follow and already-following cases.
        Ok(_) => Redirect::to(&format!("/profile/{username}")).into_response(),
        Err(FollowError::UnknownAuthor) => render_not_found_response(viewer_view(&Some(user))),
        Err(err) => HttpError::from_error(
            SOURCE,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
            &err,
        )
        .into_response(),
    }
}

pub async fn unfollow(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> Response {
    match state.follows.unfollow(user.id, &username).await {
        Ok(_) => Redirect::to(&format!("/profile/{username}")).into_response(),
        Err(FollowError::UnknownAuthor) => render_not_found_response(viewer_view(&Some(user))),
        Err(err) => HttpError::from_error(
            SOURCE,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
            &err,
        )
        .into_response(),
    }
}
