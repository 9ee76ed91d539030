//! Public read-only pages: feeds, profiles, post detail, about, assets.

use axum::{
    extract::{Path, Query, State},
    http::{
        StatusCode,
        header::{CACHE_CONTROL, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::application::{error::HttpError, feed::FeedError, pagination::PageNumber};
use crate::presentation::views::{
    AboutAuthorTemplate, AboutTechTemplate, GroupTemplate, IndexTemplate, LayoutContext,
    PostDetailTemplate, ProfileTemplate, ViewerView, render_not_found_response,
    render_template_response,
};

use super::auth::{MaybeUser, viewer_view};
use super::{HttpState, db_health_response};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    pub(crate) fn number(&self) -> PageNumber {
        PageNumber::from_query(self.page.as_deref())
    }
}

pub async fn index(
    State(state): State<HttpState>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<PageQuery>,
) -> Response {
    let viewer = viewer_view(&user);

    match state.feed.index_page(query.number()).await {
        Ok(content) => {
            let view = LayoutContext::new(viewer, content);
            render_template_response(IndexTemplate { view }, StatusCode::OK)
        }
        Err(err) => feed_error_to_response(err, viewer),
    }
}

pub async fn group_index(
    State(state): State<HttpState>,
    MaybeUser(user): MaybeUser,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    let viewer = viewer_view(&user);

    match state.feed.group_page(&slug, query.number()).await {
        Ok(content) => {
            let view = LayoutContext::new(viewer, content);
            render_template_response(GroupTemplate { view }, StatusCode::OK)
        }
        Err(err) => feed_error_to_response(err, viewer),
    }
}

pub async fn profile(
    State(state): State<HttpState>,
    MaybeUser(user): MaybeUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    let viewer_id = user.as_ref().map(|user| user.id);
    let viewer = viewer_view(&user);

    match state
        .feed
        .profile_page(&username, viewer_id, query.number())
        .await
    {
        Ok(content) => {
            let view = LayoutContext::new(viewer, content);
            render_template_response(ProfileTemplate { view }, StatusCode::OK)
        }
        Err(err) => feed_error_to_response(err, viewer),
    }
}

pub async fn post_detail(
    State(state): State<HttpState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
) -> Response {
    let viewer = viewer_view(&user);

    let Ok(post_id) = Uuid::parse_str(&id) else {
        return render_not_found_response(viewer);
    };

    match state.feed.post_detail(post_id).await {
        Ok(Some(content)) => {
            let view = LayoutContext::new(viewer, content);
            render_template_response(PostDetailTemplate { view }, StatusCode::OK)
        }
        Ok(None) => render_not_found_response(viewer),
        Err(err) => feed_error_to_response(err, viewer),
    }
}

pub async fn about_author(MaybeUser(user): MaybeUser) -> Response {
    let view = LayoutContext::new(viewer_view(&user), ());
    render_template_response(AboutAuthorTemplate { view }, StatusCode::OK)
}

pub async fn about_tech(MaybeUser(user): MaybeUser) -> Response {
    let view = LayoutContext::new(viewer_view(&user), ());
    render_template_response(AboutTechTemplate { view }, StatusCode::OK)
}

pub async fn serve_upload(State(state): State<HttpState>, Path(path): Path<String>) -> Response {
    match state.uploads.load(&path).await {
        Ok((data, content_type)) => (
            StatusCode::OK,
            [
                (CONTENT_TYPE, content_type),
                (CACHE_CONTROL, "public, max-age=86400".to_string()),
            ],
            data,
        )
            .into_response(),
        Err(err) => {
            let mut response = StatusCode::NOT_FOUND.into_response();
            crate::application::error::ErrorReport::from_error(
                "infra::http::public::serve_upload",
                StatusCode::NOT_FOUND,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

pub async fn db_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.db.health_check().await)
}

pub async fn fallback(MaybeUser(user): MaybeUser) -> Response {
    render_not_found_response(viewer_view(&user))
}

pub(crate) fn feed_error_to_response(err: FeedError, viewer: Option<ViewerView>) -> Response {
    match err {
        FeedError::UnknownGroup | FeedError::UnknownAuthor => render_not_found_response(viewer),
        err @ FeedError::Repo(_) => HttpError::from(err).into_response(),
    }
}
