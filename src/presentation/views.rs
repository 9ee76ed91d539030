use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use time::{OffsetDateTime, macros::format_description};

use crate::application::error::{ErrorReport, HttpError};

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(viewer: Option<ViewerView>) -> Response {
    let view = LayoutContext::new(viewer, ErrorPageView::not_found());
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

/// Render a timestamp the way every page shows it.
pub fn format_timestamp(when: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]");
    when.format(format).unwrap_or_default()
}

/// The signed-in user as the layout shows them.
#[derive(Clone)]
pub struct ViewerView {
    pub username: String,
    pub profile_href: String,
}

impl ViewerView {
    pub fn new(username: impl Into<String>) -> Self {
        let username = username.into();
        let profile_href = format!("/profile/{username}");
        Self {
            username,
            profile_href,
        }
    }
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub viewer: Option<ViewerView>,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(viewer: Option<ViewerView>, content: T) -> Self {
        Self { viewer, content }
    }
}

#[derive(Clone)]
pub struct PostCard {
    pub id: String,
    pub detail_href: String,
    pub text: String,
    pub author_username: String,
    pub author_href: String,
    pub group_title: Option<String>,
    pub group_href: Option<String>,
    pub image_href: Option<String>,
    pub published: String,
}

#[derive(Clone)]
pub struct PagerView {
    pub number: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_href: String,
    pub next_href: String,
}

pub struct IndexContext {
    pub posts: Vec<PostCard>,
    pub pager: PagerView,
}

pub struct GroupContext {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub posts: Vec<PostCard>,
    pub pager: PagerView,
}

pub struct ProfileContext {
    pub username: String,
    pub display_name: String,
    pub joined: String,
    pub post_count: u64,
    pub follower_count: u64,
    pub is_following: bool,
    pub is_self: bool,
    pub posts: Vec<PostCard>,
    pub pager: PagerView,
}

pub struct FollowContext {
    pub posts: Vec<PostCard>,
    pub pager: PagerView,
}

#[derive(Clone)]
pub struct CommentView {
    pub author_username: String,
    pub author_href: String,
    pub text: String,
    pub published: String,
}

pub struct PostDetailContext {
    pub id: String,
    pub title: String,
    pub text: String,
    pub author_username: String,
    pub author_href: String,
    pub author_post_count: u64,
    pub group_title: Option<String>,
    pub group_href: Option<String>,
    pub image_href: Option<String>,
    pub published: String,
    pub comments: Vec<CommentView>,
    pub comment_error: Option<String>,
}

/// One entry in the post form's group selector.
#[derive(Clone)]
pub struct GroupOption {
    pub id: String,
    pub title: String,
    pub selected: bool,
}

pub struct PostFormContext {
    pub is_edit: bool,
    pub action_href: String,
    pub text: String,
    pub groups: Vec<GroupOption>,
    pub text_error: Option<String>,
    pub group_error: Option<String>,
    pub image_error: Option<String>,
}

pub struct LoginContext {
    pub username: String,
    pub next: String,
    pub error: Option<String>,
}

pub struct SignupContext {
    pub username: String,
    pub display_name: String,
    pub username_error: Option<String>,
    pub password_error: Option<String>,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            title: "Page not found".to_string(),
            message: "The page you requested does not exist. Try returning to the front page."
                .to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: LayoutContext<IndexContext>,
}

#[derive(Template)]
#[template(path = "group.html")]
pub struct GroupTemplate {
    pub view: LayoutContext<GroupContext>,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub view: LayoutContext<ProfileContext>,
}

#[derive(Template)]
#[template(path = "follow.html")]
pub struct FollowTemplate {
    pub view: LayoutContext<FollowContext>,
}

#[derive(Template)]
#[template(path = "post_detail.html")]
pub struct PostDetailTemplate {
    pub view: LayoutContext<PostDetailContext>,
}

#[derive(Template)]
#[template(path = "post_form.html")]
pub struct PostFormTemplate {
    pub view: LayoutContext<PostFormContext>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub view: LayoutContext<LoginContext>,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub view: LayoutContext<SignupContext>,
}

#[derive(Template)]
#[template(path = "about_author.html")]
pub struct AboutAuthorTemplate {
    pub view: LayoutContext<()>,
}

#[derive(Template)]
#[template(path = "about_tech.html")]
pub struct AboutTechTemplate {
    pub view: LayoutContext<()>,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn timestamps_render_in_utc_minutes() {
        let when = datetime!(2024-05-04 13:37:42 UTC);
        assert_eq!(format_timestamp(when), "2024-05-04 13:37");
    }

    #[test]
    fn viewer_view_derives_profile_href() {
        let viewer = ViewerView::new("casual_poster");
        assert_eq!(viewer.profile_href, "/profile/casual_poster");
    }
}
