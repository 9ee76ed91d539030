//! Session cookie extraction and the login/logout/signup handlers.

use axum::{
    extract::{FromRequestParts, Query, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tracing::debug;

use crate::application::accounts::AccountError;
use crate::application::error::HttpError;
use crate::application::forms::{LoginForm, SignupForm};
use crate::domain::entities::UserRecord;
use crate::presentation::views::{
    LayoutContext, LoginContext, LoginTemplate, SignupContext, SignupTemplate, ViewerView,
    render_template_response,
};

use super::HttpState;

pub const SESSION_COOKIE: &str = "piazza_session";

/// An authenticated requester. Missing or expired sessions reject with a
/// redirect to the login form carrying the original path.
pub struct CurrentUser(pub UserRecord);

/// The requester if signed in; public pages use this for the layout chrome.
pub struct MaybeUser(pub Option<UserRecord>);

impl FromRequestParts<HttpState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &HttpState,
    ) -> Result<Self, Self::Rejection> {
        match resolve_viewer(parts, state).await {
            Ok(Some(user)) => Ok(CurrentUser(user)),
            Ok(None) => Err(redirect_to_login(parts.uri.path()).into_response()),
            Err(err) => Err(err.into_response()),
        }
    }
}

impl FromRequestParts<HttpState> for MaybeUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &HttpState,
    ) -> Result<Self, Self::Rejection> {
        match resolve_viewer(parts, state).await {
            Ok(viewer) => Ok(MaybeUser(viewer)),
            Err(err) => Err(err.into_response()),
        }
    }
}

async fn resolve_viewer(
    parts: &Parts,
    state: &HttpState,
) -> Result<Option<UserRecord>, HttpError> {
    let jar = CookieJar::from_headers(&parts.headers);
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(None);
    };

    state
        .accounts
        .authenticate(cookie.value())
        .await
        .map_err(|err| {
            HttpError::from_error(
                "infra::http::auth::resolve_viewer",
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                &err,
            )
        })
}

pub fn redirect_to_login(return_path: &str) -> Redirect {
    Redirect::to(&format!("/auth/login?next={return_path}"))
}

pub fn viewer_view(user: &Option<UserRecord>) -> Option<ViewerView> {
    user.as_ref()
        .map(|user| ViewerView::new(user.username.as_str()))
}

/// Only same-site paths may be used as a post-login destination.
fn sanitize_next(next: &str) -> &str {
    if next.starts_with('/') && !next.starts_with("//") {
        next
    } else {
        "/"
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginQuery {
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginSubmission {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    next: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupSubmission {
    #[serde(default)]
    username: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    password: String,
}

pub async fn login_form(
    MaybeUser(viewer): MaybeUser,
    Query(query): Query<LoginQuery>,
) -> Response {
    if viewer.is_some() {
        return Redirect::to("/").into_response();
    }

    render_login(
        String::new(),
        sanitize_next(query.next.as_deref().unwrap_or("/")).to_string(),
        None,
    )
}

pub async fn login_submit(
    State(state): State<HttpState>,
    jar: CookieJar,
    axum::Form(submission): axum::Form<LoginSubmission>,
) -> Response {
    let next = sanitize_next(&submission.next).to_string();

    let form = LoginForm {
        username: submission.username.clone(),
        password: submission.password.clone(),
    };
    if form.validate().is_err() {
        return render_login(
            submission.username,
            next,
            Some("Enter both username and password.".to_string()),
        );
    }

    match state
        .accounts
        .login(&submission.username, &submission.password)
        .await
    {
        Ok(session) => {
            let max_age = time::Duration::try_from(state.accounts.session_ttl())
                .unwrap_or(time::Duration::days(14));
            let cookie = Cookie::build((SESSION_COOKIE, session.token))
                .http_only(true)
                .same_site(SameSite::Lax)
                .path("/")
                .max_age(max_age)
                .build();

            debug!(
                target = "piazza::http::auth",
                username = %session.user.username,
                "login succeeded"
            );
            (jar.add(cookie), Redirect::to(&next)).into_response()
        }
        Err(AccountError::InvalidCredentials) => render_login(
            submission.username,
            next,
            Some("Invalid username or password.".to_string()),
        ),
        Err(err) => HttpError::from_error(
            "infra::http::auth::login_submit",
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
            &err,
        )
        .into_response(),
    }
}

pub async fn logout(State(state): State<HttpState>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let _ = state.accounts.logout(cookie.value()).await;
    }

    let removal = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    (jar.remove(removal), Redirect::to("/")).into_response()
}

pub async fn signup_form(MaybeUser(viewer): MaybeUser) -> Response {
    if viewer.is_some() {
        return Redirect::to("/").into_response();
    }

    render_signup(String::new(), String::new(), None, None)
}

pub async fn signup_submit(
    State(state): State<HttpState>,
    axum::Form(submission): axum::Form<SignupSubmission>,
) -> Response {
    let form = SignupForm {
        username: submission.username.clone(),
        display_name: submission.display_name.clone(),
        password: submission.password,
    };

    let validated = match form.validate() {
        Ok(validated) => validated,
        Err(errors) => {
            return render_signup(
                submission.username,
                submission.display_name,
                errors.for_field("username").map(str::to_string),
                errors.for_field("password").map(str::to_string),
            );
        }
    };

    match state.accounts.register(validated).await {
        Ok(_) => Redirect::to("/auth/login").into_response(),
        Err(AccountError::UsernameTaken) => render_signup(
            submission.username,
            submission.display_name,
            Some("That username is already taken.".to_string()),
            None,
        ),
        Err(err) => HttpError::from_error(
            "infra::http::auth::signup_submit",
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
            &err,
        )
        .into_response(),
    }
}

fn render_login(username: String, next: String, error: Option<String>) -> Response {
    let view = LayoutContext::new(
        None,
        LoginContext {
            username,
            next,
            error,
        },
    );
    render_template_response(LoginTemplate { view }, StatusCode::OK)
}

fn render_signup(
    username: String,
    display_name: String,
    username_error: Option<String>,
    password_error: Option<String>,
) -> Response {
    let view = LayoutContext::new(
        None,
        SignupContext {
            username,
            display_name,
            username_error,
            password_error,
        },
    );
    render_template_response(SignupTemplate { view }, StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_paths_are_sanitized() {
        assert_eq!(sanitize_next("/follow"), "/follow");
        assert_eq!(sanitize_next("//evil.example"), "/");
        assert_eq!(sanitize_next("https://evil.example"), "/");
        assert_eq!(sanitize_next(""), "/");
    }
}
