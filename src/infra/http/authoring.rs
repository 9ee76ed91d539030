//! Post and comment authoring handlers.
//!
//! Create/edit submissions arrive as multipart forms (the post may carry an
//! image). Validation failures re-render the form with field errors; only
//! authors get past the edit routes, everyone else is bounced to the
//! read-only detail view.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use bytes::Bytes;
use serde::Deserialize;
use uuid::Uuid;

use crate::application::authoring::{AuthoringError, EditAccess};
use crate::application::error::HttpError;
use crate::application::forms::{CommentForm, FormErrors, PostForm};
use crate::domain::entities::UserRecord;
use crate::infra::uploads::UploadStorageError;
use crate::presentation::views::{
    GroupOption, LayoutContext, PostFormContext, PostFormTemplate, render_not_found_response,
    render_template_response,
};

use super::HttpState;
use super::auth::{CurrentUser, viewer_view};

const SOURCE: &str = "infra::http::authoring";

/// One parsed multipart post submission.
struct PostSubmission {
    form: PostForm,
    image: Option<(String, Bytes)>,
}

async fn read_post_submission(mut multipart: Multipart) -> Result<PostSubmission, HttpError> {
    let mut form = PostForm::default();
    let mut image = None;

    loop {
        let field = multipart.next_field().await.map_err(|err| {
            HttpError::from_error(
                SOURCE,
                StatusCode::BAD_REQUEST,
                "Malformed form submission",
                &err,
            )
        })?;
        let Some(field) = field else { break };

        match field.name() {
            Some("text") => {
                form.text = field.text().await.map_err(|err| {
                    HttpError::from_error(
                        SOURCE,
                        StatusCode::BAD_REQUEST,
                        "Malformed form submission",
                        &err,
                    )
                })?;
            }
            Some("group") => {
                form.group = field.text().await.map_err(|err| {
                    HttpError::from_error(
                        SOURCE,
                        StatusCode::BAD_REQUEST,
                        "Malformed form submission",
                        &err,
                    )
                })?;
            }
            Some("image") => {
                let filename = field.file_name().unwrap_or("image").to_string();
                let data = field.bytes().await.map_err(|err| {
                    HttpError::from_error(
                        SOURCE,
                        StatusCode::PAYLOAD_TOO_LARGE,
                        "Uploaded image is too large",
                        &err,
                    )
                })?;
                // Browsers submit an empty part when no file was picked.
                if !data.is_empty() {
                    image = Some((filename, data));
                }
            }
            _ => {}
        }
    }

    Ok(PostSubmission { form, image })
}

struct FormErrorsView {
    text: Option<String>,
    group: Option<String>,
    image: Option<String>,
}

impl FormErrorsView {
    fn none() -> Self {
        Self {
            text: None,
            group: None,
            image: None,
        }
    }

    fn from_form(errors: &FormErrors) -> Self {
        Self {
            text: errors.for_field("text").map(str::to_string),
            group: errors.for_field("group").map(str::to_string),
            image: None,
        }
    }

    fn group_error(message: &str) -> Self {
        Self {
            text: None,
            group: Some(message.to_string()),
            image: None,
        }
    }

    fn image_error(message: &str) -> Self {
        Self {
            text: None,
            group: None,
            image: Some(message.to_string()),
        }
    }
}

async fn render_post_form(
    state: &HttpState,
    user: &UserRecord,
    is_edit: bool,
    action_href: String,
    text: String,
    selected_group: &str,
    errors: FormErrorsView,
) -> Response {
    let groups = match state.groups.list_all().await {
        Ok(groups) => groups,
        Err(err) => {
            return HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                &err,
            )
            .into_response();
        }
    };

    let options = groups
        .into_iter()
        .map(|group| {
            let id = group.id.to_string();
            let selected = id == selected_group;
            GroupOption {
                id,
                title: group.title,
                selected,
            }
        })
        .collect();

    let content = PostFormContext {
        is_edit,
        action_href,
        text,
        groups: options,
        text_error: errors.text,
        group_error: errors.group,
        image_error: errors.image,
    };
    let view = LayoutContext::new(viewer_view(&Some(user.clone())), content);
    render_template_response(PostFormTemplate { view }, StatusCode::OK)
}

async fn store_submitted_image(
    state: &HttpState,
    image: Option<(String, Bytes)>,
) -> Result<Option<String>, UploadStorageError> {
    match image {
        Some((filename, data)) => {
            let stored = state.uploads.store_image(&filename, data).await?;
            Ok(Some(stored.stored_path))
        }
        None => Ok(None),
    }
}

fn image_error_message(err: &UploadStorageError) -> &'static str {
    match err {
        UploadStorageError::NotAnImage => "The uploaded file is not a recognized image.",
        UploadStorageError::PayloadTooLarge => "The uploaded image is too large.",
        UploadStorageError::EmptyPayload => "The uploaded image is empty.",
        _ => "The image could not be stored.",
    }
}

pub async fn create_form(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
) -> Response {
    render_post_form(
        &state,
        &user,
        false,
        "/create".to_string(),
        String::new(),
        "",
        FormErrorsView::none(),
    )
    .await
}

pub async fn create_submit(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Response {
    let submission = match read_post_submission(multipart).await {
        Ok(submission) => submission,
        Err(err) => return err.into_response(),
    };

    let validated = match submission.form.validate() {
        Ok(validated) => validated,
        Err(errors) => {
            return render_post_form(
                &state,
                &user,
                false,
                "/create".to_string(),
                submission.form.text,
                &submission.form.group,
                FormErrorsView::from_form(&errors),
            )
            .await;
        }
    };

    let image_path = match store_submitted_image(&state, submission.image).await {
        Ok(path) => path,
        Err(err) => {
            return render_post_form(
                &state,
                &user,
                false,
                "/create".to_string(),
                submission.form.text,
                &submission.form.group,
                FormErrorsView::image_error(image_error_message(&err)),
            )
            .await;
        }
    };

    match state.authoring.create_post(user.id, validated, image_path).await {
        Ok(_) => Redirect::to(&format!("/profile/{}", user.username)).into_response(),
        Err(AuthoringError::UnknownGroup) => {
            render_post_form(
                &state,
                &user,
                false,
                "/create".to_string(),
                submission.form.text,
                &submission.form.group,
                FormErrorsView::group_error("Select a valid group."),
            )
            .await
        }
        Err(err) => HttpError::from_error(
            SOURCE,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
            &err,
        )
        .into_response(),
    }
}

pub async fn edit_form(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Response {
    let Ok(post_id) = Uuid::parse_str(&id) else {
        return render_not_found_response(viewer_view(&Some(user)));
    };

    match state.authoring.load_for_edit(user.id, post_id).await {
        Ok(EditAccess::Editable(post)) => {
            let selected = post
                .group_id
                .map(|id| id.to_string())
                .unwrap_or_default();
            render_post_form(
                &state,
                &user,
                true,
                format!("/posts/{post_id}/edit"),
                post.text,
                &selected,
                FormErrorsView::none(),
            )
            .await
        }
        Ok(EditAccess::NotAuthor { post_id }) => {
            Redirect::to(&format!("/posts/{post_id}")).into_response()
        }
        Err(AuthoringError::PostNotFound) => render_not_found_response(viewer_view(&Some(user))),
        Err(err) => HttpError::from_error(
            SOURCE,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
            &err,
        )
        .into_response(),
    }
}

pub async fn edit_submit(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Response {
    let Ok(post_id) = Uuid::parse_str(&id) else {
        return render_not_found_response(viewer_view(&Some(user)));
    };

    let submission = match read_post_submission(multipart).await {
        Ok(submission) => submission,
        Err(err) => return err.into_response(),
    };
    let action_href = format!("/posts/{post_id}/edit");

    let validated = match submission.form.validate() {
        Ok(validated) => validated,
        Err(errors) => {
            return render_post_form(
                &state,
                &user,
                true,
                action_href,
                submission.form.text,
                &submission.form.group,
                FormErrorsView::from_form(&errors),
            )
            .await;
        }
    };

    let image_path = match store_submitted_image(&state, submission.image).await {
        Ok(path) => path,
        Err(err) => {
            return render_post_form(
                &state,
                &user,
                true,
                action_href,
                submission.form.text,
                &submission.form.group,
                FormErrorsView::image_error(image_error_message(&err)),
            )
            .await;
        }
    };

    match state
        .authoring
        .update_post(user.id, post_id, validated, image_path)
        .await
    {
        Ok(EditAccess::Editable(_)) | Ok(EditAccess::NotAuthor { .. }) => {
            Redirect::to(&format!("/posts/{post_id}")).into_response()
        }
        Err(AuthoringError::PostNotFound) => render_not_found_response(viewer_view(&Some(user))),
        Err(AuthoringError::UnknownGroup) => {
            render_post_form(
                &state,
                &user,
                true,
                action_href,
                submission.form.text,
                &submission.form.group,
                FormErrorsView::group_error("Select a valid group."),
            )
            .await
        }
        Err(err) => HttpError::from_error(
            SOURCE,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
            &err,
        )
        .into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct CommentSubmission {
    #[serde(default)]
    text: String,
}

pub async fn add_comment(
    State(state): State<HttpState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    axum::Form(submission): axum::Form<CommentSubmission>,
) -> Response {
    let Ok(post_id) = Uuid::parse_str(&id) else {
        return render_not_found_response(viewer_view(&Some(user)));
    };

    let form = CommentForm {
        text: submission.text,
    };

    // Invalid comments are dropped; either way the requester lands back on
    // the detail view.
    if let Ok(validated) = form.validate() {
        match state.authoring.add_comment(user.id, post_id, validated).await {
            Ok(_) => {}
            Err(AuthoringError::PostNotFound) => {
                return render_not_found_response(viewer_view(&Some(user)));
            }
            Err(err) => {
                return HttpError::from_error(
                    SOURCE,
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    &err,
                )
                .into_response();
            }
        }
    }

    Redirect::to(&format!("/posts/{post_id}")).into_response()
}
