//! Post and comment authoring.
//!
//! Owns the write path for user content: creating and editing posts,
//! attaching comments, and removing posts. Edits are gated on authorship —
//! a non-author is answered with the post's detail location rather than an
//! authorization error. Every mutation that touches cached routes pings the
//! injected page cache.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::forms::{ValidatedCommentForm, ValidatedPostForm};
use crate::application::repos::{
    CommentsRepo, CreateCommentParams, CreatePostParams, GroupsRepo, PostsRepo, PostsWriteRepo,
    RepoError, UpdatePostParams,
};
use crate::cache::PageCache;
use crate::domain::entities::{CommentRecord, PostRecord};

#[derive(Debug, Error)]
pub enum AuthoringError {
    #[error("post not found")]
    PostNotFound,
    #[error("unknown group")]
    UnknownGroup,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Outcome of an edit attempt by some requester.
#[derive(Debug, Clone, PartialEq)]
pub enum EditAccess {
    /// The requester wrote the post and may change it.
    Editable(PostRecord),
    /// Someone else's post; caller should redirect to the detail view.
    NotAuthor { post_id: Uuid },
}

#[derive(Clone)]
pub struct AuthoringService {
    posts: Arc<dyn PostsRepo>,
    posts_write: Arc<dyn PostsWriteRepo>,
    groups: Arc<dyn GroupsRepo>,
    comments: Arc<dyn CommentsRepo>,
    page_cache: Option<Arc<PageCache>>,
}

impl AuthoringService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        posts_write: Arc<dyn PostsWriteRepo>,
        groups: Arc<dyn GroupsRepo>,
        comments: Arc<dyn CommentsRepo>,
    ) -> Self {
        Self {
            posts,
            posts_write,
            groups,
            comments,
            page_cache: None,
        }
    }

    pub fn with_page_cache(mut self, cache: Option<Arc<PageCache>>) -> Self {
        self.page_cache = cache;
        self
    }

    /// Create a post authored by `author_id`.
    pub async fn create_post(
        &self,
        author_id: Uuid,
        form: ValidatedPostForm,
        image_path: Option<String>,
    ) -> Result<PostRecord, AuthoringError> {
        self.ensure_group_exists(form.group_id).await?;

        let post = self
            .posts_write
            .create_post(CreatePostParams {
                text: form.text,
                author_id,
                group_id: form.group_id,
                image_path,
            })
            .await?;

        info!(
            target = "piazza::authoring",
            post_id = %post.id,
            author = %post.author_username,
            "post created"
        );
        self.invalidate_feeds();
        Ok(post)
    }

    /// Load a post for the edit form, resolving whether the requester may
    /// change it.
    pub async fn load_for_edit(
        &self,
        requester_id: Uuid,
        post_id: Uuid,
    ) -> Result<EditAccess, AuthoringError> {
        let post = self
            .posts
            .find_post(post_id)
            .await?
            .ok_or(AuthoringError::PostNotFound)?;

        if post.author_id != requester_id {
            return Ok(EditAccess::NotAuthor { post_id });
        }
        Ok(EditAccess::Editable(post))
    }

    /// Apply an edit. Non-authors get [`EditAccess::NotAuthor`] back with the
    /// post untouched.
    pub async fn update_post(
        &self,
        requester_id: Uuid,
        post_id: Uuid,
        form: ValidatedPostForm,
        image_path: Option<String>,
    ) -> Result<EditAccess, AuthoringError> {
        match self.load_for_edit(requester_id, post_id).await? {
            EditAccess::NotAuthor { post_id } => Ok(EditAccess::NotAuthor { post_id }),
            EditAccess::Editable(_) => {
                self.ensure_group_exists(form.group_id).await?;

                let updated = self
                    .posts_write
                    .update_post(UpdatePostParams {
                        id: post_id,
                        text: form.text,
                        group_id: form.group_id,
                        image_path,
                    })
                    .await?;

                self.invalidate_feeds();
                Ok(EditAccess::Editable(updated))
            }
        }
    }

    /// Remove a post. Only the author may delete; others are answered like
    /// non-author edits.
    pub async fn delete_post(
        &self,
        requester_id: Uuid,
        post_id: Uuid,
    ) -> Result<EditAccess, AuthoringError> {
        match self.load_for_edit(requester_id, post_id).await? {
            EditAccess::NotAuthor { post_id } => Ok(EditAccess::NotAuthor { post_id }),
            EditAccess::Editable(post) => {
                self.posts_write.delete_post(post_id).await?;
                info!(
                    target = "piazza::authoring",
                    post_id = %post_id,
                    "post deleted"
                );
                self.invalidate_feeds();
                Ok(EditAccess::Editable(post))
            }
        }
    }

    /// Attach a comment to a post.
    pub async fn add_comment(
        &self,
        author_id: Uuid,
        post_id: Uuid,
        form: ValidatedCommentForm,
    ) -> Result<CommentRecord, AuthoringError> {
        self.posts
            .find_post(post_id)
            .await?
            .ok_or(AuthoringError::PostNotFound)?;

        let comment = self
            .comments
            .create_comment(CreateCommentParams {
                post_id,
                author_id,
                text: form.text,
            })
            .await?;

        Ok(comment)
    }

    async fn ensure_group_exists(&self, group_id: Option<Uuid>) -> Result<(), AuthoringError> {
        if let Some(id) = group_id {
            if self.groups.find_by_id(id).await?.is_none() {
                return Err(AuthoringError::UnknownGroup);
            }
        }
        Ok(())
    }

    fn invalidate_feeds(&self) {
        if let Some(cache) = &self.page_cache {
            cache.invalidate_after_write();
        }
    }
}
