//! Follow relationship management.
//!
//! Follows are directed (viewer → author) pairs. Creation is idempotent and
//! self-follows are swallowed; removal of an absent pair is a no-op. Both
//! operations resolve the target by username so handlers can redirect back
//! to the profile either way.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::application::repos::{FollowsRepo, RepoError, UsersRepo};

#[derive(Debug, Error)]
pub enum FollowError {
    #[error("unknown author")]
    UnknownAuthor,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Created,
    AlreadyFollowing,
    SelfFollow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnfollowOutcome {
    Removed,
    NotFollowing,
}

#[derive(Clone)]
pub struct FollowService {
    users: Arc<dyn UsersRepo>,
    follows: Arc<dyn FollowsRepo>,
}

impl FollowService {
    pub fn new(users: Arc<dyn UsersRepo>, follows: Arc<dyn FollowsRepo>) -> Self {
        Self { users, follows }
    }

    /// Start following `target_username`. Duplicate and self-follow requests
    /// succeed without creating anything.
    pub async fn follow(
        &self,
        viewer: Uuid,
        target_username: &str,
    ) -> Result<FollowOutcome, FollowError> {
        let author = self.resolve_author(target_username).await?;

        if author.id == viewer {
            return Ok(FollowOutcome::SelfFollow);
        }

        let created = self.follows.create_follow(viewer, author.id).await?;
        if created {
            debug!(
                target = "piazza::follows",
                viewer = %viewer,
                author = %author.username,
                "follow created"
            );
            Ok(FollowOutcome::Created)
        } else {
            Ok(FollowOutcome::AlreadyFollowing)
        }
    }

    /// Stop following `target_username`; absent pairs are a silent no-op.
    pub async fn unfollow(
        &self,
        viewer: Uuid,
        target_username: &str,
    ) -> Result<UnfollowOutcome, FollowError> {
        let author = self.resolve_author(target_username).await?;

        let removed = self.follows.delete_follow(viewer, author.id).await?;
        if removed {
            Ok(UnfollowOutcome::Removed)
        } else {
            Ok(UnfollowOutcome::NotFollowing)
        }
    }

    pub async fn is_following(
        &self,
        viewer: Uuid,
        target_username: &str,
    ) -> Result<bool, FollowError> {
        let author = self.resolve_author(target_username).await?;
        if author.id == viewer {
            return Ok(false);
        }
        self.follows
            .follow_exists(viewer, author.id)
            .await
            .map_err(FollowError::from)
    }

    async fn resolve_author(
        &self,
        username: &str,
    ) -> Result<crate::domain::entities::UserRecord, FollowError> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or(FollowError::UnknownAuthor)
    }
}
