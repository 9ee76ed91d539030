//! Operational group provisioning.
//!
//! Groups have no public creation surface; operators add them through the
//! `groups add` CLI command. The address is derived from the title and
//! suffixed until it is unique.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::repos::{CreateGroupParams, GroupsRepo, RepoError};
use crate::domain::entities::GroupRecord;
use crate::domain::slug::{SlugAsyncError, generate_unique_slug_async};

#[derive(Debug, Error)]
pub enum GroupProvisionError {
    #[error("could not derive a group address: {0}")]
    Slug(crate::domain::slug::SlugError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Create a group titled `title`, deriving a unique slug from it.
pub async fn provision_group(
    groups: &Arc<dyn GroupsRepo>,
    title: &str,
    description: &str,
) -> Result<GroupRecord, GroupProvisionError> {
    let slug = generate_unique_slug_async(title, |candidate| {
        let groups = groups.clone();
        let candidate = candidate.to_string();
        async move { Ok::<bool, RepoError>(groups.find_by_slug(&candidate).await?.is_none()) }
    })
    .await
    .map_err(|err| match err {
        SlugAsyncError::Slug(err) => GroupProvisionError::Slug(err),
        SlugAsyncError::Predicate(err) => GroupProvisionError::Repo(err),
    })?;

    let group = groups
        .create_group(CreateGroupParams {
            title: title.trim().to_string(),
            slug,
            description: description.trim().to_string(),
        })
        .await?;

    info!(
        target = "piazza::groups",
        slug = %group.slug,
        title = %group.title,
        "group provisioned"
    );
    Ok(group)
}
