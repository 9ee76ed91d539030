use async_trait::async_trait;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{CreateUserParams, RepoError, UsersRepo};
use crate::domain::entities::{CredentialRecord, UserRecord};

use super::PostgresRepositories;
use super::util::map_sqlx_error;

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    display_name: String,
    joined_at: OffsetDateTime,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            display_name: row.display_name,
            joined_at: row.joined_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct CredentialRow {
    id: Uuid,
    username: String,
    display_name: String,
    joined_at: OffsetDateTime,
    password_digest: String,
    password_salt: String,
}

#[async_trait]
impl UsersRepo for PostgresRepositories {
    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError> {
        let row: UserRow = sqlx::query_as(
            "INSERT INTO users (username, display_name, password_digest, password_salt) \
             VALUES ($1, $2, $3, $4) RETURNING id, username, display_name, joined_at",
        )
        .bind(&params.username)
        .bind(&params.display_name)
        .bind(&params.password_digest)
        .bind(&params.password_salt)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, display_name, joined_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(UserRecord::from))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, display_name, joined_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(UserRecord::from))
    }

    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<(UserRecord, CredentialRecord)>, RepoError> {
        let row: Option<CredentialRow> = sqlx::query_as(
            "SELECT id, username, display_name, joined_at, password_digest, password_salt \
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|row| {
            let credentials = CredentialRecord {
                user_id: row.id,
                password_digest: row.password_digest.clone(),
                password_salt: row.password_salt.clone(),
            };
            let user = UserRecord {
                id: row.id,
                username: row.username,
                display_name: row.display_name,
                joined_at: row.joined_at,
            };
            (user, credentials)
        }))
    }
}
