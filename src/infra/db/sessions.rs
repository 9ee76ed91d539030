use async_trait::async_trait;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{CreateSessionParams, RepoError, SessionsRepo};
use crate::domain::entities::SessionRecord;

use super::PostgresRepositories;
use super::util::map_sqlx_error;

const SESSION_COLUMNS: &str = "id, user_id, token_digest, created_at, expires_at";

#[derive(Debug, FromRow)]
struct SessionRow {
    id: Uuid,
    user_id: Uuid,
    token_digest: String,
    created_at: OffsetDateTime,
    expires_at: OffsetDateTime,
}

impl From<SessionRow> for SessionRecord {
    fn from(row: SessionRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            token_digest: row.token_digest,
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}

#[async_trait]
impl SessionsRepo for PostgresRepositories {
    async fn create_session(
        &self,
        params: CreateSessionParams,
    ) -> Result<SessionRecord, RepoError> {
        let row: SessionRow = sqlx::query_as(&format!(
            "INSERT INTO sessions (user_id, token_digest, expires_at) \
             VALUES ($1, $2, $3) RETURNING {SESSION_COLUMNS}"
        ))
        .bind(params.user_id)
        .bind(&params.token_digest)
        .bind(params.expires_at)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_by_token_digest(
        &self,
        digest: &str,
    ) -> Result<Option<SessionRecord>, RepoError> {
        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE token_digest = $1"
        ))
        .bind(digest)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(SessionRecord::from))
    }

    async fn delete_by_token_digest(&self, digest: &str) -> Result<bool, RepoError> {
        let deleted = sqlx::query("DELETE FROM sessions WHERE token_digest = $1")
            .bind(digest)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(deleted.rows_affected() == 1)
    }

    async fn delete_expired(&self, now: OffsetDateTime) -> Result<u64, RepoError> {
        let deleted = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(deleted.rows_affected())
    }
}
