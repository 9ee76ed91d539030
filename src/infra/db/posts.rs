use async_trait::async_trait;
use sqlx::{FromRow, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::pagination::{Page, PageRequest};
use crate::application::repos::{
    CreatePostParams, FeedScope, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::PostRecord;

use super::PostgresRepositories;
use super::util::map_sqlx_error;

const POST_COLUMNS: &str = "p.id, p.text, p.author_id, u.username AS author_username, \
     p.group_id, g.slug AS group_slug, g.title AS group_title, p.image_path, p.created_at";

const POST_JOINS: &str = " FROM posts p \
     INNER JOIN users u ON u.id = p.author_id \
     LEFT JOIN groups g ON g.id = p.group_id WHERE 1=1 ";

#[derive(Debug, FromRow)]
struct PostRow {
    id: Uuid,
    text: String,
    author_id: Uuid,
    author_username: String,
    group_id: Option<Uuid>,
    group_slug: Option<String>,
    group_title: Option<String>,
    image_path: Option<String>,
    created_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            text: row.text,
            author_id: row.author_id,
            author_username: row.author_username,
            group_id: row.group_id,
            group_slug: row.group_slug,
            group_title: row.group_title,
            image_path: row.image_path,
            created_at: row.created_at,
        }
    }
}

fn apply_scope_conditions(qb: &mut QueryBuilder<'_, Postgres>, scope: FeedScope) {
    match scope {
        FeedScope::All => {}
        FeedScope::Group(group_id) => {
            qb.push(" AND p.group_id = ");
            qb.push_bind(group_id);
        }
        FeedScope::Author(author_id) => {
            qb.push(" AND p.author_id = ");
            qb.push_bind(author_id);
        }
        FeedScope::FollowedBy(viewer_id) => {
            qb.push(" AND EXISTS (SELECT 1 FROM follows f WHERE f.user_id = ");
            qb.push_bind(viewer_id);
            qb.push(" AND f.author_id = p.author_id)");
        }
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_posts(
        &self,
        scope: FeedScope,
        page: PageRequest,
    ) -> Result<Page<PostRecord>, RepoError> {
        let total = self.count_posts(scope).await?;

        let mut qb = QueryBuilder::new(format!("SELECT {POST_COLUMNS}{POST_JOINS}"));
        apply_scope_conditions(&mut qb, scope);
        qb.push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ");
        qb.push_bind(i64::from(page.limit().clamp(1, 100)));
        qb.push(" OFFSET ");
        qb.push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));

        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let records = rows.into_iter().map(PostRecord::from).collect();
        Ok(Page::new(records, page, total))
    }

    async fn count_posts(&self, scope: FeedScope) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM posts p WHERE 1=1 ");
        apply_scope_conditions(&mut qb, scope);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let mut qb = QueryBuilder::new(format!("SELECT {POST_COLUMNS}{POST_JOINS}"));
        qb.push(" AND p.id = ");
        qb.push_bind(id);

        let row = qb
            .build_query_as::<PostRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }
}

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO posts (text, author_id, group_id, image_path) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&params.text)
        .bind(params.author_id)
        .bind(params.group_id)
        .bind(&params.image_path)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        self.find_post(id)
            .await?
            .ok_or_else(|| RepoError::from_persistence("inserted post row vanished"))
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        // A missing image keeps whatever was stored before.
        let updated = sqlx::query(
            "UPDATE posts SET text = $2, group_id = $3, \
             image_path = COALESCE($4, image_path) WHERE id = $1",
        )
        .bind(params.id)
        .bind(&params.text)
        .bind(params.group_id)
        .bind(&params.image_path)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if updated.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        self.find_post(params.id)
            .await?
            .ok_or(RepoError::NotFound)
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let deleted = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if deleted.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
