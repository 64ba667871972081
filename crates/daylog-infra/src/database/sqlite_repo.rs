//! SQLite repository implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Statement,
};
use uuid::Uuid;

use daylog_core::domain::{Attachment, Post};
use daylog_core::error::RepoError;
use daylog_core::filter::{PostQuery, year_bounds};
use daylog_core::ports::{
    AttachmentRepository, DeviceRepository, PostPage, PostRepository, YearCount,
};

use super::entity::attachment::{self, Entity as AttachmentEntity};
use super::entity::device::{self, Entity as DeviceEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::sqlite_base::{SqliteBaseRepository, repo_err};

/// SQLite post repository.
pub type SqlitePostRepository = SqliteBaseRepository<PostEntity>;

/// SQLite attachment repository.
pub type SqliteAttachmentRepository = SqliteBaseRepository<AttachmentEntity>;

/// SQLite device repository.
pub type SqliteDeviceRepository = SqliteBaseRepository<DeviceEntity>;

const YEAR_COUNTS_SQL: &str = "SELECT strftime('%Y', event_time) AS year, COUNT(*) AS count \
     FROM posts WHERE deleted_at IS NULL GROUP BY year ORDER BY year DESC";

#[derive(Debug, FromQueryResult)]
struct YearRow {
    year: Option<String>,
    count: i64,
}

/// Escape LIKE wildcards so user input only ever matches literally.
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl PostRepository for SqlitePostRepository {
    async fn find_live(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find_by_id(id)
            .filter(post::Column::DeletedAt.is_null())
            .one(self.db.as_ref())
            .await
            .map_err(repo_err)?;

        Ok(result.map(Into::into))
    }

    async fn query(&self, query: &PostQuery) -> Result<PostPage, RepoError> {
        let mut select = PostEntity::find().filter(post::Column::DeletedAt.is_null());

        if let Some(search) = &query.search {
            let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(post::Column::Body)))
                    .like(LikeExpr::new(pattern).escape('\\')),
            );
        }

        if let Some(year) = query.year {
            let Some((start, end)) = year_bounds(year) else {
                return Ok(PostPage::default());
            };
            select = select
                .filter(post::Column::EventTime.gte(start))
                .filter(post::Column::EventTime.lt(end));
        }

        if let Some(cutoff) = query.newer_than {
            select = select.filter(post::Column::EventTime.gt(cutoff));
        }

        let total = select.clone().count(self.db.as_ref()).await.map_err(repo_err)?;

        // SQLite binds offsets as i64; anything past that is past the end.
        if i64::try_from(query.offset).is_err() || i64::try_from(query.limit).is_err() {
            return Ok(PostPage {
                posts: Vec::new(),
                total,
            });
        }

        let posts = select
            .order_by_desc(post::Column::EventTime)
            .order_by_desc(post::Column::Id)
            .offset(query.offset)
            .limit(query.limit)
            .all(self.db.as_ref())
            .await
            .map_err(repo_err)?;

        tracing::debug!(total, returned = posts.len(), "Post query executed");

        Ok(PostPage {
            posts: posts.into_iter().map(Into::into).collect(),
            total,
        })
    }

    async fn year_counts(&self) -> Result<Vec<YearCount>, RepoError> {
        let backend = self.db.get_database_backend();
        let rows = YearRow::find_by_statement(Statement::from_string(backend, YEAR_COUNTS_SQL))
            .all(self.db.as_ref())
            .await
            .map_err(repo_err)?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let year = row.year?.parse().ok()?;
                Some(YearCount {
                    year,
                    count: u64::try_from(row.count).unwrap_or(0),
                })
            })
            .collect())
    }
}

#[async_trait]
impl AttachmentRepository for SqliteAttachmentRepository {
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Attachment>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let result = AttachmentEntity::find()
            .filter(attachment::Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(attachment::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(repo_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_by_post_ids(&self, post_ids: &[Uuid]) -> Result<Vec<Attachment>, RepoError> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        let result = AttachmentEntity::find()
            .filter(attachment::Column::PostId.is_in(post_ids.iter().copied()))
            .order_by_asc(attachment::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(repo_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn link_to_post(&self, post_id: Uuid, ids: &[Uuid]) -> Result<u64, RepoError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = AttachmentEntity::update_many()
            .col_expr(attachment::Column::InUse, Expr::value(true))
            .col_expr(attachment::Column::PostId, Expr::value(post_id))
            .filter(attachment::Column::Id.is_in(ids.iter().copied()))
            .filter(attachment::Column::InUse.eq(false))
            .exec(self.db.as_ref())
            .await
            .map_err(repo_err)?;

        Ok(result.rows_affected)
    }
}

#[async_trait]
impl DeviceRepository for SqliteDeviceRepository {
    async fn delete_created_until(&self, cutoff: DateTime<Utc>) -> Result<u64, RepoError> {
        let result = DeviceEntity::delete_many()
            .filter(device::Column::CreatedAt.lte(cutoff))
            .exec(self.db.as_ref())
            .await
            .map_err(repo_err)?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
        assert_eq!(escape_like("plain"), "plain");
    }
}
