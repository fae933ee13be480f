//! Postgres-backed repository implementations.

mod comments;
mod follows;
mod groups;
mod posts;
mod rows;
mod users;
mod util;

pub use util::map_sqlx_error;

use std::sync::Arc;

use sqlx::{
    Postgres, QueryBuilder,
    postgres::{PgPool, PgPoolOptions},
    query,
};

use crate::application::repos::RepoError;

/// Shared projection for post listings: the post with its author and group.
const POST_SELECT: &str = "SELECT p.id, p.text, p.image, p.created_at, \
     u.id AS author_id, u.username AS author_username, \
     g.id AS group_id, g.title AS group_title, g.slug AS group_slug \
     FROM posts p \
     INNER JOIN users u ON u.id = p.author_id \
     LEFT JOIN post_groups g ON g.id = p.group_id ";

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }

    fn post_query<'q>() -> QueryBuilder<'q, Postgres> {
        QueryBuilder::new(POST_SELECT)
    }

    /// Newest first; `id` breaks ties between posts created in the same instant.
    fn push_post_order<'q>(qb: &mut QueryBuilder<'q, Postgres>) {
        qb.push(" ORDER BY p.created_at DESC, p.id DESC ");
    }

    fn push_window<'q>(
        qb: &mut QueryBuilder<'q, Postgres>,
        window: crate::application::pagination::PageWindow,
    ) -> Result<(), RepoError> {
        let offset = i64::try_from(window.offset)
            .map_err(|_| RepoError::InvalidInput {
                message: "page offset exceeds supported range".to_string(),
            })?;
        qb.push(" LIMIT ");
        qb.push_bind(i64::from(window.limit));
        qb.push(" OFFSET ");
        qb.push_bind(offset);
        Ok(())
    }

    fn convert_count(value: i64) -> Result<u64, RepoError> {
        value
            .try_into()
            .map_err(|_| RepoError::from_persistence("count exceeds supported range"))
    }
}
