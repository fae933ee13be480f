use std::collections::HashSet;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::repos::{FollowsRepo, RepoError};

use super::{PostgresRepositories, map_sqlx_error};

#[async_trait]
impl FollowsRepo for PostgresRepositories {
    async fn list_authors_followed_by(&self, user_id: Uuid) -> Result<HashSet<Uuid>, RepoError> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT author_id FROM follows WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(ids.into_iter().collect())
    }

    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE user_id = $1 AND author_id = $2)",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn count_followers(&self, author_id: Uuid) -> Result<u64, RepoError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE author_id = $1")
                .bind(author_id)
                .fetch_one(self.pool())
                .await
                .map_err(map_sqlx_error)?;
        Self::convert_count(count)
    }

    async fn create_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query(
            "INSERT INTO follows (id, user_id, author_id) VALUES ($1, $2, $3) \
             ON CONFLICT ON CONSTRAINT unique_author_user_following DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(author_id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND author_id = $2")
            .bind(user_id)
            .bind(author_id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
