use async_trait::async_trait;
use uuid::Uuid;

use crate::application::pagination::PageWindow;
use crate::application::repos::{
    CreatePostParams, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::PostRecord;

use super::{PostgresRepositories, map_sqlx_error, rows::PostRow};

impl PostgresRepositories {
    async fn count_posts(&self, sql: &str, bind: Option<Uuid>) -> Result<u64, RepoError> {
        let mut query = sqlx::query_scalar::<_, i64>(sql);
        if let Some(id) = bind {
            query = query.bind(id);
        }
        let count = query
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::convert_count(count)
    }

    /// Run the shared post projection, filtered on `column = id` when given.
    async fn list_posts_where(
        &self,
        filter: Option<(&'static str, Uuid)>,
        window: PageWindow,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let mut qb = Self::post_query();
        if let Some((column, id)) = filter {
            qb.push(" WHERE ");
            qb.push(column);
            qb.push(" = ");
            qb.push_bind(id);
        }
        Self::push_post_order(&mut qb);
        Self::push_window(&mut qb, window)?;

        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn count_all(&self) -> Result<u64, RepoError> {
        self.count_posts("SELECT COUNT(*) FROM posts", None).await
    }

    async fn list_all(&self, window: PageWindow) -> Result<Vec<PostRecord>, RepoError> {
        self.list_posts_where(None, window).await
    }

    async fn count_by_group(&self, group_id: Uuid) -> Result<u64, RepoError> {
        self.count_posts(
            "SELECT COUNT(*) FROM posts WHERE group_id = $1",
            Some(group_id),
        )
        .await
    }

    async fn list_by_group(
        &self,
        group_id: Uuid,
        window: PageWindow,
    ) -> Result<Vec<PostRecord>, RepoError> {
        self.list_posts_where(Some(("p.group_id", group_id)), window)
            .await
    }

    async fn count_by_author(&self, author_id: Uuid) -> Result<u64, RepoError> {
        self.count_posts(
            "SELECT COUNT(*) FROM posts WHERE author_id = $1",
            Some(author_id),
        )
        .await
    }

    async fn list_by_author(
        &self,
        author_id: Uuid,
        window: PageWindow,
    ) -> Result<Vec<PostRecord>, RepoError> {
        self.list_posts_where(Some(("p.author_id", author_id)), window)
            .await
    }

    async fn count_by_authors(&self, author_ids: &[Uuid]) -> Result<u64, RepoError> {
        if author_ids.is_empty() {
            return Ok(0);
        }
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM posts WHERE author_id = ANY($1)",
        )
        .bind(author_ids)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Self::convert_count(count)
    }

    async fn list_by_authors(
        &self,
        author_ids: &[Uuid],
        window: PageWindow,
    ) -> Result<Vec<PostRecord>, RepoError> {
        if author_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = Self::post_query();
        qb.push(" WHERE p.author_id = ANY(");
        qb.push_bind(author_ids.to_vec());
        qb.push(")");
        Self::push_post_order(&mut qb);
        Self::push_window(&mut qb, window)?;

        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let mut qb = Self::post_query();
        qb.push(" WHERE p.id = ");
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
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO posts (id, text, image, author_id, group_id) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(&params.text)
        .bind(params.image.as_deref())
        .bind(params.author_id)
        .bind(params.group_id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        PostsRepo::find_by_id(self, id)
            .await?
            .ok_or(RepoError::NotFound)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let result = sqlx::query(
            "UPDATE posts SET text = $2, image = $3, group_id = $4 WHERE id = $1",
        )
        .bind(params.id)
        .bind(&params.text)
        .bind(params.image.as_deref())
        .bind(params.group_id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        PostsRepo::find_by_id(self, params.id)
            .await?
            .ok_or(RepoError::NotFound)
    }
}
