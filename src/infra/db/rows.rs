use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{CommentRecord, GroupRecord, GroupRef, PostRecord, UserRecord};

#[derive(sqlx::FromRow)]
pub(crate) struct UserRow {
    pub(crate) id: Uuid,
    pub(crate) username: String,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct GroupRow {
    pub(crate) id: Uuid,
    pub(crate) title: String,
    pub(crate) slug: String,
    pub(crate) description: String,
}

impl From<GroupRow> for GroupRecord {
    fn from(row: GroupRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            description: row.description,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct PostRow {
    pub(crate) id: Uuid,
    pub(crate) text: String,
    pub(crate) image: Option<String>,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) author_id: Uuid,
    pub(crate) author_username: String,
    pub(crate) group_id: Option<Uuid>,
    pub(crate) group_title: Option<String>,
    pub(crate) group_slug: Option<String>,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        let group = match (row.group_id, row.group_title, row.group_slug) {
            (Some(id), Some(title), Some(slug)) => Some(GroupRef { id, title, slug }),
            _ => None,
        };

        Self {
            id: row.id,
            text: row.text,
            image: row.image,
            created_at: row.created_at,
            author: UserRecord {
                id: row.author_id,
                username: row.author_username,
            },
            group,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct CommentRow {
    pub(crate) id: Uuid,
    pub(crate) post_id: Uuid,
    pub(crate) text: String,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) author_id: Uuid,
    pub(crate) author_username: String,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            author: UserRecord {
                id: row.author_id,
                username: row.author_username,
            },
            text: row.text,
            created_at: row.created_at,
        }
    }
}
