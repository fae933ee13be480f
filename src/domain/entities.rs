//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

/// Identity reference owned by the external user directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRecord {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// The part of a group a post listing needs to link back to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRef {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
}

impl From<&GroupRecord> for GroupRef {
    fn from(group: &GroupRecord) -> Self {
        Self {
            id: group.id,
            title: group.title.clone(),
            slug: group.slug.clone(),
        }
    }
}

/// A post joined with its author and (optional) group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostRecord {
    pub id: Uuid,
    pub text: String,
    pub image: Option<String>,
    pub created_at: OffsetDateTime,
    pub author: UserRecord,
    pub group: Option<GroupRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentRecord {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author: UserRecord,
    pub text: String,
    pub created_at: OffsetDateTime,
}
