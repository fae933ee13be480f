use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::repos::{CreateGroupParams, GroupsRepo, RepoError};
use crate::domain::entities::GroupRecord;
use crate::domain::error::DomainError;
use crate::domain::slug::{self, MAX_GROUP_SLUG_LEN, SlugError};

pub const MAX_GROUP_TITLE_LEN: usize = 200;

#[derive(Debug, Error)]
pub enum GroupError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("group slug could not be derived: {0}")]
    Slug(#[from] SlugError),
    #[error("a group with slug `{0}` already exists")]
    DuplicateSlug(String),
    #[error(transparent)]
    Repo(RepoError),
}

#[derive(Debug, Clone)]
pub struct CreateGroupCommand {
    pub title: String,
    pub description: String,
    /// Explicit slug; derived from the title when absent.
    pub slug: Option<String>,
}

#[derive(Clone)]
pub struct GroupService {
    groups: Arc<dyn GroupsRepo>,
}

impl GroupService {
    pub fn new(groups: Arc<dyn GroupsRepo>) -> Self {
        Self { groups }
    }

    pub async fn create_group(&self, command: CreateGroupCommand) -> Result<GroupRecord, GroupError> {
        let title = command.title.trim();
        if title.is_empty() {
            return Err(DomainError::validation("title", "this field is required").into());
        }
        if title.chars().count() > MAX_GROUP_TITLE_LEN {
            return Err(DomainError::validation(
                "title",
                format!("must be at most {MAX_GROUP_TITLE_LEN} characters"),
            )
            .into());
        }

        let slug = match command.slug.as_deref().map(str::trim) {
            Some(explicit) if !explicit.is_empty() => normalize_explicit_slug(explicit)?,
            _ => slug::derive_group_slug(title)?,
        };

        let group = self
            .groups
            .create_group(CreateGroupParams {
                title: title.to_string(),
                slug: slug.clone(),
                description: command.description.trim().to_string(),
            })
            .await
            .map_err(|err| match err {
                RepoError::Duplicate { .. } => GroupError::DuplicateSlug(slug),
                other => GroupError::Repo(other),
            })?;

        info!(group = %group.slug, title = %group.title, "group created");
        Ok(group)
    }
}

fn normalize_explicit_slug(raw: &str) -> Result<String, GroupError> {
    let valid = raw.chars().count() <= MAX_GROUP_SLUG_LEN
        && raw
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if !valid {
        return Err(DomainError::validation(
            "slug",
            format!(
                "use at most {MAX_GROUP_SLUG_LEN} lowercase latin letters, digits, hyphens or underscores"
            ),
        )
        .into());
    }
    Ok(raw.to_string())
}
