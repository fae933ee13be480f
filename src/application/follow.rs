//! Follow and unfollow authors.
//!
//! Both operations are idempotent: repeating them never creates a second
//! edge or fails because the edge is already gone. Following yourself is
//! accepted and ignored.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::repos::{FollowsRepo, RepoError, UsersRepo};
use crate::domain::entities::UserRecord;

#[derive(Debug, Error)]
pub enum FollowError {
    #[error("unknown author `{0}`")]
    UnknownAuthor(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Created,
    AlreadyFollowing,
    SelfFollowIgnored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnfollowOutcome {
    Removed,
    NotFollowing,
}

#[derive(Clone)]
pub struct FollowService {
    users: Arc<dyn UsersRepo>,
    follows: Arc<dyn FollowsRepo>,
}

impl FollowService {
    pub fn new(users: Arc<dyn UsersRepo>, follows: Arc<dyn FollowsRepo>) -> Self {
        Self { users, follows }
    }

    pub async fn follow(
        &self,
        viewer: &UserRecord,
        username: &str,
    ) -> Result<FollowOutcome, FollowError> {
        let author = self.resolve_author(username).await?;
        self.follow_author(viewer, &author).await
    }

    pub async fn unfollow(
        &self,
        viewer: &UserRecord,
        username: &str,
    ) -> Result<UnfollowOutcome, FollowError> {
        let author = self.resolve_author(username).await?;
        self.unfollow_author(viewer, &author).await
    }

    pub async fn follow_author(
        &self,
        viewer: &UserRecord,
        author: &UserRecord,
    ) -> Result<FollowOutcome, FollowError> {
        if viewer.id == author.id {
            return Ok(FollowOutcome::SelfFollowIgnored);
        }

        let created = self.follows.create_follow(viewer.id, author.id).await?;
        if created {
            info!(
                user = %viewer.username,
                author = %author.username,
                "follow edge created"
            );
            Ok(FollowOutcome::Created)
        } else {
            Ok(FollowOutcome::AlreadyFollowing)
        }
    }

    pub async fn unfollow_author(
        &self,
        viewer: &UserRecord,
        author: &UserRecord,
    ) -> Result<UnfollowOutcome, FollowError> {
        let removed = self.follows.delete_follow(viewer.id, author.id).await?;
        if removed {
            info!(
                user = %viewer.username,
                author = %author.username,
                "follow edge removed"
            );
            Ok(UnfollowOutcome::Removed)
        } else {
            Ok(UnfollowOutcome::NotFollowing)
        }
    }

    async fn resolve_author(&self, username: &str) -> Result<UserRecord, FollowError> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| FollowError::UnknownAuthor(username.to_string()))
    }
}
