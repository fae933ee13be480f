//! Post timelines: the public home page, group and profile listings, and the
//! personal feed built from the follow graph.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::application::pagination::{Page, Paginator};
use crate::application::repos::{FollowsRepo, GroupsRepo, PostsRepo, RepoError, UsersRepo};
use crate::domain::entities::{GroupRecord, PostRecord, UserRecord};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("unknown group `{0}`")]
    UnknownGroup(String),
    #[error("unknown author `{0}`")]
    UnknownAuthor(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct GroupTimeline {
    pub group: GroupRecord,
    pub posts: Page<PostRecord>,
}

#[derive(Debug, Clone)]
pub struct ProfileTimeline {
    pub author: UserRecord,
    pub posts: Page<PostRecord>,
    pub posts_count: u64,
    pub followers_count: u64,
    /// `None` for anonymous viewers and for authors viewing themselves.
    pub following: Option<bool>,
}

#[derive(Clone)]
pub struct FeedService {
    users: Arc<dyn UsersRepo>,
    groups: Arc<dyn GroupsRepo>,
    posts: Arc<dyn PostsRepo>,
    follows: Arc<dyn FollowsRepo>,
    paginator: Paginator,
}

impl FeedService {
    pub fn new(
        users: Arc<dyn UsersRepo>,
        groups: Arc<dyn GroupsRepo>,
        posts: Arc<dyn PostsRepo>,
        follows: Arc<dyn FollowsRepo>,
        paginator: Paginator,
    ) -> Self {
        Self {
            users,
            groups,
            posts,
            follows,
            paginator,
        }
    }

    /// Every post on the site.
    pub async fn home(&self, page: Option<&str>) -> Result<Page<PostRecord>, FeedError> {
        let total = self.posts.count_all().await?;
        let window = self.paginator.window(total, page);
        let items = self.posts.list_all(window).await?;
        Ok(self.paginator.page(window, total, items))
    }

    pub async fn group(&self, slug: &str, page: Option<&str>) -> Result<GroupTimeline, FeedError> {
        let group = self
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| FeedError::UnknownGroup(slug.to_string()))?;

        let total = self.posts.count_by_group(group.id).await?;
        let window = self.paginator.window(total, page);
        let items = self.posts.list_by_group(group.id, window).await?;

        Ok(GroupTimeline {
            group,
            posts: self.paginator.page(window, total, items),
        })
    }

    pub async fn profile(
        &self,
        username: &str,
        viewer: Option<&UserRecord>,
        page: Option<&str>,
    ) -> Result<ProfileTimeline, FeedError> {
        let author = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| FeedError::UnknownAuthor(username.to_string()))?;

        let total = self.posts.count_by_author(author.id).await?;
        let window = self.paginator.window(total, page);
        let items = self.posts.list_by_author(author.id, window).await?;
        let followers_count = self.follows.count_followers(author.id).await?;

        let following = match viewer {
            Some(viewer) if viewer.id != author.id => {
                Some(self.follows.is_following(viewer.id, author.id).await?)
            }
            _ => None,
        };

        Ok(ProfileTimeline {
            author,
            posts: self.paginator.page(window, total, items),
            posts_count: total,
            followers_count,
            following,
        })
    }

    /// Posts written by anyone `viewer` follows, newest first.
    ///
    /// Always reads the follow graph and the post store live; following or
    /// unfollowing someone shows up on the very next request.
    pub async fn following(
        &self,
        viewer: &UserRecord,
        page: Option<&str>,
    ) -> Result<Page<PostRecord>, FeedError> {
        let authors = self.follows.list_authors_followed_by(viewer.id).await?;
        if authors.is_empty() {
            debug!(user = %viewer.username, "follow feed requested with no followed authors");
            return Ok(Page::empty(self.paginator.per_page()));
        }

        let mut author_ids: Vec<_> = authors.into_iter().collect();
        author_ids.sort_unstable();

        let total = self.posts.count_by_authors(&author_ids).await?;
        let window = self.paginator.window(total, page);
        let items = self.posts.list_by_authors(&author_ids, window).await?;

        debug!(
            user = %viewer.username,
            authors = author_ids.len(),
            total,
            page = window.number,
            "built follow feed"
        );

        Ok(self.paginator.page(window, total, items))
    }
}
