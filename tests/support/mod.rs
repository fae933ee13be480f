#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{Router, body::Body, http::HeaderName};
use http_body_util::BodyExt;
use time::{Duration, OffsetDateTime, macros::datetime};
use uuid::Uuid;

use plaza::application::feed::FeedService;
use plaza::application::follow::FollowService;
use plaza::application::identity::IdentityService;
use plaza::application::pagination::{PageWindow, Paginator};
use plaza::application::posts::PostService;
use plaza::application::repos::{
    CommentsRepo, CreateCommentParams, CreateGroupParams, CreatePostParams, FollowsRepo,
    GroupsRepo, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams, UsersRepo,
};
use plaza::cache::HomeCacheState;
use plaza::domain::entities::{CommentRecord, GroupRecord, GroupRef, PostRecord, UserRecord};
use plaza::infra::http::{self, AuthConfig, HealthCheck, HttpState};

pub const USER_HEADER: &str = "x-authenticated-user";
pub const LOGIN_URL: &str = "/auth/login/";

/// Creation instants start here and move forward one minute per seeded post.
pub const EPOCH: OffsetDateTime = datetime!(2024-01-01 00:00 UTC);

#[derive(Default)]
struct Content {
    users: Vec<UserRecord>,
    groups: Vec<GroupRecord>,
    posts: Vec<PostRecord>,
    comments: Vec<CommentRecord>,
    follows: HashSet<(Uuid, Uuid)>,
}

/// In-memory content store implementing every repository trait.
#[derive(Default)]
pub struct InMemoryContent {
    state: Mutex<Content>,
}

impl InMemoryContent {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed_user(&self, username: &str) -> UserRecord {
        let user = UserRecord {
            id: Uuid::new_v4(),
            username: username.to_string(),
        };
        self.state.lock().unwrap().users.push(user.clone());
        user
    }

    pub fn add_group(&self, title: &str, slug: &str, description: &str) -> GroupRecord {
        let group = GroupRecord {
            id: Uuid::new_v4(),
            title: title.to_string(),
            slug: slug.to_string(),
            description: description.to_string(),
        };
        self.state.lock().unwrap().groups.push(group.clone());
        group
    }

    pub fn add_post(
        &self,
        author: &UserRecord,
        text: &str,
        group: Option<&GroupRecord>,
        created_at: OffsetDateTime,
    ) -> PostRecord {
        let post = PostRecord {
            id: Uuid::new_v4(),
            text: text.to_string(),
            image: None,
            created_at,
            author: author.clone(),
            group: group.map(GroupRef::from),
        };
        self.state.lock().unwrap().posts.push(post.clone());
        post
    }

    /// Seed `count` posts by `author`, one minute apart starting at `start`.
    pub fn add_posts(
        &self,
        author: &UserRecord,
        count: usize,
        start: OffsetDateTime,
    ) -> Vec<PostRecord> {
        (0..count)
            .map(|index| {
                let minutes = i64::try_from(index).unwrap();
                self.add_post(
                    author,
                    &format!("{} post #{index}", author.username),
                    None,
                    start + Duration::minutes(minutes),
                )
            })
            .collect()
    }

    pub fn remove_post(&self, id: Uuid) {
        let mut state = self.state.lock().unwrap();
        state.posts.retain(|post| post.id != id);
        state.comments.retain(|comment| comment.post_id != id);
    }

    pub fn posts(&self) -> Vec<PostRecord> {
        self.state.lock().unwrap().posts.clone()
    }

    pub fn follow_edges(&self) -> usize {
        self.state.lock().unwrap().follows.len()
    }

    fn newest_first(&self, filter: impl Fn(&PostRecord) -> bool) -> Vec<PostRecord> {
        let state = self.state.lock().unwrap();
        let mut posts: Vec<PostRecord> =
            state.posts.iter().filter(|post| filter(post)).cloned().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        posts
    }

    fn windowed(
        &self,
        filter: impl Fn(&PostRecord) -> bool,
        window: PageWindow,
    ) -> Vec<PostRecord> {
        self.newest_first(filter)
            .into_iter()
            .skip(window.offset as usize)
            .take(window.limit as usize)
            .collect()
    }

    fn count(&self, filter: impl Fn(&PostRecord) -> bool) -> u64 {
        self.newest_first(filter).len() as u64
    }

    fn group_ref(&self, id: Option<Uuid>) -> Result<Option<GroupRef>, RepoError> {
        let Some(id) = id else {
            return Ok(None);
        };
        let state = self.state.lock().unwrap();
        state
            .groups
            .iter()
            .find(|group| group.id == id)
            .map(|group| Some(GroupRef::from(group)))
            .ok_or_else(|| RepoError::Integrity {
                message: "posts_group_id_fkey".to_string(),
            })
    }
}

#[async_trait]
impl UsersRepo for InMemoryContent {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }
}

#[async_trait]
impl GroupsRepo for InMemoryContent {
    async fn list_groups(&self) -> Result<Vec<GroupRecord>, RepoError> {
        let mut groups = self.state.lock().unwrap().groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(groups)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<GroupRecord>, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state.groups.iter().find(|group| group.id == id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state.groups.iter().find(|group| group.slug == slug).cloned())
    }

    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError> {
        let mut state = self.state.lock().unwrap();
        if state.groups.iter().any(|group| group.slug == params.slug) {
            return Err(RepoError::Duplicate {
                constraint: "post_groups_slug_key".to_string(),
            });
        }
        let group = GroupRecord {
            id: Uuid::new_v4(),
            title: params.title,
            slug: params.slug,
            description: params.description,
        };
        state.groups.push(group.clone());
        Ok(group)
    }
}

#[async_trait]
impl PostsRepo for InMemoryContent {
    async fn count_all(&self) -> Result<u64, RepoError> {
        Ok(self.count(|_| true))
    }

    async fn list_all(&self, window: PageWindow) -> Result<Vec<PostRecord>, RepoError> {
        Ok(self.windowed(|_| true, window))
    }

    async fn count_by_group(&self, group_id: Uuid) -> Result<u64, RepoError> {
        Ok(self.count(|post| post.group.as_ref().is_some_and(|group| group.id == group_id)))
    }

    async fn list_by_group(
        &self,
        group_id: Uuid,
        window: PageWindow,
    ) -> Result<Vec<PostRecord>, RepoError> {
        Ok(self.windowed(
            |post| post.group.as_ref().is_some_and(|group| group.id == group_id),
            window,
        ))
    }

    async fn count_by_author(&self, author_id: Uuid) -> Result<u64, RepoError> {
        Ok(self.count(|post| post.author.id == author_id))
    }

    async fn list_by_author(
        &self,
        author_id: Uuid,
        window: PageWindow,
    ) -> Result<Vec<PostRecord>, RepoError> {
        Ok(self.windowed(|post| post.author.id == author_id, window))
    }

    async fn count_by_authors(&self, author_ids: &[Uuid]) -> Result<u64, RepoError> {
        Ok(self.count(|post| author_ids.contains(&post.author.id)))
    }

    async fn list_by_authors(
        &self,
        author_ids: &[Uuid],
        window: PageWindow,
    ) -> Result<Vec<PostRecord>, RepoError> {
        Ok(self.windowed(|post| author_ids.contains(&post.author.id), window))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state.posts.iter().find(|post| post.id == id).cloned())
    }
}

#[async_trait]
impl PostsWriteRepo for InMemoryContent {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let group = self.group_ref(params.group_id)?;
        let mut state = self.state.lock().unwrap();
        let author = state
            .users
            .iter()
            .find(|user| user.id == params.author_id)
            .cloned()
            .ok_or_else(|| RepoError::Integrity {
                message: "posts_author_id_fkey".to_string(),
            })?;
        let post = PostRecord {
            id: Uuid::new_v4(),
            text: params.text,
            image: params.image,
            created_at: OffsetDateTime::now_utc(),
            author,
            group,
        };
        state.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let group = self.group_ref(params.group_id)?;
        let mut state = self.state.lock().unwrap();
        let post = state
            .posts
            .iter_mut()
            .find(|post| post.id == params.id)
            .ok_or(RepoError::NotFound)?;
        post.text = params.text;
        post.image = params.image;
        post.group = group;
        Ok(post.clone())
    }
}

#[async_trait]
impl CommentsRepo for InMemoryContent {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError> {
        let state = self.state.lock().unwrap();
        let mut comments: Vec<CommentRecord> = state
            .comments
            .iter()
            .filter(|comment| comment.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(comments)
    }

    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let mut state = self.state.lock().unwrap();
        let author = state
            .users
            .iter()
            .find(|user| user.id == params.author_id)
            .cloned()
            .ok_or(RepoError::NotFound)?;
        let comment = CommentRecord {
            id: Uuid::new_v4(),
            post_id: params.post_id,
            author,
            text: params.text,
            created_at: OffsetDateTime::now_utc(),
        };
        state.comments.push(comment.clone());
        Ok(comment)
    }
}

#[async_trait]
impl FollowsRepo for InMemoryContent {
    async fn list_authors_followed_by(&self, user_id: Uuid) -> Result<HashSet<Uuid>, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .follows
            .iter()
            .filter(|(user, _)| *user == user_id)
            .map(|(_, author)| *author)
            .collect())
    }

    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        Ok(self.state.lock().unwrap().follows.contains(&(user_id, author_id)))
    }

    async fn count_followers(&self, author_id: Uuid) -> Result<u64, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .follows
            .iter()
            .filter(|(_, author)| *author == author_id)
            .count() as u64)
    }

    async fn create_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        if user_id == author_id {
            return Err(RepoError::Integrity {
                message: "follows_no_self_follow".to_string(),
            });
        }
        Ok(self.state.lock().unwrap().follows.insert((user_id, author_id)))
    }

    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        Ok(self.state.lock().unwrap().follows.remove(&(user_id, author_id)))
    }
}

/// Health probe with a fixed answer.
pub struct StaticHealth(pub bool);

#[async_trait]
impl HealthCheck for StaticHealth {
    async fn check(&self) -> Result<(), RepoError> {
        if self.0 {
            Ok(())
        } else {
            Err(RepoError::Timeout)
        }
    }
}

pub fn feed_service(content: &Arc<InMemoryContent>) -> FeedService {
    FeedService::new(
        content.clone(),
        content.clone(),
        content.clone(),
        content.clone(),
        Paginator::default(),
    )
}

pub fn follow_service(content: &Arc<InMemoryContent>) -> FollowService {
    FollowService::new(content.clone(), content.clone())
}

pub fn post_service(content: &Arc<InMemoryContent>) -> PostService {
    PostService::new(
        content.clone(),
        content.clone(),
        content.clone(),
        content.clone(),
    )
}

pub fn http_state(content: &Arc<InMemoryContent>, home_cache: Option<HomeCacheState>) -> HttpState {
    HttpState {
        feed: Arc::new(feed_service(content)),
        follow: Arc::new(follow_service(content)),
        posts: Arc::new(post_service(content)),
        identity: Arc::new(IdentityService::new(content.clone())),
        auth: Arc::new(AuthConfig {
            user_header: HeaderName::from_static(USER_HEADER),
            login_url: LOGIN_URL.to_string(),
        }),
        health: Arc::new(StaticHealth(true)),
        home_cache,
    }
}

pub fn router(content: &Arc<InMemoryContent>, home_cache: Option<HomeCacheState>) -> Router {
    http::build_router(http_state(content, home_cache))
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = body.collect().await.expect("collect body").to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}
