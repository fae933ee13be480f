//! Post authoring, the post detail view, and comments.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{
    CommentsRepo, CreateCommentParams, CreatePostParams, GroupsRepo, PostsRepo, PostsWriteRepo,
    RepoError, UpdatePostParams,
};
use crate::domain::entities::{CommentRecord, GroupRecord, PostRecord, UserRecord};
use crate::domain::error::DomainError;
use crate::domain::posts::{self, SUMMARY_CHARS};

/// A single rejected form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl From<DomainError> for FieldError {
    fn from(error: DomainError) -> Self {
        Self {
            field: error.field(),
            message: error.message().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    errors: Vec<FieldError>,
}

impl FormErrors {
    pub fn push(&mut self, error: impl Into<FieldError>) {
        self.errors.push(error.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    pub fn for_field(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }
}

impl std::fmt::Display for FormErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for error in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum PostError {
    #[error("invalid post form: {0}")]
    Validation(FormErrors),
    #[error("post not found")]
    NotFound,
    #[error("only the author may edit this post")]
    NotAuthor { post_id: Uuid },
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Raw post form input as submitted.
#[derive(Debug, Clone, Default)]
pub struct PostForm {
    pub text: String,
    /// Group id as text; blank means "no group".
    pub group: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: PostRecord,
    pub title: String,
    pub author_posts_count: u64,
    pub comments: Vec<CommentRecord>,
}

struct ValidatedPost {
    text: String,
    group_id: Option<Uuid>,
    image: Option<String>,
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    comments: Arc<dyn CommentsRepo>,
    groups: Arc<dyn GroupsRepo>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        comments: Arc<dyn CommentsRepo>,
        groups: Arc<dyn GroupsRepo>,
    ) -> Self {
        Self {
            posts,
            writer,
            comments,
            groups,
        }
    }

    pub async fn groups(&self) -> Result<Vec<GroupRecord>, PostError> {
        Ok(self.groups.list_groups().await?)
    }

    pub async fn detail(&self, id: Uuid) -> Result<PostDetail, PostError> {
        let post = self.find(id).await?;
        let comments = self.comments.list_for_post(post.id).await?;
        let author_posts_count = self.posts.count_by_author(post.author.id).await?;
        Ok(PostDetail {
            title: posts::detail_title(&post.text),
            post,
            author_posts_count,
            comments,
        })
    }

    pub async fn create_post(
        &self,
        author: &UserRecord,
        form: PostForm,
    ) -> Result<PostRecord, PostError> {
        let validated = self.validate(&form).await?;
        let post = self
            .writer
            .create_post(CreatePostParams {
                author_id: author.id,
                text: validated.text,
                group_id: validated.group_id,
                image: validated.image,
            })
            .await?;

        info!(
            post_id = %post.id,
            author = %author.username,
            summary = posts::truncate_chars(&post.text, SUMMARY_CHARS),
            "post created"
        );
        Ok(post)
    }

    /// Load a post for editing, refusing anyone but its author.
    pub async fn editable(&self, editor: &UserRecord, id: Uuid) -> Result<PostRecord, PostError> {
        let post = self.find(id).await?;
        if post.author.id != editor.id {
            return Err(PostError::NotAuthor { post_id: post.id });
        }
        Ok(post)
    }

    pub async fn update_post(
        &self,
        editor: &UserRecord,
        id: Uuid,
        form: PostForm,
    ) -> Result<PostRecord, PostError> {
        let existing = self.editable(editor, id).await?;
        let validated = self.validate(&form).await?;
        let post = self
            .writer
            .update_post(UpdatePostParams {
                id: existing.id,
                text: validated.text,
                group_id: validated.group_id,
                image: validated.image,
            })
            .await
            .map_err(|err| match err {
                RepoError::NotFound => PostError::NotFound,
                other => PostError::Repo(other),
            })?;

        info!(
            post_id = %post.id,
            author = %editor.username,
            summary = posts::truncate_chars(&post.text, SUMMARY_CHARS),
            "post updated"
        );
        Ok(post)
    }

    pub async fn add_comment(
        &self,
        author: &UserRecord,
        post_id: Uuid,
        text: &str,
    ) -> Result<CommentRecord, PostError> {
        let post = self.find(post_id).await?;
        let text = posts::validate_text("text", text).map_err(|err| {
            let mut errors = FormErrors::default();
            errors.push(err);
            PostError::Validation(errors)
        })?;

        let comment = self
            .comments
            .create_comment(CreateCommentParams {
                post_id: post.id,
                author_id: author.id,
                text,
            })
            .await?;

        info!(post_id = %post.id, author = %author.username, "comment added");
        Ok(comment)
    }

    async fn find(&self, id: Uuid) -> Result<PostRecord, PostError> {
        self.posts.find_by_id(id).await?.ok_or(PostError::NotFound)
    }

    async fn validate(&self, form: &PostForm) -> Result<ValidatedPost, PostError> {
        let mut errors = FormErrors::default();

        let text = posts::validate_text("text", &form.text)
            .map_err(|err| errors.push(err))
            .ok();

        let image = posts::validate_image_ref(form.image.as_deref())
            .map_err(|err| errors.push(err))
            .ok()
            .flatten();

        let requested_group = form
            .group
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty());
        let mut group_id = None;
        if let Some(raw) = requested_group {
            let known = match Uuid::parse_str(raw) {
                Ok(id) => self.groups.find_by_id(id).await?.map(|group| group.id),
                Err(_) => None,
            };
            if known.is_none() {
                errors.push(FieldError {
                    field: "group",
                    message: "select a valid group".to_string(),
                });
            }
            group_id = known;
        }

        match text {
            Some(text) if errors.is_empty() => Ok(ValidatedPost {
                text,
                group_id,
                image,
            }),
            _ => Err(PostError::Validation(errors)),
        }
    }
}
