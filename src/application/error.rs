use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    application::{
        feed::FeedError, follow::FollowError, groups::GroupError, posts::PostError,
        repos::RepoError,
    },
    domain::error::DomainError,
    infra::error::InfraError,
};

#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        let report = ErrorReport::from_message(source, status, detail);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        let report = ErrorReport::from_error(source, status, error);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    fn internal(source: &'static str, error: &dyn StdError) -> Self {
        Self::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
            error,
        )
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.public_message).into_response();
        self.report.attach(&mut response);
        response
    }
}

impl From<RepoError> for HttpError {
    fn from(error: RepoError) -> Self {
        let source = "infra::http::repo_error_to_http";
        let (status, public_message) = match &error {
            RepoError::NotFound => (StatusCode::NOT_FOUND, "Resource not found"),
            RepoError::Duplicate { .. } => (StatusCode::CONFLICT, "Duplicate record"),
            RepoError::Integrity { .. } => {
                (StatusCode::CONFLICT, "Integrity constraint violated")
            }
            RepoError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, "Invalid input"),
            RepoError::Timeout => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable",
            ),
            RepoError::Persistence(_) => return HttpError::internal(source, &error),
        };
        HttpError::from_error(source, status, public_message, &error)
    }
}

impl From<FeedError> for HttpError {
    fn from(error: FeedError) -> Self {
        let source = "infra::http::feed_error_to_http_error";
        match error {
            FeedError::UnknownGroup(slug) => HttpError::new(
                source,
                StatusCode::NOT_FOUND,
                "Unknown group",
                format!("Group `{slug}` does not exist"),
            ),
            FeedError::UnknownAuthor(username) => HttpError::new(
                source,
                StatusCode::NOT_FOUND,
                "Unknown author",
                format!("User `{username}` does not exist"),
            ),
            FeedError::Repo(err) => HttpError::from(err),
        }
    }
}

impl From<FollowError> for HttpError {
    fn from(error: FollowError) -> Self {
        match error {
            FollowError::UnknownAuthor(username) => HttpError::new(
                "infra::http::follow_error_to_http_error",
                StatusCode::NOT_FOUND,
                "Unknown author",
                format!("User `{username}` does not exist"),
            ),
            FollowError::Repo(err) => HttpError::from(err),
        }
    }
}

impl From<PostError> for HttpError {
    fn from(error: PostError) -> Self {
        let source = "infra::http::post_error_to_http_error";
        match error {
            PostError::Validation(errors) => HttpError::new(
                source,
                StatusCode::BAD_REQUEST,
                "Request could not be processed",
                errors.to_string(),
            ),
            PostError::NotFound => HttpError::new(
                source,
                StatusCode::NOT_FOUND,
                "Post not found",
                "Post id did not match any post",
            ),
            PostError::NotAuthor { post_id } => HttpError::new(
                source,
                StatusCode::FORBIDDEN,
                "Forbidden",
                format!("Post `{post_id}` belongs to another author"),
            ),
            PostError::Repo(err) => HttpError::from(err),
        }
    }
}

impl From<GroupError> for AppError {
    fn from(error: GroupError) -> Self {
        match error {
            GroupError::Domain(err) => AppError::Domain(err),
            GroupError::Slug(err) => AppError::validation(err.to_string()),
            GroupError::DuplicateSlug(slug) => {
                AppError::validation(format!("a group with slug `{slug}` already exists"))
            }
            GroupError::Repo(err) => AppError::Infra(InfraError::database(err.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("resource not found")]
    NotFound,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Domain(DomainError::Validation { .. }) | AppError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Infra(InfraError::Database { .. } | InfraError::Bind { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Infra(_) | AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn presentation_message(&self) -> &'static str {
        match self {
            AppError::NotFound => "Resource not found",
            AppError::Domain(DomainError::Validation { .. }) | AppError::Validation(_) => {
                "Request could not be processed"
            }
            AppError::Infra(InfraError::Database { .. }) => "Service temporarily unavailable",
            AppError::Infra(InfraError::Configuration { .. }) => "Service misconfigured",
            AppError::Infra(InfraError::Telemetry(_)) => "Logging subsystem could not start",
            AppError::Infra(InfraError::Migration { .. }) => "Database schema is out of date",
            AppError::Infra(InfraError::Bind { .. }) => "Listener could not start",
            AppError::Unexpected(_) => "Unexpected error occurred",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.presentation_message();
        let report = ErrorReport::from_error("application::error::AppError", status, &self);
        let mut response = (status, message).into_response();
        report.attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_group_maps_to_not_found() {
        let error = HttpError::from(FeedError::UnknownGroup("cats".into()));
        assert_eq!(error.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn repo_failures_are_internal_errors() {
        let error = HttpError::from(FollowError::Repo(RepoError::from_persistence("boom")));
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn report_collects_error_chain() {
        let error = FeedError::Repo(RepoError::Timeout);
        let report = ErrorReport::from_error("test", StatusCode::SERVICE_UNAVAILABLE, &error);
        assert_eq!(report.messages, vec!["database timeout".to_string()]);
    }

    #[test]
    fn non_author_edit_is_forbidden() {
        let error = HttpError::from(PostError::NotAuthor {
            post_id: uuid::Uuid::nil(),
        });
        assert_eq!(error.status(), StatusCode::FORBIDDEN);
    }
}
