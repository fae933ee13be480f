//! Viewer extraction from the identity header set by the fronting proxy.

use axum::{
    extract::FromRequestParts,
    http::{HeaderName, header::InvalidHeaderName, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use url::form_urlencoded;

use crate::application::error::HttpError;
use crate::config::AuthSettings;
use crate::domain::entities::UserRecord;

use super::HttpState;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub user_header: HeaderName,
    pub login_url: String,
}

impl AuthConfig {
    pub fn from_settings(settings: &AuthSettings) -> Result<Self, InvalidHeaderName> {
        Ok(Self {
            user_header: HeaderName::try_from(settings.user_header.as_str())?,
            login_url: settings.login_url.clone(),
        })
    }

    /// Login URL carrying `next` so the caller returns here afterwards.
    pub fn login_redirect_target(&self, next: &str) -> String {
        let encoded: String = form_urlencoded::byte_serialize(next.as_bytes()).collect();
        let separator = if self.login_url.contains('?') { '&' } else { '?' };
        format!("{}{separator}next={encoded}", self.login_url)
    }
}

/// The authenticated viewer, if any.
pub struct MaybeViewer(pub Option<UserRecord>);

/// An authenticated viewer; anonymous callers are redirected to the login page.
pub struct RequireViewer(pub UserRecord);

impl FromRequestParts<HttpState> for MaybeViewer {
    type Rejection = HttpError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &HttpState,
    ) -> Result<Self, Self::Rejection> {
        let username = parts
            .headers
            .get(&state.auth.user_header)
            .and_then(|value| value.to_str().ok());
        let viewer = state.identity.resolve(username).await?;
        Ok(Self(viewer))
    }
}

impl FromRequestParts<HttpState> for RequireViewer {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &HttpState,
    ) -> Result<Self, Self::Rejection> {
        match MaybeViewer::from_request_parts(parts, state).await {
            Ok(MaybeViewer(Some(viewer))) => Ok(Self(viewer)),
            Ok(MaybeViewer(None)) => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map(|value| value.as_str())
                    .unwrap_or("/");
                let target = state.auth.login_redirect_target(next);
                Err(Redirect::to(&target).into_response())
            }
            Err(err) => Err(err.into_response()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(login_url: &str) -> AuthConfig {
        AuthConfig {
            user_header: HeaderName::from_static("x-authenticated-user"),
            login_url: login_url.to_string(),
        }
    }

    #[test]
    fn next_parameter_is_url_encoded() {
        let target = config("/auth/login/").login_redirect_target("/follow?page=2");
        assert_eq!(target, "/auth/login/?next=%2Ffollow%3Fpage%3D2");
    }

    #[test]
    fn existing_query_is_extended() {
        let target = config("/login?sso=1").login_redirect_target("/create");
        assert_eq!(target, "/login?sso=1&next=%2Fcreate");
    }
}
