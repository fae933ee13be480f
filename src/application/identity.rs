//! Resolves the authenticated username supplied by the fronting proxy.

use std::sync::Arc;

use tracing::debug;

use crate::application::repos::{RepoError, UsersRepo};
use crate::domain::entities::UserRecord;

#[derive(Clone)]
pub struct IdentityService {
    users: Arc<dyn UsersRepo>,
}

impl IdentityService {
    pub fn new(users: Arc<dyn UsersRepo>) -> Self {
        Self { users }
    }

    /// Look up the viewer; unknown or blank usernames are treated as anonymous.
    pub async fn resolve(&self, username: Option<&str>) -> Result<Option<UserRecord>, RepoError> {
        let Some(username) = username.map(str::trim).filter(|name| !name.is_empty()) else {
            return Ok(None);
        };

        let user = self.users.find_by_username(username).await?;
        if user.is_none() {
            debug!(username, "identity header names an unknown user");
        }
        Ok(user)
    }
}
