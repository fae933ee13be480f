mod auth;
mod authoring;
mod middleware;
mod public;

pub use auth::{AuthConfig, MaybeViewer, RequireViewer};
pub use middleware::RequestContext;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::application::error::ErrorReport;
use crate::application::{
    feed::FeedService, follow::FollowService, identity::IdentityService, posts::PostService,
    repos::RepoError,
};
use crate::cache::{HomeCacheState, home_cache_layer};
use crate::infra::db::{PostgresRepositories, map_sqlx_error};

/// Liveness probe for the content store.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self) -> Result<(), RepoError>;
}

#[async_trait]
impl HealthCheck for PostgresRepositories {
    async fn check(&self) -> Result<(), RepoError> {
        self.health_check().await.map_err(map_sqlx_error)
    }
}

#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
    pub follow: Arc<FollowService>,
    pub posts: Arc<PostService>,
    pub identity: Arc<IdentityService>,
    pub auth: Arc<AuthConfig>,
    pub health: Arc<dyn HealthCheck>,
    pub home_cache: Option<HomeCacheState>,
}

pub fn build_router(state: HttpState) -> Router {
    // Only the home timeline is cached; its output must not depend on the viewer.
    let home = Router::new().route("/", get(public::index));
    let home = match state.home_cache.clone() {
        Some(cache) => home.layer(from_fn_with_state(cache, home_cache_layer)),
        None => home,
    };

    let pages = Router::new()
        .route("/group/{slug}", get(public::group_posts))
        .route("/profile/{username}", get(public::profile))
        .route("/posts/{id}", get(public::post_detail))
        .route("/follow", get(public::follow_index))
        .route(
            "/create",
            get(authoring::create_form).post(authoring::create_submit),
        )
        .route(
            "/posts/{id}/edit",
            get(authoring::edit_form).post(authoring::edit_submit),
        )
        .route("/posts/{id}/comment", post(authoring::add_comment))
        .route("/profile/{username}/follow", get(authoring::profile_follow))
        .route(
            "/profile/{username}/unfollow",
            get(authoring::profile_unfollow),
        )
        .route("/_health/db", get(public::db_health))
        .fallback(public::not_found);

    home.merge(pages)
        .with_state(state)
        .layer(from_fn(middleware::log_responses))
        .layer(from_fn(middleware::set_request_context))
}

fn db_health_response(result: Result<(), RepoError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
