use std::{process, sync::Arc};

use plaza::{
    application::{
        error::AppError,
        feed::FeedService,
        follow::FollowService,
        groups::{CreateGroupCommand, GroupService},
        identity::IdentityService,
        pagination::Paginator,
        posts::PostService,
        repos::{CommentsRepo, FollowsRepo, GroupsRepo, PostsRepo, PostsWriteRepo, UsersRepo},
    },
    cache::{CacheConfig, HomeCacheState, MemoryPageStore},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, AuthConfig, HttpState},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
        config::Command::CreateGroup(args) => run_create_group(settings, args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let state = build_http_state(repositories, &settings)?;
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::bind(settings.server.addr, err)))?;

    info!(
        target = "plaza::serve",
        addr = %settings.server.addr,
        cache = settings.cache.enabled,
        "Listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    info!(target = "plaza::serve", "Server stopped");
    Ok(())
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    init_repositories(&settings).await?;
    info!(target = "plaza::migrate", "Migrations applied");
    Ok(())
}

async fn run_create_group(
    settings: config::Settings,
    args: config::CreateGroupArgs,
) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let groups_repo: Arc<dyn GroupsRepo> = repositories;
    let service = GroupService::new(groups_repo);

    let group = service
        .create_group(CreateGroupCommand {
            title: args.title,
            description: args.description,
            slug: args.slug,
        })
        .await?;

    info!(
        target = "plaza::create_group",
        id = %group.id,
        slug = %group.slug,
        "Group created"
    );
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::migration(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_http_state(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<HttpState, AppError> {
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();
    let groups_repo: Arc<dyn GroupsRepo> = repositories.clone();
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
    let comments_repo: Arc<dyn CommentsRepo> = repositories.clone();
    let follows_repo: Arc<dyn FollowsRepo> = repositories.clone();

    let feed = Arc::new(FeedService::new(
        users_repo.clone(),
        groups_repo.clone(),
        posts_repo.clone(),
        follows_repo.clone(),
        Paginator::new(settings.feed.page_size),
    ));
    let follow = Arc::new(FollowService::new(users_repo.clone(), follows_repo));
    let posts = Arc::new(PostService::new(
        posts_repo,
        posts_write_repo,
        comments_repo,
        groups_repo,
    ));
    let identity = Arc::new(IdentityService::new(users_repo));

    let auth = AuthConfig::from_settings(&settings.auth)
        .map_err(|err| AppError::from(InfraError::configuration(err.to_string())))?;

    let cache_config = CacheConfig::from(&settings.cache);
    let home_cache = cache_config.enabled.then(|| {
        let store = Arc::new(MemoryPageStore::new(&cache_config));
        HomeCacheState::new(cache_config.clone(), store)
    });

    Ok(HttpState {
        feed,
        follow,
        posts,
        identity,
        auth: Arc::new(auth),
        health: repositories,
        home_cache,
    })
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!(target = "plaza::serve", "Shutdown requested");
}
