use std::{process, sync::Arc};

use piazza::{
    application::{
        accounts::AccountService,
        authoring::AuthoringService,
        error::AppError,
        feed::FeedService,
        follows::FollowService,
        groups::{GroupProvisionError, provision_group},
        repos::{CommentsRepo, FollowsRepo, GroupsRepo, PostsRepo, PostsWriteRepo, SessionsRepo, UsersRepo},
    },
    cache::{PageCache, PageCacheConfig},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
        uploads::UploadStorage,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
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
        config::Command::Groups(args) => run_groups(settings, args).await,
    }
}

async fn run_groups(settings: config::Settings, args: config::GroupsArgs) -> Result<(), AppError> {
    match args.command {
        config::GroupsCommand::Add(add) => {
            let repositories = init_repositories(&settings).await?;
            let groups: Arc<dyn GroupsRepo> = repositories;

            let group = provision_group(&groups, &add.title, &add.description)
                .await
                .map_err(|err| match err {
                    GroupProvisionError::Slug(err) => AppError::validation(err.to_string()),
                    GroupProvisionError::Repo(err) => AppError::unexpected(err.to_string()),
                })?;

            info!(
                target = "piazza::groups",
                slug = %group.slug,
                "group created"
            );
            Ok(())
        }
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let state = build_http_state(repositories, &settings)?;
    serve_http(&settings, state).await
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

    let pool =
        PostgresRepositories::connect(database_url, settings.database.max_connections.get())
            .await
            .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_http_state(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<HttpState, AppError> {
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
    let groups_repo: Arc<dyn GroupsRepo> = repositories.clone();
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();
    let comments_repo: Arc<dyn CommentsRepo> = repositories.clone();
    let follows_repo: Arc<dyn FollowsRepo> = repositories.clone();
    let sessions_repo: Arc<dyn SessionsRepo> = repositories.clone();

    let page_cache = PageCache::from_config(PageCacheConfig::from(&settings.cache));

    let feed = Arc::new(FeedService::new(
        posts_repo.clone(),
        groups_repo.clone(),
        users_repo.clone(),
        comments_repo.clone(),
        follows_repo.clone(),
        settings.feed.page_size.get(),
    ));

    let authoring = Arc::new(
        AuthoringService::new(
            posts_repo,
            posts_write_repo,
            groups_repo.clone(),
            comments_repo,
        )
        .with_page_cache(page_cache.clone()),
    );

    let follows = Arc::new(FollowService::new(users_repo.clone(), follows_repo));
    let accounts = Arc::new(AccountService::new(
        users_repo,
        sessions_repo,
        settings.sessions.ttl,
    ));

    let uploads = Arc::new(
        UploadStorage::new(
            settings.uploads.directory.clone(),
            settings.uploads.max_request_bytes.get(),
        )
        .map_err(|err| AppError::from(InfraError::Io(err)))?,
    );

    Ok(HttpState {
        feed,
        authoring,
        follows,
        accounts,
        groups: groups_repo,
        uploads,
        db: repositories,
        page_cache,
        upload_limit_bytes: usize::try_from(settings.uploads.max_request_bytes.get())
            .unwrap_or(usize::MAX),
    })
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.public_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "piazza::server",
        addr = %settings.server.public_addr,
        "listening"
    );

    let drain = settings.server.graceful_shutdown;
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            info!(
                target = "piazza::server",
                drain_secs = drain.as_secs(),
                "shutdown signal received, draining connections"
            );
        })
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
