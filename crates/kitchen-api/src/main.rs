//! Script kitchen API server entry point.

use std::sync::Arc;

use kitchen_api::config::AppConfig;
use kitchen_api::error::AppError;
use kitchen_api::feed::ChangeFeed;
use kitchen_api::identity::YamlRoleDirectory;
use kitchen_api::routes;
use kitchen_api::state::AppState;
use kitchen_api::telemetry;
use kitchen_core::clock::SystemClock;
use kitchen_curation::storage::HttpObjectStorage;
use kitchen_export::archive::ZipArchiveWriter;
use kitchen_export::fetch::HttpImageFetcher;
use kitchen_store::pg_event_repository::PgEventRepository;
use kitchen_store::pg_presence_repository::PgPresenceRepository;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    let _telemetry = telemetry::init(config.otlp_endpoint.as_deref())?;

    tracing::info!("Starting script kitchen API server");

    // Create database connection pool and bring the schema up to date.
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    kitchen_store::MIGRATOR.run(&pool).await?;

    let object_storage = HttpObjectStorage::new(
        config.storage_signer_url.clone(),
        Some(config.storage_public_url.clone()),
    )
    .map_err(|e| AppError::Config(e.to_string()))?;
    let image_fetcher = HttpImageFetcher::new().map_err(|e| AppError::Config(e.to_string()))?;
    let role_directory = match &config.roles_file {
        Some(path) => YamlRoleDirectory::load(path)?,
        None => YamlRoleDirectory::empty(),
    };

    let presence = Arc::new(PgPresenceRepository::new(pool.clone()));

    let app_state = AppState {
        clock: Arc::new(SystemClock),
        event_repository: Arc::new(PgEventRepository::new(pool)),
        presence_repository: presence.clone(),
        object_storage: Arc::new(object_storage),
        image_fetcher: Arc::new(image_fetcher),
        archive_writer: Arc::new(ZipArchiveWriter),
        role_directory: Arc::new(role_directory),
        display_names: presence,
        feed: Arc::new(ChangeFeed::new()),
    };

    // TODO: Replace CorsLayer::permissive() with the deployed front-end origin.
    let app = routes::build_router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.bind_addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
