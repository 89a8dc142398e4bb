// src/bin/api_server.rs

use dishes_api::infra::telemetry;
use dishes_api::storage::{self, DishRepository};
use dishes_api::transport;
use dishes_api::{
    AppConfig, DishService, InMemoryDishRepository, PgDishRepository, SqliteDishRepository,
    StorageBackend,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let config = AppConfig::from_env()?;
    telemetry::init_tracing(&config.log_filter)?;

    tracing::info!(app = %config.app_name, backend = ?config.storage, "starting");

    // --- Storage Initialization ---
    let mut pg_pool = None;
    let mut sqlite_pool = None;
    let repository: Arc<dyn DishRepository> = match config.storage {
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage; data will not survive a restart");
            Arc::new(InMemoryDishRepository::new())
        }
        StorageBackend::Postgres => {
            let db_config = config
                .database
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set for the postgres backend"))?;
            let pool = storage::postgres::connect_pool(db_config).await?;
            if config.auto_migrate {
                storage::postgres::ensure_schema(&pool).await?;
                tracing::info!("schema ensured (dishes)");
            }
            tracing::info!(max_connections = db_config.max_connections, "connected to postgres");
            pg_pool = Some(pool.clone());
            Arc::new(PgDishRepository::new(pool))
        }
        StorageBackend::Sqlite => {
            let sqlite_config = config
                .sqlite
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("sqlite settings missing for the sqlite backend"))?;
            let pool = storage::sqlite::connect_pool(sqlite_config).await?;
            if config.auto_migrate {
                storage::sqlite::ensure_schema(&pool).await?;
                tracing::info!("schema ensured (dishes)");
            }
            tracing::info!(path = %sqlite_config.path.display(), "opened sqlite database");
            sqlite_pool = Some(pool.clone());
            Arc::new(SqliteDishRepository::new(pool))
        }
    };

    let app_state = transport::http::AppState::new(DishService::new(repository));

    // --- API Server Initialization ---
    let mut api_doc = transport::http::ApiDoc::openapi();
    api_doc.info.title = config.app_name.clone();
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    let app = transport::http::create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api_doc))
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "API server listening");
    tracing::info!("Swagger UI available at /swagger-ui");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pg_pool {
        pool.close().await;
    }
    if let Some(pool) = sqlite_pool {
        pool.close().await;
    }
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
