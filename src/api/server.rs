//! HTTP server implementation

use std::sync::Arc;

use axum::Router;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::AppState;
use crate::api::routes;
use crate::config::AppConfig;
use crate::database::Database;
use crate::embeddings::EmbeddingService;
use crate::llm::LlmService;
use crate::pipeline::QueryPipeline;
use crate::Result;

/// Start the API server
pub async fn serve_api(config: &AppConfig) -> Result<()> {
    info!("Starting FAQRAG API server...");

    // Initialize services
    let database = Arc::new(Database::from_config(config).await?);
    let embedding_service = EmbeddingService::new(config)?;
    let llm_service = Arc::new(LlmService::new(config)?);

    let pipeline = Arc::new(QueryPipeline::new(
        Arc::clone(&database),
        embedding_service,
        Arc::clone(&llm_service),
        config,
    ));

    // Periodic TTL purge keeps the cache table bounded
    pipeline.cache().start_cleanup_task();

    let state = AppState {
        database,
        pipeline,
        llm_service,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(routes::api_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = config.api_addr();
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| crate::FaqRagError::Http(e.to_string()))?;

    Ok(())
}
