//! API route definitions

use axum::routing::get;
use axum::routing::post;
use axum::Router;

use super::handlers::AppState;
use super::handlers::{
    self,
};

/// Create RESTful API router
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Question answering
        .route("/ask", post(handlers::ask))
        // FAQ content
        .route("/faq/categories", get(handlers::list_categories))
        .route("/faq/:id", get(handlers::get_faq))
        // Statistics
        .route("/stats", get(handlers::get_stats))
        .with_state(state)
}
