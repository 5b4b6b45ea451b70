use axum::Router;
use std::sync::Arc;
use tower_http::compression::{predicate::SizeAbove, CompressionLayer};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod cache;
pub mod db;
pub mod listing;
pub mod middleware;
pub mod models;
pub mod search;
pub mod services;
pub mod state;

use api::create_api_router;
use state::AppState;

pub fn create_app_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .merge(create_api_router())
        .with_state(app_state)
        .layer(
            CompressionLayer::new()
                .gzip(true)
                .deflate(true)
                .compress_when(SizeAbove::new(1024)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
