//! Router assembly.

mod common;
mod product;

pub use common::common_routes;
pub use product::product_routes;

use crate::state::AppState;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;

/// Product bodies are small; anything larger is rejected before parsing.
const BODY_LIMIT_BYTES: usize = 64 * 1024;

/// Full application: common routes at the root, product routes under `/api/v1`,
/// permissive CORS.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .nest("/api/v1", product_routes(state))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(CorsLayer::permissive())
}
