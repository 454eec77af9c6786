pub mod analyze;
pub mod download;
pub mod form;
pub mod health;

pub use analyze::*;
pub use download::*;
pub use form::*;
pub use health::*;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{logging_middleware, rate_limit_middleware};
use crate::state::AppState;

/// Multipart framing on top of the file itself.
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_file_size_bytes() + BODY_OVERHEAD_BYTES;

    let analysis_routes = Router::new()
        .route("/analyze", post(analyze_page_handler))
        .route("/api/v1/analyze", post(analyze_api_handler))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        .route("/", get(index_handler))
        .route("/download/:filename", get(download_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .merge(analysis_routes)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(logging_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}
