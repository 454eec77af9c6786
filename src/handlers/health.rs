use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::AppResult;
use crate::state::AppState;

/// Health check endpoint
pub async fn health_handler(State(state): State<AppState>) -> AppResult<Json<Value>> {
    info!("Health check requested");

    let timestamp = chrono::Utc::now().timestamp();

    let export_ready = match state.pipeline.exporter().ensure_dir().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Export directory unavailable");
            false
        }
    };

    let gate = state.gate.metrics();

    let status = if export_ready {
        "healthy"
    } else {
        "degraded"
    };

    let response = json!({
        "status": status,
        "timestamp": timestamp,
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "export_dir": export_ready,
            "model": state.config.model,
        },
        "analysis_gate": {
            "total_requests": gate.total_requests,
            "rejected_requests": gate.rejected_requests,
            "available_permits": gate.available_permits,
        }
    });

    info!(
        status = status,
        export_ready = export_ready,
        "Health check completed"
    );

    Ok(Json(response))
}

/// Readiness check endpoint
pub async fn ready_handler(State(state): State<AppState>) -> Result<StatusCode, StatusCode> {
    match state.pipeline.exporter().ensure_dir().await {
        Ok(()) => {
            info!("Readiness check passed");
            Ok(StatusCode::OK)
        }
        Err(e) => {
            info!(error = %e, "Readiness check failed - export directory unavailable");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
