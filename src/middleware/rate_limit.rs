use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Bounds how many pipeline runs may be in flight at once.
#[derive(Debug, Clone)]
pub struct AnalysisGate {
    inner: Arc<GateInner>,
}

#[derive(Debug)]
struct GateInner {
    semaphore: Semaphore,
    total_requests: AtomicU64,
    rejected_requests: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GateMetrics {
    pub total_requests: u64,
    pub rejected_requests: u64,
    pub available_permits: usize,
}

impl AnalysisGate {
    pub fn new(max_concurrent: usize) -> Self {
        info!(max_concurrent_analyses = max_concurrent, "Initializing analysis gate");
        Self {
            inner: Arc::new(GateInner {
                semaphore: Semaphore::new(max_concurrent),
                total_requests: AtomicU64::new(0),
                rejected_requests: AtomicU64::new(0),
            }),
        }
    }

    /// Takes a permit without waiting; a busy gate rejects the run.
    pub fn try_enter(&self) -> AppResult<SemaphorePermit<'_>> {
        let total = self.inner.total_requests.fetch_add(1, Ordering::Relaxed) + 1;

        self.inner.semaphore.try_acquire().map_err(|_| {
            let rejected = self.inner.rejected_requests.fetch_add(1, Ordering::Relaxed) + 1;
            warn!(
                total_requests = total,
                rejected_requests = rejected,
                "Analysis rejected - another run holds the gate"
            );
            AppError::RateLimitExceeded
        })
    }

    pub fn metrics(&self) -> GateMetrics {
        GateMetrics {
            total_requests: self.inner.total_requests.load(Ordering::Relaxed),
            rejected_requests: self.inner.rejected_requests.load(Ordering::Relaxed),
            available_permits: self.inner.semaphore.available_permits(),
        }
    }
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();

    let _permit = state.gate.try_enter()?;

    debug!(
        path = path,
        available_permits = state.gate.metrics().available_permits,
        "Analysis permit acquired"
    );

    let response = next.run(request).await;

    debug!(path = path, "Analysis finished, permit released");

    Ok(response)
}
