use std::sync::Arc;

use crate::config::Config;
use crate::error::AppResult;
use crate::middleware::AnalysisGate;
use crate::services::{
    AnalysisPipeline, Clock, CompletionProvider, OpenRouterClient, ReportExporter, SystemClock,
};

/// Shared, read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<AnalysisPipeline>,
    pub gate: AnalysisGate,
}

impl AppState {
    /// Production wiring: OpenRouter client and the local wall clock.
    pub fn from_config(config: Config) -> AppResult<Self> {
        let provider = Arc::new(OpenRouterClient::from_config(&config)?);
        Ok(Self::with_parts(config, provider, Arc::new(SystemClock)))
    }

    pub fn with_parts(
        config: Config,
        provider: Arc<dyn CompletionProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let pipeline = AnalysisPipeline::new(
            provider,
            ReportExporter::new(config.export_dir.clone()),
            clock,
            config.model.clone(),
        );
        let gate = AnalysisGate::new(config.max_concurrent_analyses);

        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            gate,
        }
    }
}
