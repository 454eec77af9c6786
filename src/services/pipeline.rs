use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::error::{AppError, AppResult};
use crate::models::{AnalyzeSubmission, Language};
use crate::services::analysis_client::{AnalysisRequest, CompletionProvider};
use crate::services::exporter::{Clock, ExportedFile, ReportExporter};
use crate::services::pdf_processor::PdfProcessor;
use crate::services::renderer::render_markdown;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    FileReceived,
    Extracting,
    Extracted,
    Requesting,
    Rendering,
    Exporting,
    Done,
    Failed(String),
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::Idle => f.write_str("idle"),
            PipelineStage::FileReceived => f.write_str("file_received"),
            PipelineStage::Extracting => f.write_str("extracting"),
            PipelineStage::Extracted => f.write_str("extracted"),
            PipelineStage::Requesting => f.write_str("requesting"),
            PipelineStage::Rendering => f.write_str("rendering"),
            PipelineStage::Exporting => f.write_str("exporting"),
            PipelineStage::Done => f.write_str("done"),
            PipelineStage::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub language: Language,
    pub patient_name: String,
    pub source_name: String,
    pub pages: usize,
    pub extracted_chars: usize,
    pub markdown: String,
    pub html: String,
    pub export: ExportedFile,
    pub processing_time_ms: u64,
}

/// Extract → request → render → export, one pass per upload, no retries.
pub struct AnalysisPipeline {
    processor: PdfProcessor,
    provider: Arc<dyn CompletionProvider>,
    exporter: ReportExporter,
    clock: Arc<dyn Clock>,
    model: String,
}

struct StageTracker<'a> {
    request_id: &'a str,
    stage: PipelineStage,
}

impl<'a> StageTracker<'a> {
    fn new(request_id: &'a str) -> Self {
        Self {
            request_id,
            stage: PipelineStage::Idle,
        }
    }

    fn advance(&mut self, next: PipelineStage) {
        info!(
            request_id = %self.request_id,
            from = %self.stage,
            to = %next,
            "Pipeline stage transition"
        );
        self.stage = next;
    }

    fn fail(&mut self, err: AppError) -> AppError {
        error!(
            request_id = %self.request_id,
            stage = %self.stage,
            error_code = err.error_code(),
            error = %err,
            "Pipeline halted"
        );
        self.stage = PipelineStage::Failed(err.to_string());
        err
    }
}

impl AnalysisPipeline {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        exporter: ReportExporter,
        clock: Arc<dyn Clock>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            processor: PdfProcessor::new(),
            provider,
            exporter,
            clock,
            model: model.into(),
        }
    }

    pub fn exporter(&self) -> &ReportExporter {
        &self.exporter
    }

    pub async fn run(&self, request_id: &str, submission: AnalyzeSubmission) -> AppResult<AnalysisOutcome> {
        let start = Instant::now();
        let mut tracker = StageTracker::new(request_id);

        tracker.advance(PipelineStage::FileReceived);
        info!(
            request_id = %request_id,
            file_name = %submission.report.name,
            file_size = submission.report.size,
            language = %submission.language,
            "Analysis started"
        );

        tracker.advance(PipelineStage::Extracting);
        let extraction = self
            .processor
            .extract_text(&submission.report)
            .await
            .map_err(|e| tracker.fail(e))?;
        tracker.advance(PipelineStage::Extracted);

        info!(
            request_id = %request_id,
            pages = extraction.pages,
            chars = extraction.char_count,
            "Extracted {} characters from PDF",
            extraction.char_count
        );

        let request = AnalysisRequest::new(submission.language, extraction.text, self.model.as_str());

        tracker.advance(PipelineStage::Requesting);
        let markdown = self
            .provider
            .complete(&request)
            .await
            .map_err(|e| tracker.fail(e))?;

        tracker.advance(PipelineStage::Rendering);
        let html = render_markdown(&markdown);

        tracker.advance(PipelineStage::Exporting);
        let export = self
            .exporter
            .export(&submission.patient_name, &html, self.clock.now())
            .await
            .map_err(|e| tracker.fail(e))?;

        tracker.advance(PipelineStage::Done);

        Ok(AnalysisOutcome {
            language: submission.language,
            patient_name: submission.patient_name,
            source_name: submission.report.name,
            pages: extraction.pages,
            extracted_chars: extraction.char_count,
            markdown,
            html,
            export,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}
