pub mod analysis_client;
pub mod exporter;
pub mod pdf_processor;
pub mod pipeline;
pub mod renderer;

pub use analysis_client::{AnalysisRequest, CompletionProvider, OpenRouterClient};
pub use exporter::{Clock, ExportedFile, ReportExporter, SystemClock};
pub use pdf_processor::{ExtractionResult, PdfProcessor};
pub use pipeline::{AnalysisOutcome, AnalysisPipeline, PipelineStage};
pub use renderer::render_markdown;
