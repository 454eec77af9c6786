use std::panic;
use std::time::Instant;
use lopdf::Document;

use crate::error::{AppError, AppResult};
use crate::models::UploadedReport;

pub struct PdfProcessor;

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult {
    pub text: String,
    pub pages: usize,
    pub page_chars: Vec<usize>,
    pub char_count: usize,
    pub processing_time_ms: u64,
}

impl PdfProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Extracts the plain text of every page, in page order, on the blocking pool.
    pub async fn extract_text(&self, report: &UploadedReport) -> AppResult<ExtractionResult> {
        tracing::info!(
            "Starting PDF text extraction for file: {} ({} bytes)",
            report.name,
            report.size
        );

        let content = report.content.clone();
        let result = tokio::task::spawn_blocking(move || extract_pages(&content)).await??;

        tracing::info!(
            pages = result.pages,
            chars = result.char_count,
            processing_time_ms = result.processing_time_ms,
            "PDF text extraction completed"
        );

        Ok(result)
    }
}

impl Default for PdfProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Opens `pdf_content` as a paged document and concatenates each page's text.
///
/// Pages lopdf cannot decode are taken from a per-page pdf-extract pass,
/// which runs at most once.
pub fn extract_pages(pdf_content: &[u8]) -> AppResult<ExtractionResult> {
    extract_pages_with(pdf_content, |doc, page_number| doc.extract_text(&[page_number]))
}

/// Same as [`extract_pages`] with the lopdf page decoder supplied by the caller.
pub fn extract_pages_with<F>(pdf_content: &[u8], decode_page: F) -> AppResult<ExtractionResult>
where
    F: Fn(&Document, u32) -> lopdf::Result<String>,
{
    let start = Instant::now();

    let doc = Document::load_mem(pdf_content)
        .map_err(|e| AppError::extraction(format!("failed to open PDF: {}", e)))?;

    let pages = doc.get_pages();
    let mut text = String::new();
    let mut page_chars = Vec::with_capacity(pages.len());
    let mut fallback: Option<Vec<String>> = None;

    for (index, page_number) in pages.keys().copied().enumerate() {
        let page_text = match decode_page(&doc, page_number) {
            Ok(page_text) => page_text,
            Err(e) => {
                tracing::warn!(
                    page = page_number,
                    error = %e,
                    "lopdf could not decode page text, using pdf-extract"
                );
                if fallback.is_none() {
                    fallback = Some(fallback_pages(pdf_content)?);
                }
                fallback
                    .as_ref()
                    .and_then(|all| all.get(index))
                    .cloned()
                    .ok_or_else(|| {
                        AppError::extraction(format!("no text could be read from page {}", page_number))
                    })?
            }
        };

        page_chars.push(page_text.chars().count());
        text.push_str(&page_text);
    }

    let char_count = page_chars.iter().sum();
    let processing_time_ms = start.elapsed().as_millis() as u64;

    tracing::debug!(pages = page_chars.len(), chars = char_count, "Accumulated page text");

    Ok(ExtractionResult {
        text,
        pages: page_chars.len(),
        page_chars,
        char_count,
        processing_time_ms,
    })
}

/// Text of every page, in page order, as read by pdf-extract.
pub fn fallback_pages(pdf_content: &[u8]) -> AppResult<Vec<String>> {
    // pdf-extract panics on some malformed inputs
    let outcome = panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(pdf_content));

    match outcome {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(AppError::extraction(format!("pdf-extract failed: {}", e))),
        Err(_) => Err(AppError::extraction("pdf-extract crashed while reading the document")),
    }
}
