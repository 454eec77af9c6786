use serde::{Deserialize, Serialize};

use super::request::Language;
use crate::services::exporter::encode_filename;

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub data: AnalyzeData,
    pub processing_time_ms: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeData {
    pub language: Language,
    pub patient_name: String,
    pub pages: usize,
    pub extracted_chars: usize,
    pub markdown: String,
    pub html: String,
    pub export: ExportInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportInfo {
    pub filename: String,
    pub download_url: String,
    pub size_bytes: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl AnalyzeResponse {
    pub fn new(data: AnalyzeData, processing_time_ms: u64) -> Self {
        Self {
            success: true,
            data,
            processing_time_ms,
        }
    }
}

impl ExportInfo {
    pub fn new(filename: String, size_bytes: u64) -> Self {
        let download_url = format!("/download/{}", encode_filename(&filename));
        Self {
            filename,
            download_url,
            size_bytes,
        }
    }
}
