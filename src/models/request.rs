use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

pub const DEFAULT_PATIENT_NAME: &str = "Patient";

const ENGLISH_SYSTEM_PROMPT: &str = "You are a helpful medical assistant that explains health checkup reports to patients in easy language. Include medical explanation, possible health issues, dietary tips, and recommendations.";

const HINDI_SYSTEM_PROMPT: &str = "आप एक सहायक मेडिकल असिस्टेंट हैं जो हेल्थ रिपोर्ट को आसान हिंदी में समझाते हैं। कृपया मरीज की रिपोर्ट पढ़कर उसका सारांश, संभावित समस्याएं, डाइट टिप्स और सलाह दें।";

/// Output language for the explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    Hindi,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::Hindi];

    pub fn label(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            Language::English => ENGLISH_SYSTEM_PROMPT,
            Language::Hindi => HINDI_SYSTEM_PROMPT,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Language {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "english" | "en" => Ok(Language::English),
            "hindi" | "hi" => Ok(Language::Hindi),
            other => Err(AppError::validation(format!(
                "Unsupported language '{}', expected English or Hindi",
                other
            ))),
        }
    }
}

/// A PDF as received from the upload form.
#[derive(Debug, Clone)]
pub struct UploadedReport {
    pub name: String,
    pub size: usize,
    pub content: Bytes,
    pub mime_type: Option<String>,
}

impl UploadedReport {
    pub fn new(name: String, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        let size = content.len();
        Self {
            name,
            size,
            content,
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: String) -> Self {
        self.mime_type = Some(mime_type);
        self
    }

    pub fn is_pdf(&self) -> bool {
        let declared_pdf = self
            .mime_type
            .as_ref()
            .map(|mt| mt == "application/pdf")
            .unwrap_or(false);

        declared_pdf
            || self.name.to_lowercase().ends_with(".pdf")
            || self.content.starts_with(b"%PDF")
    }
}

/// A complete form submission: only built once a file has been chosen.
#[derive(Debug, Clone)]
pub struct AnalyzeSubmission {
    pub report: UploadedReport,
    pub language: Language,
    pub patient_name: String,
}

/// Falls back to the default display name when the field is blank.
pub fn normalize_patient_name(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => DEFAULT_PATIENT_NAME.to_string(),
    }
}
