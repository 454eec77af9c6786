use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Error extracting text: {message}")]
    ExtractionError { message: String },

    #[error("Error analyzing health report: {message}")]
    AnalysisError { message: String },

    #[error("Error exporting report: {message}")]
    ExportError { message: String },

    #[error("File too large: {size}MB exceeds limit of {limit}MB")]
    FileTooLarge { size: usize, limit: usize },

    #[error("Invalid file format: {message}")]
    InvalidFile { message: String },

    #[error("Missing file in request")]
    MissingFile,

    #[error("Another analysis is already in progress, please try again shortly")]
    RateLimitExceeded,

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::ExtractionError { .. } => "EXTRACTION_ERROR",
            AppError::AnalysisError { .. } => "ANALYSIS_ERROR",
            AppError::ExportError { .. } => "EXPORT_ERROR",
            AppError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            AppError::InvalidFile { .. } => "INVALID_FILE",
            AppError::MissingFile => "MISSING_FILE",
            AppError::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            AppError::ValidationError { .. } => "VALIDATION_ERROR",
            AppError::NotFound { .. } => "NOT_FOUND",
            AppError::ConfigError { .. } => "CONFIG_ERROR",
            AppError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ExtractionError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::AnalysisError { .. } => StatusCode::BAD_GATEWAY,
            AppError::ExportError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::InvalidFile { .. } => StatusCode::BAD_REQUEST,
            AppError::MissingFile => StatusCode::BAD_REQUEST,
            AppError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            AppError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::ConfigError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the failure happened inside the pipeline (extract, analyze, export)
    /// rather than while reading the submission.
    pub fn is_pipeline_failure(&self) -> bool {
        matches!(
            self,
            AppError::ExtractionError { .. }
                | AppError::AnalysisError { .. }
                | AppError::ExportError { .. }
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();
        let request_id = crate::middleware::logging::current_request_id()
            .unwrap_or_else(|| Uuid::new_v4().to_string()[..8].to_string());
        let timestamp = chrono::Utc::now().to_rfc3339();

        tracing::error!(
            error_code = error_code,
            status_code = %status,
            request_id = %request_id,
            error_message = %message,
            "API error occurred"
        );

        let body = Json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message,
                "request_id": request_id,
                "timestamp": timestamp
            },
            "data": null
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal {
            message: format!("Background task failed: {}", err),
        }
    }
}

impl AppError {
    pub fn extraction(message: impl Into<String>) -> Self {
        AppError::ExtractionError {
            message: message.into(),
        }
    }

    pub fn analysis(message: impl Into<String>) -> Self {
        AppError::AnalysisError {
            message: message.into(),
        }
    }

    pub fn export(message: impl Into<String>) -> Self {
        AppError::ExportError {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::ValidationError {
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        AppError::NotFound {
            resource: resource.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        AppError::ConfigError {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal {
            message: message.into(),
        }
    }
}
