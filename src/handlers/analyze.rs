use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json, Response},
};
use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult};
use crate::handlers::form::{render_form_page, render_result_page, Banner, FormValues};
use crate::middleware::logging::request_id_from;
use crate::models::{
    normalize_patient_name, AnalyzeData, AnalyzeResponse, AnalyzeSubmission, ExportInfo, Language,
    UploadedReport,
};
use crate::state::AppState;

/// The raw form contents; `report` stays `None` until a file is chosen.
#[derive(Debug)]
pub struct FormSubmission {
    pub report: Option<UploadedReport>,
    pub language: Language,
    pub patient_name: String,
}

impl FormSubmission {
    fn values(&self) -> FormValues {
        FormValues {
            language: self.language,
            patient_name: self.patient_name.clone(),
        }
    }

    fn into_submission(self) -> Option<AnalyzeSubmission> {
        let FormSubmission {
            report,
            language,
            patient_name,
        } = self;
        report.map(|report| AnalyzeSubmission {
            report,
            language,
            patient_name,
        })
    }
}

/// `POST /analyze` - runs the pipeline and answers with the result page.
pub async fn analyze_page_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let request_id = request_id_from(&headers);

    let limit = state.config.max_file_size_bytes();
    let form = match read_submission(multipart, limit, declared_length(&headers)).await {
        Ok(form) => form,
        Err(e) => {
            warn!(request_id = %request_id, error = %e, "Rejected form submission");
            return error_page(&FormValues::default(), e);
        }
    };

    let values = form.values();
    let Some(submission) = form.into_submission() else {
        debug!(request_id = %request_id, "No file chosen, staying idle");
        return Html(render_form_page(&values, &[])).into_response();
    };

    match state.pipeline.run(&request_id, submission).await {
        Ok(outcome) => {
            info!(
                request_id = %request_id,
                export = %outcome.export.filename,
                processing_time_ms = outcome.processing_time_ms,
                "Analysis page rendered"
            );
            Html(render_result_page(&outcome)).into_response()
        }
        Err(e) => error_page(&values, e),
    }
}

/// `POST /api/v1/analyze` - same pipeline, JSON in the service's response envelope.
pub async fn analyze_api_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> AppResult<Json<AnalyzeResponse>> {
    let request_id = request_id_from(&headers);

    info!(request_id = %request_id, "Starting analysis API request");

    let limit = state.config.max_file_size_bytes();
    let submission = read_submission(multipart, limit, declared_length(&headers))
        .await?
        .into_submission()
        .ok_or(AppError::MissingFile)?;

    let outcome = match state.pipeline.run(&request_id, submission).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(request_id = %request_id, error = %e, "Analysis failed");
            return Err(e);
        }
    };

    let data = AnalyzeData {
        language: outcome.language,
        patient_name: outcome.patient_name,
        pages: outcome.pages,
        extracted_chars: outcome.extracted_chars,
        markdown: outcome.markdown,
        html: outcome.html,
        export: ExportInfo::new(outcome.export.filename, outcome.export.size_bytes),
    };

    Ok(Json(AnalyzeResponse::new(data, outcome.processing_time_ms)))
}

fn error_page(values: &FormValues, err: AppError) -> Response {
    let status: StatusCode = err.status_code();
    let page = render_form_page(values, &[Banner::Error(err.to_string())]);
    (status, Html(page)).into_response()
}

const MIB: usize = 1024 * 1024;

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

/// Maps a body read failure; hitting the body limit is reported as an oversized file.
fn multipart_error(
    err: MultipartError,
    context: &str,
    max_size_bytes: usize,
    declared_bytes: Option<usize>,
) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::FileTooLarge {
            size: declared_bytes.unwrap_or(max_size_bytes) / MIB,
            limit: max_size_bytes / MIB,
        };
    }
    AppError::InvalidFile {
        message: format!("{}: {}", context, err),
    }
}

/// Reads `file`, `language` and `patient_name` from the multipart body.
///
/// `declared_bytes` is the request's `Content-Length`, used only to report
/// the size of a body that was cut off at the limit.
pub async fn read_submission(
    mut multipart: Multipart,
    max_size_bytes: usize,
    declared_bytes: Option<usize>,
) -> AppResult<FormSubmission> {
    let mut report = None;
    let mut language = Language::default();
    let mut patient_name = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "Failed to read multipart field", max_size_bytes, declared_bytes))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let content_type = field.content_type().map(|ct| ct.to_string());

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, "Failed to read file data", max_size_bytes, declared_bytes))?;

                // Browsers send an empty part when nothing was picked
                if file_name.is_empty() && data.is_empty() {
                    continue;
                }

                if data.len() > max_size_bytes {
                    return Err(AppError::FileTooLarge {
                        size: data.len() / MIB,
                        limit: max_size_bytes / MIB,
                    });
                }

                let name = if file_name.is_empty() {
                    "uploaded.pdf".to_string()
                } else {
                    file_name
                };

                let mut file = UploadedReport::new(name, data);
                if let Some(mime_type) = content_type {
                    file = file.with_mime_type(mime_type);
                }

                if !file.is_pdf() {
                    return Err(AppError::InvalidFile {
                        message: "File is not a valid PDF document".to_string(),
                    });
                }

                debug!(
                    "Received file: {} ({} bytes, type: {:?})",
                    file.name,
                    file.size,
                    file.mime_type
                );

                report = Some(file);
            }
            "language" => {
                let value = read_text(field).await?;
                if !value.trim().is_empty() {
                    language = value.parse()?;
                }
            }
            "patient_name" => {
                patient_name = Some(read_text(field).await?);
            }
            other => {
                debug!(field = other, "Ignoring unknown form field");
            }
        }
    }

    Ok(FormSubmission {
        report,
        language,
        patient_name: normalize_patient_name(patient_name.as_deref()),
    })
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::validation(format!("Failed to read form field: {}", e)))
}
