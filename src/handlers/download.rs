use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use tracing::info;

use crate::error::AppResult;
use crate::services::exporter::encode_filename;
use crate::state::AppState;

/// `GET /download/:filename` - serves an exported report as an attachment.
pub async fn download_handler(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> AppResult<impl IntoResponse> {
    let bytes = state.pipeline.exporter().read(&filename).await?;

    info!(filename = %filename, size_bytes = bytes.len(), "Serving exported report");

    Ok((
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&filename)),
        ],
        bytes,
    ))
}

/// Non-ASCII names go in `filename*` (RFC 6266) with an ASCII-only `filename`.
fn content_disposition(filename: &str) -> String {
    if filename.is_ascii() {
        return format!("attachment; filename=\"{}\"", filename);
    }
    let fallback: String = filename.chars().filter(char::is_ascii).collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        encode_filename(filename)
    )
}
