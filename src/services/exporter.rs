use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};

const EXPORT_PREFIX: &str = "health_analysis_";
const EXPORT_SUFFIX: &str = ".html";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Everything but RFC 3986 unreserved characters.
const FILENAME_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'-')
    .remove(b'.')
    .remove(b'~');

/// Source of wall-clock time for export filenames.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFile {
    pub filename: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Characters kept in a filename slug: anything printable that is not a
/// path separator, a dot, or meaningful in a URL.
fn is_slug_char(c: char) -> bool {
    !c.is_control()
        && !c.is_whitespace()
        && !matches!(
            c,
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '.' | '%' | '#' | '&' | '+' | ';' | '\''
        )
}

/// Lower-cases the name, joins whitespace runs with `_` and drops anything
/// that is not safe in a filename.
pub fn slugify(name: &str) -> String {
    let slug = name
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| is_slug_char(*c))
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    if slug.is_empty() {
        "patient".to_string()
    } else {
        slug
    }
}

pub fn export_filename(patient_name: &str, timestamp: NaiveDateTime) -> String {
    format!(
        "{}{}_{}{}",
        EXPORT_PREFIX,
        slugify(patient_name),
        timestamp.format(TIMESTAMP_FORMAT),
        EXPORT_SUFFIX
    )
}

/// Percent-encodes an export name for URLs and `filename*` parameters.
pub fn encode_filename(filename: &str) -> String {
    utf8_percent_encode(filename, FILENAME_ESCAPES).to_string()
}

/// True for bare names this service could have produced.
pub fn is_export_filename(filename: &str) -> bool {
    filename
        .strip_prefix(EXPORT_PREFIX)
        .and_then(|rest| rest.strip_suffix(EXPORT_SUFFIX))
        .map(|stem| !stem.is_empty() && stem.chars().all(is_slug_char))
        .unwrap_or(false)
}

/// Writes rendered reports into a single directory and reads them back.
#[derive(Debug, Clone)]
pub struct ReportExporter {
    dir: PathBuf,
}

impl ReportExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the export directory if needed; fails when it cannot hold files.
    pub async fn ensure_dir(&self) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            AppError::export(format!("cannot create export directory {}: {}", self.dir.display(), e))
        })
    }

    /// Writes `html` under the timestamped name, replacing any file already there,
    /// then reads it back to confirm the artifact.
    pub async fn export(
        &self,
        patient_name: &str,
        html: &str,
        timestamp: NaiveDateTime,
    ) -> AppResult<ExportedFile> {
        let filename = export_filename(patient_name, timestamp);
        let path = self.dir.join(&filename);

        self.ensure_dir().await?;

        tokio::fs::write(&path, html.as_bytes())
            .await
            .map_err(|e| AppError::export(format!("cannot write {}: {}", filename, e)))?;

        let written = tokio::fs::read(&path)
            .await
            .map_err(|e| AppError::export(format!("cannot read back {}: {}", filename, e)))?;

        info!(filename = %filename, size_bytes = written.len(), "Exported analysis report");

        Ok(ExportedFile {
            filename,
            path,
            size_bytes: written.len() as u64,
        })
    }

    /// Loads a previously exported report for download.
    pub async fn read(&self, filename: &str) -> AppResult<Vec<u8>> {
        if !is_export_filename(filename) {
            debug!(filename = %filename, "Rejected download name");
            return Err(AppError::not_found(format!("report {}", filename)));
        }

        match tokio::fs::read(self.dir.join(filename)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::not_found(format!("report {}", filename)))
            }
            Err(e) => Err(AppError::export(format!("cannot read {}: {}", filename, e))),
        }
    }
}
