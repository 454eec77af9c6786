use axum::response::Html;

use crate::models::{Language, DEFAULT_PATIENT_NAME};
use crate::services::exporter::encode_filename;
use crate::services::renderer::escape_html;
use crate::services::AnalysisOutcome;

pub const PAGE_TITLE: &str = "Health Checkup Analyzer";

#[derive(Debug, Clone, PartialEq)]
pub enum Banner {
    Success(String),
    Error(String),
}

impl Banner {
    fn render(&self) -> String {
        let (class, icon, message) = match self {
            Banner::Success(message) => ("banner success", "✅", message),
            Banner::Error(message) => ("banner error", "❌", message),
        };
        format!(
            r#"<div class="{}" role="status">{} {}</div>"#,
            class,
            icon,
            escape_html(message)
        )
    }
}

/// Values the form is pre-filled with when it is re-rendered.
#[derive(Debug, Clone)]
pub struct FormValues {
    pub language: Language,
    pub patient_name: String,
}

impl Default for FormValues {
    fn default() -> Self {
        Self {
            language: Language::English,
            patient_name: DEFAULT_PATIENT_NAME.to_string(),
        }
    }
}

/// `GET /` - the idle form.
pub async fn index_handler() -> Html<String> {
    Html(render_form_page(&FormValues::default(), &[]))
}

pub fn render_form_page(values: &FormValues, banners: &[Banner]) -> String {
    render_page(&format!(
        "{}\n{}",
        render_banners(banners),
        render_form(values)
    ))
}

pub fn render_result_page(outcome: &AnalysisOutcome) -> String {
    let banners = [
        Banner::Success(format!("PDF uploaded successfully: {}", outcome.source_name)),
        Banner::Success(format!("Extracted {} characters from PDF", outcome.extracted_chars)),
    ];
    let values = FormValues {
        language: outcome.language,
        patient_name: outcome.patient_name.clone(),
    };

    let body = format!(
        r#"{banners}
<h2>🧠 AI Analysis Result</h2>
<section class="analysis" lang="{lang}">
{html}
</section>
<p><a class="button" href="/download/{href}" download="{file}">📥 Download Full Report</a></p>
<hr>
{form}"#,
        banners = render_banners(&banners),
        lang = match outcome.language {
            Language::English => "en",
            Language::Hindi => "hi",
        },
        html = outcome.html,
        href = encode_filename(&outcome.export.filename),
        file = escape_html(&outcome.export.filename),
        form = render_form(&values),
    );

    render_page(&body)
}

fn render_banners(banners: &[Banner]) -> String {
    banners.iter().map(Banner::render).collect::<Vec<_>>().join("\n")
}

fn render_form(values: &FormValues) -> String {
    let options = Language::ALL
        .iter()
        .map(|language| {
            format!(
                r#"<option value="{label}"{selected}>{label}</option>"#,
                label = language.label(),
                selected = if *language == values.language { " selected" } else { "" },
            )
        })
        .collect::<Vec<_>>()
        .join("");

    format!(
        r#"<form id="analyze-form" method="post" action="/analyze" enctype="multipart/form-data">
<label for="file">📄 Upload your health report (PDF)</label>
<input id="file" name="file" type="file" accept="application/pdf,.pdf" required>
<label for="language">Select Language</label>
<select id="language" name="language">{options}</select>
<label for="patient_name">Patient Name (Optional)</label>
<input id="patient_name" name="patient_name" type="text" value="{name}">
<button type="submit">Analyze report</button>
<div id="progress" class="progress" hidden><span class="spinner"></span> 🔍 Extracting text and analyzing report using AI...</div>
</form>"#,
        options = options,
        name = escape_html(&values.patient_name),
    )
}

fn render_page(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<title>{title}</title>
<style>
body {{ font-family: Arial, sans-serif; margin: 40px auto; max-width: 960px; }}
label {{ display: block; margin-top: 12px; }}
.banner {{ padding: 10px 14px; margin: 8px 0; border-radius: 4px; }}
.success {{ background: #e6f4ea; color: #1e4620; }}
.error {{ background: #fdecea; color: #611a15; }}
.analysis {{ border: 1px solid #ddd; padding: 16px; }}
.spinner {{ display: inline-block; width: 12px; height: 12px; border: 2px solid #999; border-top-color: transparent; border-radius: 50%; animation: spin 1s linear infinite; }}
@keyframes spin {{ to {{ transform: rotate(360deg); }} }}
table {{ border-collapse: collapse; }}
td, th {{ border: 1px solid #ddd; padding: 8px; }}
</style>
</head>
<body>
<h1>🏥 {title}</h1>
<p>Upload a PDF health report and get analysis powered by AI.</p>
{body}
<script>
document.getElementById("analyze-form").addEventListener("submit", function () {{
  document.getElementById("progress").hidden = false;
}});
</script>
</body>
</html>"#,
        title = PAGE_TITLE,
        body = body,
    )
}
