use std::borrow::Cow;

use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::StatusCode,
    routing::post,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use tracing::info;

use crate::{
    AppState,
    config::{LengthControl, max_length_control, min_length_control},
    escape_html,
    pipeline::{self, AnalysisReport, UploadedDocument},
    render_footer, report,
    summarize::LengthBounds,
    text::SUPPORTED_EXTENSIONS,
    web::{
        ApiMessage, FileFieldConfig, ToolPageLayout, UPLOAD_WIDGET_SCRIPT, UPLOAD_WIDGET_STYLES,
        UploadWidgetConfig,
        auth::{self, JsonAuthError},
        json_error, read_upload_form, render_tool_page, render_upload_widget,
        session::Session,
        templates::APP_TITLE,
    },
};

const FILE_FIELD: &str = "file";
const MIN_LENGTH_FIELD: &str = "min_length";
const MAX_LENGTH_FIELD: &str = "max_length";

pub fn router() -> Router<AppState> {
    Router::new().route("/api/summarize", post(summarize_upload))
}

/// Analysis payload plus the server-rendered metrics table.
#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    #[serde(flatten)]
    pub report: AnalysisReport,
    pub table_html: Option<String>,
}

async fn summarize_upload(
    State(state): State<AppState>,
    jar: CookieJar,
    multipart: Multipart,
) -> Result<Json<SummarizeResponse>, (StatusCode, Json<ApiMessage>)> {
    let session = auth::current_user_or_json_error(&state, &jar)
        .await
        .map_err(|JsonAuthError { status, message }| json_error(status, message))?;

    let mut upload = read_upload_form(multipart, &[FileFieldConfig::new(FILE_FIELD, 1)])
        .await
        .map_err(|err| json_error(StatusCode::BAD_REQUEST, err.to_string()))?;

    let bounds = LengthBounds {
        min_length: parse_length(
            upload.first_text(MIN_LENGTH_FIELD),
            MIN_LENGTH_FIELD,
            &min_length_control(),
        )
        .map_err(|message| json_error(StatusCode::BAD_REQUEST, message))?,
        max_length: parse_length(
            upload.first_text(MAX_LENGTH_FIELD),
            MAX_LENGTH_FIELD,
            &max_length_control(),
        )
        .map_err(|message| json_error(StatusCode::BAD_REQUEST, message))?,
    };

    let file = upload
        .take_file(FILE_FIELD)
        .ok_or_else(|| json_error(StatusCode::BAD_REQUEST, "Please choose a file to upload."))?;

    info!(
        username = session.username.as_deref().unwrap_or_default(),
        file = %file.display_name,
        original_name = %file.original_name,
        bytes = file.bytes.len(),
        min_length = bounds.min_length,
        max_length = bounds.max_length,
        "summarization requested"
    );

    let model = state.summary_model();
    let analysis = pipeline::run(
        model.as_ref(),
        UploadedDocument {
            file_name: file.display_name,
            bytes: file.bytes,
        },
        bounds,
    )
    .await;

    let table_html = analysis.table.as_ref().map(report::render_table_html);
    Ok(Json(SummarizeResponse {
        report: analysis,
        table_html,
    }))
}

/// Parses one slider value. A missing or blank value takes the slider default.
fn parse_length(
    raw: Option<&str>,
    field: &str,
    control: &LengthControl,
) -> Result<u32, String> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Ok(control.default);
    }

    let out_of_range = || {
        format!(
            "{field} must be an integer between {} and {}.",
            control.range.start(),
            control.range.end()
        )
    };

    let value = raw.parse::<u32>().map_err(|_| out_of_range())?;
    if !control.range.contains(&value) {
        return Err(out_of_range());
    }
    Ok(value)
}

fn render_slider(field: &str, label: &str, control: &LengthControl) -> String {
    format!(
        r#"<label for="{field}">{label}: <output id="{field}-value">{default}</output></label>
                        <input type="range" id="{field}" name="{field}" min="{min}" max="{max}" step="1" value="{default}">"#,
        label = escape_html(label),
        min = control.range.start(),
        max = control.range.end(),
        default = control.default,
    )
}

/// Renders the tool page shown to signed-in sessions.
pub fn render_summarizer_page(session: &Session, flash_html: &str) -> String {
    let username = escape_html(session.username.as_deref().unwrap_or_default());
    let note_html = format!(
        "Signed in as <strong>{username}</strong>. Upload a PubMed article to get a summary, then compare it with the source using ROUGE scores."
    );

    let accept = SUPPORTED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(",");
    let upload_widget = render_upload_widget(
        &UploadWidgetConfig::new("article-upload", FILE_FIELD, FILE_FIELD, "Choose a file")
            .with_description("Plain text (.txt) articles; .docx and .pdf files are also accepted.")
            .with_accept(&accept),
    );
    let min_slider = render_slider(
        MIN_LENGTH_FIELD,
        "Minimum summary length",
        &min_length_control(),
    );
    let max_slider = render_slider(
        MAX_LENGTH_FIELD,
        "Maximum summary length",
        &max_length_control(),
    );

    let body_html = format!(
        r#"        <section class="panel">
            <h2>Upload an article</h2>
            <form id="summarize-form">
                {upload_widget}
                {min_slider}
                {max_slider}
                <button type="submit" id="summarize-button">Summarize</button>
            </form>
            <div id="progress" class="status"></div>
        </section>
        <section class="panel" id="results" hidden>
            <h2>Original Text</h2>
            <div id="original-text" class="document-text"></div>
            <h2>Summary</h2>
            <div id="summary-text" class="document-text"></div>
            <h2>Summary Metrics</h2>
            <div id="metrics-table"></div>
            <div id="metrics-chart"></div>
        </section>
"#
    );

    render_tool_page(ToolPageLayout {
        meta_title: APP_TITLE,
        page_heading: APP_TITLE,
        note_html: Cow::Owned(note_html),
        flash_html: Cow::Borrowed(flash_html),
        body_html: Cow::Owned(body_html),
        footer_html: Cow::Owned(render_footer()),
        extra_style_blocks: vec![Cow::Borrowed(UPLOAD_WIDGET_STYLES)],
        body_scripts: vec![
            Cow::Borrowed(UPLOAD_WIDGET_SCRIPT),
            Cow::Owned(format!("<script>\n{SUMMARIZER_SCRIPT}\n</script>")),
        ],
    })
}

const SUMMARIZER_SCRIPT: &str = r#"const form = document.getElementById('summarize-form');
const button = document.getElementById('summarize-button');
const progress = document.getElementById('progress');
const results = document.getElementById('results');
const fileInput = document.getElementById('file');

['min_length', 'max_length'].forEach((name) => {
    const slider = document.getElementById(name);
    const output = document.getElementById(`${name}-value`);
    slider.addEventListener('input', () => { output.textContent = slider.value; });
});

function banner(kind, message) {
    const div = document.createElement('div');
    div.className = `flash ${kind}`;
    div.textContent = message;
    return div;
}

function renderReport(payload) {
    progress.replaceChildren(...payload.steps.map((step) => banner('success', step)));
    if (payload.error) {
        progress.appendChild(banner('error', payload.error));
    }

    if (payload.original_text === null) {
        results.hidden = true;
        return;
    }

    results.hidden = false;
    document.getElementById('original-text').textContent = payload.original_text;
    document.getElementById('summary-text').textContent = payload.summary || '';
    document.getElementById('metrics-table').innerHTML = payload.table_html || '';
    document.getElementById('metrics-chart').innerHTML = payload.chart_svg || '';
}

form.addEventListener('submit', async (event) => {
    event.preventDefault();

    if (!fileInput || fileInput.files.length === 0) {
        progress.replaceChildren(banner('error', 'Please choose a file to upload.'));
        return;
    }

    button.disabled = true;
    progress.replaceChildren(banner('success', 'Summarizing...'));

    try {
        const response = await fetch('/api/summarize', {
            method: 'POST',
            body: new FormData(form),
        });
        const payload = await response.json().catch(() => ({ message: 'Unexpected response from the server.' }));

        if (!response.ok) {
            if (response.status === 401) {
                window.location.href = '/';
                return;
            }
            progress.replaceChildren(banner('error', payload.message || 'Request failed.'));
            return;
        }

        renderReport(payload);
    } catch (err) {
        console.error(err);
        progress.replaceChildren(banner('error', `An error occurred: ${err}`));
    } finally {
        button.disabled = false;
    }
});
"#;
