use serde::Serialize;
use tracing::{error, info};

use crate::{
    report::{self, MetricsTable},
    rouge::{RougeScorer, RougeScores},
    summarize::{self, LengthBounds, SummaryModel},
    text,
};

pub const STEP_UPLOADED: &str = "File successfully uploaded.";
pub const STEP_DECODED: &str = "File read and decoded.";
pub const STEP_PREPROCESSED: &str = "Text preprocessed.";
pub const STEP_SUMMARIZED: &str = "Text summarized.";
pub const STEP_SCORED: &str = "ROUGE scores calculated.";
pub const STEP_PLOTTED: &str = "Metrics plotted.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Scored,
    Error,
}

/// Everything shown to the user for one upload.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub status: AnalysisStatus,
    pub file_name: String,
    pub steps: Vec<&'static str>,
    pub original_text: Option<String>,
    pub summary: Option<String>,
    pub scores: Option<RougeScores>,
    pub table: Option<MetricsTable>,
    pub chart_svg: Option<String>,
    pub error: Option<String>,
}

impl AnalysisReport {
    fn started(file_name: String) -> Self {
        Self {
            status: AnalysisStatus::Error,
            file_name,
            steps: vec![STEP_UPLOADED],
            original_text: None,
            summary: None,
            scores: None,
            table: None,
            chart_svg: None,
            error: None,
        }
    }

    fn fail(mut self, message: String) -> Self {
        self.status = AnalysisStatus::Error;
        self.error = Some(message);
        self
    }
}

#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

struct Presentation {
    scores: RougeScores,
    table: MetricsTable,
    chart_svg: String,
}

/// Runs decode → normalize → summarize → score → present for one upload.
///
/// Every failure ends the run with an `Error` report; scoring and plotting
/// only happen after a successful summary.
pub async fn run(
    model: &dyn SummaryModel,
    document: UploadedDocument,
    bounds: LengthBounds,
) -> AnalysisReport {
    let UploadedDocument { file_name, bytes } = document;
    let report = AnalysisReport::started(file_name.clone());

    // Parsing is CPU bound. A parser panic surfaces as a join error.
    let name = file_name.clone();
    let decoding = tokio::task::spawn_blocking(move || text::decode_upload(&name, bytes)).await;
    let decoded = match decoding {
        Ok(Ok(decoded)) => decoded,
        Ok(Err(err)) => {
            info!(%file_name, %err, "failed to decode upload");
            return report.fail(format!("An error occurred: {err}"));
        }
        Err(err) => {
            error!(?err, %file_name, "decoding task failed");
            return report.fail(format!("An error occurred: {err}"));
        }
    };
    let mut report = report;
    report.steps.push(STEP_DECODED);

    let article = text::normalize_whitespace(&decoded);
    report.steps.push(STEP_PREPROCESSED);
    info!(
        %file_name,
        words = text::word_count(&article),
        min_length = bounds.min_length,
        max_length = bounds.max_length,
        "document preprocessed"
    );
    report.original_text = Some(article.clone());

    let summary = match summarize::summarize(model, &article, bounds).await {
        Ok(summary) => summary,
        Err(err) => return report.fail(err.to_string()),
    };
    report.steps.push(STEP_SUMMARIZED);
    report.summary = Some(summary.clone());

    let presentation = tokio::task::spawn_blocking(move || present(&article, &summary)).await;
    match presentation {
        Ok(presentation) => {
            report.steps.push(STEP_SCORED);
            report.steps.push(STEP_PLOTTED);
            report.scores = Some(presentation.scores);
            report.table = Some(presentation.table);
            report.chart_svg = Some(presentation.chart_svg);
            report.status = AnalysisStatus::Scored;
            report
        }
        Err(err) => {
            error!(?err, %file_name, "scoring task failed");
            report.fail(format!("An error occurred: {err}"))
        }
    }
}

fn present(article: &str, summary: &str) -> Presentation {
    let scores = RougeScorer::default().score(article, summary);
    let table = report::build_metrics_table(article, summary, &scores);
    let chart_svg = report::render_grouped_bar_chart(&table);
    Presentation {
        scores,
        table,
        chart_svg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarize::{ERROR_MARKER, testing::ScriptedModel};
    use std::sync::atomic::Ordering;

    const BOUNDS: LengthBounds = LengthBounds {
        min_length: 30,
        max_length: 150,
    };

    fn article_of(words: usize) -> String {
        let sentence = "Researchers measured blood pressure in adults enrolled across nine clinics.";
        let per_sentence = sentence.split_whitespace().count();
        let mut out = Vec::new();
        while out.len() * per_sentence < words {
            out.push(sentence);
        }
        out.join("\n\n")
    }

    fn upload(name: &str, body: &str) -> UploadedDocument {
        UploadedDocument {
            file_name: name.to_string(),
            bytes: body.as_bytes().to_vec(),
        }
    }

    #[tokio::test]
    async fn scores_and_plots_after_successful_summary() {
        let model = ScriptedModel::replying(
            "Blood pressure was measured in adults at nine clinics. Results were consistent.",
        );
        let article = article_of(500);

        let report = run(&model, upload("article.txt", &article), BOUNDS).await;

        assert_eq!(report.status, AnalysisStatus::Scored);
        assert_eq!(
            report.steps,
            vec![
                STEP_UPLOADED,
                STEP_DECODED,
                STEP_PREPROCESSED,
                STEP_SUMMARIZED,
                STEP_SCORED,
                STEP_PLOTTED
            ]
        );
        let original = report.original_text.as_deref().expect("original text");
        assert!(!original.contains('\n'));
        assert!(text::word_count(original) >= 500);

        let summary = report.summary.as_deref().expect("summary");
        assert!(!summary.is_empty());
        assert!(text::word_count(summary) <= 150);

        let table = report.table.as_ref().expect("table");
        let rouge_columns = table
            .columns
            .iter()
            .filter(|c| c.label.starts_with("ROUGE"))
            .count();
        assert_eq!(rouge_columns, 9);
        assert!(report.scores.is_some());
        assert!(report.chart_svg.as_deref().is_some_and(|svg| svg.contains("<svg")));
        assert!(report.error.is_none());
    }

    #[tokio::test]
    async fn summarization_failure_skips_scoring() {
        let model = ScriptedModel::failing("input too long for model context");

        let report = run(&model, upload("article.txt", "Some article text."), BOUNDS).await;

        assert_eq!(report.status, AnalysisStatus::Error);
        let error = report.error.as_deref().expect("error");
        assert!(error.starts_with(ERROR_MARKER));
        assert!(error.contains("input too long"));
        assert!(report.summary.is_none());
        assert!(report.scores.is_none());
        assert!(report.table.is_none());
        assert!(report.chart_svg.is_none());
        assert!(!report.steps.contains(&STEP_SCORED));
        assert_eq!(report.original_text.as_deref(), Some("Some article text."));
    }

    #[tokio::test]
    async fn decode_failure_never_reaches_the_model() {
        let model = ScriptedModel::replying("unused");
        let document = UploadedDocument {
            file_name: "broken.txt".to_string(),
            bytes: vec![0xc3, 0x28],
        };

        let report = run(&model, document, BOUNDS).await;

        assert_eq!(report.status, AnalysisStatus::Error);
        assert!(
            report
                .error
                .as_deref()
                .is_some_and(|e| e.starts_with("An error occurred: "))
        );
        assert_eq!(report.steps, vec![STEP_UPLOADED]);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unreadable_pdf_reports_error_without_summarizing() {
        let model = ScriptedModel::replying("unused");
        let document = UploadedDocument {
            file_name: "paper.pdf".to_string(),
            bytes: b"definitely not a pdf \x00\x01".to_vec(),
        };

        let report = run(&model, document, BOUNDS).await;

        assert_eq!(report.status, AnalysisStatus::Error);
        assert!(
            report
                .error
                .as_deref()
                .is_some_and(|e| e.starts_with("An error occurred: "))
        );
        assert_eq!(report.steps, vec![STEP_UPLOADED]);
        assert!(report.original_text.is_none());
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn report_serializes_with_reference_metric_names() {
        let model = ScriptedModel::replying("Short summary.");
        let report = run(&model, upload("a.txt", "Short summary. Longer article."), BOUNDS).await;

        let value = serde_json::to_value(&report).expect("serialize");
        assert_eq!(value["status"], "scored");
        assert!(value["scores"]["rougeL"]["fmeasure"].is_number());
        assert!(value["table"]["columns"][2]["values"][1].is_null());
    }
}
