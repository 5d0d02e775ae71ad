mod chart;

pub use chart::render_grouped_bar_chart;

use serde::Serialize;

use crate::{
    rouge::{RougeScores, Score},
    text::{sentence_count, word_count},
};

pub const SERIES: [&str; 2] = ["Article", "Summary"];
pub const CHART_TITLE: &str = "Summary Metrics";

/// One column of the comparison table; `values` follows the order of [`SERIES`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricColumn {
    pub label: String,
    pub values: [Option<f64>; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsTable {
    pub series: [&'static str; 2],
    pub columns: Vec<MetricColumn>,
}

impl MetricsTable {
    #[cfg(test)]
    pub fn column(&self, label: &str) -> Option<&MetricColumn> {
        self.columns.iter().find(|column| column.label == label)
    }

    pub fn max_value(&self) -> f64 {
        self.columns
            .iter()
            .flat_map(|column| column.values.iter().flatten())
            .copied()
            .fold(0.0, f64::max)
    }
}

/// Builds the Article/Summary comparison table.
///
/// Word and sentence counts are filled for both series. The ROUGE columns
/// carry a single value each, which lands on the Article series and leaves
/// Summary empty.
pub fn build_metrics_table(article: &str, summary: &str, scores: &RougeScores) -> MetricsTable {
    let mut columns = vec![
        MetricColumn {
            label: "Length (words)".to_string(),
            values: [
                Some(word_count(article) as f64),
                Some(word_count(summary) as f64),
            ],
        },
        MetricColumn {
            label: "Sentences".to_string(),
            values: [
                Some(sentence_count(article) as f64),
                Some(sentence_count(summary) as f64),
            ],
        },
    ];

    let families: [(&str, &Score); 3] = [
        ("ROUGE-1", &scores.rouge1),
        ("ROUGE-2", &scores.rouge2),
        ("ROUGE-L", &scores.rouge_l),
    ];

    for (family, score) in families {
        for (measure, value) in [
            ("Precision", score.precision),
            ("Recall", score.recall),
            ("F1", score.fmeasure),
        ] {
            columns.push(MetricColumn {
                label: format!("{family} {measure}"),
                values: [Some(value), None],
            });
        }
    }

    MetricsTable {
        series: SERIES,
        columns,
    }
}

pub fn render_table_html(table: &MetricsTable) -> String {
    let header = table
        .series
        .iter()
        .map(|series| format!("<th>{}</th>", crate::escape_html(series)))
        .collect::<String>();

    let rows = table
        .columns
        .iter()
        .map(|column| {
            let cells = column
                .values
                .iter()
                .map(|value| format!("<td>{}</td>", format_value(*value)))
                .collect::<String>();
            format!(
                "<tr><th scope=\"row\">{}</th>{}</tr>",
                crate::escape_html(&column.label),
                cells
            )
        })
        .collect::<String>();

    format!(
        r#"<table class="metrics-table"><thead><tr><th>Metric</th>{header}</tr></thead><tbody>{rows}</tbody></table>"#
    )
}

pub(crate) fn format_value(value: Option<f64>) -> String {
    match value {
        None => "—".to_string(),
        Some(v) if v.fract() == 0.0 && v.abs() >= 1.0 => format!("{v:.0}"),
        Some(v) => format!("{v:.4}"),
    }
}
