use std::fmt::Write;

use super::{CHART_TITLE, MetricsTable, format_value};
use crate::escape_html;

const WIDTH: f64 = 960.0;
const HEIGHT: f64 = 520.0;
const MARGIN_LEFT: f64 = 72.0;
const MARGIN_RIGHT: f64 = 150.0;
const MARGIN_TOP: f64 = 56.0;
const MARGIN_BOTTOM: f64 = 150.0;
const GRID_LINES: usize = 5;
const SERIES_COLORS: [&str; 2] = ["#636efa", "#ef553b"];
const FONT: &str = "Helvetica Neue, Arial, sans-serif";

/// Renders the table as a grouped bar chart: one group per column, one bar per
/// series, all on a shared linear y-axis. Missing values get no bar.
pub fn render_grouped_bar_chart(table: &MetricsTable) -> String {
    let plot_width = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let baseline = MARGIN_TOP + plot_height;
    let axis_max = nice_ceiling(table.max_value());

    let group_count = table.columns.len().max(1) as f64;
    let group_width = plot_width / group_count;
    let bar_width = group_width * 0.8 / table.series.len() as f64;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg xmlns='http://www.w3.org/2000/svg' class='metrics-chart' width='{WIDTH:.0}' height='{HEIGHT:.0}' viewBox='0 0 {WIDTH:.0} {HEIGHT:.0}' role='img' aria-label='{CHART_TITLE}'>"
    );
    let _ = writeln!(
        svg,
        "  <rect width='{WIDTH:.0}' height='{HEIGHT:.0}' fill='#ffffff'/>"
    );
    let _ = writeln!(
        svg,
        "  <text x='{MARGIN_LEFT:.0}' y='32' fill='#0f172a' font-family='{FONT}' font-size='20' font-weight='600'>{CHART_TITLE}</text>"
    );

    for step in 0..=GRID_LINES {
        let value = axis_max * step as f64 / GRID_LINES as f64;
        let y = baseline - plot_height * step as f64 / GRID_LINES as f64;
        let _ = writeln!(
            svg,
            "  <line x1='{MARGIN_LEFT:.0}' y1='{y:.1}' x2='{:.0}' y2='{y:.1}' stroke='#e2e8f0'/>",
            MARGIN_LEFT + plot_width
        );
        let _ = writeln!(
            svg,
            "  <text x='{:.0}' y='{:.1}' fill='#475569' font-family='{FONT}' font-size='12' text-anchor='end'>{}</text>",
            MARGIN_LEFT - 8.0,
            y + 4.0,
            format_tick(value)
        );
    }

    for (group_index, column) in table.columns.iter().enumerate() {
        let group_x = MARGIN_LEFT + group_width * group_index as f64 + group_width * 0.1;

        for (series_index, value) in column.values.iter().enumerate() {
            let Some(value) = value else {
                continue;
            };
            let bar_height = if axis_max > 0.0 {
                plot_height * value / axis_max
            } else {
                0.0
            };
            let x = group_x + bar_width * series_index as f64;
            let _ = writeln!(
                svg,
                "  <rect x='{x:.1}' y='{:.1}' width='{bar_width:.1}' height='{bar_height:.1}' fill='{}'><title>{} · {}: {}</title></rect>",
                baseline - bar_height,
                SERIES_COLORS[series_index % SERIES_COLORS.len()],
                escape_html(table.series[series_index]),
                escape_html(&column.label),
                format_value(Some(*value))
            );
        }

        let label_x = MARGIN_LEFT + group_width * (group_index as f64 + 0.5);
        let label_y = baseline + 14.0;
        let _ = writeln!(
            svg,
            "  <text x='{label_x:.1}' y='{label_y:.1}' fill='#0f172a' font-family='{FONT}' font-size='12' text-anchor='end' transform='rotate(-40 {label_x:.1} {label_y:.1})'>{}</text>",
            escape_html(&column.label)
        );
    }

    let _ = writeln!(
        svg,
        "  <line x1='{MARGIN_LEFT:.0}' y1='{baseline:.1}' x2='{:.0}' y2='{baseline:.1}' stroke='#94a3b8'/>",
        MARGIN_LEFT + plot_width
    );

    let legend_x = WIDTH - MARGIN_RIGHT + 24.0;
    for (series_index, series) in table.series.iter().enumerate() {
        let y = MARGIN_TOP + 24.0 * series_index as f64;
        let _ = writeln!(
            svg,
            "  <rect x='{legend_x:.0}' y='{y:.0}' width='14' height='14' fill='{}'/>",
            SERIES_COLORS[series_index % SERIES_COLORS.len()]
        );
        let _ = writeln!(
            svg,
            "  <text x='{:.0}' y='{:.0}' fill='#0f172a' font-family='{FONT}' font-size='13'>{}</text>",
            legend_x + 22.0,
            y + 12.0,
            escape_html(series)
        );
    }

    svg.push_str("</svg>");
    svg
}

/// Rounds the axis maximum up to 1, 2, 2.5 or 5 times a power of ten.
fn nice_ceiling(value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 1.0;
    }
    let magnitude = 10f64.powf(value.log10().floor());
    let normalized = value / magnitude;
    let nice = [1.0, 2.0, 2.5, 5.0, 10.0]
        .into_iter()
        .find(|step| normalized <= *step + f64::EPSILON)
        .unwrap_or(10.0);
    nice * magnitude
}

fn format_tick(value: f64) -> String {
    if value >= 10.0 || value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}
