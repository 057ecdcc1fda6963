use std::sync::LazyLock;

use regex::Regex;

use crate::models::{BlogDraft, ReportPayload};
use crate::services::conversation_service::Turn;
use crate::services::stock_metrics::StockMetrics;

pub const MARKDOWN_CONTENT_TYPE: &str = "text/markdown; charset=utf-8";

static NON_SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

/// A rendered file ready to be served as an attachment.
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub filename: String,
    pub body: String,
}

impl Download {
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

pub fn metrics_table(m: &StockMetrics) -> String {
    let rows = [
        ("Latest Close", format!("${:.2}", m.latest_close)),
        ("First Close", format!("${:.2}", m.first_close)),
        ("High", format!("${:.2}", m.high)),
        ("Low", format!("${:.2}", m.low)),
        ("Change", format!("${:.2} ({:.2}%)", m.change, m.pct_change)),
        ("Average Volume", format!("{:.0}", m.avg_volume)),
        ("20-Day Average", format!("${:.2}", m.rolling_mean_20)),
        ("50-Day Average", format!("${:.2}", m.rolling_mean_50)),
        ("Trading Days", m.bar_count.to_string()),
    ];

    let mut out = String::from("| Metric | Value |\n|---|---|\n");
    for (label, value) in rows {
        out.push_str(&format!("| {} | {} |\n", label, value));
    }
    out
}

pub fn render_transcript(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|t| format!("**{}:** {}", t.speaker, t.content.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Lowercase, non-alphanumeric runs collapsed to `_`. Falls back to "untitled".
pub fn slugify(text: &str) -> String {
    let slug = NON_SLUG.replace_all(&text.to_lowercase(), "_").trim_matches('_').to_string();
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}

pub fn stock_report_filename(symbol: &str) -> String {
    format!("{}_stock_report.md", symbol.trim().to_uppercase())
}

pub fn blog_filename(topic: &str) -> String {
    format!("{}_blog.md", slugify(topic))
}

/// Report body plus the metrics table. The edited variant replaces the
/// narrative when one exists.
pub fn stock_report_download(report: &ReportPayload) -> Download {
    let mut body = report.best_text().trim_end().to_string();
    body.push_str("\n\n## Summary Statistics\n\n");
    body.push_str(&metrics_table(report.metrics()));
    if report.used_fallback() {
        body.push_str("\n*Generated from a template because the AI team was unavailable.*\n");
    }

    Download { filename: stock_report_filename(report.symbol()), body }
}

/// `None` until the draft has content.
pub fn blog_download(draft: &BlogDraft) -> Option<Download> {
    let text = draft.final_text()?;
    let body = if text.trim_start().starts_with('#') || draft.topic.is_empty() {
        text.to_string()
    } else {
        format!("# {}\n\n{}", draft.topic, text)
    };

    Some(Download { filename: blog_filename(&draft.topic), body })
}
