use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::price_bar::{Period, PriceBar};
use crate::services::stock_metrics::StockMetrics;

/// Editor's rewrite of a generated report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditedReport {
    pub content: String,
    pub feedback: String,
    pub edited_at: DateTime<Utc>,
}

/// A generated stock report.
///
/// Fields are private: `metrics` is derived from `series` in the constructor
/// and there is no way to swap one without the other. The only change allowed
/// after generation is attaching an edited variant.
#[derive(Debug, Clone, Serialize)]
pub struct ReportPayload {
    symbol: String,
    period: Period,
    series: Vec<PriceBar>,
    metrics: StockMetrics,
    narrative: String,
    used_fallback: bool,
    chart_svg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    edited: Option<EditedReport>,
    generated_at: DateTime<Utc>,
}

impl ReportPayload {
    /// Returns `None` for an empty series; there is nothing to report on.
    pub fn new(
        symbol: impl Into<String>,
        period: Period,
        series: Vec<PriceBar>,
        narrative: impl Into<String>,
        used_fallback: bool,
        chart_svg: String,
    ) -> Option<Self> {
        let metrics = StockMetrics::compute(&series)?;
        Some(Self {
            symbol: symbol.into(),
            period,
            series,
            metrics,
            narrative: narrative.into(),
            used_fallback,
            chart_svg,
            edited: None,
            generated_at: Utc::now(),
        })
    }

    pub fn with_edit(mut self, edited: EditedReport) -> Self {
        self.edited = Some(edited);
        self
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn series(&self) -> &[PriceBar] {
        &self.series
    }

    pub fn metrics(&self) -> &StockMetrics {
        &self.metrics
    }

    pub fn narrative(&self) -> &str {
        &self.narrative
    }

    pub fn used_fallback(&self) -> bool {
        self.used_fallback
    }

    pub fn chart_svg(&self) -> &str {
        &self.chart_svg
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn edited(&self) -> Option<&EditedReport> {
        self.edited.as_ref()
    }

    /// Edited text when present, otherwise the original narrative.
    pub fn best_text(&self) -> &str {
        self.edited
            .as_ref()
            .map(|e| e.content.as_str())
            .unwrap_or(&self.narrative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bars(closes: &[f64]) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar::flat(start + chrono::Duration::days(i as i64), c, 1_000))
            .collect()
    }

    #[test]
    fn test_metrics_match_carried_series() {
        let report = ReportPayload::new(
            "TTM",
            Period::OneMonth,
            bars(&[100.0, 105.0, 98.0, 110.0]),
            "text",
            false,
            String::new(),
        )
        .unwrap();

        assert_eq!(report.metrics(), &StockMetrics::compute(report.series()).unwrap());
        assert_eq!(report.metrics().latest_close, 110.0);
    }

    #[test]
    fn test_empty_series_yields_no_report() {
        let report = ReportPayload::new("NOPE", Period::OneMonth, vec![], "", true, String::new());
        assert!(report.is_none());
    }

    #[test]
    fn test_best_text_prefers_edit() {
        let report = ReportPayload::new("TTM", Period::OneMonth, bars(&[1.0, 2.0]), "draft", false, String::new())
            .unwrap();
        assert_eq!(report.best_text(), "draft");

        let edited = report.with_edit(EditedReport {
            content: "polished".to_string(),
            feedback: "tightened intro".to_string(),
            edited_at: Utc::now(),
        });
        assert_eq!(edited.best_text(), "polished");
        assert_eq!(edited.narrative(), "draft");
    }
}
