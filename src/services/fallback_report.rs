use crate::models::{Period, PriceBar};
use crate::services::stock_metrics::StockMetrics;

/// Templated markdown report used when the model can't be reached.
///
/// Pure: the same symbol, period and series always produce the same bytes.
/// The "as of" date is the last bar's date, not the wall clock. Returns
/// `None` for an empty series.
pub fn generate_fallback_report(symbol: &str, period: Period, series: &[PriceBar]) -> Option<String> {
    let metrics = StockMetrics::compute(series)?;
    let last_date = series.last()?.date;
    Some(render(symbol, period, &metrics, &last_date.format("%B %-d, %Y").to_string()))
}

fn render(symbol: &str, period: Period, m: &StockMetrics, as_of: &str) -> String {
    let period_text = period.display();
    let direction = if m.is_positive() { "positive" } else { "negative" };
    let verdict = if m.is_positive() { "outperformed" } else { "underperformed" };

    format!(
        r#"# {symbol} Stock Performance Analysis - {title}

## Key Statistics

- **Current Price**: ${current:.2}
- **Highest Price**: ${high:.2}
- **Lowest Price**: ${low:.2}
- **Price Change**: ${change:.2} ({pct:.2}%)
- **Average Volume**: {volume:.0}
- **20-Day Average Close**: ${ma20:.2}
- **50-Day Average Close**: ${ma50:.2}
- **Analysis Period**: {period_text}

## Performance Summary

The stock of {symbol} has shown {direction} performance during the {period_text}, with a total change of {pct:.2}%.

## Market Context

This analysis covers the period up to {as_of}. The stock demonstrated volatility typical of equity markets, with fluctuations influenced by market conditions, company performance, and broader economic factors.

## Conclusion

Based on the {period_text} performance, {symbol} has {verdict} relative to its starting price. Investors should consider this performance in the context of their investment strategy and market conditions.

*Note: This is an automated analysis. Please conduct additional research before making investment decisions.*
"#,
        title = capitalize(period_text),
        current = m.latest_close,
        high = m.high,
        low = m.low,
        change = m.change,
        pct = m.pct_change,
        volume = m.avg_volume,
        ma20 = m.rolling_mean_20,
        ma50 = m.rolling_mean_50,
    )
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series() -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 7, 23).unwrap();
        [100.0, 105.0, 98.0, 110.0]
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar::flat(start + chrono::Duration::days(i as i64), c, 500))
            .collect()
    }

    #[test]
    fn test_report_is_deterministic() {
        let a = generate_fallback_report("TTM", Period::ThreeMonths, &series()).unwrap();
        let b = generate_fallback_report("TTM", Period::ThreeMonths, &series()).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_report_contents() {
        let report = generate_fallback_report("TTM", Period::ThreeMonths, &series()).unwrap();
        assert!(report.starts_with("# TTM Stock Performance Analysis - Past 3 months"));
        assert!(report.contains("- **Current Price**: $110.00"));
        assert!(report.contains("- **Lowest Price**: $98.00"));
        assert!(report.contains("- **Price Change**: $10.00 (10.00%)"));
        assert!(report.contains("shown positive performance"));
        assert!(report.contains("has outperformed"));
        assert!(report.contains("up to July 26, 2024"));
    }

    #[test]
    fn test_negative_wording() {
        let mut bars = series();
        bars.reverse();
        // reversed dates don't matter to the template, only first/last closes
        let report = generate_fallback_report("NVDA", Period::OneMonth, &bars).unwrap();
        assert!(report.contains("negative performance"));
        assert!(report.contains("underperformed"));
    }

    #[test]
    fn test_empty_series_has_no_report() {
        assert!(generate_fallback_report("TTM", Period::OneMonth, &[]).is_none());
    }
}
