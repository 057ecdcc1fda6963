use std::fmt::Write;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::PriceBar;
use crate::services::stock_metrics::{sma, SHORT_WINDOW};

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 400.0;
const MARGIN: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub close: f64,
    pub sma20: Option<f64>,
}

pub fn chart_points(series: &[PriceBar]) -> Vec<ChartPoint> {
    let closes: Vec<f64> = series.iter().map(|b| b.close).collect();
    let sma20 = sma(&closes, SHORT_WINDOW);

    series
        .iter()
        .zip(sma20)
        .map(|(bar, sma20)| ChartPoint { date: bar.date, close: bar.close, sma20 })
        .collect()
}

/// Line chart of closing prices with the 20-period SMA overlaid.
/// An empty series renders an empty frame.
pub fn render_price_chart(symbol: &str, series: &[PriceBar]) -> String {
    let points = chart_points(series);

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = WIDTH,
        h = HEIGHT
    );
    let _ = write!(
        svg,
        r#"<rect width="100%" height="100%" fill="white"/><text x="{x}" y="30" text-anchor="middle" font-family="sans-serif" font-size="16">{title}</text>"#,
        x = WIDTH / 2.0,
        title = escape(&format!("{} Stock Price", symbol)),
    );

    if let (Some(first), Some(last)) = (points.first(), points.last()) {
        let (low, high) = points
            .iter()
            .flat_map(|p| std::iter::once(p.close).chain(p.sma20))
            .fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let span = if high > low { high - low } else { 1.0 };
        let step = if points.len() > 1 {
            (WIDTH - 2.0 * MARGIN) / (points.len() - 1) as f64
        } else {
            0.0
        };
        let x = |i: usize| MARGIN + step * i as f64;
        let y = |v: f64| HEIGHT - MARGIN - (v - low) / span * (HEIGHT - 2.0 * MARGIN);

        let close_line: Vec<String> = points
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{:.1},{:.1}", x(i), y(p.close)))
            .collect();
        let _ = write!(
            svg,
            r#"<polyline fill="none" stroke="steelblue" stroke-width="2" points="{}"/>"#,
            close_line.join(" ")
        );

        let sma_line: Vec<String> = points
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.sma20.map(|v| format!("{:.1},{:.1}", x(i), y(v))))
            .collect();
        if !sma_line.is_empty() {
            let _ = write!(
                svg,
                r#"<polyline fill="none" stroke="orange" stroke-width="1.5" stroke-dasharray="4 2" points="{}"/>"#,
                sma_line.join(" ")
            );
        }

        let _ = write!(
            svg,
            r#"<text x="{m}" y="{b}" font-family="sans-serif" font-size="11">{start}</text><text x="{r}" y="{b}" text-anchor="end" font-family="sans-serif" font-size="11">{end}</text>"#,
            m = MARGIN,
            r = WIDTH - MARGIN,
            b = HEIGHT - MARGIN / 2.0,
            start = first.date,
            end = last.date,
        );
        let _ = write!(
            svg,
            r#"<text x="5" y="{top}" font-family="sans-serif" font-size="11">${high:.2}</text><text x="5" y="{bottom}" font-family="sans-serif" font-size="11">${low:.2}</text>"#,
            top = MARGIN,
            bottom = HEIGHT - MARGIN,
        );
    }

    svg.push_str("</svg>");
    svg
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars(n: usize) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| PriceBar::flat(start + chrono::Days::new(i as u64), 100.0 + i as f64, 1_000))
            .collect()
    }

    #[test]
    fn test_sma_overlay_starts_at_window() {
        let points = chart_points(&bars(25));
        assert!(points[18].sma20.is_none());
        assert_eq!(points[19].sma20, Some(109.5));
        assert!(points[24].sma20.is_some());
    }

    #[test]
    fn test_short_series_draws_only_close_line() {
        let svg = render_price_chart("AAPL", &bars(5));
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<polyline").count(), 1);
        assert!(svg.contains("AAPL Stock Price"));
    }

    #[test]
    fn test_long_series_draws_overlay() {
        let svg = render_price_chart("AAPL", &bars(30));
        assert_eq!(svg.matches("<polyline").count(), 2);
    }

    #[test]
    fn test_empty_series_is_empty_frame() {
        let svg = render_price_chart("X&Y", &[]);
        assert!(!svg.contains("<polyline"));
        assert!(svg.contains("X&amp;Y"));
    }
}
