use serde::Serialize;

use crate::models::PriceBar;

pub const SHORT_WINDOW: usize = 20;
pub const LONG_WINDOW: usize = 50;

/// Descriptive statistics over one price series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockMetrics {
    pub first_close: f64,
    pub latest_close: f64,
    pub high: f64,
    pub low: f64,
    /// latest_close - first_close
    pub change: f64,
    pub pct_change: f64,
    pub avg_volume: f64,
    pub rolling_mean_20: f64,
    pub rolling_mean_50: f64,
    pub bar_count: usize,
}

impl StockMetrics {
    /// `None` for an empty series. Callers check this before building
    /// anything that depends on the numbers.
    pub fn compute(series: &[PriceBar]) -> Option<Self> {
        let first = series.first()?;
        let last = series.last()?;

        let high = series
            .iter()
            .map(|b| b.high)
            .fold(f64::NEG_INFINITY, f64::max);
        let low = series
            .iter()
            .map(|b| b.low)
            .fold(f64::INFINITY, f64::min);

        let closes: Vec<f64> = series.iter().map(|b| b.close).collect();
        let avg_volume =
            series.iter().map(|b| b.volume as f64).sum::<f64>() / series.len() as f64;

        Some(Self {
            first_close: first.close,
            latest_close: last.close,
            high,
            low,
            change: last.close - first.close,
            pct_change: pct_change(first.close, last.close),
            avg_volume,
            rolling_mean_20: rolling_mean(&closes, SHORT_WINDOW),
            rolling_mean_50: rolling_mean(&closes, LONG_WINDOW),
            bar_count: series.len(),
        })
    }

    pub fn is_positive(&self) -> bool {
        self.pct_change > 0.0
    }
}

/// (last - first) / first * 100. A zero starting price yields 0.
pub fn pct_change(first: f64, last: f64) -> f64 {
    if first == 0.0 {
        return 0.0;
    }
    (last - first) / first * 100.0
}

/// Mean of the trailing `window` values. A series shorter than the window
/// degrades to the mean of the whole series.
pub fn rolling_mean(values: &[f64], window: usize) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let take = if window == 0 { values.len() } else { window.min(values.len()) };
    let tail = &values[values.len() - take..];
    tail.iter().sum::<f64>() / take as f64
}

/// Simple Moving Average aligned with `values`: `None` until `window`
/// values exist, then the running mean.
pub fn sma(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    values
        .iter()
        .enumerate()
        .scan(0.0_f64, move |sum, (i, &v)| {
            *sum += v;
            if i >= window {
                *sum -= values[i - window];
            }

            let out = if i + 1 >= window {
                Some(*sum / window as f64)
            } else {
                None
            };

            Some(out)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bars(closes: &[f64]) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar::flat(start + chrono::Duration::days(i as i64), c, 1_000 * (i as u64 + 1)))
            .collect()
    }

    #[test]
    fn test_reference_series() {
        let m = StockMetrics::compute(&bars(&[100.0, 105.0, 98.0, 110.0])).unwrap();
        assert_eq!(m.first_close, 100.0);
        assert_eq!(m.latest_close, 110.0);
        assert_eq!(m.high, 110.0);
        assert_eq!(m.low, 98.0);
        assert_eq!(m.change, 10.0);
        assert_eq!(format!("{:.2}", m.pct_change), "10.00");
        assert_eq!(m.avg_volume, 2_500.0);
    }

    #[test]
    fn test_pct_change_formula_and_bounds() {
        let series = vec![
            PriceBar {
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                open: 50.0,
                high: 52.0,
                low: 48.0,
                close: 51.0,
                volume: 10,
            },
            PriceBar {
                date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                open: 51.0,
                high: 60.0,
                low: 49.5,
                close: 57.5,
                volume: 30,
            },
            PriceBar {
                date: NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
                open: 57.0,
                high: 58.0,
                low: 44.0,
                close: 45.0,
                volume: 20,
            },
        ];
        let m = StockMetrics::compute(&series).unwrap();
        assert_eq!(m.pct_change, (45.0 - 51.0) / 51.0 * 100.0);
        for bar in &series {
            assert!(m.high >= bar.close);
            assert!(bar.close >= m.low);
        }
        assert_eq!(m.high, 60.0);
        assert_eq!(m.low, 44.0);
        assert!(!m.is_positive());
    }

    #[test]
    fn test_short_series_rolling_mean_degrades_to_simple_mean() {
        let closes = [10.0, 20.0, 30.0];
        assert_eq!(rolling_mean(&closes, 20), 20.0);
        assert_eq!(rolling_mean(&closes, 50), 20.0);

        let m = StockMetrics::compute(&bars(&closes)).unwrap();
        assert_eq!(m.rolling_mean_20, 20.0);
        assert_eq!(m.rolling_mean_50, 20.0);
    }

    #[test]
    fn test_rolling_mean_uses_trailing_window() {
        let closes: Vec<f64> = (1..=25).map(|v| v as f64).collect();
        // last 20 values are 6..=25 → mean 15.5
        assert_eq!(rolling_mean(&closes, 20), 15.5);
    }

    #[test]
    fn test_empty_series_has_no_metrics() {
        assert!(StockMetrics::compute(&[]).is_none());
        assert_eq!(rolling_mean(&[], 20), 0.0);
    }

    #[test]
    fn test_zero_start_price_does_not_divide() {
        assert_eq!(pct_change(0.0, 5.0), 0.0);
    }

    #[test]
    fn test_sma_alignment() {
        let out = sma(&[1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(out, vec![None, Some(1.5), Some(2.5), Some(3.5)]);
        assert_eq!(sma(&[1.0, 2.0], 0), vec![None, None]);
    }
}
