use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::models::{Period, PriceBar};

const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance chart API. No API key required.
pub struct YahooFinanceProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YahooFinanceProvider {
    pub fn new() -> Self {
        Self::with_base_url(YAHOO_CHART_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("Mozilla/5.0 (compatible; AgentDesk/0.1)")
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url: base_url.into(),
        }
    }
}

impl Default for YahooFinanceProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: Option<String>,
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

fn is_unknown_symbol(error: &YahooError) -> bool {
    error.code.as_deref() == Some("Not Found") || error.description.contains("No data found")
}

/// Turns the column-oriented chart payload into bars. Rows with a missing
/// close (holidays, halts) are skipped; a missing open/high/low falls back
/// to the close.
fn parse_chart(body: YahooChartResponse) -> Result<Vec<PriceBar>, PriceProviderError> {
    if let Some(error) = body.chart.error {
        if is_unknown_symbol(&error) {
            return Ok(Vec::new());
        }
        return Err(PriceProviderError::BadResponse(error.description));
    }

    let Some(result) = body.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };

    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Err(PriceProviderError::BadResponse("No quote data in response".into()));
    };

    if quote.close.len() != result.timestamp.len() {
        return Err(PriceProviderError::Parse(
            "Timestamp and close price arrays have different lengths".into(),
        ));
    }

    let column = |values: &[Option<f64>], i: usize| values.get(i).copied().flatten();

    let mut bars: Vec<PriceBar> = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            let close = column(&quote.close, i)?;
            let date = chrono::DateTime::from_timestamp(*ts, 0).map(|dt| dt.date_naive())?;
            Some(PriceBar {
                date,
                open: column(&quote.open, i).unwrap_or(close),
                high: column(&quote.high, i).unwrap_or(close),
                low: column(&quote.low, i).unwrap_or(close),
                close,
                volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
            })
        })
        .collect();

    bars.sort_by(|a, b| a.date.cmp(&b.date));
    Ok(bars)
}

#[async_trait]
impl PriceProvider for YahooFinanceProvider {
    async fn fetch_history(
        &self,
        symbol: &str,
        period: Period,
    ) -> Result<Vec<PriceBar>, PriceProviderError> {
        let url = format!("{}/{}", self.base_url, symbol);

        let resp = self
            .client
            .get(&url)
            .query(&[("interval", "1d"), ("range", period.token())])
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PriceProviderError::RateLimited);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            warn!("Yahoo Finance has no chart for {}", symbol);
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(PriceProviderError::BadResponse(format!("HTTP {}", status)));
        }

        let body: YahooChartResponse = resp
            .json()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        let bars = parse_chart(body)?;
        info!("Fetched {} bars for {} ({})", bars.len(), symbol, period);
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Vec<PriceBar>, PriceProviderError> {
        parse_chart(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_parse_chart_builds_sorted_bars_and_skips_gaps() {
        let bars = parse(
            r#"{"chart":{"result":[{
                "timestamp":[1721952000,1721865600,1721779200],
                "indicators":{"quote":[{
                    "open":[10.0,9.0,8.0],
                    "high":[11.0,null,8.5],
                    "low":[9.5,8.5,7.5],
                    "close":[10.5,null,8.2],
                    "volume":[100,200,null]
                }]}
            }],"error":null}}"#,
        )
        .unwrap();

        assert_eq!(bars.len(), 2);
        assert!(bars[0].date < bars[1].date);
        assert_eq!(bars[0].close, 8.2);
        assert_eq!(bars[0].volume, 0);
        assert_eq!(bars[1].high, 11.0);
    }

    #[test]
    fn test_unknown_symbol_is_empty_not_error() {
        let bars = parse(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#,
        )
        .unwrap();
        assert!(bars.is_empty());
    }

    #[test]
    fn test_other_api_errors_surface() {
        let err = parse(r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid range"}}}"#)
            .unwrap_err();
        assert!(matches!(err, PriceProviderError::BadResponse(_)));
    }
}
