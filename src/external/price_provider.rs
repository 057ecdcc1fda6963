use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Period, PriceBar};

#[derive(Debug, Error)]
pub enum PriceProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Daily OHLCV bars for `symbol`, oldest first.
    ///
    /// An unknown symbol is not an error: implementations return an empty
    /// vector and leave it to the caller to warn the user.
    async fn fetch_history(
        &self,
        symbol: &str,
        period: Period,
    ) -> Result<Vec<PriceBar>, PriceProviderError>;
}
