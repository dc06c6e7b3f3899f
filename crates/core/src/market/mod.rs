pub mod provider;
pub mod types;

use crate::domain::snapshot::PricePoint;

/// Failure taxonomy for the price/history endpoints. The forecast endpoint
/// deliberately has no error channel: the forward price is speculative and
/// its absence must never fail a polling cycle.
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),
    #[error("market data upstream failure: {0:#}")]
    Upstream(anyhow::Error),
}

impl From<anyhow::Error> for MarketError {
    fn from(err: anyhow::Error) -> Self {
        MarketError::Upstream(err)
    }
}

#[async_trait::async_trait]
pub trait MarketData: Send + Sync {
    async fn current_price(&self, symbol: &str, quote: &str) -> Result<f64, MarketError>;

    /// Hourly price points for the trailing window, ascending by timestamp.
    async fn recent_history(
        &self,
        symbol: &str,
        quote: &str,
        window_days: u32,
    ) -> Result<Vec<PricePoint>, MarketError>;

    /// Speculative 7-day forward price. `None` on any failure.
    async fn forecast_price(&self, symbol: &str, quote: &str) -> Option<f64>;
}
