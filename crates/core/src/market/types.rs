use serde::Deserialize;
use std::collections::HashMap;

/// One entry of the CoinGecko `/api/v3/coins/list` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinListing {
    pub id: String,
    pub symbol: String,
}

/// `/api/v3/simple/price` payload: provider id -> quote currency -> price.
pub type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

/// `/api/v3/coins/{id}/market_chart` payload. Timestamps arrive as float
/// milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketChartResponse {
    #[serde(default)]
    pub prices: Vec<(f64, f64)>,
}
