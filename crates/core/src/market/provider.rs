use crate::config::Settings;
use crate::domain::snapshot::PricePoint;
use crate::market::types::{CoinListing, MarketChartResponse, SimplePriceResponse};
use crate::market::{MarketData, MarketError};
use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const LISTING_TIMEOUT_SECS: u64 = 20;

/// CoinGecko for price and hourly history, CoinCodex for the speculative
/// 7-day forward price. Symbols are resolved through a case-insensitive
/// ticker -> provider-id map built once from the full coins listing.
#[derive(Debug, Clone)]
pub struct HttpMarketData {
    http: reqwest::Client,
    gecko_base_url: String,
    codex_base_url: String,
    symbols: HashMap<String, String>,
}

impl HttpMarketData {
    /// Builds the client and fetches the symbol listing. A listing failure
    /// here is fatal to the process: no symbol can be resolved without it.
    pub async fn connect(settings: &Settings) -> Result<Self> {
        let timeout_secs = std::env::var("MARKET_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build market data http client")?;

        let gecko_base_url = settings.coingecko_base_url().trim_end_matches('/').to_string();
        let codex_base_url = settings.coincodex_base_url().trim_end_matches('/').to_string();

        let listing_url = format!("{gecko_base_url}/api/v3/coins/list");
        let listings: Vec<CoinListing> = http
            .get(&listing_url)
            .timeout(Duration::from_secs(LISTING_TIMEOUT_SECS))
            .send()
            .await
            .context("symbol listing request failed")?
            .error_for_status()
            .context("symbol listing returned an error status")?
            .json()
            .await
            .context("failed to parse symbol listing")?;

        let symbols = build_symbol_map(listings);
        tracing::info!(symbols = symbols.len(), "symbol map loaded");

        Ok(Self {
            http,
            gecko_base_url,
            codex_base_url,
            symbols,
        })
    }

    fn resolve(&self, symbol: &str) -> Result<&str, MarketError> {
        self.symbols
            .get(&symbol.to_uppercase())
            .map(String::as_str)
            .ok_or_else(|| MarketError::UnknownSymbol(symbol.to_string()))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let res = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .with_context(|| format!("failed to read response body from {url}"))?;
        if !status.is_success() {
            anyhow::bail!("{url} returned HTTP {status}: {text}");
        }

        serde_json::from_str::<T>(&text)
            .with_context(|| format!("failed to parse response from {url}: {text}"))
    }

    async fn forecast_inner(&self, symbol: &str, quote: &str) -> Result<Option<f64>> {
        let url = format!(
            "{}/api/coindata/{}",
            self.codex_base_url,
            symbol.to_lowercase()
        );
        let body: Value = self.get_json(&url).await?;
        let pred = body
            .get("predictions")
            .and_then(|p| p.get("price_prediction_7d"))
            .context("price_prediction_7d missing from forecast payload")?;
        let pred_usd = prediction_value(pred).context("price_prediction_7d is not numeric")?;

        if quote.eq_ignore_ascii_case("USD") {
            return Ok(Some(pred_usd));
        }

        // The prediction is quoted in USD; cross through the current prices
        // to re-quote it.
        let cur_quote = self.current_price(symbol, quote).await?;
        let cur_usd = self.current_price(symbol, "USD").await?;
        Ok(requote_forecast(pred_usd, cur_usd, cur_quote))
    }

    #[cfg(test)]
    fn with_symbols(symbols: HashMap<String, String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            gecko_base_url: String::new(),
            codex_base_url: String::new(),
            symbols,
        }
    }
}

#[async_trait::async_trait]
impl MarketData for HttpMarketData {
    async fn current_price(&self, symbol: &str, quote: &str) -> Result<f64, MarketError> {
        let id = self.resolve(symbol)?;
        let vs = quote.to_lowercase();
        let url = format!(
            "{}/api/v3/simple/price?ids={id}&vs_currencies={vs}",
            self.gecko_base_url
        );
        let body: SimplePriceResponse = self.get_json(&url).await?;
        price_from_response(&body, id, &vs).ok_or_else(|| {
            MarketError::Upstream(anyhow::anyhow!(
                "price for {id}/{vs} missing from simple/price response"
            ))
        })
    }

    async fn recent_history(
        &self,
        symbol: &str,
        quote: &str,
        window_days: u32,
    ) -> Result<Vec<PricePoint>, MarketError> {
        let id = self.resolve(symbol)?;
        let url = format!(
            "{}/api/v3/coins/{id}/market_chart?vs_currency={}&days={window_days}&interval=hourly",
            self.gecko_base_url,
            quote.to_lowercase()
        );
        let body: MarketChartResponse = self.get_json(&url).await?;
        Ok(chart_points(body))
    }

    async fn forecast_price(&self, symbol: &str, quote: &str) -> Option<f64> {
        match self.forecast_inner(symbol, quote).await {
            Ok(forecast) => forecast,
            Err(err) => {
                tracing::debug!(symbol, quote, error = %format!("{err:#}"), "forecast unavailable");
                None
            }
        }
    }
}

/// Later listing entries overwrite earlier ones when tickers collide, so a
/// duplicated ticker resolves to the last id the provider returned.
pub fn build_symbol_map(listings: Vec<CoinListing>) -> HashMap<String, String> {
    let mut map = HashMap::with_capacity(listings.len());
    for listing in listings {
        map.insert(listing.symbol.to_uppercase(), listing.id);
    }
    map
}

fn price_from_response(body: &SimplePriceResponse, id: &str, vs: &str) -> Option<f64> {
    body.get(id).and_then(|quotes| quotes.get(vs)).copied()
}

fn chart_points(chart: MarketChartResponse) -> Vec<PricePoint> {
    chart
        .prices
        .into_iter()
        .map(|(ts, price)| PricePoint {
            timestamp_ms: ts as i64,
            price,
        })
        .collect()
}

/// CoinCodex serves the prediction either as a number or a numeric string.
fn prediction_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn requote_forecast(pred_usd: f64, cur_usd: f64, cur_quote: f64) -> Option<f64> {
    if cur_usd == 0.0 {
        return None;
    }
    Some(pred_usd / cur_usd * cur_quote)
}
