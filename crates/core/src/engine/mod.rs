pub mod state;

use crate::domain::snapshot::Snapshot;
use crate::engine::state::{SharedState, MIN_POLL_INTERVAL_SECS};
use crate::llm::{DecisionEngine, DecisionInput};
use crate::market::MarketData;
use crate::news::NewsFeed;
use crate::storage;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;

const HISTORY_WINDOW_DAYS: u32 = 1;
const RECENT_POINTS: usize = 6;
const HEADLINE_LIMIT: usize = 5;

/// The background worker. One cycle gathers inputs, asks for a decision and
/// publishes a snapshot; failures abandon the cycle and leave the previous
/// snapshot in place. The loop only exits on the shutdown signal.
pub struct TradingBot {
    state: SharedState,
    market: Arc<dyn MarketData>,
    news: Arc<dyn NewsFeed>,
    engine: DecisionEngine,
    log_path: PathBuf,
}

impl TradingBot {
    pub fn new(
        state: SharedState,
        market: Arc<dyn MarketData>,
        news: Arc<dyn NewsFeed>,
        engine: DecisionEngine,
        log_path: PathBuf,
    ) -> Self {
        Self {
            state,
            market,
            news,
            engine,
            log_path,
        }
    }

    pub fn state(&self) -> SharedState {
        self.state.clone()
    }

    /// One collect/fetch/decide/publish pass. The state lock is taken twice,
    /// briefly: once to read the config, once to publish; all network and
    /// disk I/O happens between those two points.
    pub async fn run_cycle(&self) -> Result<Snapshot> {
        let cfg = self.state.config().await;

        let price = self.market.current_price(&cfg.symbol, &cfg.quote).await?;
        let history = self
            .market
            .recent_history(&cfg.symbol, &cfg.quote, HISTORY_WINDOW_DAYS)
            .await?;
        let recent_prices: Vec<f64> = history[history.len().saturating_sub(RECENT_POINTS)..]
            .iter()
            .map(|p| p.price)
            .collect();
        let headlines = self.news.latest_headlines(HEADLINE_LIMIT).await;
        let forecast_price = self.market.forecast_price(&cfg.symbol, &cfg.quote).await;

        let outcome = self
            .engine
            .decide(&DecisionInput {
                headlines: headlines.clone(),
                price,
                forecast_price,
                recent_prices,
                symbol: cfg.symbol.clone(),
                quote: cfg.quote.clone(),
            })
            .await?;

        let snapshot = Snapshot {
            snapshot_id: Uuid::new_v4(),
            time: chrono::Utc::now(),
            symbol: cfg.symbol,
            quote: cfg.quote,
            price,
            forecast_price,
            decision: outcome.decision,
            prompt: outcome.prompt,
            raw_response: outcome.raw_response,
            poll_interval_secs: cfg.poll_interval_secs,
            headlines,
            status: None,
        };

        let log = self.state.publish(snapshot.clone()).await;
        if let Err(err) = storage::trade_log::persist(&self.log_path, &log).await {
            // Non-fatal: the in-memory log is authoritative and the next
            // cycle rewrites the file in full anyway.
            tracing::warn!(
                path = %self.log_path.display(),
                error = %format!("{err:#}"),
                "trade log write failed"
            );
        }

        Ok(snapshot)
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        loop {
            match self.run_cycle().await {
                Ok(snapshot) => tracing::info!(
                    symbol = %snapshot.symbol,
                    quote = %snapshot.quote,
                    price = snapshot.price,
                    decision = %snapshot.decision,
                    "published snapshot"
                ),
                Err(err) => tracing::error!(
                    error = %format!("{err:#}"),
                    "cycle failed; previous snapshot stays current"
                ),
            }

            let interval = self
                .state
                .config()
                .await
                .poll_interval_secs
                .max(MIN_POLL_INTERVAL_SECS);
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(interval)) => {}
                _ = shutdown.changed() => {
                    tracing::info!("trading loop stopped");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::decision::Decision;
    use crate::domain::snapshot::PricePoint;
    use crate::engine::state::BotConfig;
    use crate::llm::MISSING_KEY_RESPONSE;
    use crate::market::MarketError;

    struct StubMarket {
        price: f64,
        history: Vec<PricePoint>,
        forecast: Option<f64>,
    }

    #[async_trait::async_trait]
    impl MarketData for StubMarket {
        async fn current_price(&self, _symbol: &str, _quote: &str) -> Result<f64, MarketError> {
            Ok(self.price)
        }

        async fn recent_history(
            &self,
            _symbol: &str,
            _quote: &str,
            _window_days: u32,
        ) -> Result<Vec<PricePoint>, MarketError> {
            Ok(self.history.clone())
        }

        async fn forecast_price(&self, _symbol: &str, _quote: &str) -> Option<f64> {
            self.forecast
        }
    }

    struct FailingMarket;

    #[async_trait::async_trait]
    impl MarketData for FailingMarket {
        async fn current_price(&self, _symbol: &str, _quote: &str) -> Result<f64, MarketError> {
            Err(MarketError::Upstream(anyhow::anyhow!("boom")))
        }

        async fn recent_history(
            &self,
            _symbol: &str,
            _quote: &str,
            _window_days: u32,
        ) -> Result<Vec<PricePoint>, MarketError> {
            Err(MarketError::Upstream(anyhow::anyhow!("boom")))
        }

        async fn forecast_price(&self, _symbol: &str, _quote: &str) -> Option<f64> {
            None
        }
    }

    struct StaticNews(Vec<String>);

    #[async_trait::async_trait]
    impl NewsFeed for StaticNews {
        async fn latest_headlines(&self, limit: usize) -> Vec<String> {
            self.0.iter().take(limit).cloned().collect()
        }
    }

    fn points(prices: &[f64]) -> Vec<PricePoint> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &price)| PricePoint {
                timestamp_ms: 1_700_000_000_000 + (i as i64) * 3_600_000,
                price,
            })
            .collect()
    }

    fn temp_log_path() -> PathBuf {
        std::env::temp_dir().join(format!("coinpilot-test-{}.json", Uuid::new_v4()))
    }

    fn bot(market: Arc<dyn MarketData>, headlines: Vec<String>) -> TradingBot {
        TradingBot::new(
            SharedState::new(BotConfig::new("XRP", "USD", 60)),
            market,
            Arc::new(StaticNews(headlines)),
            DecisionEngine::new(None),
            temp_log_path(),
        )
    }

    #[tokio::test]
    async fn each_successful_cycle_appends_one_log_entry() {
        let bot = bot(
            Arc::new(StubMarket {
                price: 0.523,
                history: points(&[0.50, 0.51, 0.52]),
                forecast: Some(0.55),
            }),
            vec!["A".into(), "B".into()],
        );
        let state = bot.state();

        for n in 1..=3usize {
            bot.run_cycle().await.unwrap();
            let log = state.log().await;
            assert_eq!(log.len(), n);
            assert_eq!(
                log.last().unwrap().snapshot_id,
                state.snapshot().await.unwrap().snapshot_id
            );
        }

        let current = state.snapshot().await.unwrap();
        assert_eq!(current.price, 0.523);
        assert_eq!(current.forecast_price, Some(0.55));
        assert_eq!(current.decision, Decision::Hold);
        assert_eq!(current.raw_response, MISSING_KEY_RESPONSE);
        assert!(current
            .prompt
            .contains("Current Price XRP/USD: 0.523"));
        assert!(current.prompt.contains("7\u{2011}day Forecast: 0.550000"));
    }

    #[tokio::test]
    async fn failed_fetch_leaves_state_untouched() {
        let good = StubMarket {
            price: 1.0,
            history: points(&[1.0]),
            forecast: None,
        };
        let bot_ok = bot(Arc::new(good), vec![]);
        let state = bot_ok.state();
        bot_ok.run_cycle().await.unwrap();
        let before = state.snapshot().await.unwrap();

        let bot_bad = TradingBot::new(
            state.clone(),
            Arc::new(FailingMarket),
            Arc::new(StaticNews(vec![])),
            DecisionEngine::new(None),
            temp_log_path(),
        );
        assert!(bot_bad.run_cycle().await.is_err());

        assert_eq!(state.log().await.len(), 1);
        assert_eq!(
            state.snapshot().await.unwrap().snapshot_id,
            before.snapshot_id
        );
    }

    #[tokio::test]
    async fn absent_forecast_still_publishes() {
        let bot = bot(
            Arc::new(StubMarket {
                price: 2.5,
                history: points(&[2.4, 2.5]),
                forecast: None,
            }),
            vec![],
        );
        let snapshot = bot.run_cycle().await.unwrap();
        assert_eq!(snapshot.forecast_price, None);
        assert!(snapshot.prompt.contains("7\u{2011}day Forecast: N/A"));
    }

    #[tokio::test]
    async fn only_the_trailing_history_points_feed_the_prompt() {
        let bot = bot(
            Arc::new(StubMarket {
                price: 1.0,
                history: points(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8]),
                forecast: None,
            }),
            vec![],
        );
        let snapshot = bot.run_cycle().await.unwrap();
        assert!(snapshot.prompt.contains(
            "Recent Hourly Prices: 0.300000, 0.400000, 0.500000, 0.600000, 0.700000, 0.800000"
        ));
    }

    #[tokio::test]
    async fn reconfigure_applies_from_the_next_cycle() {
        let bot = bot(
            Arc::new(StubMarket {
                price: 1.0,
                history: points(&[1.0]),
                forecast: None,
            }),
            vec![],
        );
        let state = bot.state();

        let first = bot.run_cycle().await.unwrap();
        assert_eq!(first.symbol, "XRP");

        state.reconfigure("eth", "usd", 30).await;
        let second = bot.run_cycle().await.unwrap();
        assert_eq!(second.symbol, "ETH");
        assert_eq!(second.poll_interval_secs, 30);
        // The new snapshot starts clean; only the pre-reconfigure one was
        // flagged.
        assert_eq!(second.status, None);
    }
}
