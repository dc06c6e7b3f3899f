use crate::domain::snapshot::Snapshot;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const MIN_POLL_INTERVAL_SECS: u64 = 5;
pub const STATUS_RECONFIGURED: &str = "reconfigured";

/// Mutable loop configuration. Normalized on construction: symbols and quote
/// currencies are upper-cased, the interval never drops below the floor.
#[derive(Debug, Clone, Serialize)]
pub struct BotConfig {
    pub symbol: String,
    pub quote: String,
    pub poll_interval_secs: u64,
}

impl BotConfig {
    pub fn new(symbol: &str, quote: &str, poll_interval_secs: u64) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            quote: quote.trim().to_uppercase(),
            poll_interval_secs: poll_interval_secs.max(MIN_POLL_INTERVAL_SECS),
        }
    }
}

#[derive(Debug)]
struct BotState {
    config: BotConfig,
    snapshot: Option<Snapshot>,
    log: Vec<Snapshot>,
}

/// The one lock guarding configuration, the current snapshot and the log.
/// Holders only ever copy data in or out; nothing awaited under the lock
/// touches the network or disk, so readers never wait on a slow upstream.
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<Mutex<BotState>>,
}

impl SharedState {
    pub fn new(config: BotConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BotState {
                config,
                snapshot: None,
                log: Vec::new(),
            })),
        }
    }

    pub async fn config(&self) -> BotConfig {
        self.inner.lock().await.config.clone()
    }

    /// `None` until the first successful cycle publishes.
    pub async fn snapshot(&self) -> Option<Snapshot> {
        self.inner.lock().await.snapshot.clone()
    }

    pub async fn log(&self) -> Vec<Snapshot> {
        self.inner.lock().await.log.clone()
    }

    /// Atomically swaps in the new configuration and flags the current
    /// snapshot, so readers can tell a reconfigure is pending before the next
    /// cycle picks it up. An in-flight cycle is not interrupted.
    pub async fn reconfigure(&self, symbol: &str, quote: &str, poll_interval_secs: u64) -> BotConfig {
        let mut state = self.inner.lock().await;
        state.config = BotConfig::new(symbol, quote, poll_interval_secs);
        if let Some(snapshot) = state.snapshot.as_mut() {
            snapshot.status = Some(STATUS_RECONFIGURED.to_string());
        }
        state.config.clone()
    }

    /// Replaces the current snapshot and appends it to the log in one
    /// critical section, keeping "log tail == current snapshot" true at every
    /// instant. Returns a copy of the log for persistence outside the lock.
    pub async fn publish(&self, snapshot: Snapshot) -> Vec<Snapshot> {
        let mut state = self.inner.lock().await;
        state.snapshot = Some(snapshot.clone());
        state.log.push(snapshot);
        state.log.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::decision::Decision;
    use chrono::Utc;
    use uuid::Uuid;

    fn snapshot(symbol: &str) -> Snapshot {
        Snapshot {
            snapshot_id: Uuid::new_v4(),
            time: Utc::now(),
            symbol: symbol.to_string(),
            quote: "USD".to_string(),
            price: 1.0,
            forecast_price: None,
            decision: Decision::Hold,
            prompt: String::new(),
            raw_response: String::new(),
            poll_interval_secs: 60,
            headlines: Vec::new(),
            status: None,
        }
    }

    #[test]
    fn config_normalizes_case_and_interval_floor() {
        let cfg = BotConfig::new(" xrp ", "usd", 1);
        assert_eq!(cfg.symbol, "XRP");
        assert_eq!(cfg.quote, "USD");
        assert_eq!(cfg.poll_interval_secs, MIN_POLL_INTERVAL_SECS);
    }

    #[tokio::test]
    async fn publish_keeps_log_tail_equal_to_current_snapshot() {
        let state = SharedState::new(BotConfig::new("XRP", "USD", 60));
        assert!(state.snapshot().await.is_none());
        assert!(state.log().await.is_empty());

        for i in 0..3 {
            state.publish(snapshot("XRP")).await;
            let log = state.log().await;
            assert_eq!(log.len(), i + 1);
            let current = state.snapshot().await.unwrap();
            assert_eq!(log.last().unwrap().snapshot_id, current.snapshot_id);
        }
    }

    #[tokio::test]
    async fn reconfigure_marks_current_snapshot_and_swaps_config() {
        let state = SharedState::new(BotConfig::new("XRP", "USD", 60));
        state.publish(snapshot("XRP")).await;

        let cfg = state.reconfigure("eth", "eur", 2).await;
        assert_eq!(cfg.symbol, "ETH");
        assert_eq!(cfg.quote, "EUR");
        assert_eq!(cfg.poll_interval_secs, MIN_POLL_INTERVAL_SECS);

        let current = state.snapshot().await.unwrap();
        assert_eq!(current.status.as_deref(), Some(STATUS_RECONFIGURED));
        // The published snapshot itself still describes the old pair.
        assert_eq!(current.symbol, "XRP");
    }
}
