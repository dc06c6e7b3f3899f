use crate::domain::decision::Decision;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One hourly observation from the market-chart endpoint. Sequences are
/// ordered ascending by timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp_ms: i64,
    pub price: f64,
}

/// The fully-formed result of one polling cycle. A snapshot is never mutated
/// after publication; the next cycle replaces it wholesale. The only
/// exception is `status`, which `reconfigure` flips on the current snapshot
/// so the dashboard can show that new settings are pending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub snapshot_id: Uuid,
    pub time: DateTime<Utc>,
    pub symbol: String,
    pub quote: String,
    pub price: f64,
    #[serde(default)]
    pub forecast_price: Option<f64>,
    pub decision: Decision,
    pub prompt: String,
    pub raw_response: String,
    pub poll_interval_secs: u64,
    pub headlines: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}
