pub mod error;
pub mod groq;
pub mod prompt;

use crate::domain::decision::Decision;
use std::sync::Arc;

/// Raw response recorded when no completion client is configured. The engine
/// must still return a fully-formed outcome in that case so the loop never
/// blocks on a missing credential.
pub const MISSING_KEY_RESPONSE: &str = "Groq key missing — default HOLD";

#[derive(Debug, Clone)]
pub struct DecisionInput {
    pub headlines: Vec<String>,
    pub price: f64,
    pub forecast_price: Option<f64>,
    pub recent_prices: Vec<f64>,
    pub symbol: String,
    pub quote: String,
}

#[derive(Debug, Clone)]
pub struct DecisionOutcome {
    pub decision: Decision,
    pub prompt: String,
    pub raw_response: String,
}

#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    fn provider(&self) -> &'static str;

    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}

#[derive(Clone)]
pub struct DecisionEngine {
    client: Option<Arc<dyn CompletionClient>>,
}

impl DecisionEngine {
    pub fn new(client: Option<Arc<dyn CompletionClient>>) -> Self {
        Self { client }
    }

    pub async fn decide(&self, input: &DecisionInput) -> anyhow::Result<DecisionOutcome> {
        let prompt = prompt::compose(
            &input.headlines,
            input.price,
            input.forecast_price,
            &input.recent_prices,
            &input.symbol,
            &input.quote,
        );

        let Some(client) = &self.client else {
            return Ok(DecisionOutcome {
                decision: Decision::Hold,
                prompt,
                raw_response: MISSING_KEY_RESPONSE.to_string(),
            });
        };

        let raw_response = client.complete(&prompt).await?.trim().to_string();
        Ok(DecisionOutcome {
            decision: Decision::from_reply(&raw_response),
            prompt,
            raw_response,
        })
    }
}
