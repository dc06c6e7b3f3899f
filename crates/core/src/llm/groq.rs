use crate::config::Settings;
use crate::llm::error::CompletionDiagnosticsError;
use crate::llm::CompletionClient;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.groq.com";
const DEFAULT_MODEL: &str = "allam-2-7b";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Groq's OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct GroqClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GroqClient {
    /// `Ok(None)` when no usable key is configured; the caller then runs the
    /// decision engine in its credential-less HOLD mode.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Option<Self>> {
        let Some(api_key) = settings.groq_api_key() else {
            return Ok(None);
        };

        let base_url = settings
            .groq_base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        let model = settings
            .groq_model
            .as_deref()
            .unwrap_or(DEFAULT_MODEL)
            .to_string();

        let timeout_secs = std::env::var("GROQ_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build groq http client")?;

        Ok(Some(Self {
            http,
            api_key: api_key.to_string(),
            base_url,
            model,
        }))
    }
}

#[async_trait::async_trait]
impl CompletionClient for GroqClient {
    fn provider(&self) -> &'static str {
        "groq"
    }

    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        let url = format!("{}/openai/v1/chat/completions", self.base_url);
        let req = ChatCompletionRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let res = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("groq request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read groq response body")?;
        if !status.is_success() {
            return Err(CompletionDiagnosticsError {
                provider: "groq",
                stage: "http",
                detail: format!("status={status}"),
                raw_output: Some(text),
            }
            .into());
        }

        let parsed = serde_json::from_str::<ChatCompletionResponse>(&text)
            .with_context(|| format!("failed to parse groq response: {text}"))?;
        let first = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionDiagnosticsError {
                provider: "groq",
                stage: "choices",
                detail: "response contained no choices".to_string(),
                raw_output: Some(text),
            })?;
        Ok(first.message.content)
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Clone, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChoiceMessage {
    content: String,
}
