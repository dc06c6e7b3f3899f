use crate::config::Settings;
use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Headlines are advisory context for the decision prompt, never required for
/// correctness, so this interface cannot fail: any fetch or parse problem
/// yields an empty list.
#[async_trait::async_trait]
pub trait NewsFeed: Send + Sync {
    /// Most-recent-first, at most `limit` entries.
    async fn latest_headlines(&self, limit: usize) -> Vec<String>;
}

/// Reads a JSON feed whose entries carry at least a `title` field. The
/// payload shape is kept loose on purpose: a top-level array, or an object
/// with a `Data` or `entries` array, both work.
#[derive(Debug, Clone)]
pub struct HttpJsonNewsFeed {
    http: reqwest::Client,
    url: String,
}

impl HttpJsonNewsFeed {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let timeout_secs = std::env::var("NEWS_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build news feed http client")?;

        Ok(Self {
            http,
            url: settings.news_feed_url().to_string(),
        })
    }

    async fn fetch(&self) -> Result<Value> {
        let res = self
            .http
            .get(&self.url)
            .send()
            .await
            .context("news feed request failed")?
            .error_for_status()
            .context("news feed returned an error status")?;
        res.json().await.context("failed to parse news feed body")
    }
}

#[async_trait::async_trait]
impl NewsFeed for HttpJsonNewsFeed {
    async fn latest_headlines(&self, limit: usize) -> Vec<String> {
        match self.fetch().await {
            Ok(body) => extract_titles(&body, limit),
            Err(err) => {
                tracing::warn!(url = %self.url, error = %format!("{err:#}"), "news fetch failed; continuing without headlines");
                Vec::new()
            }
        }
    }
}

fn entries(body: &Value) -> Option<&Vec<Value>> {
    if let Some(list) = body.as_array() {
        return Some(list);
    }
    for key in ["Data", "entries"] {
        if let Some(list) = body.get(key).and_then(Value::as_array) {
            return Some(list);
        }
    }
    None
}

fn extract_titles(body: &Value, limit: usize) -> Vec<String> {
    let Some(list) = entries(body) else {
        return Vec::new();
    };
    list.iter()
        .filter_map(|entry| entry.get("title").and_then(Value::as_str))
        .map(str::to_string)
        .take(limit)
        .collect()
}
