pub mod domain;
pub mod engine;
pub mod llm;
pub mod market;
pub mod news;
pub mod storage;

pub mod config {
    pub const DEFAULT_COINGECKO_BASE_URL: &str = "https://api.coingecko.com";
    pub const DEFAULT_COINCODEX_BASE_URL: &str = "https://coincodex.com";
    pub const DEFAULT_NEWS_FEED_URL: &str =
        "https://min-api.cryptocompare.com/data/v2/news/?lang=EN";
    pub const DEFAULT_TRADE_LOG_PATH: &str = "trade_log.json";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub groq_api_key: Option<String>,
        pub groq_base_url: Option<String>,
        pub groq_model: Option<String>,
        pub coingecko_base_url: Option<String>,
        pub coincodex_base_url: Option<String>,
        pub news_feed_url: Option<String>,
        pub trade_log_path: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                groq_api_key: std::env::var("GROQ_API_KEY").ok(),
                groq_base_url: std::env::var("GROQ_BASE_URL").ok(),
                groq_model: std::env::var("GROQ_MODEL").ok(),
                coingecko_base_url: std::env::var("COINGECKO_BASE_URL").ok(),
                coincodex_base_url: std::env::var("COINCODEX_BASE_URL").ok(),
                news_feed_url: std::env::var("NEWS_FEED_URL").ok(),
                trade_log_path: std::env::var("TRADE_LOG_PATH").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            })
        }

        pub fn coingecko_base_url(&self) -> &str {
            self.coingecko_base_url
                .as_deref()
                .unwrap_or(DEFAULT_COINGECKO_BASE_URL)
        }

        pub fn coincodex_base_url(&self) -> &str {
            self.coincodex_base_url
                .as_deref()
                .unwrap_or(DEFAULT_COINCODEX_BASE_URL)
        }

        pub fn news_feed_url(&self) -> &str {
            self.news_feed_url.as_deref().unwrap_or(DEFAULT_NEWS_FEED_URL)
        }

        pub fn trade_log_path(&self) -> &str {
            self.trade_log_path
                .as_deref()
                .unwrap_or(DEFAULT_TRADE_LOG_PATH)
        }

        /// A key that is unset or blank counts as "not configured"; the
        /// decision engine then short-circuits to HOLD instead of calling out.
        pub fn groq_api_key(&self) -> Option<&str> {
            self.groq_api_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
        }
    }
}
