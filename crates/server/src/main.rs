use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coinpilot_core::domain::snapshot::{PricePoint, Snapshot};
use coinpilot_core::engine::state::{BotConfig, SharedState};
use coinpilot_core::engine::TradingBot;
use coinpilot_core::llm::groq::GroqClient;
use coinpilot_core::llm::{CompletionClient, DecisionEngine};
use coinpilot_core::market::provider::HttpMarketData;
use coinpilot_core::market::MarketData;
use coinpilot_core::news::HttpJsonNewsFeed;

const HISTORY_WINDOW_DAYS: u32 = 1;

#[derive(Debug, Parser)]
#[command(name = "coinpilot_server")]
struct Args {
    /// Tracked ticker symbol.
    #[arg(long, default_value = "XRP")]
    symbol: String,

    /// Quote currency.
    #[arg(long, default_value = "USD")]
    quote: String,

    /// Polling interval in seconds (floor of 5 applies).
    #[arg(long, default_value_t = 60)]
    interval_secs: u64,

    #[arg(long, default_value_t = 5000)]
    port: u16,

    /// Trade log path; falls back to TRADE_LOG_PATH, then trade_log.json.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Run a single polling cycle, print the snapshot as JSON, and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = coinpilot_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    // The symbol map is a hard startup requirement: nothing can be resolved
    // without it.
    let market: Arc<dyn MarketData> = match HttpMarketData::connect(&settings).await {
        Ok(provider) => Arc::new(provider),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %format!("{e:#}"), "symbol listing fetch failed; cannot start");
            return Err(e);
        }
    };

    let news = Arc::new(HttpJsonNewsFeed::from_settings(&settings)?);
    let completion: Option<Arc<dyn CompletionClient>> = GroqClient::from_settings(&settings)?
        .map(|client| Arc::new(client) as Arc<dyn CompletionClient>);
    match &completion {
        Some(client) => tracing::info!(provider = client.provider(), "completion client configured"),
        None => tracing::warn!("GROQ_API_KEY not set; every decision will default to HOLD"),
    }
    let engine = DecisionEngine::new(completion);

    let state = SharedState::new(BotConfig::new(&args.symbol, &args.quote, args.interval_secs));
    let log_path = args
        .log_file
        .unwrap_or_else(|| PathBuf::from(settings.trade_log_path()));
    let bot = TradingBot::new(
        state.clone(),
        market.clone(),
        news,
        engine,
        log_path,
    );

    if args.once {
        let snapshot = bot.run_cycle().await?;
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let bot_task = tokio::spawn(bot.run(shutdown_rx));

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/", get(index))
        .route("/api/latest", get(get_latest))
        .route("/api/log", get(get_log))
        .route("/api/history", get(get_history))
        .route("/api/config", post(post_config))
        .with_state(AppState { state, market })
        .layer(TraceLayer::new_for_http());

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], args.port));
    tracing::info!(%addr, "server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    let _ = bot_task.await;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn index() -> Html<&'static str> {
    Html(include_str!("dashboard.html"))
}

#[derive(Clone)]
struct AppState {
    state: SharedState,
    market: Arc<dyn MarketData>,
}

async fn get_latest(State(app): State<AppState>) -> Result<Json<Snapshot>, StatusCode> {
    app.state
        .snapshot()
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn get_log(State(app): State<AppState>) -> Json<Vec<Snapshot>> {
    Json(app.state.log().await)
}

async fn get_history(State(app): State<AppState>) -> Result<Json<Vec<PricePoint>>, StatusCode> {
    let cfg = app.state.config().await;
    app.market
        .recent_history(&cfg.symbol, &cfg.quote, HISTORY_WINDOW_DAYS)
        .await
        .map(Json)
        .map_err(|err| {
            tracing::warn!(symbol = %cfg.symbol, quote = %cfg.quote, error = %err, "history fetch failed");
            StatusCode::BAD_GATEWAY
        })
}

#[derive(Debug, Deserialize)]
struct ConfigRequest {
    symbol: String,
    #[serde(default = "default_quote")]
    quote: String,
    #[serde(default = "default_interval_secs")]
    interval_secs: u64,
}

fn default_quote() -> String {
    "USD".to_string()
}

fn default_interval_secs() -> u64 {
    60
}

async fn post_config(
    State(app): State<AppState>,
    Json(req): Json<ConfigRequest>,
) -> Json<BotConfig> {
    let cfg = app
        .state
        .reconfigure(&req.symbol, &req.quote, req.interval_secs)
        .await;
    tracing::info!(symbol = %cfg.symbol, quote = %cfg.quote, interval_secs = cfg.poll_interval_secs, "reconfigured");
    Json(cfg)
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &coinpilot_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
