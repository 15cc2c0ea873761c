mod app;
mod config;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Nova real-time token feed: classifies live token updates into dashboard lists")]
struct Args {
    /// Path to config file (optional)
    #[arg(long)]
    config: Option<String>,

    /// Websocket endpoint of the token feed (overrides config)
    #[arg(long)]
    endpoint: Option<String>,

    /// Subscription channel name (overrides config)
    #[arg(long)]
    channel: Option<String>,

    /// Auth token sent with the subscription (overrides config)
    #[arg(long)]
    token: Option<String>,

    /// Queue flush interval in milliseconds (overrides config)
    #[arg(long)]
    flush_interval_ms: Option<u64>,

    /// Log filter, e.g. "info" or "nova_feed=debug"
    #[arg(long)]
    log_level: Option<String>,

    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long)]
    duration_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = match &args.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Priority: CLI args > Config file > Defaults
    let base_config = match &args.config {
        Some(path) => config::Config::from_file(path)?,
        None => config::Config::default(),
    };
    let mut app_cfg = app::AppCfg::from_config(base_config);

    if let Some(endpoint) = args.endpoint {
        app_cfg.endpoint = endpoint;
    }
    if let Some(channel) = args.channel {
        app_cfg.channel = channel;
    }
    if let Some(token) = args.token {
        app_cfg.token = token;
    }
    if let Some(flush_interval_ms) = args.flush_interval_ms {
        app_cfg.flush_interval_ms = flush_interval_ms;
    }
    app_cfg.duration_secs = args.duration_secs;

    app::run(app_cfg).await
}
