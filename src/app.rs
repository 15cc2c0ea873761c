// src/app.rs
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use nova_feed::application::{FeedPipeline, FeedRunner, MemoryListStore, PauseFlags, PipelineConfig};
use nova_feed::domain::feed::{ClassifierConfig, SystemClock};
use nova_feed::infrastructure::websocket::{ConnectionConfig, ConnectionManager};
use nova_feed::shared::types::Category;

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct AppCfg {
    pub endpoint: String,
    pub channel: String,
    pub token: String,
    pub connect_timeout_ms: u64,
    pub flush_interval_ms: u64,
    pub about_to_graduate_progress: f64,
    pub newly_created_max_progress: f64,
    pub dex_allowlist: Vec<String>,
    pub max_list_len: usize,
    pub stats_interval_secs: u64,
    pub duration_secs: Option<u64>,
}

impl AppCfg {
    pub fn from_config(cfg: Config) -> Self {
        Self {
            endpoint: cfg.feed.endpoint,
            channel: cfg.feed.channel,
            token: cfg.feed.token,
            connect_timeout_ms: cfg.feed.connect_timeout_ms,
            flush_interval_ms: cfg.pipeline.flush_interval_ms,
            about_to_graduate_progress: cfg.pipeline.about_to_graduate_progress,
            newly_created_max_progress: cfg.pipeline.newly_created_max_progress,
            dex_allowlist: cfg.pipeline.dex_allowlist,
            max_list_len: cfg.lists.max_len,
            stats_interval_secs: cfg.lists.stats_interval_secs,
            duration_secs: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.endpoint.starts_with("ws://") || self.endpoint.starts_with("wss://")) {
            anyhow::bail!("feed endpoint must be a ws:// or wss:// URL, got {}", self.endpoint);
        }
        if self.flush_interval_ms == 0 {
            anyhow::bail!("flush interval must be greater than zero");
        }
        if self.stats_interval_secs == 0 {
            anyhow::bail!("stats interval must be greater than zero");
        }
        if self.dex_allowlist.is_empty() {
            warn!("Dex allow-list is empty, no token will ever be classified as graduated");
        }
        Ok(())
    }

    fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            endpoint: self.endpoint.clone(),
            channel: self.channel.clone(),
            token: self.token.clone(),
            connect_timeout_ms: self.connect_timeout_ms,
        }
    }

    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            flush_interval: Duration::from_millis(self.flush_interval_ms),
            classifier: ClassifierConfig {
                about_to_graduate_progress: self.about_to_graduate_progress,
                newly_created_max_progress: self.newly_created_max_progress,
                dex_allowlist: self.dex_allowlist.clone(),
            },
        }
    }
}

pub async fn run(app_cfg: AppCfg) -> Result<()> {
    app_cfg.validate()?;
    info!(
        endpoint = %app_cfg.endpoint,
        channel = %app_cfg.channel,
        flush_interval_ms = app_cfg.flush_interval_ms,
        allowlist = ?app_cfg.dex_allowlist,
        "Starting Nova token feed"
    );

    let flags = PauseFlags::new();
    let pipeline = FeedPipeline::new(
        app_cfg.pipeline_config(),
        MemoryListStore::new(app_cfg.max_list_len),
        flags,
        Arc::new(SystemClock),
    );
    let connection = ConnectionManager::new(app_cfg.connection_config());
    let mut runner = FeedRunner::new(
        connection,
        pipeline,
        Duration::from_secs(app_cfg.stats_interval_secs),
    );

    let duration = app_cfg.duration_secs;
    let shutdown = async move {
        match duration {
            Some(secs) => {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(secs)) => info!(secs, "Run duration elapsed"),
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            None => {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "Failed to listen for Ctrl-C");
                    std::future::pending::<()>().await;
                }
            }
        }
    };

    let reason = runner.run_until(shutdown).await?;

    let store = runner.pipeline().store();
    for category in Category::ALL {
        info!(
            %category,
            tokens = store.len(category),
            changes = store.changed_count(category),
            "Final list state"
        );
    }
    info!(?reason, "Nova token feed finished");
    Ok(())
}
