use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};
use nova_feed::domain::feed::{
    DEFAULT_ABOUT_TO_GRADUATE_PROGRESS, DEFAULT_DEX_ALLOWLIST, DEFAULT_NEWLY_CREATED_MAX_PROGRESS,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedCfg {
    pub endpoint: String,
    pub channel: String,
    pub token: String,
    pub connect_timeout_ms: u64,
}

impl Default for FeedCfg {
    fn default() -> Self {
        Self {
            endpoint: "wss://feed.nova.trade/ws".to_string(),
            channel: "cosmo".to_string(),
            token: String::new(),
            connect_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineCfg {
    pub flush_interval_ms: u64,
    pub about_to_graduate_progress: f64,
    pub newly_created_max_progress: f64,
    pub dex_allowlist: Vec<String>,
}

impl Default for PipelineCfg {
    fn default() -> Self {
        Self {
            flush_interval_ms: 1000,
            about_to_graduate_progress: DEFAULT_ABOUT_TO_GRADUATE_PROGRESS,
            newly_created_max_progress: DEFAULT_NEWLY_CREATED_MAX_PROGRESS,
            dex_allowlist: DEFAULT_DEX_ALLOWLIST.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListsCfg {
    pub max_len: usize,
    pub stats_interval_secs: u64,
}

impl Default for ListsCfg {
    fn default() -> Self {
        Self {
            max_len: 100,
            stats_interval_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub feed: FeedCfg,
    pub pipeline: PipelineCfg,
    pub lists: ListsCfg,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path.as_ref())
            .with_context(|| format!("read {}", path.as_ref().display()))?;
        Self::from_toml(&s)
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(s).context("parse Config.toml")?;
        Ok(cfg)
    }
}
