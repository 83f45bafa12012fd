//! Process configuration.
//!
//! Everything here is read once at startup and passed explicitly to the
//! components that need it. Defaults match the deployed Buffalo-area
//! installation; environment variables override individual fields.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use serde::Deserialize;

/// Flow-data provider settings.
#[derive(Debug, Clone, Deserialize)]
pub struct FlowConfig {
    /// Base URL of the flow endpoint.
    pub base_url: String,
    /// Provider API key.
    pub api_key: String,
    /// Search radius around each town centre, in meters.
    pub radius_m: u32,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            base_url: "https://data.traffic.hereapi.com/v7/flow".to_string(),
            api_key: String::new(),
            radius_m: 500,
        }
    }
}

/// Completion-provider settings for narrative generation.
#[derive(Debug, Clone, Deserialize)]
pub struct NarrativeConfig {
    /// Chat-completions endpoint URL.
    pub api_url: String,
    /// Bearer token for the provider.
    pub api_key: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Maximum completion tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
    /// Whether narrative generation is enabled at all.
    pub enabled: bool,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.x.ai/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "grok-beta".to_string(),
            max_tokens: 300,
            temperature: 0.7,
            enabled: false,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Directory for persisted snapshot files.
    pub data_dir: PathBuf,
    /// Flow-data provider settings.
    pub flow: FlowConfig,
    /// Narrative provider settings.
    pub narrative: NarrativeConfig,
    /// Date the savings window ends on. The window start is derived from the
    /// timeframe, so this pins the whole calculation.
    pub evaluation_date: NaiveDate,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], 5000).into(),
            data_dir: PathBuf::from("data"),
            flow: FlowConfig::default(),
            narrative: NarrativeConfig::default(),
            evaluation_date: NaiveDate::from_ymd_opt(2025, 3, 9).unwrap(),
        }
    }
}

impl Config {
    /// Build a config from defaults plus environment overrides.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Config::default();

        if let Ok(addr) = std::env::var("SIGNAL_SAVINGS_BIND") {
            config.bind_addr = addr
                .parse()
                .with_context(|| format!("invalid SIGNAL_SAVINGS_BIND: {addr}"))?;
        }
        if let Ok(dir) = std::env::var("SIGNAL_SAVINGS_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(date) = std::env::var("SIGNAL_SAVINGS_EVAL_DATE") {
            config.evaluation_date = date
                .parse()
                .with_context(|| format!("invalid SIGNAL_SAVINGS_EVAL_DATE: {date}"))?;
        }

        if let Ok(url) = std::env::var("FLOW_API_URL") {
            config.flow.base_url = url;
        }
        if let Ok(key) = std::env::var("FLOW_API_KEY") {
            config.flow.api_key = key;
        }

        if let Ok(url) = std::env::var("NARRATIVE_API_URL") {
            config.narrative.api_url = url;
        }
        if let Ok(key) = std::env::var("NARRATIVE_API_KEY") {
            // A configured key enables narratives unless explicitly disabled.
            config.narrative.enabled = !key.is_empty();
            config.narrative.api_key = key;
        }
        if let Ok(model) = std::env::var("NARRATIVE_MODEL") {
            config.narrative.model = model;
        }
        if let Ok(enabled) = std::env::var("NARRATIVE_ENABLED") {
            config.narrative.enabled = matches!(enabled.as_str(), "1" | "true" | "yes");
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.flow.radius_m, 500);
        assert_eq!(config.narrative.max_tokens, 300);
        assert!(!config.narrative.enabled);
        assert_eq!(
            config.evaluation_date,
            NaiveDate::from_ymd_opt(2025, 3, 9).unwrap()
        );
    }
}
