//! Configuration loading and validation.
//!
//! TOML-driven, following the teacher's pattern of a top-level `Config`
//! struct deserialized with `serde` and validated in a dedicated pass that
//! collects every error before refusing to start (rather than bailing on
//! the first).

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_name")]
    pub name: String,
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
    #[serde(default = "default_ws_addr")]
    pub ws_addr: String,
}

fn default_server_name() -> String {
    "ski-core".to_string()
}
fn default_metrics_port() -> u16 {
    9090
}
fn default_ws_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            log_format: LogFormat::default(),
            metrics_port: default_metrics_port(),
            ws_addr: default_ws_addr(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HotConfig {
    pub endpoint: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_hot_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_hot_timeout_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Deserialize)]
pub struct WarmConfig {
    pub dsn: String,
    #[serde(default = "default_warm_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_warm_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum TokenVerifierConfig {
    /// Fixed token → userId map, for tests and local development.
    Static { tokens: std::collections::HashMap<String, String> },
    /// Calls an external HTTP endpoint: `POST {url}` with the bearer
    /// token, expecting `{"userId": "...", "email": "..."}`.
    Http { url: String, #[serde(default = "default_warm_timeout_ms")] timeout_ms: u64 },
}

/// Tunables named in spec §6's environment configuration table.
#[derive(Debug, Clone, Deserialize)]
pub struct Tunables {
    #[serde(default = "default_ping_throttle_ms")]
    pub ping_throttle_ms: u64,
    #[serde(default = "default_proximity_radius_m")]
    pub proximity_radius_meters: f64,
    #[serde(default = "default_presence_ttl_s")]
    pub presence_ttl_seconds: u64,
    #[serde(default = "default_chat_cache_size")]
    pub chat_cache_size: usize,
    #[serde(default = "default_chat_cache_ttl_s")]
    pub chat_cache_ttl_seconds: u64,
    #[serde(default = "default_typing_ttl_s")]
    pub typing_ttl_seconds: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_batch_flush_ms")]
    pub batch_flush_ms: u64,
}

fn default_ping_throttle_ms() -> u64 {
    1000
}
fn default_proximity_radius_m() -> f64 {
    500.0
}
fn default_presence_ttl_s() -> u64 {
    300
}
fn default_chat_cache_size() -> usize {
    50
}
fn default_chat_cache_ttl_s() -> u64 {
    3600
}
fn default_typing_ttl_s() -> u64 {
    5
}
fn default_batch_size() -> usize {
    100
}
fn default_batch_flush_ms() -> u64 {
    5000
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            ping_throttle_ms: default_ping_throttle_ms(),
            proximity_radius_meters: default_proximity_radius_m(),
            presence_ttl_seconds: default_presence_ttl_s(),
            chat_cache_size: default_chat_cache_size(),
            chat_cache_ttl_seconds: default_chat_cache_ttl_s(),
            typing_ttl_seconds: default_typing_ttl_s(),
            batch_size: default_batch_size(),
            batch_flush_ms: default_batch_flush_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub hot: HotConfig,
    pub warm: WarmConfig,
    pub token_verifier: TokenVerifierConfig,
    #[serde(default)]
    pub tunables: Tunables,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&raw)?;
        Ok(config)
    }
}

/// Collects every validation problem instead of stopping at the first,
/// matching the teacher's `config::validate` convention.
pub fn validate(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.hot.endpoint.trim().is_empty() {
        errors.push("hot.endpoint must not be empty".to_string());
    }
    if config.warm.dsn.trim().is_empty() {
        errors.push("warm.dsn must not be empty".to_string());
    }
    if config.tunables.ping_throttle_ms == 0 {
        errors.push("tunables.ping_throttle_ms must be positive".to_string());
    }
    if config.tunables.proximity_radius_meters <= 0.0 {
        errors.push("tunables.proximity_radius_meters must be positive".to_string());
    }
    if config.tunables.chat_cache_size == 0 {
        errors.push("tunables.chat_cache_size must be positive".to_string());
    }
    if config.tunables.batch_size == 0 {
        errors.push("tunables.batch_size must be positive".to_string());
    }
    if let TokenVerifierConfig::Http { url, .. } = &config.token_verifier {
        if url.trim().is_empty() {
            errors.push("token_verifier.url must not be empty".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
