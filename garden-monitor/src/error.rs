//! Error types shared by the evaluator, the hub client and the CLI.

use std::path::PathBuf;

/// Startup configuration problems. These are the only fatal errors: the
/// process stops before any check cycle runs.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Home Assistant token is missing (use --ha-token or GARDEN_MONITOR_HA_TOKEN)")]
    MissingToken,
    #[error("Invalid Home Assistant URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Config file {path} could not be read: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Config file {path} is not valid YAML: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Why a single entity fetch came back empty. Callers only see "not found";
/// the cause is kept for logging.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("hub unreachable: {0}")]
    Unreachable(String),
    #[error("hub answered HTTP {0}")]
    Protocol(u16),
    #[error("malformed entity payload: {0}")]
    Malformed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Report rendering failed: {0}")]
    Render(#[from] serde_json::Error),
}
