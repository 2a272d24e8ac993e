//! Monitor configuration: hub + broker connection settings, thresholds and
//! the fixed entity lists. Immutable once loaded; injected into the evaluator.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

pub const CONFIG_ENV: &str = "GARDEN_MONITOR_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "garden-monitor.yaml";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct MonitorConfig {
    pub hub: HubConfig,
    pub broker: BrokerConfig,
    pub thresholds: Thresholds,
    pub entities: EntityLists,
    pub interval_secs: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct HubConfig {
    pub url: String,
    /// Long-lived access token. Usually passed on the command line instead.
    #[serde(skip_serializing)]
    pub token: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub client_id: Option<String>,
    /// How long to wait for the connect acknowledgment.
    pub ack_timeout_secs: u64,
    pub keep_alive_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Thresholds {
    pub sensor_stale_minutes: i64,
}

/// Entities checked every cycle. Devices are controller names; the others
/// are full hub entity ids.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EntityLists {
    pub devices: Vec<String>,
    pub sensors: Vec<String>,
    pub switches: Vec<String>,
    pub automations: Vec<String>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8123".into(),
            token: String::new(),
            timeout_secs: 10,
        }
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 1883,
            username: None,
            password: None,
            client_id: None,
            ack_timeout_secs: 2,
            keep_alive_secs: 10,
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { sensor_stale_minutes: 15 }
    }
}

impl Default for EntityLists {
    fn default() -> Self {
        fn owned(ids: &[&str]) -> Vec<String> {
            ids.iter().map(|s| s.to_string()).collect()
        }

        Self {
            devices: owned(&[
                "esp32-garden-zone-a",
                "esp32-garden-zone-b",
                "esp32-utility-control",
            ]),
            sensors: owned(&[
                "sensor.zone_a_soil_moisture",
                "sensor.zone_b_soil_moisture",
                "sensor.water_tank_level",
                "sensor.main_flow_rate",
                "sensor.nws_weather_temperature",
            ]),
            switches: owned(&[
                "switch.zone_a_valve",
                "switch.zone_b_valve",
                "switch.water_pump",
                "switch.main_water_valve",
            ]),
            automations: owned(&[
                "automation.morning_watering_schedule",
                "automation.freeze_protection_trigger",
                "automation.leak_detection_emergency_shutoff",
                "automation.low_water_tank_alert",
            ]),
        }
    }
}

impl BrokerConfig {
    /// Credentials are only sent when both halves are present and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Some((u, p)),
            _ => None,
        }
    }
}

impl Thresholds {
    /// One week.
    pub const MAX_SENSOR_STALE_MINUTES: i64 = 7 * 24 * 60;

    /// Clamped to `1..=MAX_SENSOR_STALE_MINUTES`; `validate` rejects values
    /// outside that range before any cycle runs.
    pub fn sensor_stale(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.sensor_stale_minutes.clamp(1, Self::MAX_SENSOR_STALE_MINUTES))
    }
}

impl MonitorConfig {
    pub const DEFAULT_INTERVAL_SECS: u64 = 300;

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs.unwrap_or(Self::DEFAULT_INTERVAL_SECS)
    }

    /// Load from `path`, else `$GARDEN_MONITOR_CONFIG`, else
    /// `./garden-monitor.yaml`. Only the implicit default file may be absent.
    pub async fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from));

        let path = match explicit {
            Some(p) => p,
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    info!("No {} found, using built-in garden configuration", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                default
            }
        };

        let txt = fs::read_to_string(&path)
            .await
            .map_err(|source| ConfigError::Io { path: path.clone(), source })?;
        let config = Self::from_yaml(&txt).map_err(|source| ConfigError::Parse { path: path.clone(), source })?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml(txt: &str) -> Result<Self, serde_yaml::Error> {
        if txt.trim().is_empty() {
            warn!("Config file is empty, using built-in garden configuration");
            return Ok(Self::default());
        }
        serde_yaml::from_str(txt)
    }

    /// Rejects anything that would make every cycle meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hub.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }

        let url = reqwest::Url::parse(&self.hub.url).map_err(|e| ConfigError::InvalidUrl {
            url: self.hub.url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                url: self.hub.url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        if self.hub.timeout_secs == 0 {
            return Err(ConfigError::Invalid("hub.timeout_secs must be > 0".into()));
        }
        if self.broker.ack_timeout_secs == 0 {
            return Err(ConfigError::Invalid("broker.ack_timeout_secs must be > 0".into()));
        }
        if self.broker.host.trim().is_empty() {
            return Err(ConfigError::Invalid("broker.host must not be empty".into()));
        }
        if !(1..=Thresholds::MAX_SENSOR_STALE_MINUTES).contains(&self.thresholds.sensor_stale_minutes) {
            return Err(ConfigError::Invalid(format!(
                "thresholds.sensor_stale_minutes must be between 1 and {}",
                Thresholds::MAX_SENSOR_STALE_MINUTES
            )));
        }
        if self.interval_secs() == 0 {
            return Err(ConfigError::Invalid("interval_secs must be > 0".into()));
        }
        Ok(())
    }
}
