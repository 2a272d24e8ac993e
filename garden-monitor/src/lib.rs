//! Garden Monitor - health checks for the garden automation system
//!
//! Polls the Home Assistant REST API and probes the MQTT broker, then judges
//! every configured device, sensor, switch and automation:
//! - Hub / broker reachability probes
//! - Per-entity classification (OK, STALE, DISABLED, ERROR)
//! - Category rollup and one overall status
//! - Text or JSON report rendering

pub mod broker;
pub mod classify;
pub mod config;
pub mod error;
pub mod health;
pub mod hub;
pub mod models;
pub mod report;

pub use broker::{BrokerPing, BrokerProbe, MqttProbe};
pub use config::MonitorConfig;
pub use error::{ConfigError, FetchError, MonitorError};
pub use health::HealthEvaluator;
pub use hub::{HubClient, HubPing, StateSource};
pub use models::{
    Category, CategoryStatus, CheckResult, EntityState, HealthReport, Issue, ItemOutcome, ItemStatus, OverallStatus,
};
pub use report::{render, ReportFormat};
