//! HealthEvaluator: probes, per-category checks and the overall rollup.
//!
//! One call to [`HealthEvaluator::evaluate`] is one cycle. Checks run one
//! after the other in a fixed order; a failing check never stops the next.

use crate::broker::{BrokerPing, BrokerProbe};
use crate::classify;
use crate::config::MonitorConfig;
use crate::hub::{HubPing, StateSource};
use crate::models::{Category, CategoryStatus, CheckResult, EntityState, HealthReport, ItemOutcome, ItemStatus};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::{info, warn};

pub struct HealthEvaluator<S, B> {
    config: MonitorConfig,
    hub: S,
    broker: B,
}

impl<S: StateSource, B: BrokerProbe> HealthEvaluator<S, B> {
    pub fn new(config: MonitorConfig, hub: S, broker: B) -> Self {
        Self { config, hub, broker }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Runs every check against the wall clock. Sensor ages are measured
    /// when the sensor check starts, after both probes have returned.
    pub async fn evaluate(&self) -> HealthReport {
        self.run_cycle(None).await
    }

    /// Runs every check, judging sensor freshness against `now`.
    pub async fn evaluate_at(&self, now: DateTime<Utc>) -> HealthReport {
        self.run_cycle(Some(now)).await
    }

    async fn run_cycle(&self, clock: Option<DateTime<Utc>>) -> HealthReport {
        let started = clock.unwrap_or_else(Utc::now);
        let hub = self.check_hub().await;
        let broker = self.check_broker().await;
        let devices = self.check_devices().await;
        let sensors = self.check_sensors(clock.unwrap_or_else(Utc::now)).await;
        let switches = self.check_switches().await;
        let automations = self.check_automations().await;

        let report = HealthReport::new(started, vec![hub, broker, devices, sensors, switches, automations]);
        info!("Health check finished: {}", report.overall_status);
        report
    }

    pub async fn check_hub(&self) -> CheckResult {
        info!("Checking Home Assistant connection...");
        match self.hub.ping().await {
            HubPing::Online { message } => {
                info!("✓ Home Assistant is online");
                CheckResult::probe(Category::Hub, CategoryStatus::Ok, message)
            }
            HubPing::Error { status } => {
                warn!("✗ Home Assistant returned HTTP {}", status);
                CheckResult::probe(Category::Hub, CategoryStatus::Error, format!("HTTP {status}"))
            }
            HubPing::Offline { reason } => {
                warn!("✗ Home Assistant is offline: {}", reason);
                CheckResult::probe(Category::Hub, CategoryStatus::Offline, reason)
            }
        }
    }

    pub async fn check_broker(&self) -> CheckResult {
        info!("Checking MQTT broker connection...");
        match self.broker.probe().await {
            BrokerPing::Online => {
                info!("✓ MQTT broker is online");
                CheckResult::probe(Category::Broker, CategoryStatus::Ok, "Connected successfully")
            }
            BrokerPing::Refused { reason } => {
                warn!("✗ MQTT broker refused the connection: {}", reason);
                CheckResult::probe(Category::Broker, CategoryStatus::Error, reason)
            }
            BrokerPing::NoAck { waited } => {
                warn!("✗ MQTT broker did not acknowledge within {:?}", waited);
                CheckResult::probe(Category::Broker, CategoryStatus::Error, "Connection failed")
            }
            BrokerPing::Offline { reason } => {
                warn!("✗ MQTT broker is offline: {}", reason);
                CheckResult::probe(Category::Broker, CategoryStatus::Offline, reason)
            }
        }
    }

    pub async fn check_devices(&self) -> CheckResult {
        let devices = &self.config.entities.devices;
        info!("Checking {} ESP32 device(s)...", devices.len());

        let mut items = IndexMap::new();
        for device in devices {
            let state = self.fetch_entity(&classify::device_status_entity(device)).await;
            let outcome = classify::classify_device(state.as_ref());
            log_item(device, &outcome);
            items.insert(device.clone(), outcome);
        }
        CheckResult::from_items(Category::Devices, items)
    }

    pub async fn check_sensors(&self, now: DateTime<Utc>) -> CheckResult {
        let sensors = &self.config.entities.sensors;
        let threshold = self.config.thresholds.sensor_stale();
        info!("Checking {} critical sensor(s)...", sensors.len());

        let mut items = IndexMap::new();
        for sensor in sensors {
            let state = self.fetch_entity(sensor).await;
            let outcome = classify::classify_sensor(state.as_ref(), now, threshold);
            log_item(sensor, &outcome);
            items.insert(sensor.clone(), outcome);
        }
        CheckResult::from_items(Category::Sensors, items)
    }

    pub async fn check_switches(&self) -> CheckResult {
        let switches = &self.config.entities.switches;
        info!("Checking {} critical switch(es)...", switches.len());

        let mut items = IndexMap::new();
        for switch in switches {
            let state = self.fetch_entity(switch).await;
            let outcome = classify::classify_switch(state.as_ref());
            log_item(switch, &outcome);
            items.insert(switch.clone(), outcome);
        }
        CheckResult::from_items(Category::Switches, items)
    }

    pub async fn check_automations(&self) -> CheckResult {
        let automations = &self.config.entities.automations;
        info!("Checking {} critical automation(s)...", automations.len());

        let mut items = IndexMap::new();
        for automation in automations {
            let state = self.fetch_entity(automation).await;
            let outcome = classify::classify_automation(state.as_ref());
            log_item(automation, &outcome);
            items.insert(automation.clone(), outcome);
        }
        CheckResult::from_items(Category::Automations, items)
    }

    /// `None` means "not found", whatever the cause. The cause is only logged.
    pub async fn fetch_entity(&self, entity_id: &str) -> Option<EntityState> {
        match self.hub.get_state(entity_id).await {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(entity = entity_id, "API request failed: {}", e);
                None
            }
        }
    }
}

fn log_item(id: &str, outcome: &ItemOutcome) {
    let value = outcome.value.as_deref().unwrap_or("-");
    match (outcome.status, outcome.issue) {
        (ItemStatus::Ok, _) => info!("  ✓ {}: {}", id, value),
        (ItemStatus::Disabled, _) => warn!("  ⚠ {}: DISABLED", id),
        (_, Some(issue)) => warn!("  ✗ {}: {:?} ({})", id, issue, value),
        (status, None) => warn!("  ✗ {}: {}", id, status),
    }
}
