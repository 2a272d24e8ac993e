/*!
Test harness for the health evaluator

- Mock hub + broker wired into a `HealthEvaluator`
- A fixed clock so freshness checks are reproducible
- A healthy garden seeded from the configured entity lists
- Assertions on categories and items of a report
*/

use crate::entity_helpers::{automation, fresh_sensor, online_device, switch};
use crate::hub_stub::{MockBroker, MockHub};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use garden_monitor::{
    Category, CategoryStatus, HealthEvaluator, HealthReport, ItemStatus, MonitorConfig, OverallStatus,
};
use std::collections::HashMap;

pub struct TestHarness {
    pub hub: MockHub,
    pub broker: MockBroker,
    pub config: MonitorConfig,
    pub now: DateTime<Utc>,
}

impl TestHarness {
    /// Default garden configuration, online hub and broker, no entities yet
    pub fn new() -> Self {
        env_logger::try_init().ok(); // Logging for tests

        let mut config = MonitorConfig::default();
        config.hub.token = "test-token".to_string();

        Self {
            hub: MockHub::new(),
            broker: MockBroker::new(),
            config,
            now: DateTime::parse_from_rfc3339("2024-03-02T12:00:00+00:00")
                .map(|ts| ts.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        }
    }

    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    /// Every configured entity present and healthy relative to `now`
    pub fn seed_healthy_garden(&self) -> &Self {
        let entities = &self.config.entities;
        for device in &entities.devices {
            self.hub.set_state(online_device(device, self.now));
        }
        for sensor in &entities.sensors {
            self.hub.set_state(fresh_sensor(sensor, "42", self.now));
        }
        for id in &entities.switches {
            self.hub.set_state(switch(id, "off"));
        }
        for id in &entities.automations {
            self.hub
                .set_state(automation(id, true, Some(self.now - Duration::hours(6))));
        }
        log::info!("Seeded healthy garden ({} entities)", self.entity_count());
        self
    }

    pub fn entity_count(&self) -> usize {
        let e = &self.config.entities;
        e.devices.len() + e.sensors.len() + e.switches.len() + e.automations.len()
    }

    /// Evaluator sharing this harness' hub and broker
    pub fn evaluator(&self) -> HealthEvaluator<MockHub, MockBroker> {
        HealthEvaluator::new(self.config.clone(), self.hub.clone(), self.broker.clone())
    }

    /// One full evaluation cycle at the harness clock
    pub async fn run(&self) -> HealthReport {
        self.evaluator().evaluate_at(self.now).await
    }

    pub fn assert_overall(&self, report: &HealthReport, expected: OverallStatus) -> Result<()> {
        if report.overall_status != expected {
            anyhow::bail!(
                "Overall status mismatch: expected {}, got {}",
                expected,
                report.overall_status
            );
        }
        Ok(())
    }

    pub fn assert_category(&self, report: &HealthReport, category: Category, expected: CategoryStatus) -> Result<()> {
        let check = report
            .check(category)
            .ok_or_else(|| anyhow::anyhow!("Category {} missing from report", category))?;
        if check.status != expected {
            anyhow::bail!(
                "Category {} mismatch: expected {}, got {}",
                category,
                expected,
                check.status
            );
        }
        Ok(())
    }

    pub fn assert_item(&self, report: &HealthReport, category: Category, id: &str, expected: ItemStatus) -> Result<()> {
        let item = report
            .check(category)
            .and_then(|c| c.items.get(id))
            .ok_or_else(|| anyhow::anyhow!("Item {} missing from {}", id, category))?;
        if item.status != expected {
            anyhow::bail!("Item {} mismatch: expected {}, got {}", id, expected, item.status);
        }
        Ok(())
    }

    /// Stats on the requests the evaluator sent to the hub
    pub fn get_stats(&self) -> TestStats {
        let requests = self.hub.requested();
        let mut per_entity = HashMap::new();
        for id in &requests {
            *per_entity.entry(id.clone()).or_insert(0) += 1;
        }

        TestStats {
            total_requests: requests.len(),
            per_entity,
            broker_probes: self.broker.probe_count(),
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct TestStats {
    pub total_requests: usize,
    pub per_entity: HashMap<String, usize>,
    pub broker_probes: usize,
}

impl TestStats {
    pub fn print(&self) {
        println!("Test statistics:");
        println!("  Hub requests: {}", self.total_requests);
        println!("  Broker probes: {}", self.broker_probes);
        let mut ids: Vec<_> = self.per_entity.iter().collect();
        ids.sort();
        for (id, count) in ids {
            println!("    {}: {}", id, count);
        }
    }
}

/// Declares a `#[tokio::test]` running against a freshly seeded healthy
/// garden. The body returns `anyhow::Result<()>`.
#[macro_export]
macro_rules! monitor_test {
    ($name:ident, |$harness:ident| $body:block) => {
        #[tokio::test]
        async fn $name() {
            async fn scenario($harness: &$crate::test_utils::TestHarness) -> $crate::anyhow::Result<()> $body

            let harness = $crate::test_utils::TestHarness::new();
            harness.seed_healthy_garden();
            match scenario(&harness).await {
                Ok(()) => harness.get_stats().print(),
                Err(e) => panic!("Test '{}' failed: {}", stringify!($name), e),
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_harness_healthy_garden() {
        let harness = TestHarness::new();
        harness.seed_healthy_garden();

        let report = harness.run().await;
        harness.assert_overall(&report, OverallStatus::Healthy).unwrap();
        for category in [Category::Devices, Category::Sensors, Category::Switches, Category::Automations] {
            harness.assert_category(&report, category, CategoryStatus::Ok).unwrap();
        }

        let stats = harness.get_stats();
        assert_eq!(stats.total_requests, harness.entity_count());
        assert_eq!(stats.broker_probes, 1);
    }

    #[tokio::test]
    async fn test_assertions_report_mismatches() {
        let harness = TestHarness::new();
        let report = harness.run().await;

        // Nothing seeded: every entity is missing
        assert!(harness.assert_overall(&report, OverallStatus::Healthy).is_err());
        assert!(harness
            .assert_item(&report, Category::Switches, "switch.water_pump", ItemStatus::Ok)
            .is_err());
        harness
            .assert_item(&report, Category::Switches, "switch.water_pump", ItemStatus::Error)
            .unwrap();
        assert!(harness
            .assert_item(&report, Category::Switches, "switch.not_configured", ItemStatus::Error)
            .is_err());
    }

    crate::monitor_test!(test_macro_functionality, |harness| {
        let report = harness.run().await;
        harness.assert_item(&report, Category::Sensors, "sensor.water_tank_level", ItemStatus::Ok)?;
        Ok(())
    });
}
