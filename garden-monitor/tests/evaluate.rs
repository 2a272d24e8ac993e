use chrono::Duration;
use garden_monitor::{
    render, BrokerPing, Category, CategoryStatus, FetchError, HubPing, Issue, ItemStatus, OverallStatus,
    ReportFormat,
};
use garden_monitor_devkit::entity_helpers::{automation, switch};
use garden_monitor_devkit::{monitor_test, EntityBuilder, TestHarness};

monitor_test!(healthy_garden_is_healthy, |harness| {
    let report = harness.run().await;
    harness.assert_overall(&report, OverallStatus::Healthy)?;

    let order: Vec<Category> = report.checks.iter().map(|c| c.category).collect();
    assert_eq!(
        order,
        vec![
            Category::Hub,
            Category::Broker,
            Category::Devices,
            Category::Sensors,
            Category::Switches,
            Category::Automations,
        ]
    );
    Ok(())
});

monitor_test!(missing_sensor_is_error_not_stale, |harness| {
    harness.hub.remove("sensor.main_flow_rate");
    let report = harness.run().await;

    let item = &report.check(Category::Sensors).unwrap().items["sensor.main_flow_rate"];
    assert_eq!(item.status, ItemStatus::Error);
    assert_eq!(item.issue, Some(Issue::NotFound));
    harness.assert_category(&report, Category::Sensors, CategoryStatus::Degraded)?;
    harness.assert_overall(&report, OverallStatus::Degraded)?;
    Ok(())
});

monitor_test!(every_fetch_failure_reads_as_not_found, |harness| {
    harness.hub.fail("switch.water_pump", FetchError::Unreachable("timed out".into()));
    harness.hub.fail("switch.zone_a_valve", FetchError::Protocol(500));
    harness.hub.set_payload("switch.zone_b_valve", &serde_json::json!("garbage"));

    let report = harness.run().await;
    for id in ["switch.water_pump", "switch.zone_a_valve", "switch.zone_b_valve"] {
        let item = &report.check(Category::Switches).unwrap().items[id];
        assert_eq!(item.status, ItemStatus::Error, "{id}");
        assert_eq!(item.issue, Some(Issue::NotFound), "{id}");
    }
    harness.assert_item(&report, Category::Switches, "switch.main_water_valve", ItemStatus::Ok)?;
    Ok(())
});

monitor_test!(unavailable_sensor_is_invalid_even_when_fresh, |harness| {
    harness.hub.set_state(
        EntityBuilder::new("sensor.water_tank_level")
            .state("unavailable")
            .updated_ago(harness.now, Duration::seconds(1))
            .build(),
    );
    let report = harness.run().await;

    let item = &report.check(Category::Sensors).unwrap().items["sensor.water_tank_level"];
    assert!(!item.is_ok());
    assert_eq!(item.issue, Some(Issue::Invalid));
    harness.assert_category(&report, Category::Sensors, CategoryStatus::Degraded)?;
    Ok(())
});

monitor_test!(sensor_staleness_boundary, |harness| {
    harness.hub.set_state(
        EntityBuilder::new("sensor.zone_a_soil_moisture")
            .state("38.5")
            .updated_ago(harness.now, Duration::minutes(15) + Duration::seconds(1))
            .build(),
    );
    harness.hub.set_state(
        EntityBuilder::new("sensor.zone_b_soil_moisture")
            .state("40.1")
            .updated_ago(harness.now, Duration::seconds(1))
            .build(),
    );
    let report = harness.run().await;

    harness.assert_item(&report, Category::Sensors, "sensor.zone_a_soil_moisture", ItemStatus::Stale)?;
    harness.assert_item(&report, Category::Sensors, "sensor.zone_b_soil_moisture", ItemStatus::Ok)?;
    Ok(())
});

monitor_test!(configured_threshold_is_used, |harness| {
    let mut config = harness.config.clone();
    config.thresholds.sensor_stale_minutes = 60;
    harness.hub.set_state(
        EntityBuilder::new("sensor.nws_weather_temperature")
            .state("4.2")
            .updated_ago(harness.now, Duration::minutes(45))
            .build(),
    );

    let report = garden_monitor::HealthEvaluator::new(config, harness.hub.clone(), harness.broker.clone())
        .evaluate_at(harness.now)
        .await;
    harness.assert_item(&report, Category::Sensors, "sensor.nws_weather_temperature", ItemStatus::Ok)?;

    // Same reading with the default 15 minutes is stale
    let report = harness.run().await;
    harness.assert_item(&report, Category::Sensors, "sensor.nws_weather_temperature", ItemStatus::Stale)?;
    Ok(())
});

monitor_test!(unparsable_timestamp_is_stale, |harness| {
    harness.hub.set_state(
        EntityBuilder::new("sensor.water_tank_level")
            .state("80")
            .last_updated_raw("03/02/2024 11:59")
            .build(),
    );
    let report = harness.run().await;
    harness.assert_item(&report, Category::Sensors, "sensor.water_tank_level", ItemStatus::Stale)?;
    Ok(())
});

monitor_test!(disabled_automation_does_not_degrade, |harness| {
    harness
        .hub
        .set_state(automation("automation.morning_watering_schedule", false, None));
    let report = harness.run().await;

    let item = &report.check(Category::Automations).unwrap().items["automation.morning_watering_schedule"];
    assert_eq!(item.status, ItemStatus::Disabled);
    assert_eq!(item.last_triggered.as_deref(), Some("Never"));
    harness.assert_category(&report, Category::Automations, CategoryStatus::Ok)?;
    harness.assert_overall(&report, OverallStatus::Healthy)?;
    Ok(())
});

monitor_test!(missing_automation_degrades, |harness| {
    harness
        .hub
        .set_state(automation("automation.morning_watering_schedule", false, None));
    harness.hub.remove("automation.leak_detection_emergency_shutoff");
    let report = harness.run().await;

    harness.assert_category(&report, Category::Automations, CategoryStatus::Degraded)?;
    harness.assert_overall(&report, OverallStatus::Degraded)?;
    Ok(())
});

monitor_test!(switch_position_is_not_judged, |harness| {
    harness.hub.set_state(switch("switch.main_water_valve", "on"));
    harness.hub.set_state(switch("switch.water_pump", "unavailable"));
    let report = harness.run().await;

    let switches = report.check(Category::Switches).unwrap();
    assert_eq!(switches.status, CategoryStatus::Ok);
    assert_eq!(switches.items["switch.water_pump"].value.as_deref(), Some("unavailable"));
    Ok(())
});

monitor_test!(offline_device_degrades, |harness| {
    harness.hub.set_state(
        EntityBuilder::new("binary_sensor.esp32_utility_control_status")
            .state("off")
            .updated_ago(harness.now, Duration::minutes(3))
            .build(),
    );
    let report = harness.run().await;

    let item = &report.check(Category::Devices).unwrap().items["esp32-utility-control"];
    assert_eq!(item.status, ItemStatus::Error);
    assert_eq!(item.online, Some(false));
    harness.assert_category(&report, Category::Devices, CategoryStatus::Degraded)?;
    assert_eq!(
        harness.hub.request_count("binary_sensor.esp32_utility_control_status"),
        1
    );
    Ok(())
});

monitor_test!(hub_error_is_error_overall, |harness| {
    harness.hub.set_ping(HubPing::Error { status: 401 });
    let report = harness.run().await;

    let hub = report.check(Category::Hub).unwrap();
    assert_eq!(hub.status, CategoryStatus::Error);
    assert_eq!(hub.message.as_deref(), Some("HTTP 401"));
    harness.assert_overall(&report, OverallStatus::Error)?;
    Ok(())
});

monitor_test!(offline_hub_still_runs_category_checks, |harness| {
    harness.hub.set_ping(HubPing::Offline { reason: "connection refused".into() });
    let report = harness.run().await;

    harness.assert_category(&report, Category::Hub, CategoryStatus::Offline)?;
    harness.assert_overall(&report, OverallStatus::Degraded)?;
    assert_eq!(harness.get_stats().total_requests, harness.entity_count());
    Ok(())
});

monitor_test!(broker_outcomes, |harness| {
    harness.broker.set_outcome(BrokerPing::NoAck {
        waited: std::time::Duration::from_secs(2),
    });
    let report = harness.run().await;
    harness.assert_category(&report, Category::Broker, CategoryStatus::Error)?;
    assert_eq!(
        report.check(Category::Broker).unwrap().message.as_deref(),
        Some("Connection failed")
    );
    harness.assert_overall(&report, OverallStatus::Error)?;

    harness.broker.set_outcome(BrokerPing::Offline { reason: "connection refused".into() });
    let report = harness.run().await;
    harness.assert_category(&report, Category::Broker, CategoryStatus::Offline)?;
    harness.assert_overall(&report, OverallStatus::Degraded)?;

    harness.broker.set_outcome(BrokerPing::Refused { reason: "Connection refused: BadUserNamePassword".into() });
    let report = harness.run().await;
    harness.assert_category(&report, Category::Broker, CategoryStatus::Error)?;
    assert_eq!(harness.broker.probe_count(), 3);
    Ok(())
});

monitor_test!(renderings_agree, |harness| {
    harness.hub.remove("sensor.water_tank_level");
    harness
        .hub
        .set_state(automation("automation.low_water_tank_alert", false, None));
    let report = harness.run().await;

    let text = render(&report, ReportFormat::Text)?;
    let json: serde_json::Value = serde_json::from_str(&render(&report, ReportFormat::Json)?)?;

    assert_eq!(json["overall_status"], report.overall_status.as_str());
    assert!(text.contains(&format!("Overall Status: {}", report.overall_status)));
    for (check, value) in report.checks.iter().zip(json["checks"].as_array().unwrap()) {
        assert_eq!(value["status"], check.status.as_str());
        let line = format!("{}: {}", check.category.as_str().to_uppercase(), check.status);
        assert!(text.lines().any(|l| l == line), "missing {line}");
    }
    assert!(text.contains("  - sensor.water_tank_level: ERROR"));
    assert!(text.contains("  - automation.low_water_tank_alert: DISABLED"));

    assert_eq!(render(&report, ReportFormat::Text)?, text);
    Ok(())
});

#[tokio::test]
async fn empty_entity_lists_still_report_probes() {
    let mut config = garden_monitor::MonitorConfig::default();
    config.hub.token = "test-token".into();
    config.entities.devices.clear();
    config.entities.sensors.clear();
    config.entities.switches.clear();
    config.entities.automations.clear();

    let harness = TestHarness::new().with_config(config);
    let report = harness.run().await;

    assert_eq!(report.checks.len(), 6);
    assert_eq!(report.overall_status, OverallStatus::Healthy);
    assert_eq!(harness.get_stats().total_requests, 0);
}

#[tokio::test]
async fn wall_clock_cycle_ages_sensors_after_the_probes() {
    let harness = TestHarness::new();
    harness.broker.set_delay(std::time::Duration::from_millis(300));

    // Reading written while the broker probe is still waiting
    let written = chrono::Utc::now() + Duration::milliseconds(150);
    harness.hub.set_state(
        EntityBuilder::new("sensor.water_tank_level")
            .state("73")
            .updated_at(written)
            .build(),
    );

    let report = harness.evaluator().evaluate().await;
    let item = &report.check(Category::Sensors).unwrap().items["sensor.water_tank_level"];
    assert_eq!(item.status, ItemStatus::Ok);
    let age = item.age_seconds.unwrap();
    assert!(age >= 0.0, "sensor age measured before the probes finished: {age}");
    assert!(report.timestamp < written);
}
