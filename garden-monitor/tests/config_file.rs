use garden_monitor::{ConfigError, MonitorConfig};
use std::io::Write;

#[tokio::test]
async fn loads_yaml_file_over_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
hub:
  url: "https://ha.garden.lan"
  token: "from-file"
broker:
  host: "mqtt.garden.lan"
  username: "monitor"
  password: "s3cret"
interval_secs: 120
entities:
  devices: ["esp32-greenhouse"]
  automations: []
"#
    )
    .unwrap();

    let config = MonitorConfig::load(Some(file.path())).await.unwrap();
    assert_eq!(config.hub.url, "https://ha.garden.lan");
    assert_eq!(config.hub.token, "from-file");
    assert_eq!(config.broker.host, "mqtt.garden.lan");
    assert_eq!(config.broker.port, 1883);
    assert_eq!(config.broker.credentials(), Some(("monitor", "s3cret")));
    assert_eq!(config.interval_secs(), 120);
    assert_eq!(config.entities.devices, vec!["esp32-greenhouse"]);
    assert!(config.entities.automations.is_empty());
    assert_eq!(config.entities.sensors.len(), 5);
    assert!(config.validate().is_ok());
}

#[tokio::test]
async fn malformed_yaml_file_is_fatal() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "thresholds:\n  sensor_stale_minutes: fifteen").unwrap();

    let err = MonitorConfig::load(Some(file.path())).await.unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn serialized_config_never_contains_secrets() {
    let mut config = MonitorConfig::default();
    config.hub.token = "super-secret-token".into();
    config.broker.password = Some("hunter2".into());

    let yaml = serde_yaml::to_string(&config).unwrap();
    assert!(!yaml.contains("super-secret-token"));
    assert!(!yaml.contains("hunter2"));
}
