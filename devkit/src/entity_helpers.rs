/*!
Builders for hub entity states

Produces `EntityState` values and the JSON payloads Home Assistant would
return for them, so tests read like the garden they describe.
*/

use chrono::{DateTime, Duration, Utc};
use garden_monitor::classify::device_status_entity;
use garden_monitor::EntityState;
use serde_json::{Map, Value};

#[derive(Debug, Clone)]
pub struct EntityBuilder {
    entity_id: String,
    state: Option<String>,
    last_updated: Option<String>,
    attributes: Map<String, Value>,
}

impl EntityBuilder {
    pub fn new<S: Into<String>>(entity_id: S) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: None,
            last_updated: None,
            attributes: Map::new(),
        }
    }

    pub fn state<S: Into<String>>(mut self, value: S) -> Self {
        self.state = Some(value.into());
        self
    }

    pub fn updated_at(mut self, ts: DateTime<Utc>) -> Self {
        self.last_updated = Some(ts.to_rfc3339());
        self
    }

    /// `last_updated` set to `age` before `now`
    pub fn updated_ago(self, now: DateTime<Utc>, age: Duration) -> Self {
        self.updated_at(now - age)
    }

    /// Raw timestamp string, for unparsable-timestamp cases
    pub fn last_updated_raw<S: Into<String>>(mut self, raw: S) -> Self {
        self.last_updated = Some(raw.into());
        self
    }

    pub fn attribute<K: Into<String>>(mut self, key: K, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn build(self) -> EntityState {
        EntityState {
            entity_id: self.entity_id,
            state: self.state,
            last_updated: self.last_updated,
            attributes: self.attributes,
        }
    }

    /// Payload shaped like `GET /api/states/{entity_id}`
    pub fn to_payload(&self) -> Value {
        serde_json::json!({
            "entity_id": self.entity_id,
            "state": self.state,
            "last_changed": self.last_updated,
            "last_updated": self.last_updated,
            "attributes": self.attributes,
        })
    }
}

/// Presence sensor of a controller that is online
pub fn online_device(device: &str, now: DateTime<Utc>) -> EntityState {
    EntityBuilder::new(device_status_entity(device))
        .state("on")
        .updated_ago(now, Duration::seconds(30))
        .attribute("device_class", Value::from("connectivity"))
        .build()
}

/// Sensor reporting `value`, updated one minute before `now`
pub fn fresh_sensor(entity_id: &str, value: &str, now: DateTime<Utc>) -> EntityState {
    EntityBuilder::new(entity_id)
        .state(value)
        .updated_ago(now, Duration::minutes(1))
        .build()
}

pub fn switch(entity_id: &str, value: &str) -> EntityState {
    EntityBuilder::new(entity_id).state(value).build()
}

pub fn automation(entity_id: &str, enabled: bool, last_triggered: Option<DateTime<Utc>>) -> EntityState {
    let triggered = last_triggered.map(|ts| Value::from(ts.to_rfc3339())).unwrap_or(Value::Null);
    EntityBuilder::new(entity_id)
        .state(if enabled { "on" } else { "off" })
        .attribute("last_triggered", triggered)
        .build()
}
