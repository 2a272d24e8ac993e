//! Pure classification rules: entity state in, item outcome out.
//!
//! Nothing here performs I/O. `None` always means "the hub did not return the
//! entity" and always yields an ERROR outcome.

use crate::models::{Category, CategoryStatus, EntityState, Issue, ItemOutcome, ItemStatus};
use chrono::{DateTime, Duration, Utc};

/// Values the hub reports when it has no usable reading.
pub const SENTINEL_VALUES: [&str; 4] = ["unknown", "unavailable", "none", ""];

const ON: &str = "on";

/// Presence sensor created for each controller: `esp32-garden-zone-a` →
/// `binary_sensor.esp32_garden_zone_a_status`.
pub fn device_status_entity(device: &str) -> String {
    format!("binary_sensor.{}_status", device.replace('-', "_"))
}

pub fn is_sentinel(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(v) => {
            let v = v.trim();
            SENTINEL_VALUES.iter().any(|s| v.eq_ignore_ascii_case(s))
        }
    }
}

pub fn classify_device(state: Option<&EntityState>) -> ItemOutcome {
    let Some(state) = state else {
        return ItemOutcome {
            online: Some(false),
            last_updated: Some("N/A".to_string()),
            ..ItemOutcome::not_found()
        };
    };

    let online = state.state.as_deref() == Some(ON);
    let mut outcome = if online {
        ItemOutcome::new(ItemStatus::Ok)
    } else {
        ItemOutcome {
            issue: Some(Issue::Offline),
            ..ItemOutcome::new(ItemStatus::Error)
        }
    };
    outcome.online = Some(online);
    outcome.value = state.state.clone();
    outcome.last_updated = Some(state.last_updated.clone().unwrap_or_default());
    outcome
}

/// A sensor is OK only when it has a real value and was updated strictly
/// less than `threshold` ago. A missing or unparsable timestamp is stale.
pub fn classify_sensor(state: Option<&EntityState>, now: DateTime<Utc>, threshold: Duration) -> ItemOutcome {
    let Some(state) = state else {
        return ItemOutcome::not_found();
    };

    let valid = !is_sentinel(state.state.as_deref());
    let age = state.last_updated_at().map(|ts| now - ts);
    let fresh = age.map(|a| a < threshold).unwrap_or(false);

    let (status, issue) = match (valid, fresh) {
        (true, true) => (ItemStatus::Ok, None),
        (false, _) => (ItemStatus::Stale, Some(Issue::Invalid)),
        (true, false) => (ItemStatus::Stale, Some(Issue::Stale)),
    };

    ItemOutcome {
        issue,
        value: state.state.clone(),
        last_updated: Some(state.last_updated.clone().unwrap_or_default()),
        age_seconds: age.map(|a| a.num_milliseconds() as f64 / 1000.0),
        ..ItemOutcome::new(status)
    }
}

/// Existence only. Open or closed are both legitimate switch positions.
pub fn classify_switch(state: Option<&EntityState>) -> ItemOutcome {
    match state {
        Some(state) => ItemOutcome {
            value: state.state.clone(),
            ..ItemOutcome::new(ItemStatus::Ok)
        },
        None => ItemOutcome::not_found(),
    }
}

/// A disabled automation is reported as DISABLED but never fails the
/// category; see [`rollup`].
pub fn classify_automation(state: Option<&EntityState>) -> ItemOutcome {
    let Some(state) = state else {
        return ItemOutcome::not_found();
    };

    let enabled = state.state.as_deref() == Some(ON);
    let mut outcome = if enabled {
        ItemOutcome::new(ItemStatus::Ok)
    } else {
        ItemOutcome {
            issue: Some(Issue::Disabled),
            ..ItemOutcome::new(ItemStatus::Disabled)
        }
    };
    outcome.enabled = Some(enabled);
    outcome.value = state.state.clone();
    outcome.last_triggered = Some(
        state
            .attribute_str("last_triggered")
            .unwrap_or_else(|| "Never".to_string()),
    );
    outcome
}

/// Category status from its items: any failing item degrades the category.
/// For automations DISABLED is informational and does not count as failing.
pub fn rollup<'a>(category: Category, items: impl IntoIterator<Item = &'a ItemOutcome>) -> CategoryStatus {
    let failing = items.into_iter().any(|item| match item.status {
        ItemStatus::Ok => false,
        ItemStatus::Disabled => category != Category::Automations,
        ItemStatus::Stale | ItemStatus::Error => true,
    });

    if failing {
        CategoryStatus::Degraded
    } else {
        CategoryStatus::Ok
    }
}
