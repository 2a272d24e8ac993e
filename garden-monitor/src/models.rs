use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// State of one hub entity as returned by `GET /api/states/{entity_id}`.
///
/// Every field is optional on the wire: a payload missing `state` or
/// `last_updated` is still a found entity, it simply fails classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    #[serde(default)]
    pub entity_id: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl EntityState {
    /// Parsed `last_updated`, `None` when absent or not RFC 3339.
    pub fn last_updated_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.last_updated.as_deref()?;
        DateTime::parse_from_rfc3339(raw.trim())
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }

    /// String view of an attribute; `None` for missing or null values.
    pub fn attribute_str(&self, key: &str) -> Option<String> {
        match self.attributes.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Hub,
    Broker,
    Devices,
    Sensors,
    Switches,
    Automations,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Hub => "hub",
            Category::Broker => "broker",
            Category::Devices => "devices",
            Category::Sensors => "sensors",
            Category::Switches => "switches",
            Category::Automations => "automations",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    Ok,
    Stale,
    Disabled,
    Error,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Ok => "OK",
            ItemStatus::Stale => "STALE",
            ItemStatus::Disabled => "DISABLED",
            ItemStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an item or probe is not OK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Issue {
    /// No response at all (transport failure, timeout).
    Unreachable,
    /// Reachable, but the answer was not a success.
    ProtocolError,
    NotFound,
    /// Present, but last update older than the staleness threshold.
    Stale,
    /// Present, but the value is a sentinel such as `unavailable`.
    Invalid,
    /// Present and intentionally off. Informational only.
    Disabled,
    /// Device presence sensor reports the controller as gone.
    Offline,
}

/// Per-entity outcome with the detail fields shown in the structured report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub status: ItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<Issue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub online: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_triggered: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ItemOutcome {
    pub fn new(status: ItemStatus) -> Self {
        Self {
            status,
            issue: None,
            value: None,
            last_updated: None,
            age_seconds: None,
            online: None,
            enabled: None,
            last_triggered: None,
            error: None,
        }
    }

    /// Outcome for an entity the hub did not return.
    pub fn not_found() -> Self {
        Self {
            issue: Some(Issue::NotFound),
            error: Some("Entity not found".to_string()),
            ..Self::new(ItemStatus::Error)
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ItemStatus::Ok
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryStatus {
    Ok,
    Degraded,
    Error,
    Offline,
}

impl CategoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryStatus::Ok => "OK",
            CategoryStatus::Degraded => "DEGRADED",
            CategoryStatus::Error => "ERROR",
            CategoryStatus::Offline => "OFFLINE",
        }
    }
}

impl fmt::Display for CategoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one category check, recorded in evaluation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub category: Category,
    pub status: CategoryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub items: IndexMap<String, ItemOutcome>,
}

impl CheckResult {
    /// Result of a connectivity probe: no items, just a status and a message.
    pub fn probe(category: Category, status: CategoryStatus, message: impl Into<String>) -> Self {
        Self {
            category,
            status,
            message: Some(message.into()),
            items: IndexMap::new(),
        }
    }

    /// Result of an entity category, status rolled up from its items.
    pub fn from_items(category: Category, items: IndexMap<String, ItemOutcome>) -> Self {
        let status = crate::classify::rollup(category, items.values());
        Self {
            category,
            status,
            message: None,
            items,
        }
    }

    pub fn passed(&self) -> bool {
        self.status == CategoryStatus::Ok
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
    Healthy,
    Degraded,
    Error,
    Unknown,
}

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Healthy => "HEALTHY",
            OverallStatus::Degraded => "DEGRADED",
            OverallStatus::Error => "ERROR",
            OverallStatus::Unknown => "UNKNOWN",
        }
    }

    /// ERROR beats DEGRADED/OFFLINE beats OK. No checks at all is UNKNOWN.
    pub fn from_checks(checks: &[CheckResult]) -> Self {
        if checks.is_empty() {
            return OverallStatus::Unknown;
        }
        if checks.iter().any(|c| c.status == CategoryStatus::Error) {
            OverallStatus::Error
        } else if checks
            .iter()
            .any(|c| matches!(c.status, CategoryStatus::Degraded | CategoryStatus::Offline))
        {
            OverallStatus::Degraded
        } else if checks.iter().all(|c| c.status == CategoryStatus::Ok) {
            OverallStatus::Healthy
        } else {
            OverallStatus::Unknown
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One evaluation cycle. Built fresh each cycle and dropped after rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub timestamp: DateTime<Utc>,
    pub overall_status: OverallStatus,
    pub checks: Vec<CheckResult>,
}

impl HealthReport {
    pub fn new(timestamp: DateTime<Utc>, checks: Vec<CheckResult>) -> Self {
        let overall_status = OverallStatus::from_checks(&checks);
        Self {
            timestamp,
            overall_status,
            checks,
        }
    }

    pub fn check(&self, category: Category) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.category == category)
    }

    pub fn is_healthy(&self) -> bool {
        self.overall_status == OverallStatus::Healthy
    }
}
