//! Home Assistant REST collaborator.
//!
//! `GET {base}/api/` for liveness, `GET {base}/api/states/{entity_id}` per
//! entity. Bearer token on every request, one timeout per call, no retries.

use crate::config::HubConfig;
use crate::error::{FetchError, MonitorError};
use crate::models::EntityState;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Answer of the liveness endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubPing {
    /// HTTP 200 with a parseable body.
    Online { message: String },
    /// Reachable but not a usable answer.
    Error { status: u16 },
    /// No answer at all.
    Offline { reason: String },
}

/// Source of entity states. Implemented by [`HubClient`] and by the devkit
/// stubs used in tests.
pub trait StateSource {
    fn ping(&self) -> impl Future<Output = HubPing> + Send;

    fn get_state(&self, entity_id: &str) -> impl Future<Output = Result<EntityState, FetchError>> + Send;
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: Option<String>,
}

#[derive(Clone)]
pub struct HubClient {
    http: reqwest::Client,
    base: String,
}

impl HubClient {
    pub fn new(config: &HubConfig) -> Result<Self, MonitorError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token.trim()))
            .map_err(|e| crate::error::ConfigError::Invalid(format!("token is not a valid header value: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("garden-monitor/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base: config.url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/api/{}", self.base, endpoint)
    }
}

impl StateSource for HubClient {
    async fn ping(&self) -> HubPing {
        let response = match self.http.get(self.api_url("")).send().await {
            Ok(r) => r,
            Err(e) => return HubPing::Offline { reason: e.to_string() },
        };

        let status = response.status();
        if status != StatusCode::OK {
            return HubPing::Error { status: status.as_u16() };
        }

        match response.json::<ApiMessage>().await {
            Ok(body) => HubPing::Online {
                message: body.message.unwrap_or_else(|| "API is running".to_string()),
            },
            Err(e) => {
                debug!("Hub liveness body unparsable: {}", e);
                HubPing::Error { status: status.as_u16() }
            }
        }
    }

    async fn get_state(&self, entity_id: &str) -> Result<EntityState, FetchError> {
        let url = self.api_url(&format!("states/{entity_id}"));
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Protocol(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Unreachable(e.to_string()))?;
        parse_entity(entity_id, &body)
    }
}

/// Decode a state payload. The requested id fills in a missing `entity_id`.
pub fn parse_entity(entity_id: &str, body: &[u8]) -> Result<EntityState, FetchError> {
    let mut state: EntityState =
        serde_json::from_slice(body).map_err(|e| FetchError::Malformed(e.to_string()))?;
    if state.entity_id.is_empty() {
        state.entity_id = entity_id.to_string();
    }
    Ok(state)
}
