/*!
Mock hub and broker for developing without Home Assistant or an MQTT broker

`MockHub` answers state requests from an in-memory table and records every
entity id it was asked for. `MockBroker` returns a scripted probe outcome.
*/

use garden_monitor::hub::parse_entity;
use garden_monitor::{BrokerPing, BrokerProbe, EntityState, FetchError, HubPing, StateSource};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
enum StubResponse {
    State(EntityState),
    Fail(FetchError),
}

/// In-memory stand-in for the Home Assistant REST API
#[derive(Clone)]
pub struct MockHub {
    states: Arc<Mutex<HashMap<String, StubResponse>>>,
    ping: Arc<Mutex<HubPing>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockHub {
    /// Online hub with no entities
    pub fn new() -> Self {
        Self {
            states: Arc::new(Mutex::new(HashMap::new())),
            ping: Arc::new(Mutex::new(HubPing::Online {
                message: "API running.".to_string(),
            })),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_ping(&self, ping: HubPing) {
        *self.ping.lock().unwrap() = ping;
    }

    /// Registers (or replaces) an entity
    pub fn set_state(&self, state: EntityState) {
        log::debug!("[MOCK] hub state {} = {:?}", state.entity_id, state.state);
        self.states
            .lock()
            .unwrap()
            .insert(state.entity_id.clone(), StubResponse::State(state));
    }

    /// Registers a raw JSON payload, decoded the same way the real client does
    pub fn set_payload(&self, entity_id: &str, payload: &Value) {
        let body = payload.to_string();
        let response = match parse_entity(entity_id, body.as_bytes()) {
            Ok(state) => StubResponse::State(state),
            Err(e) => StubResponse::Fail(e),
        };
        self.states.lock().unwrap().insert(entity_id.to_string(), response);
    }

    /// Makes every request for `entity_id` fail with `error`
    pub fn fail(&self, entity_id: &str, error: FetchError) {
        self.states
            .lock()
            .unwrap()
            .insert(entity_id.to_string(), StubResponse::Fail(error));
    }

    pub fn remove(&self, entity_id: &str) {
        self.states.lock().unwrap().remove(entity_id);
    }

    /// Every entity id requested so far, in order
    pub fn requested(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, entity_id: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|id| id.as_str() == entity_id)
            .count()
    }

    /// Forget recorded requests, keep the entity table
    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    fn lookup(&self, entity_id: &str) -> Result<EntityState, FetchError> {
        self.requests.lock().unwrap().push(entity_id.to_string());
        match self.states.lock().unwrap().get(entity_id) {
            Some(StubResponse::State(state)) => Ok(state.clone()),
            Some(StubResponse::Fail(e)) => Err(e.clone()),
            // Home Assistant answers 404 for unknown entity ids
            None => Err(FetchError::Protocol(404)),
        }
    }
}

impl Default for MockHub {
    fn default() -> Self {
        Self::new()
    }
}

impl StateSource for MockHub {
    async fn ping(&self) -> HubPing {
        self.ping.lock().unwrap().clone()
    }

    async fn get_state(&self, entity_id: &str) -> Result<EntityState, FetchError> {
        self.lookup(entity_id)
    }
}

/// Broker probe returning a scripted outcome
#[derive(Clone)]
pub struct MockBroker {
    outcome: Arc<Mutex<BrokerPing>>,
    delay: Arc<Mutex<Option<Duration>>>,
    probes: Arc<AtomicUsize>,
}

impl MockBroker {
    pub fn new() -> Self {
        Self::with_outcome(BrokerPing::Online)
    }

    pub fn with_outcome(outcome: BrokerPing) -> Self {
        Self {
            outcome: Arc::new(Mutex::new(outcome)),
            delay: Arc::new(Mutex::new(None)),
            probes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set_outcome(&self, outcome: BrokerPing) {
        *self.outcome.lock().unwrap() = outcome;
    }

    /// Every probe waits `delay` before answering, like a slow broker
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

impl Default for MockBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl BrokerProbe for MockBroker {
    async fn probe(&self) -> BrokerPing {
        self.probes.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.lock().unwrap().clone()
    }
}
