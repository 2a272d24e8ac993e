//! One-shot MQTT reachability probe.
//!
//! Connects, waits for the ConnAck inside a fixed window, disconnects. The
//! event loop is owned by the probe call and dropped before it returns, so no
//! connection survives into the next cycle.

use crate::config::BrokerConfig;
use rumqttc::{AsyncClient, ConnectReturnCode, ConnectionError, Event, EventLoop, Incoming, MqttOptions};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Time allowed to flush the DISCONNECT packet after a successful probe.
const DISCONNECT_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerPing {
    /// ConnAck received with a success code.
    Online,
    /// The broker answered but refused the session (bad credentials, ...).
    Refused { reason: String },
    /// Nothing acknowledged the connection inside the window.
    NoAck { waited: Duration },
    /// Transport failure: DNS, TCP refused, I/O.
    Offline { reason: String },
}

/// Reachability check for the message broker. Implemented by [`MqttProbe`]
/// and by the devkit stubs used in tests.
pub trait BrokerProbe {
    fn probe(&self) -> impl Future<Output = BrokerPing> + Send;
}

pub struct MqttProbe {
    config: BrokerConfig,
}

impl MqttProbe {
    pub fn new(config: BrokerConfig) -> Self {
        Self { config }
    }

    fn options(&self) -> MqttOptions {
        let client_id = self
            .config
            .client_id
            .clone()
            .unwrap_or_else(|| format!("garden-monitor-{}", uuid::Uuid::new_v4().simple()));

        let mut opts = MqttOptions::new(client_id, &self.config.host, self.config.port);
        opts.set_keep_alive(Duration::from_secs(self.config.keep_alive_secs.max(5)));
        opts.set_clean_session(true);
        if let Some((user, pass)) = self.config.credentials() {
            opts.set_credentials(user, pass);
        }
        opts
    }
}

impl BrokerProbe for MqttProbe {
    async fn probe(&self) -> BrokerPing {
        let window = Duration::from_secs(self.config.ack_timeout_secs);
        let (client, mut eventloop) = AsyncClient::new(self.options(), 10);

        let outcome = match timeout(window, wait_for_connack(&mut eventloop)).await {
            Ok(Ok(())) => BrokerPing::Online,
            Ok(Err(ConnectionError::ConnectionRefused(code))) => BrokerPing::Refused {
                reason: format!("Connection refused: {code:?}"),
            },
            Ok(Err(e)) => BrokerPing::Offline { reason: e.to_string() },
            Err(_) => BrokerPing::NoAck { waited: window },
        };

        if outcome == BrokerPing::Online {
            // Queue a clean DISCONNECT and let the loop flush it
            if client.disconnect().await.is_ok() {
                let _ = timeout(DISCONNECT_GRACE, eventloop.poll()).await;
            }
        }
        debug!("MQTT probe {}:{} finished: {:?}", self.config.host, self.config.port, outcome);

        drop(client);
        drop(eventloop);
        outcome
    }
}

async fn wait_for_connack(eventloop: &mut EventLoop) -> Result<(), ConnectionError> {
    loop {
        match eventloop.poll().await? {
            Event::Incoming(Incoming::ConnAck(ack)) if ack.code == ConnectReturnCode::Success => return Ok(()),
            Event::Incoming(Incoming::ConnAck(ack)) => return Err(ConnectionError::ConnectionRefused(ack.code)),
            _ => {}
        }
    }
}
