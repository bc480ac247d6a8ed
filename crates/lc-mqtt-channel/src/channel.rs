//! Publish/subscribe seam between the dispatcher and the broker.
//!
//! `MqttChannel` sits on a `rumqttc::AsyncClient`. Its event loop is handed
//! back to the caller, which polls it on a task of its own.

use async_trait::async_trait;
use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS};

use lc_protocol::ConnectionParams;

use crate::config::MqttConfig;
use crate::error::{MqttError, MqttResult};
use crate::{credentials, tls};

/// Capacity of the client → event loop request queue.
const REQUEST_CAPACITY: usize = 64;

// ── Channel trait ─────────────────────────────────────────────

/// Outbound half of the control channel.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Queue `payload` for `topic`.
    ///
    /// Returns once the request is queued for the transport, not when the
    /// broker acknowledges it.
    async fn publish(&self, topic: &str, payload: &[u8], qos: QoS, retain: bool)
    -> MqttResult<()>;

    async fn subscribe(&self, filter: &str, qos: QoS) -> MqttResult<()>;
}

// ── MqttChannel ───────────────────────────────────────────────

/// Channel backed by a live broker session.
pub struct MqttChannel {
    client: AsyncClient,
}

impl MqttChannel {
    /// Build the client and its event loop. No network traffic happens
    /// until the event loop is polled.
    pub fn new(params: &ConnectionParams, config: &MqttConfig) -> MqttResult<(Self, EventLoop)> {
        credentials::validate_params(params)?;

        let mut options = MqttOptions::new(&params.client_id, &params.host, params.port);
        options
            .set_credentials(&params.username, &params.password)
            .set_keep_alive(std::time::Duration::from_secs(config.keepalive_secs.into()))
            .set_clean_session(true);

        if params.tls {
            options.set_transport(tls::load_tls_transport(config)?);
        }

        let (client, eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
        Ok((Self { client }, eventloop))
    }
}

#[async_trait]
impl Channel for MqttChannel {
    async fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> MqttResult<()> {
        self.client
            .publish(topic, qos, retain, payload)
            .await
            .map_err(|e| MqttError::Publish(e.to_string()))
    }

    async fn subscribe(&self, filter: &str, qos: QoS) -> MqttResult<()> {
        self.client
            .subscribe(filter, qos)
            .await
            .map_err(|e| MqttError::Subscribe(e.to_string()))
    }
}
