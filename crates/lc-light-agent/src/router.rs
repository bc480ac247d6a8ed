//! Topic routing for inbound messages.
//!
//! Each subscribed topic maps to exactly one [`TopicHandler`]. A handler
//! returns at most one [`Outbound`] message, which the dispatcher publishes.

use std::collections::HashMap;

use lc_gpio::{Level, OutputHandle};
use lc_protocol::{ControlCommand, DecodeOutcome, StatusReport, commands};
use rumqttc::QoS;

/// A message a handler wants published in response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
    pub retain: bool,
}

/// Handles messages for one topic.
///
/// Called from the MQTT loop task only, one message at a time. Must not
/// block: any pin work goes through interrupt-safe handles.
pub trait TopicHandler: Send + Sync {
    fn handle(&self, topic: &str, payload: &[u8]) -> Option<Outbound>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// No handler for this topic.
    NotHandled,
    Handled(Option<Outbound>),
}

/// Exact-match topic → handler table.
#[derive(Default)]
pub struct TopicRouter {
    routes: HashMap<String, Box<dyn TopicHandler>>,
}

impl TopicRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `topic`, replacing any previous handler.
    pub fn add(&mut self, topic: impl Into<String>, handler: impl TopicHandler + 'static) {
        self.routes.insert(topic.into(), Box::new(handler));
    }

    pub fn with_route(
        mut self,
        topic: impl Into<String>,
        handler: impl TopicHandler + 'static,
    ) -> Self {
        self.add(topic, handler);
        self
    }

    pub fn route(&self, topic: &str, payload: &[u8]) -> RouteOutcome {
        match self.routes.get(topic) {
            Some(handler) => RouteOutcome::Handled(handler.handle(topic, payload)),
            None => RouteOutcome::NotHandled,
        }
    }

    /// Routed topics in sorted order.
    pub fn topics(&self) -> Vec<&str> {
        let mut topics: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        topics.sort_unstable();
        topics
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

// ── Light control ─────────────────────────────────────────────

/// Drives the light from `{"switch": "on"|"off"}` commands and reports the
/// new state on the status topic.
pub struct LightControlHandler {
    light: OutputHandle,
    status_topic: String,
}

impl LightControlHandler {
    pub fn new(light: OutputHandle, status_topic: impl Into<String>) -> Self {
        Self {
            light,
            status_topic: status_topic.into(),
        }
    }

    fn apply(&self, command: &ControlCommand) -> Outbound {
        self.light.set(Level::from_bool(command.action.is_on()));
        tracing::info!(
            topic = %command.raw_topic,
            pin = %self.light.pin(),
            action = %command.action,
            "light switched"
        );

        Outbound {
            topic: self.status_topic.clone(),
            payload: StatusReport::new(command.action).payload().to_vec(),
            qos: QoS::AtMostOnce,
            retain: false,
        }
    }
}

impl TopicHandler for LightControlHandler {
    fn handle(&self, topic: &str, payload: &[u8]) -> Option<Outbound> {
        tracing::debug!(
            topic,
            data = %String::from_utf8_lossy(payload),
            "control message"
        );

        match commands::decode(payload) {
            outcome @ DecodeOutcome::Recognized(_) => {
                outcome.into_command(topic).map(|command| self.apply(&command))
            }
            DecodeOutcome::Unrecognized { value } => {
                tracing::warn!(
                    topic,
                    value = %value,
                    "unknown switch value, command not found"
                );
                None
            }
            DecodeOutcome::Absent => {
                tracing::debug!(topic, "no switch key in control message");
                None
            }
            DecodeOutcome::Malformed { detail } => {
                tracing::error!(
                    topic,
                    detail = %detail,
                    "failed to parse control message"
                );
                None
            }
        }
    }
}
