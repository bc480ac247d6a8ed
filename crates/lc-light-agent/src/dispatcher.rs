//! Control-channel dispatcher.
//!
//! Reacts to connection lifecycle events delivered by the transport:
//!
//! ```text
//! Disconnected ──BeforeConnect──▶ Connecting ──Connected──▶ Connected
//!      ▲                                                       │
//!      │                                                   Subscribed
//!      └────────────────Disconnected (from any state)──────────┘
//! ```
//!
//! Reconnection itself belongs to the transport. The dispatcher only
//! re-subscribes when a new session opens, and routes inbound data.

use lc_mqtt_channel::{Channel, ChannelEvent};
use rumqttc::QoS;

use crate::router::{Outbound, RouteOutcome, TopicRouter};

/// Delivery level for control topic subscriptions.
pub const SUBSCRIBE_QOS: QoS = QoS::AtLeastOnce;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Subscribed,
}

/// One broker connection. Dropped on disconnect, which forgets every
/// subscription made through it.
#[derive(Debug, Default)]
struct ConnectionSession {
    subscribed: Vec<String>,
}

pub struct Dispatcher<'a, C: Channel> {
    channel: &'a C,
    router: TopicRouter,
    state: ConnectionState,
    session: Option<ConnectionSession>,
}

impl<'a, C: Channel> Dispatcher<'a, C> {
    pub fn new(channel: &'a C, router: TopicRouter) -> Self {
        Self {
            channel,
            router,
            state: ConnectionState::Disconnected,
            session: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Topics subscribed in the current session.
    pub fn active_subscriptions(&self) -> &[String] {
        self.session
            .as_ref()
            .map(|s| s.subscribed.as_slice())
            .unwrap_or_default()
    }

    /// Handle one transport event. Never fails; problems are logged.
    pub async fn handle_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::BeforeConnect => {
                tracing::debug!("MQTT connecting");
                self.state = ConnectionState::Connecting;
            }
            ChannelEvent::Connected => self.on_connected().await,
            ChannelEvent::Disconnected => {
                tracing::info!("MQTT disconnected");
                self.session = None;
                self.state = ConnectionState::Disconnected;
            }
            ChannelEvent::SubscribeRequested(msg_id) => {
                tracing::info!(msg_id, "sent subscribe successful");
            }
            ChannelEvent::PublishRequested(msg_id) => {
                tracing::debug!(msg_id, "sent publish");
            }
            ChannelEvent::Subscribed(msg_id) => {
                tracing::info!(msg_id, "MQTT subscribed");
                if self.session.is_some() {
                    self.state = ConnectionState::Subscribed;
                }
            }
            ChannelEvent::Unsubscribed(msg_id) => {
                tracing::info!(msg_id, "MQTT unsubscribed");
            }
            ChannelEvent::Published(msg_id) => {
                tracing::info!(msg_id, "MQTT published");
            }
            ChannelEvent::Data { topic, payload } => self.on_data(&topic, &payload).await,
            ChannelEvent::Error(error) => {
                tracing::error!(error = %error, "MQTT error");
            }
        }
    }

    async fn on_connected(&mut self) {
        if self.session.is_some() {
            tracing::debug!("connected event within open session, subscriptions kept");
            return;
        }
        tracing::info!("MQTT connected");
        self.state = ConnectionState::Connected;

        let session = self.session.insert(ConnectionSession::default());
        for topic in self.router.topics() {
            match self.channel.subscribe(topic, SUBSCRIBE_QOS).await {
                Ok(()) => session.subscribed.push(topic.to_string()),
                Err(e) => tracing::warn!(topic, error = %e, "subscribe failed"),
            }
        }
    }

    async fn on_data(&self, topic: &str, payload: &[u8]) {
        tracing::info!(topic, len = payload.len(), "MQTT data");
        match self.router.route(topic, payload) {
            RouteOutcome::NotHandled => tracing::warn!(topic, "topic not handled"),
            RouteOutcome::Handled(None) => {}
            RouteOutcome::Handled(Some(outbound)) => self.publish(outbound).await,
        }
    }

    async fn publish(&self, outbound: Outbound) {
        let Outbound {
            topic,
            payload,
            qos,
            retain,
        } = outbound;
        match self.channel.publish(&topic, &payload, qos, retain).await {
            Ok(()) => tracing::debug!(topic = %topic, "status published"),
            Err(e) => tracing::warn!(topic = %topic, error = %e, "failed to publish status"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lc_gpio::{IsrGpio, Level, MockGpio, PinBinding, PinControl, PinId, Subsystem};
    use lc_mqtt_channel::MockChannel;

    use super::*;
    use crate::router::LightControlHandler;

    const CONTROL: &str = "/pk/dn/user/light_control";
    const STATUS: &str = "/pk/dn/user/light_status";
    const LIGHT: PinId = PinId(2);

    fn setup() -> (Arc<MockGpio>, TopicRouter) {
        let gpio = Arc::new(MockGpio::new());
        let pins = PinControl::bind(
            gpio.clone(),
            &[PinBinding::output(2, Subsystem::ControlChannel)],
        )
        .unwrap();
        let light = pins.output(LIGHT, Subsystem::ControlChannel).unwrap();
        let router =
            TopicRouter::new().with_route(CONTROL, LightControlHandler::new(light, STATUS));
        (gpio, router)
    }

    fn data(topic: &str, payload: &[u8]) -> ChannelEvent {
        ChannelEvent::Data {
            topic: topic.to_string(),
            payload: payload.to_vec(),
        }
    }

    async fn connect(dispatcher: &mut Dispatcher<'_, MockChannel>) {
        dispatcher.handle_event(ChannelEvent::BeforeConnect).await;
        dispatcher.handle_event(ChannelEvent::Connected).await;
        dispatcher.handle_event(ChannelEvent::Subscribed(1)).await;
    }

    #[tokio::test]
    async fn lifecycle_states() {
        let (_gpio, router) = setup();
        let mqtt = MockChannel::new();
        let mut dispatcher = Dispatcher::new(&mqtt, router);
        assert_eq!(dispatcher.state(), ConnectionState::Disconnected);

        dispatcher.handle_event(ChannelEvent::BeforeConnect).await;
        assert_eq!(dispatcher.state(), ConnectionState::Connecting);

        dispatcher.handle_event(ChannelEvent::Connected).await;
        assert_eq!(dispatcher.state(), ConnectionState::Connected);
        assert_eq!(
            mqtt.subscriptions(),
            vec![(CONTROL.to_string(), QoS::AtLeastOnce)]
        );
        assert_eq!(dispatcher.active_subscriptions(), [CONTROL.to_string()]);

        dispatcher.handle_event(ChannelEvent::SubscribeRequested(1)).await;
        assert_eq!(dispatcher.state(), ConnectionState::Connected);
        dispatcher.handle_event(ChannelEvent::Subscribed(1)).await;
        assert_eq!(dispatcher.state(), ConnectionState::Subscribed);

        dispatcher.handle_event(ChannelEvent::Disconnected).await;
        assert_eq!(dispatcher.state(), ConnectionState::Disconnected);
        assert!(dispatcher.active_subscriptions().is_empty());
    }

    #[tokio::test]
    async fn on_command_twice_publishes_twice() {
        let (gpio, router) = setup();
        let mqtt = MockChannel::new();
        let mut dispatcher = Dispatcher::new(&mqtt, router);
        connect(&mut dispatcher).await;

        dispatcher.handle_event(data(CONTROL, br#"{"switch":"on"}"#)).await;
        dispatcher.handle_event(data(CONTROL, br#"{"switch":"on"}"#)).await;

        let published = mqtt.published_to(STATUS);
        assert_eq!(published.len(), 2);
        for msg in &published {
            assert_eq!(msg.payload, br#"{"lightStatus": "on"}"#);
            assert_eq!(msg.qos, QoS::AtMostOnce);
            assert!(!msg.retain);
        }
        assert_eq!(gpio.level(LIGHT), Level::High);
        assert_eq!(dispatcher.state(), ConnectionState::Subscribed);
    }

    #[tokio::test]
    async fn other_topics_ignored() {
        let (gpio, router) = setup();
        let mqtt = MockChannel::new();
        let mut dispatcher = Dispatcher::new(&mqtt, router);
        connect(&mut dispatcher).await;

        dispatcher.handle_event(data(STATUS, br#"{"switch":"on"}"#)).await;
        dispatcher
            .handle_event(data("/pk/other/user/light_control", br#"{"switch":"on"}"#))
            .await;

        assert!(mqtt.published().is_empty());
        assert_eq!(gpio.writes(LIGHT), 0);
    }

    #[tokio::test]
    async fn bad_payloads_keep_connection_state() {
        let (gpio, router) = setup();
        let mqtt = MockChannel::new();
        let mut dispatcher = Dispatcher::new(&mqtt, router);
        connect(&mut dispatcher).await;

        for payload in [
            &br#"{"switch":"toggle"}"#[..],
            &br#"{"switch":"ON"}"#[..],
            &br#"{"switch":"#[..],
            &b"not json"[..],
            &br#"["switch","on"]"#[..],
        ] {
            dispatcher.handle_event(data(CONTROL, payload)).await;
            assert_eq!(dispatcher.state(), ConnectionState::Subscribed);
        }

        assert!(mqtt.published().is_empty());
        assert_eq!(gpio.writes(LIGHT), 0);
    }

    #[tokio::test]
    async fn reconnect_resubscribes_once() {
        let (_gpio, router) = setup();
        let mqtt = MockChannel::new();
        let mut dispatcher = Dispatcher::new(&mqtt, router);

        connect(&mut dispatcher).await;
        assert_eq!(mqtt.subscription_count(CONTROL), 1);

        for cycle in 2..=4 {
            dispatcher.handle_event(ChannelEvent::Disconnected).await;
            connect(&mut dispatcher).await;
            assert_eq!(mqtt.subscription_count(CONTROL), cycle);
            assert_eq!(dispatcher.active_subscriptions().len(), 1);
        }
    }

    #[tokio::test]
    async fn duplicate_connected_does_not_resubscribe() {
        let (_gpio, router) = setup();
        let mqtt = MockChannel::new();
        let mut dispatcher = Dispatcher::new(&mqtt, router);

        connect(&mut dispatcher).await;
        dispatcher.handle_event(ChannelEvent::Connected).await;

        assert_eq!(mqtt.subscription_count(CONTROL), 1);
        assert_eq!(dispatcher.state(), ConnectionState::Subscribed);
    }

    #[tokio::test]
    async fn failed_subscribe_retried_next_session() {
        let (_gpio, router) = setup();
        let mqtt = MockChannel::new();
        let mut dispatcher = Dispatcher::new(&mqtt, router);

        mqtt.fail_subscribes(true);
        dispatcher.handle_event(ChannelEvent::BeforeConnect).await;
        dispatcher.handle_event(ChannelEvent::Connected).await;
        assert_eq!(dispatcher.state(), ConnectionState::Connected);
        assert!(dispatcher.active_subscriptions().is_empty());

        mqtt.fail_subscribes(false);
        dispatcher.handle_event(ChannelEvent::Disconnected).await;
        connect(&mut dispatcher).await;
        assert_eq!(mqtt.subscription_count(CONTROL), 1);
    }

    #[tokio::test]
    async fn publish_failure_is_swallowed() {
        let (gpio, router) = setup();
        let mqtt = MockChannel::new();
        let mut dispatcher = Dispatcher::new(&mqtt, router);
        connect(&mut dispatcher).await;

        mqtt.fail_publishes(true);
        dispatcher.handle_event(data(CONTROL, br#"{"switch":"on"}"#)).await;

        assert_eq!(gpio.level(LIGHT), Level::High);
        assert!(mqtt.published().is_empty());
        assert_eq!(dispatcher.state(), ConnectionState::Subscribed);
    }

    #[tokio::test]
    async fn error_event_keeps_state() {
        let (_gpio, router) = setup();
        let mqtt = MockChannel::new();
        let mut dispatcher = Dispatcher::new(&mqtt, router);
        connect(&mut dispatcher).await;

        dispatcher
            .handle_event(ChannelEvent::Error("connection reset".into()))
            .await;
        assert_eq!(dispatcher.state(), ConnectionState::Subscribed);
    }

    #[tokio::test]
    async fn subscribed_without_session_keeps_state() {
        let (_gpio, router) = setup();
        let mqtt = MockChannel::new();
        let mut dispatcher = Dispatcher::new(&mqtt, router);

        dispatcher.handle_event(ChannelEvent::Subscribed(9)).await;
        assert_eq!(dispatcher.state(), ConnectionState::Disconnected);
    }
}
