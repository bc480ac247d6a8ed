//! Shared test harness for E2E integration tests.
//!
//! Boots the real controller on a `MockGpio` board with the network side
//! disabled, then drives a dispatcher over a `MockChannel` built from the
//! same control router the boot routine would use.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use lc_gpio::{IsrGpio, Level, MockGpio, PinId};
use lc_light_agent::boot::{self, Device};
use lc_light_agent::config::AgentConfig;
use lc_light_agent::dispatcher::Dispatcher;
use lc_mqtt_channel::{ChannelEvent, MockChannel};

pub const PRODUCT_KEY: &str = "a1CEwF7bES6";
pub const DEVICE_NAME: &str = "light-1";

pub const EDGE_INPUT: PinId = PinId(33);
pub const EDGE_OUTPUT: PinId = PinId(32);
pub const LIGHT: PinId = PinId(2);

/// Config matching the reference board, MQTT disabled.
pub fn test_config() -> AgentConfig {
    let toml = format!(
        r#"
[device]
product_key = "{PRODUCT_KEY}"
product_secret = "product-secret"
device_name = "{DEVICE_NAME}"
device_secret = "device-secret"

[mqtt]
enabled = false
"#
    );
    toml::from_str(&toml).unwrap()
}

/// End-to-end harness: a booted controller plus a mock MQTT channel.
pub struct TestHarness {
    pub config: AgentConfig,
    /// Simulated board.
    pub gpio: Arc<MockGpio>,
    /// Controller booted on `gpio`.
    pub device: Device<MockGpio>,
    /// Records everything the dispatcher publishes or subscribes.
    pub mqtt: MockChannel,
}

impl TestHarness {
    /// Boot with the default board layout. Call from a tokio runtime.
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_queue_capacity(capacity: usize) -> Self {
        let mut config = test_config();
        config.edge.queue_capacity = capacity;
        Self::with_config(config)
    }

    pub fn with_config(config: AgentConfig) -> Self {
        let gpio = Arc::new(MockGpio::new());
        let device = boot::boot(&config, gpio.clone()).unwrap();
        Self {
            config,
            gpio,
            device,
            mqtt: MockChannel::new(),
        }
    }

    /// A dispatcher wired to the booted controller's light output.
    pub fn dispatcher(&self) -> Dispatcher<'_, MockChannel> {
        let router = boot::control_router(&self.config, self.device.pins()).unwrap();
        Dispatcher::new(&self.mqtt, router)
    }

    pub fn control_topic(&self) -> String {
        self.config.control_topic()
    }

    pub fn status_topic(&self) -> String {
        self.config.status_topic()
    }

    pub fn light(&self) -> Level {
        self.gpio.level(LIGHT)
    }

    pub fn edge_output(&self) -> Level {
        self.gpio.level(EDGE_OUTPUT)
    }

    /// Deliver `n` rising edges (each followed by a falling edge).
    pub fn pulse_edges(&self, n: usize) {
        for _ in 0..n {
            self.gpio.pulse(EDGE_INPUT);
        }
    }

    /// Give the consumer task time to drain the queue.
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

/// Walk a dispatcher through a full connect: connecting, connected,
/// subscribe acknowledged.
pub async fn connect(dispatcher: &mut Dispatcher<'_, MockChannel>) {
    dispatcher.handle_event(ChannelEvent::BeforeConnect).await;
    dispatcher.handle_event(ChannelEvent::Connected).await;
    dispatcher.handle_event(ChannelEvent::Subscribed(1)).await;
}

/// Deliver an inbound message.
pub async fn deliver(dispatcher: &mut Dispatcher<'_, MockChannel>, topic: &str, payload: &[u8]) {
    dispatcher
        .handle_event(ChannelEvent::Data {
            topic: topic.to_string(),
            payload: payload.to_vec(),
        })
        .await;
}
