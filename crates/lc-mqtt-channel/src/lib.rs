//! MQTT control channel.
//!
//! Provides the transport-facing half of the controller:
//! - `Channel` trait for publish/subscribe (mockable in tests)
//! - `MqttChannel` over `rumqttc` for the device
//! - `MockChannel` for testing without a broker
//! - `ChannelEvent` classification of transport events
//! - `CredentialProvider` implementations producing `ConnectionParams`

pub mod channel;
pub mod config;
pub mod credentials;
pub mod error;
pub mod handler;
pub mod mock;
pub mod tls;

// Re-exports for convenience.
pub use channel::{Channel, MqttChannel};
pub use config::MqttConfig;
pub use credentials::{AliyunCredentials, CredentialProvider, StaticCredentials};
pub use error::{MqttError, MqttResult};
pub use handler::{ChannelEvent, classify};
pub use mock::MockChannel;
