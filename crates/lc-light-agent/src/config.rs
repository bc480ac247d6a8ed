//! Controller configuration, loadable from TOML.

use lc_gpio::{PinBinding, PinId, Subsystem};
use lc_mqtt_channel::MqttConfig;
use lc_protocol::{DeviceCredentials, topics};
use serde::Deserialize;

use crate::edge::MAX_QUEUE_CAPACITY;
use crate::error::{StartupError, StartupResult};

/// Top-level configuration for the controller.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// IoT platform region used to derive the broker endpoint.
    #[serde(default = "default_region")]
    pub region: String,
    /// Static identity issued by the platform.
    pub device: DeviceCredentials,
    /// MQTT connection settings. Defaults to the regional endpoint.
    #[serde(default)]
    pub mqtt: MqttConfig,
    #[serde(default)]
    pub pins: PinConfig,
    #[serde(default)]
    pub edge: EdgeConfig,
    #[serde(default)]
    pub topics: TopicConfig,
}

/// Board pin assignment.
#[derive(Debug, Clone, Deserialize)]
pub struct PinConfig {
    /// Input watched for rising edges.
    #[serde(default = "default_edge_input")]
    pub edge_input: u32,
    /// Output toggled on every edge.
    #[serde(default = "default_edge_output")]
    pub edge_output: u32,
    /// Output driven by MQTT light commands.
    #[serde(default = "default_light_output")]
    pub light_output: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EdgeConfig {
    /// Events buffered between the interrupt and the consumer task.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

/// Suffixes appended to `/{product_key}/{device_name}/user/`.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicConfig {
    #[serde(default = "default_control_suffix")]
    pub control_suffix: String,
    #[serde(default = "default_status_suffix")]
    pub status_suffix: String,
}

fn default_region() -> String {
    "cn-shanghai".to_string()
}

fn default_edge_input() -> u32 {
    33
}

fn default_edge_output() -> u32 {
    32
}

fn default_light_output() -> u32 {
    2
}

fn default_queue_capacity() -> usize {
    10
}

fn default_control_suffix() -> String {
    topics::CONTROL_SUFFIX.to_string()
}

fn default_status_suffix() -> String {
    topics::STATUS_SUFFIX.to_string()
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            edge_input: default_edge_input(),
            edge_output: default_edge_output(),
            light_output: default_light_output(),
        }
    }
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            control_suffix: default_control_suffix(),
            status_suffix: default_status_suffix(),
        }
    }
}

impl PinConfig {
    pub fn edge_input(&self) -> PinId {
        PinId(self.edge_input)
    }

    pub fn edge_output(&self) -> PinId {
        PinId(self.edge_output)
    }

    pub fn light_output(&self) -> PinId {
        PinId(self.light_output)
    }

    /// Every pin the controller configures, with its owner.
    pub fn bindings(&self) -> [PinBinding; 3] {
        [
            PinBinding::input(self.edge_input),
            PinBinding::output(self.edge_output, Subsystem::EdgePipeline),
            PinBinding::output(self.light_output, Subsystem::ControlChannel),
        ]
    }
}

impl AgentConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Reject configurations the controller cannot start with.
    pub fn validate(&self) -> StartupResult<()> {
        self.device
            .validate()
            .map_err(|e| StartupError::Config(e.to_string()))?;

        if !(1..=MAX_QUEUE_CAPACITY).contains(&self.edge.queue_capacity) {
            return Err(StartupError::Config(format!(
                "edge.queue_capacity must be between 1 and {MAX_QUEUE_CAPACITY} (got {})",
                self.edge.queue_capacity
            )));
        }

        let pins = &self.pins;
        if pins.light_output == pins.edge_output {
            return Err(StartupError::Config(format!(
                "pins.light_output and pins.edge_output are both GPIO[{}]; \
                 each output must belong to one subsystem",
                pins.light_output
            )));
        }
        if pins.edge_input == pins.edge_output || pins.edge_input == pins.light_output {
            return Err(StartupError::Config(format!(
                "pins.edge_input GPIO[{}] is also configured as an output",
                pins.edge_input
            )));
        }

        for (field, suffix) in [
            ("topics.control_suffix", &self.topics.control_suffix),
            ("topics.status_suffix", &self.topics.status_suffix),
        ] {
            if suffix.is_empty() || suffix.contains(['/', '+', '#']) {
                return Err(StartupError::Config(format!(
                    "{field} must be a single non-wildcard topic level (got {suffix:?})"
                )));
            }
        }
        if self.topics.control_suffix == self.topics.status_suffix {
            return Err(StartupError::Config(
                "control and status topics must differ".into(),
            ));
        }

        Ok(())
    }

    pub fn control_topic(&self) -> String {
        topics::user_topic(
            &self.device.product_key,
            &self.device.device_name,
            &self.topics.control_suffix,
        )
    }

    pub fn status_topic(&self) -> String {
        topics::user_topic(
            &self.device.product_key,
            &self.device.device_name,
            &self.topics.status_suffix,
        )
    }
}
