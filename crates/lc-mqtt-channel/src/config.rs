use serde::Deserialize;

/// MQTT connection configuration, loadable from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct MqttConfig {
    /// Start the control channel at boot.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Static broker (`mqtt://host:port`). When absent the regional
    /// endpoint is derived from the device identity.
    #[serde(default)]
    pub broker_url: Option<String>,
    /// Username, required with `broker_url`.
    #[serde(default)]
    pub username: Option<String>,
    /// Signed password from the provisioning tooling.
    #[serde(default)]
    pub password: Option<String>,
    /// Client ID, required with `broker_url`.
    #[serde(default)]
    pub client_id: Option<String>,
    /// Port for the derived regional endpoint.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Keep-alive interval in seconds.
    #[serde(default = "default_keepalive")]
    pub keepalive_secs: u16,
    /// Connect over TLS (server authentication only). An `mqtts://` or
    /// `ssl://` broker URL turns TLS on regardless.
    #[serde(default)]
    pub use_tls: bool,
    /// CA certificate (PEM) used when TLS is enabled.
    #[serde(default)]
    pub ca_cert_path: String,
    /// Pause between a transport error and the next connection attempt.
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            broker_url: None,
            username: None,
            password: None,
            client_id: None,
            port: default_port(),
            keepalive_secs: default_keepalive(),
            use_tls: false,
            ca_cert_path: String::new(),
            reconnect_delay_secs: default_reconnect_delay(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_port() -> u16 {
    1883
}

fn default_keepalive() -> u16 {
    30
}

fn default_reconnect_delay() -> u64 {
    5
}
