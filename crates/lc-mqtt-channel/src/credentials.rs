//! Credential providers.
//!
//! A provider turns the static device identity into broker connection
//! parameters. Signing itself happens outside the controller; providers
//! only assemble what they are given, synchronously and without I/O.

use lc_protocol::{ConnectionParams, DeviceCredentials};

use crate::config::MqttConfig;
use crate::error::{MqttError, MqttResult};

/// Produces connection parameters for a device.
pub trait CredentialProvider: Send + Sync {
    fn connection_params(
        &self,
        device: &DeviceCredentials,
        region: &str,
    ) -> MqttResult<ConnectionParams>;
}

/// Select the provider described by `config`.
///
/// A configured `broker_url` means a fixed broker; otherwise the regional
/// IoT endpoint is derived from the device identity.
pub fn from_config(config: &MqttConfig) -> MqttResult<Box<dyn CredentialProvider>> {
    match config.broker_url.as_deref() {
        Some(url) => Ok(Box::new(StaticCredentials::from_config(url, config)?)),
        None => {
            let password = config.password.clone().ok_or_else(|| {
                MqttError::Credentials("mqtt.password is required for the regional endpoint".into())
            })?;
            Ok(Box::new(
                AliyunCredentials::new(password, config.port).with_tls(config.use_tls),
            ))
        }
    }
}

/// Check parameters before they reach the MQTT client, which refuses
/// client ids that are empty or start with a space.
pub fn validate_params(params: &ConnectionParams) -> MqttResult<()> {
    if params.host.is_empty() {
        return Err(MqttError::Credentials("broker host is empty".into()));
    }
    if params.client_id.is_empty() || params.client_id.starts_with(' ') {
        return Err(MqttError::Credentials(format!(
            "client id {:?} must be non-empty and must not start with a space",
            params.client_id
        )));
    }
    Ok(())
}

// ── Broker URL ────────────────────────────────────────────────

/// Host and port split out of a broker URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerAddress {
    pub host: String,
    pub port: u16,
    pub tls: bool,
}

/// Parse `scheme://host[:port]`.
///
/// Accepted schemes: `mqtt`, `tcp` (default port 1883) and `mqtts`, `ssl`
/// (default port 8883).
pub fn parse_broker_url(url: &str) -> MqttResult<BrokerAddress> {
    let invalid = |reason: &str| MqttError::InvalidBrokerUrl(format!("{url:?}: {reason}"));

    let (scheme, rest) = url.split_once("://").ok_or_else(|| invalid("missing scheme"))?;
    let (tls, default_port) = match scheme {
        "mqtt" | "tcp" => (false, 1883),
        "mqtts" | "ssl" => (true, 8883),
        _ => return Err(invalid("unsupported scheme")),
    };

    let authority = rest.trim_end_matches('/');
    if authority.contains('/') {
        return Err(invalid("unexpected path"));
    }

    let (host, port) = match authority.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse::<u16>().map_err(|_| invalid("bad port"))?;
            (host, port)
        }
        None => (authority, default_port),
    };

    if host.is_empty() {
        return Err(invalid("missing host"));
    }
    if port == 0 {
        return Err(invalid("port must be non-zero"));
    }

    Ok(BrokerAddress {
        host: host.to_string(),
        port,
        tls,
    })
}

// ── StaticCredentials ─────────────────────────────────────────

/// Fixed broker with pre-provisioned login.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    params: ConnectionParams,
}

impl StaticCredentials {
    pub fn new(params: ConnectionParams) -> Self {
        Self { params }
    }

    /// Build from `broker_url` plus the username/password/client id fields.
    /// TLS is used when the scheme asks for it or `use_tls` is set.
    pub fn from_config(url: &str, config: &MqttConfig) -> MqttResult<Self> {
        let address = parse_broker_url(url)?;
        let require = |value: &Option<String>, field: &str| {
            value
                .clone()
                .ok_or_else(|| MqttError::Credentials(format!("mqtt.{field} is required with broker_url")))
        };

        Ok(Self::new(ConnectionParams {
            host: address.host,
            port: address.port,
            username: require(&config.username, "username")?,
            password: require(&config.password, "password")?,
            client_id: require(&config.client_id, "client_id")?,
            tls: address.tls || config.use_tls,
        }))
    }
}

impl CredentialProvider for StaticCredentials {
    fn connection_params(
        &self,
        _device: &DeviceCredentials,
        _region: &str,
    ) -> MqttResult<ConnectionParams> {
        validate_params(&self.params)?;
        Ok(self.params.clone())
    }
}

// ── AliyunCredentials ─────────────────────────────────────────

/// Regional Alibaba Cloud IoT endpoint.
///
/// Host, username, and client id follow the platform's naming scheme. The
/// password is the HMAC-SHA256 signature computed by the provisioning
/// tooling from the device secret, passed through unchanged.
#[derive(Clone)]
pub struct AliyunCredentials {
    signed_password: String,
    port: u16,
    tls: bool,
}

impl AliyunCredentials {
    pub fn new(signed_password: impl Into<String>, port: u16) -> Self {
        Self {
            signed_password: signed_password.into(),
            port,
            tls: false,
        }
    }

    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }
}

impl CredentialProvider for AliyunCredentials {
    fn connection_params(
        &self,
        device: &DeviceCredentials,
        region: &str,
    ) -> MqttResult<ConnectionParams> {
        if region.is_empty() {
            return Err(MqttError::Credentials("region must not be empty".into()));
        }
        if self.signed_password.is_empty() {
            return Err(MqttError::Credentials("signed password is empty".into()));
        }
        device
            .validate()
            .map_err(|e| MqttError::Credentials(e.to_string()))?;

        let pk = &device.product_key;
        let dn = &device.device_name;
        let params = ConnectionParams {
            host: format!("{pk}.iot-as-mqtt.{region}.aliyuncs.com"),
            port: self.port,
            username: format!("{dn}&{pk}"),
            password: self.signed_password.clone(),
            client_id: format!("{dn}|securemode=3,signmethod=hmacsha256|"),
            tls: self.tls,
        };
        validate_params(&params)?;
        Ok(params)
    }
}
