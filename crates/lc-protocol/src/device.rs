use serde::Deserialize;
use thiserror::Error;

/// Static device identity issued by the IoT platform.
///
/// Immutable for the process lifetime. Fed to a credential provider to
/// obtain [`ConnectionParams`].
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceCredentials {
    pub product_key: String,
    #[serde(default)]
    pub product_secret: String,
    pub device_name: String,
    #[serde(default)]
    pub device_secret: String,
}

/// Identity fields that fail basic shape checks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidCredentials {
    #[error("product_key must not be empty")]
    EmptyProductKey,

    #[error("device_name must not be empty")]
    EmptyDeviceName,

    #[error("{field} must not contain '/' (got {value:?})")]
    TopicSeparator { field: &'static str, value: String },
}

impl DeviceCredentials {
    /// Check that both identifiers can be embedded in a topic.
    pub fn validate(&self) -> Result<(), InvalidCredentials> {
        if self.product_key.is_empty() {
            return Err(InvalidCredentials::EmptyProductKey);
        }
        if self.device_name.is_empty() {
            return Err(InvalidCredentials::EmptyDeviceName);
        }
        for (field, value) in [
            ("product_key", &self.product_key),
            ("device_name", &self.device_name),
        ] {
            if value.contains('/') {
                return Err(InvalidCredentials::TopicSeparator {
                    field,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for DeviceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceCredentials")
            .field("product_key", &self.product_key)
            .field("product_secret", &"<redacted>")
            .field("device_name", &self.device_name)
            .field("device_secret", &"<redacted>")
            .finish()
    }
}

/// Parameters for opening a broker connection.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub client_id: String,
    /// Connect over TLS.
    pub tls: bool,
}

impl std::fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("tls", &self.tls)
            .finish()
    }
}
