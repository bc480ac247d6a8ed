//! TLS transport for broker connections.
//!
//! The IoT endpoint authenticates the device by its signed password, so
//! only the server certificate is verified here.

use rumqttc::{TlsConfiguration, Transport};

use crate::config::MqttConfig;
use crate::error::{MqttError, MqttResult};

/// Build a TLS transport trusting the CA certificate in the config.
pub fn load_tls_transport(config: &MqttConfig) -> MqttResult<Transport> {
    let path = &config.ca_cert_path;
    let ca = std::fs::read(path)
        .map_err(|e| MqttError::Tls(format!("cannot read CA cert {path:?}: {e}")))?;

    Ok(Transport::tls_with_config(TlsConfiguration::Simple {
        ca,
        alpn: None,
        client_auth: None,
    }))
}
