use lc_gpio::GpioError;
use lc_mqtt_channel::MqttError;
use thiserror::Error;

/// Failures while bringing the controller up.
///
/// Any of these aborts boot; nothing is retried at this level.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("gpio: {0}")]
    Gpio(#[from] GpioError),

    #[error("mqtt: {0}")]
    Mqtt(#[from] MqttError),
}

pub type StartupResult<T> = Result<T, StartupError>;
