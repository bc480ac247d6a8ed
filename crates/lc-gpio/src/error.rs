//! GPIO error types.

use thiserror::Error;

use crate::types::{PinId, Subsystem};

/// Errors raised while configuring or binding pins.
///
/// All of these are configuration-time failures; once a pin is bound the
/// runtime operations on it cannot fail.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GpioError {
    #[error("{pin} does not exist on this board")]
    InvalidPin { pin: PinId },

    #[error("{pin} is bound more than once")]
    PinConflict { pin: PinId },

    #[error("{pin} is owned by {owner}, not {requested}")]
    NotOwner {
        pin: PinId,
        owner: Subsystem,
        requested: Subsystem,
    },

    #[error("{pin} is not bound to this controller")]
    UnboundPin { pin: PinId },

    #[error("{pin} is not configured as an input")]
    NotInput { pin: PinId },

    #[error("interrupt service is not installed")]
    InterruptServiceNotInstalled,

    #[error("GPIO driver error: {0}")]
    Driver(String),
}

/// Convenience alias for GPIO results.
pub type GpioResult<T> = Result<T, GpioError>;
