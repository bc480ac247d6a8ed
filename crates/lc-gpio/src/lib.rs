//! GPIO capability layer.
//!
//! - `IsrGpio`: the non-blocking subset callable from interrupt context
//! - `GpioDriver`: full driver surface used at boot and by tasks
//! - `PinControl`: facade binding pins to their owning subsystem
//! - `MockGpio`: in-memory driver with simulated inputs

pub mod error;
pub mod facade;
pub mod interface;
pub mod mock;
pub mod types;

pub use error::{GpioError, GpioResult};
pub use facade::{InputHandle, OutputHandle, PinControl};
pub use interface::{EdgeCallback, GpioDriver, IsrGpio};
pub use mock::MockGpio;
pub use types::{EdgeTrigger, Level, PinBinding, PinId, PinMode, Subsystem};
