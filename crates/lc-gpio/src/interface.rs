//! GPIO driver abstraction.
//!
//! The driver surface is split in two. `IsrGpio` holds the operations that
//! are safe in interrupt context: a register write and a register read, no
//! allocation, no locking. `GpioDriver` extends it with configuration and
//! interrupt registration, which only boot code may call. Interrupt-side
//! code is handed an `Arc<dyn IsrGpio>` so the wider surface is not
//! reachable from it.

use crate::error::GpioResult;
use crate::types::{EdgeTrigger, Level, PinId};

/// Edge interrupt handler. Receives the pin that fired.
pub type EdgeCallback = Box<dyn Fn(PinId) + Send + Sync + 'static>;

/// Interrupt-safe pin operations.
pub trait IsrGpio: Send + Sync {
    /// Drive an output pin. Writing the current level again is a no-op.
    fn set_level(&self, pin: PinId, level: Level);

    /// Sample the current level of a pin.
    fn level(&self, pin: PinId) -> Level;
}

/// Full driver surface.
pub trait GpioDriver: IsrGpio {
    fn configure_input(&self, pin: PinId) -> GpioResult<()>;

    fn configure_output(&self, pin: PinId) -> GpioResult<()>;

    /// Install the shared GPIO interrupt service. Must precede
    /// `register_edge_callback`.
    fn install_interrupt_service(&self) -> GpioResult<()>;

    /// Attach `callback` to edges on an input pin.
    fn register_edge_callback(
        &self,
        pin: PinId,
        trigger: EdgeTrigger,
        callback: EdgeCallback,
    ) -> GpioResult<()>;
}
