//! Pin control facade.
//!
//! `PinControl` configures every pin the controller uses in one place and
//! records which subsystem owns each output. A subsystem gets an
//! [`OutputHandle`] for the pins it owns; nothing else can write them.
//! Sharing a pin between subsystems therefore has to be arbitrated
//! explicitly by whoever holds the single handle.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{GpioError, GpioResult};
use crate::interface::{GpioDriver, IsrGpio};
use crate::types::{Level, PinBinding, PinId, Subsystem};

/// Pins bound at boot plus the driver they live on.
pub struct PinControl<G: GpioDriver> {
    gpio: Arc<G>,
    outputs: HashMap<PinId, Subsystem>,
    inputs: Vec<PinId>,
}

impl<G: GpioDriver + 'static> PinControl<G> {
    /// Configure every pin in `bindings`.
    ///
    /// Fails if a pin appears twice or the driver rejects it.
    pub fn bind(gpio: Arc<G>, bindings: &[PinBinding]) -> GpioResult<Self> {
        let mut outputs = HashMap::new();
        let mut inputs = Vec::new();

        for binding in bindings {
            let pin = binding.pin();
            if outputs.contains_key(&pin) || inputs.contains(&pin) {
                return Err(GpioError::PinConflict { pin });
            }
            match *binding {
                PinBinding::Input(pin) => {
                    gpio.configure_input(pin)?;
                    inputs.push(pin);
                    tracing::debug!(pin = %pin, "configured input");
                }
                PinBinding::Output { pin, owner } => {
                    gpio.configure_output(pin)?;
                    outputs.insert(pin, owner);
                    tracing::debug!(pin = %pin, owner = %owner, "configured output");
                }
            }
        }

        Ok(Self {
            gpio,
            outputs,
            inputs,
        })
    }

    /// Drive a bound output.
    pub fn set_output(&self, pin: PinId, level: Level) -> GpioResult<()> {
        if !self.outputs.contains_key(&pin) {
            return Err(GpioError::UnboundPin { pin });
        }
        self.gpio.set_level(pin, level);
        Ok(())
    }

    /// Snapshot the level of a bound pin.
    pub fn read_input(&self, pin: PinId) -> GpioResult<Level> {
        if !self.inputs.contains(&pin) && !self.outputs.contains_key(&pin) {
            return Err(GpioError::UnboundPin { pin });
        }
        Ok(self.gpio.level(pin))
    }

    /// Hand `owner` the write handle for one of its outputs.
    pub fn output(&self, pin: PinId, owner: Subsystem) -> GpioResult<OutputHandle> {
        match self.outputs.get(&pin) {
            Some(bound) if *bound == owner => Ok(OutputHandle {
                pin,
                owner,
                gpio: self.gpio.clone(),
            }),
            Some(bound) => Err(GpioError::NotOwner {
                pin,
                owner: *bound,
                requested: owner,
            }),
            None => Err(GpioError::UnboundPin { pin }),
        }
    }

    /// Read-only, interrupt-safe view of a bound input.
    pub fn input(&self, pin: PinId) -> GpioResult<InputHandle> {
        if !self.inputs.contains(&pin) {
            return Err(GpioError::UnboundPin { pin });
        }
        Ok(InputHandle {
            pin,
            gpio: self.gpio.clone(),
        })
    }
}

/// Write access to one output pin.
///
/// Only exposes interrupt-safe operations, so the same handle serves both
/// task code and the edge interrupt handler.
#[derive(Clone)]
pub struct OutputHandle {
    pin: PinId,
    owner: Subsystem,
    gpio: Arc<dyn IsrGpio>,
}

impl OutputHandle {
    pub fn set(&self, level: Level) {
        self.gpio.set_level(self.pin, level);
    }

    pub fn level(&self) -> Level {
        self.gpio.level(self.pin)
    }

    pub fn pin(&self) -> PinId {
        self.pin
    }
}

impl std::fmt::Debug for OutputHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputHandle")
            .field("pin", &self.pin)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

/// Sampling access to one input pin.
#[derive(Clone)]
pub struct InputHandle {
    pin: PinId,
    gpio: Arc<dyn IsrGpio>,
}

impl InputHandle {
    pub fn level(&self) -> Level {
        self.gpio.level(self.pin)
    }

    pub fn pin(&self) -> PinId {
        self.pin
    }
}

impl std::fmt::Debug for InputHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputHandle")
            .field("pin", &self.pin)
            .finish_non_exhaustive()
    }
}
