//! In-memory GPIO driver.
//!
//! Pin levels are atomics so the interrupt-safe operations never lock.
//! Inputs are driven from test code with `drive_input`; qualifying
//! transitions invoke the registered edge callback synchronously on the
//! calling thread, standing in for the interrupt.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::error::{GpioError, GpioResult};
use crate::interface::{EdgeCallback, GpioDriver, IsrGpio};
use crate::types::{EdgeTrigger, Level, PinId, PinMode};

/// Number of GPIOs on the simulated board (0..=39).
pub const MOCK_PIN_COUNT: u32 = 40;

type SharedCallback = Arc<dyn Fn(PinId) + Send + Sync + 'static>;

/// Mock GPIO driver with simulated inputs and write recording.
pub struct MockGpio {
    levels: Vec<AtomicBool>,
    writes: Vec<AtomicUsize>,
    modes: Mutex<Vec<PinMode>>,
    isr_installed: AtomicBool,
    callbacks: RwLock<HashMap<PinId, (EdgeTrigger, SharedCallback)>>,
}

impl MockGpio {
    pub fn new() -> Self {
        Self {
            levels: (0..MOCK_PIN_COUNT).map(|_| AtomicBool::new(false)).collect(),
            writes: (0..MOCK_PIN_COUNT).map(|_| AtomicUsize::new(0)).collect(),
            modes: Mutex::new(vec![PinMode::Unconfigured; MOCK_PIN_COUNT as usize]),
            isr_installed: AtomicBool::new(false),
            callbacks: RwLock::new(HashMap::new()),
        }
    }

    /// Apply an external level to an input pin, firing the edge callback
    /// when the transition matches its trigger.
    pub fn drive_input(&self, pin: PinId, level: Level) {
        let Some(cell) = self.levels.get(pin.0 as usize) else {
            return;
        };
        let previous = Level::from_bool(cell.swap(level.is_high(), Ordering::SeqCst));

        let callback = {
            let callbacks = self.callbacks.read().unwrap_or_else(|e| e.into_inner());
            callbacks
                .get(&pin)
                .filter(|(trigger, _)| trigger.matches(previous, level))
                .map(|(_, cb)| cb.clone())
        };

        if let Some(cb) = callback {
            cb(pin);
        }
    }

    /// One rising then one falling transition.
    pub fn pulse(&self, pin: PinId) {
        self.drive_input(pin, Level::High);
        self.drive_input(pin, Level::Low);
    }

    /// Number of `set_level` calls made on a pin.
    pub fn writes(&self, pin: PinId) -> usize {
        self.writes
            .get(pin.0 as usize)
            .map(|w| w.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    pub fn mode(&self, pin: PinId) -> PinMode {
        self.modes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(pin.0 as usize)
            .copied()
            .unwrap_or_default()
    }

    pub fn interrupt_service_installed(&self) -> bool {
        self.isr_installed.load(Ordering::SeqCst)
    }

    pub fn has_edge_callback(&self, pin: PinId) -> bool {
        self.callbacks
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&pin)
    }

    fn set_mode(&self, pin: PinId, mode: PinMode) -> GpioResult<()> {
        let mut modes = self.modes.lock().unwrap_or_else(|e| e.into_inner());
        let slot = modes
            .get_mut(pin.0 as usize)
            .ok_or(GpioError::InvalidPin { pin })?;
        *slot = mode;
        Ok(())
    }
}

impl Default for MockGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl IsrGpio for MockGpio {
    fn set_level(&self, pin: PinId, level: Level) {
        if let Some(cell) = self.levels.get(pin.0 as usize) {
            cell.store(level.is_high(), Ordering::SeqCst);
            self.writes[pin.0 as usize].fetch_add(1, Ordering::SeqCst);
        }
    }

    fn level(&self, pin: PinId) -> Level {
        self.levels
            .get(pin.0 as usize)
            .map(|cell| Level::from_bool(cell.load(Ordering::SeqCst)))
            .unwrap_or_default()
    }
}

impl GpioDriver for MockGpio {
    fn configure_input(&self, pin: PinId) -> GpioResult<()> {
        self.set_mode(pin, PinMode::Input)
    }

    fn configure_output(&self, pin: PinId) -> GpioResult<()> {
        self.set_mode(pin, PinMode::Output)
    }

    fn install_interrupt_service(&self) -> GpioResult<()> {
        if self.isr_installed.swap(true, Ordering::SeqCst) {
            return Err(GpioError::Driver(
                "interrupt service already installed".into(),
            ));
        }
        Ok(())
    }

    fn register_edge_callback(
        &self,
        pin: PinId,
        trigger: EdgeTrigger,
        callback: EdgeCallback,
    ) -> GpioResult<()> {
        if !self.interrupt_service_installed() {
            return Err(GpioError::InterruptServiceNotInstalled);
        }
        match self.mode(pin) {
            PinMode::Input => {}
            _ if pin.0 >= MOCK_PIN_COUNT => return Err(GpioError::InvalidPin { pin }),
            _ => return Err(GpioError::NotInput { pin }),
        }
        self.callbacks
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(pin, (trigger, Arc::from(callback)));
        Ok(())
    }
}
