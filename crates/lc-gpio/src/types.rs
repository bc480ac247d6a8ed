//! Pin identifiers, logic levels, and binding descriptors.

use serde::{Deserialize, Serialize};

/// Board GPIO number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinId(pub u32);

impl std::fmt::Display for PinId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GPIO[{}]", self.0)
    }
}

/// Digital logic level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Level {
    #[default]
    Low,
    High,
}

impl Level {
    pub fn from_bool(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }

    /// Level for the `count`-th toggle: odd counts are high.
    pub fn from_parity(count: u32) -> Self {
        Self::from_bool(count % 2 == 1)
    }

    pub fn is_high(self) -> bool {
        matches!(self, Self::High)
    }

    pub fn as_bit(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::High => 1,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_bit())
    }
}

/// Which input transitions raise an edge interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeTrigger {
    Rising,
    Falling,
    AnyEdge,
}

impl EdgeTrigger {
    /// Whether a `from` → `to` transition qualifies.
    pub fn matches(self, from: Level, to: Level) -> bool {
        match (self, from, to) {
            (Self::Rising | Self::AnyEdge, Level::Low, Level::High) => true,
            (Self::Falling | Self::AnyEdge, Level::High, Level::Low) => true,
            _ => false,
        }
    }
}

/// Direction a pin has been configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PinMode {
    #[default]
    Unconfigured,
    Input,
    Output,
}

/// Subsystem that owns (writes) an output pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsystem {
    EdgePipeline,
    ControlChannel,
}

impl std::fmt::Display for Subsystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EdgePipeline => f.write_str("edge pipeline"),
            Self::ControlChannel => f.write_str("control channel"),
        }
    }
}

/// A pin and the role it is bound to at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinBinding {
    Input(PinId),
    Output { pin: PinId, owner: Subsystem },
}

impl PinBinding {
    pub fn input(pin: u32) -> Self {
        Self::Input(PinId(pin))
    }

    pub fn output(pin: u32, owner: Subsystem) -> Self {
        Self::Output {
            pin: PinId(pin),
            owner,
        }
    }

    pub fn pin(&self) -> PinId {
        match self {
            Self::Input(pin) => *pin,
            Self::Output { pin, .. } => *pin,
        }
    }
}
