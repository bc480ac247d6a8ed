//! Control command decoding.
//!
//! Inbound control payloads are flat JSON objects such as
//! `{"switch": "on"}`. Decoding never fails with an error: every payload
//! maps to exactly one [`DecodeOutcome`] so callers can match exhaustively.

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Largest control payload accepted, in bytes.
pub const MAX_CONTROL_PAYLOAD: usize = 512;

/// Key carrying the requested switch position.
pub const SWITCH_KEY: &str = "switch";

/// Requested output position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchAction {
    On,
    Off,
}

impl SwitchAction {
    /// Parse a wire value. Matching is case-sensitive.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "on" => Some(Self::On),
            "off" => Some(Self::Off),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }

    /// Whether the output should be driven to logical 1.
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

impl std::fmt::Display for SwitchAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recognized command together with the topic it arrived on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlCommand {
    pub action: SwitchAction,
    pub raw_topic: String,
}

/// Result of decoding a control payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// `"switch"` present with a known value.
    Recognized(SwitchAction),
    /// `"switch"` present but the value is not `"on"` or `"off"`.
    Unrecognized { value: String },
    /// Valid document without a `"switch"` key.
    Absent,
    /// Payload is not a JSON object.
    Malformed { detail: String },
}

impl DecodeOutcome {
    /// Attach the inbound topic to a recognized action.
    pub fn into_command(self, topic: &str) -> Option<ControlCommand> {
        match self {
            Self::Recognized(action) => Some(ControlCommand {
                action,
                raw_topic: topic.to_string(),
            }),
            _ => None,
        }
    }
}

/// Decode a raw control payload.
pub fn decode(payload: &[u8]) -> DecodeOutcome {
    if payload.len() > MAX_CONTROL_PAYLOAD {
        return DecodeOutcome::Malformed {
            detail: format!(
                "payload of {} bytes exceeds {MAX_CONTROL_PAYLOAD} bytes",
                payload.len()
            ),
        };
    }

    let FirstSwitch(value) = match serde_json::from_slice(payload) {
        Ok(found) => found,
        Err(e) => {
            return DecodeOutcome::Malformed {
                detail: e.to_string(),
            };
        }
    };

    let Some(value) = value else {
        return DecodeOutcome::Absent;
    };

    match value.as_str() {
        Some(s) => match SwitchAction::from_wire(s) {
            Some(action) => DecodeOutcome::Recognized(action),
            None => DecodeOutcome::Unrecognized {
                value: s.to_string(),
            },
        },
        None => DecodeOutcome::Unrecognized {
            value: value.to_string(),
        },
    }
}

/// Value of the first top-level `"switch"` key, in document order.
///
/// Later duplicates are skipped. The rest of the document is still parsed
/// so that invalid JSON anywhere is reported as malformed.
struct FirstSwitch(Option<Value>);

impl<'de> Deserialize<'de> for FirstSwitch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(FirstSwitchVisitor)
    }
}

struct FirstSwitchVisitor;

impl<'de> Visitor<'de> for FirstSwitchVisitor {
    type Value = FirstSwitch;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<FirstSwitch, A::Error> {
        let mut first = None;
        while let Some(key) = map.next_key::<String>()? {
            if first.is_none() && key == SWITCH_KEY {
                first = Some(map.next_value::<Value>()?);
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(FirstSwitch(first))
    }
}
