//! Status reports echoed back after a command is applied.

use serde::{Deserialize, Serialize};

use crate::commands::SwitchAction;

/// Light status message published on the status topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub light_status: SwitchAction,
}

impl StatusReport {
    pub fn new(action: SwitchAction) -> Self {
        Self {
            light_status: action,
        }
    }

    /// Wire payload. Byte-exact with the format consumers already parse.
    pub fn payload(&self) -> &'static [u8] {
        match self.light_status {
            SwitchAction::On => br#"{"lightStatus": "on"}"#,
            SwitchAction::Off => br#"{"lightStatus": "off"}"#,
        }
    }
}
