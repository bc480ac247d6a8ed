//! MQTT topic builders for the per-device user topic space.
//!
//! Topic structure:
//! ```text
//! /{product_key}/{device_name}/user/light_control   (inbound commands)
//! /{product_key}/{device_name}/user/light_status    (outbound status)
//! ```

/// Default suffix for the inbound control topic.
pub const CONTROL_SUFFIX: &str = "light_control";

/// Default suffix for the outbound status topic.
pub const STATUS_SUFFIX: &str = "light_status";

/// Build a user-space topic for a device.
pub fn user_topic(product_key: &str, device_name: &str, suffix: &str) -> String {
    format!("/{product_key}/{device_name}/user/{suffix}")
}

pub fn light_control(product_key: &str, device_name: &str) -> String {
    user_topic(product_key, device_name, CONTROL_SUFFIX)
}

pub fn light_status(product_key: &str, device_name: &str) -> String {
    user_topic(product_key, device_name, STATUS_SUFFIX)
}
