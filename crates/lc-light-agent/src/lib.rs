//! lightctl controller runtime.
//!
//! Two independent subsystems share one board:
//! - the edge pipeline (`edge`) toggles an output on every rising edge of
//!   an input and reports each edge from a task
//! - the control channel (`router`, `dispatcher`, `mqtt_loop`) drives the
//!   light from MQTT commands and publishes its status
//!
//! `boot` wires both onto a `GpioDriver` in the required order. Modules are
//! public so `lc-e2e-tests` can drive each piece directly.

pub mod boot;
pub mod config;
pub mod dispatcher;
pub mod edge;
pub mod error;
pub mod mqtt_loop;
pub mod router;
