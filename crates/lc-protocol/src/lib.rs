pub mod commands;
pub mod device;
pub mod status;
pub mod topics;

pub use commands::*;
pub use device::*;
pub use status::*;
