//! Test doubles for the hardware abstraction layer. Host only.

pub mod boot_mode;
pub mod can;
pub mod error;
pub mod flash;
pub mod serial;
pub mod time;
pub mod transport;
