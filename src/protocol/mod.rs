//! Wire formats shared by every link.

pub mod frame;
pub mod message;

pub use message::{ErrorCode, Kind, Message};
