//! Hardware Abstraction Layer, containing the interfaces the
//! engine consumes from low level drivers and board collaborators.

pub mod can;
pub mod flash;
pub mod serial;
pub mod time;
pub mod transport;

#[cfg(not(target_arch = "arm"))]
#[doc(hidden)]
pub mod doubles;
