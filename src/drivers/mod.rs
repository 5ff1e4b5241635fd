//! Interrupt fed link drivers. Each driver owns its peripheral and its
//! buffers, lives in a registry slot reachable from the interrupt
//! vector, and is exposed to the dispatcher through a thin link type
//! implementing `Transport`.

pub mod can;
pub mod registry;
pub mod serial;
pub mod shared;
