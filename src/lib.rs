//! # Multi-drop Bootloader Library
//!
//! This crate contains the protocol and transport engine of a field
//! updatable bootloader: the wire message format, serial and bus
//! framing, the interrupt-fed link drivers and the command dispatcher
//! that drives flash operations. Several boards may share a bus; each
//! one forwards traffic it doesn't own and executes traffic it does.
#![cfg_attr(test, allow(unused_imports))]
#![cfg_attr(target_arch = "arm", no_std)]

extern crate static_assertions;

#[cfg(target_arch = "arm")]
pub(crate) use defmt as log;
#[cfg(not(target_arch = "arm"))]
pub(crate) use log_crate as log;

pub mod utilities {
    pub mod checksum;
    pub mod ring_buffer;
}

pub mod board;
pub mod devices;
pub mod drivers;
pub mod error;
pub mod hal;
pub mod protocol;
pub mod system;
