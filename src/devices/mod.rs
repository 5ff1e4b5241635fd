//! Modules with business logic related to the problem domain, that
//! lay on top of abstract drivers. Devices are generic over their
//! collaborators; the board configuration decides what plugs in.

pub mod boot_mode;
pub mod context;
pub mod sectors;
pub mod transport;

use crate::hal::flash;
use marker_blanket::marker_blanket;

/// A supported flash must be able to read, write, erase and lock.
#[marker_blanket]
pub trait Flash: flash::ReadWrite + flash::Erase + flash::Lock {}
