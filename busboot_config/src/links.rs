use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A physical link the bootloader listens on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Link {
    /// Point to point USART.
    Serial { peripheral: u8, baud: u32 },
    /// Multi-drop CAN bus.
    Bus { peripheral: u8, bitrate: u32 },
}

impl Link {
    pub fn peripheral(&self) -> u8 {
        match self {
            Link::Serial { peripheral, .. } | Link::Bus { peripheral, .. } => *peripheral,
        }
    }

    /// Baud rate for serial links, bitrate for bus links.
    pub fn rate(&self) -> u32 {
        match self {
            Link::Serial { baud, .. } => *baud,
            Link::Bus { bitrate, .. } => *bitrate,
        }
    }

    pub fn claims_same_peripheral(&self, other: &Link) -> bool {
        matches!(
            (self, other),
            (Link::Serial { .. }, Link::Serial { .. }) | (Link::Bus { .. }, Link::Bus { .. })
        ) && self.peripheral() == other.peripheral()
    }
}

impl Display for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Link::Serial { peripheral, baud } => {
                write!(f, "Serial #{} ({} baud)", peripheral, baud)
            }
            Link::Bus { peripheral, bitrate } => {
                write!(f, "Bus #{} ({} bit/s)", peripheral, bitrate)
            }
        }
    }
}
