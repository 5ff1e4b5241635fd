//! Board constants, generated by the build script from the RON
//! configuration file (see `busboot_config`).

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum LinkKind {
    Serial,
    Bus,
}

/// A link the board assembler is expected to open at startup.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub struct LinkDescriptor {
    pub kind: LinkKind,
    /// Peripheral index, also the driver registry slot.
    pub peripheral: u8,
    /// Baud rate or bitrate.
    pub rate: u32,
}

include!(concat!(env!("OUT_DIR"), "/board_configuration.rs"));

/// Registry slots of the configured links of one kind, in configuration
/// order.
pub fn peripherals(kind: LinkKind) -> impl Iterator<Item = usize> {
    LINKS.iter().filter(move |link| link.kind == kind).map(|link| link.peripheral as usize)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn generated_constants_describe_a_usable_board() {
        assert!(!LINKS.is_empty());
        assert_eq!(APPLICATION_START % 4, 0);
        assert!(SERIAL_STALL_TIMEOUT_MS > 0);
        assert!(LINKS.iter().all(|link| (link.peripheral as usize) < PERIPHERAL_SLOTS));
    }

    #[test]
    fn every_link_lands_in_a_registry_slot_of_its_kind() {
        let serials: Vec<_> = peripherals(LinkKind::Serial).collect();
        let buses: Vec<_> = peripherals(LinkKind::Bus).collect();
        assert_eq!(serials.len() + buses.len(), LINKS.len());
        assert!(serials.iter().chain(&buses).all(|slot| *slot < PERIPHERAL_SLOTS));
    }
}
