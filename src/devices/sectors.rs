//! Flash sector geometry.
//!
//! Erases work on whole sectors. A memory map turns an erase request
//! (start address and byte length) into the exact run of sector indices
//! to hand to the flash controller.
use crate::hal::flash::Address;
use core::ops::Range;
use static_assertions::const_assert;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Sector {
    pub start: Address,
    pub size: u32,
}

impl Sector {
    pub const fn end(&self) -> Address { Address(self.start.0 + self.size) }
    fn contains(&self, address: Address) -> bool {
        address >= self.start && address < self.end()
    }
}

pub struct MemoryMap {
    pub sectors: &'static [Sector],
}

// Compile time check that the memory maps below are consecutive.
const_assert!(STM32F7_SINGLE_BANK.is_sound());

/// 2 MiB single bank layout of the STM32F76x/77x family.
pub const STM32F7_SINGLE_BANK: MemoryMap = MemoryMap {
    sectors: &[
        Sector { start: Address(0x0800_0000), size: 0x8000 },
        Sector { start: Address(0x0800_8000), size: 0x8000 },
        Sector { start: Address(0x0801_0000), size: 0x8000 },
        Sector { start: Address(0x0801_8000), size: 0x8000 },
        Sector { start: Address(0x0802_0000), size: 0x2_0000 },
        Sector { start: Address(0x0804_0000), size: 0x4_0000 },
        Sector { start: Address(0x0808_0000), size: 0x4_0000 },
        Sector { start: Address(0x080C_0000), size: 0x4_0000 },
        Sector { start: Address(0x0810_0000), size: 0x4_0000 },
        Sector { start: Address(0x0814_0000), size: 0x4_0000 },
        Sector { start: Address(0x0818_0000), size: 0x4_0000 },
        Sector { start: Address(0x081C_0000), size: 0x4_0000 },
    ],
};

impl MemoryMap {
    // NOTE: Awkward control flow, as this runs at compile time.
    pub const fn is_sound(&self) -> bool {
        if self.sectors.is_empty() {
            return false;
        }
        let mut index = 0usize;
        while index < self.sectors.len() {
            let sector = &self.sectors[index];
            if sector.size == 0 || sector.start.0.checked_add(sector.size).is_none() {
                return false;
            }
            if index + 1 < self.sectors.len()
                && sector.start.0 + sector.size != self.sectors[index + 1].start.0
            {
                return false;
            }
            index += 1;
        }
        true
    }

    pub fn start(&self) -> Address { self.sectors.first().map(|s| s.start).unwrap_or_default() }
    pub fn end(&self) -> Address { self.sectors.last().map(|s| s.end()).unwrap_or_default() }
    pub fn size(&self) -> usize { self.end() - self.start() }

    pub fn sector_index(&self, address: Address) -> Option<usize> {
        self.sectors.iter().position(|sector| sector.contains(address))
    }

    /// Indices of the sectors an erase of `[start, start + length)` touches.
    ///
    /// `start` must sit on a sector boundary, since erasing from the middle
    /// of a sector would wipe the bytes before `start` too. `None` if the
    /// range is misaligned or runs past the end of the map.
    pub fn span(&self, start: Address, length: usize) -> Option<Range<usize>> {
        let first = self.sectors.iter().position(|sector| sector.start == start)?;
        if length == 0 {
            return Some(first..first);
        }
        let last_byte = start.0.checked_add(u32::try_from(length - 1).ok()?)?;
        let last = self.sector_index(Address(last_byte))?;
        Some(first..last + 1)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const MAP: MemoryMap = STM32F7_SINGLE_BANK;

    #[test]
    fn map_covers_two_megabytes() {
        assert_eq!(MAP.start(), Address(0x0800_0000));
        assert_eq!(MAP.end(), Address(0x0820_0000));
        assert_eq!(MAP.size(), 2 * 1024 * 1024);
        assert_eq!(MAP.sectors.len(), 12);
    }

    #[test]
    fn addresses_resolve_to_reference_sector_numbers() {
        assert_eq!(MAP.sector_index(Address(0x0800_0000)), Some(0));
        assert_eq!(MAP.sector_index(Address(0x0801_FFFF)), Some(3));
        assert_eq!(MAP.sector_index(Address(0x0802_0000)), Some(4));
        assert_eq!(MAP.sector_index(Address(0x0804_0000)), Some(5));
        assert_eq!(MAP.sector_index(Address(0x0808_0000)), Some(6));
        assert_eq!(MAP.sector_index(Address(0x081F_FFFF)), Some(11));
        assert_eq!(MAP.sector_index(Address(0x0820_0000)), None);
    }

    #[test]
    fn erase_span_counts_every_touched_sector() {
        // A single word only touches its own sector
        assert_eq!(MAP.span(Address(0x0808_0000), 4), Some(6..7));
        // Exactly one sector
        assert_eq!(MAP.span(Address(0x0808_0000), 0x4_0000), Some(6..7));
        // One byte over spills into the next one
        assert_eq!(MAP.span(Address(0x0808_0000), 0x4_0001), Some(6..8));
        // Small sectors at the bottom of flash
        assert_eq!(MAP.span(Address(0x0800_0000), 0x2_0001), Some(0..5));
        // Whole application area
        assert_eq!(MAP.span(Address(0x0808_0000), 0x18_0000), Some(6..12));
    }

    #[test]
    fn erase_span_rejects_misaligned_or_overflowing_ranges() {
        assert_eq!(MAP.span(Address(0x0808_0004), 4), None);
        assert_eq!(MAP.span(Address(0x0808_0000), 0x18_0001), None);
        assert_eq!(MAP.span(Address(0x0900_0000), 4), None);
    }

    #[test]
    fn empty_erase_touches_nothing() {
        assert_eq!(MAP.span(Address(0x0808_0000), 0), Some(6..6));
    }

    #[test]
    fn gaps_make_a_map_unsound() {
        const GAPPED: MemoryMap = MemoryMap {
            sectors: &[
                Sector { start: Address(0x0), size: 0x100 },
                Sector { start: Address(0x200), size: 0x100 },
            ],
        };
        assert!(!GAPPED.is_sound());
        assert!(!MemoryMap { sectors: &[] }.is_sound());
    }
}
