use core::convert::TryFrom;
use marker_blanket::marker_blanket;

/// Where the board goes after the next reset. Persisted by a
/// collaborator that survives the reset (backup register, flash word).
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum BootMode {
    Application = 0,
    Bootloader = 1,
}

impl TryFrom<u8> for BootMode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0 => Ok(BootMode::Application),
            1 => Ok(BootMode::Bootloader),
            unknown => Err(unknown),
        }
    }
}

pub trait ReadBootMode {
    fn read_boot_mode(&self) -> BootMode;
}

pub trait WriteBootMode {
    fn write_boot_mode(&mut self, mode: BootMode);
}

#[marker_blanket]
pub trait BootModeStore: ReadBootMode + WriteBootMode {}
