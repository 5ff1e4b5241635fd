//! Busboot Error types and methods

/// Top level error type for the bootloader. Link level framing errors
/// never reach this type; they are reported as a flagged message instead.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum Error {
    FlashLocked,
    FlashOutOfBounds,
    FlashWriteFailed,
    FlashEraseFailed,
    FlashReadFailed,
    PeripheralTaken,
    PeripheralOutOfRange,
    NoTransports,
}

pub trait Convertible {
    fn into(self) -> Error;
}

impl<T: Convertible> From<T> for Error {
    fn from(t: T) -> Self { t.into() }
}

impl Error {
    /// Human readable description, used when logging and halting.
    pub fn describe(&self) -> &'static str {
        match self {
            Error::FlashLocked => "[Flash] Attempted to modify locked flash",
            Error::FlashOutOfBounds => "[Flash] Address outside of the flash range",
            Error::FlashWriteFailed => "[Flash] Write failed or didn't read back",
            Error::FlashEraseFailed => "[Flash] Erase failed",
            Error::FlashReadFailed => "[Flash] Read failed",
            Error::PeripheralTaken => "[Registry] Peripheral already has a driver",
            Error::PeripheralOutOfRange => "[Registry] Peripheral index outside of the table",
            Error::NoTransports => "[Configuration] No transports to listen on",
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hal::doubles::error::FakeError;

    #[test]
    fn flash_failures_keep_the_failing_operation() {
        assert_eq!(Error::from(FakeError::WriteFailed), Error::FlashWriteFailed);
        assert_eq!(Error::from(FakeError::EraseFailed), Error::FlashEraseFailed);
        assert_eq!(Error::from(FakeError::ReadFailed), Error::FlashReadFailed);
        assert_eq!(Error::from(FakeError::NotErased), Error::FlashWriteFailed);
        assert_eq!(Error::FlashEraseFailed.describe(), "[Flash] Erase failed");
    }
}
