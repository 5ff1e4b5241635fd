//! Flash memory interfaces consumed by the dispatcher.
use core::{
    fmt,
    ops::{Add, Sub},
};

/// Absolute address in the MCU address space.
#[derive(Copy, Clone, Debug, Default, Ord, PartialOrd, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub struct Address(pub u32);

impl Add<usize> for Address {
    type Output = Address;
    fn add(self, rhs: usize) -> Self::Output { Address(self.0.wrapping_add(rhs as u32)) }
}

impl Sub<usize> for Address {
    type Output = Address;
    fn sub(self, rhs: usize) -> Self::Output { Address(self.0.saturating_sub(rhs as u32)) }
}

impl Sub<Address> for Address {
    type Output = usize;
    fn sub(self, rhs: Address) -> Self::Output { self.0.saturating_sub(rhs.0) as usize }
}

impl From<Address> for u32 {
    fn from(address: Address) -> Self { address.0 }
}

/// Reads and writes ranges of bytes at absolute addresses.
///
/// Writes follow NOR semantics: the target range must have been erased
/// first. Implementations verify the data read back after a write.
pub trait ReadWrite {
    type Error: Clone + Copy + fmt::Debug;
    fn read(&mut self, address: Address, bytes: &mut [u8]) -> nb::Result<(), Self::Error>;
    fn write(&mut self, address: Address, bytes: &[u8]) -> nb::Result<(), Self::Error>;
    /// First address and one past the last address of the device.
    fn range(&self) -> (Address, Address);
}

/// Erases every sector touched by `[start, start + length)`. Handles its
/// own unlocking, and leaves the lock state as it found it.
pub trait Erase: ReadWrite {
    fn erase(&mut self, start: Address, length: usize) -> nb::Result<(), Self::Error>;
}

/// Write protection.
pub trait Lock {
    fn lock(&mut self);
    fn unlock(&mut self);
}
