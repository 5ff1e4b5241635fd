//! Init-once table of link drivers, indexed by peripheral.
//!
//! Interrupt vectors have no arguments, so they reach their driver
//! through a `static` registry and the peripheral index. A slot can be
//! claimed once, which keeps a single owner per peripheral.
use super::shared::Shared;
use crate::{board, error::Error};

pub type Slot<D> = Shared<Option<D>>;

/// One slot per peripheral the board can configure.
pub type BoardRegistry<D> = Registry<D, { board::PERIPHERAL_SLOTS }>;

pub struct Registry<D, const N: usize> {
    slots: [Slot<D>; N],
}

impl<D, const N: usize> Default for Registry<D, N> {
    fn default() -> Self { Self::new() }
}

impl<D, const N: usize> Registry<D, N> {
    const EMPTY: Slot<D> = Shared::new(None);

    pub const fn new() -> Self { Self { slots: [Self::EMPTY; N] } }

    /// Moves `driver` into the slot for `index`, returning the slot so a
    /// link can be built on top of it.
    pub fn install(&self, index: usize, driver: D) -> Result<&Slot<D>, Error> {
        let slot = self.slots.get(index).ok_or(Error::PeripheralOutOfRange)?;
        slot.lock(|slot| match slot {
            Some(_) => Err(Error::PeripheralTaken),
            None => {
                *slot = Some(driver);
                Ok(())
            }
        })?;
        Ok(slot)
    }

    pub fn slot(&self, index: usize) -> Option<&Slot<D>> { self.slots.get(index) }

    /// Entry point for interrupt vectors. Interrupts for a peripheral
    /// with no installed driver are ignored.
    pub fn on_interrupt(&self, index: usize, f: impl FnOnce(&mut D)) {
        if let Some(slot) = self.slots.get(index) {
            slot.lock(|slot| {
                if let Some(driver) = slot.as_mut() {
                    f(driver)
                }
            });
        }
    }
}
