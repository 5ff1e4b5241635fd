use super::error::FakeError;
use crate::{
    devices::sectors::MemoryMap,
    hal::flash::{self, Address},
};

/// In-memory NOR flash. Erased bytes read 0xFF, writes can only clear
/// bits, erases work on whole sectors of the given memory map, and
/// writes are refused while locked.
pub struct FakeFlash {
    map: &'static MemoryMap,
    data: Vec<u8>,
    locked: bool,
    /// Makes every following write fail.
    pub fail_writes: bool,
    /// Makes every following erase fail.
    pub fail_erases: bool,
    /// Makes every following read fail.
    pub fail_reads: bool,
    /// Sector indices erased so far, in order.
    pub erased_sectors: Vec<usize>,
    pub lock_count: usize,
    pub unlock_count: usize,
}

impl FakeFlash {
    pub fn new(map: &'static MemoryMap) -> FakeFlash {
        FakeFlash {
            map,
            data: vec![0xFF; map.size()],
            locked: true,
            fail_writes: false,
            fail_erases: false,
            fail_reads: false,
            erased_sectors: Vec::new(),
            lock_count: 0,
            unlock_count: 0,
        }
    }

    pub fn is_locked(&self) -> bool { self.locked }

    /// Raw view of `length` bytes at `address`, bypassing locks and errors.
    pub fn peek(&self, address: Address, length: usize) -> &[u8] {
        let offset = address - self.map.start();
        &self.data[offset..offset + length]
    }

    pub fn word_at(&self, address: Address) -> u32 {
        let mut word = [0u8; 4];
        word.copy_from_slice(self.peek(address, 4));
        u32::from_le_bytes(word)
    }

    /// Writes bypassing locks and NOR rules, to set up initial contents.
    pub fn preload(&mut self, address: Address, bytes: &[u8]) {
        let offset = address - self.map.start();
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    fn offset_of(&self, address: Address, length: usize) -> Result<usize, FakeError> {
        let end = address.0 as u64 + length as u64;
        if address < self.map.start() || end > self.map.end().0 as u64 {
            Err(FakeError::OutOfBounds)
        } else {
            Ok(address - self.map.start())
        }
    }
}

impl flash::ReadWrite for FakeFlash {
    type Error = FakeError;

    fn read(&mut self, address: Address, bytes: &mut [u8]) -> nb::Result<(), Self::Error> {
        if self.fail_reads {
            return Err(nb::Error::Other(FakeError::ReadFailed));
        }
        let offset = self.offset_of(address, bytes.len()).map_err(nb::Error::Other)?;
        bytes.copy_from_slice(&self.data[offset..offset + bytes.len()]);
        Ok(())
    }

    fn write(&mut self, address: Address, bytes: &[u8]) -> nb::Result<(), Self::Error> {
        if self.fail_writes {
            return Err(nb::Error::Other(FakeError::WriteFailed));
        }
        if self.locked {
            return Err(nb::Error::Other(FakeError::Locked));
        }
        let offset = self.offset_of(address, bytes.len()).map_err(nb::Error::Other)?;
        let target = &mut self.data[offset..offset + bytes.len()];
        if target.iter().zip(bytes).any(|(old, new)| old & new != *new) {
            return Err(nb::Error::Other(FakeError::NotErased));
        }
        target.copy_from_slice(bytes);
        Ok(())
    }

    fn range(&self) -> (Address, Address) { (self.map.start(), self.map.end()) }
}

impl flash::Erase for FakeFlash {
    fn erase(&mut self, start: Address, length: usize) -> nb::Result<(), Self::Error> {
        if self.fail_erases {
            return Err(nb::Error::Other(FakeError::EraseFailed));
        }
        let span = self.map.span(start, length).ok_or(nb::Error::Other(FakeError::OutOfBounds))?;
        for index in span {
            let sector = self.map.sectors[index];
            let offset = sector.start - self.map.start();
            self.data[offset..offset + sector.size as usize].iter_mut().for_each(|b| *b = 0xFF);
            self.erased_sectors.push(index);
        }
        Ok(())
    }
}

impl flash::Lock for FakeFlash {
    fn lock(&mut self) {
        self.locked = true;
        self.lock_count += 1;
    }

    fn unlock(&mut self) {
        self.locked = false;
        self.unlock_count += 1;
    }
}
