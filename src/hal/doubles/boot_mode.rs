use crate::devices::boot_mode::{BootMode, ReadBootMode, WriteBootMode};

/// Boot mode flag held in memory. A `stuck` store ignores writes,
/// like a backup domain that was never unlocked.
#[derive(Debug)]
pub struct FakeBootMode {
    pub mode: BootMode,
    pub stuck: bool,
    pub writes: usize,
}

impl Default for FakeBootMode {
    fn default() -> Self { Self { mode: BootMode::Bootloader, stuck: false, writes: 0 } }
}

impl ReadBootMode for FakeBootMode {
    fn read_boot_mode(&self) -> BootMode { self.mode }
}

impl WriteBootMode for FakeBootMode {
    fn write_boot_mode(&mut self, mode: BootMode) {
        self.writes += 1;
        if !self.stuck {
            self.mode = mode;
        }
    }
}
