use std::sync::Arc;

use crate::EmulatorState;
use crate::io::{Console, MMIOHandler};

/// The memory-mapped keyboard: a status register whose high bit reports a
/// pending key, and a data register holding that key's character code.
pub struct Keyboard {
    device: Arc<dyn Console>,
    status: u16,
    data: u16,
}

impl Keyboard {
    /// Keyboard status register.
    pub const KBSR: u16 = 0xfe00;

    /// Keyboard data register.
    pub const KBDR: u16 = 0xfe02;

    const READY_SHIFT: u16 = 15;
    pub const READY_MASK: u16 = 1 << Self::READY_SHIFT;

    pub fn new(device: Arc<dyn Console>) -> Self {
        Keyboard {
            device,
            status: 0,
            data: 0,
        }
    }

    // A status read is the only side-effecting read in the machine: it
    // performs one zero-timeout poll and latches the result.
    fn kbsr_read(&mut self) -> u16 {
        if let Some(ch) = self.device.poll() {
            self.status = Self::READY_MASK;
            self.data = ch as u16;
        } else {
            self.status = 0;
        }
        self.status
    }
}

impl MMIOHandler for Keyboard {
    fn read(&mut self, _: &mut EmulatorState, addr: u16) -> u16 {
        match addr {
            Self::KBSR => self.kbsr_read(),
            Self::KBDR => self.data,
            _ => panic!("Keyboard doesn't handle address {addr:#06x}"),
        }
    }

    fn write(&mut self, _: &mut EmulatorState, addr: u16, val: u16) {
        // Plain stores, no validation; the next status read recomputes.
        match addr {
            Self::KBSR => self.status = val,
            Self::KBDR => self.data = val,
            _ => panic!("Keyboard doesn't handle address {addr:#06x}"),
        }
    }

    fn default_addrs(&self) -> &[u16] {
        &[Self::KBSR, Self::KBDR]
    }
}
