
pub const MEM_WORDS: usize = 1 << 16; // Word-addressed, 16-bit cells

pub const PC_START: u16 = 0x3000;
pub const MMIO_START: u16 = 0xfe00;
pub const MEM_HIGH: u16 = 0xffff;
