use std::io::Read;

use crate::error::{Chip8Error, Result};

pub const MEM_SIZE: usize = 4096;
pub const PROGRAM_START: usize = 0x200;
pub const FONT_ADDR: usize = 0x000;
pub const FONT_HEIGHT: usize = 5;

/// Largest ROM that fits between the program start and the end of memory.
pub const MAX_ROM_SIZE: usize = MEM_SIZE - PROGRAM_START;

/// Hex digit glyphs 0-F, five rows each.
pub const FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// 4K of interpreter memory with the font baked in at address 0.
pub struct Memory {
    data: [u8; MEM_SIZE],
}

impl Memory {
    pub fn new() -> Self {
        let mut memory = Memory {
            data: [0; MEM_SIZE],
        };
        memory.reset();
        memory
    }

    pub fn reset(&mut self) {
        self.data.fill(0);
        self.data[FONT_ADDR..FONT_ADDR + FONT.len()].copy_from_slice(&FONT);
    }

    /// Copies a ROM image to the program area. Nothing is written when the
    /// image does not fit.
    pub fn load(&mut self, rom: &[u8]) -> Result<()> {
        if rom.len() > MAX_ROM_SIZE {
            return Err(Chip8Error::RomTooLarge {
                size: rom.len(),
                max: MAX_ROM_SIZE,
            });
        }
        self.data[PROGRAM_START..PROGRAM_START + rom.len()].copy_from_slice(rom);
        Ok(())
    }

    /// Reads a ROM image from `reader` and loads it, returning its size.
    ///
    /// At most one byte past `MAX_ROM_SIZE` is read, so an oversized stream
    /// reports `size: MAX_ROM_SIZE + 1`.
    pub fn load_from(&mut self, reader: impl Read) -> Result<usize> {
        let mut rom = Vec::with_capacity(MAX_ROM_SIZE + 1);
        reader.take(MAX_ROM_SIZE as u64 + 1).read_to_end(&mut rom)?;
        self.load(&rom)?;
        Ok(rom.len())
    }

    /// # Panics
    ///
    /// Panics if `addr` is outside of memory.
    pub fn get(&self, addr: usize) -> u8 {
        self.data[addr]
    }

    /// # Panics
    ///
    /// Panics if `addr` is outside of memory.
    pub fn set(&mut self, addr: usize, value: u8) {
        self.data[addr] = value;
    }

    pub fn slice(&self, addr: usize, count: usize) -> Result<&[u8]> {
        Self::check_range(addr, count)?;
        Ok(&self.data[addr..addr + count])
    }

    pub fn slice_mut(&mut self, addr: usize, count: usize) -> Result<&mut [u8]> {
        Self::check_range(addr, count)?;
        Ok(&mut self.data[addr..addr + count])
    }

    fn check_range(addr: usize, count: usize) -> Result<()> {
        match addr.checked_add(count) {
            Some(end) if end <= MEM_SIZE => Ok(()),
            _ => Err(Chip8Error::MemoryOutOfBounds { addr, len: count }),
        }
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_layout() {
        let mut memory = Memory::new();
        memory.set(0x000, 0xAA);
        memory.set(0x300, 0xBB);
        memory.reset();

        assert_eq!(memory.slice(0, 80).unwrap(), &FONT);
        assert!(memory.slice(80, MEM_SIZE - 80).unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_load_copies_to_program_start() {
        let mut memory = Memory::new();
        memory.load(&[0x00, 0xE0, 0x12, 0x00]).unwrap();
        assert_eq!(memory.slice(PROGRAM_START, 4).unwrap(), &[0x00, 0xE0, 0x12, 0x00]);
        assert_eq!(memory.get(PROGRAM_START + 4), 0);
    }

    #[test]
    fn test_load_fills_memory_exactly() {
        let mut memory = Memory::new();
        memory.load(&[0x11; MAX_ROM_SIZE]).unwrap();
        assert_eq!(memory.get(MEM_SIZE - 1), 0x11);
    }

    #[test]
    fn test_load_too_large_leaves_memory_untouched() {
        let mut memory = Memory::new();
        memory.load(&[0x22; 8]).unwrap();

        let err = memory.load(&[0x33; MAX_ROM_SIZE + 1]).unwrap_err();
        assert!(matches!(
            err,
            Chip8Error::RomTooLarge {
                size: 3585,
                max: 3584
            }
        ));
        assert_eq!(memory.slice(PROGRAM_START, 8).unwrap(), &[0x22; 8]);
        assert_eq!(memory.get(PROGRAM_START + 8), 0);
    }

    #[test]
    fn test_load_from_reader() {
        let mut memory = Memory::new();
        let rom: &[u8] = &[0xA2, 0x2A, 0x60, 0x0C];
        assert_eq!(memory.load_from(rom).unwrap(), 4);
        assert_eq!(memory.slice(PROGRAM_START, 4).unwrap(), rom);
    }

    #[test]
    fn test_load_from_stops_reading_past_limit() {
        let mut memory = Memory::new();
        let total = 64 << 20;
        let mut stream = std::io::repeat(0xAA).take(total);

        let err = memory.load_from(&mut stream).unwrap_err();
        assert!(matches!(
            err,
            Chip8Error::RomTooLarge {
                size: 3585,
                max: 3584
            }
        ));
        assert_eq!(total - stream.limit(), MAX_ROM_SIZE as u64 + 1);
        assert_eq!(memory.get(PROGRAM_START), 0);
    }

    #[test]
    fn test_slice_bounds() {
        let memory = Memory::new();
        assert_eq!(memory.slice(MEM_SIZE - 2, 2).unwrap().len(), 2);
        assert_eq!(memory.slice(MEM_SIZE, 0).unwrap().len(), 0);
        assert!(matches!(
            memory.slice(MEM_SIZE - 2, 3),
            Err(Chip8Error::MemoryOutOfBounds { addr: 4094, len: 3 })
        ));
        assert!(memory.slice(usize::MAX, 2).is_err());
    }

    #[test]
    #[should_panic]
    fn test_get_out_of_range_panics() {
        let memory = Memory::new();
        memory.get(MEM_SIZE);
    }
}
