use crate::error::Chip8Error;

pub const MEMORY_SIZE: usize = 0x1000;
/// Address where ROMs are loaded and where execution starts
pub const PROGRAM_START: u16 = 0x200;
/// Address of the first glyph of the hexadecimal font
pub const FONT_BASE: u16 = 0x050;
/// Bytes per font glyph
pub const FONT_GLYPH_SIZE: u16 = 5;
/// Largest ROM that fits between `PROGRAM_START` and the end of memory
pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;

const ADDRESS_MASK: u16 = 0x0FFF;

pub static DEFAULT_FONT: [u8; 80] = [
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

/// 4 KiB of byte addressable RAM.
///
/// Every address is masked to 12 bits before use, so reads and writes past
/// 0xFFF wrap to the start of memory instead of leaving the buffer.
#[derive(Clone)]
pub struct Memory {
    bytes: Box<[u8; MEMORY_SIZE]>,
}

impl Memory {
    /// Creates zeroed memory with `font` copied to `FONT_BASE`
    pub fn with_font(font: &[u8]) -> Result<Memory, Chip8Error> {
        if font.len() != DEFAULT_FONT.len() {
            return Err(Chip8Error::InvalidFont {
                size: font.len(),
                expected: DEFAULT_FONT.len(),
            });
        }

        Ok(Memory::with_font_unchecked(font))
    }

    fn with_font_unchecked(font: &[u8]) -> Memory {
        let mut bytes = Box::new([0u8; MEMORY_SIZE]);
        let start = FONT_BASE as usize;
        bytes[start..start + font.len()].copy_from_slice(font);
        Memory { bytes }
    }

    pub fn read_u8(&self, addr: u16) -> u8 {
        self.bytes[(addr & ADDRESS_MASK) as usize]
    }

    pub fn write_u8(&mut self, addr: u16, data: u8) {
        self.bytes[(addr & ADDRESS_MASK) as usize] = data;
    }

    /// Reads a big-endian word, the second byte is read from `addr + 1`
    pub fn read_u16_be(&self, addr: u16) -> u16 {
        let hi = self.read_u8(addr);
        let lo = self.read_u8(addr.wrapping_add(1));
        u16::from_be_bytes([hi, lo])
    }

    /// Copies `rom` to `PROGRAM_START`.
    ///
    /// Fails without writing anything if the ROM does not fit. Bytes after the
    /// end of the ROM are zeroed so a smaller ROM never inherits stale code.
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<(), Chip8Error> {
        if rom.len() > MAX_ROM_SIZE {
            return Err(Chip8Error::RomTooLarge {
                size: rom.len(),
                max_size: MAX_ROM_SIZE,
            });
        }

        let program = &mut self.bytes[PROGRAM_START as usize..];
        program.fill(0);
        program[..rom.len()].copy_from_slice(rom);
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..]
    }
}

impl Default for Memory {
    fn default() -> Self {
        Memory::with_font_unchecked(&DEFAULT_FONT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_loaded_at_base() {
        let memory = Memory::default();

        // Glyph "0" is the first one and glyph "F" the last one
        assert_eq!(memory.read_u8(FONT_BASE), 0xF0);
        assert_eq!(memory.read_u8(FONT_BASE + 15 * FONT_GLYPH_SIZE + 4), 0x80);
        assert_eq!(memory.read_u8(FONT_BASE - 1), 0x00);
        assert_eq!(memory.read_u8(FONT_BASE + 80), 0x00);
    }

    #[test]
    fn test_custom_font() {
        let font = [0xAAu8; 80];
        let memory = Memory::with_font(&font).unwrap();
        assert_eq!(memory.read_u8(FONT_BASE), 0xAA);
        assert_eq!(memory.read_u8(FONT_BASE + 79), 0xAA);
    }

    #[test]
    fn test_invalid_font() {
        let result = Memory::with_font(&[0u8; 12]);
        assert_eq!(
            result.err(),
            Some(Chip8Error::InvalidFont {
                size: 12,
                expected: 80
            })
        );
    }

    #[test]
    fn test_load_rom() {
        let mut memory = Memory::default();
        memory.load_rom(&[0x12, 0x34, 0x56]).unwrap();

        assert_eq!(memory.read_u16_be(PROGRAM_START), 0x1234);
        assert_eq!(memory.read_u8(PROGRAM_START + 2), 0x56);
        assert_eq!(memory.read_u8(PROGRAM_START + 3), 0x00);
    }

    #[test]
    fn test_load_rom_clears_previous_rom() {
        let mut memory = Memory::default();
        memory.load_rom(&[0xFF; 8]).unwrap();
        memory.load_rom(&[0x11, 0x22]).unwrap();

        assert_eq!(memory.read_u16_be(PROGRAM_START), 0x1122);
        assert_eq!(memory.read_u16_be(PROGRAM_START + 2), 0x0000);
    }

    #[test]
    fn test_load_rom_filling_memory() {
        let mut memory = Memory::default();
        let rom = vec![0xEE; MAX_ROM_SIZE];
        memory.load_rom(&rom).unwrap();
        assert_eq!(memory.read_u8(0xFFF), 0xEE);
    }

    #[test]
    fn test_load_rom_too_large() {
        let mut memory = Memory::default();
        let rom = vec![0xEE; MAX_ROM_SIZE + 1];

        let result = memory.load_rom(&rom);

        assert_eq!(
            result,
            Err(Chip8Error::RomTooLarge {
                size: MAX_ROM_SIZE + 1,
                max_size: MAX_ROM_SIZE
            })
        );
        // Nothing written, font untouched
        assert_eq!(memory.read_u8(PROGRAM_START), 0x00);
        assert_eq!(memory.read_u8(FONT_BASE), 0xF0);
    }

    #[test]
    fn test_address_wraps() {
        let mut memory = Memory::default();
        memory.write_u8(0x1000, 0xAB);
        assert_eq!(memory.read_u8(0x000), 0xAB);

        memory.write_u8(0xFFF, 0x12);
        memory.write_u8(0x000, 0x34);
        assert_eq!(memory.read_u16_be(0xFFF), 0x1234);
    }
}
