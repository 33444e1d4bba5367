// Instruction decoder
//
// Opcode table and mnemonics follow Cowgod's Chip-8 Technical Reference:
// http://devernay.free.fr/hacks/chip8/C8TECH10.HTM

use std::fmt;

use crate::memory::PROGRAM_START;

/// Every operation of the base CHIP-8 instruction set.
///
/// Field naming in the docs: `x`, `y` register indexes, `kk` byte, `n` nibble,
/// `nnn` 12-bit address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// 0nnn: Call machine code routine, ignored
    SystemCall,
    /// 00E0: Clear screen
    ClearScreen,
    /// 00EE: Return from subroutine
    Return,
    /// 1nnn: Jump to nnn
    Jump,
    /// 2nnn: Call subroutine at nnn
    Call,
    /// 3xkk: Skip next instruction if Vx == kk
    SkipIfEqualKk,
    /// 4xkk: Skip next instruction if Vx != kk
    SkipIfNotEqualKk,
    /// 5xy0: Skip next instruction if Vx == Vy
    SkipIfEqualVy,
    /// 6xkk: Vx = kk
    SetKk,
    /// 7xkk: Vx += kk, no carry
    AddKk,
    /// 8xy0: Vx = Vy
    SetVy,
    /// 8xy1: Vx |= Vy
    Or,
    /// 8xy2: Vx &= Vy
    And,
    /// 8xy3: Vx ^= Vy
    Xor,
    /// 8xy4: Vx += Vy, VF = carry
    AddVyWithCarry,
    /// 8xy5: Vx -= Vy, VF = not borrow
    SubtractVy,
    /// 8xy6: Vx >>= 1, VF = shifted out bit
    ShiftRight,
    /// 8xy7: Vx = Vy - Vx, VF = not borrow
    SubtractFromVy,
    /// 8xyE: Vx <<= 1, VF = shifted out bit
    ShiftLeft,
    /// 9xy0: Skip next instruction if Vx != Vy
    SkipIfNotEqualVy,
    /// Annn: I = nnn
    SetIndex,
    /// Bnnn: Jump to nnn + V0
    JumpWithOffset,
    /// Cxkk: Vx = random & kk
    Random,
    /// Dxyn: Draw n rows sprite at (Vx, Vy)
    Draw,
    /// Ex9E: Skip next instruction if key Vx is pressed
    SkipIfKeyPressed,
    /// ExA1: Skip next instruction if key Vx is not pressed
    SkipIfKeyNotPressed,
    /// Fx07: Vx = delay timer
    LoadDelayTimer,
    /// Fx0A: Wait for a key press and release, Vx = key
    WaitForKey,
    /// Fx15: delay timer = Vx
    SetDelayTimer,
    /// Fx18: sound timer = Vx
    SetSoundTimer,
    /// Fx1E: I += Vx
    AddToIndex,
    /// Fx29: I = address of font glyph Vx
    SetIndexToFont,
    /// Fx33: Store BCD of Vx at I, I+1, I+2
    StoreBcd,
    /// Fx55: Store V0..=Vx at I
    StoreRegisters,
    /// Fx65: Load V0..=Vx from I
    LoadRegisters,
    /// Anything else
    Unknown,
}

/// Decoded opcode.
///
/// All fields are extracted for every opcode, whether the operation uses them
/// or not.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: u16,
    pub op: Operation,
    /// Bits 8-11
    pub x: u8,
    /// Bits 4-7
    pub y: u8,
    /// Bits 0-7
    pub kk: u8,
    /// Bits 0-3
    pub n: u8,
    /// Bits 0-11
    pub nnn: u16,
}

/// Decodes a 16-bit opcode. Never fails, unknown patterns map to `Operation::Unknown`.
pub fn decode(opcode: u16) -> Instruction {
    // Instruction split into nibbels(4bits) 1-4
    let n1 = ((opcode & 0xF000) >> 12) as u8;
    let n2 = ((opcode & 0x0F00) >> 8) as u8;
    let n3 = ((opcode & 0x00F0) >> 4) as u8;
    let n4 = (opcode & 0x000F) as u8;

    let op = match (n1, n2, n3, n4) {
        (0x0, 0x0, 0xE, 0x0) => Operation::ClearScreen,
        (0x0, 0x0, 0xE, 0xE) => Operation::Return,
        (0x0, ..) => Operation::SystemCall,
        (0x1, ..) => Operation::Jump,
        (0x2, ..) => Operation::Call,
        (0x3, ..) => Operation::SkipIfEqualKk,
        (0x4, ..) => Operation::SkipIfNotEqualKk,
        (0x5, .., 0x0) => Operation::SkipIfEqualVy,
        (0x6, ..) => Operation::SetKk,
        (0x7, ..) => Operation::AddKk,
        (0x8, .., 0x0) => Operation::SetVy,
        (0x8, .., 0x1) => Operation::Or,
        (0x8, .., 0x2) => Operation::And,
        (0x8, .., 0x3) => Operation::Xor,
        (0x8, .., 0x4) => Operation::AddVyWithCarry,
        (0x8, .., 0x5) => Operation::SubtractVy,
        (0x8, .., 0x6) => Operation::ShiftRight,
        (0x8, .., 0x7) => Operation::SubtractFromVy,
        (0x8, .., 0xE) => Operation::ShiftLeft,
        (0x9, .., 0x0) => Operation::SkipIfNotEqualVy,
        (0xA, ..) => Operation::SetIndex,
        (0xB, ..) => Operation::JumpWithOffset,
        (0xC, ..) => Operation::Random,
        (0xD, ..) => Operation::Draw,
        (0xE, _, 0x9, 0xE) => Operation::SkipIfKeyPressed,
        (0xE, _, 0xA, 0x1) => Operation::SkipIfKeyNotPressed,
        (0xF, _, 0x0, 0x7) => Operation::LoadDelayTimer,
        (0xF, _, 0x0, 0xA) => Operation::WaitForKey,
        (0xF, _, 0x1, 0x5) => Operation::SetDelayTimer,
        (0xF, _, 0x1, 0x8) => Operation::SetSoundTimer,
        (0xF, _, 0x1, 0xE) => Operation::AddToIndex,
        (0xF, _, 0x2, 0x9) => Operation::SetIndexToFont,
        (0xF, _, 0x3, 0x3) => Operation::StoreBcd,
        (0xF, _, 0x5, 0x5) => Operation::StoreRegisters,
        (0xF, _, 0x6, 0x5) => Operation::LoadRegisters,
        _ => Operation::Unknown,
    };

    Instruction {
        opcode,
        op,
        x: n2,
        y: n3,
        kk: (opcode & 0x00FF) as u8,
        n: n4,
        nnn: opcode & 0x0FFF,
    }
}

/// Decodes a raw ROM as it would be laid out in memory.
///
/// Yields the load address of every opcode; a trailing odd byte is ignored.
pub fn disassemble(rom: &[u8]) -> impl Iterator<Item = (u16, Instruction)> + '_ {
    rom.chunks_exact(2).enumerate().map(|(i, word)| {
        let addr = PROGRAM_START.wrapping_add((i * 2) as u16);
        (addr, decode(u16::from_be_bytes([word[0], word[1]])))
    })
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y, kk, n, nnn) = (self.x, self.y, self.kk, self.n, self.nnn);
        match self.op {
            Operation::SystemCall => write!(f, "SYS 0x{:03X}", nnn),
            Operation::ClearScreen => write!(f, "CLS"),
            Operation::Return => write!(f, "RET"),
            Operation::Jump => write!(f, "JP 0x{:03X}", nnn),
            Operation::Call => write!(f, "CALL 0x{:03X}", nnn),
            Operation::SkipIfEqualKk => write!(f, "SE V{:X}, 0x{:02X}", x, kk),
            Operation::SkipIfNotEqualKk => write!(f, "SNE V{:X}, 0x{:02X}", x, kk),
            Operation::SkipIfEqualVy => write!(f, "SE V{:X}, V{:X}", x, y),
            Operation::SetKk => write!(f, "LD V{:X}, 0x{:02X}", x, kk),
            Operation::AddKk => write!(f, "ADD V{:X}, 0x{:02X}", x, kk),
            Operation::SetVy => write!(f, "LD V{:X}, V{:X}", x, y),
            Operation::Or => write!(f, "OR V{:X}, V{:X}", x, y),
            Operation::And => write!(f, "AND V{:X}, V{:X}", x, y),
            Operation::Xor => write!(f, "XOR V{:X}, V{:X}", x, y),
            Operation::AddVyWithCarry => write!(f, "ADD V{:X}, V{:X}", x, y),
            Operation::SubtractVy => write!(f, "SUB V{:X}, V{:X}", x, y),
            Operation::ShiftRight => write!(f, "SHR V{:X}, V{:X}", x, y),
            Operation::SubtractFromVy => write!(f, "SUBN V{:X}, V{:X}", x, y),
            Operation::ShiftLeft => write!(f, "SHL V{:X}, V{:X}", x, y),
            Operation::SkipIfNotEqualVy => write!(f, "SNE V{:X}, V{:X}", x, y),
            Operation::SetIndex => write!(f, "LD I, 0x{:03X}", nnn),
            Operation::JumpWithOffset => write!(f, "JP V0, 0x{:03X}", nnn),
            Operation::Random => write!(f, "RND V{:X}, 0x{:02X}", x, kk),
            Operation::Draw => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            Operation::SkipIfKeyPressed => write!(f, "SKP V{:X}", x),
            Operation::SkipIfKeyNotPressed => write!(f, "SKNP V{:X}", x),
            Operation::LoadDelayTimer => write!(f, "LD V{:X}, DT", x),
            Operation::WaitForKey => write!(f, "LD V{:X}, K", x),
            Operation::SetDelayTimer => write!(f, "LD DT, V{:X}", x),
            Operation::SetSoundTimer => write!(f, "LD ST, V{:X}", x),
            Operation::AddToIndex => write!(f, "ADD I, V{:X}", x),
            Operation::SetIndexToFont => write!(f, "LD F, V{:X}", x),
            Operation::StoreBcd => write!(f, "LD B, V{:X}", x),
            Operation::StoreRegisters => write!(f, "LD [I], V{:X}", x),
            Operation::LoadRegisters => write!(f, "LD V{:X}, [I]", x),
            Operation::Unknown => write!(f, "DW 0x{:04X}", self.opcode),
        }
    }
}
