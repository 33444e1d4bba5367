use thiserror::Error;

/// Failures reported by the virtual machine.
///
/// None of these leave the machine in an undefined state: the instruction that
/// raised the error has not modified any register, so the host may inspect the
/// machine, reset it, or keep stepping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Chip8Error {
    #[error("ROM is too large ({size} bytes), max size is {max_size} bytes")]
    RomTooLarge { size: usize, max_size: usize },

    #[error("font sprite must be {expected} bytes, got {size}")]
    InvalidFont { size: usize, expected: usize },

    #[error("stack overflow: call at 0x{pc:03x} with {depth} frames already on the stack")]
    StackOverflow { pc: u16, depth: usize },

    #[error("stack underflow: return at 0x{pc:03x} with an empty call stack")]
    StackUnderflow { pc: u16 },
}
