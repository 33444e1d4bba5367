mod audio;
mod chip8;
mod color;
mod cpu;
mod display;
mod error;
mod keyboard;
mod memory;
mod opcode;
mod quirks;
mod timing;

pub use audio::{Beeper, Mute};
pub use chip8::{Chip8, Chip8Builder};
pub use color::{
    Chip8Color, ColorParseError, Palette, DEFAULT_BACKGROUND_COLOR, DEFAULT_FOREGROUND_COLOR,
};
pub use cpu::{Step, DRAW_INTERVAL};
pub use display::{Display, Screen, SCREEN_HEIGHT, SCREEN_WIDTH};
pub use error::Chip8Error;
pub use keyboard::key_code;
pub use memory::{DEFAULT_FONT, MAX_ROM_SIZE, PROGRAM_START};
pub use opcode::{decode, disassemble, Instruction, Operation};
pub use quirks::{Chip8Mode, Quirks};
pub use timing::{Event, Scheduler, TIMER_HZ};
