// CHIP-8 execution engine
//
// Useful links:
// * [Guide to making a CHIP-8 emulator](https://tobiasvl.github.io/blog/write-a-chip-8-emulator/)
// * [Cowgod's Chip-8 Technical Reference](http://devernay.free.fr/hacks/chip8/C8TECH10.HTM)
// * [Timendus CHIP-8 test suite quirks](https://github.com/Timendus/chip8-test-suite)
//

use std::time::{Duration, Instant};

use log::{trace, warn};
use rand::{rngs::StdRng, Rng};

use crate::display::{Display, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::error::Chip8Error;
use crate::keyboard::Keyboard;
use crate::memory::{Memory, FONT_BASE, FONT_GLYPH_SIZE, PROGRAM_START};
use crate::opcode::{decode, Instruction, Operation};
use crate::quirks::Quirks;

pub const REGISTER_COUNT: usize = 16;
pub const STACK_SIZE: usize = 16;
/// Minimum wall-clock time between two executed sprite draws (one 60 Hz frame)
pub const DRAW_INTERVAL: Duration = Duration::from_nanos(1_000_000_000 / 60);

const ADDRESS_MASK: u16 = 0x0FFF;
/// VF doubles as the flag output of arithmetic, shift and draw instructions
const FLAG: usize = 0xF;

/// Components the engine reads and mutates while executing an instruction
pub struct Bus<'a> {
    pub memory: &'a mut Memory,
    pub display: &'a mut Display,
    pub keyboard: &'a mut Keyboard,
}

/// Engine sub-state between two steps
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CpuState {
    /// Fetching and executing instructions
    Running,
    /// Parked on FX0A until a key completes a press then release transition
    AwaitingKey { register: u8 },
}

/// Outcome of a single step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// The operation ran to completion and the program counter moved on
    Executed(Operation),
    /// FX0A is waiting for a key, the program counter did not move
    AwaitingKey,
    /// DXYN arrived before the next 60 Hz frame and was dropped, the program
    /// counter did not move so the draw is retried on the next step
    DrawDeferred,
}

/// How an executed operation moves the program counter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PcUpdate {
    /// Next instruction, PC += 2
    Next,
    /// Skip next instruction, PC += 4
    Skip,
    /// PC = addr
    Jump(u16),
    /// PC untouched, engine now waits for a key
    Wait,
    /// PC untouched, draw rate limited
    Defer,
}

impl PcUpdate {
    fn skip_if(condition: bool) -> PcUpdate {
        if condition {
            PcUpdate::Skip
        } else {
            PcUpdate::Next
        }
    }
}

pub struct Cpu {
    /// General purpose registers
    regs: [u8; REGISTER_COUNT],
    /// Index register
    index: u16,
    /// Program counter
    pc: u16,
    /// Call stack
    stack: [u16; STACK_SIZE],
    /// Stack pointer
    sp: u8,
    /// Delay Timer
    delay_timer: u8,
    /// Sound Timer
    sound_timer: u8,
    /// Quirks
    quirks: Quirks,
    /// PRNG Generator
    rng: StdRng,
    state: CpuState,
    /// Time of the last executed draw, for the 60 Hz draw limit
    last_draw: Option<Instant>,
}

impl Cpu {
    pub fn new(quirks: Quirks, rng: StdRng) -> Cpu {
        Cpu {
            regs: [0u8; REGISTER_COUNT],
            index: 0,
            pc: PROGRAM_START,
            stack: [0u16; STACK_SIZE],
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            quirks,
            rng,
            state: CpuState::Running,
            last_draw: None,
        }
    }

    /// Back to power-on state. Quirks and the random generator are kept.
    pub fn reset(&mut self) {
        self.regs = [0u8; REGISTER_COUNT];
        self.index = 0;
        self.pc = PROGRAM_START;
        self.stack = [0u16; STACK_SIZE];
        self.sp = 0;
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.state = CpuState::Running;
        self.last_draw = None;
    }

    /// Runs one fetch, decode, execute cycle.
    ///
    /// `now` is only used to rate limit sprite draws. On error no register has
    /// been modified and the program counter still points at the faulting
    /// instruction.
    pub fn step(&mut self, bus: &mut Bus<'_>, now: Instant) -> Result<Step, Chip8Error> {
        if let CpuState::AwaitingKey { register } = self.state {
            return Ok(self.poll_key(register, bus.keyboard));
        }

        let opcode = bus.memory.read_u16_be(self.pc);
        let inst = decode(opcode);
        trace!("0x{:03x}: 0x{:04x} {}", self.pc, opcode, inst);

        match self.execute(&inst, bus, now)? {
            PcUpdate::Next => self.pc = (self.pc + 2) & ADDRESS_MASK,
            PcUpdate::Skip => self.pc = (self.pc + 4) & ADDRESS_MASK,
            PcUpdate::Jump(addr) => self.pc = addr & ADDRESS_MASK,
            PcUpdate::Wait => return Ok(Step::AwaitingKey),
            PcUpdate::Defer => return Ok(Step::DrawDeferred),
        }

        Ok(Step::Executed(inst.op))
    }

    /// Decrements both timers, called at 60 Hz
    pub fn step_timer(&mut self) {
        if self.delay_timer > 0 {
            self.delay_timer -= 1;
        }

        if self.sound_timer > 0 {
            self.sound_timer -= 1;
        }
    }

    fn execute(
        &mut self,
        inst: &Instruction,
        bus: &mut Bus<'_>,
        now: Instant,
    ) -> Result<PcUpdate, Chip8Error> {
        let x = inst.x as usize;
        let y = inst.y as usize;
        let vx = self.regs[x];
        let vy = self.regs[y];

        let update = match inst.op {
            // 00E0: Clear screen
            Operation::ClearScreen => {
                bus.display.clear();
                PcUpdate::Next
            }
            // 00EE: Return subroutine from stack
            Operation::Return => {
                if self.sp == 0 {
                    warn!("0x{:03x}: return with empty call stack", self.pc);
                    return Err(Chip8Error::StackUnderflow { pc: self.pc });
                }
                self.sp -= 1;
                PcUpdate::Jump(self.stack[self.sp as usize])
            }
            // 1NNN: Jump to memory location NNN
            Operation::Jump => PcUpdate::Jump(inst.nnn),
            // 2NNN: Call subroutine at memory location NNN
            Operation::Call => {
                if self.sp as usize >= STACK_SIZE {
                    warn!("0x{:03x}: call with full call stack", self.pc);
                    return Err(Chip8Error::StackOverflow {
                        pc: self.pc,
                        depth: STACK_SIZE,
                    });
                }
                // Push return address, the instruction after the call
                self.stack[self.sp as usize] = (self.pc + 2) & ADDRESS_MASK;
                self.sp += 1;
                PcUpdate::Jump(inst.nnn)
            }
            // 3XNN: Skip next instruction if VX == NN
            Operation::SkipIfEqualKk => PcUpdate::skip_if(vx == inst.kk),
            // 4XNN: Skip next instruction if VX != NN
            Operation::SkipIfNotEqualKk => PcUpdate::skip_if(vx != inst.kk),
            // 5XY0: Skip next instruction if VX == VY
            Operation::SkipIfEqualVy => PcUpdate::skip_if(vx == vy),
            // 6XNN: Set register VX to the value NN
            Operation::SetKk => {
                self.regs[x] = inst.kk;
                PcUpdate::Next
            }
            // 7XNN: Add the value NN to VX, carry is dropped and VF untouched
            Operation::AddKk => {
                self.regs[x] = vx.wrapping_add(inst.kk);
                PcUpdate::Next
            }
            // 8XY0: Set register VX to the value of VY
            Operation::SetVy => {
                self.regs[x] = vy;
                PcUpdate::Next
            }
            // 8XY1, 8XY2, 8XY3: Binary OR, AND, XOR of VX and VY stored in VX
            Operation::Or | Operation::And | Operation::Xor => {
                self.regs[x] = match inst.op {
                    Operation::Or => vx | vy,
                    Operation::And => vx & vy,
                    _ => vx ^ vy,
                };
                if self.quirks.vf_reset {
                    // VF as flag: clobbered by the logic unit
                    self.regs[FLAG] = 0;
                }
                PcUpdate::Next
            }
            // 8XY4: Add register VX and register VY and store result in VX
            Operation::AddVyWithCarry => {
                let (res, carry) = vx.overflowing_add(vy);
                self.regs[x] = res;
                // VF as flag: carry, written last so it wins over VX == VF
                self.regs[FLAG] = carry as u8;
                PcUpdate::Next
            }
            // 8XY5: Subtract, sets VX to the result of VX - VY
            Operation::SubtractVy => {
                let (res, borrow) = vx.overflowing_sub(vy);
                self.regs[x] = res;
                // VF as flag: 0 on borrow, 1 otherwise
                self.regs[FLAG] = (!borrow) as u8;
                PcUpdate::Next
            }
            // 8XY7: Subtract, sets VX to the result of VY - VX
            Operation::SubtractFromVy => {
                let (res, borrow) = vy.overflowing_sub(vx);
                self.regs[x] = res;
                // VF as flag: 0 on borrow, 1 otherwise
                self.regs[FLAG] = (!borrow) as u8;
                PcUpdate::Next
            }
            // 8XY6: Shift right by 1 bit, source is VY with the legacy shift quirk
            Operation::ShiftRight => {
                let src = if self.quirks.legacy_shift { vy } else { vx };
                self.regs[x] = src >> 1;
                // VF as flag: bit shifted out
                self.regs[FLAG] = src & 0x01;
                PcUpdate::Next
            }
            // 8XYE: Shift left by 1 bit, source is VY with the legacy shift quirk
            Operation::ShiftLeft => {
                let src = if self.quirks.legacy_shift { vy } else { vx };
                self.regs[x] = src << 1;
                // VF as flag: bit shifted out
                self.regs[FLAG] = (src & 0x80) >> 7;
                PcUpdate::Next
            }
            // 9XY0: Skip next instruction if VX != VY
            Operation::SkipIfNotEqualVy => PcUpdate::skip_if(vx != vy),
            // ANNN: Set index register to NNN
            Operation::SetIndex => {
                self.index = inst.nnn;
                PcUpdate::Next
            }
            // BNNN: Jump to NNN plus V0, or plus VX with the jump quirk
            Operation::JumpWithOffset => {
                let offset = if self.quirks.jump_uses_vx {
                    vx
                } else {
                    self.regs[0x0]
                };
                PcUpdate::Jump((inst.nnn + offset as u16) & ADDRESS_MASK)
            }
            // CXNN: Random number AND NN
            Operation::Random => {
                self.regs[x] = self.rng.gen::<u8>() & inst.kk;
                PcUpdate::Next
            }
            // DXYN: Draw N rows sprite from memory at I to coordinates (VX, VY)
            Operation::Draw => {
                if let Some(last) = self.last_draw {
                    if now.saturating_duration_since(last) < DRAW_INTERVAL {
                        return Ok(PcUpdate::Defer);
                    }
                }
                self.last_draw = Some(now);

                let collision = self.draw_sprite(vx, vy, inst.n, bus);
                // VF as flag: collision, always overwritten
                self.regs[FLAG] = collision as u8;
                PcUpdate::Next
            }
            // EX9E: Skip next instruction if key VX is pressed
            Operation::SkipIfKeyPressed => PcUpdate::skip_if(bus.keyboard.is_key_pressed(vx)),
            // EXA1: Skip next instruction if key VX is not pressed
            Operation::SkipIfKeyNotPressed => {
                PcUpdate::skip_if(!bus.keyboard.is_key_pressed(vx))
            }
            // FX07: Set VX to delay timer
            Operation::LoadDelayTimer => {
                self.regs[x] = self.delay_timer;
                PcUpdate::Next
            }
            // FX0A: Block until a key is pressed and released, key code goes to VX
            Operation::WaitForKey => {
                // Only transitions completed from now on count
                bus.keyboard.discard_completed_presses();
                self.state = CpuState::AwaitingKey { register: inst.x };
                PcUpdate::Wait
            }
            // FX15: Set delay timer to VX
            Operation::SetDelayTimer => {
                self.delay_timer = vx;
                PcUpdate::Next
            }
            // FX18: Set sound timer to VX
            Operation::SetSoundTimer => {
                self.sound_timer = vx;
                PcUpdate::Next
            }
            // FX1E: Add VX to index register
            Operation::AddToIndex => {
                self.index = (self.index + vx as u16) & ADDRESS_MASK;
                PcUpdate::Next
            }
            // FX29: Point index register at font glyph for the low nibble of VX
            Operation::SetIndexToFont => {
                self.index = FONT_BASE + (vx & 0x0F) as u16 * FONT_GLYPH_SIZE;
                PcUpdate::Next
            }
            // FX33: Store hundreds, tens and units of VX at I, I + 1 and I + 2
            Operation::StoreBcd => {
                bus.memory.write_u8(self.index, vx / 100);
                bus.memory.write_u8(self.index.wrapping_add(1), (vx / 10) % 10);
                bus.memory.write_u8(self.index.wrapping_add(2), vx % 10);
                PcUpdate::Next
            }
            // FX55: Store - Store of each register from V0-VX at memory addresses starting at I until I + X
            Operation::StoreRegisters => {
                for i in 0..=x {
                    let addr = self.index.wrapping_add(i as u16);
                    bus.memory.write_u8(addr, self.regs[i]);
                }
                self.advance_index_after_transfer(x);
                PcUpdate::Next
            }
            // FX65: Load - Load of each register from V0-VX from memory addresses starting at I until I + X
            Operation::LoadRegisters => {
                for i in 0..=x {
                    let addr = self.index.wrapping_add(i as u16);
                    self.regs[i] = bus.memory.read_u8(addr);
                }
                self.advance_index_after_transfer(x);
                PcUpdate::Next
            }
            // 0NNN: Machine code routine, not supported by interpreters after the COSMAC VIP
            Operation::SystemCall => PcUpdate::Next,
            Operation::Unknown => {
                warn!(
                    "0x{:03x}: ignoring unknown instruction 0x{:04x}",
                    self.pc, inst.opcode
                );
                PcUpdate::Next
            }
        };

        Ok(update)
    }

    /// XORs an N row sprite at I into the display.
    ///
    /// Only the origin is wrapped into the screen. The remaining pixels are
    /// clipped or wrapped depending on the clip quirk. Returns true if any lit
    /// pixel was turned off.
    fn draw_sprite(&self, vx: u8, vy: u8, rows: u8, bus: &mut Bus<'_>) -> bool {
        let ox = vx as usize % SCREEN_WIDTH;
        let oy = vy as usize % SCREEN_HEIGHT;
        let clip = self.quirks.clip_sprites;
        let mut collision = false;

        for row in 0..rows as usize {
            let mut y = oy + row;
            if y >= SCREEN_HEIGHT {
                if clip {
                    break;
                }
                y %= SCREEN_HEIGHT;
            }

            // Read row(8-bit) of sprite data from memory
            let data = bus.memory.read_u8(self.index.wrapping_add(row as u16));

            for column in 0..8 {
                let mut x = ox + column;
                if x >= SCREEN_WIDTH {
                    if clip {
                        break;
                    }
                    x %= SCREEN_WIDTH;
                }

                // bitmask single bit, most significant bit is the leftmost pixel
                let mask = 0x80 >> column;
                if data & mask != 0 && bus.display.flip_pixel(x, y) {
                    collision = true;
                }
            }
        }

        collision
    }

    fn advance_index_after_transfer(&mut self, x: usize) {
        if self.quirks.memory_increment {
            self.index = (self.index + x as u16 + 1) & ADDRESS_MASK;
        }
    }

    fn poll_key(&mut self, register: u8, keyboard: &mut Keyboard) -> Step {
        match keyboard.take_completed_press() {
            Some(key) => {
                trace!("0x{:03x}: key 0x{:x} released into V{:X}", self.pc, key, register);
                self.regs[register as usize] = key;
                self.state = CpuState::Running;
                self.pc = (self.pc + 2) & ADDRESS_MASK;
                Step::Executed(Operation::WaitForKey)
            }
            None => Step::AwaitingKey,
        }
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.regs
    }

    /// Value of register V`reg`, `reg` is masked to 0x0-0xF
    pub fn register(&self, reg: u8) -> u8 {
        self.regs[(reg & 0x0F) as usize]
    }

    /// Return addresses currently on the call stack, oldest first
    pub fn stack(&self) -> &[u16] {
        &self.stack[..self.sp as usize]
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn state(&self) -> CpuState {
        self.state
    }

    pub fn quirks(&self) -> &Quirks {
        &self.quirks
    }

    pub fn quirks_mut(&mut self) -> &mut Quirks {
        &mut self.quirks
    }
}
