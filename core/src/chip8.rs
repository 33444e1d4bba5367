// CHIP-8 virtual machine
//
// Useful links:
// * [Guide to making a CHIP-8 emulator](https://tobiasvl.github.io/blog/write-a-chip-8-emulator/)
// * [Building a CHIP-8 Emulator](https://austinmorlan.com/posts/chip8_emulator/)
// * [high-level assembler for the Chip8 virtual machine](https://github.com/JohnEarnest/Octo/blob/gh-pages/js/emulator.js)
//

use std::time::Instant;

use log::info;
use rand::{rngs::StdRng, SeedableRng};

use crate::audio::{Beeper, Mute};
use crate::cpu::{Bus, Cpu, CpuState, Step, REGISTER_COUNT};
use crate::display::{Display, Screen};
use crate::error::Chip8Error;
use crate::keyboard::Keyboard;
use crate::memory::Memory;
use crate::quirks::{Chip8Mode, Quirks};
use crate::timing::{Event, Scheduler};

pub struct Chip8Builder {
    /// ROM
    rom: Option<Vec<u8>>,
    /// Font sprite
    font: Option<Vec<u8>>,
    // PRNG Seed
    rng_seed: Option<u64>,
    /// Quirks
    quirks: Quirks,
    /// Audio output, silent if not set
    beeper: Option<Box<dyn Beeper>>,
}

pub struct Chip8 {
    /// Registers, timers and instruction semantics
    cpu: Cpu,
    /// Memory
    memory: Memory,
    /// Display: 64x32 pixels 1 bit monochrome
    display: Display,
    /// Hexadecimal keypad
    keyboard: Keyboard,
    /// Audio output driven by the sound timer
    beeper: Box<dyn Beeper>,
}

impl Default for Chip8Builder {
    fn default() -> Self {
        Chip8Builder::new()
    }
}

impl Chip8Builder {
    pub fn new() -> Chip8Builder {
        Chip8Builder {
            rom: None,
            font: None,
            rng_seed: None,
            quirks: Quirks::default(),
            beeper: None,
        }
    }

    pub fn with_rom(mut self, rom: Vec<u8>) -> Self {
        self.rom = Some(rom);
        self
    }

    pub fn with_font(mut self, font: Vec<u8>) -> Self {
        self.font = Some(font);
        self
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Replaces the quirks with the preset of `mode`
    pub fn with_mode(mut self, mode: Chip8Mode) -> Self {
        self.quirks = Quirks::for_mode(mode);
        self
    }

    pub fn with_quirks(mut self, quirks: Quirks) -> Self {
        self.quirks = quirks;
        self
    }

    pub fn with_beeper(mut self, beeper: Box<dyn Beeper>) -> Self {
        self.beeper = Some(beeper);
        self
    }

    pub fn build(self) -> Result<Chip8, Chip8Error> {
        // Create memory with the font sprite
        let mut memory = match &self.font {
            Some(font) => Memory::with_font(font)?,
            None => Memory::default(),
        };

        // Copy rom to memory
        if let Some(rom) = &self.rom {
            memory.load_rom(rom)?;
            info!("loaded {} byte ROM", rom.len());
        }

        // Pseudo random number generator
        let rng = match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Chip8 {
            cpu: Cpu::new(self.quirks, rng),
            memory,
            display: Display::new(),
            keyboard: Keyboard::new(),
            beeper: self.beeper.unwrap_or_else(|| Box::new(Mute::new())),
        })
    }
}

impl Chip8 {
    /// Replaces the program and resets the machine.
    ///
    /// A ROM that does not fit leaves memory and machine state untouched.
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<(), Chip8Error> {
        self.memory.load_rom(rom)?;
        info!("loaded {} byte ROM", rom.len());
        self.reset();
        Ok(())
    }

    /// Executes one instruction against the wall clock
    pub fn step(&mut self) -> Result<Step, Chip8Error> {
        self.step_at(Instant::now())
    }

    /// Executes one instruction, `now` is used for the draw rate limit
    pub fn step_at(&mut self, now: Instant) -> Result<Step, Chip8Error> {
        let mut bus = Bus {
            memory: &mut self.memory,
            display: &mut self.display,
            keyboard: &mut self.keyboard,
        };
        let result = self.cpu.step(&mut bus, now);
        self.sync_beeper();
        result
    }

    /// Executes `steps` instructions, stopping at the first error
    pub fn run(&mut self, steps: usize) -> Result<(), Chip8Error> {
        for _ in 0..steps {
            self.step()?;
        }
        Ok(())
    }

    /// Performs every tick and step `scheduler` has due at `now`.
    ///
    /// Returns the number of instructions stepped. On error the remaining
    /// events stay queued in the scheduler.
    pub fn run_until(
        &mut self,
        now: Instant,
        scheduler: &mut Scheduler,
    ) -> Result<usize, Chip8Error> {
        let mut steps = 0;
        while let Some(event) = scheduler.next_due(now) {
            match event {
                Event::Tick => self.tick(),
                Event::Step(at) => {
                    self.step_at(at)?;
                    steps += 1;
                }
            }
        }
        Ok(steps)
    }

    /// Decrements the timers, called at 60 Hz
    pub fn tick(&mut self) {
        self.cpu.step_timer();
        self.sync_beeper();
    }

    /// Back to power-on state, the loaded ROM and font are kept
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.display.clear();
        self.keyboard.discard_completed_presses();
        self.sync_beeper();
        info!("machine reset");
    }

    fn sync_beeper(&mut self) {
        let sounding = self.cpu.sound_timer() > 0;
        if sounding && !self.beeper.is_playing() {
            self.beeper.start_beep();
        } else if !sounding && self.beeper.is_playing() {
            self.beeper.stop_beep();
        }
    }

    /// Owned copy of the framebuffer
    pub fn screen(&self) -> Screen {
        *self.display.pixels()
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    /// Returns true once after every change of the framebuffer
    pub fn take_redraw(&mut self) -> bool {
        self.display.take_dirty()
    }

    /// Updates the keypad key bound to host `token`, returns false for unmapped tokens
    pub fn set_key_state(&mut self, token: char, pressed: bool) -> bool {
        self.keyboard.set_token_state(token, pressed)
    }

    /// Updates keypad key `code` (0x0-0xF)
    pub fn set_key(&mut self, code: u8, pressed: bool) {
        self.keyboard.set_key_state(code, pressed);
    }

    pub fn quirks(&self) -> &Quirks {
        self.cpu.quirks()
    }

    pub fn quirks_mut(&mut self) -> &mut Quirks {
        self.cpu.quirks_mut()
    }

    pub fn set_quirks(&mut self, quirks: Quirks) {
        *self.cpu.quirks_mut() = quirks;
    }

    pub fn pc(&self) -> u16 {
        self.cpu.pc()
    }

    pub fn index(&self) -> u16 {
        self.cpu.index()
    }

    pub fn register(&self, reg: u8) -> u8 {
        self.cpu.register(reg)
    }

    /// V0-VF
    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        self.cpu.registers()
    }

    /// Return addresses on the call stack, oldest first
    pub fn stack(&self) -> &[u16] {
        self.cpu.stack()
    }

    /// Whole address space, font and program included
    pub fn memory(&self) -> &[u8] {
        self.memory.as_slice()
    }

    pub fn delay_timer(&self) -> u8 {
        self.cpu.delay_timer()
    }

    pub fn sound_timer(&self) -> u8 {
        self.cpu.sound_timer()
    }

    pub fn is_awaiting_key(&self) -> bool {
        matches!(self.cpu.state(), CpuState::AwaitingKey { .. })
    }
}
