use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::{anyhow, bail, Context, Result};
use chip8_vm_core::{
    disassemble, Beeper, Chip8Builder, Chip8Color, Chip8Mode, Mute, Palette, Quirks, Scheduler,
    SCREEN_HEIGHT, SCREEN_WIDTH,
};
use clap::{Parser, ValueEnum};
use log::{error, info, LevelFilter};
use sdl2::{event::Event, keyboard::Keycode, pixels::PixelFormatEnum};

mod audio;
mod keymap;

use audio::SdlBeeper;

/// Poll interval while paused
const IDLE_INTERVAL: Duration = Duration::from_millis(16);

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    CosmacVip,
    Chip48,
    SuperChip,
}

impl From<Mode> for Chip8Mode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::CosmacVip => Chip8Mode::COSMAC_VIP,
            Mode::Chip48 => Chip8Mode::CHIP_48,
            Mode::SuperChip => Chip8Mode::SUPER_CHIP,
        }
    }
}

/// CHIP-8 virtual machine
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Filepath to Chip-8 ROM file that will be executed
    #[clap(index = 1)]
    rom: PathBuf,

    /// Filepath to font file
    #[clap(long)]
    font: Option<PathBuf>,

    /// Background Color as HEX 0xAABBFF [default: 0x000000]
    #[clap(long)]
    background: Option<Chip8Color>,

    /// Foreground Color as HEX 0xAABBFF [default: 0xFFFFFF]
    #[clap(long)]
    foreground: Option<Chip8Color>,

    /// Display scaling factor
    #[clap(short, long, default_value_t = 10)]
    scale: u32,

    /// Instructions per second
    #[clap(short, long, default_value_t = 700)]
    ips: u32,

    /// PRNG seed
    #[clap(long)]
    seed: Option<u64>,

    /// Quirk preset of a historical interpreter [default: none of the quirks]
    #[clap(long, value_enum)]
    mode: Option<Mode>,

    /// FX55/FX65 increment I
    #[clap(long, overrides_with = "no_memory_increment")]
    memory_increment: bool,
    #[clap(long, hide = true)]
    no_memory_increment: bool,

    /// 8XY6/8XYE shift VY into VX
    #[clap(long, overrides_with = "no_legacy_shift")]
    legacy_shift: bool,
    #[clap(long, hide = true)]
    no_legacy_shift: bool,

    /// DXYN clips sprites at the screen edges instead of wrapping
    #[clap(long, overrides_with = "no_clip")]
    clip: bool,
    #[clap(long, hide = true)]
    no_clip: bool,

    /// 8XY1/8XY2/8XY3 reset VF
    #[clap(long, overrides_with = "no_vf_reset")]
    vf_reset: bool,
    #[clap(long, hide = true)]
    no_vf_reset: bool,

    /// BNNN jumps to NNN + VX instead of NNN + V0
    #[clap(long, overrides_with = "no_jump_vx")]
    jump_vx: bool,
    #[clap(long, hide = true)]
    no_jump_vx: bool,

    /// Disable sound
    #[clap(long)]
    mute: bool,

    /// Print the ROM disassembly and exit
    #[clap(long)]
    disassemble: bool,

    /// Trace every executed instruction
    #[clap(short, long)]
    debug: bool,
}

impl Args {
    fn quirks(&self) -> Quirks {
        let mut quirks = self.mode.map(|m| Quirks::for_mode(m.into())).unwrap_or_default();
        let overrides = [
            (&mut quirks.memory_increment, self.memory_increment, self.no_memory_increment),
            (&mut quirks.legacy_shift, self.legacy_shift, self.no_legacy_shift),
            (&mut quirks.clip_sprites, self.clip, self.no_clip),
            (&mut quirks.vf_reset, self.vf_reset, self.no_vf_reset),
            (&mut quirks.jump_uses_vx, self.jump_vx, self.no_jump_vx),
        ];
        for (quirk, on, off) in overrides {
            if on {
                *quirk = true;
            } else if off {
                *quirk = false;
            }
        }
        quirks
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(if args.debug {
            LevelFilter::Trace
        } else {
            LevelFilter::Info
        })
        .parse_default_env()
        .init();

    if args.scale == 0 || args.scale > 100 {
        bail!("Display scaling factor must be between [1-100]");
    }

    if args.ips == 0 || args.ips > 1_000_000 {
        bail!("Instructions per second must be between [1-1000000]");
    }

    let rom_data = std::fs::read(&args.rom)
        .with_context(|| format!("Failed to read ROM file {}", args.rom.display()))?;

    if args.disassemble {
        for (addr, inst) in disassemble(&rom_data) {
            println!("0x{:03X}: {:04X}  {}", addr, inst.opcode, inst);
        }
        return Ok(());
    }

    let sdl_context = sdl2::init().map_err(|e| anyhow!(e))?;
    let video_subsystem = sdl_context.video().map_err(|e| anyhow!(e))?;

    let beeper: Box<dyn Beeper> = if args.mute {
        Box::new(Mute::new())
    } else {
        let audio_subsystem = sdl_context.audio().map_err(|e| anyhow!(e))?;
        Box::new(SdlBeeper::open(&audio_subsystem).map_err(|e| anyhow!(e))?)
    };

    let mut builder = Chip8Builder::new()
        .with_rom(rom_data)
        .with_quirks(args.quirks())
        .with_beeper(beeper);

    if let Some(font) = &args.font {
        let font_data = std::fs::read(font)
            .with_context(|| format!("Failed to read font file {}", font.display()))?;
        builder = builder.with_font(font_data);
    }

    if let Some(seed) = args.seed {
        builder = builder.with_rng_seed(seed);
    }

    let mut chip = builder.build()?;
    info!("quirks: {:?}", chip.quirks());

    let mut palette = Palette::default();
    if let Some(foreground) = args.foreground {
        palette.foreground = foreground;
    }
    if let Some(background) = args.background {
        palette.background = background;
    }

    let window = video_subsystem
        .window(
            "chip8-vm",
            SCREEN_WIDTH as u32 * args.scale,
            SCREEN_HEIGHT as u32 * args.scale,
        )
        .position_centered()
        .build()?;

    let mut canvas = window.into_canvas().build()?;

    let texture_creator = canvas.texture_creator();
    let mut texture = texture_creator.create_texture_streaming(
        PixelFormatEnum::RGBX8888,
        SCREEN_WIDTH as u32,
        SCREEN_HEIGHT as u32,
    )?;

    let mut event_pump = sdl_context.event_pump().map_err(|e| anyhow!(e))?;

    let mut frame = palette.render(chip.display());
    let mut scheduler = Scheduler::new(args.ips, Instant::now());
    let mut paused = false;

    'running: loop {
        // Process events
        for event in event_pump.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => break 'running,
                Event::KeyDown {
                    keycode: Some(Keycode::Space),
                    repeat: false,
                    ..
                } => {
                    paused = !paused;
                    scheduler.resync(Instant::now());
                    info!("{}", if paused { "paused" } else { "resumed" });
                }
                Event::KeyDown {
                    keycode: Some(Keycode::F5),
                    repeat: false,
                    ..
                } => {
                    chip.reset();
                    paused = false;
                    scheduler.resync(Instant::now());
                }
                Event::KeyDown {
                    keycode: Some(keycode),
                    repeat: false,
                    ..
                } => {
                    if let Some(token) = keymap::token(keycode) {
                        chip.set_key_state(token, true);
                    }
                }
                Event::KeyUp {
                    keycode: Some(keycode),
                    ..
                } => {
                    if let Some(token) = keymap::token(keycode) {
                        chip.set_key_state(token, false);
                    }
                }
                _ => {}
            }
        }

        // Execute CHIP-8 instructions and timer ticks that are due
        if !paused {
            if let Err(err) = chip.run_until(Instant::now(), &mut scheduler) {
                error!("{} (paused, F5 resets)", err);
                paused = true;
            }
        }

        // If display buffer was changed then draw changes on canvas
        if chip.take_redraw() {
            palette.render_into(chip.display(), &mut frame);

            // Copy CHIP-8 display buffer into GPU texture
            texture.update(None, bytemuck::cast_slice(&frame), SCREEN_WIDTH * 4)?;

            // Copy texture to Canvas
            canvas.copy(&texture, None, None).map_err(|e| anyhow!(e))?;

            // present canvas on screen
            canvas.present();
        }

        // Wait until next update
        let deadline = if paused {
            Instant::now() + IDLE_INTERVAL
        } else {
            scheduler.next_deadline()
        };
        if let Some(delay) = deadline.checked_duration_since(Instant::now()) {
            std::thread::sleep(delay);
        }
    }

    Ok(())
}
