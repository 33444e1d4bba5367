use chip8_vm_core::Beeper;
use sdl2::{
    audio::{AudioCallback, AudioDevice, AudioSpecDesired},
    AudioSubsystem,
};

const TONE_HZ: f32 = 440.0;
const VOLUME: f32 = 0.05;

pub struct SquareWave {
    phase_inc: f32,
    phase: f32,
    volume: f32,
}

impl AudioCallback for SquareWave {
    type Channel = f32;

    fn callback(&mut self, out: &mut [f32]) {
        // Generate a square wave
        for x in out.iter_mut() {
            *x = if self.phase <= 0.5 {
                self.volume
            } else {
                -self.volume
            };
            self.phase = (self.phase + self.phase_inc) % 1.0;
        }
    }
}

/// Beeper playing a 440 Hz square wave through the SDL audio device
pub struct SdlBeeper {
    device: AudioDevice<SquareWave>,
    playing: bool,
}

impl SdlBeeper {
    pub fn open(audio: &AudioSubsystem) -> Result<SdlBeeper, String> {
        let desired_spec = AudioSpecDesired {
            freq: Some(44100),
            channels: Some(1),
            samples: None,
        };

        let device = audio.open_playback(None, &desired_spec, |spec| SquareWave {
            phase_inc: TONE_HZ / spec.freq as f32,
            phase: 0.0,
            volume: VOLUME,
        })?;

        Ok(SdlBeeper {
            device,
            playing: false,
        })
    }
}

impl Beeper for SdlBeeper {
    fn start_beep(&mut self) {
        self.device.resume();
        self.playing = true;
    }

    fn stop_beep(&mut self) {
        self.device.pause();
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}
