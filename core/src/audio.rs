/// Audio collaborator driven by the sound timer.
///
/// The machine calls `start_beep` when the sound timer becomes non-zero and
/// `stop_beep` when it reaches zero, so implementations only need to hold a
/// tone between the two calls.
pub trait Beeper {
    fn start_beep(&mut self);
    fn stop_beep(&mut self);
    fn is_playing(&self) -> bool;
}

/// Silent beeper that only tracks whether a beep would be playing
#[derive(Debug, Default)]
pub struct Mute {
    playing: bool,
}

impl Mute {
    pub fn new() -> Self {
        Mute::default()
    }
}

impl Beeper for Mute {
    fn start_beep(&mut self) {
        self.playing = true;
    }

    fn stop_beep(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}
