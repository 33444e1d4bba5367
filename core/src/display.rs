pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;

/// Row major snapshot of the display, one byte per pixel holding 0 or 1
pub type Screen = [[u8; SCREEN_WIDTH]; SCREEN_HEIGHT];

/// 64x32 pixels 1 bit monochrome framebuffer.
///
/// Coordinates outside of the screen are never an error: reads return an off
/// pixel and writes are dropped.
#[derive(Clone)]
pub struct Display {
    pixels: Screen,
    /// Set by every mutation, cleared by the host once it has presented the frame
    dirty: bool,
}

impl Display {
    pub fn new() -> Display {
        Display {
            pixels: [[0u8; SCREEN_WIDTH]; SCREEN_HEIGHT],
            dirty: true,
        }
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> bool {
        if x >= SCREEN_WIDTH || y >= SCREEN_HEIGHT {
            return false;
        }
        self.pixels[y][x] > 0
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, on_off: bool) {
        if x >= SCREEN_WIDTH || y >= SCREEN_HEIGHT {
            return;
        }
        self.pixels[y][x] = on_off as u8;
        self.dirty = true;
    }

    /// XORs a lit sprite bit into the pixel at (x, y).
    ///
    /// Returns true if the pixel was on and got turned off.
    pub fn flip_pixel(&mut self, x: usize, y: usize) -> bool {
        let was_on = self.get_pixel(x, y);
        self.set_pixel(x, y, !was_on);
        was_on
    }

    pub fn clear(&mut self) {
        self.pixels.iter_mut().for_each(|row| row.fill(0));
        self.dirty = true;
    }

    pub fn pixels(&self) -> &Screen {
        &self.pixels
    }

    /// Number of lit pixels
    pub fn lit(&self) -> usize {
        self.pixels.iter().flatten().filter(|p| **p > 0).count()
    }

    pub fn dirty(&self) -> bool {
        self.dirty
    }

    /// Returns whether the display changed since the last call and resets the flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get_pixel() {
        let mut display = Display::new();

        display.set_pixel(3, 7, true);

        assert!(display.get_pixel(3, 7));
        assert!(!display.get_pixel(7, 3));
        assert_eq!(display.pixels()[7][3], 1);
        assert_eq!(display.lit(), 1);
    }

    #[test]
    fn test_out_of_range_read() {
        let display = Display::new();
        assert!(!display.get_pixel(SCREEN_WIDTH, 0));
        assert!(!display.get_pixel(0, SCREEN_HEIGHT));
        assert!(!display.get_pixel(usize::MAX, usize::MAX));
    }

    #[test]
    fn test_out_of_range_write_is_ignored() {
        let mut display = Display::new();
        display.take_dirty();

        display.set_pixel(SCREEN_WIDTH, 0, true);
        display.set_pixel(0, SCREEN_HEIGHT, true);

        assert_eq!(display.lit(), 0);
        assert!(!display.dirty());
    }

    #[test]
    fn test_flip_pixel() {
        let mut display = Display::new();

        assert!(!display.flip_pixel(63, 31));
        assert!(display.get_pixel(63, 31));
        assert!(display.flip_pixel(63, 31));
        assert!(!display.get_pixel(63, 31));
        assert!(!display.flip_pixel(64, 31));
    }

    #[test]
    fn test_clear() {
        let mut display = Display::new();
        for x in 0..SCREEN_WIDTH {
            display.set_pixel(x, x % SCREEN_HEIGHT, true);
        }
        assert_eq!(display.lit(), SCREEN_WIDTH);

        display.clear();

        assert_eq!(display.lit(), 0);
    }

    #[test]
    fn test_dirty_flag() {
        let mut display = Display::new();
        assert!(display.take_dirty());
        assert!(!display.take_dirty());

        display.set_pixel(0, 0, true);

        assert!(display.take_dirty());
        assert!(!display.dirty());
    }
}
