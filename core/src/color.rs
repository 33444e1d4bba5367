use std::str::FromStr;

use bytemuck::{Pod, Zeroable};
use thiserror::Error;

use crate::display::{Display, SCREEN_HEIGHT, SCREEN_WIDTH};

pub const DEFAULT_BACKGROUND_COLOR: Chip8Color = Chip8Color::new(0, 0, 0);
pub const DEFAULT_FOREGROUND_COLOR: Chip8Color = Chip8Color::new(255, 255, 255);

/// Pixel color laid out to match an `RGBX8888` texture on little-endian hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C, packed)]
pub struct Chip8Color {
    padding: u8,
    pub b: u8,
    pub g: u8,
    pub r: u8,
}

impl Chip8Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Chip8Color {
        Chip8Color { r, g, b, padding: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to parse hex color {0:?}, expected 0xRRGGBB")]
pub struct ColorParseError(String);

impl FromStr for Chip8Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Chip8Color, ColorParseError> {
        let err = || ColorParseError(s.to_string());
        let hex = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix('#'))
            .unwrap_or(s);

        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }

        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        Ok(Chip8Color::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// Colors used to turn the monochrome framebuffer into texture pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub foreground: Chip8Color,
    pub background: Chip8Color,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            foreground: DEFAULT_FOREGROUND_COLOR,
            background: DEFAULT_BACKGROUND_COLOR,
        }
    }
}

impl Palette {
    /// Row-major frame of `SCREEN_WIDTH * SCREEN_HEIGHT` pixels
    pub fn render(&self, display: &Display) -> Vec<Chip8Color> {
        let mut frame = vec![self.background; SCREEN_WIDTH * SCREEN_HEIGHT];
        self.render_into(display, &mut frame);
        frame
    }

    /// Renders into an existing frame, extra pixels in `frame` are left alone
    pub fn render_into(&self, display: &Display, frame: &mut [Chip8Color]) {
        let pixels = display.pixels().iter().flatten();
        for (out, pixel) in frame.iter_mut().zip(pixels) {
            *out = if *pixel != 0 {
                self.foreground
            } else {
                self.background
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("0xAABBCC".parse::<Chip8Color>(), Ok(Chip8Color::new(0xAA, 0xBB, 0xCC)));
        assert_eq!("#102030".parse::<Chip8Color>(), Ok(Chip8Color::new(0x10, 0x20, 0x30)));
        assert_eq!("ff00ff".parse::<Chip8Color>(), Ok(Chip8Color::new(0xFF, 0x00, 0xFF)));
    }

    #[test]
    fn test_parse_errors() {
        for s in ["", "0x", "0xABCDE", "0xABCDEF0", "0xGGGGGG", "0x+1+2+3"] {
            assert!(s.parse::<Chip8Color>().is_err(), "{:?}", s);
        }
    }

    #[test]
    fn test_texture_layout() {
        let color = Chip8Color::new(0x11, 0x22, 0x33);
        let bytes: &[u8] = bytemuck::bytes_of(&color);
        assert_eq!(bytes, &[0x00, 0x33, 0x22, 0x11]);
    }

    #[test]
    fn test_render() {
        // Arrange
        let palette = Palette {
            foreground: Chip8Color::new(1, 2, 3),
            background: Chip8Color::new(4, 5, 6),
        };
        let mut display = Display::new();
        display.set_pixel(1, 0, true);
        display.set_pixel(63, 31, true);

        // Act
        let frame = palette.render(&display);

        // Assert
        assert_eq!(frame.len(), SCREEN_WIDTH * SCREEN_HEIGHT);
        assert_eq!(frame[0], palette.background);
        assert_eq!(frame[1], palette.foreground);
        assert_eq!(frame[SCREEN_WIDTH * SCREEN_HEIGHT - 1], palette.foreground);
        assert_eq!(
            frame.iter().filter(|c| **c == palette.foreground).count(),
            2
        );
    }
}
