/// Historical interpreters this machine can imitate
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Chip8Mode {
    COSMAC_VIP,
    CHIP_48,
    SUPER_CHIP,
}

/// Points where historical CHIP-8 interpreters disagree on instruction semantics.
///
/// All toggles off gives the behavior most modern ROMs expect. Every toggle is
/// read when the affected instruction executes, so changing one between two
/// steps only affects instructions executed afterwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Quirks {
    /// Store and load memory (FX55/FX65) quirk: I is incremented for every
    /// register transferred and keeps its final value (COSMAC VIP)
    pub memory_increment: bool,
    /// Bitwise shift (8XY6 and 8XYE) quirk: the shifted value is read from VY
    /// instead of VX, the result still goes to VX (COSMAC VIP)
    pub legacy_shift: bool,
    /// Draw (DXYN) quirk: sprites are cut at the screen edges instead of
    /// wrapping around to the opposite side
    pub clip_sprites: bool,
    /// Binary ops (8XY1, 8XY2, 8XY3) quirk: VF is reset to 0 (COSMAC VIP)
    pub vf_reset: bool,
    /// Jump with offset (BNNN/BXNN) quirk: Jump to the address NNN plus the value in the register VX (CHIP-48 and SUPER-CHIP),
    /// instead of the address NNN plus the value in the register V0 (COSMAC VIP)
    pub jump_uses_vx: bool,
}

impl Quirks {
    pub fn for_mode(mode: Chip8Mode) -> Quirks {
        match mode {
            Chip8Mode::COSMAC_VIP => Quirks {
                memory_increment: true,
                legacy_shift: true,
                clip_sprites: true,
                vf_reset: true,
                jump_uses_vx: false,
            },
            Chip8Mode::CHIP_48 | Chip8Mode::SUPER_CHIP => Quirks {
                memory_increment: false,
                legacy_shift: false,
                clip_sprites: true,
                vf_reset: false,
                jump_uses_vx: true,
            },
        }
    }
}

impl From<Chip8Mode> for Quirks {
    fn from(mode: Chip8Mode) -> Self {
        Quirks::for_mode(mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_modern() {
        let quirks = Quirks::default();
        assert!(!quirks.memory_increment);
        assert!(!quirks.legacy_shift);
        assert!(!quirks.clip_sprites);
        assert!(!quirks.vf_reset);
        assert!(!quirks.jump_uses_vx);
    }

    #[test]
    fn test_cosmac_vip() {
        let quirks = Quirks::from(Chip8Mode::COSMAC_VIP);
        assert!(quirks.memory_increment);
        assert!(quirks.legacy_shift);
        assert!(quirks.vf_reset);
        assert!(!quirks.jump_uses_vx);
    }

    #[test]
    fn test_super_chip() {
        let quirks = Quirks::for_mode(Chip8Mode::SUPER_CHIP);
        assert!(quirks.jump_uses_vx);
        assert!(!quirks.memory_increment);
        assert_eq!(quirks, Quirks::for_mode(Chip8Mode::CHIP_48));
    }
}
