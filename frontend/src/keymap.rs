use sdl2::keyboard::Keycode;

/// Host key token for an SDL key, tokens are resolved to keypad codes by the core
pub fn token(keycode: Keycode) -> Option<char> {
    let token = match keycode {
        Keycode::Num1 => '1',
        Keycode::Num2 => '2',
        Keycode::Num3 => '3',
        Keycode::Num4 => '4',
        Keycode::Q => 'q',
        Keycode::W => 'w',
        Keycode::E => 'e',
        Keycode::R => 'r',
        Keycode::A => 'a',
        Keycode::S => 's',
        Keycode::D => 'd',
        Keycode::F => 'f',
        Keycode::Z => 'z',
        Keycode::X => 'x',
        Keycode::C => 'c',
        Keycode::V => 'v',
        _ => return None,
    };
    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chip8_vm_core::key_code;

    #[test]
    fn test_every_token_is_mapped() {
        #[rustfmt::skip]
        let keys = [
            Keycode::Num1, Keycode::Num2, Keycode::Num3, Keycode::Num4,
            Keycode::Q, Keycode::W, Keycode::E, Keycode::R,
            Keycode::A, Keycode::S, Keycode::D, Keycode::F,
            Keycode::Z, Keycode::X, Keycode::C, Keycode::V,
        ];
        let mut codes: Vec<u8> = keys
            .iter()
            .filter_map(|key| token(*key))
            .filter_map(key_code)
            .collect();
        codes.sort_unstable();
        assert_eq!(codes, (0..16).collect::<Vec<u8>>());
    }

    #[test]
    fn test_unmapped() {
        assert_eq!(token(Keycode::Num5), None);
        assert_eq!(token(Keycode::Escape), None);
    }
}
