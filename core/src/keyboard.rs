/// Host key tokens mapped onto the hexadecimal keypad.
///
/// The keypad layout is mapped to the left 4 alphanumeric columns.
/// ```text
/// |1|2|3|C|      |1|2|3|4|
/// |4|5|6|D|  ->  |Q|W|E|R|
/// |7|8|9|E|  ->  |A|S|D|F|
/// |A|0|B|F|      |Z|X|C|V|
/// ```
#[rustfmt::skip]
const KEY_LAYOUT: [(char, u8); 16] = [
    ('1', 0x1), ('2', 0x2), ('3', 0x3), ('4', 0xC),
    ('q', 0x4), ('w', 0x5), ('e', 0x6), ('r', 0xD),
    ('a', 0x7), ('s', 0x8), ('d', 0x9), ('f', 0xE),
    ('z', 0xA), ('x', 0x0), ('c', 0xB), ('v', 0xF),
];

pub const KEY_COUNT: usize = 16;

/// Looks up the keypad code for a host key token, case insensitive
pub fn key_code(token: char) -> Option<u8> {
    let token = token.to_ascii_lowercase();
    KEY_LAYOUT
        .iter()
        .find(|(t, _)| *t == token)
        .map(|(_, code)| *code)
}

/// Progress of a single key through a press then release transition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
enum PressCycle {
    #[default]
    Idle,
    /// Key went down, release not seen yet
    Pressed,
    /// Key went down and back up, not consumed yet
    Completed,
}

/// State of the 16 key hexadecimal keypad.
///
/// Besides the held state of every key, the keyboard remembers which keys went
/// through a full press then release transition so that waiting for a key does
/// not fire on key-repeat or on a key that is merely held down.
#[derive(Clone, Debug, Default)]
pub struct Keyboard {
    held: [bool; KEY_COUNT],
    cycles: [PressCycle; KEY_COUNT],
}

impl Keyboard {
    pub fn new() -> Keyboard {
        Keyboard::default()
    }

    /// Updates the state of key `code`; codes above 0xF are ignored
    pub fn set_key_state(&mut self, code: u8, pressed: bool) {
        let Some(idx) = Self::index(code) else {
            return;
        };

        self.held[idx] = pressed;
        self.cycles[idx] = match (self.cycles[idx], pressed) {
            (_, true) => PressCycle::Pressed,
            (PressCycle::Pressed, false) => PressCycle::Completed,
            (cycle, false) => cycle,
        };
    }

    /// Updates the key bound to host `token`.
    ///
    /// Returns false if the token is not part of the keypad layout.
    pub fn set_token_state(&mut self, token: char, pressed: bool) -> bool {
        match key_code(token) {
            Some(code) => {
                self.set_key_state(code, pressed);
                true
            }
            None => false,
        }
    }

    pub fn is_key_pressed(&self, code: u8) -> bool {
        Self::index(code).map_or(false, |idx| self.held[idx])
    }

    /// Consumes the lowest key code with a completed press then release transition
    pub fn take_completed_press(&mut self) -> Option<u8> {
        let idx = self
            .cycles
            .iter()
            .position(|cycle| *cycle == PressCycle::Completed)?;
        self.cycles[idx] = PressCycle::Idle;
        Some(idx as u8)
    }

    /// Forgets completed transitions; presses still in progress are kept
    pub fn discard_completed_presses(&mut self) {
        for cycle in self.cycles.iter_mut() {
            if *cycle == PressCycle::Completed {
                *cycle = PressCycle::Idle;
            }
        }
    }

    fn index(code: u8) -> Option<usize> {
        let idx = code as usize;
        (idx < KEY_COUNT).then_some(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let tokens = "1234qwerasdfzxcv";
        let codes = [
            0x1, 0x2, 0x3, 0xC, 0x4, 0x5, 0x6, 0xD, 0x7, 0x8, 0x9, 0xE, 0xA, 0x0, 0xB, 0xF,
        ];
        for (token, code) in tokens.chars().zip(codes) {
            assert_eq!(key_code(token), Some(code), "token {}", token);
        }
        assert_eq!(key_code('Q'), Some(0x4));
        assert_eq!(key_code('5'), None);
        assert_eq!(key_code(' '), None);
    }

    #[test]
    fn test_held_state() {
        let mut keyboard = Keyboard::new();

        assert!(keyboard.set_token_state('w', true));
        assert!(keyboard.is_key_pressed(0x5));
        assert!(!keyboard.is_key_pressed(0x4));

        assert!(keyboard.set_token_state('w', false));
        assert!(!keyboard.is_key_pressed(0x5));
    }

    #[test]
    fn test_unmapped_token() {
        let mut keyboard = Keyboard::new();
        assert!(!keyboard.set_token_state('p', true));
        assert!((0..16).all(|code| !keyboard.is_key_pressed(code)));
    }

    #[test]
    fn test_out_of_range_code() {
        let mut keyboard = Keyboard::new();
        keyboard.set_key_state(0x10, true);
        keyboard.set_key_state(0x10, false);
        assert!(!keyboard.is_key_pressed(0x10));
        assert_eq!(keyboard.take_completed_press(), None);
    }

    #[test]
    fn test_press_without_release_is_not_completed() {
        let mut keyboard = Keyboard::new();

        keyboard.set_key_state(0xA, true);
        // Key repeat
        keyboard.set_key_state(0xA, true);

        assert_eq!(keyboard.take_completed_press(), None);
    }

    #[test]
    fn test_release_without_press_is_not_completed() {
        let mut keyboard = Keyboard::new();
        keyboard.set_key_state(0xA, false);
        assert_eq!(keyboard.take_completed_press(), None);
    }

    #[test]
    fn test_press_release_cycle() {
        let mut keyboard = Keyboard::new();

        keyboard.set_key_state(0xB, true);
        keyboard.set_key_state(0xB, false);

        assert_eq!(keyboard.take_completed_press(), Some(0xB));
        // Consumed
        assert_eq!(keyboard.take_completed_press(), None);
    }

    #[test]
    fn test_lowest_completed_key_first() {
        let mut keyboard = Keyboard::new();
        for code in [0x9, 0x3] {
            keyboard.set_key_state(code, true);
            keyboard.set_key_state(code, false);
        }

        assert_eq!(keyboard.take_completed_press(), Some(0x3));
        assert_eq!(keyboard.take_completed_press(), Some(0x9));
    }

    #[test]
    fn test_discard_keeps_pending_press() {
        let mut keyboard = Keyboard::new();
        keyboard.set_key_state(0x1, true);
        keyboard.set_key_state(0x1, false);
        keyboard.set_key_state(0x2, true);

        keyboard.discard_completed_presses();

        keyboard.set_key_state(0x2, false);
        assert_eq!(keyboard.take_completed_press(), Some(0x2));
        assert_eq!(keyboard.take_completed_press(), None);
    }
}
