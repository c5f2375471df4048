use std::iter::FromIterator;

pub const KEY_COUNT: usize = 16;

/// Hex keypad state, sampled by the VM once per step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Keypad {
    keys: [bool; KEY_COUNT],
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys above 0xF are ignored.
    pub fn press(&mut self, key: u8) {
        if let Some(k) = self.keys.get_mut(usize::from(key)) {
            *k = true;
        }
    }

    pub fn release(&mut self, key: u8) {
        if let Some(k) = self.keys.get_mut(usize::from(key)) {
            *k = false;
        }
    }

    pub fn clear(&mut self) {
        self.keys = [false; KEY_COUNT];
    }

    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys.get(usize::from(key)).copied().unwrap_or(false)
    }

    pub fn first_pressed(&self) -> Option<u8> {
        self.keys.iter().position(|&k| k).map(|k| k as u8)
    }
}

impl From<[bool; KEY_COUNT]> for Keypad {
    fn from(keys: [bool; KEY_COUNT]) -> Self {
        Self { keys }
    }
}

impl FromIterator<u8> for Keypad {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut keypad = Keypad::new();
        for key in iter {
            keypad.press(key);
        }
        keypad
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_release() {
        let mut keypad = Keypad::new();
        keypad.press(0xA);
        assert!(keypad.is_pressed(0xA));
        keypad.release(0xA);
        assert!(!keypad.is_pressed(0xA));
    }

    #[test]
    fn out_of_range_keys_are_never_pressed() {
        let mut keypad = Keypad::new();
        keypad.press(0x10);
        assert_eq!(keypad, Keypad::new());
        assert!(!keypad.is_pressed(0xFF));
    }

    #[test]
    fn first_pressed_picks_lowest() {
        let keypad: Keypad = vec![0xC, 0x3, 0x9].into_iter().collect();
        assert_eq!(keypad.first_pressed(), Some(0x3));
        assert_eq!(Keypad::new().first_pressed(), None);
    }
}
