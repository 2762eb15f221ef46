//! Keycode to key-role mapping.
//!
//! Raw key-down events carry a platform keycode.  The classifier only cares
//! about which *role* a key plays, so the [`Keymap`] resolves every keycode
//! to exactly one [`KeyRole`] through a fixed seventeen-entry table.  Keycodes
//! outside the table have no role.
//!
//! The defaults are Linux evdev keycodes (`linux/input-event-codes.h`).
//!
//! # Example
//!
//! ```json
//! {
//!   "keys": { "advance": 15, "quit": 16, "digits": [11, 2, 3, 4, 5, 6, 7, 8, 9, 10] }
//! }
//! ```

use crate::item::Direction;
use serde::{Deserialize, Serialize};

/// Raw platform keycode.
pub type Keycode = u16;

/// What a key does while the switcher is listening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    /// Starts a session, then cycles the selection.
    Advance,
    /// Quits the selected item.
    Quit,
    /// Cancels the session.
    Escape,
    /// Moves the selection on the grid.
    Arrow(Direction),
    /// Direct selection; the digit as printed on the key (`0..=9`).
    Digit(u8),
}

/// Keycodes for every role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Keymap {
    pub advance: Keycode,
    pub quit: Keycode,
    pub escape: Keycode,
    pub up: Keycode,
    pub down: Keycode,
    pub left: Keycode,
    pub right: Keycode,
    /// Keycodes of digits `0` through `9`, indexed by digit.
    pub digits: [Keycode; 10],
}

impl Default for Keymap {
    fn default() -> Self {
        Self {
            advance: 15,
            quit: 16,
            escape: 1,
            up: 103,
            down: 108,
            left: 105,
            right: 106,
            digits: [11, 2, 3, 4, 5, 6, 7, 8, 9, 10],
        }
    }
}

impl Keymap {
    /// The full mapping table.
    pub fn table(&self) -> [(Keycode, KeyRole); 17] {
        let d = &self.digits;
        [
            (self.advance, KeyRole::Advance),
            (self.quit, KeyRole::Quit),
            (self.escape, KeyRole::Escape),
            (self.up, KeyRole::Arrow(Direction::Up)),
            (self.down, KeyRole::Arrow(Direction::Down)),
            (self.left, KeyRole::Arrow(Direction::Left)),
            (self.right, KeyRole::Arrow(Direction::Right)),
            (d[0], KeyRole::Digit(0)),
            (d[1], KeyRole::Digit(1)),
            (d[2], KeyRole::Digit(2)),
            (d[3], KeyRole::Digit(3)),
            (d[4], KeyRole::Digit(4)),
            (d[5], KeyRole::Digit(5)),
            (d[6], KeyRole::Digit(6)),
            (d[7], KeyRole::Digit(7)),
            (d[8], KeyRole::Digit(8)),
            (d[9], KeyRole::Digit(9)),
        ]
    }

    /// Resolve `keycode` to its role.  The first matching entry wins.
    pub fn role(&self, keycode: Keycode) -> Option<KeyRole> {
        self.table()
            .into_iter()
            .find(|(code, _)| *code == keycode)
            .map(|(_, role)| role)
    }
}

/// Candidate index selected by a digit key: `1..=9` → `0..=8`, `0` → `9`.
pub fn digit_index(digit: u8) -> usize {
    if digit == 0 {
        9
    } else {
        usize::from(digit) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_roles() {
        let k = Keymap::default();
        assert_eq!(k.role(15), Some(KeyRole::Advance));
        assert_eq!(k.role(16), Some(KeyRole::Quit));
        assert_eq!(k.role(1), Some(KeyRole::Escape));
        assert_eq!(k.role(103), Some(KeyRole::Arrow(Direction::Up)));
        assert_eq!(k.role(106), Some(KeyRole::Arrow(Direction::Right)));
        assert_eq!(k.role(2), Some(KeyRole::Digit(1)));
        assert_eq!(k.role(10), Some(KeyRole::Digit(9)));
        assert_eq!(k.role(11), Some(KeyRole::Digit(0)));
    }

    #[test]
    fn unknown_keycode_has_no_role() {
        assert_eq!(Keymap::default().role(30), None);
        assert_eq!(Keymap::default().role(u16::MAX), None);
    }

    #[test]
    fn every_default_keycode_is_distinct() {
        let table = Keymap::default().table();
        let mut codes: Vec<Keycode> = table.iter().map(|(c, _)| *c).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), table.len());
    }

    #[test]
    fn digit_index_mapping() {
        assert_eq!(digit_index(1), 0);
        assert_eq!(digit_index(9), 8);
        assert_eq!(digit_index(0), 9);
    }

    #[test]
    fn partial_keymap_uses_defaults() {
        let k: Keymap = serde_json::from_str(r#"{ "advance": 48, "quit": 12 }"#).unwrap();
        assert_eq!(k.role(48), Some(KeyRole::Advance));
        assert_eq!(k.role(12), Some(KeyRole::Quit));
        assert_eq!(k.escape, Keymap::default().escape);
    }
}
