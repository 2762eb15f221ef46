//! Raw input events and the interceptor's verdict on them.
//!
//! A capture backend translates whatever its platform delivers into a
//! [`RawEvent`] and answers with the [`Disposition`] it gets back.  Both
//! types are serde-enabled because the socket backend exchanges them as
//! JSON lines.

use crate::keymap::Keycode;
use serde::{Deserialize, Serialize};

/// Modifier state carried by a modifier-change event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierFlags {
    /// The switcher's primary modifier (e.g. Super / Cmd).
    #[serde(default)]
    pub primary: bool,
    /// The reversing modifier (e.g. Shift).
    #[serde(default)]
    pub secondary: bool,
}

/// One low-level input event, in system arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawEvent {
    /// Modifier keys changed; carries the full modifier state after the change.
    FlagsChanged(ModifierFlags),
    /// A key went down.
    KeyDown { keycode: Keycode },
    /// The platform disabled the capture because a callback took too long.
    TapDisabledByTimeout,
    /// The platform disabled the capture for a policy reason.
    TapDisabledByUserInput,
    /// Any other event kind; always passed through.
    Other,
}

impl RawEvent {
    /// Whether this is a capture-disabled notification.
    pub fn is_tap_disabled(&self) -> bool {
        matches!(
            self,
            RawEvent::TapDisabledByTimeout | RawEvent::TapDisabledByUserInput
        )
    }
}

/// What happens to an event after it has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Disposition {
    /// Swallow the event; nothing downstream sees it.
    Consume,
    /// Forward the event unchanged.
    PassThrough,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format() {
        let e: RawEvent = serde_json::from_str(r#"{"KeyDown":{"keycode":15}}"#).unwrap();
        assert_eq!(e, RawEvent::KeyDown { keycode: 15 });
        let e: RawEvent = serde_json::from_str(r#"{"FlagsChanged":{"primary":true}}"#).unwrap();
        assert_eq!(
            e,
            RawEvent::FlagsChanged(ModifierFlags {
                primary: true,
                secondary: false
            })
        );
        let e: RawEvent = serde_json::from_str(r#""TapDisabledByTimeout""#).unwrap();
        assert!(e.is_tap_disabled());
        assert_eq!(
            serde_json::to_string(&Disposition::PassThrough).unwrap(),
            r#""PassThrough""#
        );
    }
}
