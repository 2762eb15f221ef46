//! Event classification.
//!
//! [`classify`] is a pure function from the current modifier/session state
//! and one [`RawEvent`] to a semantic [`Action`] plus the updated modifier
//! state.  It never touches the session itself; the
//! [`Router`](crate::interceptor::Router) feeds the action to the
//! [`Switcher`](crate::session::Switcher).
//!
//! Every key the switcher reacts to is swallowed so the platform's own
//! handling of the same shortcut never runs.  Only [`Action::NoAction`]
//! lets an event through.

use crate::event::{Disposition, RawEvent};
use crate::item::Direction;
use crate::keymap::{digit_index, KeyRole, Keymap};

/// Which modifiers the classifier believes are held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeldModifiers {
    pub primary: bool,
    pub secondary: bool,
}

/// Semantic action derived from one raw event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    NoAction,
    SessionStartRequested,
    AdvanceNext,
    AdvancePrevious,
    Move(Direction),
    /// Select the candidate at this index and commit.
    SelectByDigit(usize),
    QuitSelectedRequested,
    CommitRequested,
    CancelRequested,
}

impl Action {
    /// Whether the triggering event is swallowed.
    pub fn disposition(&self) -> Disposition {
        match self {
            Action::NoAction => Disposition::PassThrough,
            _ => Disposition::Consume,
        }
    }
}

/// Inputs the classifier needs besides the event.
#[derive(Debug, Clone, Copy)]
pub struct ClassifierContext<'a> {
    pub held: HeldModifiers,
    pub session_active: bool,
    pub keymap: &'a Keymap,
    pub digit_shortcuts: bool,
}

/// Result of classifying one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classified {
    pub action: Action,
    pub held: HeldModifiers,
}

/// Classify `event` against the current state.
pub fn classify(ctx: &ClassifierContext<'_>, event: &RawEvent) -> Classified {
    let mut held = ctx.held;
    let action = match *event {
        RawEvent::FlagsChanged(flags) => {
            held.secondary = flags.secondary;
            if flags.primary && !held.primary {
                held.primary = true;
                Action::NoAction
            } else if !flags.primary && held.primary {
                held.primary = false;
                if ctx.session_active {
                    Action::CommitRequested
                } else {
                    Action::NoAction
                }
            } else {
                Action::NoAction
            }
        }
        RawEvent::KeyDown { keycode } => classify_key(ctx, ctx.keymap.role(keycode)),
        RawEvent::TapDisabledByTimeout | RawEvent::TapDisabledByUserInput | RawEvent::Other => {
            Action::NoAction
        }
    };
    Classified { action, held }
}

fn classify_key(ctx: &ClassifierContext<'_>, role: Option<KeyRole>) -> Action {
    let active = ctx.session_active;
    match role {
        Some(KeyRole::Advance) if ctx.held.primary => {
            if !active {
                Action::SessionStartRequested
            } else if ctx.held.secondary {
                Action::AdvancePrevious
            } else {
                Action::AdvanceNext
            }
        }
        Some(KeyRole::Escape) if active => Action::CancelRequested,
        Some(KeyRole::Arrow(dir)) if active => Action::Move(dir),
        Some(KeyRole::Digit(d)) if active && ctx.digit_shortcuts => {
            Action::SelectByDigit(digit_index(d))
        }
        Some(KeyRole::Quit) if active => Action::QuitSelectedRequested,
        _ => Action::NoAction,
    }
}
