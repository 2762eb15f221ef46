//! Traits that decouple gridtab from any specific platform.
//!
//! Every concrete backend (the Unix-socket capture, Hyprland IPC, a test
//! harness, …) implements one of these traits.  The
//! [`Router`](crate::interceptor::Router) and
//! [`Switcher`](crate::session::Switcher) only depend on these
//! abstractions.

use crate::interceptor::SharedRouter;
use crate::item::{MruKey, RunningItem};
use crate::keymap::Keymap;
use crate::session::PanelView;
use std::collections::HashSet;
use std::sync::{mpsc, Arc};

//  Capture

/// Handle to an installed capture that can be switched on and off.
///
/// The platform may disable a capture on its own (for example when a
/// callback is too slow).  The interceptor turns it back on through this
/// handle.
pub trait TapControl: Send + Sync {
    fn is_enabled(&self) -> bool;
    fn set_enabled(&self, enabled: bool);
}

/// A system-wide capture of key-down and modifier-change events.
///
/// # Contract
///
/// * [`install`](CaptureBackend::install) registers the capture at the
///   earliest point of the dispatch chain and delivers every event to
///   [`Router::handle`](crate::interceptor::Router::handle), in arrival
///   order, applying the returned disposition before the next event.
/// * While the capture is disabled, events bypass the router untouched;
///   only capture-disabled notifications are still delivered.
/// * [`uninstall`](CaptureBackend::uninstall) releases every resource the
///   capture holds and is a no-op when nothing is installed.
pub trait CaptureBackend: Send {
    /// The error type produced by this backend.
    type Error: std::error::Error + Send + 'static;

    /// Create the capture and start delivering events to `router`.
    fn install(&mut self, router: SharedRouter) -> Result<Arc<dyn TapControl>, Self::Error>;

    /// Tear the capture down.
    fn uninstall(&mut self);
}

/// Access to the permission the capture needs.
pub trait PermissionChecker {
    /// Whether capture may be started.
    fn has_input_permission(&self) -> bool;

    /// Ask for the permission once.  Returns whether it is now granted.
    fn request_input_permission(&self) -> bool;
}

//  Running items

/// Snapshot access to running applications.
pub trait ItemProvider {
    /// The error type produced by this provider.
    type Error: std::error::Error + Send + 'static;

    /// Every switchable item that is currently running.
    fn running_items(&self) -> Result<Vec<RunningItem>, Self::Error>;

    /// The item currently in the foreground, if any.
    fn active_item(&self) -> Result<Option<RunningItem>, Self::Error>;
}

/// Change notifications about running items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    Launched,
    Terminated,
    Activated,
}

/// A source of [`AppEvent`]s.
///
/// [`run`](AppEventSource::run) **blocks** until the source is exhausted or
/// fails; run it on its own thread.
pub trait AppEventSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every notification into `sink`.
    fn run(&mut self, sink: mpsc::Sender<AppEvent>) -> Result<(), Self::Error>;
}

//  Settings

/// User preferences and persisted switcher state.
///
/// Reads never fail: a store that cannot read falls back to defaults.
pub trait SettingsStore {
    /// The error type produced when persisting.
    type Error: std::error::Error + Send + 'static;

    /// Persisted MRU order, most recent first.
    fn read_user_order(&self) -> Vec<MruKey>;

    /// Persist the MRU order.
    fn write_user_order(&self, order: &[MruKey]) -> Result<(), Self::Error>;

    /// MRU keys excluded from candidate lists.
    fn read_hidden_set(&self) -> HashSet<MruKey>;

    /// Maximum number of cells per grid row.
    fn read_grid_columns(&self) -> usize;

    /// Whether digit keys select candidates directly.
    fn read_digit_shortcuts_enabled(&self) -> bool;

    /// Keycodes for the switcher's keys.
    fn read_keymap(&self) -> Keymap;
}

//  Outputs

/// The visible grid panel.
pub trait Panel {
    /// Show the panel, or rebuild it if it is already visible.
    fn show(&mut self, view: &PanelView);

    /// Highlight the cell at `index`.
    fn update_selection(&mut self, index: usize);

    /// Hide the panel.
    fn dismiss(&mut self);
}

/// Activation and termination of running items.
pub trait ProcessControl {
    /// The error type produced by this backend.
    type Error: std::error::Error + Send + 'static;

    /// Bring `item` to the foreground.
    fn activate(&self, item: &RunningItem) -> Result<(), Self::Error>;

    /// Ask `item` to quit.
    fn terminate(&self, item: &RunningItem) -> Result<(), Self::Error>;
}
