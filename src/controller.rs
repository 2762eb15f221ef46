//! Executors for everything that must not run on the event path.
//!
//! * [`Controller`] drains the [`Intent`] channel, drives the [`Panel`] and
//!   the [`ProcessControl`] backend, and reports termination outcomes back
//!   to the session.
//! * [`Tracker`] drains [`AppEvent`]s, refreshes the router's item snapshot
//!   and persists the MRU order after activations.
//! * [`Supervisor`] reloads preferences on SIGHUP or when the config file
//!   changes, and closes the intent channel on SIGTERM/SIGINT so that
//!   [`Controller::run`] returns.
//!
//! Both only take the router lock for in-memory updates; IPC and file I/O
//! happen with the lock released.

use crate::config::{ConfigWatch, Preferences};
use crate::interceptor::{lock_router, SharedRouter};
use crate::item::{Pid, RunningItem};
use crate::session::Intent;
use crate::signals;
use crate::traits::{AppEvent, ItemProvider, Panel, ProcessControl, SettingsStore};
use log::{debug, error, info, warn};
use std::sync::mpsc;
use std::time::Duration;

/// Errors from executing an intent.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// The candidate could not be activated, typically because it exited
    /// after the session captured it.
    #[error("could not activate {name} (pid {pid}): {reason}")]
    ActivationFailed { name: String, pid: Pid, reason: String },
    #[error("could not terminate {name} (pid {pid}): {reason}")]
    TerminationFailed { name: String, pid: Pid, reason: String },
}

//  Intents

/// Applies [`Intent`]s to the outside world.
pub struct Controller<P: Panel, C: ProcessControl> {
    panel: P,
    control: C,
    router: SharedRouter,
}

impl<P: Panel, C: ProcessControl> Controller<P, C> {
    pub fn new(panel: P, control: C, router: SharedRouter) -> Self {
        Self {
            panel,
            control,
            router,
        }
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    /// Execute one intent.
    pub fn handle(&mut self, intent: Intent) -> Result<(), ControlError> {
        match intent {
            Intent::ShowPanel(view) => self.panel.show(&view),
            Intent::UpdateSelection(index) => self.panel.update_selection(index),
            Intent::DismissPanel => self.panel.dismiss(),
            Intent::ActivateItem(item) => {
                self.control
                    .activate(&item)
                    .map_err(|e| ControlError::ActivationFailed {
                        name: item.name.clone(),
                        pid: item.pid,
                        reason: e.to_string(),
                    })?;
                debug!("activated {} (pid {})", item.name, item.pid);
            }
            Intent::TerminateItem(item) => {
                let result = self.control.terminate(&item);
                lock_router(&self.router).termination_finished(item.pid, result.is_ok());
                result.map_err(|e| ControlError::TerminationFailed {
                    name: item.name.clone(),
                    pid: item.pid,
                    reason: e.to_string(),
                })?;
            }
        }
        Ok(())
    }

    /// Execute intents until every sender is gone.
    ///
    /// Failures are logged and never stop the loop.
    pub fn run(&mut self, intents: mpsc::Receiver<Intent>) {
        for intent in intents {
            if let Err(e) = self.handle(intent) {
                warn!("{}", e);
            }
        }
        info!("intent channel closed");
    }
}

//  Item tracking

/// Keeps the router's view of running items current.
pub struct Tracker<I: ItemProvider, S: SettingsStore> {
    provider: I,
    settings: S,
    router: SharedRouter,
}

impl<I: ItemProvider, S: SettingsStore> Tracker<I, S> {
    pub fn new(provider: I, settings: S, router: SharedRouter) -> Self {
        Self {
            provider,
            settings,
            router,
        }
    }

    /// Replace the router's snapshot with the provider's current one.
    ///
    /// Returns the active item, if any.
    pub fn refresh(&self) -> Option<RunningItem> {
        let items = match self.provider.running_items() {
            Ok(items) => items,
            Err(e) => {
                error!("failed to list running items: {}", e);
                return None;
            }
        };
        let active = self.provider.active_item().unwrap_or_else(|e| {
            warn!("failed to query active item: {}", e);
            None
        });
        debug!("{} running items", items.len());
        lock_router(&self.router).set_items(items, active.as_ref().map(|a| a.pid));
        active
    }

    /// Apply one notification.
    pub fn handle(&self, event: AppEvent) {
        let active = self.refresh();
        if event != AppEvent::Activated {
            return;
        }
        let Some(item) = active else {
            return;
        };
        let order = lock_router(&self.router).item_activated(&item);
        if let Err(e) = self.settings.write_user_order(order.keys()) {
            warn!("failed to persist MRU order: {}", e);
        }
    }

    /// Apply notifications until the sender is gone.
    pub fn run(&self, events: mpsc::Receiver<AppEvent>) {
        for event in events {
            self.handle(event);
        }
        info!("app event channel closed");
    }
}

//  Supervision

/// Reloads preferences and ends the daemon on request.
pub struct Supervisor<S: SettingsStore> {
    settings: S,
    watch: ConfigWatch,
    router: SharedRouter,
}

impl<S: SettingsStore> Supervisor<S> {
    pub fn new(settings: S, watch: ConfigWatch, router: SharedRouter) -> Self {
        Self {
            settings,
            watch,
            router,
        }
    }

    /// Re-read preferences and hand them to the router.
    pub fn reload_preferences(&self) {
        let prefs = Preferences::read(&self.settings);
        lock_router(&self.router).apply_preferences(prefs);
    }

    /// Reload if asked to or if the config file changed.
    ///
    /// Returns whether preferences were reloaded.
    pub fn poll(&mut self, reload_requested: bool) -> bool {
        let changed = self.watch.changed();
        if !reload_requested && !changed {
            return false;
        }
        info!("reloading preferences");
        self.reload_preferences();
        true
    }

    /// Close the intent channel; the controller loop ends once drained.
    pub fn shutdown(&self) {
        info!("shutting down");
        lock_router(&self.router).close_intents();
    }

    /// Poll every `interval` until a shutdown signal arrives.
    pub fn run(&mut self, interval: Duration) {
        while !signals::take_shutdown() {
            self.poll(signals::take_reload());
            std::thread::sleep(interval);
        }
        self.shutdown();
    }
}
