//! The event interceptor.
//!
//! [`Router`] is the synchronous heart of gridtab: every captured event goes
//! through [`Router::handle`], which classifies it, advances the session and
//! returns a [`Disposition`] before the next event is admitted.  Nothing on
//! that path blocks; side effects leave as [`Intent`](crate::session::Intent)s.
//!
//! [`Interceptor`] owns the capture lifecycle around a shared router:
//! permission check, backend installation, a watchdog that re-enables a
//! capture the platform switched off, and a [`stop`](Interceptor::stop)
//! that always returns the router to a clean idle state.

use crate::classifier::{classify, ClassifierContext, HeldModifiers};
use crate::config::Preferences;
use crate::event::{Disposition, RawEvent};
use crate::item::{Pid, RunningItem};
use crate::keymap::Keymap;
use crate::mru::MruOrder;
use crate::session::Switcher;
use crate::traits::{CaptureBackend, PermissionChecker, TapControl};
use log::{debug, info, warn};
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

/// Router shared between the capture thread and its collaborators.
pub type SharedRouter = Arc<Mutex<Router>>;

/// Lock `router`, recovering from a poisoned mutex.
///
/// A panic elsewhere must not wedge the global input pipeline.
pub fn lock_router(router: &SharedRouter) -> MutexGuard<'_, Router> {
    router.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Possible errors from the interceptor.
#[derive(Debug, thiserror::Error)]
pub enum InterceptorError {
    /// Input-monitoring permission has not been granted.
    #[error("input monitoring permission not granted")]
    PermissionDenied,
    /// The capture backend failed to install.
    #[error("capture backend error: {0}")]
    Backend(String),
}

//  Router

/// Modifier state, session and capture handle, mutated only from the event
/// path.
pub struct Router {
    held: HeldModifiers,
    keymap: Keymap,
    switcher: Switcher,
    tap: Option<Arc<dyn TapControl>>,
}

impl Router {
    /// Create an idle router.
    pub fn new(switcher: Switcher, keymap: Keymap) -> Self {
        Self {
            held: HeldModifiers::default(),
            keymap,
            switcher,
            tap: None,
        }
    }

    /// Wrap the router for sharing with a capture backend.
    pub fn shared(self) -> SharedRouter {
        Arc::new(Mutex::new(self))
    }

    /// Handle one captured event.
    ///
    /// A capture-disabled notification re-enables the capture and passes
    /// through without touching the session.
    pub fn handle(&mut self, event: RawEvent) -> Disposition {
        if event.is_tap_disabled() {
            warn!("capture disabled by the platform ({:?}), re-enabling", event);
            if let Some(tap) = &self.tap {
                tap.set_enabled(true);
            }
            return Disposition::PassThrough;
        }

        let ctx = ClassifierContext {
            held: self.held,
            session_active: self.switcher.is_active(),
            keymap: &self.keymap,
            digit_shortcuts: self.switcher.prefs().digit_shortcuts,
        };
        let classified = classify(&ctx, &event);
        self.held = classified.held;
        let disposition = classified.action.disposition();
        if disposition == Disposition::Consume {
            debug!("{:?} -> {:?}", event, classified.action);
        }
        self.switcher.apply(classified.action);
        disposition
    }

    /// Re-enable the capture if the platform turned it off.
    ///
    /// Returns whether it had to be re-enabled.
    pub fn reenable_if_needed(&self) -> bool {
        match &self.tap {
            Some(tap) if !tap.is_enabled() => {
                info!("capture found disabled, re-enabling");
                tap.set_enabled(true);
                true
            }
            _ => false,
        }
    }

    /// Modifier state as the classifier last saw it.
    pub fn held(&self) -> HeldModifiers {
        self.held
    }

    pub fn switcher(&self) -> &Switcher {
        &self.switcher
    }

    /// Replace preferences without restarting the capture.
    pub fn apply_preferences(&mut self, prefs: Preferences) {
        debug!("applying preferences: {:?}", prefs.session);
        self.keymap = prefs.keymap;
        self.switcher.set_prefs(prefs.session);
        self.switcher.catalog_mut().set_hidden(prefs.hidden);
    }

    /// Replace the running-item snapshot.  An active session keeps its list.
    pub fn set_items(&mut self, items: Vec<RunningItem>, active: Option<Pid>) {
        self.switcher.catalog_mut().set_items(items, active);
    }

    /// Record an activation and return the updated MRU order for persisting.
    pub fn item_activated(&mut self, item: &RunningItem) -> MruOrder {
        debug!("activated: {} (pid {})", item.name, item.pid);
        self.switcher.catalog_mut().activated(item);
        self.switcher.catalog().order().clone()
    }

    /// Pointer moved over the cell at `index`.
    pub fn panel_hover(&mut self, index: usize) {
        self.switcher.select_index(index);
    }

    /// Pointer clicked the cell at `index`.
    pub fn panel_click(&mut self, index: usize) {
        self.switcher.activate_index(index);
    }

    /// Outcome of a termination request.
    pub fn termination_finished(&mut self, pid: Pid, succeeded: bool) {
        self.switcher.termination_finished(pid, succeeded);
    }

    /// Close the intent channel so the controller loop can finish.
    pub fn close_intents(&mut self) {
        self.switcher.close_intents();
    }

    fn attach_tap(&mut self, tap: Arc<dyn TapControl>) {
        self.tap = Some(tap);
    }

    /// Drop the capture handle and return to idle.
    fn reset(&mut self) {
        self.tap = None;
        self.held = HeldModifiers::default();
        self.switcher.stop();
    }
}

//  Interceptor

/// Background thread that periodically re-enables the capture.
struct Watchdog {
    stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl Watchdog {
    fn spawn(router: SharedRouter, interval: Duration) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = std::thread::spawn(move || loop {
            match stop_rx.recv_timeout(interval) {
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    lock_router(&router).reenable_if_needed();
                }
                _ => break,
            }
        });
        Self { stop_tx, handle }
    }

    fn stop(self) {
        drop(self.stop_tx);
        let _ = self.handle.join();
    }
}

/// Owns the capture lifecycle.
pub struct Interceptor<B: CaptureBackend, P: PermissionChecker> {
    backend: B,
    permissions: P,
    router: SharedRouter,
    watchdog_interval: Duration,
    watchdog: Option<Watchdog>,
    running: bool,
}

impl<B: CaptureBackend, P: PermissionChecker> Interceptor<B, P> {
    /// Create a stopped interceptor.
    pub fn new(backend: B, permissions: P, router: SharedRouter, watchdog_interval: Duration) -> Self {
        Self {
            backend,
            permissions,
            router,
            watchdog_interval,
            watchdog: None,
            running: false,
        }
    }

    /// The router events are delivered to.
    pub fn router(&self) -> SharedRouter {
        Arc::clone(&self.router)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Ask for input-monitoring permission.  Returns whether it is granted.
    pub fn request_permission(&self) -> bool {
        self.permissions.request_input_permission()
    }

    /// Install the capture and start the watchdog.
    ///
    /// Fails with [`InterceptorError::PermissionDenied`] when permission is
    /// missing; asking for it is up to the caller.
    pub fn start(&mut self) -> Result<(), InterceptorError> {
        if self.running {
            debug!("interceptor already running");
            return Ok(());
        }
        if !self.permissions.has_input_permission() {
            warn!("input monitoring permission missing, capture not started");
            return Err(InterceptorError::PermissionDenied);
        }
        let tap = self
            .backend
            .install(Arc::clone(&self.router))
            .map_err(|e| InterceptorError::Backend(e.to_string()))?;
        tap.set_enabled(true);
        lock_router(&self.router).attach_tap(tap);
        self.watchdog = Some(Watchdog::spawn(
            Arc::clone(&self.router),
            self.watchdog_interval,
        ));
        self.running = true;
        info!("capture started");
        Ok(())
    }

    /// Release the capture and reset all interception state.
    ///
    /// Safe to call at any time, including mid-session and when stopped.
    pub fn stop(&mut self) {
        if let Some(watchdog) = self.watchdog.take() {
            watchdog.stop();
        }
        self.backend.uninstall();
        lock_router(&self.router).reset();
        if self.running {
            info!("capture stopped");
        }
        self.running = false;
    }

    /// Re-enable the capture if the platform turned it off.
    pub fn reenable_if_needed(&self) -> bool {
        lock_router(&self.router).reenable_if_needed()
    }
}

impl<B: CaptureBackend, P: PermissionChecker> Drop for Interceptor<B, P> {
    fn drop(&mut self) {
        if self.running {
            self.stop();
        }
    }
}

//  Tests
