//! The switch-session state machine.
//!
//! [`Switcher`] is either *idle* (no session) or *active* (one [`Session`]
//! holding a candidate list and a selected index).  It consumes classified
//! [`Action`]s and describes every visible consequence as an [`Intent`]
//! sent over an [`mpsc`](std::sync::mpsc) channel.  The switcher never
//! waits on the receiver; panel updates, activation and termination run on
//! whatever thread owns the other end.
//!
//! | State  | Action                  | Next   | Intents                         |
//! |--------|-------------------------|--------|---------------------------------|
//! | Idle   | `SessionStartRequested` | Active | `ShowPanel`                     |
//! | Active | `AdvanceNext/Previous`  | Active | `UpdateSelection`               |
//! | Active | `Move(dir)`             | Active | `UpdateSelection` (if moved)    |
//! | Active | `SelectByDigit(i)`      | Idle   | `ActivateItem`, `DismissPanel`  |
//! | Active | `QuitSelectedRequested` | Active | `TerminateItem`                 |
//! | Active | `CommitRequested`       | Idle   | `ActivateItem`, `DismissPanel`  |
//! | Active | `CancelRequested`       | Idle   | `DismissPanel`                  |
//! | any    | stop                    | Idle   | `DismissPanel` if it was active |
//!
//! Every other pair leaves the state unchanged.

use crate::candidates::Catalog;
use crate::classifier::Action;
use crate::grid::GridNav;
use crate::item::{Pid, RunningItem};
use log::{debug, warn};
use std::sync::mpsc;

/// Everything the panel needs to draw a session.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelView {
    pub candidates: Vec<RunningItem>,
    pub selected: usize,
    /// Cells per row.
    pub columns: usize,
    /// Whether digit badges are drawn on the first ten cells.
    pub digit_shortcuts: bool,
}

impl PanelView {
    /// Digit printed on the cell at `index`: `1..=9` then `0`.
    pub fn badge(&self, index: usize) -> Option<u8> {
        if self.digit_shortcuts && index < 10 {
            u8::try_from((index + 1) % 10).ok()
        } else {
            None
        }
    }
}

/// Side effects requested by the switcher.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Show (or rebuild) the panel.
    ShowPanel(PanelView),
    /// Highlight a different cell.
    UpdateSelection(usize),
    /// Hide the panel.
    DismissPanel,
    /// Bring the item to the foreground.
    ActivateItem(RunningItem),
    /// Ask the item to quit.  The outcome is reported back through
    /// [`Switcher::termination_finished`].
    TerminateItem(RunningItem),
}

/// Session-related preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPrefs {
    pub max_columns: usize,
    pub digit_shortcuts: bool,
}

impl Default for SessionPrefs {
    fn default() -> Self {
        Self {
            max_columns: 8,
            digit_shortcuts: true,
        }
    }
}

/// One interactive pick, from trigger to commit or cancel.
#[derive(Debug, Clone)]
pub struct Session {
    candidates: Vec<RunningItem>,
    selected: usize,
    grid: GridNav,
}

impl Session {
    /// Start a session over `candidates`.  Returns `None` for an empty list.
    ///
    /// The initial selection is the second entry (the previously active
    /// item) when there is one.
    fn start(candidates: Vec<RunningItem>, max_columns: usize) -> Option<Self> {
        if candidates.is_empty() {
            return None;
        }
        let selected = (candidates.len() - 1).min(1);
        let grid = GridNav::new(candidates.len(), max_columns);
        Some(Self {
            candidates,
            selected,
            grid,
        })
    }

    pub fn candidates(&self) -> &[RunningItem] {
        &self.candidates
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_item(&self) -> Option<&RunningItem> {
        self.candidates.get(self.selected)
    }

    /// Remove the item with `pid`.  Returns `false` if it was not listed.
    fn remove(&mut self, pid: Pid, max_columns: usize) -> bool {
        let Some(pos) = self.candidates.iter().position(|c| c.pid == pid) else {
            return false;
        };
        self.candidates.remove(pos);
        self.grid = GridNav::new(self.candidates.len(), max_columns);
        self.selected = self.selected.min(self.candidates.len().saturating_sub(1));
        true
    }
}

fn panel_view(session: &Session, prefs: SessionPrefs) -> PanelView {
    PanelView {
        candidates: session.candidates.clone(),
        selected: session.selected,
        columns: session.grid.columns(),
        digit_shortcuts: prefs.digit_shortcuts,
    }
}

/// Owns the session lifecycle.
pub struct Switcher {
    catalog: Catalog,
    prefs: SessionPrefs,
    session: Option<Session>,
    intents: Option<mpsc::Sender<Intent>>,
}

impl Switcher {
    /// Create an idle switcher.
    pub fn new(catalog: Catalog, prefs: SessionPrefs) -> Self {
        Self {
            catalog,
            prefs,
            session: None,
            intents: None,
        }
    }

    /// Attach the channel intents are sent over.
    pub fn set_intent_sink(&mut self, tx: mpsc::Sender<Intent>) {
        self.intents = Some(tx);
    }

    /// Drop the intent channel so its receiver sees the end of the stream.
    pub fn close_intents(&mut self) {
        self.intents = None;
    }

    pub fn set_prefs(&mut self, prefs: SessionPrefs) {
        self.prefs = prefs;
    }

    pub fn prefs(&self) -> SessionPrefs {
        self.prefs
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Feed one classified action into the state machine.
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::NoAction => {}

            Action::SessionStartRequested => {
                if self.session.is_some() {
                    debug!("session already active");
                    return;
                }
                match Session::start(self.catalog.candidates(), self.prefs.max_columns) {
                    Some(session) => {
                        debug!(
                            "session start: {} candidates, selected {}",
                            session.candidates.len(),
                            session.selected
                        );
                        let view = panel_view(&session, self.prefs);
                        self.session = Some(session);
                        self.emit(Intent::ShowPanel(view));
                    }
                    None => debug!("no candidates, staying idle"),
                }
            }

            Action::AdvanceNext => self.reselect(|s| Some(s.grid.next(s.selected))),

            Action::AdvancePrevious => self.reselect(|s| Some(s.grid.previous(s.selected))),

            Action::Move(dir) => self.reselect(|s| s.grid.go(s.selected, dir)),

            Action::SelectByDigit(index) => {
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                if index < session.candidates.len() {
                    session.selected = index;
                    self.commit();
                } else {
                    debug!(
                        "digit index {} out of range ({} candidates)",
                        index,
                        session.candidates.len()
                    );
                }
            }

            Action::QuitSelectedRequested => {
                if let Some(item) = self.session.as_ref().and_then(|s| s.selected_item()) {
                    debug!("quit requested for {} (pid {})", item.name, item.pid);
                    let item = item.clone();
                    self.emit(Intent::TerminateItem(item));
                }
            }

            Action::CommitRequested => self.commit(),

            Action::CancelRequested => {
                if self.session.take().is_some() {
                    debug!("session cancelled");
                    self.emit(Intent::DismissPanel);
                }
            }
        }
    }

    /// Tear down any session without activating anything.
    pub fn stop(&mut self) {
        if self.session.take().is_some() {
            debug!("session torn down");
            self.emit(Intent::DismissPanel);
        }
    }

    /// Select `index` directly (pointer hover).  Returns whether the
    /// selection changed.
    pub fn select_index(&mut self, index: usize) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if index >= session.candidates.len() || index == session.selected {
            return false;
        }
        session.selected = index;
        self.emit(Intent::UpdateSelection(index));
        true
    }

    /// Select `index` and commit (pointer click).
    pub fn activate_index(&mut self, index: usize) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if index < session.candidates.len() {
            session.selected = index;
            self.commit();
        }
    }

    /// Outcome of an earlier [`Intent::TerminateItem`].
    ///
    /// On success the item leaves the candidate list; an emptied list ends
    /// the session.  On failure nothing changes.
    pub fn termination_finished(&mut self, pid: Pid, succeeded: bool) {
        if !succeeded {
            warn!("pid {} did not quit; keeping it listed", pid);
            return;
        }
        let max_columns = self.prefs.max_columns;
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.remove(pid, max_columns) {
            return;
        }
        if session.candidates.is_empty() {
            debug!("last candidate quit, ending session");
            self.session = None;
            self.emit(Intent::DismissPanel);
        } else {
            let view = panel_view(session, self.prefs);
            self.emit(Intent::ShowPanel(view));
        }
    }

    //  Internal

    /// Move the selection to whatever `pick` returns, if anything.
    fn reselect(&mut self, pick: impl FnOnce(&Session) -> Option<usize>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match pick(session) {
            Some(index) if index != session.selected => {
                debug!("select {} -> {}", session.selected, index);
                session.selected = index;
                self.emit(Intent::UpdateSelection(index));
            }
            Some(_) => {}
            None => debug!("move out of bounds, ignored"),
        }
    }

    fn commit(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        if let Some(item) = session.candidates.into_iter().nth(session.selected) {
            debug!("commit: {} (pid {})", item.name, item.pid);
            self.emit(Intent::ActivateItem(item));
        }
        self.emit(Intent::DismissPanel);
    }

    fn emit(&self, intent: Intent) {
        if let Some(tx) = &self.intents {
            let _ = tx.send(intent);
        }
    }
}

//  Tests
