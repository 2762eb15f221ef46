//! A [`Panel`] that draws the grid into the log.
//!
//! The daemon has no overlay of its own; an external bar or notification
//! daemon can tail the log, and `RUST_LOG=gridtab=info` is enough to follow
//! a session from the terminal.

use crate::session::PanelView;
use crate::traits::Panel;
use log::info;
use std::fmt::Write;

/// Render `view` as text, one grid row per line.
///
/// The selected cell is bracketed; cells carrying a digit shortcut are
/// prefixed with it.
///
/// ```text
///  1 kitty  [2 firefox]  3 foot
///  4 steam
/// ```
pub fn render(view: &PanelView) -> String {
    let columns = view.columns.max(1);
    let mut out = String::new();
    for (row, chunk) in view.candidates.chunks(columns).enumerate() {
        if row > 0 {
            out.push('\n');
        }
        for (col, item) in chunk.iter().enumerate() {
            let index = row * columns + col;
            if col > 0 {
                out.push(' ');
            }
            let label = match view.badge(index) {
                Some(digit) => format!("{} {}", digit, item.name),
                None => item.name.clone(),
            };
            if index == view.selected {
                let _ = write!(out, "[{}]", label);
            } else {
                let _ = write!(out, " {} ", label);
            }
        }
    }
    out
}

/// Logs the grid on every change.
#[derive(Debug, Default)]
pub struct LogPanel {
    view: Option<PanelView>,
}

impl LogPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.view.is_some()
    }
}

impl Panel for LogPanel {
    fn show(&mut self, view: &PanelView) {
        info!("switcher:\n{}", render(view));
        self.view = Some(view.clone());
    }

    fn update_selection(&mut self, index: usize) {
        if let Some(view) = self.view.as_mut() {
            view.selected = index;
            info!("switcher:\n{}", render(view));
        }
    }

    fn dismiss(&mut self) {
        if self.view.take().is_some() {
            info!("switcher dismissed");
        }
    }
}
