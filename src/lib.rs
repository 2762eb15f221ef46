//! **gridtab**: a grid-based application switcher.
//!
//! Hold the primary modifier and press the advance key to open a grid of
//! running applications, ordered by how recently each was used.  Keep
//! tapping to cycle, use the arrows to move on the grid, press a digit to
//! jump, press the quit key to close the selected application, and release
//! the modifier to switch.
//!
//! # Architecture
//!
//! Every captured input event goes through
//! [`interceptor::Router::handle`], which must answer *consume* or *pass
//! through* before the next event is delivered.  That path is pure
//! in-memory work:
//!
//! 1. [`classifier`] turns the event into a semantic action,
//! 2. [`session`] advances the switch-session state machine,
//! 3. visible consequences leave as [`session::Intent`]s over a channel.
//!
//! The crate is organised around the traits in [`traits`]:
//!
//! * [`traits::CaptureBackend`] abstracts the system-wide event capture
//!   (a Unix socket fed by an input helper, see [`ipc`]).
//! * [`traits::ItemProvider`], [`traits::ProcessControl`] and
//!   [`traits::AppEventSource`] abstract the window manager
//!   (see [`hyprland`]).
//! * [`traits::Panel`] and [`traits::SettingsStore`] abstract the UI and
//!   persistence.
//!
//! [`controller`] runs intents, item tracking and configuration reloads off
//! the event path; [`signals`] turns SIGTERM/SIGINT into a clean shutdown
//! and SIGHUP into a reload.

pub mod candidates;
pub mod classifier;
pub mod config;
pub mod controller;
pub mod event;
pub mod grid;
pub mod hyprland;
pub mod interceptor;
pub mod ipc;
pub mod item;
pub mod keymap;
pub mod mru;
pub mod panel;
pub mod session;
pub mod signals;
pub mod traits;
