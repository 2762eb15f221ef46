//! Translates Hyprland window events into [`AppEvent`]s.
//!
//! Hyprland announces window lifecycle changes on its event socket
//! (`socket2`) in the `EVENT>>DATA\n` format:
//!
//! | Event            | Payload                          | Becomes                  |
//! |------------------|----------------------------------|--------------------------|
//! | `openwindow`     | `addr,workspace,class,title`     | [`AppEvent::Launched`]   |
//! | `closewindow`    | `addr`                           | [`AppEvent::Terminated`] |
//! | `activewindowv2` | `addr` (empty when none focused) | [`AppEvent::Activated`]  |
//!
//! Payloads are not interpreted; listeners re-query the
//! [`ItemProvider`](crate::traits::ItemProvider) for the current state.

use super::{socket_path, HyprlandError};
use crate::traits::{AppEvent, AppEventSource};
use log::{debug, error, info, warn};
use std::io::{BufRead, BufReader};
use std::os::unix::net::UnixStream;
use std::sync::mpsc;

/// An [`AppEventSource`] reading Hyprland's `socket2`.
#[derive(Debug, Default)]
pub struct HyprlandEventSource;

impl HyprlandEventSource {
    pub fn new() -> Self {
        Self
    }
}

/// Parse a single event line from socket2.
///
/// Lines have the form `EVENT>>DATA\n`.
fn parse_event_line(line: &str) -> Option<(&str, &str)> {
    let sep = line.find(">>")?;
    Some((&line[..sep], &line[sep + 2..]))
}

/// Map one socket2 line to the notification it represents, if any.
pub fn app_event(line: &str) -> Option<AppEvent> {
    let (event, data) = parse_event_line(line)?;
    match event {
        "openwindow" => Some(AppEvent::Launched),
        "closewindow" => Some(AppEvent::Terminated),
        // Focus moved to a layer or nothing at all.
        "activewindowv2" if data.trim().is_empty() || data.trim() == "," => None,
        "activewindowv2" => Some(AppEvent::Activated),
        _ => None,
    }
}

impl AppEventSource for HyprlandEventSource {
    type Error = HyprlandError;

    /// Connect to Hyprland's event socket and forward window events.
    ///
    /// This method **blocks** until the socket closes, an error occurs or
    /// the sink is dropped.  Run it on a dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<AppEvent>) -> Result<(), Self::Error> {
        let path = socket_path(".socket2.sock")?;
        let stream = UnixStream::connect(&path)
            .map_err(|e| HyprlandError(format!("connect to {}: {}", path.display(), e)))?;
        info!("event source connected to {}", path.display());

        for line in BufReader::new(stream).lines() {
            match line {
                Ok(line) if line.is_empty() => continue,
                Ok(line) => {
                    if let Some(event) = app_event(&line) {
                        debug!("{} -> {:?}", line, event);
                        if sink.send(event).is_err() {
                            info!("event sink closed, shutting down");
                            return Ok(());
                        }
                    }
                }
                Err(e) => {
                    error!("socket2 read error: {}", e);
                    return Err(HyprlandError(format!("read error: {}", e)));
                }
            }
        }

        warn!("socket2 stream ended");
        Ok(())
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_event_line_valid() {
        assert_eq!(
            parse_event_line("openwindow>>80a6f50,2,kitty,kitty"),
            Some(("openwindow", "80a6f50,2,kitty,kitty"))
        );
        assert_eq!(parse_event_line("closewindow>>80a6f50"), Some(("closewindow", "80a6f50")));
    }

    #[test]
    fn parse_event_line_no_separator() {
        assert_eq!(parse_event_line("garbage"), None);
    }

    #[test]
    fn window_events_map_to_app_events() {
        assert_eq!(app_event("openwindow>>1,1,foot,foot"), Some(AppEvent::Launched));
        assert_eq!(app_event("closewindow>>1"), Some(AppEvent::Terminated));
        assert_eq!(app_event("activewindowv2>>80a6f50"), Some(AppEvent::Activated));
    }

    #[test]
    fn empty_focus_is_ignored() {
        assert_eq!(app_event("activewindowv2>>"), None);
        assert_eq!(app_event("activewindowv2>>,"), None);
    }

    #[test]
    fn unknown_events_ignored() {
        assert_eq!(app_event("workspace>>2"), None);
        assert_eq!(app_event("activewindow>>kitty,~"), None);
        assert_eq!(app_event("swipebegin>>3"), None);
    }
}
