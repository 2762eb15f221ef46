//! [`ItemProvider`] and [`ProcessControl`] backed by Hyprland IPC.
//!
//! Communicates directly with Hyprland through its command socket at
//! `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/.socket.sock`,
//! avoiding any shell command invocation.
//!
//! A switchable item is a process owning at least one mapped, visible
//! client.  Activation focuses the process's window.  Termination sends the
//! process SIGTERM rather than closing a window, so an application with
//! several windows quits as a whole.  Success means the request was
//! delivered; the process may still be shutting down.

use super::{socket_path, HyprlandError};
use crate::item::{Pid, RunningItem};
use crate::traits::{ItemProvider, ProcessControl};
use log::debug;
use serde::Deserialize;
use std::collections::HashSet;
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;

/// Hyprland-backed item provider and process control.
///
/// No connection is opened eagerly; each method call opens a short-lived
/// IPC request.
#[derive(Debug, Default)]
pub struct HyprlandClients;

impl HyprlandClients {
    pub fn new() -> Self {
        Self
    }
}

//  Direct Hyprland IPC helpers

/// Send a raw command to the Hyprland command socket and return the
/// response as a string.
fn ipc_request(command: &str) -> Result<String, HyprlandError> {
    let path = socket_path(".socket.sock")?;
    let mut stream = UnixStream::connect(&path)
        .map_err(|e| HyprlandError(format!("connect to {}: {}", path.display(), e)))?;

    stream
        .write_all(command.as_bytes())
        .map_err(|e| HyprlandError(format!("write: {}", e)))?;

    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .map_err(|e| HyprlandError(format!("read: {}", e)))?;

    String::from_utf8(response).map_err(|e| HyprlandError(format!("utf-8: {}", e)))
}

/// Send a JSON data query (`j/<command>`) and return the raw JSON string.
fn ipc_json(data_command: &str) -> Result<String, HyprlandError> {
    ipc_request(&format!("j/{}", data_command))
}

/// Send a dispatch command and check for `"ok"`.
fn ipc_dispatch(args: &str) -> Result<(), HyprlandError> {
    debug!("dispatch {}", args);
    let response = ipc_request(&format!("/dispatch {}", args))?;
    if response.trim() == "ok" {
        Ok(())
    } else {
        Err(HyprlandError(format!("dispatch error: {}", response)))
    }
}

//  Minimal serde structs for the JSON we care about

/// Subset of a client object returned by `j/clients` and `j/activewindow`.
#[derive(Deserialize)]
struct ClientJson {
    pid: Pid,
    #[serde(default)]
    class: String,
    #[serde(default, rename = "initialTitle")]
    initial_title: String,
    #[serde(default = "yes")]
    mapped: bool,
    #[serde(default)]
    hidden: bool,
}

fn yes() -> bool {
    true
}

impl ClientJson {
    fn is_switchable(&self) -> bool {
        self.pid > 0 && self.mapped && !self.hidden
    }

    fn into_item(self) -> RunningItem {
        let name = if self.initial_title.is_empty() {
            self.class.clone()
        } else {
            self.initial_title
        };
        let bundle = (!self.class.is_empty()).then_some(self.class.as_str());
        RunningItem::new(self.pid, name, bundle)
    }
}

/// Parse a `j/clients` response into one item per process.
///
/// The first listed client of a process names the item.  The result is
/// sorted by name so snapshots are stable across queries.
pub fn parse_clients(json: &str) -> Result<Vec<RunningItem>, HyprlandError> {
    let clients: Vec<ClientJson> =
        serde_json::from_str(json).map_err(|e| HyprlandError(format!("parse: {}", e)))?;
    let mut seen = HashSet::new();
    let mut items: Vec<RunningItem> = clients
        .into_iter()
        .filter(ClientJson::is_switchable)
        .filter(|c| seen.insert(c.pid))
        .map(ClientJson::into_item)
        .collect();
    items.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.pid.cmp(&b.pid))
    });
    Ok(items)
}

/// Parse a `j/activewindow` response.
pub fn parse_active_window(json: &str) -> Result<Option<RunningItem>, HyprlandError> {
    // Hyprland returns an empty object `{}` when no window is focused.
    if json.trim() == "{}" {
        return Ok(None);
    }
    let client: ClientJson =
        serde_json::from_str(json).map_err(|e| HyprlandError(format!("parse: {}", e)))?;
    Ok(client.is_switchable().then(|| client.into_item()))
}

//  Trait implementations

impl ItemProvider for HyprlandClients {
    type Error = HyprlandError;

    fn running_items(&self) -> Result<Vec<RunningItem>, Self::Error> {
        parse_clients(&ipc_json("clients")?)
    }

    fn active_item(&self) -> Result<Option<RunningItem>, Self::Error> {
        parse_active_window(&ipc_json("activewindow")?)
    }
}

impl ProcessControl for HyprlandClients {
    type Error = HyprlandError;

    fn activate(&self, item: &RunningItem) -> Result<(), Self::Error> {
        ipc_dispatch(&format!("focuswindow pid:{}", item.pid))
    }

    fn terminate(&self, item: &RunningItem) -> Result<(), Self::Error> {
        request_quit(item.pid)
    }
}

/// Send SIGTERM to `pid`.
fn request_quit(pid: Pid) -> Result<(), HyprlandError> {
    // 0 and negative pids address process groups.
    if pid <= 0 {
        return Err(HyprlandError(format!("refusing to signal pid {}", pid)));
    }
    // SAFETY: kill has no memory-safety preconditions.
    if unsafe { libc::kill(pid, libc::SIGTERM) } != 0 {
        let err = std::io::Error::last_os_error();
        return Err(HyprlandError(format!("SIGTERM to pid {}: {}", pid, err)));
    }
    debug!("sent SIGTERM to pid {}", pid);
    Ok(())
}
