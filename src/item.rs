//! Items and types used throughout gridtab.
//!
//! This module defines the vocabulary that all components share:
//! [`RunningItem`] describes one switchable application, [`MruKey`] is the
//! identity used for ordering and hiding, and [`Direction`] names the four
//! grid moves.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Placeholder used in place of a missing bundle identifier.
const UNKNOWN_BUNDLE: &str = "unknown";

/// Process identifier, stable for the lifetime of the process.
pub type Pid = i32;

/// Key used by the MRU order and the hidden set.
///
/// Built as `bundle_id_or_unknown + ":" + name`, so several instances that
/// share one bundle id (browser-hosted apps, for example) stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MruKey(String);

impl MruKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MruKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A snapshot of one running application.
///
/// Two items are the same item when their pids match; the name and bundle
/// id are display metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunningItem {
    pub pid: Pid,
    pub name: String,
    #[serde(default)]
    pub bundle_id: Option<String>,
}

impl RunningItem {
    pub fn new(pid: Pid, name: impl Into<String>, bundle_id: Option<&str>) -> Self {
        Self {
            pid,
            name: name.into(),
            bundle_id: bundle_id.map(str::to_string),
        }
    }

    /// The key this item is ordered and filtered by.
    pub fn mru_key(&self) -> MruKey {
        let id = self.bundle_id.as_deref().unwrap_or(UNKNOWN_BUNDLE);
        MruKey(format!("{}:{}", id, self.name))
    }
}

impl PartialEq for RunningItem {
    fn eq(&self, other: &Self) -> bool {
        self.pid == other.pid
    }
}

impl Eq for RunningItem {}

/// Direction for grid navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => write!(f, "left"),
            Direction::Right => write!(f, "right"),
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Parse a direction string (case-insensitive).
fn parse_direction(s: &str) -> Option<Direction> {
    match s.trim().to_ascii_lowercase().as_str() {
        "left" => Some(Direction::Left),
        "right" => Some(Direction::Right),
        "up" => Some(Direction::Up),
        "down" => Some(Direction::Down),
        _ => None,
    }
}

impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_direction(&s).ok_or_else(|| DeError::custom(format!("invalid direction: {:?}", s)))
    }
}
