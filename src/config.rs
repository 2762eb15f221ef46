//! Application configuration.
//!
//! The configuration is loaded from `$XDG_CONFIG_HOME/gridtab/config.json`.
//! Every field is optional; a minimal `{}` file is valid and everything
//! falls back to its compiled-in default.
//!
//! # Example
//!
//! ```json
//! {
//!   "grid_columns": 6,
//!   "digit_shortcuts": true,
//!   "hidden": ["org.gnome.Nautilus:Files"],
//!   "keys": { "advance": 15, "quit": 16 },
//!   "watchdog_interval_ms": 5000
//! }
//! ```
//!
//! The MRU order is not configuration: [`JsonSettings`] keeps it in a
//! separate state file so that config edits never race with it.

use crate::item::MruKey;
use crate::keymap::Keymap;
use crate::session::SessionPrefs;
use crate::traits::SettingsStore;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Smallest accepted `grid_columns`.
pub const MIN_GRID_COLUMNS: usize = 4;
/// Largest accepted `grid_columns`.
pub const MAX_GRID_COLUMNS: usize = 12;
/// Shortest accepted watchdog interval.
pub const MIN_WATCHDOG_INTERVAL_MS: u64 = 100;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of cells per row.  Clamped to 4..=12.
    pub grid_columns: usize,
    /// Whether digit keys pick candidates directly.
    pub digit_shortcuts: bool,
    /// MRU keys that never show up in the switcher.
    pub hidden: Vec<MruKey>,
    /// Keycodes the switcher reacts to.
    pub keys: Keymap,
    /// How often the watchdog checks that capture is still enabled.
    pub watchdog_interval_ms: u64,
    /// Capture socket path; `$XDG_RUNTIME_DIR/gridtab.sock` when unset.
    pub socket_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grid_columns: 8,
            digit_shortcuts: true,
            hidden: Vec::new(),
            keys: Keymap::default(),
            watchdog_interval_ms: 5000,
            socket_path: None,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// `grid_columns` clamped to the supported range.
    pub fn grid_columns(&self) -> usize {
        self.grid_columns.clamp(MIN_GRID_COLUMNS, MAX_GRID_COLUMNS)
    }

    /// Watchdog period, never shorter than [`MIN_WATCHDOG_INTERVAL_MS`].
    pub fn watchdog_interval(&self) -> Duration {
        Duration::from_millis(self.watchdog_interval_ms.max(MIN_WATCHDOG_INTERVAL_MS))
    }
}

/// Error from loading, parsing or persisting configuration state.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);

//  Preferences

/// Everything the router takes from settings, read in one go.
#[derive(Debug, Clone, PartialEq)]
pub struct Preferences {
    pub session: SessionPrefs,
    pub hidden: HashSet<MruKey>,
    pub keymap: Keymap,
}

impl Preferences {
    /// Snapshot the preferences held by `store`.
    pub fn read<S: SettingsStore>(store: &S) -> Self {
        Self {
            session: SessionPrefs {
                max_columns: store.read_grid_columns(),
                digit_shortcuts: store.read_digit_shortcuts_enabled(),
            },
            hidden: store.read_hidden_set(),
            keymap: store.read_keymap(),
        }
    }
}

//  Change detection

/// Notices edits to a file by its modification time.
#[derive(Debug)]
pub struct ConfigWatch {
    path: PathBuf,
    stamp: Option<SystemTime>,
}

impl ConfigWatch {
    /// Watch `path`, taking its current state as seen.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stamp = modified(&path);
        Self { path, stamp }
    }

    /// Whether the file was modified, created or removed since the last
    /// call.
    pub fn changed(&mut self) -> bool {
        let stamp = modified(&self.path);
        if stamp == self.stamp {
            return false;
        }
        debug!("{} changed", self.path.display());
        self.stamp = stamp;
        true
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

//  Paths

/// `$XDG_CONFIG_HOME/gridtab`.
pub fn config_dir() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config").join("gridtab")
}

/// `$XDG_STATE_HOME/gridtab`.
pub fn state_dir() -> PathBuf {
    xdg_dir("XDG_STATE_HOME", ".local/state").join("gridtab")
}

/// Default capture socket, `$XDG_RUNTIME_DIR/gridtab.sock`.
pub fn default_socket_path() -> PathBuf {
    let runtime = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(runtime).join("gridtab.sock")
}

fn xdg_dir(var: &str, fallback: &str) -> PathBuf {
    match std::env::var(var) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
            PathBuf::from(home).join(fallback)
        }
    }
}

//  JSON settings store

/// [`SettingsStore`] backed by the JSON config file and a JSON state file.
///
/// The config file is re-read on every call so that a reload picks up
/// edits; a missing or broken file yields defaults.
#[derive(Debug, Clone)]
pub struct JsonSettings {
    config_path: PathBuf,
    state_path: PathBuf,
}

impl JsonSettings {
    pub fn new(config_path: impl Into<PathBuf>, state_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            state_path: state_path.into(),
        }
    }

    /// Store at the XDG locations.
    pub fn from_env() -> Self {
        Self::new(
            config_dir().join("config.json"),
            state_dir().join("mru.json"),
        )
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// The current configuration, or defaults if it cannot be loaded.
    pub fn config(&self) -> Config {
        match Config::load(&self.config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                debug!("{}, using defaults", e);
                Config::default()
            }
        }
    }
}

impl SettingsStore for JsonSettings {
    type Error = ConfigError;

    fn read_user_order(&self) -> Vec<MruKey> {
        let contents = match std::fs::read_to_string(&self.state_path) {
            Ok(c) => c,
            Err(e) => {
                debug!("no MRU state at {} ({})", self.state_path.display(), e);
                return Vec::new();
            }
        };
        serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!("ignoring corrupt MRU state {}: {}", self.state_path.display(), e);
            Vec::new()
        })
    }

    fn write_user_order(&self, order: &[MruKey]) -> Result<(), ConfigError> {
        if let Some(dir) = self.state_path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| ConfigError(format!("failed to create {}: {}", dir.display(), e)))?;
        }
        let json = serde_json::to_string(order)
            .map_err(|e| ConfigError(format!("failed to encode MRU order: {}", e)))?;
        std::fs::write(&self.state_path, json).map_err(|e| {
            ConfigError(format!("failed to write {}: {}", self.state_path.display(), e))
        })
    }

    fn read_hidden_set(&self) -> HashSet<MruKey> {
        self.config().hidden.into_iter().collect()
    }

    fn read_grid_columns(&self) -> usize {
        self.config().grid_columns()
    }

    fn read_digit_shortcuts_enabled(&self) -> bool {
        self.config().digit_shortcuts
    }

    fn read_keymap(&self) -> Keymap {
        self.config().keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static TEST_ID: AtomicU32 = AtomicU32::new(0);

    /// Unique scratch directory per test.
    fn tmp_dir() -> PathBuf {
        let id = TEST_ID.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "gridtab-config-test-{}-{}",
            std::process::id(),
            id
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn deserialize_full_config() {
        let json = r#"{
            "grid_columns": 6,
            "digit_shortcuts": false,
            "hidden": ["a:b"],
            "keys": { "advance": 48, "digits": [2,3,4,5,6,7,8,9,10,11] },
            "watchdog_interval_ms": 250,
            "socket_path": "/run/user/1000/custom.sock"
        }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.grid_columns(), 6);
        assert!(!cfg.digit_shortcuts);
        assert_eq!(cfg.hidden, vec![MruKey::new("a:b")]);
        assert_eq!(cfg.keys.advance, 48);
        assert_eq!(cfg.keys.quit, Keymap::default().quit);
        assert_eq!(cfg.watchdog_interval_ms, 250);
        assert_eq!(
            cfg.socket_path.as_deref(),
            Some(Path::new("/run/user/1000/custom.sock"))
        );
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.grid_columns(), 8);
        assert!(cfg.digit_shortcuts);
    }

    #[test]
    fn grid_columns_are_clamped() {
        let narrow: Config = serde_json::from_str(r#"{"grid_columns": 1}"#).unwrap();
        assert_eq!(narrow.grid_columns(), MIN_GRID_COLUMNS);
        let wide: Config = serde_json::from_str(r#"{"grid_columns": 40}"#).unwrap();
        assert_eq!(wide.grid_columns(), MAX_GRID_COLUMNS);
    }

    #[test]
    fn watchdog_interval_has_a_floor() {
        let zero: Config = serde_json::from_str(r#"{"watchdog_interval_ms": 0}"#).unwrap();
        assert_eq!(
            zero.watchdog_interval(),
            Duration::from_millis(MIN_WATCHDOG_INTERVAL_MS)
        );
        assert_eq!(Config::default().watchdog_interval(), Duration::from_secs(5));
    }

    #[test]
    fn watch_reports_each_edit_once() {
        let dir = tmp_dir();
        let path = dir.join("config.json");
        let mut watch = ConfigWatch::new(&path);
        assert!(!watch.changed());

        std::fs::write(&path, "{}").unwrap();
        assert!(watch.changed(), "creation counts as a change");
        assert!(!watch.changed());

        let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000))
            .unwrap();
        assert!(watch.changed());
        assert!(!watch.changed());

        std::fs::remove_file(&path).unwrap();
        assert!(watch.changed(), "removal counts as a change");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unknown_keys_ignored() {
        let _cfg: Config = serde_json::from_str(r#"{ "future": { "key": 42 } }"#).unwrap();
    }

    #[test]
    fn missing_files_fall_back_to_defaults() {
        let dir = tmp_dir();
        let store = JsonSettings::new(dir.join("nope.json"), dir.join("nope-mru.json"));
        assert!(store.read_user_order().is_empty());
        assert!(store.read_hidden_set().is_empty());
        assert_eq!(store.read_grid_columns(), 8);
        assert!(store.read_digit_shortcuts_enabled());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn user_order_persists() {
        let dir = tmp_dir();
        let store = JsonSettings::new(dir.join("config.json"), dir.join("state/mru.json"));
        let order = vec![MruKey::new("x:1"), MruKey::new("y:2")];
        store.write_user_order(&order).unwrap();
        assert_eq!(store.read_user_order(), order);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_state_reads_as_empty() {
        let dir = tmp_dir();
        let state = dir.join("mru.json");
        std::fs::write(&state, "{not json").unwrap();
        let store = JsonSettings::new(dir.join("config.json"), &state);
        assert!(store.read_user_order().is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn preferences_follow_config_edits() {
        let dir = tmp_dir();
        let config = dir.join("config.json");
        let store = JsonSettings::new(&config, dir.join("mru.json"));
        assert_eq!(Preferences::read(&store).session.max_columns, 8);

        std::fs::write(
            &config,
            r#"{"grid_columns": 5, "digit_shortcuts": false, "hidden": ["k:v"]}"#,
        )
        .unwrap();
        let prefs = Preferences::read(&store);
        assert_eq!(prefs.session.max_columns, 5);
        assert!(!prefs.session.digit_shortcuts);
        assert!(prefs.hidden.contains(&MruKey::new("k:v")));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
