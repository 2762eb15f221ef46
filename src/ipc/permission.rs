//! [`PermissionChecker`] for the socket capture.
//!
//! The input helper can only reach gridtab through a socket in the user's
//! runtime directory, so "permission" here means this process can create
//! files in that directory.  Mode bits alone do not tell (ownership, ACLs,
//! read-only mounts), so the check creates and removes a scratch file.

use crate::traits::PermissionChecker;
use log::{debug, info, warn};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Checks that the runtime directory can hold the capture socket.
pub struct RuntimeDirAccess {
    dir: PathBuf,
}

impl RuntimeDirAccess {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory containing `socket_path`.
    pub fn for_socket(socket_path: &Path) -> Self {
        Self::new(socket_path.parent().unwrap_or_else(|| Path::new("/")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl PermissionChecker for RuntimeDirAccess {
    fn has_input_permission(&self) -> bool {
        let check = self
            .dir
            .join(format!(".gridtab-access-check-{}", std::process::id()));
        match OpenOptions::new().write(true).create_new(true).open(&check) {
            Ok(file) => {
                drop(file);
                let _ = std::fs::remove_file(&check);
                true
            }
            Err(e) => {
                debug!("cannot create files in {}: {}", self.dir.display(), e);
                false
            }
        }
    }

    fn request_input_permission(&self) -> bool {
        if self.has_input_permission() {
            info!("runtime directory {} is writable", self.dir.display());
            return true;
        }
        warn!(
            "cannot create the capture socket in {}; make sure XDG_RUNTIME_DIR points to a \
             writable directory owned by this user, or set \"socket_path\" in the config",
            self.dir.display()
        );
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_dir_is_usable() {
        let access = RuntimeDirAccess::new(std::env::temp_dir());
        assert!(access.has_input_permission());
        assert!(access.request_input_permission());
    }

    #[test]
    fn missing_dir_is_denied() {
        let access = RuntimeDirAccess::new("/nonexistent/gridtab/runtime");
        assert!(!access.has_input_permission());
        assert!(!access.request_input_permission());
    }

    #[test]
    fn check_leaves_no_file_behind() {
        let dir = std::env::temp_dir().join(format!("gridtab-access-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let access = RuntimeDirAccess::new(&dir);
        assert!(access.has_input_permission());
        assert!(access.has_input_permission(), "a second check still succeeds");
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn regular_file_is_not_a_directory() {
        let file = std::env::temp_dir().join(format!("gridtab-access-file-{}", std::process::id()));
        std::fs::write(&file, "").unwrap();
        assert!(!RuntimeDirAccess::new(&file).has_input_permission());
        let _ = std::fs::remove_file(&file);
    }

    #[test]
    fn socket_parent_is_checked() {
        let access = RuntimeDirAccess::for_socket(Path::new("/run/user/1000/gridtab.sock"));
        assert_eq!(access.dir(), Path::new("/run/user/1000"));
    }
}
