//! Process signals.
//!
//! SIGTERM and SIGINT request shutdown, SIGHUP requests a preference
//! reload.  The handlers only flip atomic flags; the supervisor polls them
//! with [`take_shutdown`] and [`take_reload`].

use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};

/// Set by SIGTERM or SIGINT.
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);
/// Set by SIGHUP.
static RELOAD_REQUESTED: AtomicBool = AtomicBool::new(false);

/// A handler could not be installed.
#[derive(Debug, thiserror::Error)]
#[error("failed to install {0} handler")]
pub struct SignalError(&'static str);

extern "C" fn handle_shutdown(_: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

extern "C" fn handle_reload(_: libc::c_int) {
    RELOAD_REQUESTED.store(true, Ordering::SeqCst);
}

/// Install the SIGTERM, SIGINT and SIGHUP handlers.
pub fn install_handlers() -> Result<(), SignalError> {
    install(libc::SIGTERM, "SIGTERM", handle_shutdown)?;
    install(libc::SIGINT, "SIGINT", handle_shutdown)?;
    install(libc::SIGHUP, "SIGHUP", handle_reload)?;
    debug!("signal handlers installed");
    Ok(())
}

fn install(
    signal: libc::c_int,
    name: &'static str,
    handler: extern "C" fn(libc::c_int),
) -> Result<(), SignalError> {
    unsafe {
        // SAFETY: the handlers only store to a static atomic, which is
        // async-signal-safe.
        let handler = handler as *const () as libc::sighandler_t;
        if libc::signal(signal, handler) == libc::SIG_ERR {
            return Err(SignalError(name));
        }
    }
    Ok(())
}

/// Whether shutdown was requested since the last call.
pub fn take_shutdown() -> bool {
    SHUTDOWN_REQUESTED.swap(false, Ordering::SeqCst)
}

/// Whether a reload was requested since the last call.
pub fn take_reload() -> bool {
    RELOAD_REQUESTED.swap(false, Ordering::SeqCst)
}
