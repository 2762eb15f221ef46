//! Unix-socket [`CaptureBackend`] implementation.
//!
//! A small privileged helper owns the real input hook (an evdev grab, a
//! compositor plugin, …) and forwards every key-down and modifier change
//! over this socket.  For each event it waits for gridtab's verdict and
//! only re-injects the event on `"PassThrough"`.
//!
//! The panel process reports pointer input over the same socket.  Each
//! connection gets its own thread, so the input helper and the panel can
//! stay connected side by side.
//!
//! # Wire format
//!
//! Every message is a single line of JSON followed by `\n`, answered with
//! exactly one line:
//!
//! ```json
//! {"FlagsChanged":{"primary":true,"secondary":false}}   -> "PassThrough"
//! {"KeyDown":{"keycode":15}}                            -> "Consume"
//! "TapDisabledByTimeout"                                -> "PassThrough"
//! {"PanelHover":2}                                      -> "Consume"
//! {"PanelClick":2}                                      -> "Consume"
//! ```
//!
//! Pointer messages are applied even while the key capture is disabled.

use crate::event::{Disposition, RawEvent};
use crate::interceptor::{lock_router, SharedRouter};
use crate::traits::{CaptureBackend, TapControl};
use log::{debug, error, info};
use serde::Deserialize;
use std::io::{self, BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// How long a blocked read waits before checking for shutdown.
const READ_POLL: Duration = Duration::from_millis(200);

/// Enabled flag shared between the serving thread and the interceptor.
#[derive(Debug, Default)]
pub struct SocketTap {
    enabled: AtomicBool,
}

impl TapControl for SocketTap {
    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }
}

/// Pointer input reported by the panel, by cell index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
enum PanelInput {
    PanelHover(usize),
    PanelClick(usize),
}

/// One inbound line.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Inbound {
    Panel(PanelInput),
    Event(RawEvent),
}

/// A [`CaptureBackend`] that receives JSON-encoded [`RawEvent`]s on a Unix
/// stream socket and answers each with a [`Disposition`].
pub struct SocketCapture {
    path: PathBuf,
    tap: Arc<SocketTap>,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

/// Errors produced by the socket capture.
#[derive(Debug, thiserror::Error)]
pub enum SocketCaptureError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SocketCapture {
    /// Create a capture bound to `path`.
    ///
    /// The socket file is created by [`install`](CaptureBackend::install)
    /// and removed by [`uninstall`](CaptureBackend::uninstall).
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            tap: Arc::new(SocketTap::default()),
            shutdown: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }

    /// The filesystem path of the socket.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CaptureBackend for SocketCapture {
    type Error = SocketCaptureError;

    fn install(&mut self, router: SharedRouter) -> Result<Arc<dyn TapControl>, Self::Error> {
        self.uninstall();

        // Remove stale socket if present.
        let _ = std::fs::remove_file(&self.path);

        let listener = UnixListener::bind(&self.path)?;
        info!("capture listening on {}", self.path.display());

        self.shutdown.store(false, Ordering::SeqCst);
        let tap = Arc::clone(&self.tap);
        let shutdown = Arc::clone(&self.shutdown);
        self.thread = Some(std::thread::spawn(move || {
            serve(listener, router, tap, shutdown)
        }));
        let handle: Arc<dyn TapControl> = self.tap.clone();
        Ok(handle)
    }

    fn uninstall(&mut self) {
        let Some(handle) = self.thread.take() else {
            return;
        };
        self.shutdown.store(true, Ordering::SeqCst);
        self.tap.set_enabled(false);
        // Wake the accept loop.
        let _ = UnixStream::connect(&self.path);
        let _ = handle.join();
        let _ = std::fs::remove_file(&self.path);
        info!("capture socket {} closed", self.path.display());
    }
}

impl Drop for SocketCapture {
    fn drop(&mut self) {
        self.uninstall();
    }
}

fn serve(
    listener: UnixListener,
    router: SharedRouter,
    tap: Arc<SocketTap>,
    shutdown: Arc<AtomicBool>,
) {
    let mut clients: Vec<JoinHandle<()>> = Vec::new();
    for stream in listener.incoming() {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        match stream {
            Ok(stream) => {
                clients.retain(|client| !client.is_finished());
                let (router, tap, shutdown) =
                    (Arc::clone(&router), Arc::clone(&tap), Arc::clone(&shutdown));
                clients.push(std::thread::spawn(move || {
                    debug!("capture client connected");
                    if let Err(e) = serve_client(stream, &router, &tap, &shutdown) {
                        error!("capture client error: {}", e);
                    }
                    debug!("capture client disconnected");
                }));
            }
            Err(e) => {
                error!("accept error: {}", e);
            }
        }
    }
    for client in clients {
        let _ = client.join();
    }
}

fn serve_client(
    stream: UnixStream,
    router: &SharedRouter,
    tap: &SocketTap,
    shutdown: &AtomicBool,
) -> Result<(), SocketCaptureError> {
    stream.set_read_timeout(Some(READ_POLL))?;
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);
    let mut line = String::new();

    while !shutdown.load(Ordering::SeqCst) {
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                continue;
            }
            Err(e) => return Err(e.into()),
        }
        if !line.ends_with('\n') {
            // Partial line; keep reading.
            continue;
        }
        let text = line.trim();
        if !text.is_empty() {
            let disposition = match serde_json::from_str::<Inbound>(text) {
                Ok(Inbound::Event(event)) => dispatch(event, router, tap),
                Ok(Inbound::Panel(input)) => pointer(input, router),
                Err(e) => {
                    error!("bad event: {} ({})", text, e);
                    Disposition::PassThrough
                }
            };
            serde_json::to_writer(&mut writer, &disposition)?;
            writer.write_all(b"\n")?;
        }
        line.clear();
    }
    Ok(())
}

/// Route one event, honouring the enabled flag.
fn dispatch(event: RawEvent, router: &SharedRouter, tap: &SocketTap) -> Disposition {
    if event.is_tap_disabled() {
        tap.set_enabled(false);
    } else if !tap.is_enabled() {
        return Disposition::PassThrough;
    }
    lock_router(router).handle(event)
}

/// Apply pointer input from the panel.
fn pointer(input: PanelInput, router: &SharedRouter) -> Disposition {
    let mut router = lock_router(router);
    match input {
        PanelInput::PanelHover(index) => router.panel_hover(index),
        PanelInput::PanelClick(index) => router.panel_click(index),
    }
    Disposition::Consume
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::Catalog;
    use crate::interceptor::Router;
    use crate::item::{Pid, RunningItem};
    use crate::keymap::Keymap;
    use crate::mru::MruOrder;
    use crate::session::{Intent, SessionPrefs, Switcher};
    use std::sync::atomic::AtomicU32;
    use std::sync::mpsc;

    /// Monotonic counter to generate unique socket paths per test.
    static TEST_ID: AtomicU32 = AtomicU32::new(0);

    /// Helper: create a unique temporary socket path for each test.
    fn tmp_socket_path() -> PathBuf {
        let id = TEST_ID.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir();
        dir.join(format!(
            "gridtab-test-{}-{}.sock",
            std::process::id(),
            id
        ))
    }

    fn make_router(names: &[&str]) -> (SharedRouter, mpsc::Receiver<Intent>) {
        let items: Vec<RunningItem> = names
            .iter()
            .enumerate()
            .map(|(i, n)| RunningItem::new(i as Pid + 1, *n, Some("test")))
            .collect();
        let order = MruOrder::from_keys(items.iter().map(|i| i.mru_key()));
        let mut catalog = Catalog::new(order, Default::default());
        catalog.set_items(items, Some(1));
        let mut switcher = Switcher::new(catalog, SessionPrefs::default());
        let (tx, rx) = mpsc::channel();
        switcher.set_intent_sink(tx);
        (Router::new(switcher, Keymap::default()).shared(), rx)
    }

    /// Send `lines` and collect one reply per line.
    fn exchange(path: &Path, lines: &[&str]) -> Vec<Disposition> {
        let mut stream = UnixStream::connect(path).expect("connect");
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        lines
            .iter()
            .map(|line| {
                writeln!(stream, "{}", line).unwrap();
                let mut reply = String::new();
                reader.read_line(&mut reply).unwrap();
                serde_json::from_str(reply.trim()).unwrap()
            })
            .collect()
    }

    #[test]
    fn round_trip_events_over_socket() {
        let path = tmp_socket_path();
        let (router, rx) = make_router(&["A", "B", "C"]);
        let mut capture = SocketCapture::new(&path);
        let tap = capture.install(router.clone()).unwrap();
        tap.set_enabled(true);

        let replies = exchange(
            &path,
            &[
                r#"{"FlagsChanged":{"primary":true,"secondary":false}}"#,
                r#"{"KeyDown":{"keycode":15}}"#,
                r#"{"KeyDown":{"keycode":30}}"#,
                r#"{"FlagsChanged":{"primary":false,"secondary":false}}"#,
            ],
        );
        assert_eq!(
            replies,
            vec![
                Disposition::PassThrough,
                Disposition::Consume,
                Disposition::PassThrough,
                Disposition::Consume,
            ]
        );
        let intents: Vec<Intent> = rx.try_iter().collect();
        assert!(intents
            .iter()
            .any(|i| matches!(i, Intent::ActivateItem(item) if item.name == "B")));

        capture.uninstall();
        assert!(!path.exists(), "socket file is removed on uninstall");
    }

    #[test]
    fn malformed_json_passes_through() {
        let path = tmp_socket_path();
        let (router, _rx) = make_router(&["A", "B"]);
        let mut capture = SocketCapture::new(&path);
        let tap = capture.install(router).unwrap();
        tap.set_enabled(true);

        let replies = exchange(&path, &["not json at all", r#""Other""#]);
        assert_eq!(replies, vec![Disposition::PassThrough, Disposition::PassThrough]);

        capture.uninstall();
    }

    #[test]
    fn disabled_tap_bypasses_router() {
        let path = tmp_socket_path();
        let (router, rx) = make_router(&["A", "B"]);
        let mut capture = SocketCapture::new(&path);
        let _tap = capture.install(router.clone()).unwrap();

        let replies = exchange(
            &path,
            &[
                r#"{"FlagsChanged":{"primary":true}}"#,
                r#"{"KeyDown":{"keycode":15}}"#,
            ],
        );
        assert_eq!(replies, vec![Disposition::PassThrough, Disposition::PassThrough]);
        assert!(!lock_router(&router).held().primary);
        assert!(rx.try_iter().next().is_none());

        capture.uninstall();
    }

    #[test]
    fn tap_disabled_message_is_recovered_by_router() {
        let path = tmp_socket_path();
        let (router, _rx) = make_router(&["A", "B"]);
        // Go through the interceptor so the router holds the tap handle.
        let mut interceptor = crate::interceptor::Interceptor::new(
            SocketCapture::new(&path),
            AlwaysAllowed,
            router.clone(),
            Duration::from_secs(60),
        );
        interceptor.start().unwrap();

        let replies = exchange(
            &path,
            &[
                r#""TapDisabledByUserInput""#,
                r#"{"FlagsChanged":{"primary":true}}"#,
                r#"{"KeyDown":{"keycode":15}}"#,
            ],
        );
        assert_eq!(
            replies,
            vec![
                Disposition::PassThrough,
                Disposition::PassThrough,
                Disposition::Consume,
            ]
        );
        assert!(lock_router(&router).switcher().is_active());

        interceptor.stop();
        assert!(!path.exists());
    }

    #[test]
    fn panel_pointer_input_drives_session() {
        let path = tmp_socket_path();
        let (router, rx) = make_router(&["A", "B", "C"]);
        let mut capture = SocketCapture::new(&path);
        let tap = capture.install(router.clone()).unwrap();
        tap.set_enabled(true);

        // The input helper stays connected while the panel talks.
        let mut helper = UnixStream::connect(&path).unwrap();
        let mut helper_reader = BufReader::new(helper.try_clone().unwrap());
        for line in [
            r#"{"FlagsChanged":{"primary":true}}"#,
            r#"{"KeyDown":{"keycode":15}}"#,
        ] {
            writeln!(helper, "{}", line).unwrap();
            let mut reply = String::new();
            helper_reader.read_line(&mut reply).unwrap();
        }

        let replies = exchange(&path, &[r#"{"PanelHover":2}"#]);
        assert_eq!(replies, vec![Disposition::Consume]);
        assert_eq!(
            lock_router(&router).switcher().session().map(|s| s.selected()),
            Some(2)
        );

        tap.set_enabled(false);
        let replies = exchange(&path, &[r#"{"PanelClick":0}"#]);
        assert_eq!(replies, vec![Disposition::Consume]);
        assert!(!lock_router(&router).switcher().is_active());

        let intents: Vec<Intent> = rx.try_iter().collect();
        assert!(intents.iter().any(|i| matches!(i, Intent::UpdateSelection(2))));
        assert!(intents
            .iter()
            .any(|i| matches!(i, Intent::ActivateItem(item) if item.name == "A")));

        drop(helper);
        capture.uninstall();
    }

    #[test]
    fn pointer_input_while_idle_is_ignored() {
        let path = tmp_socket_path();
        let (router, rx) = make_router(&["A", "B"]);
        let mut capture = SocketCapture::new(&path);
        let _tap = capture.install(router.clone()).unwrap();

        let replies = exchange(&path, &[r#"{"PanelHover":1}"#, r#"{"PanelClick":1}"#]);
        assert_eq!(replies, vec![Disposition::Consume, Disposition::Consume]);
        assert!(!lock_router(&router).switcher().is_active());
        assert!(rx.try_iter().next().is_none());

        capture.uninstall();
    }

    struct AlwaysAllowed;

    impl crate::traits::PermissionChecker for AlwaysAllowed {
        fn has_input_permission(&self) -> bool {
            true
        }

        fn request_input_permission(&self) -> bool {
            true
        }
    }
}
