//! Entry point for the **gridtab** daemon.
//!
//! Starts event capture on the Unix socket, follows Hyprland's window
//! events on a background thread and executes switcher intents on the main
//! thread until SIGTERM/SIGINT or the end of Hyprland's event stream.

use gridtab::candidates::Catalog;
use gridtab::config::{default_socket_path, Config, ConfigWatch, JsonSettings, Preferences};
use gridtab::controller::{Controller, Supervisor, Tracker};
use gridtab::hyprland::clients::HyprlandClients;
use gridtab::hyprland::events::HyprlandEventSource;
use gridtab::interceptor::{lock_router, Interceptor, InterceptorError, Router, SharedRouter};
use gridtab::ipc::listener::SocketCapture;
use gridtab::ipc::permission::RuntimeDirAccess;
use gridtab::mru::MruOrder;
use gridtab::panel::LogPanel;
use gridtab::session::{Intent, Switcher};
use gridtab::signals;
use gridtab::traits::{AppEvent, AppEventSource, PermissionChecker, SettingsStore};
use log::{error, info, warn};
use std::sync::mpsc;
use std::time::Duration;

/// How often the supervisor checks for signals and config edits.
const SUPERVISOR_TICK: Duration = Duration::from_millis(250);

//  Main

fn main() {
    env_logger::init();

    if let Err(e) = signals::install_handlers() {
        warn!("{}", e);
    }

    let settings = JsonSettings::from_env();
    let config = load_config(&settings);

    let (intent_tx, intent_rx) = mpsc::channel::<Intent>();
    let router = build_router(&settings, intent_tx);

    let socket_path = config.socket_path.clone().unwrap_or_else(default_socket_path);
    let permissions = RuntimeDirAccess::for_socket(&socket_path);
    let mut interceptor = Interceptor::new(
        SocketCapture::new(&socket_path),
        permissions,
        router.clone(),
        config.watchdog_interval(),
    );
    if let Err(e) = start_capture(&mut interceptor) {
        error!("{}", e);
        std::process::exit(1);
    }

    spawn_tracker(settings.clone(), router.clone());
    spawn_supervisor(settings, router.clone());

    info!("gridtab running");
    let mut controller = Controller::new(LogPanel::new(), HyprlandClients::new(), router);
    controller.run(intent_rx);

    interceptor.stop();
    info!("exiting");
}

//  Helpers

fn load_config(settings: &JsonSettings) -> Config {
    let path = settings.config_path();
    match Config::load(path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

fn build_router(settings: &JsonSettings, intents: mpsc::Sender<Intent>) -> SharedRouter {
    let prefs = Preferences::read(settings);
    let order = MruOrder::from_keys(settings.read_user_order());
    info!("restored {} MRU entries", order.len());

    let catalog = Catalog::new(order, prefs.hidden.clone());
    let mut switcher = Switcher::new(catalog, prefs.session);
    switcher.set_intent_sink(intents);
    Router::new(switcher, prefs.keymap).shared()
}

/// Start capture, asking for permission once if it is missing.
fn start_capture<P: PermissionChecker>(
    interceptor: &mut Interceptor<SocketCapture, P>,
) -> Result<(), InterceptorError> {
    match interceptor.start() {
        Err(InterceptorError::PermissionDenied) => {
            if interceptor.request_permission() {
                interceptor.start()
            } else {
                Err(InterceptorError::PermissionDenied)
            }
        }
        other => other,
    }
}

/// Seed the item snapshot, then follow Hyprland's window events.
///
/// When the event stream ends the compositor is gone, so the intent
/// channel is closed and the daemon winds down.
fn spawn_tracker(settings: JsonSettings, router: SharedRouter) {
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>();

    std::thread::spawn(move || {
        let mut source = HyprlandEventSource::new();
        if let Err(e) = source.run(event_tx) {
            error!("event source error: {}", e);
        }
    });

    std::thread::spawn(move || {
        let tracker = Tracker::new(HyprlandClients::new(), settings, router.clone());
        tracker.handle(AppEvent::Activated);
        tracker.run(event_rx);
        lock_router(&router).close_intents();
    });
}

/// Watch for reload and shutdown requests.
fn spawn_supervisor(settings: JsonSettings, router: SharedRouter) {
    let watch = ConfigWatch::new(settings.config_path());
    std::thread::spawn(move || {
        let mut supervisor = Supervisor::new(settings, watch, router);
        supervisor.run(SUPERVISOR_TICK);
    });
}
