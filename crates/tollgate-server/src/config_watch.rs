use std::{
    path::{Path, PathBuf},
    sync::mpsc,
    time::Duration,
};

use notify::RecursiveMode;
use notify_debouncer_mini::{
    DebounceEventResult, DebouncedEvent, DebouncedEventKind, new_debouncer,
};
use tollgate_auth::StaticClientRegistry;
use tracing::{debug, error, info, warn};

use crate::config::{AppConfig, loader};

const DEBOUNCE: Duration = Duration::from_millis(500);

/// Start watching a configuration file for changes.
///
/// A reload runs once the file has been quiet for 500ms, so an editor that
/// truncates and then rewrites the file is only read after the last write.
/// A valid file swaps the client registry and re-applies the logging level;
/// anything else in the file takes effect on the next restart. An invalid or
/// missing file is logged and ignored.
///
/// Returns the watcher thread handle, or `None` if the file does not exist.
pub fn start_config_watcher(
    path: PathBuf,
    clients: StaticClientRegistry,
) -> Option<std::thread::JoinHandle<()>> {
    watch_with_debounce(path, clients, DEBOUNCE)
}

fn watch_with_debounce(
    path: PathBuf,
    clients: StaticClientRegistry,
    debounce: Duration,
) -> Option<std::thread::JoinHandle<()>> {
    if !path.exists() {
        warn!(path = %path.display(), "config file does not exist; watcher disabled");
        return None;
    }

    // Editors may replace the file, so watch its directory and filter by name.
    let watch_dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let handle = std::thread::spawn(move || {
        let (tx, rx) = mpsc::channel::<DebounceEventResult>();

        let mut debouncer = match new_debouncer(debounce, tx) {
            Ok(d) => d,
            Err(e) => {
                error!(error = %e, "failed to start config watcher");
                return;
            }
        };

        if let Err(e) = debouncer
            .watcher()
            .watch(&watch_dir, RecursiveMode::NonRecursive)
        {
            error!(error = %e, "failed to watch config file");
            return;
        }

        info!(path = %path.display(), "watching config file");

        // Runs until the debouncer (and with it the sender) is dropped.
        for result in rx {
            match result {
                Ok(events) => {
                    if settled_change(&events, &path) {
                        reload_from_file(&path, &clients);
                    }
                }
                Err(e) => error!(error = ?e, "watch error"),
            }
        }
    });

    Some(handle)
}

/// Returns `true` if `events` report that `path` changed and has since gone quiet.
///
/// `AnyContinuous` events are emitted while writes keep arriving and are skipped.
fn settled_change(events: &[DebouncedEvent], path: &Path) -> bool {
    events.iter().any(|event| {
        matches!(event.kind, DebouncedEventKind::Any) && event.path.file_name() == path.file_name()
    })
}

fn reload_from_file(path: &Path, clients: &StaticClientRegistry) {
    if !path.exists() {
        warn!(path = %path.display(), "config file removed; keeping current configuration");
        return;
    }
    debug!(path = %path.display(), "config file changed");
    match loader::load_config(path.to_str()) {
        Ok(new_cfg) => apply_reload(&new_cfg, clients),
        Err(e) => error!(error = %e, "configuration reload failed"),
    }
}

/// Applies the hot-reloadable parts of a freshly loaded configuration.
pub fn apply_reload(cfg: &AppConfig, clients: &StaticClientRegistry) {
    crate::observability::apply_logging_level(&cfg.logging.level);
    match clients.reload(cfg.auth.clients.clone()) {
        Ok(()) => info!(clients = clients.len(), "configuration reloaded successfully"),
        Err(e) => error!(error = %e, "client registry reload rejected"),
    }
}
