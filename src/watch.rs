//! File watcher: builds on startup, then rebuilds when manifests or config change.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use notify::RecursiveMode;

use crate::commands::{self, Overrides};
use crate::config::CONFIG_FILE;
use crate::diagnostics;
use crate::error::Error;

/// Debounce delay between filesystem events and rebuild.
const DEBOUNCE_MS: u64 = 100;

/// Create a filesystem watcher that sends events on the given channel.
///
/// # Errors
///
/// Returns `Error::Watch` if the watcher cannot be created.
fn create_watcher(tx: crossbeam_channel::Sender<()>) -> Result<notify::RecommendedWatcher, Error> {
    return notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        if let Ok(event) = res
            && matches!(
                event.kind,
                notify::EventKind::Create(_) | notify::EventKind::Modify(_) | notify::EventKind::Remove(_)
            )
        {
            let _ = tx.send(());
        }
    })
    .map_err(|e| {
        return Error::Watch {
            reason: format!("watcher setup failed: {e}"),
        };
    });
}

/// Register `path` with the watcher.
///
/// # Errors
///
/// Returns `Error::Watch` naming the path if it cannot be watched.
fn watch_path(watcher: &mut impl notify::Watcher, path: &Path, mode: RecursiveMode) -> Result<(), Error> {
    return watcher.watch(path, mode).map_err(|e| {
        return Error::Watch {
            reason: format!("cannot watch {}: {e}", path.display()),
        };
    });
}

/// Entry point for the watch command.
///
/// Runs an initial build, then watches the manifest directory and the
/// config file and rebuilds on changes. Keep `output` outside `input`.
///
/// # Errors
///
/// Returns errors from config loading or watcher setup.
pub fn run(overrides: &Overrides) -> Result<ExitCode, Error> {
    eprintln!("watch: initial build");
    let mut last_code = run_build(overrides);

    let config = overrides.resolve()?;
    let config_file = overrides
        .config
        .clone()
        .unwrap_or_else(|| return PathBuf::from(".").join(CONFIG_FILE));

    let (tx, rx) = crossbeam_channel::unbounded();
    let mut watcher = create_watcher(tx)?;

    if config.input.exists() {
        watch_path(&mut watcher, &config.input, RecursiveMode::Recursive)?;
    }
    if config_file.exists() {
        watch_path(&mut watcher, &config_file, RecursiveMode::NonRecursive)?;
    }

    eprintln!(
        "watch: monitoring {}, press Ctrl+C to stop",
        config.input.display()
    );

    while rx.recv().is_ok() {
        let debounce = Duration::from_millis(DEBOUNCE_MS);
        while rx.recv_timeout(debounce).is_ok() {}
        eprintln!("watch: change detected, rebuilding...");
        last_code = run_build(overrides);
    }

    return Ok(last_code);
}

/// Build once and print any error. Returns the build's exit code.
fn run_build(overrides: &Overrides) -> ExitCode {
    return match commands::build(overrides) {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(2_u8)
        },
    };
}
