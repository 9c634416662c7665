//! Interrupt handling
//!
//! One background task per process blocks on SIGINT/SIGTERM and tears the
//! whole registry down when a signal arrives. Installation is explicit and
//! happens at most once no matter how many drivers are created.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::registry::Registry;

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Install the process-wide signal watcher. Returns `false` (and does
/// nothing) when a watcher is already installed.
///
/// On signal receipt every driver in `registry` is quit; when
/// `exit_on_signal` is set the process then exits with status 1.
pub fn install(registry: Arc<Registry>, exit_on_signal: bool) -> bool {
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return false;
    }

    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::debug!("exit signal received, stopping all drivers");

        registry.stop_all().await;

        if exit_on_signal {
            std::process::exit(1);
        }
    });

    true
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(err) => {
            tracing::warn!(%err, "SIGTERM handler unavailable, watching SIGINT only");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
