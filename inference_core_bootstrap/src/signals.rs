// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Signal Handling
//!
//! Listens for SIGTERM, SIGINT, and SIGHUP and drives the
//! [`crate::shutdown::ShutdownCoordinator`] from whichever arrives first.
//! Unix-only - `tokio::signal::unix` has no Windows equivalent, and the
//! Windows platform relies on Ctrl+C handling through `tokio::signal::ctrl_c`
//! instead.

use crate::shutdown::ShutdownCoordinator;

/// Spawns a task that waits for the first of SIGTERM, SIGINT, or SIGHUP and
/// initiates shutdown on the given coordinator. Returns immediately; the
/// spawned task runs for the process lifetime.
#[cfg(unix)]
pub fn install(coordinator: ShutdownCoordinator) {
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(err) => {
                tracing::error!("failed to install SIGTERM handler: {err}");
                return;
            }
        };
        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(err) => {
                tracing::error!("failed to install SIGINT handler: {err}");
                return;
            }
        };
        let mut sighup = match signal(SignalKind::hangup()) {
            Ok(s) => s,
            Err(err) => {
                tracing::error!("failed to install SIGHUP handler: {err}");
                return;
            }
        };

        let received = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
            _ = sighup.recv() => "SIGHUP",
        };
        tracing::info!("received {received}, initiating shutdown");
        coordinator.initiate_shutdown();
    });
}

/// Windows has no SIGTERM/SIGHUP equivalent; only Ctrl+C is wired.
#[cfg(windows)]
pub fn install(coordinator: ShutdownCoordinator) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received Ctrl+C, initiating shutdown");
            coordinator.initiate_shutdown();
        }
    });
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn sigterm_triggers_shutdown() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
        install(coordinator.clone());
        tokio::time::sleep(Duration::from_millis(20)).await;

        unsafe {
            libc::raise(libc::SIGTERM);
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(coordinator.is_shutting_down());
    }
}
