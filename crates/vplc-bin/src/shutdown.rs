// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Graceful shutdown coordination.
//!
//! Waits for SIGTERM/SIGINT (Ctrl+C on Windows) and lets other components
//! subscribe to the shutdown notification.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

/// Coordinates shutdown between signal handlers and the run loop.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    sender: broadcast::Sender<()>,
    initiated: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    /// Creates a new coordinator.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            sender,
            initiated: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribes to shutdown notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }

    /// Initiates shutdown. Idempotent.
    pub fn initiate(&self) {
        if self
            .initiated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            info!("Shutdown initiated");
            let _ = self.sender.send(());
        }
    }

    /// Returns `true` once shutdown has been initiated.
    pub fn is_initiated(&self) -> bool {
        self.initiated.load(Ordering::SeqCst)
    }

    /// Blocks until an OS signal arrives or shutdown is initiated manually.
    pub async fn wait(&self) {
        if self.is_initiated() {
            return;
        }
        let mut receiver = self.subscribe();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let mut sigterm =
                signal(SignalKind::terminate()).expect("Failed to register SIGTERM handler");
            let mut sigint =
                signal(SignalKind::interrupt()).expect("Failed to register SIGINT handler");

            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM"),
                _ = sigint.recv() => info!("Received SIGINT"),
                _ = receiver.recv() => {}
            }
        }

        #[cfg(windows)]
        {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    result.expect("Failed to register Ctrl+C handler");
                    info!("Received Ctrl+C");
                }
                _ = receiver.recv() => {}
            }
        }

        self.initiate();
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
