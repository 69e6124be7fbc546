// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Per-server cancellation primitives.
//!
//! Every running server owns one [`CancelSource`]; each task it spawns
//! holds a [`CancelToken`]. Stopping the server fires the source once,
//! after which every token resolves immediately, including tokens created
//! after the fact.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

// =============================================================================
// CancelSource
// =============================================================================

/// The owning side of a cancellation scope.
pub struct CancelSource {
    sender: broadcast::Sender<()>,
    fired: Arc<AtomicBool>,
}

impl CancelSource {
    /// Creates a new, un-fired cancellation scope.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            sender,
            fired: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Creates a token observing this scope.
    pub fn token(&self) -> CancelToken {
        CancelToken {
            receiver: self.sender.subscribe(),
            fired: self.fired.clone(),
        }
    }

    /// Fires the scope. Idempotent.
    pub fn cancel(&self) {
        if self
            .fired
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let _ = self.sender.send(());
        }
    }

    /// Returns `true` once the scope has fired.
    pub fn is_cancelled(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelSource")
            .field("fired", &self.is_cancelled())
            .finish()
    }
}

// =============================================================================
// CancelToken
// =============================================================================

/// The observing side of a cancellation scope.
pub struct CancelToken {
    receiver: broadcast::Receiver<()>,
    fired: Arc<AtomicBool>,
}

impl CancelToken {
    /// Resolves when the scope fires; immediately if it already has.
    pub async fn cancelled(&mut self) {
        if self.fired.load(Ordering::SeqCst) {
            return;
        }
        // RecvError::Closed also means the source is gone: treat as fired.
        let _ = self.receiver.recv().await;
    }

    /// Returns `true` once the scope has fired.
    pub fn is_cancelled(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

impl Clone for CancelToken {
    fn clone(&self) -> Self {
        Self {
            receiver: self.receiver.resubscribe(),
            fired: self.fired.clone(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cancel_resolves_tokens() {
        let source = CancelSource::new();
        let mut token = source.token();

        assert!(!token.is_cancelled());
        source.cancel();
        assert!(token.is_cancelled());

        tokio::time::timeout(Duration::from_secs(1), token.cancelled())
            .await
            .expect("token should resolve after cancel");
    }

    #[tokio::test]
    async fn test_token_created_after_fire_resolves() {
        let source = CancelSource::new();
        source.cancel();

        let mut late = source.token();
        tokio::time::timeout(Duration::from_secs(1), late.cancelled())
            .await
            .expect("late token should resolve immediately");
    }

    #[tokio::test]
    async fn test_double_cancel_is_noop() {
        let source = CancelSource::new();
        source.cancel();
        source.cancel();
        assert!(source.is_cancelled());
    }

    #[tokio::test]
    async fn test_clone_observes_same_scope() {
        let source = CancelSource::new();
        let token = source.token();
        let mut clone = token.clone();

        source.cancel();
        tokio::time::timeout(Duration::from_secs(1), clone.cancelled())
            .await
            .expect("cloned token should resolve");
    }
}
