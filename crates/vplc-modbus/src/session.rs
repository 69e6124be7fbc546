// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! UnitID session tracking for Modbus TCP.
//!
//! A single socket can multiplex requests for many UnitIDs, so connection
//! counting by socket would undercount clients. Instead each UnitID seen in
//! a request opens a session; a 1 s ticker expires sessions idle longer
//! than the timeout. Every count change emits a connection event, from
//! inside the table's critical section so counts and events stay
//! consistent.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use vplc_core::cancel::CancelToken;
use vplc_core::events::EventBus;

/// Default idle timeout for UnitID sessions.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(5);

/// Sweep period of the expiry ticker.
const SWEEP_PERIOD: Duration = Duration::from_secs(1);

// =============================================================================
// SessionTracker
// =============================================================================

/// `UnitID → last activity` table with timeout-based expiry.
pub struct SessionTracker {
    sessions: Mutex<HashMap<u8, Instant>>,
    timeout: Duration,
    events: Arc<EventBus>,
}

impl SessionTracker {
    /// Creates a tracker with the given idle timeout.
    pub fn new(timeout: Duration, events: Arc<EventBus>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            timeout,
            events,
        }
    }

    /// Records activity for a UnitID, emitting a connection event when the
    /// session is new.
    pub fn record(&self, unit: u8) {
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.insert(unit, Instant::now());
        if sessions.len() != before {
            self.events.emit_connection_count(sessions.len());
        }
    }

    /// Expires idle sessions, emitting a connection event on any change.
    pub fn sweep(&self) {
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        let timeout = self.timeout;
        sessions.retain(|_, last| last.elapsed() <= timeout);
        if sessions.len() != before {
            self.events.emit_connection_count(sessions.len());
        }
    }

    /// Number of live sessions.
    pub fn active(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Drops every session, emitting a zero count if any existed.
    pub fn reset(&self) {
        let mut sessions = self.sessions.lock();
        if !sessions.is_empty() {
            sessions.clear();
            self.events.emit_connection_count(0);
        }
    }

    /// Spawns the 1 s expiry ticker bound to a cancellation token.
    pub fn spawn_sweeper(self: &Arc<Self>, mut cancel: CancelToken) -> JoinHandle<()> {
        let tracker = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_PERIOD);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => tracker.sweep(),
                }
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vplc_core::events::EventSink;

    #[derive(Default)]
    struct LastCount(AtomicUsize, AtomicUsize);

    impl EventSink for LastCount {
        fn emit_rx(&self) {}
        fn emit_tx(&self) {}
        fn emit_connection_count(&self, count: usize) {
            self.0.store(count, Ordering::SeqCst);
            self.1.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn tracker_with_sink(timeout: Duration) -> (SessionTracker, Arc<LastCount>) {
        let sink = Arc::new(LastCount::default());
        let events = Arc::new(EventBus::with_sink(sink.clone()));
        (SessionTracker::new(timeout, events), sink)
    }

    #[test]
    fn test_record_emits_only_on_new_sessions() {
        let (tracker, sink) = tracker_with_sink(Duration::from_secs(5));

        tracker.record(1);
        assert_eq!(sink.0.load(Ordering::SeqCst), 1);
        tracker.record(1);
        assert_eq!(sink.1.load(Ordering::SeqCst), 1, "repeat activity must not emit");
        tracker.record(2);
        assert_eq!(sink.0.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.active(), 2);
    }

    #[test]
    fn test_sweep_expires_idle_sessions() {
        let (tracker, sink) = tracker_with_sink(Duration::from_millis(0));
        tracker.record(7);
        std::thread::sleep(Duration::from_millis(5));
        tracker.sweep();
        assert_eq!(tracker.active(), 0);
        assert_eq!(sink.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_sweep_keeps_fresh_sessions() {
        let (tracker, _) = tracker_with_sink(Duration::from_secs(60));
        tracker.record(7);
        tracker.sweep();
        assert_eq!(tracker.active(), 1);
    }

    #[test]
    fn test_reset_emits_zero_once() {
        let (tracker, sink) = tracker_with_sink(Duration::from_secs(60));
        tracker.record(1);
        tracker.reset();
        assert_eq!(tracker.active(), 0);
        assert_eq!(sink.0.load(Ordering::SeqCst), 0);

        let emissions = sink.1.load(Ordering::SeqCst);
        tracker.reset();
        assert_eq!(sink.1.load(Ordering::SeqCst), emissions, "empty reset must not emit");
    }
}
