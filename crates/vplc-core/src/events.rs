// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Communication event bus.
//!
//! Servers pulse three kinds of events toward the hosting front-end: a
//! receive pulse, a transmit pulse, and connection-count changes. Delivery
//! is best-effort and must never block a transport task, so sinks are
//! required to return promptly.
//!
//! The [`EventBus`] holds the currently installed sink behind a lock and
//! defaults to [`NullEventSink`]; sinks are swappable at runtime while
//! servers keep emitting through the same bus handle.

use std::sync::Arc;

use parking_lot::RwLock;

// =============================================================================
// EventSink
// =============================================================================

/// Capability object receiving communication pulses.
///
/// Implementations must be cheap and non-blocking; emissions happen inside
/// transport loops and, for connection counts, inside table critical
/// sections.
pub trait EventSink: Send + Sync {
    /// A request (or datagram/frame) was received.
    fn emit_rx(&self);

    /// A response was transmitted.
    fn emit_tx(&self);

    /// The number of live connections/sessions/peers changed.
    fn emit_connection_count(&self, count: usize);
}

/// Sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit_rx(&self) {}
    fn emit_tx(&self) {}
    fn emit_connection_count(&self, _count: usize) {}
}

// =============================================================================
// EventBus
// =============================================================================

/// Shared emission point with a runtime-swappable sink.
pub struct EventBus {
    sink: RwLock<Arc<dyn EventSink>>,
}

impl EventBus {
    /// Creates a bus with the no-op sink installed.
    pub fn new() -> Self {
        Self {
            sink: RwLock::new(Arc::new(NullEventSink)),
        }
    }

    /// Creates a bus with the given sink installed.
    pub fn with_sink(sink: Arc<dyn EventSink>) -> Self {
        Self {
            sink: RwLock::new(sink),
        }
    }

    /// Replaces the installed sink.
    pub fn set_sink(&self, sink: Arc<dyn EventSink>) {
        *self.sink.write() = sink;
    }

    /// Reinstalls the no-op sink.
    pub fn clear_sink(&self) {
        *self.sink.write() = Arc::new(NullEventSink);
    }

    /// Emits a receive pulse.
    pub fn emit_rx(&self) {
        self.sink.read().emit_rx();
    }

    /// Emits a transmit pulse.
    pub fn emit_tx(&self) {
        self.sink.read().emit_tx();
    }

    /// Emits a connection-count change.
    pub fn emit_connection_count(&self, count: usize) {
        self.sink.read().emit_connection_count(count);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
