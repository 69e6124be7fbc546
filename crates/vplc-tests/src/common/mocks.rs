// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Test doubles.

use std::sync::atomic::{AtomicUsize, Ordering};

use vplc_core::events::EventSink;

/// Event sink that counts pulses for assertions.
#[derive(Debug, Default)]
pub struct CaptureSink {
    rx: AtomicUsize,
    tx: AtomicUsize,
    connection_changes: AtomicUsize,
    last_connection_count: AtomicUsize,
}

impl CaptureSink {
    /// Creates an empty capture sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of receive pulses seen.
    pub fn rx_count(&self) -> usize {
        self.rx.load(Ordering::SeqCst)
    }

    /// Number of transmit pulses seen.
    pub fn tx_count(&self) -> usize {
        self.tx.load(Ordering::SeqCst)
    }

    /// Number of connection-count events seen.
    pub fn connection_changes(&self) -> usize {
        self.connection_changes.load(Ordering::SeqCst)
    }

    /// The most recent connection count.
    pub fn last_connection_count(&self) -> usize {
        self.last_connection_count.load(Ordering::SeqCst)
    }
}

impl EventSink for CaptureSink {
    fn emit_rx(&self) {
        self.rx.fetch_add(1, Ordering::SeqCst);
    }

    fn emit_tx(&self) {
        self.tx.fetch_add(1, Ordering::SeqCst);
    }

    fn emit_connection_count(&self, count: usize) {
        self.connection_changes.fetch_add(1, Ordering::SeqCst);
        self.last_connection_count.store(count, Ordering::SeqCst);
    }
}
