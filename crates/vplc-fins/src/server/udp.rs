// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! FINS/UDP transport.
//!
//! A single bound socket serves bare command frames (no outer header).
//! Every datagram records its source endpoint in the peer table; a sweep
//! task runs every 10 s and evicts peers idle for 30 s or longer, emitting
//! a connection event on any change.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use vplc_core::cancel::{CancelSource, CancelToken};
use vplc_core::error::ServerError;
use vplc_core::events::EventBus;
use vplc_core::server::ServerStatus;

use crate::config::FinsConfig;
use crate::frame::CommandFrame;
use crate::handler::FinsHandler;

use super::StatusCell;

/// Period of the peer-eviction sweep.
const PEER_SWEEP_PERIOD: Duration = Duration::from_secs(10);

/// Idle time after which a peer is evicted.
const PEER_TIMEOUT: Duration = Duration::from_secs(30);

/// Consecutive receive failures treated as a broken socket.
const MAX_RECV_FAILURES: u32 = 8;

// =============================================================================
// Peer table
// =============================================================================

/// `remote endpoint → last activity` table.
pub(crate) struct PeerTable {
    events: Arc<EventBus>,
    peers: Mutex<HashMap<SocketAddr, Instant>>,
}

impl PeerTable {
    pub(crate) fn new(events: Arc<EventBus>) -> Self {
        Self {
            events,
            peers: Mutex::new(HashMap::new()),
        }
    }

    /// Records activity, emitting a connection event for new peers.
    pub(crate) fn record(&self, peer: SocketAddr) {
        let mut peers = self.peers.lock();
        let before = peers.len();
        peers.insert(peer, Instant::now());
        if peers.len() != before {
            self.events.emit_connection_count(peers.len());
        }
    }

    /// Evicts idle peers, emitting a connection event on any change.
    pub(crate) fn sweep(&self, timeout: Duration) {
        let mut peers = self.peers.lock();
        let before = peers.len();
        peers.retain(|_, last| last.elapsed() <= timeout);
        if peers.len() != before {
            self.events.emit_connection_count(peers.len());
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.peers.lock().len()
    }
}

// =============================================================================
// Transport
// =============================================================================

pub(super) async fn spawn(
    config: &FinsConfig,
    handler: Arc<FinsHandler>,
    events: Arc<EventBus>,
    status: StatusCell,
    cancel: &CancelSource,
) -> Result<Vec<JoinHandle<()>>, ServerError> {
    let addr = config.socket_addr();
    let socket = UdpSocket::bind(&addr)
        .await
        .map_err(|e| ServerError::bind(&addr, e))?;
    tracing::info!(%addr, "FINS/UDP listening");

    let peers = Arc::new(PeerTable::new(events.clone()));
    let receive = tokio::spawn(receive_loop(
        socket,
        handler,
        events,
        peers.clone(),
        status,
        cancel.token(),
    ));
    let sweeper = tokio::spawn(sweep_loop(peers, cancel.token()));
    Ok(vec![receive, sweeper])
}

async fn receive_loop(
    socket: UdpSocket,
    handler: Arc<FinsHandler>,
    events: Arc<EventBus>,
    peers: Arc<PeerTable>,
    status: StatusCell,
    mut cancel: CancelToken,
) {
    let mut buf = [0u8; 4096];
    let mut failures = 0u32;

    loop {
        let (n, peer) = tokio::select! {
            _ = cancel.cancelled() => break,
            received = socket.recv_from(&mut buf) => match received {
                Ok(received) => {
                    failures = 0;
                    received
                }
                Err(e) => {
                    failures += 1;
                    warn!(error = %e, "FINS/UDP receive failed");
                    if failures >= MAX_RECV_FAILURES {
                        status.set(ServerStatus::Error);
                        break;
                    }
                    continue;
                }
            }
        };

        events.emit_rx();
        peers.record(peer);

        let frame = match CommandFrame::parse(&buf[..n]) {
            Ok(frame) => frame,
            Err(e) => {
                debug!(%peer, error = %e, "Malformed FINS/UDP datagram");
                continue;
            }
        };

        let response = handler.handle_command(&frame).to_bytes();
        if let Err(e) = socket.send_to(&response, peer).await {
            warn!(%peer, error = %e, "FINS/UDP send failed");
            continue;
        }
        events.emit_tx();
    }
}

async fn sweep_loop(peers: Arc<PeerTable>, mut cancel: CancelToken) {
    let mut ticker = tokio::time::interval(PEER_SWEEP_PERIOD);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => peers.sweep(PEER_TIMEOUT),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
