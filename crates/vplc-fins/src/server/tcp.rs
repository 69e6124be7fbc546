// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! FINS/TCP transport.
//!
//! One acceptor task plus one task per connection. Each connection first
//! answers the node-address handshake, then serves command frames. Frames
//! are drained from an accumulation buffer; a header without the `FINS`
//! magic advances the buffer by one byte so the stream resynchronizes
//! without looping on the same input. Connection-table changes emit
//! connection-count events from inside the critical section.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, warn};

use vplc_core::cancel::{CancelSource, CancelToken};
use vplc_core::error::ServerError;
use vplc_core::events::EventBus;
use vplc_core::server::ServerStatus;

use crate::config::FinsConfig;
use crate::frame::{tcp_command, CommandFrame, TcpHeader, TCP_HEADER_SIZE};
use crate::handler::FinsHandler;

use super::StatusCell;

/// Consecutive accept failures treated as a broken listener.
const MAX_ACCEPT_FAILURES: u32 = 8;

/// Connection table: peer → client node assigned in the handshake.
struct Connections {
    events: Arc<EventBus>,
    table: Mutex<HashMap<SocketAddr, u8>>,
}

impl Connections {
    fn new(events: Arc<EventBus>) -> Self {
        Self {
            events,
            table: Mutex::new(HashMap::new()),
        }
    }

    fn insert(&self, peer: SocketAddr) {
        let mut table = self.table.lock();
        table.insert(peer, 0);
        self.events.emit_connection_count(table.len());
    }

    fn set_node(&self, peer: SocketAddr, node: u8) {
        self.table.lock().insert(peer, node);
    }

    fn remove(&self, peer: SocketAddr) {
        let mut table = self.table.lock();
        if table.remove(&peer).is_some() {
            self.events.emit_connection_count(table.len());
        }
    }
}

pub(super) async fn spawn(
    config: &FinsConfig,
    handler: Arc<FinsHandler>,
    events: Arc<EventBus>,
    status: StatusCell,
    cancel: &CancelSource,
) -> Result<Vec<JoinHandle<()>>, ServerError> {
    let addr = config.socket_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ServerError::bind(&addr, e))?;
    tracing::info!(%addr, "FINS/TCP listening");

    let connections = Arc::new(Connections::new(events.clone()));
    Ok(vec![tokio::spawn(accept_loop(
        listener,
        handler,
        events,
        connections,
        status,
        cancel.token(),
    ))])
}

async fn accept_loop(
    listener: TcpListener,
    handler: Arc<FinsHandler>,
    events: Arc<EventBus>,
    connections: Arc<Connections>,
    status: StatusCell,
    mut cancel: CancelToken,
) {
    let mut tasks = JoinSet::new();
    let mut failures = 0u32;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    failures = 0;
                    debug!(%peer, "FINS/TCP connection accepted");
                    connections.insert(peer);
                    tasks.spawn(connection_loop(
                        stream,
                        peer,
                        handler.clone(),
                        events.clone(),
                        connections.clone(),
                        cancel.clone(),
                    ));
                }
                Err(e) => {
                    failures += 1;
                    warn!(error = %e, "FINS/TCP accept failed");
                    if failures >= MAX_ACCEPT_FAILURES {
                        status.set(ServerStatus::Error);
                        break;
                    }
                }
            }
        }
    }

    drop(listener);
    while tasks.join_next().await.is_some() {}
}

async fn connection_loop(
    mut stream: TcpStream,
    peer: SocketAddr,
    handler: Arc<FinsHandler>,
    events: Arc<EventBus>,
    connections: Arc<Connections>,
    mut cancel: CancelToken,
) {
    let mut acc: Vec<u8> = Vec::new();
    let mut buf = [0u8; 4096];

    'connection: loop {
        let n = tokio::select! {
            _ = cancel.cancelled() => break,
            read = stream.read(&mut buf) => match read {
                Ok(0) => {
                    debug!(%peer, "FINS/TCP connection closed by peer");
                    break;
                }
                Ok(n) => n,
                Err(e) => {
                    warn!(%peer, error = %e, "FINS/TCP read failed");
                    break;
                }
            }
        };
        acc.extend_from_slice(&buf[..n]);

        while acc.len() >= TCP_HEADER_SIZE {
            let header = match TcpHeader::parse(&acc) {
                Ok(header) => header,
                Err(e) => {
                    debug!(%peer, error = %e, "Malformed FINS/TCP header, resyncing by one byte");
                    acc.remove(0);
                    continue;
                }
            };
            if acc.len() < header.frame_len() {
                break;
            }

            let frame_bytes: Vec<u8> = acc.drain(..header.frame_len()).collect();
            let payload = &frame_bytes[TCP_HEADER_SIZE..];
            events.emit_rx();

            let response = process_frame(&header, payload, &handler, &connections, peer);
            if let Some(out) = response {
                if let Err(e) = stream.write_all(&out).await {
                    warn!(%peer, error = %e, "FINS/TCP write failed");
                    break 'connection;
                }
                events.emit_tx();
            }
        }
    }

    connections.remove(peer);
}

fn process_frame(
    header: &TcpHeader,
    payload: &[u8],
    handler: &FinsHandler,
    connections: &Connections,
    peer: SocketAddr,
) -> Option<Vec<u8>> {
    if header.is_node_address_request() {
        let response = handler.handle_node_address_request(payload)?;
        if payload.len() >= 4 {
            connections.set_node(peer, payload[3]);
        }
        return Some(response);
    }

    if header.command == tcp_command::FRAME_SEND {
        let frame = match CommandFrame::parse(payload) {
            Ok(frame) => frame,
            Err(e) => {
                debug!(%peer, error = %e, "Malformed FINS command frame");
                return None;
            }
        };
        return Some(handler.handle_command(&frame).to_tcp_bytes());
    }

    debug!(%peer, command = header.command, "Unknown FINS/TCP command");
    None
}
