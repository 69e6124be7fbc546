// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Modbus TCP transport.
//!
//! One acceptor task plus one task per connection. Each connection keeps an
//! accumulation buffer and drains complete MBAP frames from it; a
//! malformed header advances the buffer by one byte so the stream can
//! resynchronize without ever looping on the same input.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, warn};

use vplc_core::cancel::{CancelSource, CancelToken};
use vplc_core::error::ServerError;
use vplc_core::events::EventBus;
use vplc_core::server::ServerStatus;

use crate::config::ModbusConfig;
use crate::error::{ExceptionCode, FrameError};
use crate::frame::{self, Request};
use crate::handler::{DisabledUnitPolicy, ModbusHandler};
use crate::mbap::{self, MbapHeader, MBAP_HEADER_LEN};
use crate::session::SessionTracker;

use super::StatusCell;

/// Consecutive accept failures treated as a broken listener.
const MAX_ACCEPT_FAILURES: u32 = 8;

pub(super) async fn spawn(
    config: &ModbusConfig,
    handler: Arc<ModbusHandler>,
    events: Arc<EventBus>,
    sessions: Arc<SessionTracker>,
    status: StatusCell,
    cancel: &CancelSource,
) -> Result<Vec<JoinHandle<()>>, ServerError> {
    let addr = config.socket_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ServerError::bind(&addr, e))?;
    tracing::info!(%addr, "Modbus TCP listening");

    let accept = tokio::spawn(accept_loop(
        listener,
        handler,
        events,
        sessions.clone(),
        status,
        cancel.token(),
    ));
    let sweeper = sessions.spawn_sweeper(cancel.token());
    Ok(vec![accept, sweeper])
}

async fn accept_loop(
    listener: TcpListener,
    handler: Arc<ModbusHandler>,
    events: Arc<EventBus>,
    sessions: Arc<SessionTracker>,
    status: StatusCell,
    mut cancel: CancelToken,
) {
    let mut connections = JoinSet::new();
    let mut failures = 0u32;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    failures = 0;
                    debug!(%peer, "Modbus TCP connection accepted");
                    connections.spawn(connection_loop(
                        stream,
                        handler.clone(),
                        events.clone(),
                        sessions.clone(),
                        cancel.clone(),
                    ));
                }
                Err(e) => {
                    failures += 1;
                    warn!(error = %e, "Modbus TCP accept failed");
                    if failures >= MAX_ACCEPT_FAILURES {
                        status.set(ServerStatus::Error);
                        break;
                    }
                }
            }
        }
    }

    drop(listener);
    while connections.join_next().await.is_some() {}
}

async fn connection_loop(
    mut stream: TcpStream,
    handler: Arc<ModbusHandler>,
    events: Arc<EventBus>,
    sessions: Arc<SessionTracker>,
    mut cancel: CancelToken,
) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "<unknown>".to_string());
    let mut acc: Vec<u8> = Vec::new();
    let mut buf = [0u8; 4096];

    'connection: loop {
        let n = tokio::select! {
            _ = cancel.cancelled() => break,
            read = stream.read(&mut buf) => match read {
                Ok(0) => {
                    debug!(%peer, "Modbus TCP connection closed by peer");
                    break;
                }
                Ok(n) => n,
                Err(e) => {
                    warn!(%peer, error = %e, "Modbus TCP read failed");
                    break;
                }
            }
        };
        acc.extend_from_slice(&buf[..n]);

        while acc.len() >= MBAP_HEADER_LEN {
            let header = match MbapHeader::parse(&acc) {
                Ok(header) => header,
                Err(_) => break,
            };
            if !header.is_plausible() {
                debug!(%peer, "Malformed MBAP header, resyncing by one byte");
                acc.remove(0);
                continue;
            }
            if acc.len() < header.frame_len() {
                break;
            }

            let frame_bytes: Vec<u8> = acc.drain(..header.frame_len()).collect();
            let adu = &frame_bytes[6..];
            events.emit_rx();
            sessions.record(header.unit);

            let response = match Request::parse_adu(adu) {
                Ok(req) => handler.process(&req, DisabledUnitPolicy::Exception),
                Err(FrameError::UnsupportedFunction { function }) => Some(frame::build_exception(
                    header.unit,
                    function,
                    ExceptionCode::IllegalFunction,
                )),
                Err(e) => {
                    debug!(%peer, error = %e, "Dropping malformed Modbus TCP request");
                    None
                }
            };

            if let Some(resp_adu) = response {
                let out = mbap::encode_frame(header.transaction, &resp_adu);
                if let Err(e) = stream.write_all(&out).await {
                    warn!(%peer, error = %e, "Modbus TCP write failed");
                    break 'connection;
                }
                events.emit_tx();
            }
        }
    }
}
