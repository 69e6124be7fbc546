// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Modbus ASCII serial transport.
//!
//! Bytes are scanned for `:`-opened, CRLF-closed frames by the stateful
//! framer; a frame mid-construction is discarded after one second without
//! a byte. LRC failures drop the frame silently, disabled UnitIDs leave
//! the line idle.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::task::JoinHandle;
use tokio_serial::SerialStream;
use tracing::{debug, warn};

use vplc_core::cancel::{CancelSource, CancelToken};
use vplc_core::error::ServerError;
use vplc_core::events::EventBus;
use vplc_core::server::ServerStatus;

use crate::ascii::{self, AsciiFramer};
use crate::config::ModbusConfig;
use crate::error::{ExceptionCode, FrameError};
use crate::frame::{self, Request};
use crate::handler::{DisabledUnitPolicy, ModbusHandler};
use crate::serial::{self, READ_SLICE};

use super::StatusCell;

/// A frame mid-construction is discarded after this long without a byte.
const FRAME_TIMEOUT: Duration = Duration::from_secs(1);

pub(super) fn spawn(
    cfg: &ModbusConfig,
    handler: Arc<ModbusHandler>,
    events: Arc<EventBus>,
    status: StatusCell,
    cancel: &CancelSource,
) -> Result<Vec<JoinHandle<()>>, ServerError> {
    let port = serial::open_port(cfg)?;
    tracing::info!(
        port = %cfg.serial_port,
        baud = cfg.baud_rate,
        "Modbus ASCII server started"
    );
    Ok(vec![tokio::spawn(read_loop(
        port,
        handler,
        events,
        status,
        cancel.token(),
    ))])
}

async fn read_loop(
    mut port: SerialStream,
    handler: Arc<ModbusHandler>,
    events: Arc<EventBus>,
    status: StatusCell,
    mut cancel: CancelToken,
) {
    let mut framer = AsciiFramer::new();
    let mut buf = [0u8; 512];
    let mut last_byte = Instant::now();

    loop {
        let read = tokio::select! {
            _ = cancel.cancelled() => break,
            read = tokio::time::timeout(READ_SLICE, port.read(&mut buf)) => read,
        };

        match read {
            Ok(Ok(0)) => {
                warn!("Serial port returned EOF");
                status.set(ServerStatus::Error);
                break;
            }
            Ok(Ok(n)) => {
                last_byte = Instant::now();
                for &byte in &buf[..n] {
                    match framer.push(byte) {
                        Some(Ok(raw)) => {
                            handle_frame(&raw, &mut port, &handler, &events).await;
                        }
                        Some(Err(e)) => {
                            debug!(error = %e, "Discarding ASCII frame");
                        }
                        None => {}
                    }
                }
            }
            Ok(Err(e)) => {
                if cancel.is_cancelled() {
                    break;
                }
                warn!(error = %e, "Serial read failed");
                status.set(ServerStatus::Error);
                break;
            }
            Err(_timeout) => {
                if framer.in_frame() && last_byte.elapsed() >= FRAME_TIMEOUT {
                    debug!("Discarding stale ASCII frame");
                    framer.reset();
                }
            }
        }
    }
}

async fn handle_frame(
    raw: &[u8],
    port: &mut SerialStream,
    handler: &ModbusHandler,
    events: &EventBus,
) {
    events.emit_rx();

    let adu = match ascii::decode_frame(raw) {
        Ok(adu) => adu,
        Err(e) => {
            debug!(error = %e, "Dropping ASCII frame");
            return;
        }
    };

    let response = match Request::parse_adu(&adu) {
        Ok(req) => handler.process(&req, DisabledUnitPolicy::Drop),
        // LRC was valid but the function is not served: exception 0x01,
        // unless the UnitID is disabled and the line must stay silent.
        Err(FrameError::UnsupportedFunction { function }) if handler.is_unit_enabled(adu[0]) => {
            Some(frame::build_exception(
                adu[0],
                function,
                ExceptionCode::IllegalFunction,
            ))
        }
        Err(e) => {
            debug!(error = %e, "Dropping malformed ASCII request");
            None
        }
    };

    let Some(resp_adu) = response else {
        return;
    };
    let out = ascii::encode_frame(&resp_adu);
    if let Err(e) = port.write_all(&out).await {
        warn!(error = %e, "Serial write failed");
        return;
    }
    events.emit_tx();
}
