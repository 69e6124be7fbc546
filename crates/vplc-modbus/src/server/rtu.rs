// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Modbus RTU serial transport.
//!
//! Frames are delimited by line silence: a read timeout after at least 3.5
//! character times of quiet closes the frame (256 bytes closes it
//! regardless). The response is written only after another full silence
//! interval, per the TIA-485 quiet-time discipline. CRC failures and short
//! frames are dropped without a response; requests for disabled UnitIDs
//! leave the line idle.

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

use crate::config::ModbusConfig;
use crate::error::{ExceptionCode, FrameError};
use crate::frame::{self, Request, MAX_RTU_FRAME};
use crate::handler::{DisabledUnitPolicy, ModbusHandler};
use crate::codec;
use crate::serial::{self, READ_SLICE};

use super::StatusCell;

pub(super) fn spawn(
    cfg: &ModbusConfig,
    handler: Arc<ModbusHandler>,
    events: Arc<EventBus>,
    status: StatusCell,
    cancel: &CancelSource,
) -> Result<Vec<JoinHandle<()>>, ServerError> {
    let port = serial::open_port(cfg)?;
    let silence = serial::silence_interval(cfg);
    tracing::info!(
        port = %cfg.serial_port,
        baud = cfg.baud_rate,
        silence_us = silence.as_micros() as u64,
        "Modbus RTU server started"
    );
    Ok(vec![tokio::spawn(read_loop(
        port,
        silence,
        handler,
        events,
        status,
        cancel.token(),
    ))])
}

async fn read_loop(
    mut port: SerialStream,
    silence: Duration,
    handler: Arc<ModbusHandler>,
    events: Arc<EventBus>,
    status: StatusCell,
    mut cancel: CancelToken,
) {
    let mut frame_buf: Vec<u8> = Vec::with_capacity(MAX_RTU_FRAME);
    let mut buf = [0u8; MAX_RTU_FRAME];
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
                frame_buf.extend_from_slice(&buf[..n]);
                last_byte = Instant::now();
                if frame_buf.len() >= MAX_RTU_FRAME {
                    dispatch(&mut frame_buf, &mut port, silence, &handler, &events).await;
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
                if !frame_buf.is_empty() && last_byte.elapsed() >= silence {
                    dispatch(&mut frame_buf, &mut port, silence, &handler, &events).await;
                }
            }
        }
    }
}

async fn dispatch(
    frame_buf: &mut Vec<u8>,
    port: &mut SerialStream,
    silence: Duration,
    handler: &ModbusHandler,
    events: &EventBus,
) {
    let bytes = std::mem::take(frame_buf);
    events.emit_rx();

    let response = match Request::parse_rtu_frame(&bytes) {
        Ok(req) => handler.process(&req, DisabledUnitPolicy::Drop),
        // CRC was valid but the function is not served: exception 0x01,
        // unless the UnitID is disabled and the line must stay silent.
        Err(FrameError::UnsupportedFunction { function }) if handler.is_unit_enabled(bytes[0]) => {
            Some(frame::build_exception(
                bytes[0],
                function,
                ExceptionCode::IllegalFunction,
            ))
        }
        Err(e) => {
            debug!(error = %e, len = bytes.len(), "Dropping RTU frame");
            None
        }
    };

    let Some(adu) = response else {
        return;
    };
    let out = codec::append_crc(adu);

    // Quiet time before transmitting.
    tokio::time::sleep(silence).await;
    if let Err(e) = port.write_all(&out).await {
        warn!(error = %e, "Serial write failed");
        return;
    }
    events.emit_tx();
}
