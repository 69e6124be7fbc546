// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Serial port setup and RTU timing.
//!
//! The inter-frame silence follows the Modbus RTU rule: 3.5 character
//! times at baud rates up to 19200, a fixed 1750 µs above that. One
//! character spans the start bit, the data bits, the parity bit (when
//! enabled) and the stop bits.

use std::time::Duration;

use tokio_serial::{
    DataBits as SerialDataBits, Parity as SerialParity, SerialPortBuilderExt, SerialStream,
    StopBits as SerialStopBits,
};

use vplc_core::error::ServerError;

use crate::config::{ModbusConfig, Parity};

/// Read slice used by the serial receive loops to stay cancellation-
/// responsive.
pub const READ_SLICE: Duration = Duration::from_millis(100);

// =============================================================================
// Timing
// =============================================================================

/// Computes the minimum inter-frame silence for a serial configuration.
pub fn silence_interval(config: &ModbusConfig) -> Duration {
    if config.baud_rate > 19_200 {
        return Duration::from_micros(1750);
    }

    let bits_per_char = 1 + u32::from(config.data_bits)
        + u32::from(config.stop_bits)
        + config.parity.bits();
    let nanos = 3.5 * f64::from(bits_per_char) / f64::from(config.baud_rate) * 1e9;
    Duration::from_nanos(nanos as u64)
}

// =============================================================================
// Port setup
// =============================================================================

fn convert_data_bits(bits: u8) -> SerialDataBits {
    match bits {
        7 => SerialDataBits::Seven,
        _ => SerialDataBits::Eight,
    }
}

fn convert_parity(parity: Parity) -> SerialParity {
    match parity {
        Parity::None => SerialParity::None,
        Parity::Even => SerialParity::Even,
        Parity::Odd => SerialParity::Odd,
    }
}

fn convert_stop_bits(bits: u8) -> SerialStopBits {
    match bits {
        2 => SerialStopBits::Two,
        _ => SerialStopBits::One,
    }
}

/// Opens the configured serial port for async I/O.
pub fn open_port(config: &ModbusConfig) -> Result<SerialStream, ServerError> {
    tokio_serial::new(&config.serial_port, config.baud_rate)
        .data_bits(convert_data_bits(config.data_bits))
        .parity(convert_parity(config.parity))
        .stop_bits(convert_stop_bits(config.stop_bits))
        .open_native_async()
        .map_err(|e| ServerError::serial_open(&config.serial_port, e.to_string()))
}

// =============================================================================
// Tests
// =============================================================================
