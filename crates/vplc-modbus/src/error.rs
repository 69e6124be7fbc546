// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Modbus frame errors and exception codes.

use thiserror::Error;

// =============================================================================
// ExceptionCode
// =============================================================================

/// Modbus exception codes emitted by this server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExceptionCode {
    /// The function code is not supported or the UnitID refuses service.
    IllegalFunction = 0x01,
    /// The access range falls outside the addressed area.
    IllegalDataAddress = 0x02,
    /// A value field is malformed (e.g. FC 05 payload other than
    /// 0xFF00/0x0000).
    IllegalDataValue = 0x03,
    /// Unexpected internal failure.
    ServerDeviceFailure = 0x04,
}

impl ExceptionCode {
    /// Wire representation.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExceptionCode::IllegalFunction => "illegal function",
            ExceptionCode::IllegalDataAddress => "illegal data address",
            ExceptionCode::IllegalDataValue => "illegal data value",
            ExceptionCode::ServerDeviceFailure => "server device failure",
        };
        f.write_str(s)
    }
}

// =============================================================================
// FrameError
// =============================================================================

/// Errors raised while parsing Modbus frames.
///
/// These never leave the transport layer: depending on the variant they
/// turn into a silent drop (bad checksum, short frame) or an exception
/// response (unsupported function).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Fewer bytes than the smallest valid frame.
    #[error("Frame too short: {len} bytes")]
    TooShort {
        /// Observed length.
        len: usize,
    },

    /// CRC-16 verification failed.
    #[error("Invalid CRC")]
    InvalidCrc,

    /// LRC verification failed.
    #[error("Invalid LRC")]
    InvalidLrc,

    /// ASCII frame does not begin with ':'.
    #[error("Invalid start character: 0x{found:02X}")]
    InvalidStart {
        /// The byte found instead of ':'.
        found: u8,
    },

    /// ASCII frame does not end with CR LF.
    #[error("Invalid frame terminator")]
    InvalidTerminator,

    /// ASCII hex payload has an odd length or non-hex characters.
    #[error("Invalid hex payload")]
    InvalidHex,

    /// ASCII frame exceeded the 513-byte cap.
    #[error("Frame too long: {len} bytes")]
    TooLong {
        /// Observed length.
        len: usize,
    },

    /// The function code is not served.
    #[error("Unsupported function code: 0x{function:02X}")]
    UnsupportedFunction {
        /// The offending function code.
        function: u8,
    },

    /// Declared byte count disagrees with the payload.
    #[error("Byte count mismatch: declared {declared}, got {actual}")]
    ByteCountMismatch {
        /// Declared byte count.
        declared: usize,
        /// Bytes actually present.
        actual: usize,
    },
}
