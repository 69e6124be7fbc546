// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! FINS end codes and frame errors.

use thiserror::Error;

// =============================================================================
// EndCode
// =============================================================================

/// Two-byte FINS response status. `0x0000` means success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndCode(pub u16);

impl EndCode {
    /// Normal completion.
    pub const NORMAL: EndCode = EndCode(0x0000);
    /// The command code is not supported.
    pub const COMMAND_NOT_SUPPORTED: EndCode = EndCode(0x0401);
    /// The command body is malformed.
    pub const COMMAND_FORMAT: EndCode = EndCode(0x1004);
    /// The memory area code is unknown.
    pub const AREA_CLASS: EndCode = EndCode(0x1101);
    /// The access range falls outside the area.
    pub const ADDRESS_RANGE: EndCode = EndCode(0x1103);

    /// `true` for normal completion.
    pub const fn is_success(&self) -> bool {
        self.0 == 0
    }

    /// Big-endian wire bytes.
    pub const fn to_bytes(&self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    /// Parses from big-endian wire bytes.
    pub const fn from_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_be_bytes(bytes))
    }
}

impl std::fmt::Display for EndCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match *self {
            EndCode::NORMAL => "normal completion",
            EndCode::COMMAND_NOT_SUPPORTED => "command not supported",
            EndCode::COMMAND_FORMAT => "command format error",
            EndCode::AREA_CLASS => "area classification error",
            EndCode::ADDRESS_RANGE => "address range error",
            _ => return write!(f, "end code 0x{:04X}", self.0),
        };
        write!(f, "{} (0x{:04X})", name, self.0)
    }
}

// =============================================================================
// FrameError
// =============================================================================

/// Errors raised while parsing FINS frames.
///
/// These stay inside the transport layer; whatever can be answered on the
/// wire is answered with an end code instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Fewer bytes than the structure requires.
    #[error("Frame too short: {len} bytes, need {need}")]
    TooShort {
        /// Observed length.
        len: usize,
        /// Required length.
        need: usize,
    },

    /// The outer header does not begin with `FINS`.
    #[error("Invalid FINS magic")]
    InvalidMagic,

    /// The outer header carries an unexpected command.
    #[error("Unknown FINS/TCP command: {command}")]
    UnknownTcpCommand {
        /// The unexpected command value.
        command: u32,
    },
}
