// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Modbus frame model.
//!
//! Requests and responses are handled as ADUs (`UnitID | FC | payload`)
//! without any checksum or transport framing. The RTU transport appends a
//! CRC-16, the ASCII transport wraps the ADU in `:`/LRC/CRLF, and the TCP
//! transport prefixes an MBAP header; the PDU bytes are identical across
//! all three.
//!
//! Payload layouts (all multibyte fields big-endian):
//!
//! | FC | Request payload |
//! |----|-----------------|
//! | 01/02/03/04 | `Address(2) \| Quantity(2)` |
//! | 05/06 | `Address(2) \| Value(2)` |
//! | 15/16 | `Address(2) \| Quantity(2) \| ByteCount(1) \| Data(ByteCount)` |

use crate::codec;
use crate::error::{ExceptionCode, FrameError};

// =============================================================================
// Function codes
// =============================================================================

/// Function code constants served by the simulator.
pub mod function {
    /// FC 01 - Read Coils.
    pub const READ_COILS: u8 = 0x01;
    /// FC 02 - Read Discrete Inputs.
    pub const READ_DISCRETE_INPUTS: u8 = 0x02;
    /// FC 03 - Read Holding Registers.
    pub const READ_HOLDING_REGISTERS: u8 = 0x03;
    /// FC 04 - Read Input Registers.
    pub const READ_INPUT_REGISTERS: u8 = 0x04;
    /// FC 05 - Write Single Coil.
    pub const WRITE_SINGLE_COIL: u8 = 0x05;
    /// FC 06 - Write Single Register.
    pub const WRITE_SINGLE_REGISTER: u8 = 0x06;
    /// FC 15 - Write Multiple Coils.
    pub const WRITE_MULTIPLE_COILS: u8 = 0x0F;
    /// FC 16 - Write Multiple Registers.
    pub const WRITE_MULTIPLE_REGISTERS: u8 = 0x10;
}

/// Smallest parseable ADU: `UnitID | FC | Address(2) | Quantity(2)`.
pub const MIN_ADU_LEN: usize = 6;

/// Maximum RTU frame length including the CRC.
pub const MAX_RTU_FRAME: usize = 256;

// =============================================================================
// Request
// =============================================================================

/// A parsed Modbus request.
///
/// `data` carries the value bytes of write requests (FC 05/06: the 2-byte
/// value field; FC 15/16: the declared payload). The frame owns its bytes;
/// nothing references the receive buffer after parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Addressed unit.
    pub unit_id: u8,
    /// Function code.
    pub function: u8,
    /// Start address.
    pub address: u16,
    /// Element count (1 for single writes).
    pub quantity: u16,
    /// Write payload, empty for reads.
    pub data: Vec<u8>,
}

impl Request {
    /// Parses an ADU (`UnitID | FC | payload`, no checksum).
    pub fn parse_adu(adu: &[u8]) -> Result<Request, FrameError> {
        if adu.len() < 4 {
            return Err(FrameError::TooShort { len: adu.len() });
        }

        let unit_id = adu[0];
        let function = adu[1];

        match function {
            function::READ_COILS
            | function::READ_DISCRETE_INPUTS
            | function::READ_HOLDING_REGISTERS
            | function::READ_INPUT_REGISTERS => {
                if adu.len() < MIN_ADU_LEN {
                    return Err(FrameError::TooShort { len: adu.len() });
                }
                Ok(Request {
                    unit_id,
                    function,
                    address: codec::read_u16(adu, 2),
                    quantity: codec::read_u16(adu, 4),
                    data: Vec::new(),
                })
            }

            function::WRITE_SINGLE_COIL | function::WRITE_SINGLE_REGISTER => {
                if adu.len() < MIN_ADU_LEN {
                    return Err(FrameError::TooShort { len: adu.len() });
                }
                Ok(Request {
                    unit_id,
                    function,
                    address: codec::read_u16(adu, 2),
                    quantity: 1,
                    data: adu[4..6].to_vec(),
                })
            }

            function::WRITE_MULTIPLE_COILS | function::WRITE_MULTIPLE_REGISTERS => {
                if adu.len() < 7 {
                    return Err(FrameError::TooShort { len: adu.len() });
                }
                let byte_count = usize::from(adu[6]);
                if adu.len() < 7 + byte_count {
                    return Err(FrameError::ByteCountMismatch {
                        declared: byte_count,
                        actual: adu.len() - 7,
                    });
                }
                Ok(Request {
                    unit_id,
                    function,
                    address: codec::read_u16(adu, 2),
                    quantity: codec::read_u16(adu, 4),
                    data: adu[7..7 + byte_count].to_vec(),
                })
            }

            _ => Err(FrameError::UnsupportedFunction { function }),
        }
    }

    /// Parses a complete RTU frame (ADU followed by CRC-16).
    pub fn parse_rtu_frame(frame: &[u8]) -> Result<Request, FrameError> {
        if frame.len() < MIN_ADU_LEN {
            return Err(FrameError::TooShort { len: frame.len() });
        }
        if !codec::check_crc(frame) {
            return Err(FrameError::InvalidCrc);
        }
        Self::parse_adu(&frame[..frame.len() - 2])
    }

    /// Serializes the request back into an ADU (no checksum).
    ///
    /// This is the inverse of [`Request::parse_adu`].
    pub fn to_adu(&self) -> Vec<u8> {
        let mut adu = vec![self.unit_id, self.function];
        adu.extend_from_slice(&self.address.to_be_bytes());
        match self.function {
            function::WRITE_SINGLE_COIL | function::WRITE_SINGLE_REGISTER => {
                adu.extend_from_slice(&self.data);
            }
            function::WRITE_MULTIPLE_COILS | function::WRITE_MULTIPLE_REGISTERS => {
                adu.extend_from_slice(&self.quantity.to_be_bytes());
                adu.push(self.data.len() as u8);
                adu.extend_from_slice(&self.data);
            }
            _ => {
                adu.extend_from_slice(&self.quantity.to_be_bytes());
            }
        }
        adu
    }
}

// =============================================================================
// Response builders
// =============================================================================

/// Builds a bit-read response ADU: `UnitID | FC | ByteCount | packed bits`.
pub fn build_read_bits_response(unit_id: u8, function: u8, values: &[bool]) -> Vec<u8> {
    let packed = codec::pack_bits(values);
    let mut adu = Vec::with_capacity(3 + packed.len());
    adu.push(unit_id);
    adu.push(function);
    adu.push(packed.len() as u8);
    adu.extend_from_slice(&packed);
    adu
}

/// Builds a word-read response ADU: `UnitID | FC | ByteCount | words`.
pub fn build_read_words_response(unit_id: u8, function: u8, values: &[u16]) -> Vec<u8> {
    let mut adu = Vec::with_capacity(3 + values.len() * 2);
    adu.push(unit_id);
    adu.push(function);
    adu.push((values.len() * 2) as u8);
    adu.extend_from_slice(&codec::encode_words(values));
    adu
}

/// Builds a single-write echo ADU: `UnitID | FC | Address | Value`.
pub fn build_write_single_response(unit_id: u8, function: u8, address: u16, value: u16) -> Vec<u8> {
    let mut adu = Vec::with_capacity(6);
    adu.push(unit_id);
    adu.push(function);
    adu.extend_from_slice(&address.to_be_bytes());
    adu.extend_from_slice(&value.to_be_bytes());
    adu
}

/// Builds a multi-write response ADU: `UnitID | FC | Address | Quantity`.
pub fn build_write_multiple_response(
    unit_id: u8,
    function: u8,
    address: u16,
    quantity: u16,
) -> Vec<u8> {
    let mut adu = Vec::with_capacity(6);
    adu.push(unit_id);
    adu.push(function);
    adu.extend_from_slice(&address.to_be_bytes());
    adu.extend_from_slice(&quantity.to_be_bytes());
    adu
}

/// Builds an exception ADU: `UnitID | FC|0x80 | ExceptionCode`.
pub fn build_exception(unit_id: u8, function: u8, code: ExceptionCode) -> Vec<u8> {
    vec![unit_id, function | 0x80, code.as_u8()]
}

// =============================================================================
// Tests
// =============================================================================
