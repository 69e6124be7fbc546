// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! MBAP framing for Modbus TCP.
//!
//! On-wire layout: `Transaction(2) | Protocol(2)=0 | Length(2) | UnitID(1) | PDU`.
//! `Length` counts the UnitID and the PDU, so a complete frame spans
//! `6 + Length` bytes. The UnitID plus PDU is exactly the RTU ADU without
//! its CRC, which lets TCP reuse the shared ADU parser.

use crate::codec;
use crate::error::FrameError;

/// Bytes needed before the frame length is known (through the UnitID).
pub const MBAP_HEADER_LEN: usize = 7;

/// MBAP header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MbapHeader {
    /// Transaction identifier, echoed into the response.
    pub transaction: u16,
    /// Protocol identifier; 0 for Modbus.
    pub protocol: u16,
    /// Byte count following the length field (UnitID + PDU).
    pub length: u16,
    /// Addressed unit.
    pub unit: u8,
}

impl MbapHeader {
    /// Parses the header from the start of a buffer.
    pub fn parse(data: &[u8]) -> Result<Self, FrameError> {
        if data.len() < MBAP_HEADER_LEN {
            return Err(FrameError::TooShort { len: data.len() });
        }
        Ok(Self {
            transaction: codec::read_u16(data, 0),
            protocol: codec::read_u16(data, 2),
            length: codec::read_u16(data, 4),
            unit: data[6],
        })
    }

    /// Returns `true` when the header describes a well-formed request.
    ///
    /// The length must cover at least the UnitID and a function code and
    /// stay inside the 260-byte Modbus TCP ADU ceiling.
    pub fn is_plausible(&self) -> bool {
        self.protocol == 0 && self.length >= 2 && usize::from(self.length) + 6 <= 260
    }

    /// Total frame length implied by this header.
    pub fn frame_len(&self) -> usize {
        6 + usize::from(self.length)
    }
}

/// Wraps a response ADU (`UnitID | FC | …`) into an MBAP frame.
pub fn encode_frame(transaction: u16, adu: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(6 + adu.len());
    frame.extend_from_slice(&transaction.to_be_bytes());
    frame.extend_from_slice(&0u16.to_be_bytes());
    frame.extend_from_slice(&(adu.len() as u16).to_be_bytes());
    frame.extend_from_slice(adu);
    frame
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header() {
        let frame = [0x00, 0x2A, 0x00, 0x00, 0x00, 0x06, 0x11, 0x03, 0x00, 0x6B, 0x00, 0x03];
        let header = MbapHeader::parse(&frame).unwrap();
        assert_eq!(header.transaction, 0x2A);
        assert_eq!(header.protocol, 0);
        assert_eq!(header.length, 6);
        assert_eq!(header.unit, 0x11);
        assert_eq!(header.frame_len(), 12);
        assert!(header.is_plausible());
    }

    #[test]
    fn test_parse_needs_full_header() {
        assert_eq!(
            MbapHeader::parse(&[0x00, 0x01, 0x00]),
            Err(FrameError::TooShort { len: 3 })
        );
    }

    #[test]
    fn test_plausibility_rejects_bad_headers() {
        let mut header = MbapHeader {
            transaction: 1,
            protocol: 5,
            length: 6,
            unit: 1,
        };
        assert!(!header.is_plausible());

        header.protocol = 0;
        header.length = 1;
        assert!(!header.is_plausible());

        header.length = 300;
        assert!(!header.is_plausible());
    }

    #[test]
    fn test_encode_round_trip() {
        let adu = [0x11u8, 0x03, 0x02, 0xBE, 0xEF];
        let frame = encode_frame(0x1234, &adu);
        assert_eq!(frame.len(), 6 + adu.len());

        let header = MbapHeader::parse(&frame).unwrap();
        assert_eq!(header.transaction, 0x1234);
        assert_eq!(header.length as usize, adu.len());
        assert_eq!(&frame[6..], &adu);
    }
}
