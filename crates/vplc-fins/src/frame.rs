// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! FINS frame model.
//!
//! FINS/TCP wraps every exchange in a 16-byte outer header
//! (`"FINS" | Length | Command | Error`, all big-endian; `Length` counts
//! the bytes after the header). FINS/UDP has no outer header: datagrams
//! begin directly with the 10-byte command header.
//!
//! A command frame is `CommandHeader(10) | MRC | SRC | body`. Responses
//! invert the envelope: the response bit is set in the ICF and the
//! destination and source address triples swap places; the SID is kept.

use crate::error::FrameError;
use crate::memory::AreaCode;

// =============================================================================
// FINS/TCP outer header
// =============================================================================

/// Size of the FINS/TCP outer header.
pub const TCP_HEADER_SIZE: usize = 16;

/// Magic bytes opening every FINS/TCP frame.
pub const FINS_MAGIC: [u8; 4] = *b"FINS";

/// FINS/TCP outer command values.
pub mod tcp_command {
    /// Client → server node-address request.
    pub const NODE_ADDRESS_SEND: u32 = 1;
    /// Server → client node-address response, and frame send in both
    /// directions.
    pub const FRAME_SEND: u32 = 2;
    /// Frame send error notification.
    pub const FRAME_SEND_ERROR: u32 = 3;
}

/// The FINS/TCP outer header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpHeader {
    /// Byte count following the 16-byte header.
    pub length: u32,
    /// Outer command.
    pub command: u32,
    /// Error code (0 in every frame this server emits).
    pub error: u32,
}

impl TcpHeader {
    /// Parses the outer header from the start of a buffer.
    pub fn parse(data: &[u8]) -> Result<Self, FrameError> {
        if data.len() < TCP_HEADER_SIZE {
            return Err(FrameError::TooShort {
                len: data.len(),
                need: TCP_HEADER_SIZE,
            });
        }
        if data[0..4] != FINS_MAGIC {
            return Err(FrameError::InvalidMagic);
        }
        Ok(Self {
            length: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            command: u32::from_be_bytes([data[8], data[9], data[10], data[11]]),
            error: u32::from_be_bytes([data[12], data[13], data[14], data[15]]),
        })
    }

    /// Serializes the header.
    pub fn to_bytes(self) -> [u8; TCP_HEADER_SIZE] {
        let mut bytes = [0u8; TCP_HEADER_SIZE];
        bytes[0..4].copy_from_slice(&FINS_MAGIC);
        bytes[4..8].copy_from_slice(&self.length.to_be_bytes());
        bytes[8..12].copy_from_slice(&self.command.to_be_bytes());
        bytes[12..16].copy_from_slice(&self.error.to_be_bytes());
        bytes
    }

    /// `true` for a client node-address request.
    ///
    /// Some client stacks send outer command 0 for the handshake, others 1;
    /// both are answered.
    pub fn is_node_address_request(&self) -> bool {
        self.command == 0 || self.command == tcp_command::NODE_ADDRESS_SEND
    }

    /// Payload bytes following the 16-byte header.
    ///
    /// Frame-send frames count `Length` from the end of the header.
    /// Node-address requests are seen on the wire with `Length` counted
    /// from the Command field (12 for the 4-byte body); both conventions
    /// are accepted.
    pub fn payload_len(&self) -> usize {
        let length = self.length as usize;
        if self.is_node_address_request() && length >= 8 {
            length - 8
        } else {
            length
        }
    }

    /// Total frame length implied by this header.
    pub fn frame_len(&self) -> usize {
        TCP_HEADER_SIZE + self.payload_len()
    }
}

/// Builds a complete FINS/TCP frame around a payload.
pub fn encode_tcp_frame(command: u32, payload: &[u8]) -> Vec<u8> {
    let header = TcpHeader {
        length: payload.len() as u32,
        command,
        error: 0,
    };
    let mut frame = Vec::with_capacity(TCP_HEADER_SIZE + payload.len());
    frame.extend_from_slice(&header.to_bytes());
    frame.extend_from_slice(payload);
    frame
}

// =============================================================================
// Command header
// =============================================================================

/// Size of the FINS command header.
pub const COMMAND_HEADER_SIZE: usize = 10;

/// The 10-byte FINS command header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandHeader {
    /// Information Control Field. Bit 6: response; bit 0: response not
    /// required.
    pub icf: u8,
    /// Reserved, always 0.
    pub rsv: u8,
    /// Gateway count.
    pub gct: u8,
    /// Destination network address.
    pub dna: u8,
    /// Destination node address.
    pub da1: u8,
    /// Destination unit address.
    pub da2: u8,
    /// Source network address.
    pub sna: u8,
    /// Source node address.
    pub sa1: u8,
    /// Source unit address.
    pub sa2: u8,
    /// Service id, echoed into the response.
    pub sid: u8,
}

impl CommandHeader {
    /// Parses the command header from the start of a buffer.
    pub fn parse(data: &[u8]) -> Result<Self, FrameError> {
        if data.len() < COMMAND_HEADER_SIZE {
            return Err(FrameError::TooShort {
                len: data.len(),
                need: COMMAND_HEADER_SIZE,
            });
        }
        Ok(Self {
            icf: data[0],
            rsv: data[1],
            gct: data[2],
            dna: data[3],
            da1: data[4],
            da2: data[5],
            sna: data[6],
            sa1: data[7],
            sa2: data[8],
            sid: data[9],
        })
    }

    /// Serializes the header.
    pub fn to_bytes(self) -> [u8; COMMAND_HEADER_SIZE] {
        [
            self.icf, self.rsv, self.gct, self.dna, self.da1, self.da2, self.sna, self.sa1,
            self.sa2, self.sid,
        ]
    }

    /// `true` when the frame is a request (ICF bit 6 clear).
    pub fn is_request(&self) -> bool {
        self.icf & 0x40 == 0
    }

    /// `true` when the sender expects a response (ICF bit 0 clear).
    pub fn needs_response(&self) -> bool {
        self.icf & 0x01 == 0
    }

    /// Builds the response header: response bit set, address triples
    /// swapped, SID kept.
    pub fn response_header(&self) -> CommandHeader {
        CommandHeader {
            icf: self.icf | 0x40,
            rsv: self.rsv,
            gct: self.gct,
            dna: self.sna,
            da1: self.sa1,
            da2: self.sa2,
            sna: self.dna,
            sa1: self.da1,
            sa2: self.da2,
            sid: self.sid,
        }
    }
}

// =============================================================================
// Command code
// =============================================================================

/// FINS command code: main and sub request codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    /// Main request code.
    pub mrc: u8,
    /// Sub request code.
    pub src: u8,
}

impl Command {
    /// Memory-area read (`0x01 0x01`).
    pub const MEMORY_AREA_READ: Command = Command { mrc: 0x01, src: 0x01 };
    /// Memory-area write (`0x01 0x02`).
    pub const MEMORY_AREA_WRITE: Command = Command { mrc: 0x01, src: 0x02 };

    /// Combined 16-bit code.
    pub const fn code(&self) -> u16 {
        (self.mrc as u16) << 8 | self.src as u16
    }
}

// =============================================================================
// Command frame
// =============================================================================

/// A parsed FINS command frame (no outer header).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    /// The command header.
    pub header: CommandHeader,
    /// The command code.
    pub command: Command,
    /// The command body.
    pub body: Vec<u8>,
}

impl CommandFrame {
    /// Parses `CommandHeader | MRC | SRC | body`.
    ///
    /// This is the entire FINS/UDP datagram layout, and the payload of a
    /// FINS/TCP frame-send frame.
    pub fn parse(data: &[u8]) -> Result<Self, FrameError> {
        let need = COMMAND_HEADER_SIZE + 2;
        if data.len() < need {
            return Err(FrameError::TooShort {
                len: data.len(),
                need,
            });
        }
        let header = CommandHeader::parse(data)?;
        let command = Command {
            mrc: data[COMMAND_HEADER_SIZE],
            src: data[COMMAND_HEADER_SIZE + 1],
        };
        Ok(Self {
            header,
            command,
            body: data[need..].to_vec(),
        })
    }

    /// Serializes `CommandHeader | MRC | SRC | body`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(COMMAND_HEADER_SIZE + 2 + self.body.len());
        bytes.extend_from_slice(&self.header.to_bytes());
        bytes.push(self.command.mrc);
        bytes.push(self.command.src);
        bytes.extend_from_slice(&self.body);
        bytes
    }

    /// Wraps the frame for the TCP transport (outer command 2).
    pub fn to_tcp_bytes(&self) -> Vec<u8> {
        encode_tcp_frame(tcp_command::FRAME_SEND, &self.to_bytes())
    }
}

// =============================================================================
// Memory-area request bodies
// =============================================================================

/// Memory-area read request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryAreaReadRequest {
    /// Addressed area code.
    pub area_code: AreaCode,
    /// Word address.
    pub address: u16,
    /// Bit address (0 for word access).
    pub bit_address: u8,
    /// Word count.
    pub count: u16,
}

impl MemoryAreaReadRequest {
    /// Parses `AreaCode | Address(2) | BitAddress | Count(2)`.
    pub fn parse(body: &[u8]) -> Result<Self, FrameError> {
        if body.len() < 6 {
            return Err(FrameError::TooShort {
                len: body.len(),
                need: 6,
            });
        }
        Ok(Self {
            area_code: AreaCode(body[0]),
            address: u16::from_be_bytes([body[1], body[2]]),
            bit_address: body[3],
            count: u16::from_be_bytes([body[4], body[5]]),
        })
    }
}

/// Memory-area write request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryAreaWriteRequest {
    /// Addressed area code.
    pub area_code: AreaCode,
    /// Word address.
    pub address: u16,
    /// Bit address (0 for word access).
    pub bit_address: u8,
    /// Word count.
    pub count: u16,
    /// `count * 2` payload bytes, big-endian words.
    pub data: Vec<u8>,
}

impl MemoryAreaWriteRequest {
    /// Parses the read-request prefix followed by `Count * 2` data bytes.
    pub fn parse(body: &[u8]) -> Result<Self, FrameError> {
        if body.len() < 6 {
            return Err(FrameError::TooShort {
                len: body.len(),
                need: 6,
            });
        }
        let count = u16::from_be_bytes([body[4], body[5]]);
        let need = 6 + usize::from(count) * 2;
        if body.len() < need {
            return Err(FrameError::TooShort {
                len: body.len(),
                need,
            });
        }
        Ok(Self {
            area_code: AreaCode(body[0]),
            address: u16::from_be_bytes([body[1], body[2]]),
            bit_address: body[3],
            count,
            data: body[6..need].to_vec(),
        })
    }

    /// Decodes the payload into words.
    pub fn words(&self) -> Vec<u16> {
        self.data
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect()
    }
}

// =============================================================================
// Response builders
// =============================================================================

/// Builds a memory-area read response frame.
///
/// Body layout: `EndCode(2, BE) | Count*2 data bytes (BE words)`.
pub fn build_read_response(
    request_header: &CommandHeader,
    command: Command,
    end_code: crate::error::EndCode,
    words: &[u16],
) -> CommandFrame {
    let mut body = Vec::with_capacity(2 + words.len() * 2);
    body.extend_from_slice(&end_code.to_bytes());
    for &word in words {
        body.extend_from_slice(&word.to_be_bytes());
    }
    CommandFrame {
        header: request_header.response_header(),
        command,
        body,
    }
}

/// Builds a memory-area write response frame (end code only).
pub fn build_write_response(
    request_header: &CommandHeader,
    command: Command,
    end_code: crate::error::EndCode,
) -> CommandFrame {
    CommandFrame {
        header: request_header.response_header(),
        command,
        body: end_code.to_bytes().to_vec(),
    }
}

// =============================================================================
// Node-address handshake (FINS/TCP)
// =============================================================================

/// Extracts the client node from a node-address request body.
pub fn parse_node_address_request(body: &[u8]) -> Result<u8, FrameError> {
    if body.len() < 4 {
        return Err(FrameError::TooShort {
            len: body.len(),
            need: 4,
        });
    }
    Ok(body[3])
}

/// Builds the complete node-address response frame.
///
/// Body: `00 00 00 ClientNode 00 00 00 ServerNode`, outer command 2.
pub fn build_node_address_response(client_node: u8, server_node: u8) -> Vec<u8> {
    encode_tcp_frame(
        tcp_command::FRAME_SEND,
        &[0, 0, 0, client_node, 0, 0, 0, server_node],
    )
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EndCode;

    #[test]
    fn test_tcp_header_round_trip() {
        let header = TcpHeader {
            length: 12,
            command: tcp_command::FRAME_SEND,
            error: 0,
        };
        let bytes = header.to_bytes();
        assert_eq!(&bytes[0..4], b"FINS");
        assert_eq!(TcpHeader::parse(&bytes).unwrap(), header);
        assert_eq!(header.frame_len(), 28);
    }

    #[test]
    fn test_tcp_header_rejects_bad_magic() {
        let mut bytes = TcpHeader {
            length: 0,
            command: 1,
            error: 0,
        }
        .to_bytes();
        bytes[0] = b'X';
        assert_eq!(TcpHeader::parse(&bytes), Err(FrameError::InvalidMagic));
    }

    #[test]
    fn test_command_header_response_inversion() {
        let request = CommandHeader {
            icf: 0x80,
            rsv: 0,
            gct: 0x02,
            dna: 0,
            da1: 1,
            da2: 0,
            sna: 0,
            sa1: 2,
            sa2: 0,
            sid: 0x17,
        };
        assert!(request.is_request());
        assert!(request.needs_response());

        let response = request.response_header();
        assert!(!response.is_request());
        assert_eq!(response.icf, 0xC0);
        assert_eq!((response.dna, response.da1, response.da2), (0, 2, 0));
        assert_eq!((response.sna, response.sa1, response.sa2), (0, 1, 0));
        assert_eq!(response.sid, 0x17);
    }

    #[test]
    fn test_command_codes() {
        assert_eq!(Command::MEMORY_AREA_READ.code(), 0x0101);
        assert_eq!(Command::MEMORY_AREA_WRITE.code(), 0x0102);
    }

    #[test]
    fn test_command_frame_round_trip() {
        let frame = CommandFrame {
            header: CommandHeader {
                icf: 0x80,
                rsv: 0,
                gct: 2,
                dna: 0,
                da1: 1,
                da2: 0,
                sna: 0,
                sa1: 2,
                sa2: 0,
                sid: 1,
            },
            command: Command::MEMORY_AREA_READ,
            body: vec![0x82, 0x00, 0x64, 0x00, 0x00, 0x02],
        };
        let parsed = CommandFrame::parse(&frame.to_bytes()).unwrap();
        assert_eq!(parsed, frame);
    }

    #[test]
    fn test_command_frame_too_short() {
        assert!(matches!(
            CommandFrame::parse(&[0u8; 11]),
            Err(FrameError::TooShort { need: 12, .. })
        ));
    }

    #[test]
    fn test_read_request_body() {
        let body = [0x82, 0x00, 0x64, 0x00, 0x00, 0x02];
        let req = MemoryAreaReadRequest::parse(&body).unwrap();
        assert_eq!(req.area_code, AreaCode::DM);
        assert_eq!(req.address, 100);
        assert_eq!(req.bit_address, 0);
        assert_eq!(req.count, 2);
    }

    #[test]
    fn test_write_request_body() {
        let body = [0x82, 0x00, 0x64, 0x00, 0x00, 0x02, 0x12, 0x34, 0x56, 0x78];
        let req = MemoryAreaWriteRequest::parse(&body).unwrap();
        assert_eq!(req.count, 2);
        assert_eq!(req.words(), vec![0x1234, 0x5678]);
    }

    #[test]
    fn test_write_request_payload_must_match_count() {
        let body = [0x82, 0x00, 0x64, 0x00, 0x00, 0x02, 0x12, 0x34];
        assert!(matches!(
            MemoryAreaWriteRequest::parse(&body),
            Err(FrameError::TooShort { need: 10, .. })
        ));
    }

    #[test]
    fn test_read_response_body_layout() {
        let header = CommandHeader {
            icf: 0x80,
            rsv: 0,
            gct: 2,
            dna: 0,
            da1: 1,
            da2: 0,
            sna: 0,
            sa1: 2,
            sa2: 0,
            sid: 5,
        };
        let frame = build_read_response(
            &header,
            Command::MEMORY_AREA_READ,
            EndCode::NORMAL,
            &[0x1234, 0x5678],
        );
        assert_eq!(frame.body, vec![0x00, 0x00, 0x12, 0x34, 0x56, 0x78]);

        let bytes = frame.to_tcp_bytes();
        let outer = TcpHeader::parse(&bytes).unwrap();
        assert_eq!(outer.command, tcp_command::FRAME_SEND);
        assert_eq!(outer.length as usize, bytes.len() - TCP_HEADER_SIZE);
    }

    #[test]
    fn test_node_address_handshake_scenario() {
        // S4: client node 2, server node 1.
        let request = [
            0x46, 0x49, 0x4E, 0x53, 0x00, 0x00, 0x00, 0x0C, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x02,
        ];
        let header = TcpHeader::parse(&request).unwrap();
        assert!(header.is_node_address_request());
        assert_eq!(header.length, 12);
        assert_eq!(header.payload_len(), 4);
        assert_eq!(header.frame_len(), request.len());

        let client = parse_node_address_request(&request[TCP_HEADER_SIZE..]).unwrap();
        assert_eq!(client, 2);

        let response = build_node_address_response(client, 1);
        assert_eq!(
            response,
            vec![
                0x46, 0x49, 0x4E, 0x53, 0x00, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00, 0x02, 0x00,
                0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x01,
            ]
        );
    }
}
