// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Wire-frame builders for the integration suites.

use vplc_fins::frame::{encode_tcp_frame, tcp_command, CommandHeader, COMMAND_HEADER_SIZE};
use vplc_modbus::codec;

/// Builds a complete Modbus TCP frame: MBAP header + `UnitID | FC | payload`.
pub fn mbap_request(transaction: u16, unit: u8, pdu: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(7 + pdu.len());
    frame.extend_from_slice(&transaction.to_be_bytes());
    frame.extend_from_slice(&0u16.to_be_bytes());
    frame.extend_from_slice(&((pdu.len() + 1) as u16).to_be_bytes());
    frame.push(unit);
    frame.extend_from_slice(pdu);
    frame
}

/// Builds a complete RTU frame: ADU + CRC-16.
pub fn rtu_frame(adu: &[u8]) -> Vec<u8> {
    codec::append_crc(adu.to_vec())
}

/// Builds a bare FINS command frame (`header | MRC | SRC | body`) as sent
/// over UDP or inside the TCP framing.
pub fn fins_command_bytes(sid: u8, mrc: u8, src: u8, body: &[u8]) -> Vec<u8> {
    let header = CommandHeader {
        icf: 0x80,
        rsv: 0,
        gct: 0x02,
        dna: 0,
        da1: 1,
        da2: 0,
        sna: 0,
        sa1: 2,
        sa2: 0,
        sid,
    };
    let mut bytes = Vec::with_capacity(COMMAND_HEADER_SIZE + 2 + body.len());
    bytes.extend_from_slice(&header.to_bytes());
    bytes.push(mrc);
    bytes.push(src);
    bytes.extend_from_slice(body);
    bytes
}

/// Wraps a FINS command frame in the TCP framing header (frame-send).
pub fn fins_tcp_frame(command_bytes: &[u8]) -> Vec<u8> {
    encode_tcp_frame(tcp_command::FRAME_SEND, command_bytes)
}
