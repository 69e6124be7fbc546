// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Modbus ASCII framing.
//!
//! An ASCII frame is `: HEX(ADU || LRC) CR LF`: the same ADU as RTU with
//! the LRC replacing the CRC, hex-encoded in uppercase. Frames are capped
//! at 513 bytes on the wire.

use crate::codec;
use crate::error::FrameError;

/// Frame start byte `:`.
pub const FRAME_START: u8 = b':';
/// Carriage return.
pub const FRAME_CR: u8 = b'\r';
/// Line feed.
pub const FRAME_LF: u8 = b'\n';
/// Maximum on-wire frame length.
pub const MAX_ASCII_FRAME: usize = 513;

/// Smallest valid frame: `:` + UnitID(2) + FC(2) + LRC(2) + CR LF.
const MIN_ASCII_FRAME: usize = 9;

// =============================================================================
// Frame codec
// =============================================================================

/// Decodes a raw ASCII frame into the ADU it carries.
///
/// Verifies the start byte, CR LF terminator, hex payload and LRC; the
/// returned bytes exclude the LRC.
pub fn decode_frame(frame: &[u8]) -> Result<Vec<u8>, FrameError> {
    if frame.len() < MIN_ASCII_FRAME {
        return Err(FrameError::TooShort { len: frame.len() });
    }
    if frame[0] != FRAME_START {
        return Err(FrameError::InvalidStart { found: frame[0] });
    }
    if frame[frame.len() - 2] != FRAME_CR || frame[frame.len() - 1] != FRAME_LF {
        return Err(FrameError::InvalidTerminator);
    }

    let payload =
        codec::hex_decode(&frame[1..frame.len() - 2]).ok_or(FrameError::InvalidHex)?;
    if payload.len() < 3 {
        return Err(FrameError::TooShort { len: payload.len() });
    }

    let (adu, received_lrc) = payload.split_at(payload.len() - 1);
    if !codec::check_lrc(adu, received_lrc[0]) {
        return Err(FrameError::InvalidLrc);
    }

    Ok(adu.to_vec())
}

/// Encodes an ADU into an on-wire ASCII frame.
pub fn encode_frame(adu: &[u8]) -> Vec<u8> {
    let mut payload = adu.to_vec();
    payload.push(codec::lrc(adu));

    let hex = codec::hex_encode(&payload);
    let mut frame = Vec::with_capacity(hex.len() + 3);
    frame.push(FRAME_START);
    frame.extend_from_slice(&hex);
    frame.push(FRAME_CR);
    frame.push(FRAME_LF);
    frame
}

// =============================================================================
// AsciiFramer
// =============================================================================

/// Stateful byte-level framer.
///
/// Bytes before the `:` start character are skipped; the frame closes when
/// CR LF is observed. Exceeding [`MAX_ASCII_FRAME`] discards the frame and
/// reports an error.
#[derive(Debug, Default)]
pub struct AsciiFramer {
    buf: Vec<u8>,
    in_frame: bool,
}

impl AsciiFramer {
    /// Creates an idle framer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one byte; returns a complete raw frame or an error.
    pub fn push(&mut self, byte: u8) -> Option<Result<Vec<u8>, FrameError>> {
        if !self.in_frame {
            if byte == FRAME_START {
                self.in_frame = true;
                self.buf.clear();
                self.buf.push(byte);
            }
            return None;
        }

        self.buf.push(byte);

        if self.buf.len() >= 2
            && self.buf[self.buf.len() - 2] == FRAME_CR
            && self.buf[self.buf.len() - 1] == FRAME_LF
        {
            self.in_frame = false;
            return Some(Ok(std::mem::take(&mut self.buf)));
        }

        if self.buf.len() >= MAX_ASCII_FRAME {
            let len = self.buf.len();
            self.reset();
            return Some(Err(FrameError::TooLong { len }));
        }

        None
    }

    /// Returns `true` while a frame is mid-construction.
    pub fn in_frame(&self) -> bool {
        self.in_frame
    }

    /// Discards any frame in progress.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.in_frame = false;
    }
}

// =============================================================================
// Tests
// =============================================================================
