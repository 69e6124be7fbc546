// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! FINS command dispatch.
//!
//! The handler resolves the area code, delegates to the datastore and maps
//! failures to end codes: unknown area → 0x1101, out-of-range → 0x1103,
//! malformed body → 0x1004, unknown command → 0x0401. The node-address
//! request is always answered with the configured node; FINS has no UnitID
//! concept, so nothing is filtered.

use std::sync::Arc;

use tracing::debug;

use vplc_core::store::DataStore;

use crate::error::EndCode;
use crate::frame::{
    self, Command, CommandFrame, MemoryAreaReadRequest, MemoryAreaWriteRequest,
};

// =============================================================================
// FinsHandler
// =============================================================================

/// Processes FINS command frames against the datastore.
pub struct FinsHandler {
    store: Arc<dyn DataStore>,
    node_address: u8,
}

impl FinsHandler {
    /// Creates a handler answering as the given node.
    pub fn new(store: Arc<dyn DataStore>, node_address: u8) -> Self {
        Self {
            store,
            node_address,
        }
    }

    /// The configured node address.
    pub fn node_address(&self) -> u8 {
        self.node_address
    }

    /// Handles a command frame, producing the response frame.
    pub fn handle_command(&self, frame: &CommandFrame) -> CommandFrame {
        match frame.command {
            Command::MEMORY_AREA_READ => self.memory_area_read(frame),
            Command::MEMORY_AREA_WRITE => self.memory_area_write(frame),
            other => {
                debug!(code = other.code(), "Unknown FINS command");
                frame::build_read_response(
                    &frame.header,
                    other,
                    EndCode::COMMAND_NOT_SUPPORTED,
                    &[],
                )
            }
        }
    }

    /// Handles the FINS/TCP node-address request body.
    ///
    /// Returns the complete response frame, or `None` when the body is
    /// malformed.
    pub fn handle_node_address_request(&self, body: &[u8]) -> Option<Vec<u8>> {
        match frame::parse_node_address_request(body) {
            Ok(client_node) => {
                debug!(
                    client_node,
                    server_node = self.node_address,
                    "FINS node-address handshake"
                );
                Some(frame::build_node_address_response(
                    client_node,
                    self.node_address,
                ))
            }
            Err(e) => {
                debug!(error = %e, "Malformed node-address request");
                None
            }
        }
    }

    fn memory_area_read(&self, frame: &CommandFrame) -> CommandFrame {
        let request = match MemoryAreaReadRequest::parse(&frame.body) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "Malformed memory-area read");
                return self.error_response(frame, EndCode::COMMAND_FORMAT);
            }
        };

        let Some(area) = request.area_code.area_id() else {
            debug!(code = request.area_code.0, "Unknown FINS area code");
            return self.error_response(frame, EndCode::AREA_CLASS);
        };

        match self
            .store
            .read_words(area, u32::from(request.address), request.count)
        {
            Ok(words) => {
                debug!(area, address = request.address, count = request.count, "FINS read");
                frame::build_read_response(&frame.header, frame.command, EndCode::NORMAL, &words)
            }
            Err(e) => {
                debug!(area, error = %e, "FINS read out of range");
                self.error_response(frame, EndCode::ADDRESS_RANGE)
            }
        }
    }

    fn memory_area_write(&self, frame: &CommandFrame) -> CommandFrame {
        let request = match MemoryAreaWriteRequest::parse(&frame.body) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "Malformed memory-area write");
                return self.error_response(frame, EndCode::COMMAND_FORMAT);
            }
        };

        let Some(area) = request.area_code.area_id() else {
            debug!(code = request.area_code.0, "Unknown FINS area code");
            return self.error_response(frame, EndCode::AREA_CLASS);
        };

        match self
            .store
            .write_words(area, u32::from(request.address), &request.words())
        {
            Ok(()) => {
                debug!(area, address = request.address, count = request.count, "FINS write");
                frame::build_write_response(&frame.header, frame.command, EndCode::NORMAL)
            }
            Err(e) => {
                debug!(area, error = %e, "FINS write out of range");
                self.error_response(frame, EndCode::ADDRESS_RANGE)
            }
        }
    }

    fn error_response(&self, frame: &CommandFrame, end_code: EndCode) -> CommandFrame {
        frame::build_read_response(&frame.header, frame.command, end_code, &[])
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::CommandHeader;
    use crate::store::FinsDataStore;

    fn handler() -> FinsHandler {
        FinsHandler::new(Arc::new(FinsDataStore::new()), 1)
    }

    fn request_header() -> CommandHeader {
        CommandHeader {
            icf: 0x80,
            rsv: 0,
            gct: 0x02,
            dna: 0,
            da1: 1,
            da2: 0,
            sna: 0,
            sa1: 2,
            sa2: 0,
            sid: 0x2A,
        }
    }

    fn command_frame(command: Command, body: Vec<u8>) -> CommandFrame {
        CommandFrame {
            header: request_header(),
            command,
            body,
        }
    }

    #[test]
    fn test_write_then_read_dm() {
        let h = handler();

        // S5: write DM[100..=101] = {0x1234, 0x5678}.
        let write = command_frame(
            Command::MEMORY_AREA_WRITE,
            vec![0x82, 0x00, 0x64, 0x00, 0x00, 0x02, 0x12, 0x34, 0x56, 0x78],
        );
        let response = h.handle_command(&write);
        assert_eq!(response.body, vec![0x00, 0x00]);
        assert!(!response.header.is_request());
        assert_eq!(response.header.sid, 0x2A);
        // Address triples swapped.
        assert_eq!(response.header.da1, 2);
        assert_eq!(response.header.sa1, 1);

        // Read 2 words back from DM/100.
        let read = command_frame(
            Command::MEMORY_AREA_READ,
            vec![0x82, 0x00, 0x64, 0x00, 0x00, 0x02],
        );
        let response = h.handle_command(&read);
        assert_eq!(response.body, vec![0x00, 0x00, 0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn test_unknown_area_code() {
        let h = handler();
        let read = command_frame(
            Command::MEMORY_AREA_READ,
            vec![0xEE, 0x00, 0x00, 0x00, 0x00, 0x01],
        );
        let response = h.handle_command(&read);
        assert_eq!(response.body, EndCode::AREA_CLASS.to_bytes().to_vec());
    }

    #[test]
    fn test_address_range_error() {
        let h = handler();
        // DM is 32768 words; read past the end.
        let read = command_frame(
            Command::MEMORY_AREA_READ,
            vec![0x82, 0x7F, 0xFF, 0x00, 0x00, 0x02],
        );
        let response = h.handle_command(&read);
        assert_eq!(response.body, EndCode::ADDRESS_RANGE.to_bytes().to_vec());
    }

    #[test]
    fn test_malformed_body_is_format_error() {
        let h = handler();
        let read = command_frame(Command::MEMORY_AREA_READ, vec![0x82, 0x00]);
        let response = h.handle_command(&read);
        assert_eq!(response.body, EndCode::COMMAND_FORMAT.to_bytes().to_vec());
    }

    #[test]
    fn test_unknown_command_code() {
        let h = handler();
        let frame = command_frame(Command { mrc: 0x04, src: 0x01 }, Vec::new());
        let response = h.handle_command(&frame);
        assert_eq!(
            response.body,
            EndCode::COMMAND_NOT_SUPPORTED.to_bytes().to_vec()
        );
        assert_eq!(response.command, frame.command);
    }

    #[test]
    fn test_node_address_request() {
        let h = handler();
        let response = h.handle_node_address_request(&[0, 0, 0, 2]).unwrap();
        assert_eq!(response, frame::build_node_address_response(2, 1));
        assert!(h.handle_node_address_request(&[0, 0]).is_none());
    }

    #[test]
    fn test_tim_reachable_cnt_not() {
        let h = handler();
        let read = command_frame(
            Command::MEMORY_AREA_READ,
            vec![0x09, 0x00, 0x00, 0x00, 0x00, 0x01],
        );
        let response = h.handle_command(&read);
        // Code 0x09 resolves to TIM.
        assert_eq!(response.body, vec![0x00, 0x00, 0x00, 0x00]);

        // CNT is still reachable through the datastore directly.
        h.store.write_word(crate::memory::AREA_CNT, 0, 7).unwrap();
        assert_eq!(h.store.read_word(crate::memory::AREA_CNT, 0).unwrap(), 7);
    }
}
