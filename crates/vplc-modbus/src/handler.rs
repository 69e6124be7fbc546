// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Request dispatch.
//!
//! One handler serves every Modbus transport at the PDU level. The fixed
//! function-code → area mapping is:
//!
//! | FC | Area |
//! |----|------|
//! | 01, 05, 15 | `coils` |
//! | 02 | `discreteInputs` |
//! | 03, 06, 16 | `holdingRegisters` |
//! | 04 | `inputRegisters` |
//!
//! Datastore errors map to exceptions: out-of-range → 0x02, malformed
//! values → 0x03, anything else → 0x04.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use vplc_core::error::StoreError;
use vplc_core::store::DataStore;

use crate::codec;
use crate::error::ExceptionCode;
use crate::frame::{self, function, Request};
use crate::store::{
    AREA_COILS, AREA_DISCRETE_INPUTS, AREA_HOLDING_REGISTERS, AREA_INPUT_REGISTERS,
};

// =============================================================================
// DisabledUnitPolicy
// =============================================================================

/// What to do with a request addressed to a disabled UnitID.
///
/// Serial buses stay silent (another device might own the address); TCP
/// answers with exception 0x01 so the client is not left waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisabledUnitPolicy {
    /// Emit nothing.
    Drop,
    /// Answer with exception 0x01.
    Exception,
}

// =============================================================================
// ModbusHandler
// =============================================================================

/// PDU-level request processor shared by all transports.
pub struct ModbusHandler {
    store: Arc<dyn DataStore>,
    disabled_units: Mutex<HashSet<u8>>,
}

impl ModbusHandler {
    /// Creates a handler over the given datastore.
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self {
            store,
            disabled_units: Mutex::new(HashSet::new()),
        }
    }

    // =========================================================================
    // UnitID filter
    // =========================================================================

    /// Enables or disables answering for a UnitID.
    pub fn set_unit_enabled(&self, unit: u8, enabled: bool) {
        let mut disabled = self.disabled_units.lock();
        if enabled {
            disabled.remove(&unit);
        } else {
            disabled.insert(unit);
        }
    }

    /// Returns whether a UnitID is answered.
    pub fn is_unit_enabled(&self, unit: u8) -> bool {
        !self.disabled_units.lock().contains(&unit)
    }

    /// Lists the disabled UnitIDs in ascending order.
    pub fn disabled_units(&self) -> Vec<u8> {
        let mut units: Vec<u8> = self.disabled_units.lock().iter().copied().collect();
        units.sort_unstable();
        units
    }

    /// Replaces the disabled UnitID set.
    pub fn set_disabled_units(&self, units: &[u8]) {
        *self.disabled_units.lock() = units.iter().copied().collect();
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Processes a request and builds the response ADU.
    ///
    /// Returns `None` when nothing must be emitted (disabled UnitID under
    /// [`DisabledUnitPolicy::Drop`]).
    pub fn process(&self, req: &Request, policy: DisabledUnitPolicy) -> Option<Vec<u8>> {
        if !self.is_unit_enabled(req.unit_id) {
            return match policy {
                DisabledUnitPolicy::Drop => None,
                DisabledUnitPolicy::Exception => Some(frame::build_exception(
                    req.unit_id,
                    req.function,
                    ExceptionCode::IllegalFunction,
                )),
            };
        }

        let adu = match req.function {
            function::READ_COILS => self.read_bits(req, AREA_COILS),
            function::READ_DISCRETE_INPUTS => self.read_bits(req, AREA_DISCRETE_INPUTS),
            function::READ_HOLDING_REGISTERS => self.read_words(req, AREA_HOLDING_REGISTERS),
            function::READ_INPUT_REGISTERS => self.read_words(req, AREA_INPUT_REGISTERS),
            function::WRITE_SINGLE_COIL => self.write_single_coil(req),
            function::WRITE_SINGLE_REGISTER => self.write_single_register(req),
            function::WRITE_MULTIPLE_COILS => self.write_multiple_coils(req),
            function::WRITE_MULTIPLE_REGISTERS => self.write_multiple_registers(req),
            _ => frame::build_exception(req.unit_id, req.function, ExceptionCode::IllegalFunction),
        };
        Some(adu)
    }

    fn read_bits(&self, req: &Request, area: &str) -> Vec<u8> {
        match self.store.read_bits(area, u32::from(req.address), req.quantity) {
            Ok(values) => frame::build_read_bits_response(req.unit_id, req.function, &values),
            Err(err) => self.exception(req, err),
        }
    }

    fn read_words(&self, req: &Request, area: &str) -> Vec<u8> {
        match self.store.read_words(area, u32::from(req.address), req.quantity) {
            Ok(values) => frame::build_read_words_response(req.unit_id, req.function, &values),
            Err(err) => self.exception(req, err),
        }
    }

    fn write_single_coil(&self, req: &Request) -> Vec<u8> {
        if req.data.len() < 2 {
            return frame::build_exception(
                req.unit_id,
                req.function,
                ExceptionCode::IllegalDataValue,
            );
        }
        let raw = codec::read_u16(&req.data, 0);
        let value = match raw {
            0xFF00 => true,
            0x0000 => false,
            _ => {
                return frame::build_exception(
                    req.unit_id,
                    req.function,
                    ExceptionCode::IllegalDataValue,
                )
            }
        };
        match self.store.write_bit(AREA_COILS, u32::from(req.address), value) {
            Ok(()) => frame::build_write_single_response(req.unit_id, req.function, req.address, raw),
            Err(err) => self.exception(req, err),
        }
    }

    fn write_single_register(&self, req: &Request) -> Vec<u8> {
        if req.data.len() < 2 {
            return frame::build_exception(
                req.unit_id,
                req.function,
                ExceptionCode::IllegalDataValue,
            );
        }
        let value = codec::read_u16(&req.data, 0);
        match self
            .store
            .write_word(AREA_HOLDING_REGISTERS, u32::from(req.address), value)
        {
            Ok(()) => {
                frame::build_write_single_response(req.unit_id, req.function, req.address, value)
            }
            Err(err) => self.exception(req, err),
        }
    }

    fn write_multiple_coils(&self, req: &Request) -> Vec<u8> {
        let expected = usize::from(req.quantity).div_ceil(8);
        if req.data.len() != expected {
            return frame::build_exception(
                req.unit_id,
                req.function,
                ExceptionCode::IllegalDataValue,
            );
        }
        let values = codec::unpack_bits(&req.data, usize::from(req.quantity));
        match self.store.write_bits(AREA_COILS, u32::from(req.address), &values) {
            Ok(()) => frame::build_write_multiple_response(
                req.unit_id,
                req.function,
                req.address,
                req.quantity,
            ),
            Err(err) => self.exception(req, err),
        }
    }

    fn write_multiple_registers(&self, req: &Request) -> Vec<u8> {
        if req.data.len() != usize::from(req.quantity) * 2 {
            return frame::build_exception(
                req.unit_id,
                req.function,
                ExceptionCode::IllegalDataValue,
            );
        }
        let values = codec::decode_words(&req.data);
        match self
            .store
            .write_words(AREA_HOLDING_REGISTERS, u32::from(req.address), &values)
        {
            Ok(()) => frame::build_write_multiple_response(
                req.unit_id,
                req.function,
                req.address,
                req.quantity,
            ),
            Err(err) => self.exception(req, err),
        }
    }

    fn exception(&self, req: &Request, err: StoreError) -> Vec<u8> {
        let code = match err {
            StoreError::AddressOutOfRange { .. } => ExceptionCode::IllegalDataAddress,
            StoreError::TypeMismatch { .. } => ExceptionCode::IllegalDataValue,
            _ => ExceptionCode::ServerDeviceFailure,
        };
        frame::build_exception(req.unit_id, req.function, code)
    }
}

// =============================================================================
// Tests
// =============================================================================
