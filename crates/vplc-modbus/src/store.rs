// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Modbus datastore.
//!
//! Four areas, each 65 536 elements by default: two bit areas (`coils`,
//! `discreteInputs`) and two word areas (`holdingRegisters`,
//! `inputRegisters`). The simulator keeps all four writable through the
//! control surface; the wire protocol has no write function codes that
//! target the input areas, so external clients cannot mutate them.

use parking_lot::RwLock;

use vplc_core::error::StoreError;
use vplc_core::store::{AreaImage, AreaSnapshot, DataStore, MemoryArea, StoreResult};

/// Area id of the coil bank.
pub const AREA_COILS: &str = "coils";
/// Area id of the discrete input bank.
pub const AREA_DISCRETE_INPUTS: &str = "discreteInputs";
/// Area id of the holding register bank.
pub const AREA_HOLDING_REGISTERS: &str = "holdingRegisters";
/// Area id of the input register bank.
pub const AREA_INPUT_REGISTERS: &str = "inputRegisters";

/// Default size of every Modbus area.
pub const DEFAULT_AREA_SIZE: u32 = 65_536;

// =============================================================================
// ModbusDataStore
// =============================================================================

struct Banks {
    coils: Vec<bool>,
    discrete_inputs: Vec<bool>,
    holding_registers: Vec<u16>,
    input_registers: Vec<u16>,
}

/// Concurrent Modbus register bank.
///
/// One reader-writer lock guards all four areas; multi-element accesses
/// are atomic as a whole against other operations.
pub struct ModbusDataStore {
    banks: RwLock<Banks>,
}

impl ModbusDataStore {
    /// Creates a store with the default 65 536-element areas.
    pub fn new() -> Self {
        Self::with_sizes(
            DEFAULT_AREA_SIZE,
            DEFAULT_AREA_SIZE,
            DEFAULT_AREA_SIZE,
            DEFAULT_AREA_SIZE,
        )
    }

    /// Creates a store with explicit area sizes.
    pub fn with_sizes(coils: u32, discrete_inputs: u32, holding: u32, input: u32) -> Self {
        Self {
            banks: RwLock::new(Banks {
                coils: vec![false; coils as usize],
                discrete_inputs: vec![false; discrete_inputs as usize],
                holding_registers: vec![0; holding as usize],
                input_registers: vec![0; input as usize],
            }),
        }
    }

    fn check_range(area: &str, len: usize, address: u32, count: u16) -> StoreResult<usize> {
        let start = address as usize;
        let end = start.saturating_add(usize::from(count));
        if end > len {
            return Err(StoreError::out_of_range(area, address, count, len as u32));
        }
        Ok(start)
    }

    fn word_mismatch(area: &str) -> StoreError {
        StoreError::type_mismatch(area, "bit access on a word area")
    }

    fn bit_mismatch(area: &str) -> StoreError {
        StoreError::type_mismatch(area, "word access on a bit area")
    }
}

impl Default for ModbusDataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DataStore for ModbusDataStore {
    fn areas(&self) -> Vec<MemoryArea> {
        let banks = self.banks.read();
        vec![
            MemoryArea::bits(AREA_COILS, "Coils", banks.coils.len() as u32),
            MemoryArea::bits(
                AREA_DISCRETE_INPUTS,
                "Discrete Inputs",
                banks.discrete_inputs.len() as u32,
            ),
            MemoryArea::words(
                AREA_HOLDING_REGISTERS,
                "Holding Registers",
                banks.holding_registers.len() as u32,
            ),
            MemoryArea::words(
                AREA_INPUT_REGISTERS,
                "Input Registers",
                banks.input_registers.len() as u32,
            ),
        ]
    }

    fn read_bit(&self, area: &str, address: u32) -> StoreResult<bool> {
        Ok(self.read_bits(area, address, 1)?[0])
    }

    fn write_bit(&self, area: &str, address: u32, value: bool) -> StoreResult<()> {
        self.write_bits(area, address, &[value])
    }

    fn read_bits(&self, area: &str, address: u32, count: u16) -> StoreResult<Vec<bool>> {
        let banks = self.banks.read();
        let bank = match area {
            AREA_COILS => &banks.coils,
            AREA_DISCRETE_INPUTS => &banks.discrete_inputs,
            AREA_HOLDING_REGISTERS | AREA_INPUT_REGISTERS => {
                return Err(Self::word_mismatch(area))
            }
            _ => return Err(StoreError::area_not_found(area)),
        };
        let start = Self::check_range(area, bank.len(), address, count)?;
        Ok(bank[start..start + usize::from(count)].to_vec())
    }

    fn write_bits(&self, area: &str, address: u32, values: &[bool]) -> StoreResult<()> {
        let mut banks = self.banks.write();
        let bank = match area {
            AREA_COILS => &mut banks.coils,
            AREA_DISCRETE_INPUTS => &mut banks.discrete_inputs,
            AREA_HOLDING_REGISTERS | AREA_INPUT_REGISTERS => {
                return Err(Self::word_mismatch(area))
            }
            _ => return Err(StoreError::area_not_found(area)),
        };
        let start = Self::check_range(area, bank.len(), address, values.len() as u16)?;
        bank[start..start + values.len()].copy_from_slice(values);
        Ok(())
    }

    fn read_word(&self, area: &str, address: u32) -> StoreResult<u16> {
        Ok(self.read_words(area, address, 1)?[0])
    }

    fn write_word(&self, area: &str, address: u32, value: u16) -> StoreResult<()> {
        self.write_words(area, address, &[value])
    }

    fn read_words(&self, area: &str, address: u32, count: u16) -> StoreResult<Vec<u16>> {
        let banks = self.banks.read();
        let bank = match area {
            AREA_HOLDING_REGISTERS => &banks.holding_registers,
            AREA_INPUT_REGISTERS => &banks.input_registers,
            AREA_COILS | AREA_DISCRETE_INPUTS => return Err(Self::bit_mismatch(area)),
            _ => return Err(StoreError::area_not_found(area)),
        };
        let start = Self::check_range(area, bank.len(), address, count)?;
        Ok(bank[start..start + usize::from(count)].to_vec())
    }

    fn write_words(&self, area: &str, address: u32, values: &[u16]) -> StoreResult<()> {
        let mut banks = self.banks.write();
        let bank = match area {
            AREA_HOLDING_REGISTERS => &mut banks.holding_registers,
            AREA_INPUT_REGISTERS => &mut banks.input_registers,
            AREA_COILS | AREA_DISCRETE_INPUTS => return Err(Self::bit_mismatch(area)),
            _ => return Err(StoreError::area_not_found(area)),
        };
        let start = Self::check_range(area, bank.len(), address, values.len() as u16)?;
        bank[start..start + values.len()].copy_from_slice(values);
        Ok(())
    }

    fn snapshot(&self) -> AreaSnapshot {
        let banks = self.banks.read();
        let mut snapshot = AreaSnapshot::new();
        snapshot.insert(AREA_COILS.to_string(), AreaImage::Bits(banks.coils.clone()));
        snapshot.insert(
            AREA_DISCRETE_INPUTS.to_string(),
            AreaImage::Bits(banks.discrete_inputs.clone()),
        );
        snapshot.insert(
            AREA_HOLDING_REGISTERS.to_string(),
            AreaImage::Words(banks.holding_registers.clone()),
        );
        snapshot.insert(
            AREA_INPUT_REGISTERS.to_string(),
            AreaImage::Words(banks.input_registers.clone()),
        );
        snapshot
    }

    fn restore(&self, data: &AreaSnapshot) {
        let mut banks = self.banks.write();
        for (id, image) in data {
            match (id.as_str(), image) {
                (AREA_COILS, AreaImage::Bits(bits)) => copy_truncated(&mut banks.coils, bits),
                (AREA_DISCRETE_INPUTS, AreaImage::Bits(bits)) => {
                    copy_truncated(&mut banks.discrete_inputs, bits)
                }
                (AREA_HOLDING_REGISTERS, AreaImage::Words(words)) => {
                    copy_truncated(&mut banks.holding_registers, words)
                }
                (AREA_INPUT_REGISTERS, AreaImage::Words(words)) => {
                    copy_truncated(&mut banks.input_registers, words)
                }
                // Unknown ids and granularity mismatches are ignored.
                _ => {}
            }
        }
    }

    fn clear_all(&self) {
        let mut banks = self.banks.write();
        banks.coils.fill(false);
        banks.discrete_inputs.fill(false);
        banks.holding_registers.fill(0);
        banks.input_registers.fill(0);
    }
}

fn copy_truncated<T: Copy>(existing: &mut [T], given: &[T]) {
    let count = given.len().min(existing.len());
    existing[..count].copy_from_slice(&given[..count]);
}

// =============================================================================
// Tests
// =============================================================================
