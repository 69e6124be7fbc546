// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! FINS datastore.
//!
//! Seven word areas (CIO, WR, HR, AR, DM, TIM, CNT). Bit access is
//! synthesized over the same words: bit index `i` addresses bit `i % 16`
//! of word `i / 16`, and a bit write read-modify-writes only that bit
//! while the rest of the word is preserved atomically.

use std::collections::HashMap;

use parking_lot::RwLock;

use vplc_core::error::StoreError;
use vplc_core::store::{AreaImage, AreaSnapshot, DataStore, MemoryArea, StoreResult};

use crate::memory::{
    AREA_AR, AREA_CIO, AREA_CNT, AREA_DM, AREA_HR, AREA_TIM, AREA_WR, DEFAULT_AR_SIZE,
    DEFAULT_CIO_SIZE, DEFAULT_CNT_SIZE, DEFAULT_DM_SIZE, DEFAULT_HR_SIZE, DEFAULT_TIM_SIZE,
    DEFAULT_WR_SIZE,
};

/// Fixed area ordering used by listings and snapshots.
const AREA_ORDER: [(&str, &str); 7] = [
    (AREA_CIO, "CIO Area"),
    (AREA_WR, "Work Area"),
    (AREA_HR, "Holding Area"),
    (AREA_AR, "Auxiliary Area"),
    (AREA_DM, "Data Memory"),
    (AREA_TIM, "Timer"),
    (AREA_CNT, "Counter"),
];

// =============================================================================
// FinsDataStore
// =============================================================================

/// Concurrent FINS word-area bank with synthesized bit access.
pub struct FinsDataStore {
    areas: RwLock<HashMap<String, Vec<u16>>>,
}

impl FinsDataStore {
    /// Creates a store with the standard area sizes.
    pub fn new() -> Self {
        Self::with_sizes(
            DEFAULT_CIO_SIZE,
            DEFAULT_WR_SIZE,
            DEFAULT_HR_SIZE,
            DEFAULT_AR_SIZE,
            DEFAULT_DM_SIZE,
            DEFAULT_TIM_SIZE,
            DEFAULT_CNT_SIZE,
        )
    }

    /// Creates a store with explicit word counts per area.
    #[allow(clippy::too_many_arguments)]
    pub fn with_sizes(cio: u32, wr: u32, hr: u32, ar: u32, dm: u32, tim: u32, cnt: u32) -> Self {
        let mut areas = HashMap::new();
        for (id, size) in [
            (AREA_CIO, cio),
            (AREA_WR, wr),
            (AREA_HR, hr),
            (AREA_AR, ar),
            (AREA_DM, dm),
            (AREA_TIM, tim),
            (AREA_CNT, cnt),
        ] {
            areas.insert(id.to_string(), vec![0u16; size as usize]);
        }
        Self {
            areas: RwLock::new(areas),
        }
    }

    fn bit_position(address: u32) -> (usize, u32) {
        ((address / 16) as usize, address % 16)
    }
}

impl Default for FinsDataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DataStore for FinsDataStore {
    fn areas(&self) -> Vec<MemoryArea> {
        let areas = self.areas.read();
        AREA_ORDER
            .iter()
            .filter_map(|(id, label)| {
                areas
                    .get(*id)
                    .map(|words| MemoryArea::words(*id, *label, words.len() as u32))
            })
            .collect()
    }

    fn read_bit(&self, area: &str, address: u32) -> StoreResult<bool> {
        let areas = self.areas.read();
        let words = areas
            .get(area)
            .ok_or_else(|| StoreError::area_not_found(area))?;
        let (word_addr, bit) = Self::bit_position(address);
        let word = words
            .get(word_addr)
            .ok_or_else(|| StoreError::out_of_range(area, address, 1, words.len() as u32 * 16))?;
        Ok(word & (1 << bit) != 0)
    }

    fn write_bit(&self, area: &str, address: u32, value: bool) -> StoreResult<()> {
        let mut areas = self.areas.write();
        let words = areas
            .get_mut(area)
            .ok_or_else(|| StoreError::area_not_found(area))?;
        let size_bits = words.len() as u32 * 16;
        let (word_addr, bit) = Self::bit_position(address);
        let word = words
            .get_mut(word_addr)
            .ok_or_else(|| StoreError::out_of_range(area, address, 1, size_bits))?;
        if value {
            *word |= 1 << bit;
        } else {
            *word &= !(1 << bit);
        }
        Ok(())
    }

    fn read_bits(&self, area: &str, address: u32, count: u16) -> StoreResult<Vec<bool>> {
        let areas = self.areas.read();
        let words = areas
            .get(area)
            .ok_or_else(|| StoreError::area_not_found(area))?;
        let size_bits = words.len() as u32 * 16;
        let end = address.saturating_add(u32::from(count));
        if end > size_bits {
            return Err(StoreError::out_of_range(area, address, count, size_bits));
        }
        Ok((address..end)
            .map(|bit_addr| {
                let (word_addr, bit) = Self::bit_position(bit_addr);
                words[word_addr] & (1 << bit) != 0
            })
            .collect())
    }

    fn write_bits(&self, area: &str, address: u32, values: &[bool]) -> StoreResult<()> {
        let mut areas = self.areas.write();
        let words = areas
            .get_mut(area)
            .ok_or_else(|| StoreError::area_not_found(area))?;
        let size_bits = words.len() as u32 * 16;
        let end = address.saturating_add(values.len() as u32);
        if end > size_bits {
            return Err(StoreError::out_of_range(
                area,
                address,
                values.len() as u16,
                size_bits,
            ));
        }
        for (offset, &value) in values.iter().enumerate() {
            let (word_addr, bit) = Self::bit_position(address + offset as u32);
            if value {
                words[word_addr] |= 1 << bit;
            } else {
                words[word_addr] &= !(1 << bit);
            }
        }
        Ok(())
    }

    fn read_word(&self, area: &str, address: u32) -> StoreResult<u16> {
        let areas = self.areas.read();
        let words = areas
            .get(area)
            .ok_or_else(|| StoreError::area_not_found(area))?;
        words
            .get(address as usize)
            .copied()
            .ok_or_else(|| StoreError::out_of_range(area, address, 1, words.len() as u32))
    }

    fn write_word(&self, area: &str, address: u32, value: u16) -> StoreResult<()> {
        let mut areas = self.areas.write();
        let words = areas
            .get_mut(area)
            .ok_or_else(|| StoreError::area_not_found(area))?;
        let size = words.len() as u32;
        let slot = words
            .get_mut(address as usize)
            .ok_or_else(|| StoreError::out_of_range(area, address, 1, size))?;
        *slot = value;
        Ok(())
    }

    fn read_words(&self, area: &str, address: u32, count: u16) -> StoreResult<Vec<u16>> {
        let areas = self.areas.read();
        let words = areas
            .get(area)
            .ok_or_else(|| StoreError::area_not_found(area))?;
        let start = address as usize;
        let end = start.saturating_add(usize::from(count));
        if end > words.len() {
            return Err(StoreError::out_of_range(
                area,
                address,
                count,
                words.len() as u32,
            ));
        }
        Ok(words[start..end].to_vec())
    }

    fn write_words(&self, area: &str, address: u32, values: &[u16]) -> StoreResult<()> {
        let mut areas = self.areas.write();
        let words = areas
            .get_mut(area)
            .ok_or_else(|| StoreError::area_not_found(area))?;
        let start = address as usize;
        let end = start.saturating_add(values.len());
        if end > words.len() {
            return Err(StoreError::out_of_range(
                area,
                address,
                values.len() as u16,
                words.len() as u32,
            ));
        }
        words[start..end].copy_from_slice(values);
        Ok(())
    }

    fn snapshot(&self) -> AreaSnapshot {
        let areas = self.areas.read();
        areas
            .iter()
            .map(|(id, words)| (id.clone(), AreaImage::Words(words.clone())))
            .collect()
    }

    fn restore(&self, data: &AreaSnapshot) {
        let mut areas = self.areas.write();
        for (id, image) in data {
            let AreaImage::Words(given) = image else {
                continue;
            };
            if let Some(existing) = areas.get_mut(id) {
                let count = given.len().min(existing.len());
                existing[..count].copy_from_slice(&given[..count]);
            }
        }
    }

    fn clear_all(&self) {
        let mut areas = self.areas.write();
        for words in areas.values_mut() {
            words.fill(0);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
