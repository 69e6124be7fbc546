// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The shared datastore abstraction.
//!
//! A datastore is a set of named memory areas, each a contiguous run of
//! bits or 16-bit words. Protocol servers, the scripting layer and the UI
//! all go through the same [`DataStore`] trait object, so none of them need
//! to know which protocol's memory model is currently active.
//!
//! # Semantics
//!
//! - Every access names `(area, address, count)`; out-of-range accesses are
//!   rejected atomically before any cell is touched.
//! - Multi-element reads and writes are atomic with respect to other
//!   datastore operations on the same area.
//! - [`DataStore::snapshot`] deep-copies every area;
//!   [`DataStore::restore`] copies at most `min(given, existing)` elements
//!   per area and ignores unknown ids.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

// =============================================================================
// MemoryArea
// =============================================================================

/// Descriptor of one named region in a datastore.
///
/// The id is stable and unique within a datastore instance; the size is
/// fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryArea {
    /// Stable identifier, e.g. `coils` or `DM`.
    pub id: String,
    /// Human-readable label.
    pub display_name: String,
    /// `true` for bit-granular areas, `false` for word areas.
    pub is_bit: bool,
    /// Size in native units (bits or words).
    pub size: u32,
    /// `true` if the area rejects writes.
    pub read_only: bool,
}

impl MemoryArea {
    /// Creates a writable bit area.
    pub fn bits(id: impl Into<String>, display_name: impl Into<String>, size: u32) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            is_bit: true,
            size,
            read_only: false,
        }
    }

    /// Creates a writable word area.
    pub fn words(id: impl Into<String>, display_name: impl Into<String>, size: u32) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            is_bit: false,
            size,
            read_only: false,
        }
    }
}

// =============================================================================
// Snapshot payload
// =============================================================================

/// A deep copy of one area's contents.
///
/// Serializes as a bare JSON array (bools for bit areas, numbers for word
/// areas), which is the shape the external snapshot bridge exchanges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AreaImage {
    /// Contents of a bit area.
    Bits(Vec<bool>),
    /// Contents of a word area.
    Words(Vec<u16>),
}

impl AreaImage {
    /// Number of elements in the image.
    pub fn len(&self) -> usize {
        match self {
            AreaImage::Bits(v) => v.len(),
            AreaImage::Words(v) => v.len(),
        }
    }

    /// Returns `true` if the image holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Snapshot of a whole datastore, keyed by area id.
pub type AreaSnapshot = HashMap<String, AreaImage>;

/// Result alias for datastore operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// DataStore trait
// =============================================================================

/// Area-addressed memory bank with bit- and word-granular access.
///
/// Implementations guard their state with a reader-writer discipline:
/// concurrent readers, exclusive writers, and no lock held across transport
/// I/O. All methods are synchronous; the critical sections only copy memory.
pub trait DataStore: Send + Sync {
    /// Returns the ordered list of area descriptors.
    fn areas(&self) -> Vec<MemoryArea>;

    /// Reads a single bit.
    fn read_bit(&self, area: &str, address: u32) -> StoreResult<bool>;

    /// Writes a single bit.
    fn write_bit(&self, area: &str, address: u32, value: bool) -> StoreResult<()>;

    /// Reads `count` consecutive bits starting at `address`.
    fn read_bits(&self, area: &str, address: u32, count: u16) -> StoreResult<Vec<bool>>;

    /// Writes consecutive bits starting at `address`.
    fn write_bits(&self, area: &str, address: u32, values: &[bool]) -> StoreResult<()>;

    /// Reads a single 16-bit word.
    fn read_word(&self, area: &str, address: u32) -> StoreResult<u16>;

    /// Writes a single 16-bit word.
    fn write_word(&self, area: &str, address: u32, value: u16) -> StoreResult<()>;

    /// Reads `count` consecutive words starting at `address`.
    fn read_words(&self, area: &str, address: u32, count: u16) -> StoreResult<Vec<u16>>;

    /// Writes consecutive words starting at `address`.
    fn write_words(&self, area: &str, address: u32, values: &[u16]) -> StoreResult<()>;

    /// Returns a deep copy of every area, keyed by id.
    fn snapshot(&self) -> AreaSnapshot;

    /// Restores areas from a snapshot.
    ///
    /// Overlong arrays are truncated to the existing area size; unknown
    /// area ids and granularity-mismatched images are ignored.
    fn restore(&self, data: &AreaSnapshot);

    /// Zeroes every cell of every area.
    fn clear_all(&self);
}

/// Looks up an area descriptor by id.
pub fn area_by_id(store: &dyn DataStore, id: &str) -> Option<MemoryArea> {
    store.areas().into_iter().find(|a| a.id == id)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_image_serde_shape() {
        let bits = AreaImage::Bits(vec![true, false, true]);
        let json = serde_json::to_string(&bits).unwrap();
        assert_eq!(json, "[true,false,true]");

        let words = AreaImage::Words(vec![0x1234, 7]);
        let json = serde_json::to_string(&words).unwrap();
        assert_eq!(json, "[4660,7]");

        let back: AreaImage = serde_json::from_str("[1,2,3]").unwrap();
        assert_eq!(back, AreaImage::Words(vec![1, 2, 3]));
    }

    #[test]
    fn test_memory_area_constructors() {
        let area = MemoryArea::bits("coils", "Coils", 65536);
        assert!(area.is_bit);
        assert!(!area.read_only);
        assert_eq!(area.size, 65536);

        let area = MemoryArea::words("DM", "Data Memory", 32768);
        assert!(!area.is_bit);
    }
}
