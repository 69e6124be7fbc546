// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Datastore law and concurrency properties across both store types.

use std::sync::Arc;

use vplc_core::store::{AreaImage, DataStore};
use vplc_fins::FinsDataStore;
use vplc_modbus::{ModbusDataStore, AREA_COILS, AREA_HOLDING_REGISTERS};

fn stores() -> Vec<(&'static str, Arc<dyn DataStore>, &'static str)> {
    vec![
        ("modbus", Arc::new(ModbusDataStore::new()), AREA_HOLDING_REGISTERS),
        ("fins", Arc::new(FinsDataStore::new()), "DM"),
    ]
}

#[test]
fn test_word_write_read_law_all_stores() {
    for (name, store, area) in stores() {
        for (addr, value) in [(0u32, 1u16), (99, 0xFFFF), (500, 0x8001)] {
            store.write_word(area, addr, value).unwrap();
            assert_eq!(store.read_word(area, addr).unwrap(), value, "{name}");
        }
    }
}

#[test]
fn test_restore_snapshot_is_identity_all_stores() {
    for (name, store, area) in stores() {
        store.write_words(area, 10, &[1, 2, 3]).unwrap();
        let snapshot = store.snapshot();
        store.restore(&snapshot);
        assert_eq!(store.snapshot(), snapshot, "{name}");
    }
}

#[test]
fn test_fins_bit_write_preserves_sibling_bits() {
    let store = FinsDataStore::new();
    store.write_word("HR", 1, 0b1010_1010_1010_1010).unwrap();
    let baseline = store.read_word("HR", 1).unwrap();

    // Set then clear bit 21 (word 1, position 5; a zero bit in the baseline).
    store.write_bit("HR", 21, true).unwrap();
    assert_eq!(store.read_word("HR", 1).unwrap(), baseline | (1 << 5));
    store.write_bit("HR", 21, false).unwrap();
    assert_eq!(store.read_word("HR", 1).unwrap(), baseline);
}

#[test]
fn test_concurrent_distinct_writers_all_values_land() {
    let store = Arc::new(ModbusDataStore::new());
    let mut handles = Vec::new();

    for writer in 0..16u16 {
        let store = store.clone();
        handles.push(std::thread::spawn(move || {
            for i in 0..64u32 {
                let addr = u32::from(writer) * 64 + i;
                store
                    .write_word(AREA_HOLDING_REGISTERS, addr, writer * 1000 + i as u16)
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    for writer in 0..16u16 {
        for i in 0..64u32 {
            let addr = u32::from(writer) * 64 + i;
            assert_eq!(
                store.read_word(AREA_HOLDING_REGISTERS, addr).unwrap(),
                writer * 1000 + i as u16
            );
        }
    }
}

#[test]
fn test_overlapping_reads_never_observe_torn_writes() {
    // A writer alternates the whole range between two patterns; readers
    // must always observe one pattern, never a mix.
    let store = Arc::new(ModbusDataStore::new());
    const LEN: u16 = 64;
    store
        .write_words(AREA_HOLDING_REGISTERS, 0, &[0u16; LEN as usize])
        .unwrap();

    let writer = {
        let store = store.clone();
        std::thread::spawn(move || {
            for round in 0..500u16 {
                let value = if round % 2 == 0 { 0xAAAA } else { 0x5555 };
                store
                    .write_words(AREA_HOLDING_REGISTERS, 0, &[value; LEN as usize])
                    .unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            std::thread::spawn(move || {
                for _ in 0..500 {
                    let words = store.read_words(AREA_HOLDING_REGISTERS, 0, LEN).unwrap();
                    let first = words[0];
                    assert!(
                        words.iter().all(|&w| w == first),
                        "torn read observed: {words:?}"
                    );
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
}

#[test]
fn test_modbus_coils_concurrent_bit_writers() {
    let store = Arc::new(ModbusDataStore::new());
    let mut handles = Vec::new();
    for writer in 0..8u32 {
        let store = store.clone();
        handles.push(std::thread::spawn(move || {
            store.write_bit(AREA_COILS, writer * 7, true).unwrap();
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
    for writer in 0..8u32 {
        assert!(store.read_bit(AREA_COILS, writer * 7).unwrap());
    }
}

#[test]
fn test_snapshot_payload_json_shape() {
    let store = ModbusDataStore::with_sizes(4, 4, 4, 4);
    store.write_word(AREA_HOLDING_REGISTERS, 0, 7).unwrap();
    store.write_bit(AREA_COILS, 1, true).unwrap();

    let snapshot = store.snapshot();
    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["holdingRegisters"][0], 7);
    assert_eq!(json["coils"][1], true);

    // The JSON round-trips back into an equivalent snapshot.
    let back: vplc_core::store::AreaSnapshot = serde_json::from_value(json).unwrap();
    assert_eq!(back["coils"], AreaImage::Bits(vec![false, true, false, false]));
    store.restore(&back);
    assert_eq!(store.read_word(AREA_HOLDING_REGISTERS, 0).unwrap(), 7);
}
