// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! End-to-end Modbus TCP scenarios over real sockets.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use vplc_core::events::EventBus;
use vplc_core::server::ProtocolServer;
use vplc_core::store::DataStore;
use vplc_modbus::{ModbusConfig, ModbusDataStore, ModbusServer, AREA_HOLDING_REGISTERS};
use vplc_tests::common::{mbap_request, CaptureSink};

struct Fixture {
    server: ModbusServer,
    store: Arc<ModbusDataStore>,
    sink: Arc<CaptureSink>,
    addr: String,
}

async fn start_server(port: u16) -> Fixture {
    let mut config = ModbusConfig::tcp();
    config.tcp_address = "127.0.0.1".to_string();
    config.tcp_port = port;
    let addr = config.socket_addr();

    let store = Arc::new(ModbusDataStore::new());
    let sink = Arc::new(CaptureSink::new());
    let events = Arc::new(EventBus::with_sink(sink.clone()));

    let server = ModbusServer::new(config, store.clone(), events).unwrap();
    server.start().await.unwrap();
    Fixture {
        server,
        store,
        sink,
        addr,
    }
}

async fn exchange(stream: &mut TcpStream, request: &[u8]) -> Vec<u8> {
    stream.write_all(request).await.unwrap();
    let mut buf = vec![0u8; 512];
    let n = tokio::time::timeout(Duration::from_secs(2), stream.read(&mut buf))
        .await
        .expect("response within deadline")
        .unwrap();
    buf.truncate(n);
    buf
}

#[tokio::test]
async fn test_read_holding_registers_end_to_end() {
    let fixture = start_server(48601).await;
    fixture
        .store
        .write_words(AREA_HOLDING_REGISTERS, 0x6B, &[0x022B, 0x0000, 0x0064])
        .unwrap();

    let mut stream = TcpStream::connect(&fixture.addr).await.unwrap();
    // S1 PDU behind an MBAP header.
    let request = mbap_request(0x0001, 0x11, &[0x03, 0x00, 0x6B, 0x00, 0x03]);
    let response = exchange(&mut stream, &request).await;

    // MBAP echo: transaction 1, protocol 0, length = 1 + 9-byte PDU.
    assert_eq!(&response[0..2], &[0x00, 0x01]);
    assert_eq!(&response[2..4], &[0x00, 0x00]);
    assert_eq!(&response[4..6], &[0x00, 0x09]);
    // ADU: same bytes as the S1 RTU response minus the CRC.
    assert_eq!(
        &response[6..],
        &[0x11, 0x03, 0x06, 0x02, 0x2B, 0x00, 0x00, 0x00, 0x64]
    );

    assert_eq!(fixture.sink.rx_count(), 1);
    assert_eq!(fixture.sink.tx_count(), 1);

    fixture.server.stop().await.unwrap();
}

#[tokio::test]
async fn test_write_single_coil_and_read_back() {
    let fixture = start_server(48602).await;
    let mut stream = TcpStream::connect(&fixture.addr).await.unwrap();

    // S2 PDU: write coil 0x00AC on.
    let request = mbap_request(7, 0x11, &[0x05, 0x00, 0xAC, 0xFF, 0x00]);
    let response = exchange(&mut stream, &request).await;
    assert_eq!(&response[6..], &[0x11, 0x05, 0x00, 0xAC, 0xFF, 0x00]);

    assert!(fixture.store.read_bit("coils", 0x00AC).unwrap());
    fixture.server.stop().await.unwrap();
}

#[tokio::test]
async fn test_disabled_unit_gets_exception_on_tcp() {
    let fixture = start_server(48603).await;
    fixture.server.set_unit_enabled(0x05, false);

    let mut stream = TcpStream::connect(&fixture.addr).await.unwrap();
    // S3: FC 03 for the disabled unit.
    let request = mbap_request(2, 0x05, &[0x03, 0x00, 0x00, 0x00, 0x01]);
    let response = exchange(&mut stream, &request).await;
    assert_eq!(&response[6..], &[0x05, 0x83, 0x01]);

    fixture.server.stop().await.unwrap();
}

#[tokio::test]
async fn test_fragmented_frame_is_reassembled() {
    let fixture = start_server(48604).await;
    fixture
        .store
        .write_word(AREA_HOLDING_REGISTERS, 0, 0xBEEF)
        .unwrap();

    let mut stream = TcpStream::connect(&fixture.addr).await.unwrap();
    let request = mbap_request(9, 0x01, &[0x03, 0x00, 0x00, 0x00, 0x01]);

    // Deliver the frame in two chunks with a pause in between.
    stream.write_all(&request[..5]).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    stream.write_all(&request[5..]).await.unwrap();

    let mut buf = vec![0u8; 64];
    let n = tokio::time::timeout(Duration::from_secs(2), stream.read(&mut buf))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&buf[6..n], &[0x01, 0x03, 0x02, 0xBE, 0xEF]);

    fixture.server.stop().await.unwrap();
}

#[tokio::test]
async fn test_pipelined_requests_answered_in_order() {
    let fixture = start_server(48605).await;
    fixture
        .store
        .write_words(AREA_HOLDING_REGISTERS, 0, &[1, 2])
        .unwrap();

    let mut stream = TcpStream::connect(&fixture.addr).await.unwrap();
    let mut batch = mbap_request(1, 0x01, &[0x03, 0x00, 0x00, 0x00, 0x01]);
    batch.extend(mbap_request(2, 0x01, &[0x03, 0x00, 0x01, 0x00, 0x01]));
    stream.write_all(&batch).await.unwrap();

    let mut buf = Vec::new();
    while buf.len() < 22 {
        let mut chunk = vec![0u8; 64];
        let n = tokio::time::timeout(Duration::from_secs(2), stream.read(&mut chunk))
            .await
            .unwrap()
            .unwrap();
        assert!(n > 0, "connection closed early");
        buf.extend_from_slice(&chunk[..n]);
    }

    // First response: transaction 1, value 1; second: transaction 2, value 2.
    assert_eq!(&buf[0..2], &[0x00, 0x01]);
    assert_eq!(&buf[6..11], &[0x01, 0x03, 0x02, 0x00, 0x01]);
    assert_eq!(&buf[11..13], &[0x00, 0x02]);
    assert_eq!(&buf[17..22], &[0x01, 0x03, 0x02, 0x00, 0x02]);

    fixture.server.stop().await.unwrap();
}

#[tokio::test]
async fn test_session_events_track_unit_ids() {
    let fixture = start_server(48606).await;
    let mut stream = TcpStream::connect(&fixture.addr).await.unwrap();

    let _ = exchange(&mut stream, &mbap_request(1, 0x01, &[0x03, 0x00, 0x00, 0x00, 0x01])).await;
    let _ = exchange(&mut stream, &mbap_request(2, 0x02, &[0x03, 0x00, 0x00, 0x00, 0x01])).await;

    // Two distinct UnitIDs on one socket: the session count reaches 2.
    assert_eq!(fixture.sink.last_connection_count(), 2);

    fixture.server.stop().await.unwrap();
    // Stop resets the session table and emits a zero count.
    assert_eq!(fixture.sink.last_connection_count(), 0);
}
