// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # vplc-modbus
//!
//! Modbus server engine for the VPLC simulator, serving one shared
//! register bank over three transports:
//!
//! - **Modbus TCP**: MBAP-framed requests over a TCP listener
//! - **Modbus RTU**: binary frames delimited by 3.5-character line silence
//! - **Modbus RTU ASCII**: `:`/CRLF-framed, hex-encoded frames with LRC
//!
//! All three share one PDU parser and one request handler; only framing
//! and checksums differ per transport.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    ModbusServer                     │
//! │                (ProtocolServer impl)                │
//! └─────────────────────────────────────────────────────┘
//!        │                  │                  │
//!        ▼                  ▼                  ▼
//! ┌────────────┐    ┌────────────┐    ┌────────────┐
//! │ TCP (MBAP) │    │ RTU serial │    │ASCII serial│
//! └────────────┘    └────────────┘    └────────────┘
//!        │                  │                  │
//!        └──────────────────┼──────────────────┘
//!                           ▼
//!              ┌─────────────────────────┐
//!              │      ModbusHandler      │
//!              │ (FC dispatch + UnitID)  │
//!              └─────────────────────────┘
//!                           │
//!                           ▼
//!              ┌─────────────────────────┐
//!              │     ModbusDataStore     │
//!              └─────────────────────────┘
//! ```
//!
//! Function codes served: 01, 02, 03, 04, 05, 06, 15, 16.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod ascii;
pub mod codec;
pub mod config;
pub mod error;
pub mod factory;
pub mod frame;
pub mod handler;
pub mod mbap;
pub mod serial;
pub mod server;
pub mod session;
pub mod store;

pub use config::{ModbusConfig, ModbusVariant, Parity};
pub use error::{ExceptionCode, FrameError};
pub use factory::ModbusServerFactory;
pub use frame::{Request, MAX_RTU_FRAME};
pub use handler::{DisabledUnitPolicy, ModbusHandler};
pub use server::ModbusServer;
pub use session::SessionTracker;
pub use store::{
    ModbusDataStore, AREA_COILS, AREA_DISCRETE_INPUTS, AREA_HOLDING_REGISTERS,
    AREA_INPUT_REGISTERS,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
