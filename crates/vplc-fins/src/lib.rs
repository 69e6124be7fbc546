// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # vplc-fins
//!
//! OMRON FINS server engine for the VPLC simulator, serving one shared
//! word-area bank over two transports:
//!
//! - **FINS/TCP**: 16-byte outer framing header, node-address handshake,
//!   then command frames
//! - **FINS/UDP**: bare command frames per datagram with peer tracking
//!
//! Supported commands: memory-area read (`0x01 0x01`) and memory-area
//! write (`0x01 0x02`). Responses invert the command envelope: response
//! bit set in the ICF, destination/source address triples swapped, SID
//! kept.
//!
//! ## Memory model
//!
//! Seven word areas (CIO 6144, WR 512, HR 1536, AR 960, DM 32768,
//! TIM 4096, CNT 4096). Bit access is synthesized over the words. TIM and
//! CNT share wire code 0x09, which resolves to TIM; CNT is reachable only
//! through the control surface.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod factory;
pub mod frame;
pub mod handler;
pub mod memory;
pub mod server;
pub mod store;

pub use config::{FinsConfig, FinsVariant};
pub use error::{EndCode, FrameError};
pub use factory::FinsServerFactory;
pub use frame::{Command, CommandFrame, CommandHeader, TcpHeader};
pub use handler::FinsHandler;
pub use memory::AreaCode;
pub use server::FinsServer;
pub use store::FinsDataStore;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
