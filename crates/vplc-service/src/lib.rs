// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # vplc-service
//!
//! The control surface of the VPLC simulator.
//!
//! [`PlcService`] is what the hosting front-end and the scripting layer
//! talk to: start/stop the server, pick a protocol and variant, edit the
//! configuration, manage the UnitID filter, and read or write the shared
//! memory bank regardless of which protocol is active.
//!
//! ## Example
//!
//! ```rust,ignore
//! use vplc_service::PlcService;
//!
//! let service = PlcService::new()?;          // Modbus TCP selected
//! service.write_word("holdingRegisters", 0x6B, 0x022B)?;
//! service.start_server().await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod dto;
pub mod service;

pub use dto::{ProtocolConfigDto, ProtocolInfo, ProtocolSchema, UnitIdSettings, VariantSchema};
pub use service::{default_registry, PlcService};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
