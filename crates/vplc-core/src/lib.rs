// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # vplc-core
//!
//! Core abstractions and shared types for the VPLC simulator.
//!
//! This crate provides the foundational pieces used by every protocol
//! implementation:
//!
//! - **Store**: The [`DataStore`] trait: an area-addressed, bit- and
//!   word-granular memory bank with snapshot/restore
//! - **Error**: Unified error hierarchy ([`SimError`] and friends)
//! - **Events**: The [`EventSink`] capability and the swappable [`EventBus`]
//! - **Server**: [`ProtocolServer`] / [`ProtocolConfig`] / [`ServerFactory`]
//!   traits and the server status machine
//! - **Schema**: Per-variant configuration field descriptions consumed by
//!   external front-ends
//! - **Registry**: Factory lookup keyed by protocol kind
//! - **Cancel**: Per-server cancellation primitives
//!
//! ## Example
//!
//! ```rust,ignore
//! use vplc_core::registry::Registry;
//! use vplc_core::server::ProtocolKind;
//!
//! let registry = Registry::new();
//! registry.register(factory)?;
//!
//! let factory = registry.get(ProtocolKind::Modbus)?;
//! let store = factory.create_store();
//! let server = factory.create_server(factory.default_config(), store, events)?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod cancel;
pub mod error;
pub mod events;
pub mod registry;
pub mod schema;
pub mod server;
pub mod store;

pub use cancel::{CancelSource, CancelToken};
pub use error::{ConfigError, ServerError, SimError, StoreError};
pub use events::{EventBus, EventSink, NullEventSink};
pub use registry::Registry;
pub use schema::{
    ConfigField, ConfigVariant, FieldCondition, FieldKind, FieldOption, ProtocolCapabilities,
};
pub use server::{ProtocolConfig, ProtocolKind, ProtocolServer, ServerFactory, ServerStatus};
pub use store::{AreaImage, AreaSnapshot, DataStore, MemoryArea};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
