// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Unified error hierarchy for the simulator core.
//!
//! # Error Hierarchy
//!
//! ```text
//! SimError (root)
//! ├── ConfigError  - Protocol configuration and registry lookup
//! ├── StoreError   - Datastore access
//! └── ServerError  - Server lifecycle and transport setup
//! ```
//!
//! Protocol-level parse errors (bad CRC, short frames, …) are deliberately
//! not part of this hierarchy: they never leave the protocol crates and are
//! answered on the wire with exception frames or end codes instead.

use thiserror::Error;

// =============================================================================
// SimError - Root Error Type
// =============================================================================

/// The root error type for the simulator.
#[derive(Debug, Error)]
pub enum SimError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Datastore error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Server lifecycle or transport error.
    #[error("Server error: {0}")]
    Server(#[from] ServerError),
}

impl SimError {
    /// Returns the error category as a string for logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            SimError::Config(_) => "config",
            SimError::Store(_) => "store",
            SimError::Server(_) => "server",
        }
    }
}

// =============================================================================
// ConfigError
// =============================================================================

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field failed validation.
    #[error("Validation failed for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// A required field is missing.
    #[error("Missing required field: {field}")]
    MissingField {
        /// The missing field name.
        field: String,
    },

    /// A settings map carried a value of the wrong shape.
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue {
        /// The offending field name.
        field: String,
        /// Error message.
        message: String,
    },

    /// The requested protocol is not registered.
    #[error("Unknown protocol: {name}")]
    UnknownProtocol {
        /// The unknown protocol name.
        name: String,
    },

    /// The requested variant does not exist for the protocol.
    #[error("Unknown variant '{variant}' for protocol '{protocol}'")]
    UnknownVariant {
        /// The protocol name.
        protocol: String,
        /// The unknown variant id.
        variant: String,
    },

    /// A factory for the protocol is already registered.
    #[error("Protocol already registered: {name}")]
    DuplicateProtocol {
        /// The duplicated protocol name.
        name: String,
    },
}

impl ConfigError {
    /// Creates a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// StoreError
// =============================================================================

/// Datastore access errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The addressed area does not exist in this datastore.
    #[error("Memory area not found: {area}")]
    AreaNotFound {
        /// The unknown area id.
        area: String,
    },

    /// The access range falls outside the area.
    #[error("Address out of range in '{area}': address {address} count {count} (size {size})")]
    AddressOutOfRange {
        /// The area id.
        area: String,
        /// Start address of the access.
        address: u32,
        /// Number of elements accessed.
        count: u16,
        /// Size of the area in native units.
        size: u32,
    },

    /// Write attempted on a read-only area.
    #[error("Memory area is read-only: {area}")]
    ReadOnly {
        /// The area id.
        area: String,
    },

    /// Bit access on a word-only area or vice versa.
    #[error("Access type mismatch in '{area}': {message}")]
    TypeMismatch {
        /// The area id.
        area: String,
        /// What was attempted.
        message: String,
    },
}

impl StoreError {
    /// Creates an area-not-found error.
    pub fn area_not_found(area: impl Into<String>) -> Self {
        Self::AreaNotFound { area: area.into() }
    }

    /// Creates an out-of-range error.
    pub fn out_of_range(area: impl Into<String>, address: u32, count: u16, size: u32) -> Self {
        Self::AddressOutOfRange {
            area: area.into(),
            address,
            count,
            size,
        }
    }

    /// Creates a read-only error.
    pub fn read_only(area: impl Into<String>) -> Self {
        Self::ReadOnly { area: area.into() }
    }

    /// Creates a type-mismatch error.
    pub fn type_mismatch(area: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            area: area.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// ServerError
// =============================================================================

/// Server lifecycle and transport errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// `start` was called while the server is already running.
    #[error("Server is already running")]
    AlreadyRunning,

    /// No server has been created yet.
    #[error("Server not initialized")]
    NotInitialized,

    /// Configuration update attempted while the server is running.
    #[error("Cannot update config while server is running")]
    UpdateWhileRunning,

    /// Protocol switch attempted while the server is running.
    #[error("Cannot change protocol while server is running")]
    ProtocolChangeWhileRunning,

    /// Binding the listener or socket failed.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// The address that could not be bound.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Opening the serial port failed.
    #[error("Failed to open serial port '{port}': {message}")]
    SerialOpen {
        /// The port path.
        port: String,
        /// Error message from the serial layer.
        message: String,
    },

    /// Steady-state transport I/O failure.
    #[error("Transport I/O error ({context}): {source}")]
    Io {
        /// What the server was doing.
        context: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The supplied configuration is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// The supplied configuration is of the wrong concrete type.
    #[error("Invalid config type: expected {expected}")]
    ConfigType {
        /// The expected configuration type name.
        expected: &'static str,
    },

    /// The supplied datastore does not carry the areas this server needs.
    #[error("Invalid datastore: missing area '{missing_area}'")]
    StoreShape {
        /// The first missing area id.
        missing_area: String,
    },
}

impl ServerError {
    /// Creates a bind error.
    pub fn bind(addr: impl Into<String>, source: std::io::Error) -> Self {
        Self::Bind {
            addr: addr.into(),
            source,
        }
    }

    /// Creates a serial-open error.
    pub fn serial_open(port: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SerialOpen {
            port: port.into(),
            message: message.into(),
        }
    }

    /// Creates a transport I/O error.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
