// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Protocol server abstraction.
//!
//! Each protocol contributes a [`ServerFactory`]; the factory manufactures
//! a default [`ProtocolConfig`] per variant, a protocol-shaped datastore,
//! and finally a [`ProtocolServer`] bound to a given config and store.
//!
//! # Status machine
//!
//! ```text
//!          start(ok)                 stop
//! Stopped ─────────► Running ─────────► Stopped
//!    ▲                 │
//!    │     start       │ unrecoverable I/O error
//!    │     failure     ▼
//!    └───────────── Error
//! ```
//!
//! `update_config` is only permitted while `Stopped`; `stop` is idempotent.

use std::any::Any;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ServerError};
use crate::events::EventBus;
use crate::schema::{ConfigField, ConfigVariant, ProtocolCapabilities};
use crate::store::DataStore;

// =============================================================================
// ProtocolKind
// =============================================================================

/// Identifies a wire protocol family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolKind {
    /// Modbus (TCP / RTU / RTU ASCII variants).
    Modbus,
    /// OMRON FINS (TCP / UDP variants).
    Fins,
}

impl ProtocolKind {
    /// Stable lowercase name used on the control surface.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProtocolKind::Modbus => "modbus",
            ProtocolKind::Fins => "fins",
        }
    }
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtocolKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "modbus" => Ok(ProtocolKind::Modbus),
            "fins" => Ok(ProtocolKind::Fins),
            _ => Err(ConfigError::UnknownProtocol {
                name: s.to_string(),
            }),
        }
    }
}

// =============================================================================
// ServerStatus
// =============================================================================

/// Lifecycle state of a protocol server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerStatus {
    /// Not serving; configuration may change.
    #[default]
    Stopped,
    /// Serving requests.
    Running,
    /// A non-recoverable transport failure occurred.
    Error,
}

impl ServerStatus {
    /// The status string exposed on the control surface.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ServerStatus::Stopped => "Stopped",
            ServerStatus::Running => "Running",
            ServerStatus::Error => "Error",
        }
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ProtocolConfig
// =============================================================================

/// Variant-tagged protocol configuration.
///
/// Immutable once a server has started; servers reject `update_config`
/// while running.
pub trait ProtocolConfig: Send + Sync {
    /// The protocol family this config belongs to.
    fn protocol(&self) -> ProtocolKind;

    /// The variant id (e.g. `tcp`, `rtu`, `ascii`, `udp`).
    fn variant(&self) -> &str;

    /// Validates the configuration.
    fn validate(&self) -> Result<(), ConfigError>;

    /// Clones the configuration behind a fresh box.
    fn clone_config(&self) -> Box<dyn ProtocolConfig>;

    /// Downcast support for factories and servers.
    fn as_any(&self) -> &dyn Any;
}

impl Clone for Box<dyn ProtocolConfig> {
    fn clone(&self) -> Self {
        self.clone_config()
    }
}

// =============================================================================
// ProtocolServer
// =============================================================================

/// A running (or stoppable) protocol server bound to a config and store.
///
/// Implementations use interior mutability: the server is shared as
/// `Arc<dyn ProtocolServer>` between the control surface and its own tasks.
///
/// # Lifecycle contract
///
/// - `start` on a running server fails with [`ServerError::AlreadyRunning`].
/// - `stop` closes the transport resource first (unblocking any pending
///   read), cancels the scope, then joins every spawned task. Idempotent.
/// - `status` reflects the machine above; `Error` only on non-recoverable
///   transport failures.
#[async_trait]
pub trait ProtocolServer: Send + Sync {
    /// Starts serving.
    async fn start(&self) -> Result<(), ServerError>;

    /// Stops serving and joins all tasks. No-op when already stopped.
    async fn stop(&self) -> Result<(), ServerError>;

    /// Current lifecycle status.
    fn status(&self) -> ServerStatus;

    /// The protocol family served.
    fn protocol(&self) -> ProtocolKind;

    /// A copy of the active configuration.
    fn config(&self) -> Box<dyn ProtocolConfig>;

    /// Replaces the configuration. Rejected while running.
    fn update_config(&self, config: Box<dyn ProtocolConfig>) -> Result<(), ServerError>;

    // -------------------------------------------------------------------------
    // UnitID filter - meaningful only when the protocol has a UnitID concept
    // (see ProtocolCapabilities); default implementations answer everything.
    // -------------------------------------------------------------------------

    /// Enables or disables answering for one UnitID.
    fn set_unit_enabled(&self, _unit: u8, _enabled: bool) {}

    /// Returns whether a UnitID is answered.
    fn is_unit_enabled(&self, _unit: u8) -> bool {
        true
    }

    /// Lists the disabled UnitIDs.
    fn disabled_units(&self) -> Vec<u8> {
        Vec::new()
    }

    /// Replaces the disabled UnitID set.
    fn set_disabled_units(&self, _units: &[u8]) {}
}

// =============================================================================
// ServerFactory
// =============================================================================

/// Manufactures configs, datastores and servers for one protocol family.
pub trait ServerFactory: Send + Sync {
    /// The protocol family this factory builds.
    fn protocol(&self) -> ProtocolKind;

    /// Human-readable protocol name.
    fn display_name(&self) -> &'static str;

    /// Creates a server bound to the given config and datastore.
    ///
    /// The events bus is shared into every transport the server spawns.
    fn create_server(
        &self,
        config: Box<dyn ProtocolConfig>,
        store: Arc<dyn DataStore>,
        events: Arc<EventBus>,
    ) -> Result<Arc<dyn ProtocolServer>, ServerError>;

    /// Creates the protocol-shaped default datastore.
    fn create_store(&self) -> Arc<dyn DataStore>;

    /// The default configuration (default variant).
    fn default_config(&self) -> Box<dyn ProtocolConfig>;

    /// Lists the selectable variants.
    fn variants(&self) -> Vec<ConfigVariant>;

    /// Creates the default configuration for a variant.
    ///
    /// Unknown variants fall back to the default variant, mirroring the
    /// forgiving behavior of the control surface.
    fn config_for_variant(&self, variant: &str) -> Box<dyn ProtocolConfig>;

    /// Describes the configuration fields of a variant.
    fn config_fields(&self, variant: &str) -> Vec<ConfigField>;

    /// Protocol feature flags.
    fn capabilities(&self) -> ProtocolCapabilities;

    /// Converts a configuration into a generic settings map.
    fn config_to_map(&self, config: &dyn ProtocolConfig) -> serde_json::Map<String, serde_json::Value>;

    /// Builds a configuration from a variant id and a settings map.
    ///
    /// Missing keys keep the variant defaults; wrongly-typed values are an
    /// error.
    fn config_from_map(
        &self,
        variant: &str,
        settings: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Box<dyn ProtocolConfig>, ConfigError>;
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_kind_round_trip() {
        assert_eq!("modbus".parse::<ProtocolKind>().unwrap(), ProtocolKind::Modbus);
        assert_eq!("FINS".parse::<ProtocolKind>().unwrap(), ProtocolKind::Fins);
        assert!("opcua".parse::<ProtocolKind>().is_err());
        assert_eq!(ProtocolKind::Modbus.to_string(), "modbus");
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(ServerStatus::Stopped.as_str(), "Stopped");
        assert_eq!(ServerStatus::Running.as_str(), "Running");
        assert_eq!(ServerStatus::Error.as_str(), "Error");
        assert_eq!(ServerStatus::default(), ServerStatus::Stopped);
    }
}
