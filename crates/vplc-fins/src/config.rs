// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! FINS server configuration.

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};

use vplc_core::error::ConfigError;
use vplc_core::server::{ProtocolConfig, ProtocolKind};

/// FINS transport variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinsVariant {
    /// FINS over TCP with the 16-byte outer framing header.
    Tcp,
    /// FINS over UDP, datagrams carrying bare command frames.
    Udp,
}

impl FinsVariant {
    /// Stable variant id used on the control surface.
    pub const fn as_str(&self) -> &'static str {
        match self {
            FinsVariant::Tcp => "tcp",
            FinsVariant::Udp => "udp",
        }
    }
}

impl fmt::Display for FinsVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for a FINS server instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinsConfig {
    /// Active variant.
    pub variant: FinsVariant,
    /// Bind address.
    pub address: String,
    /// Bind port.
    pub port: u16,
    /// Node address answered in the handshake.
    pub node_address: u8,
    /// Network id carried by this node.
    pub network_id: u8,
}

impl FinsConfig {
    /// Default FINS/TCP configuration on port 9600.
    pub fn tcp() -> Self {
        Self {
            variant: FinsVariant::Tcp,
            address: "0.0.0.0".to_string(),
            port: 9600,
            node_address: 1,
            network_id: 0,
        }
    }

    /// Default FINS/UDP configuration on port 9600.
    pub fn udp() -> Self {
        Self {
            variant: FinsVariant::Udp,
            ..Self::tcp()
        }
    }

    /// `host:port` form of the endpoint.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

impl ProtocolConfig for FinsConfig {
    fn protocol(&self) -> ProtocolKind {
        ProtocolKind::Fins
    }

    fn variant(&self) -> &str {
        self.variant.as_str()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::validation("port", "port must be in 1..=65535"));
        }
        Ok(())
    }

    fn clone_config(&self) -> Box<dyn ProtocolConfig> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(FinsConfig::tcp().validate().is_ok());
        assert!(FinsConfig::udp().validate().is_ok());
        assert_eq!(FinsConfig::tcp().variant(), "tcp");
        assert_eq!(FinsConfig::udp().variant(), "udp");
    }

    #[test]
    fn test_port_zero_rejected() {
        let mut config = FinsConfig::tcp();
        config.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serde_keys() {
        let json = serde_json::to_value(FinsConfig::tcp()).unwrap();
        assert_eq!(json["nodeAddress"], 1);
        assert_eq!(json["networkId"], 0);
        assert_eq!(json["port"], 9600);
    }
}
