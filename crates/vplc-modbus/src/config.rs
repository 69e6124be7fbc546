// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Modbus server configuration.
//!
//! One config type covers the three variants; TCP fields are ignored by the
//! serial variants and vice versa. Defaults follow common practice: TCP on
//! 0.0.0.0:502, RTU at 115200 8N1, ASCII at 9600 7E1.

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};

use vplc_core::error::ConfigError;
use vplc_core::server::{ProtocolConfig, ProtocolKind};

// =============================================================================
// Variant
// =============================================================================

/// Modbus transport variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModbusVariant {
    /// Modbus TCP.
    Tcp,
    /// Modbus RTU (binary, timing-framed serial).
    Rtu,
    /// Modbus RTU ASCII (`:`/CRLF-framed serial).
    Ascii,
}

impl ModbusVariant {
    /// Stable variant id used on the control surface.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ModbusVariant::Tcp => "tcp",
            ModbusVariant::Rtu => "rtu",
            ModbusVariant::Ascii => "ascii",
        }
    }

    /// `true` for the serial-line variants.
    pub const fn is_serial(&self) -> bool {
        matches!(self, ModbusVariant::Rtu | ModbusVariant::Ascii)
    }
}

impl fmt::Display for ModbusVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Parity
// =============================================================================

/// Serial parity, serialized as the conventional single letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Parity {
    /// No parity bit.
    #[default]
    #[serde(rename = "N")]
    None,
    /// Even parity.
    #[serde(rename = "E")]
    Even,
    /// Odd parity.
    #[serde(rename = "O")]
    Odd,
}

impl Parity {
    /// Number of parity bits per character.
    pub const fn bits(&self) -> u32 {
        match self {
            Parity::None => 0,
            Parity::Even | Parity::Odd => 1,
        }
    }

    /// Conventional single-letter form.
    pub const fn letter(&self) -> &'static str {
        match self {
            Parity::None => "N",
            Parity::Even => "E",
            Parity::Odd => "O",
        }
    }

    /// Parses the single-letter form (either case).
    pub fn from_letter(s: &str) -> Option<Self> {
        match s {
            "N" | "n" => Some(Parity::None),
            "E" | "e" => Some(Parity::Even),
            "O" | "o" => Some(Parity::Odd),
            _ => None,
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

// =============================================================================
// ModbusConfig
// =============================================================================

/// Configuration for a Modbus server instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModbusConfig {
    /// Active variant.
    pub variant: ModbusVariant,

    /// TCP bind address.
    pub tcp_address: String,
    /// TCP port.
    pub tcp_port: u16,

    /// Serial port path (e.g. `/dev/ttyUSB0` or `COM1`).
    pub serial_port: String,
    /// Baud rate.
    pub baud_rate: u32,
    /// Data bits per character (7 or 8).
    pub data_bits: u8,
    /// Stop bits per character (1 or 2).
    pub stop_bits: u8,
    /// Parity.
    pub parity: Parity,
}

impl ModbusConfig {
    /// Default Modbus TCP configuration.
    pub fn tcp() -> Self {
        Self {
            variant: ModbusVariant::Tcp,
            tcp_address: "0.0.0.0".to_string(),
            tcp_port: 502,
            serial_port: String::new(),
            baud_rate: 0,
            data_bits: 8,
            stop_bits: 1,
            parity: Parity::None,
        }
    }

    /// Default Modbus RTU configuration (115200 8N1).
    pub fn rtu() -> Self {
        Self {
            variant: ModbusVariant::Rtu,
            tcp_address: String::new(),
            tcp_port: 0,
            serial_port: "COM1".to_string(),
            baud_rate: 115_200,
            data_bits: 8,
            stop_bits: 1,
            parity: Parity::None,
        }
    }

    /// Default Modbus ASCII configuration (9600 7E1).
    pub fn ascii() -> Self {
        Self {
            variant: ModbusVariant::Ascii,
            tcp_address: String::new(),
            tcp_port: 0,
            serial_port: "COM1".to_string(),
            baud_rate: 9600,
            data_bits: 7,
            stop_bits: 1,
            parity: Parity::Even,
        }
    }

    /// `host:port` form of the TCP endpoint.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.tcp_address, self.tcp_port)
    }
}

impl ProtocolConfig for ModbusConfig {
    fn protocol(&self) -> ProtocolKind {
        ProtocolKind::Modbus
    }

    fn variant(&self) -> &str {
        self.variant.as_str()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.variant {
            ModbusVariant::Tcp => {
                if self.tcp_port == 0 {
                    return Err(ConfigError::validation(
                        "tcpPort",
                        "port must be in 1..=65535",
                    ));
                }
            }
            ModbusVariant::Rtu | ModbusVariant::Ascii => {
                if self.serial_port.is_empty() {
                    return Err(ConfigError::missing_field("serialPort"));
                }
                if self.baud_rate == 0 {
                    return Err(ConfigError::validation("baudRate", "baud rate must be > 0"));
                }
                if !matches!(self.data_bits, 7 | 8) {
                    return Err(ConfigError::validation("dataBits", "data bits must be 7 or 8"));
                }
                if !matches!(self.stop_bits, 1 | 2) {
                    return Err(ConfigError::validation("stopBits", "stop bits must be 1 or 2"));
                }
            }
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
    fn test_default_configs_validate() {
        assert!(ModbusConfig::tcp().validate().is_ok());
        assert!(ModbusConfig::rtu().validate().is_ok());
        assert!(ModbusConfig::ascii().validate().is_ok());
    }

    #[test]
    fn test_tcp_validation() {
        let mut config = ModbusConfig::tcp();
        config.tcp_port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serial_validation() {
        let mut config = ModbusConfig::rtu();
        config.serial_port.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField { .. })
        ));

        let mut config = ModbusConfig::rtu();
        config.baud_rate = 0;
        assert!(config.validate().is_err());

        let mut config = ModbusConfig::rtu();
        config.data_bits = 9;
        assert!(config.validate().is_err());

        let mut config = ModbusConfig::ascii();
        config.stop_bits = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parity_serde_letters() {
        let json = serde_json::to_string(&Parity::Even).unwrap();
        assert_eq!(json, "\"E\"");
        let parity: Parity = serde_json::from_str("\"O\"").unwrap();
        assert_eq!(parity, Parity::Odd);
        assert_eq!(Parity::from_letter("n"), Some(Parity::None));
        assert_eq!(Parity::from_letter("X"), None);
    }

    #[test]
    fn test_config_serde_keys_are_camel_case() {
        let json = serde_json::to_value(ModbusConfig::tcp()).unwrap();
        assert!(json.get("tcpAddress").is_some());
        assert!(json.get("tcpPort").is_some());
        assert_eq!(json["variant"], "tcp");
    }
}
