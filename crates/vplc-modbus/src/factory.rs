// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Modbus server factory.
//!
//! Describes the three variants and their configuration fields to the
//! control surface and builds the server/store pair.

use std::sync::Arc;

use serde_json::{Map, Value};

use vplc_core::error::ConfigError;
use vplc_core::events::EventBus;
use vplc_core::schema::{
    ConfigField, ConfigVariant, FieldOption, ProtocolCapabilities,
};
use vplc_core::server::{
    ProtocolConfig, ProtocolKind, ProtocolServer, ServerFactory,
};
use vplc_core::store::DataStore;
use vplc_core::ServerError;

use crate::config::{ModbusConfig, ModbusVariant, Parity};
use crate::server::ModbusServer;
use crate::store::ModbusDataStore;

/// Factory for Modbus servers.
#[derive(Debug, Default)]
pub struct ModbusServerFactory;

impl ModbusServerFactory {
    /// Creates the factory.
    pub fn new() -> Self {
        Self
    }
}

impl ServerFactory for ModbusServerFactory {
    fn protocol(&self) -> ProtocolKind {
        ProtocolKind::Modbus
    }

    fn display_name(&self) -> &'static str {
        "Modbus"
    }

    fn create_server(
        &self,
        config: Box<dyn ProtocolConfig>,
        store: Arc<dyn DataStore>,
        events: Arc<EventBus>,
    ) -> Result<Arc<dyn ProtocolServer>, ServerError> {
        let config = config
            .as_any()
            .downcast_ref::<ModbusConfig>()
            .ok_or(ServerError::ConfigType {
                expected: "ModbusConfig",
            })?
            .clone();
        Ok(Arc::new(ModbusServer::new(config, store, events)?))
    }

    fn create_store(&self) -> Arc<dyn DataStore> {
        Arc::new(ModbusDataStore::new())
    }

    fn default_config(&self) -> Box<dyn ProtocolConfig> {
        Box::new(ModbusConfig::tcp())
    }

    fn variants(&self) -> Vec<ConfigVariant> {
        vec![
            ConfigVariant::new("tcp", "Modbus TCP"),
            ConfigVariant::new("rtu", "Modbus RTU"),
            ConfigVariant::new("ascii", "Modbus RTU ASCII"),
        ]
    }

    fn config_for_variant(&self, variant: &str) -> Box<dyn ProtocolConfig> {
        match variant {
            "rtu" => Box::new(ModbusConfig::rtu()),
            "ascii" => Box::new(ModbusConfig::ascii()),
            _ => Box::new(ModbusConfig::tcp()),
        }
    }

    fn config_fields(&self, variant: &str) -> Vec<ConfigField> {
        match variant {
            "tcp" => vec![
                ConfigField::text("tcpAddress", "Address", "0.0.0.0"),
                ConfigField::number("tcpPort", "Port", 502).with_range(1, 65535),
            ],
            "rtu" | "ascii" => {
                let (default_baud, default_data_bits, default_parity) = if variant == "ascii" {
                    ("9600", 7, "E")
                } else {
                    ("115200", 8, "N")
                };
                vec![
                    ConfigField::serial_port("serialPort", "Serial port", "COM1"),
                    ConfigField::select(
                        "baudRate",
                        "Baud rate",
                        default_baud,
                        ["9600", "19200", "38400", "57600", "115200"]
                            .into_iter()
                            .map(FieldOption::plain)
                            .collect(),
                    ),
                    ConfigField::select(
                        "dataBits",
                        "Data bits",
                        &default_data_bits.to_string(),
                        ["7", "8"].into_iter().map(FieldOption::plain).collect(),
                    ),
                    ConfigField::select(
                        "stopBits",
                        "Stop bits",
                        "1",
                        ["1", "2"].into_iter().map(FieldOption::plain).collect(),
                    ),
                    ConfigField::select(
                        "parity",
                        "Parity",
                        default_parity,
                        vec![
                            FieldOption {
                                value: "N".into(),
                                label: "None".into(),
                            },
                            FieldOption {
                                value: "E".into(),
                                label: "Even".into(),
                            },
                            FieldOption {
                                value: "O".into(),
                                label: "Odd".into(),
                            },
                        ],
                    ),
                ]
            }
            _ => Vec::new(),
        }
    }

    fn capabilities(&self) -> ProtocolCapabilities {
        ProtocolCapabilities::with_unit_id(1, 247)
    }

    fn config_to_map(&self, config: &dyn ProtocolConfig) -> Map<String, Value> {
        let mut map = Map::new();
        let Some(config) = config.as_any().downcast_ref::<ModbusConfig>() else {
            return map;
        };
        match config.variant {
            ModbusVariant::Tcp => {
                map.insert("tcpAddress".into(), Value::from(config.tcp_address.clone()));
                map.insert("tcpPort".into(), Value::from(config.tcp_port));
            }
            ModbusVariant::Rtu | ModbusVariant::Ascii => {
                map.insert("serialPort".into(), Value::from(config.serial_port.clone()));
                map.insert("baudRate".into(), Value::from(config.baud_rate));
                map.insert("dataBits".into(), Value::from(config.data_bits));
                map.insert("stopBits".into(), Value::from(config.stop_bits));
                map.insert("parity".into(), Value::from(config.parity.letter()));
            }
        }
        map
    }

    fn config_from_map(
        &self,
        variant: &str,
        settings: &Map<String, Value>,
    ) -> Result<Box<dyn ProtocolConfig>, ConfigError> {
        let mut config = match variant {
            "tcp" => ModbusConfig::tcp(),
            "rtu" => ModbusConfig::rtu(),
            "ascii" => ModbusConfig::ascii(),
            _ => {
                return Err(ConfigError::UnknownVariant {
                    protocol: "modbus".into(),
                    variant: variant.into(),
                })
            }
        };

        match config.variant {
            ModbusVariant::Tcp => {
                if let Some(value) = settings.get("tcpAddress") {
                    config.tcp_address = as_string("tcpAddress", value)?;
                }
                if let Some(value) = settings.get("tcpPort") {
                    config.tcp_port = as_number("tcpPort", value)? as u16;
                }
            }
            ModbusVariant::Rtu | ModbusVariant::Ascii => {
                if let Some(value) = settings.get("serialPort") {
                    config.serial_port = as_string("serialPort", value)?;
                }
                if let Some(value) = settings.get("baudRate") {
                    config.baud_rate = as_number("baudRate", value)? as u32;
                }
                if let Some(value) = settings.get("dataBits") {
                    config.data_bits = as_number("dataBits", value)? as u8;
                }
                if let Some(value) = settings.get("stopBits") {
                    config.stop_bits = as_number("stopBits", value)? as u8;
                }
                if let Some(value) = settings.get("parity") {
                    let letter = as_string("parity", value)?;
                    config.parity = Parity::from_letter(&letter).ok_or_else(|| {
                        ConfigError::invalid_value("parity", "expected N, E or O")
                    })?;
                }
            }
        }

        Ok(Box::new(config))
    }
}

/// Extracts a string setting.
fn as_string(field: &str, value: &Value) -> Result<String, ConfigError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ConfigError::invalid_value(field, "expected a string"))
}

/// Extracts a numeric setting; select fields may deliver numbers as strings.
fn as_number(field: &str, value: &Value) -> Result<u64, ConfigError> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    if let Some(s) = value.as_str() {
        if let Ok(n) = s.parse::<u64>() {
            return Ok(n);
        }
    }
    Err(ConfigError::invalid_value(field, "expected a number"))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variants_and_capabilities() {
        let factory = ModbusServerFactory::new();
        let ids: Vec<String> = factory.variants().into_iter().map(|v| v.id).collect();
        assert_eq!(ids, vec!["tcp", "rtu", "ascii"]);

        let caps = factory.capabilities();
        assert!(caps.supports_unit_id);
        assert_eq!(caps.unit_id_min, Some(1));
        assert_eq!(caps.unit_id_max, Some(247));
    }

    #[test]
    fn test_config_map_round_trip_tcp() {
        let factory = ModbusServerFactory::new();
        let config = factory.config_for_variant("tcp");
        let map = factory.config_to_map(config.as_ref());
        assert_eq!(map["tcpAddress"], "0.0.0.0");
        assert_eq!(map["tcpPort"], 502);

        let rebuilt = factory.config_from_map("tcp", &map).unwrap();
        let rebuilt = rebuilt.as_any().downcast_ref::<ModbusConfig>().unwrap();
        assert_eq!(rebuilt.tcp_port, 502);
    }

    #[test]
    fn test_config_map_round_trip_serial() {
        let factory = ModbusServerFactory::new();
        let config = factory.config_for_variant("ascii");
        let map = factory.config_to_map(config.as_ref());
        assert_eq!(map["baudRate"], 9600);
        assert_eq!(map["parity"], "E");

        let rebuilt = factory.config_from_map("ascii", &map).unwrap();
        assert_eq!(rebuilt.variant(), "ascii");
    }

    #[test]
    fn test_config_from_map_accepts_stringly_numbers() {
        let factory = ModbusServerFactory::new();
        let mut map = Map::new();
        map.insert("baudRate".into(), Value::from("19200"));
        map.insert("parity".into(), Value::from("O"));
        let config = factory.config_from_map("rtu", &map).unwrap();
        let config = config.as_any().downcast_ref::<ModbusConfig>().unwrap();
        assert_eq!(config.baud_rate, 19200);
        assert_eq!(config.parity, Parity::Odd);
    }

    #[test]
    fn test_config_from_map_rejects_bad_values() {
        let factory = ModbusServerFactory::new();
        let mut map = Map::new();
        map.insert("parity".into(), Value::from("X"));
        assert!(factory.config_from_map("rtu", &map).is_err());
        assert!(factory.config_from_map("bogus", &Map::new()).is_err());
    }

    #[test]
    fn test_unknown_variant_falls_back_to_tcp() {
        let factory = ModbusServerFactory::new();
        let config = factory.config_for_variant("nope");
        assert_eq!(config.variant(), "tcp");
    }

    #[test]
    fn test_fields_differ_per_variant() {
        let factory = ModbusServerFactory::new();
        let tcp_fields: Vec<String> = factory
            .config_fields("tcp")
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(tcp_fields, vec!["tcpAddress", "tcpPort"]);

        let rtu_fields = factory.config_fields("rtu");
        assert_eq!(rtu_fields.len(), 5);
        assert_eq!(rtu_fields[1].default, Value::from("115200"));

        let ascii_fields = factory.config_fields("ascii");
        assert_eq!(ascii_fields[1].default, Value::from("9600"));
        assert_eq!(ascii_fields[2].default, Value::from("7"));
    }
}
