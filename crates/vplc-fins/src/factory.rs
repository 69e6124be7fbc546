// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! FINS server factory.

use std::sync::Arc;

use serde_json::{Map, Value};

use vplc_core::error::ConfigError;
use vplc_core::events::EventBus;
use vplc_core::schema::{ConfigField, ConfigVariant, ProtocolCapabilities};
use vplc_core::server::{ProtocolConfig, ProtocolKind, ProtocolServer, ServerFactory};
use vplc_core::store::DataStore;
use vplc_core::ServerError;

use crate::config::FinsConfig;
use crate::server::FinsServer;
use crate::store::FinsDataStore;

/// Factory for FINS servers.
#[derive(Debug, Default)]
pub struct FinsServerFactory;

impl FinsServerFactory {
    /// Creates the factory.
    pub fn new() -> Self {
        Self
    }
}

impl ServerFactory for FinsServerFactory {
    fn protocol(&self) -> ProtocolKind {
        ProtocolKind::Fins
    }

    fn display_name(&self) -> &'static str {
        "OMRON FINS"
    }

    fn create_server(
        &self,
        config: Box<dyn ProtocolConfig>,
        store: Arc<dyn DataStore>,
        events: Arc<EventBus>,
    ) -> Result<Arc<dyn ProtocolServer>, ServerError> {
        let config = config
            .as_any()
            .downcast_ref::<FinsConfig>()
            .ok_or(ServerError::ConfigType {
                expected: "FinsConfig",
            })?
            .clone();
        Ok(Arc::new(FinsServer::new(config, store, events)?))
    }

    fn create_store(&self) -> Arc<dyn DataStore> {
        Arc::new(FinsDataStore::new())
    }

    fn default_config(&self) -> Box<dyn ProtocolConfig> {
        Box::new(FinsConfig::tcp())
    }

    fn variants(&self) -> Vec<ConfigVariant> {
        vec![
            ConfigVariant::new("tcp", "FINS/TCP"),
            ConfigVariant::new("udp", "FINS/UDP"),
        ]
    }

    fn config_for_variant(&self, variant: &str) -> Box<dyn ProtocolConfig> {
        match variant {
            "udp" => Box::new(FinsConfig::udp()),
            _ => Box::new(FinsConfig::tcp()),
        }
    }

    fn config_fields(&self, _variant: &str) -> Vec<ConfigField> {
        vec![
            ConfigField::text("address", "Address", "0.0.0.0"),
            ConfigField::number("port", "Port", 9600).with_range(1, 65535),
            ConfigField::number("nodeAddress", "Node address", 1).with_range(0, 255),
            ConfigField::number("networkId", "Network ID", 0).with_range(0, 255),
        ]
    }

    fn capabilities(&self) -> ProtocolCapabilities {
        ProtocolCapabilities::without_unit_id()
    }

    fn config_to_map(&self, config: &dyn ProtocolConfig) -> Map<String, Value> {
        let mut map = Map::new();
        let Some(config) = config.as_any().downcast_ref::<FinsConfig>() else {
            return map;
        };
        map.insert("variant".into(), Value::from(config.variant.as_str()));
        map.insert("address".into(), Value::from(config.address.clone()));
        map.insert("port".into(), Value::from(config.port));
        map.insert("nodeAddress".into(), Value::from(config.node_address));
        map.insert("networkId".into(), Value::from(config.network_id));
        map
    }

    fn config_from_map(
        &self,
        variant: &str,
        settings: &Map<String, Value>,
    ) -> Result<Box<dyn ProtocolConfig>, ConfigError> {
        let mut config = match variant {
            "tcp" => FinsConfig::tcp(),
            "udp" => FinsConfig::udp(),
            _ => {
                return Err(ConfigError::UnknownVariant {
                    protocol: "fins".into(),
                    variant: variant.into(),
                })
            }
        };

        if let Some(value) = settings.get("address") {
            config.address = value
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| ConfigError::invalid_value("address", "expected a string"))?;
        }
        if let Some(value) = settings.get("port") {
            config.port = number(value)
                .ok_or_else(|| ConfigError::invalid_value("port", "expected a number"))?
                as u16;
        }
        if let Some(value) = settings.get("nodeAddress") {
            config.node_address = number(value)
                .ok_or_else(|| ConfigError::invalid_value("nodeAddress", "expected a number"))?
                as u8;
        }
        if let Some(value) = settings.get("networkId") {
            config.network_id = number(value)
                .ok_or_else(|| ConfigError::invalid_value("networkId", "expected a number"))?
                as u8;
        }

        Ok(Box::new(config))
    }
}

fn number(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variants_and_capabilities() {
        let factory = FinsServerFactory::new();
        let ids: Vec<String> = factory.variants().into_iter().map(|v| v.id).collect();
        assert_eq!(ids, vec!["tcp", "udp"]);
        assert!(!factory.capabilities().supports_unit_id);
    }

    #[test]
    fn test_config_map_round_trip() {
        let factory = FinsServerFactory::new();
        let config = factory.config_for_variant("udp");
        let map = factory.config_to_map(config.as_ref());
        assert_eq!(map["variant"], "udp");
        assert_eq!(map["port"], 9600);
        assert_eq!(map["nodeAddress"], 1);

        let rebuilt = factory.config_from_map("udp", &map).unwrap();
        assert_eq!(rebuilt.variant(), "udp");
    }

    #[test]
    fn test_config_from_map_applies_settings() {
        let factory = FinsServerFactory::new();
        let mut map = Map::new();
        map.insert("port".into(), Value::from(9700));
        map.insert("nodeAddress".into(), Value::from(5));
        let config = factory.config_from_map("tcp", &map).unwrap();
        let config = config.as_any().downcast_ref::<FinsConfig>().unwrap();
        assert_eq!(config.port, 9700);
        assert_eq!(config.node_address, 5);
    }

    #[test]
    fn test_store_has_seven_areas() {
        let factory = FinsServerFactory::new();
        assert_eq!(factory.create_store().areas().len(), 7);
    }
}
