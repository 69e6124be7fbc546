// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The simulator control surface.
//!
//! [`PlcService`] owns exactly one active protocol at a time: its factory,
//! configuration, datastore and server. Switching protocols replaces all
//! four atomically and is rejected while the server runs. Memory and
//! snapshot operations go straight to the active datastore, so the caller
//! never needs to know which protocol is selected.

use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use vplc_core::error::{ServerError, SimError};
use vplc_core::events::{EventBus, EventSink};
use vplc_core::registry::Registry;
use vplc_core::server::{ProtocolConfig, ProtocolKind, ProtocolServer, ServerFactory, ServerStatus};
use vplc_core::store::{AreaSnapshot, DataStore, MemoryArea};

use crate::dto::{ProtocolConfigDto, ProtocolInfo, ProtocolSchema, UnitIdSettings, VariantSchema};

/// Builds a registry carrying the Modbus and FINS factories.
pub fn default_registry() -> Arc<Registry> {
    let registry = Registry::new();
    registry
        .register(Arc::new(vplc_modbus::ModbusServerFactory::new()))
        .expect("empty registry cannot hold modbus yet");
    registry
        .register(Arc::new(vplc_fins::FinsServerFactory::new()))
        .expect("empty registry cannot hold fins yet");
    Arc::new(registry)
}

/// The active protocol: factory, config, store and server as one unit.
struct ActiveProtocol {
    kind: ProtocolKind,
    variant: String,
    factory: Arc<dyn ServerFactory>,
    config: Box<dyn ProtocolConfig>,
    store: Arc<dyn DataStore>,
    server: Arc<dyn ProtocolServer>,
}

// =============================================================================
// PlcService
// =============================================================================

/// The control surface consumed by UI and scripting hosts.
pub struct PlcService {
    registry: Arc<Registry>,
    events: Arc<EventBus>,
    active: RwLock<Option<ActiveProtocol>>,
}

impl PlcService {
    /// Creates a service with the default registry and Modbus TCP active.
    pub fn new() -> Result<Self, SimError> {
        let service = Self::with_registry(default_registry());
        service.set_protocol(ProtocolKind::Modbus, "tcp")?;
        Ok(service)
    }

    /// Creates a service over a custom registry with no protocol selected.
    pub fn with_registry(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            events: Arc::new(EventBus::new()),
            active: RwLock::new(None),
        }
    }

    /// The shared event bus servers emit through.
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Installs the event sink receiving rx/tx/connection pulses.
    pub fn set_event_sink(&self, sink: Arc<dyn EventSink>) {
        self.events.set_sink(sink);
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Starts the active server.
    pub async fn start_server(&self) -> Result<(), SimError> {
        let server = self.server()?;
        server.start().await?;
        Ok(())
    }

    /// Stops the active server. No-op when nothing runs.
    pub async fn stop_server(&self) -> Result<(), SimError> {
        let Ok(server) = self.server() else {
            return Ok(());
        };
        server.stop().await?;
        Ok(())
    }

    /// The status string of the active server.
    pub fn server_status(&self) -> String {
        self.active
            .read()
            .as_ref()
            .map(|active| active.server.status().as_str())
            .unwrap_or(ServerStatus::Stopped.as_str())
            .to_string()
    }

    // =========================================================================
    // Protocol management
    // =========================================================================

    /// Lists every registered protocol with its variants.
    pub fn available_protocols(&self) -> Vec<ProtocolInfo> {
        self.registry
            .all()
            .into_iter()
            .map(|factory| ProtocolInfo {
                kind: factory.protocol().to_string(),
                display_name: factory.display_name().to_string(),
                variants: factory.variants(),
            })
            .collect()
    }

    /// The active protocol kind.
    pub fn active_protocol(&self) -> Option<ProtocolKind> {
        self.active.read().as_ref().map(|active| active.kind)
    }

    /// The active variant id.
    pub fn active_variant(&self) -> Option<String> {
        self.active.read().as_ref().map(|active| active.variant.clone())
    }

    /// Atomically replaces factory, config, datastore and server.
    ///
    /// Rejected while the current server is running.
    pub fn set_protocol(&self, kind: ProtocolKind, variant: &str) -> Result<(), SimError> {
        let mut active = self.active.write();
        if let Some(current) = active.as_ref() {
            if current.server.status() == ServerStatus::Running {
                return Err(ServerError::ProtocolChangeWhileRunning.into());
            }
        }

        let factory = self.registry.get(kind)?;
        let config = factory.config_for_variant(variant);
        let store = factory.create_store();
        let server = factory.create_server(config.clone(), store.clone(), self.events.clone())?;

        info!(protocol = %kind, variant, "Protocol selected");
        *active = Some(ActiveProtocol {
            kind,
            variant: config.variant().to_string(),
            factory,
            config,
            store,
            server,
        });
        Ok(())
    }

    /// The full configuration schema of a protocol.
    pub fn protocol_schema(&self, kind: ProtocolKind) -> Result<ProtocolSchema, SimError> {
        let factory = self.registry.get(kind)?;
        let variants = factory
            .variants()
            .into_iter()
            .map(|variant| VariantSchema {
                fields: factory.config_fields(&variant.id),
                id: variant.id,
                display_name: variant.display_name,
            })
            .collect();
        Ok(ProtocolSchema {
            protocol_type: factory.protocol().to_string(),
            display_name: factory.display_name().to_string(),
            variants,
            capabilities: factory.capabilities(),
        })
    }

    /// The active configuration as a settings map.
    pub fn current_config(&self) -> Option<ProtocolConfigDto> {
        let active = self.active.read();
        let active = active.as_ref()?;
        Some(ProtocolConfigDto {
            protocol_type: active.kind.to_string(),
            variant: active.variant.clone(),
            settings: active.factory.config_to_map(active.config.as_ref()),
        })
    }

    /// Applies a configuration update. Rejected while running.
    ///
    /// A different protocol type switches protocols first (replacing the
    /// datastore); a different variant of the same protocol keeps the
    /// datastore and replaces only the configuration.
    pub fn update_config(&self, dto: &ProtocolConfigDto) -> Result<(), SimError> {
        let kind = ProtocolKind::from_str(&dto.protocol_type)?;
        if self.active_protocol() != Some(kind) {
            self.set_protocol(kind, &dto.variant)?;
        }

        let mut active = self.active.write();
        let active = active.as_mut().ok_or(ServerError::NotInitialized)?;
        if active.server.status() == ServerStatus::Running {
            return Err(ServerError::UpdateWhileRunning.into());
        }

        let config = active.factory.config_from_map(&dto.variant, &dto.settings)?;
        config.validate()?;
        active.server.update_config(config.clone())?;
        active.variant = config.variant().to_string();
        active.config = config;
        Ok(())
    }

    // =========================================================================
    // UnitID settings
    // =========================================================================

    /// The UnitID capability and filter state of the active protocol.
    pub fn unit_id_settings(&self) -> Result<UnitIdSettings, SimError> {
        let active = self.active.read();
        let active = active.as_ref().ok_or(ServerError::NotInitialized)?;
        let caps = active.factory.capabilities();
        Ok(UnitIdSettings {
            supports_unit_id: caps.supports_unit_id,
            unit_id_min: caps.unit_id_min,
            unit_id_max: caps.unit_id_max,
            disabled_unit_ids: active.server.disabled_units(),
        })
    }

    /// Enables or disables answering for one UnitID.
    pub fn set_unit_enabled(&self, unit: u8, enabled: bool) -> Result<(), SimError> {
        let active = self.active.read();
        let active = active.as_ref().ok_or(ServerError::NotInitialized)?;
        active.server.set_unit_enabled(unit, enabled);
        Ok(())
    }

    /// Lists the disabled UnitIDs.
    pub fn disabled_units(&self) -> Vec<u8> {
        self.active
            .read()
            .as_ref()
            .map(|active| active.server.disabled_units())
            .unwrap_or_default()
    }

    /// Replaces the disabled UnitID set.
    pub fn set_disabled_units(&self, units: &[u8]) -> Result<(), SimError> {
        let active = self.active.read();
        let active = active.as_ref().ok_or(ServerError::NotInitialized)?;
        active.server.set_disabled_units(units);
        Ok(())
    }

    // =========================================================================
    // Memory access
    // =========================================================================

    /// Lists the memory areas of the active datastore.
    pub fn memory_areas(&self) -> Vec<MemoryArea> {
        self.active
            .read()
            .as_ref()
            .map(|active| active.store.areas())
            .unwrap_or_default()
    }

    /// Reads consecutive bits.
    pub fn read_bits(&self, area: &str, address: u32, count: u16) -> Result<Vec<bool>, SimError> {
        Ok(self.store()?.read_bits(area, address, count)?)
    }

    /// Writes a single bit.
    pub fn write_bit(&self, area: &str, address: u32, value: bool) -> Result<(), SimError> {
        Ok(self.store()?.write_bit(area, address, value)?)
    }

    /// Writes consecutive bits.
    pub fn write_bits(&self, area: &str, address: u32, values: &[bool]) -> Result<(), SimError> {
        Ok(self.store()?.write_bits(area, address, values)?)
    }

    /// Reads a single word.
    pub fn read_word(&self, area: &str, address: u32) -> Result<u16, SimError> {
        Ok(self.store()?.read_word(area, address)?)
    }

    /// Reads consecutive words.
    pub fn read_words(&self, area: &str, address: u32, count: u16) -> Result<Vec<u16>, SimError> {
        Ok(self.store()?.read_words(area, address, count)?)
    }

    /// Writes a single word.
    pub fn write_word(&self, area: &str, address: u32, value: u16) -> Result<(), SimError> {
        Ok(self.store()?.write_word(area, address, value)?)
    }

    /// Writes consecutive words.
    pub fn write_words(&self, area: &str, address: u32, values: &[u16]) -> Result<(), SimError> {
        Ok(self.store()?.write_words(area, address, values)?)
    }

    // =========================================================================
    // Snapshot
    // =========================================================================

    /// Deep-copies the active datastore.
    pub fn snapshot(&self) -> Result<AreaSnapshot, SimError> {
        Ok(self.store()?.snapshot())
    }

    /// Restores the active datastore from a snapshot.
    pub fn restore(&self, data: &AreaSnapshot) -> Result<(), SimError> {
        self.store()?.restore(data);
        Ok(())
    }

    /// Zeroes every cell of the active datastore.
    pub fn clear_all(&self) -> Result<(), SimError> {
        self.store()?.clear_all();
        Ok(())
    }

    // =========================================================================
    // Internal accessors
    // =========================================================================

    fn server(&self) -> Result<Arc<dyn ProtocolServer>, ServerError> {
        self.active
            .read()
            .as_ref()
            .map(|active| active.server.clone())
            .ok_or(ServerError::NotInitialized)
    }

    fn store(&self) -> Result<Arc<dyn DataStore>, ServerError> {
        self.active
            .read()
            .as_ref()
            .map(|active| active.store.clone())
            .ok_or(ServerError::NotInitialized)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value};

    #[test]
    fn test_defaults_to_modbus_tcp() {
        let service = PlcService::new().unwrap();
        assert_eq!(service.active_protocol(), Some(ProtocolKind::Modbus));
        assert_eq!(service.active_variant().as_deref(), Some("tcp"));
        assert_eq!(service.server_status(), "Stopped");

        let areas = service.memory_areas();
        assert_eq!(areas.len(), 4);
    }

    #[test]
    fn test_available_protocols() {
        let service = PlcService::new().unwrap();
        let protocols = service.available_protocols();
        assert_eq!(protocols.len(), 2);
        assert_eq!(protocols[0].kind, "modbus");
        assert_eq!(protocols[0].variants.len(), 3);
        assert_eq!(protocols[1].kind, "fins");
        assert_eq!(protocols[1].variants.len(), 2);
    }

    #[test]
    fn test_set_protocol_swaps_datastore() {
        let service = PlcService::new().unwrap();
        service.write_word("holdingRegisters", 0, 7).unwrap();

        service.set_protocol(ProtocolKind::Fins, "udp").unwrap();
        assert_eq!(service.active_variant().as_deref(), Some("udp"));
        assert_eq!(service.memory_areas().len(), 7);
        assert!(service.read_word("holdingRegisters", 0).is_err());
        assert_eq!(service.read_word("DM", 0).unwrap(), 0);
    }

    #[test]
    fn test_memory_round_trips() {
        let service = PlcService::new().unwrap();
        service.write_word("holdingRegisters", 10, 0xBEEF).unwrap();
        assert_eq!(service.read_words("holdingRegisters", 10, 1).unwrap(), vec![0xBEEF]);

        service.write_bit("coils", 3, true).unwrap();
        assert_eq!(
            service.read_bits("coils", 2, 3).unwrap(),
            vec![false, true, false]
        );
    }

    #[test]
    fn test_snapshot_restore() {
        let service = PlcService::new().unwrap();
        service.write_word("holdingRegisters", 1, 42).unwrap();
        let snapshot = service.snapshot().unwrap();

        service.clear_all().unwrap();
        assert_eq!(service.read_word("holdingRegisters", 1).unwrap(), 0);

        service.restore(&snapshot).unwrap();
        assert_eq!(service.read_word("holdingRegisters", 1).unwrap(), 42);
    }

    #[test]
    fn test_unit_id_settings_per_protocol() {
        let service = PlcService::new().unwrap();
        let settings = service.unit_id_settings().unwrap();
        assert!(settings.supports_unit_id);
        assert_eq!(settings.unit_id_max, Some(247));

        service.set_unit_enabled(5, false).unwrap();
        assert_eq!(service.disabled_units(), vec![5]);
        service.set_disabled_units(&[1, 2, 3]).unwrap();
        assert_eq!(service.disabled_units(), vec![1, 2, 3]);

        service.set_protocol(ProtocolKind::Fins, "tcp").unwrap();
        let settings = service.unit_id_settings().unwrap();
        assert!(!settings.supports_unit_id);
        assert!(settings.disabled_unit_ids.is_empty());
    }

    #[test]
    fn test_update_config_same_protocol() {
        let service = PlcService::new().unwrap();
        service.write_word("holdingRegisters", 0, 9).unwrap();

        let mut settings = Map::new();
        settings.insert("tcpPort".into(), Value::from(1502));
        let dto = ProtocolConfigDto {
            protocol_type: "modbus".into(),
            variant: "tcp".into(),
            settings,
        };
        service.update_config(&dto).unwrap();

        // Same protocol: datastore preserved.
        assert_eq!(service.read_word("holdingRegisters", 0).unwrap(), 9);
        let config = service.current_config().unwrap();
        assert_eq!(config.settings["tcpPort"], 1502);
    }

    #[test]
    fn test_update_config_switches_protocol() {
        let service = PlcService::new().unwrap();
        let dto = ProtocolConfigDto {
            protocol_type: "fins".into(),
            variant: "udp".into(),
            settings: Map::new(),
        };
        service.update_config(&dto).unwrap();
        assert_eq!(service.active_protocol(), Some(ProtocolKind::Fins));
        assert_eq!(service.active_variant().as_deref(), Some("udp"));
    }

    #[test]
    fn test_protocol_schema() {
        let service = PlcService::new().unwrap();
        let schema = service.protocol_schema(ProtocolKind::Modbus).unwrap();
        assert_eq!(schema.protocol_type, "modbus");
        assert_eq!(schema.variants.len(), 3);
        assert!(schema.capabilities.supports_unit_id);
        assert!(!schema.variants[1].fields.is_empty());
    }

    #[tokio::test]
    async fn test_lifecycle_through_service() {
        let service = PlcService::new().unwrap();
        let mut settings = Map::new();
        settings.insert("tcpAddress".into(), Value::from("127.0.0.1"));
        settings.insert("tcpPort".into(), Value::from(48520));
        service
            .update_config(&ProtocolConfigDto {
                protocol_type: "modbus".into(),
                variant: "tcp".into(),
                settings,
            })
            .unwrap();

        service.start_server().await.unwrap();
        assert_eq!(service.server_status(), "Running");

        // Protocol switches and config updates are rejected while running.
        assert!(service.set_protocol(ProtocolKind::Fins, "tcp").is_err());
        assert!(service
            .update_config(&service.current_config().unwrap())
            .is_err());

        service.stop_server().await.unwrap();
        assert_eq!(service.server_status(), "Stopped");
    }
}
