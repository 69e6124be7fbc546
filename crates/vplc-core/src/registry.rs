// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Factory registry.
//!
//! A registry maps protocol kinds to their [`ServerFactory`]. Registration
//! order is preserved so that protocol listings are stable across calls.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::ConfigError;
use crate::server::{ProtocolKind, ServerFactory};

/// Ordered collection of protocol server factories.
pub struct Registry {
    factories: RwLock<Vec<Arc<dyn ServerFactory>>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(Vec::new()),
        }
    }

    /// Registers a factory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateProtocol`] when a factory for the
    /// same protocol kind is already present.
    pub fn register(&self, factory: Arc<dyn ServerFactory>) -> Result<(), ConfigError> {
        let mut factories = self.factories.write();
        if factories.iter().any(|f| f.protocol() == factory.protocol()) {
            return Err(ConfigError::DuplicateProtocol {
                name: factory.protocol().to_string(),
            });
        }
        factories.push(factory);
        Ok(())
    }

    /// Looks up the factory for a protocol kind.
    pub fn get(&self, kind: ProtocolKind) -> Result<Arc<dyn ServerFactory>, ConfigError> {
        self.factories
            .read()
            .iter()
            .find(|f| f.protocol() == kind)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownProtocol {
                name: kind.to_string(),
            })
    }

    /// Returns every registered factory in registration order.
    pub fn all(&self) -> Vec<Arc<dyn ServerFactory>> {
        self.factories.read().clone()
    }

    /// Returns the registered protocol kinds in registration order.
    pub fn protocols(&self) -> Vec<ProtocolKind> {
        self.factories.read().iter().map(|f| f.protocol()).collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("protocols", &self.protocols())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServerError;
    use crate::events::EventBus;
    use crate::schema::{ConfigField, ConfigVariant, ProtocolCapabilities};
    use crate::server::{ProtocolConfig, ProtocolServer};
    use crate::store::DataStore;

    struct StubFactory(ProtocolKind);

    impl ServerFactory for StubFactory {
        fn protocol(&self) -> ProtocolKind {
            self.0
        }
        fn display_name(&self) -> &'static str {
            "Stub"
        }
        fn create_server(
            &self,
            _config: Box<dyn ProtocolConfig>,
            _store: Arc<dyn DataStore>,
            _events: Arc<EventBus>,
        ) -> Result<Arc<dyn ProtocolServer>, ServerError> {
            Err(ServerError::NotInitialized)
        }
        fn create_store(&self) -> Arc<dyn DataStore> {
            unimplemented!("not exercised")
        }
        fn default_config(&self) -> Box<dyn ProtocolConfig> {
            unimplemented!("not exercised")
        }
        fn variants(&self) -> Vec<ConfigVariant> {
            Vec::new()
        }
        fn config_for_variant(&self, _variant: &str) -> Box<dyn ProtocolConfig> {
            unimplemented!("not exercised")
        }
        fn config_fields(&self, _variant: &str) -> Vec<ConfigField> {
            Vec::new()
        }
        fn capabilities(&self) -> ProtocolCapabilities {
            ProtocolCapabilities::default()
        }
        fn config_to_map(
            &self,
            _config: &dyn ProtocolConfig,
        ) -> serde_json::Map<String, serde_json::Value> {
            serde_json::Map::new()
        }
        fn config_from_map(
            &self,
            _variant: &str,
            _settings: &serde_json::Map<String, serde_json::Value>,
        ) -> Result<Box<dyn ProtocolConfig>, ConfigError> {
            Err(ConfigError::missing_field("unused"))
        }
    }

    #[test]
    fn test_register_and_get() {
        let registry = Registry::new();
        registry
            .register(Arc::new(StubFactory(ProtocolKind::Modbus)))
            .unwrap();

        assert!(registry.get(ProtocolKind::Modbus).is_ok());
        assert!(matches!(
            registry.get(ProtocolKind::Fins),
            Err(ConfigError::UnknownProtocol { .. })
        ));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let registry = Registry::new();
        registry
            .register(Arc::new(StubFactory(ProtocolKind::Modbus)))
            .unwrap();
        assert!(matches!(
            registry.register(Arc::new(StubFactory(ProtocolKind::Modbus))),
            Err(ConfigError::DuplicateProtocol { .. })
        ));
    }

    #[test]
    fn test_listing_preserves_registration_order() {
        let registry = Registry::new();
        registry
            .register(Arc::new(StubFactory(ProtocolKind::Fins)))
            .unwrap();
        registry
            .register(Arc::new(StubFactory(ProtocolKind::Modbus)))
            .unwrap();
        assert_eq!(
            registry.protocols(),
            vec![ProtocolKind::Fins, ProtocolKind::Modbus]
        );
        assert_eq!(registry.all().len(), 2);
    }
}
