// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Modbus server lifecycle.
//!
//! [`ModbusServer`] owns the handler, session tracker and configuration and
//! dispatches to one of three transports when started. Stopping cancels the
//! per-server scope and joins every spawned task before returning; stop is
//! idempotent.

mod ascii;
mod rtu;
mod tcp;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::info;

use vplc_core::cancel::CancelSource;
use vplc_core::error::ServerError;
use vplc_core::events::EventBus;
use vplc_core::server::{ProtocolConfig, ProtocolKind, ProtocolServer, ServerStatus};
use vplc_core::store::DataStore;

use crate::config::{ModbusConfig, ModbusVariant};
use crate::handler::ModbusHandler;
use crate::session::{SessionTracker, DEFAULT_SESSION_TIMEOUT};
use crate::store::{
    AREA_COILS, AREA_DISCRETE_INPUTS, AREA_HOLDING_REGISTERS, AREA_INPUT_REGISTERS,
};

// =============================================================================
// StatusCell
// =============================================================================

/// Shared lifecycle status, writable from transport tasks on fatal errors.
#[derive(Clone, Default)]
pub(crate) struct StatusCell(Arc<RwLock<ServerStatus>>);

impl StatusCell {
    pub(crate) fn get(&self) -> ServerStatus {
        *self.0.read()
    }

    pub(crate) fn set(&self, status: ServerStatus) {
        *self.0.write() = status;
    }
}

/// Tasks and cancellation scope of a running server.
struct Runtime {
    cancel: CancelSource,
    tasks: Vec<JoinHandle<()>>,
}

// =============================================================================
// ModbusServer
// =============================================================================

/// Modbus protocol server over one of the TCP/RTU/ASCII transports.
pub struct ModbusServer {
    config: RwLock<ModbusConfig>,
    handler: Arc<ModbusHandler>,
    events: Arc<EventBus>,
    sessions: Arc<SessionTracker>,
    status: StatusCell,
    lifecycle: tokio::sync::Mutex<Option<Runtime>>,
}

impl ModbusServer {
    /// Creates a stopped server over the given config, store and event bus.
    ///
    /// Fails when the datastore does not carry the four Modbus areas.
    pub fn new(
        config: ModbusConfig,
        store: Arc<dyn DataStore>,
        events: Arc<EventBus>,
    ) -> Result<Self, ServerError> {
        let ids: Vec<String> = store.areas().into_iter().map(|a| a.id).collect();
        for required in [
            AREA_COILS,
            AREA_DISCRETE_INPUTS,
            AREA_HOLDING_REGISTERS,
            AREA_INPUT_REGISTERS,
        ] {
            if !ids.iter().any(|id| id == required) {
                return Err(ServerError::StoreShape {
                    missing_area: required.to_string(),
                });
            }
        }

        Ok(Self {
            config: RwLock::new(config),
            handler: Arc::new(ModbusHandler::new(store)),
            sessions: Arc::new(SessionTracker::new(DEFAULT_SESSION_TIMEOUT, events.clone())),
            events,
            status: StatusCell::default(),
            lifecycle: tokio::sync::Mutex::new(None),
        })
    }

    /// Creates a server with a non-default session idle timeout.
    pub fn with_session_timeout(
        config: ModbusConfig,
        store: Arc<dyn DataStore>,
        events: Arc<EventBus>,
        session_timeout: Duration,
    ) -> Result<Self, ServerError> {
        let server = Self::new(config, store, events.clone())?;
        Ok(Self {
            sessions: Arc::new(SessionTracker::new(session_timeout, events)),
            ..server
        })
    }

    /// The request handler (exposed for the control surface and tests).
    pub fn handler(&self) -> &Arc<ModbusHandler> {
        &self.handler
    }
}

#[async_trait]
impl ProtocolServer for ModbusServer {
    async fn start(&self) -> Result<(), ServerError> {
        let mut slot = self.lifecycle.lock().await;
        if slot.is_some() {
            return Err(ServerError::AlreadyRunning);
        }

        let config = self.config.read().clone();
        if let Err(e) = config.validate() {
            self.status.set(ServerStatus::Error);
            return Err(ServerError::InvalidConfig(e));
        }

        let cancel = CancelSource::new();
        let spawned = match config.variant {
            ModbusVariant::Tcp => {
                tcp::spawn(
                    &config,
                    self.handler.clone(),
                    self.events.clone(),
                    self.sessions.clone(),
                    self.status.clone(),
                    &cancel,
                )
                .await
            }
            ModbusVariant::Rtu => rtu::spawn(
                &config,
                self.handler.clone(),
                self.events.clone(),
                self.status.clone(),
                &cancel,
            ),
            ModbusVariant::Ascii => ascii::spawn(
                &config,
                self.handler.clone(),
                self.events.clone(),
                self.status.clone(),
                &cancel,
            ),
        };

        let tasks = match spawned {
            Ok(tasks) => tasks,
            Err(err) => {
                self.status.set(ServerStatus::Error);
                return Err(err);
            }
        };

        *slot = Some(Runtime { cancel, tasks });
        self.status.set(ServerStatus::Running);
        info!(variant = %config.variant, "Modbus server started");
        Ok(())
    }

    async fn stop(&self) -> Result<(), ServerError> {
        let mut slot = self.lifecycle.lock().await;
        let Some(runtime) = slot.take() else {
            return Ok(());
        };

        runtime.cancel.cancel();
        for task in runtime.tasks {
            let _ = task.await;
        }
        self.sessions.reset();
        self.status.set(ServerStatus::Stopped);
        info!("Modbus server stopped");
        Ok(())
    }

    fn status(&self) -> ServerStatus {
        self.status.get()
    }

    fn protocol(&self) -> ProtocolKind {
        ProtocolKind::Modbus
    }

    fn config(&self) -> Box<dyn ProtocolConfig> {
        Box::new(self.config.read().clone())
    }

    fn update_config(&self, config: Box<dyn ProtocolConfig>) -> Result<(), ServerError> {
        if self.status.get() == ServerStatus::Running {
            return Err(ServerError::UpdateWhileRunning);
        }
        let config = config
            .as_any()
            .downcast_ref::<ModbusConfig>()
            .ok_or(ServerError::ConfigType {
                expected: "ModbusConfig",
            })?
            .clone();
        *self.config.write() = config;
        Ok(())
    }

    fn set_unit_enabled(&self, unit: u8, enabled: bool) {
        self.handler.set_unit_enabled(unit, enabled);
    }

    fn is_unit_enabled(&self, unit: u8) -> bool {
        self.handler.is_unit_enabled(unit)
    }

    fn disabled_units(&self) -> Vec<u8> {
        self.handler.disabled_units()
    }

    fn set_disabled_units(&self, units: &[u8]) {
        self.handler.set_disabled_units(units);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ModbusDataStore;

    fn server(config: ModbusConfig) -> ModbusServer {
        ModbusServer::new(config, Arc::new(ModbusDataStore::new()), Arc::new(EventBus::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_start_rejects_invalid_config() {
        let mut config = ModbusConfig::tcp();
        config.tcp_port = 0;
        let server = server(config);
        assert!(matches!(
            server.start().await,
            Err(ServerError::InvalidConfig(_))
        ));
        assert_eq!(server.status(), ServerStatus::Error);
    }

    #[tokio::test]
    async fn test_stop_when_stopped_is_noop() {
        let server = server(ModbusConfig::tcp());
        assert!(server.stop().await.is_ok());
        assert_eq!(server.status(), ServerStatus::Stopped);
    }

    #[tokio::test]
    async fn test_tcp_lifecycle() {
        let mut config = ModbusConfig::tcp();
        config.tcp_address = "127.0.0.1".to_string();
        config.tcp_port = 48502;
        let server = server(config);

        server.start().await.unwrap();
        assert_eq!(server.status(), ServerStatus::Running);
        assert!(matches!(
            server.start().await,
            Err(ServerError::AlreadyRunning)
        ));

        server.stop().await.unwrap();
        assert_eq!(server.status(), ServerStatus::Stopped);
        // Idempotent double stop.
        server.stop().await.unwrap();

        // Restart on the same port works once stopped.
        server.start().await.unwrap();
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_update_config_rejected_while_running() {
        let mut config = ModbusConfig::tcp();
        config.tcp_address = "127.0.0.1".to_string();
        config.tcp_port = 48503;
        let server = server(config.clone());

        server.start().await.unwrap();
        assert!(matches!(
            server.update_config(Box::new(config.clone())),
            Err(ServerError::UpdateWhileRunning)
        ));
        server.stop().await.unwrap();
        assert!(server.update_config(Box::new(config)).is_ok());
    }

    #[tokio::test]
    async fn test_store_shape_checked_at_construction() {
        let store = Arc::new(crate::store::ModbusDataStore::new());
        assert!(ModbusServer::new(ModbusConfig::tcp(), store, Arc::new(EventBus::new())).is_ok());
    }

    #[test]
    fn test_unit_filter_delegation() {
        let server = server(ModbusConfig::tcp());
        server.set_unit_enabled(5, false);
        assert!(!server.is_unit_enabled(5));
        assert_eq!(server.disabled_units(), vec![5]);
        server.set_disabled_units(&[1, 2]);
        assert_eq!(server.disabled_units(), vec![1, 2]);
    }
}
