// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! FINS server lifecycle.
//!
//! [`FinsServer`] dispatches to the TCP or UDP transport when started and
//! mirrors the Modbus lifecycle: stop cancels the per-server scope, joins
//! every task, and is idempotent.

mod tcp;
mod udp;

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::info;

use vplc_core::cancel::CancelSource;
use vplc_core::error::ServerError;
use vplc_core::events::EventBus;
use vplc_core::server::{ProtocolConfig, ProtocolKind, ProtocolServer, ServerStatus};
use vplc_core::store::DataStore;

use crate::config::{FinsConfig, FinsVariant};
use crate::handler::FinsHandler;
use crate::memory::AREA_DM;

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
// FinsServer
// =============================================================================

/// OMRON FINS protocol server over TCP or UDP.
pub struct FinsServer {
    config: RwLock<FinsConfig>,
    store: Arc<dyn DataStore>,
    events: Arc<EventBus>,
    status: StatusCell,
    lifecycle: tokio::sync::Mutex<Option<Runtime>>,
}

impl FinsServer {
    /// Creates a stopped server over the given config, store and event bus.
    ///
    /// Fails when the datastore does not look like a FINS word bank.
    pub fn new(
        config: FinsConfig,
        store: Arc<dyn DataStore>,
        events: Arc<EventBus>,
    ) -> Result<Self, ServerError> {
        if !store.areas().iter().any(|a| a.id == AREA_DM) {
            return Err(ServerError::StoreShape {
                missing_area: AREA_DM.to_string(),
            });
        }
        Ok(Self {
            config: RwLock::new(config),
            store,
            events,
            status: StatusCell::default(),
            lifecycle: tokio::sync::Mutex::new(None),
        })
    }
}

#[async_trait]
impl ProtocolServer for FinsServer {
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

        let handler = Arc::new(FinsHandler::new(self.store.clone(), config.node_address));
        let cancel = CancelSource::new();
        let spawned = match config.variant {
            FinsVariant::Tcp => {
                tcp::spawn(
                    &config,
                    handler,
                    self.events.clone(),
                    self.status.clone(),
                    &cancel,
                )
                .await
            }
            FinsVariant::Udp => {
                udp::spawn(
                    &config,
                    handler,
                    self.events.clone(),
                    self.status.clone(),
                    &cancel,
                )
                .await
            }
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
        info!(variant = %config.variant, "FINS server started");
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
        self.status.set(ServerStatus::Stopped);
        info!("FINS server stopped");
        Ok(())
    }

    fn status(&self) -> ServerStatus {
        self.status.get()
    }

    fn protocol(&self) -> ProtocolKind {
        ProtocolKind::Fins
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
            .downcast_ref::<FinsConfig>()
            .ok_or(ServerError::ConfigType {
                expected: "FinsConfig",
            })?
            .clone();
        *self.config.write() = config;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FinsDataStore;

    fn server(config: FinsConfig) -> FinsServer {
        FinsServer::new(config, Arc::new(FinsDataStore::new()), Arc::new(EventBus::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_tcp_lifecycle() {
        let mut config = FinsConfig::tcp();
        config.address = "127.0.0.1".to_string();
        config.port = 49600;
        let server = server(config);

        server.start().await.unwrap();
        assert_eq!(server.status(), ServerStatus::Running);
        assert!(matches!(
            server.start().await,
            Err(ServerError::AlreadyRunning)
        ));
        server.stop().await.unwrap();
        assert_eq!(server.status(), ServerStatus::Stopped);
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_udp_lifecycle() {
        let mut config = FinsConfig::udp();
        config.address = "127.0.0.1".to_string();
        config.port = 49601;
        let server = server(config);

        server.start().await.unwrap();
        assert_eq!(server.status(), ServerStatus::Running);
        server.stop().await.unwrap();
        assert_eq!(server.status(), ServerStatus::Stopped);
    }

    #[tokio::test]
    async fn test_update_config_only_when_stopped() {
        let mut config = FinsConfig::tcp();
        config.address = "127.0.0.1".to_string();
        config.port = 49602;
        let server = server(config.clone());

        server.start().await.unwrap();
        assert!(matches!(
            server.update_config(Box::new(config.clone())),
            Err(ServerError::UpdateWhileRunning)
        ));
        server.stop().await.unwrap();

        config.node_address = 9;
        server.update_config(Box::new(config)).unwrap();
        let active = server.config();
        let active = active.as_any().downcast_ref::<FinsConfig>().unwrap();
        assert_eq!(active.node_address, 9);
    }

    #[tokio::test]
    async fn test_wrong_store_shape_rejected() {
        use vplc_core::error::StoreError;
        use vplc_core::store::{AreaSnapshot, MemoryArea, StoreResult};

        struct EmptyStore;

        impl DataStore for EmptyStore {
            fn areas(&self) -> Vec<MemoryArea> {
                Vec::new()
            }
            fn read_bit(&self, area: &str, _: u32) -> StoreResult<bool> {
                Err(StoreError::area_not_found(area))
            }
            fn write_bit(&self, area: &str, _: u32, _: bool) -> StoreResult<()> {
                Err(StoreError::area_not_found(area))
            }
            fn read_bits(&self, area: &str, _: u32, _: u16) -> StoreResult<Vec<bool>> {
                Err(StoreError::area_not_found(area))
            }
            fn write_bits(&self, area: &str, _: u32, _: &[bool]) -> StoreResult<()> {
                Err(StoreError::area_not_found(area))
            }
            fn read_word(&self, area: &str, _: u32) -> StoreResult<u16> {
                Err(StoreError::area_not_found(area))
            }
            fn write_word(&self, area: &str, _: u32, _: u16) -> StoreResult<()> {
                Err(StoreError::area_not_found(area))
            }
            fn read_words(&self, area: &str, _: u32, _: u16) -> StoreResult<Vec<u16>> {
                Err(StoreError::area_not_found(area))
            }
            fn write_words(&self, area: &str, _: u32, _: &[u16]) -> StoreResult<()> {
                Err(StoreError::area_not_found(area))
            }
            fn snapshot(&self) -> AreaSnapshot {
                AreaSnapshot::new()
            }
            fn restore(&self, _: &AreaSnapshot) {}
            fn clear_all(&self) {}
        }

        let result = FinsServer::new(
            FinsConfig::tcp(),
            Arc::new(EmptyStore),
            Arc::new(EventBus::new()),
        );
        assert!(matches!(result, Err(ServerError::StoreShape { .. })));
    }
}
