// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Command execution.

use std::str::FromStr;

use serde_json::{Map, Value};
use tracing::info;

use vplc_core::error::{ConfigError, SimError};
use vplc_core::server::ProtocolKind;
use vplc_service::{PlcService, ProtocolConfigDto};

use crate::cli::{Cli, Commands, RunArgs};
use crate::shutdown::ShutdownCoordinator;

/// Executes the parsed CLI command.
pub async fn execute(cli: Cli) -> Result<(), SimError> {
    match cli.command.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => run(args).await,
        Commands::Protocols => {
            protocols();
            Ok(())
        }
        Commands::Version => {
            version();
            Ok(())
        }
    }
}

/// Starts the simulator and serves until a shutdown signal arrives.
async fn run(args: RunArgs) -> Result<(), SimError> {
    let kind = ProtocolKind::from_str(&args.protocol)?;
    let service = PlcService::new()?;
    service.set_protocol(kind, &args.variant)?;

    let settings = parse_overrides(&args.settings)?;
    if !settings.is_empty() {
        let mut dto = service
            .current_config()
            .ok_or(vplc_core::error::ServerError::NotInitialized)?;
        apply_overrides(&mut dto, settings);
        service.update_config(&dto)?;
    }

    service.start_server().await?;
    info!(
        protocol = %kind,
        variant = %args.variant,
        "Simulator running, press Ctrl+C to stop"
    );

    let shutdown = ShutdownCoordinator::new();
    shutdown.wait().await;

    service.stop_server().await?;
    info!("Simulator stopped");
    Ok(())
}

/// Prints the registered protocols and their variants.
fn protocols() {
    let registry = vplc_service::default_registry();
    for factory in registry.all() {
        println!("{} ({})", factory.protocol(), factory.display_name());
        for variant in factory.variants() {
            println!("  {} - {}", variant.id, variant.display_name);
        }
    }
}

/// Prints version information.
fn version() {
    println!("vplc {}", vplc_core::VERSION);
}

/// Parses `key=value` pairs into a settings map.
///
/// Values parse as numbers or booleans when they look like one, strings
/// otherwise.
fn parse_overrides(pairs: &[String]) -> Result<Map<String, Value>, SimError> {
    let mut settings = Map::new();
    for pair in pairs {
        let (key, raw) = pair.split_once('=').ok_or_else(|| {
            SimError::Config(ConfigError::invalid_value(
                pair.clone(),
                "expected KEY=VALUE",
            ))
        })?;
        let value = if let Ok(n) = raw.parse::<u64>() {
            Value::from(n)
        } else if let Ok(b) = raw.parse::<bool>() {
            Value::from(b)
        } else {
            Value::from(raw)
        };
        settings.insert(key.to_string(), value);
    }
    Ok(settings)
}

fn apply_overrides(dto: &mut ProtocolConfigDto, overrides: Map<String, Value>) {
    for (key, value) in overrides {
        dto.settings.insert(key, value);
    }
}

// =============================================================================
// Tests
// =============================================================================
