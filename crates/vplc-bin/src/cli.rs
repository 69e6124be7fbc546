// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing.

use clap::{Args, Parser, Subcommand, ValueEnum};

// =============================================================================
// Main CLI Structure
// =============================================================================

/// VPLC - virtual PLC simulator.
///
/// Serves a shared in-memory register bank over Modbus TCP/RTU/ASCII and
/// OMRON FINS TCP/UDP.
#[derive(Parser, Debug)]
#[command(
    name = "vplc",
    author = "Sylvex <contact@sylvex.io>",
    version = vplc_core::VERSION,
    about = "Virtual PLC simulator",
    propagate_version = true
)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", env = "VPLC_LOG_LEVEL", global = true)]
    pub log_level: String,

    /// Log output format
    #[arg(long, default_value = "text", env = "VPLC_LOG_FORMAT", global = true)]
    pub log_format: LogFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text (default).
    Text,
    /// JSON lines for log aggregation.
    Json,
    /// Minimal single-line output.
    Compact,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the simulator (default command)
    Run(RunArgs),

    /// List the registered protocols and their variants
    Protocols,

    /// Show version information
    Version,
}

/// Arguments for the `run` command.
#[derive(Args, Debug, Clone)]
#[command(disable_version_flag = true)]
pub struct RunArgs {
    /// Protocol to serve
    #[arg(short, long, default_value = "modbus", env = "VPLC_PROTOCOL")]
    pub protocol: String,

    /// Protocol variant (tcp, rtu, ascii for Modbus; tcp, udp for FINS)
    #[arg(short = 'V', long, default_value = "tcp", env = "VPLC_VARIANT")]
    pub variant: String,

    /// Configuration overrides as `key=value` pairs
    /// (e.g. `--set tcpPort=1502 --set tcpAddress=127.0.0.1`)
    #[arg(short, long = "set", value_name = "KEY=VALUE")]
    pub settings: Vec<String>,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            protocol: "modbus".to_string(),
            variant: "tcp".to_string(),
            settings: Vec::new(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
