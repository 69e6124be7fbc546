// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! VPLC - virtual PLC simulator.
//!
//! Serves a shared in-memory register bank over Modbus TCP/RTU/ASCII and
//! OMRON FINS TCP/UDP.

use clap::Parser;

use vplc_bin::cli::Cli;
use vplc_bin::commands;
use vplc_bin::error::report_error_and_exit;
use vplc_bin::logging::init_logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_format);

    if let Err(error) = commands::execute(cli).await {
        report_error_and_exit(error);
    }
}
