// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Top-level error reporting.

use vplc_core::error::SimError;

/// Prints the error chain to stderr and exits with a non-zero status.
pub fn report_error_and_exit(error: SimError) -> ! {
    eprintln!("Error: {error}");

    let mut source = std::error::Error::source(&error);
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }

    std::process::exit(1);
}
