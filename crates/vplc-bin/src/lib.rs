// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # vplc-bin
//!
//! Headless runner for the VPLC simulator: CLI parsing, logging setup,
//! shutdown coordination and command execution.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod shutdown;
