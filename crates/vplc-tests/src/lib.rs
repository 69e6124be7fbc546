// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # vplc-tests
//!
//! Shared harness for the VPLC integration suites: a capturing event sink
//! and wire-frame builders used across the `tests/` directory.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod common;
