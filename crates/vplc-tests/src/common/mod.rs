// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Shared test harness: event capture and wire-frame builders.

pub mod builders;
pub mod mocks;

pub use builders::{fins_command_bytes, fins_tcp_frame, mbap_request, rtu_frame};
pub use mocks::CaptureSink;
