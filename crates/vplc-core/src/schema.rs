// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema descriptions.
//!
//! Factories describe their per-variant configuration as a list of typed
//! fields so that external front-ends can render forms without knowing any
//! protocol. The JSON shape (camelCase keys, `type` discriminator) matches
//! what the hosting UI consumes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Variants
// =============================================================================

/// One selectable configuration variant of a protocol (e.g. `tcp`, `rtu`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigVariant {
    /// Stable variant id.
    pub id: String,
    /// Human-readable label.
    pub display_name: String,
}

impl ConfigVariant {
    /// Creates a variant descriptor.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

// =============================================================================
// Fields
// =============================================================================

/// Input widget kind of a configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Free-form text.
    Text,
    /// Numeric input, optionally bounded by `min`/`max`.
    Number,
    /// Selection from a fixed option list.
    Select,
    /// Serial port picker.
    #[serde(rename = "serialport")]
    SerialPort,
}

/// One option of a [`FieldKind::Select`] field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOption {
    /// Value submitted back by the front-end.
    pub value: String,
    /// Human-readable label.
    pub label: String,
}

impl FieldOption {
    /// Creates an option whose value and label are the same string.
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

/// Display condition: show the field only when another field has a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldCondition {
    /// The controlling field name.
    pub field: String,
    /// The value that enables display.
    pub value: String,
}

/// One configuration field of a protocol variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigField {
    /// Field name as used in settings maps.
    pub name: String,
    /// Human-readable label.
    pub label: String,
    /// Input widget kind.
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Whether the field must be filled.
    pub required: bool,
    /// Default value.
    pub default: Value,
    /// Options for select fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    /// Lower bound for number fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    /// Upper bound for number fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    /// Optional display condition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<FieldCondition>,
}

impl ConfigField {
    /// Creates a required text field.
    pub fn text(name: impl Into<String>, label: impl Into<String>, default: &str) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind: FieldKind::Text,
            required: true,
            default: Value::from(default),
            options: Vec::new(),
            min: None,
            max: None,
            condition: None,
        }
    }

    /// Creates a required number field.
    pub fn number(name: impl Into<String>, label: impl Into<String>, default: i64) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind: FieldKind::Number,
            required: true,
            default: Value::from(default),
            options: Vec::new(),
            min: None,
            max: None,
            condition: None,
        }
    }

    /// Creates a required select field.
    pub fn select(
        name: impl Into<String>,
        label: impl Into<String>,
        default: &str,
        options: Vec<FieldOption>,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind: FieldKind::Select,
            required: true,
            default: Value::from(default),
            options,
            min: None,
            max: None,
            condition: None,
        }
    }

    /// Creates a required serial-port field.
    pub fn serial_port(name: impl Into<String>, label: impl Into<String>, default: &str) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind: FieldKind::SerialPort,
            required: true,
            default: Value::from(default),
            options: Vec::new(),
            min: None,
            max: None,
            condition: None,
        }
    }

    /// Sets numeric bounds.
    pub fn with_range(mut self, min: i64, max: i64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }
}

// =============================================================================
// Capabilities
// =============================================================================

/// Protocol feature flags relevant to the hosting front-end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolCapabilities {
    /// Whether the protocol addresses devices by UnitID.
    pub supports_unit_id: bool,
    /// Smallest valid UnitID, when supported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_id_min: Option<u8>,
    /// Largest valid UnitID, when supported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_id_max: Option<u8>,
}

impl ProtocolCapabilities {
    /// Capabilities of a protocol with a UnitID concept.
    pub fn with_unit_id(min: u8, max: u8) -> Self {
        Self {
            supports_unit_id: true,
            unit_id_min: Some(min),
            unit_id_max: Some(max),
        }
    }

    /// Capabilities of a protocol without UnitID addressing.
    pub fn without_unit_id() -> Self {
        Self::default()
    }
}

// =============================================================================
// Tests
// =============================================================================
