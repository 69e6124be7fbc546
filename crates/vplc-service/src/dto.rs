// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Data transfer objects of the control surface.
//!
//! These serialize with the camelCase keys the hosting front-end expects.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use vplc_core::schema::{ConfigField, ConfigVariant, ProtocolCapabilities};

/// Summary of one registered protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolInfo {
    /// Protocol type id (e.g. `modbus`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable protocol name.
    pub display_name: String,
    /// Selectable variants.
    pub variants: Vec<ConfigVariant>,
}

/// One variant of a protocol schema, with its configuration fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantSchema {
    /// Variant id.
    pub id: String,
    /// Human-readable label.
    pub display_name: String,
    /// Configuration fields of this variant.
    pub fields: Vec<ConfigField>,
}

/// Full schema of one protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolSchema {
    /// Protocol type id.
    pub protocol_type: String,
    /// Human-readable protocol name.
    pub display_name: String,
    /// Per-variant field descriptions.
    pub variants: Vec<VariantSchema>,
    /// Protocol feature flags.
    pub capabilities: ProtocolCapabilities,
}

/// The active (or desired) configuration as a generic settings map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolConfigDto {
    /// Protocol type id.
    pub protocol_type: String,
    /// Variant id.
    pub variant: String,
    /// Field name → value.
    pub settings: Map<String, Value>,
}

/// UnitID filter state of the active protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitIdSettings {
    /// Whether the protocol addresses devices by UnitID.
    pub supports_unit_id: bool,
    /// Smallest valid UnitID, when supported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_id_min: Option<u8>,
    /// Largest valid UnitID, when supported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_id_max: Option<u8>,
    /// UnitIDs that are currently not answered.
    pub disabled_unit_ids: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_info_json_shape() {
        let info = ProtocolInfo {
            kind: "modbus".into(),
            display_name: "Modbus".into(),
            variants: vec![ConfigVariant::new("tcp", "Modbus TCP")],
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["type"], "modbus");
        assert_eq!(json["displayName"], "Modbus");
        assert_eq!(json["variants"][0]["id"], "tcp");
    }

    #[test]
    fn test_config_dto_round_trip() {
        let mut settings = Map::new();
        settings.insert("tcpPort".into(), Value::from(1502));
        let dto = ProtocolConfigDto {
            protocol_type: "modbus".into(),
            variant: "tcp".into(),
            settings,
        };
        let json = serde_json::to_string(&dto).unwrap();
        let back: ProtocolConfigDto = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dto);
    }
}
