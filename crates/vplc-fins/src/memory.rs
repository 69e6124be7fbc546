// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! FINS memory area codes.
//!
//! The wire addresses areas by a one-byte code. TIM and CNT share code
//! 0x09; the reverse mapping resolves it to TIM, so CNT is reachable only
//! through the control surface, never from the wire.

/// One-byte FINS memory area code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AreaCode(pub u8);

impl AreaCode {
    /// CIO (Core I/O) area.
    pub const CIO: AreaCode = AreaCode(0x30);
    /// Work area.
    pub const WR: AreaCode = AreaCode(0x31);
    /// Holding area.
    pub const HR: AreaCode = AreaCode(0xB0);
    /// Auxiliary area.
    pub const AR: AreaCode = AreaCode(0xB1);
    /// Data memory.
    pub const DM: AreaCode = AreaCode(0x82);
    /// Timer present values (shared with CNT).
    pub const TIM: AreaCode = AreaCode(0x09);

    /// Resolves the code to a datastore area id.
    pub fn area_id(&self) -> Option<&'static str> {
        match *self {
            AreaCode::CIO => Some(AREA_CIO),
            AreaCode::WR => Some(AREA_WR),
            AreaCode::HR => Some(AREA_HR),
            AreaCode::AR => Some(AREA_AR),
            AreaCode::DM => Some(AREA_DM),
            AreaCode::TIM => Some(AREA_TIM),
            _ => None,
        }
    }

    /// Resolves a datastore area id to its wire code.
    pub fn from_area_id(id: &str) -> Option<AreaCode> {
        match id {
            AREA_CIO => Some(AreaCode::CIO),
            AREA_WR => Some(AreaCode::WR),
            AREA_HR => Some(AreaCode::HR),
            AREA_AR => Some(AreaCode::AR),
            AREA_DM => Some(AreaCode::DM),
            AREA_TIM | AREA_CNT => Some(AreaCode::TIM),
            _ => None,
        }
    }
}

/// Area id of the CIO area.
pub const AREA_CIO: &str = "CIO";
/// Area id of the work area.
pub const AREA_WR: &str = "WR";
/// Area id of the holding area.
pub const AREA_HR: &str = "HR";
/// Area id of the auxiliary area.
pub const AREA_AR: &str = "AR";
/// Area id of the data memory area.
pub const AREA_DM: &str = "DM";
/// Area id of the timer area.
pub const AREA_TIM: &str = "TIM";
/// Area id of the counter area (not wire-addressable).
pub const AREA_CNT: &str = "CNT";

/// Default CIO size in words.
pub const DEFAULT_CIO_SIZE: u32 = 6144;
/// Default WR size in words.
pub const DEFAULT_WR_SIZE: u32 = 512;
/// Default HR size in words.
pub const DEFAULT_HR_SIZE: u32 = 1536;
/// Default AR size in words.
pub const DEFAULT_AR_SIZE: u32 = 960;
/// Default DM size in words.
pub const DEFAULT_DM_SIZE: u32 = 32_768;
/// Default TIM size in words.
pub const DEFAULT_TIM_SIZE: u32 = 4096;
/// Default CNT size in words.
pub const DEFAULT_CNT_SIZE: u32 = 4096;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_to_id() {
        assert_eq!(AreaCode(0x30).area_id(), Some("CIO"));
        assert_eq!(AreaCode(0x31).area_id(), Some("WR"));
        assert_eq!(AreaCode(0xB0).area_id(), Some("HR"));
        assert_eq!(AreaCode(0xB1).area_id(), Some("AR"));
        assert_eq!(AreaCode(0x82).area_id(), Some("DM"));
        assert_eq!(AreaCode(0x09).area_id(), Some("TIM"));
        assert_eq!(AreaCode(0xFF).area_id(), None);
    }

    #[test]
    fn test_cnt_aliases_tim_on_the_wire() {
        // Both ids map to the shared code, but the code resolves to TIM only.
        assert_eq!(AreaCode::from_area_id("CNT"), Some(AreaCode::TIM));
        assert_eq!(AreaCode::TIM.area_id(), Some("TIM"));
    }

    #[test]
    fn test_id_to_code_unknown() {
        assert_eq!(AreaCode::from_area_id("EM"), None);
    }
}
