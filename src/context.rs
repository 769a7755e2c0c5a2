//! # The system context
//!
//! The configuration record presented to clients: logical/physical coordinate
//! mapping, sensitivities, packet masks and locking flags. Read-only after
//! initialization except for the axis origin/extent fields, which the classifier
//! seeds from the first accepted device's hardware ranges.

use crate::packet::Pkt;

/// Message identifier base; packet and proximity notices are offsets from it.
pub const DEFAULT_MSG_BASE: u32 = 0x7FF0;

bitflags::bitflags! {
    /// Context option flags.
    #[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash)]
    pub struct ContextOptions: u32 {
        const SYSTEM = 0x0001;
        const PEN = 0x0002;
        const MESSAGES = 0x0004;
        const CSR_MESSAGES = 0x0008;
        const MGN_INSIDE = 0x4000;
        const MARGIN = 0x8000;
    }
}

bitflags::bitflags! {
    /// Context status flags.
    #[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash)]
    pub struct ContextStatus: u32 {
        const DISABLED = 0x0001;
        const OBSCURED = 0x0002;
        const ON_TOP = 0x0004;
    }
}

bitflags::bitflags! {
    /// Which context attributes a client may not change.
    #[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash)]
    pub struct ContextLocks: u32 {
        const IN_SIZE = 0x0001;
        const IN_ASPECT = 0x0002;
        const SENSITIVITY = 0x0004;
        const MARGIN = 0x0008;
        const SYS_OUT = 0x0010;
    }
}

/// The system context record.
///
/// Sensitivities are 16.16 fixed point; identity is `0x1_0000`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SystemContext {
    pub name: String,
    pub options: ContextOptions,
    pub status: ContextStatus,
    pub locks: ContextLocks,
    pub msg_base: u32,
    pub device: u32,
    pub pkt_rate: u32,
    pub pkt_data: Pkt,
    pub pkt_mode: Pkt,
    pub move_mask: Pkt,
    pub btn_dn_mask: u32,
    pub btn_up_mask: u32,
    pub in_org_x: i32,
    pub in_org_y: i32,
    pub in_org_z: i32,
    pub in_ext_x: i32,
    pub in_ext_y: i32,
    pub in_ext_z: i32,
    pub out_org_x: i32,
    pub out_org_y: i32,
    pub out_org_z: i32,
    pub out_ext_x: i32,
    pub out_ext_y: i32,
    pub out_ext_z: i32,
    pub sens_x: i32,
    pub sens_y: i32,
    pub sens_z: i32,
    pub sys_mode: i32,
    pub sys_org_x: i32,
    pub sys_org_y: i32,
    pub sys_ext_x: i32,
    pub sys_ext_y: i32,
    pub sys_sens_x: i32,
    pub sys_sens_y: i32,
}
