//! # The system device
//!
//! The single system-wide tablet description: hardware capability flags plus the
//! axis ranges learned from the first pen-grade physical device the classifier
//! accepts. There is exactly one of these per driver, whatever the number of
//! cursors attached to it.

use crate::axis::Axis;
use crate::packet::Pkt;

bitflags::bitflags! {
    /// Hardware and driver capability flags of the tablet.
    #[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash)]
    pub struct HardwareCaps: u32 {
        /// Display and digitizer share the same surface.
        const INTEGRATED = 0x0001;
        /// The cursor must physically touch the surface to report position.
        const TOUCH = 0x0002;
        /// The device generates events when the cursor enters and leaves
        /// detection range.
        const HARDPROX = 0x0004;
        /// The device can uniquely identify the active cursor in hardware.
        const PHYSID_CURSORS = 0x0008;
    }
}

/// Static description of the system tablet device.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Displayable device/manufacturer/revision string.
    pub name: String,
    pub hardware: HardwareCaps,
    /// Number of supported cursor types.
    pub n_cursor_types: u32,
    /// First cursor type number for this device.
    pub first_cursor: u32,
    /// Maximum packet report rate, in Hertz.
    pub pkt_rate: u32,
    /// Packet data items always available.
    pub pkt_data: Pkt,
    /// Packet data items that are physically relative.
    pub pkt_mode: Pkt,
    /// Packet data items only available with certain cursors connected.
    pub csr_data: Pkt,
    pub x_margin: i32,
    pub y_margin: i32,
    pub z_margin: i32,
    pub x: Axis,
    pub y: Axis,
    pub z: Axis,
    pub normal_pressure: Axis,
    pub tangent_pressure: Axis,
    /// Azimuth, altitude and twist capability.
    pub orientation: [Axis; 3],
    pub rotation: [Axis; 3],
    /// Plug and Play id; this driver always reports the non-PnP marker.
    pub pnp_id: String,
}
