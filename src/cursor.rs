//! # Cursors
//!
//! A cursor is one physical stylus end, eraser, puck or pad tracked by the tablet,
//! as opposed to the on-screen pointer. Each classified extension device becomes one
//! cursor slot holding its static hardware description; raw events are joined back
//! to a slot through the device's physical id.

use crate::packet::Pkt;
use crate::platform::DeviceId;

/// Maximum number of cursor slots the driver tracks. Lookups are linear scans
/// over this fixed bound.
pub const CURSOR_MAX: usize = 10;

/// Upper bound (exclusive) on a usable device name, in bytes. Names at or over
/// this length would not fit the fixed-size name fields of the emulated query
/// surface, so such devices are skipped outright during classification.
pub const MAX_NAME_LEN: usize = 256;

bitflags::bitflags! {
    /// Static capability flags of a cursor type.
    #[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash)]
    pub struct CursorCaps: u32 {
        /// This cursor type describes one of several modes of a single physical cursor.
        const MULTIMODE = 0x0001;
        /// This cursor type aggregates several indistinguishable physical cursors.
        const AGGREGATE = 0x0002;
        /// This cursor type is the inverted orientation of the preceding type.
        const INVERT = 0x0004;
    }
}

/// Manufacturer-style type tag for a cursor.
///
/// The extension does not report the hardware's own type ids, so the driver
/// virtualizes them: well-known tag values are assigned from the name/type
/// classification instead, which is what clients key stylus/eraser handling on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::AsRefStr, strum::IntoStaticStr)]
pub enum CursorType {
    #[default]
    Unknown,
    Pen,
    Eraser,
    Mouse2d,
    Mouse4d,
}

impl CursorType {
    /// The well-known tag value reported on the query surface.
    #[must_use]
    pub fn tag(self) -> u32 {
        match self {
            Self::Unknown => 0,
            Self::Pen => 0x822,
            Self::Eraser => 0x82a,
            Self::Mouse2d => 0x007,
            Self::Mouse4d => 0x094,
        }
    }
}

/// Static description of one cursor slot.
///
/// Default slots are inactive placeholders; classification fills a slot in
/// field by field the way the discovery scan learns about the device.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    /// Displayable device name. Strictly shorter than [`MAX_NAME_LEN`] bytes.
    pub name: String,
    /// Whether the cursor is currently connected.
    pub active: bool,
    /// Packet data items supported while this cursor is connected.
    pub pktdata: Pkt,
    /// Number of buttons on this cursor.
    pub buttons: u8,
    /// Number of bits of raw button data returned by the hardware.
    pub button_bits: u8,
    /// Per-button display names. The extension offers no per-button naming, so
    /// the cursor's own name stands in for every button - a known
    /// simplification carried over from the emulated driver, reported as-is.
    pub btn_names: Vec<String>,
    /// Logical button number for each physical button.
    pub button_map: [u8; 32],
    /// System button action code for each logical button: button `i` maps to
    /// bit `1 << i`.
    pub sys_btn_map: [u8; 32],
    /// Physical button controlled by normal pressure.
    pub np_button: u8,
    /// Release and press marks for the normal-pressure button.
    pub np_btn_marks: [u32; 2],
    /// Normal-pressure response curve. Unsupported; always empty.
    pub np_response: Vec<u32>,
    /// Physical button controlled by tangential pressure.
    pub tp_button: u8,
    /// Release and press marks for the tangential-pressure button.
    pub tp_btn_marks: [u32; 2],
    /// Tangential-pressure response curve. Unsupported; always empty.
    pub tp_response: Vec<u32>,
    /// Opaque per-device identifier from the extension; the join key between
    /// raw hardware events and this slot.
    pub phys_id: DeviceId,
    /// Mode number within a multi-mode cursor type.
    pub mode: u32,
    /// Minimum packet data for aggregate cursor types.
    pub min_pkt_data: u32,
    /// Minimum button count for aggregate cursor types.
    pub min_buttons: u32,
    pub capabilities: CursorCaps,
    pub cursor_type: CursorType,
    /// Number of valuator axes the underlying device reports. Used to
    /// reassemble split wire events; not exposed on the query surface.
    pub(crate) num_axes: u8,
}

impl Cursor {
    /// Whether this cursor reports in its inverted orientation.
    #[must_use]
    pub fn is_inverted(&self) -> bool {
        self.cursor_type == CursorType::Eraser
    }
}

#[cfg(test)]
mod tests {
    use super::{Cursor, CursorType};

    #[test]
    fn type_tags_are_the_wacom_values() {
        assert_eq!(CursorType::Pen.tag(), 0x822);
        assert_eq!(CursorType::Eraser.tag(), 0x82a);
        assert_eq!(CursorType::Unknown.tag(), 0);
    }

    #[test]
    fn only_erasers_invert() {
        let mut cursor = Cursor::default();
        assert!(!cursor.is_inverted());
        cursor.cursor_type = CursorType::Eraser;
        assert!(cursor.is_inverted());
        cursor.cursor_type = CursorType::Pen;
        assert!(!cursor.is_inverted());
    }
}
