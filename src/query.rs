//! # The structured query surface
//!
//! Answers (category, index) information requests against the registry, copying
//! wire-encoded fields into a caller buffer or - when no buffer is given - just
//! reporting the byte count the copy would need. Unknown requests are zero-length
//! answers, never faults; the emulated API is permissive and so is this.

use tracing::{debug, trace, warn};

use crate::axis::Axis;
use crate::context::SystemContext;
use crate::cursor::Cursor;
use crate::device::DeviceInfo;
use crate::registry::Registry;

/// Identifier string reported for `IFC_WINTABID`.
pub const WINTAB_ID: &str = "wintabx Wintab 1.1";

pub const WTI_INTERFACE: u32 = 1;
pub const WTI_STATUS: u32 = 2;
pub const WTI_DEFCONTEXT: u32 = 3;
pub const WTI_DEFSYSCTX: u32 = 4;
pub const WTI_DEVICES: u32 = 100;
pub const WTI_CURSORS: u32 = 200;
pub const WTI_EXTENSIONS: u32 = 300;
pub const WTI_DDCTXS: u32 = 400;
pub const WTI_DSCTXS: u32 = 500;

pub const IFC_WINTABID: u32 = 1;
pub const IFC_SPECVERSION: u32 = 2;
pub const IFC_IMPLVERSION: u32 = 3;
pub const IFC_NDEVICES: u32 = 4;
pub const IFC_NCURSORS: u32 = 5;

pub const CTX_NAME: u32 = 1;
pub const CTX_OPTIONS: u32 = 2;
pub const CTX_STATUS: u32 = 3;
pub const CTX_LOCKS: u32 = 4;
pub const CTX_MSGBASE: u32 = 5;
pub const CTX_DEVICE: u32 = 6;
pub const CTX_PKTRATE: u32 = 7;
pub const CTX_PKTDATA: u32 = 8;
pub const CTX_PKTMODE: u32 = 9;
pub const CTX_MOVEMASK: u32 = 10;
pub const CTX_BTNDNMASK: u32 = 11;
pub const CTX_BTNUPMASK: u32 = 12;
pub const CTX_INORGX: u32 = 13;
pub const CTX_INORGY: u32 = 14;
pub const CTX_INORGZ: u32 = 15;
pub const CTX_INEXTX: u32 = 16;
pub const CTX_INEXTY: u32 = 17;
pub const CTX_INEXTZ: u32 = 18;
pub const CTX_OUTORGX: u32 = 19;
pub const CTX_OUTORGY: u32 = 20;
pub const CTX_OUTORGZ: u32 = 21;
pub const CTX_OUTEXTX: u32 = 22;
pub const CTX_OUTEXTY: u32 = 23;
pub const CTX_OUTEXTZ: u32 = 24;
pub const CTX_SENSX: u32 = 25;
pub const CTX_SENSY: u32 = 26;
pub const CTX_SENSZ: u32 = 27;
pub const CTX_SYSMODE: u32 = 28;
pub const CTX_SYSORGX: u32 = 29;
pub const CTX_SYSORGY: u32 = 30;
pub const CTX_SYSEXTX: u32 = 31;
pub const CTX_SYSEXTY: u32 = 32;
pub const CTX_SYSSENSX: u32 = 33;
pub const CTX_SYSSENSY: u32 = 34;

pub const DVC_NAME: u32 = 1;
pub const DVC_HARDWARE: u32 = 2;
pub const DVC_NCSRTYPES: u32 = 3;
pub const DVC_FIRSTCSR: u32 = 4;
pub const DVC_PKTRATE: u32 = 5;
pub const DVC_PKTDATA: u32 = 6;
pub const DVC_PKTMODE: u32 = 7;
pub const DVC_CSRDATA: u32 = 8;
pub const DVC_XMARGIN: u32 = 9;
pub const DVC_YMARGIN: u32 = 10;
pub const DVC_ZMARGIN: u32 = 11;
pub const DVC_X: u32 = 12;
pub const DVC_Y: u32 = 13;
pub const DVC_Z: u32 = 14;
pub const DVC_NPRESSURE: u32 = 15;
pub const DVC_TPRESSURE: u32 = 16;
pub const DVC_ORIENTATION: u32 = 17;
pub const DVC_ROTATION: u32 = 18;
pub const DVC_PNPID: u32 = 19;

pub const CSR_NAME: u32 = 1;
pub const CSR_ACTIVE: u32 = 2;
pub const CSR_PKTDATA: u32 = 3;
pub const CSR_BUTTONS: u32 = 4;
pub const CSR_BUTTONBITS: u32 = 5;
pub const CSR_BTNNAMES: u32 = 6;
pub const CSR_BUTTONMAP: u32 = 7;
pub const CSR_SYSBTNMAP: u32 = 8;
pub const CSR_NPBUTTON: u32 = 9;
pub const CSR_NPBTNMARKS: u32 = 10;
pub const CSR_NPRESPONSE: u32 = 11;
pub const CSR_TPBUTTON: u32 = 12;
pub const CSR_TPBTNMARKS: u32 = 13;
pub const CSR_TPRESPONSE: u32 = 14;
pub const CSR_PHYSID: u32 = 15;
pub const CSR_MODE: u32 = 16;
pub const CSR_MINPKTDATA: u32 = 17;
pub const CSR_MINBUTTONS: u32 = 18;
pub const CSR_CAPABILITIES: u32 = 19;
pub const CSR_TYPE: u32 = 20;

/// Fixed width of the context name field in a whole-record copy, in UTF-16
/// units.
const CONTEXT_NAME_UNITS: usize = 40;

/// Two-mode output target: every `put_*` primitive counts the bytes a field
/// occupies and writes them only when a buffer is present. A `None` sink is a
/// size-only probe and never touches memory, yet returns the same count.
pub struct Sink<'a> {
    out: Option<&'a mut Vec<u8>>,
    written: usize,
}

impl<'a> Sink<'a> {
    #[must_use]
    pub fn new(out: Option<&'a mut Vec<u8>>) -> Self {
        Self { out, written: 0 }
    }

    fn put(&mut self, bytes: &[u8]) {
        if let Some(out) = self.out.as_deref_mut() {
            out.extend_from_slice(bytes);
        }
        self.written += bytes.len();
    }

    pub fn put_u8(&mut self, value: u8) {
        self.put(&[value]);
    }

    pub fn put_u16(&mut self, value: u16) {
        self.put(&value.to_le_bytes());
    }

    pub fn put_u32(&mut self, value: u32) {
        self.put(&value.to_le_bytes());
    }

    pub fn put_i32(&mut self, value: i32) {
        self.put(&value.to_le_bytes());
    }

    /// Four-byte boolean, as the emulated ABI encodes them.
    pub fn put_bool(&mut self, value: bool) {
        self.put_u32(value.into());
    }

    /// NUL-terminated UTF-16LE string.
    pub fn put_wstr(&mut self, value: &str) {
        for unit in value.encode_utf16() {
            self.put_u16(unit);
        }
        self.put_u16(0);
    }

    /// Fixed-width UTF-16LE string field, zero padded, always NUL terminated.
    pub fn put_wstr_fixed(&mut self, value: &str, units: usize) {
        let mut used = 0;
        for unit in value.encode_utf16().take(units.saturating_sub(1)) {
            self.put_u16(unit);
            used += 1;
        }
        for _ in used..units {
            self.put_u16(0);
        }
    }

    /// A 16-byte axis descriptor: min, max, unit tag, resolution.
    pub fn put_axis(&mut self, axis: &Axis) {
        self.put_i32(axis.min);
        self.put_i32(axis.max);
        self.put_u32(axis.unit.tag());
        self.put_u32(axis.resolution);
    }

    /// Bytes this sink has accounted for.
    #[must_use]
    pub fn finish(self) -> usize {
        self.written
    }
}

/// Answer one information request. Returns the number of bytes the answer
/// occupies; zero for anything unknown, unsupported, or out of range.
#[allow(clippy::too_many_lines)]
pub(crate) fn query_info(
    registry: &Registry,
    category: u32,
    index: u32,
    output: Option<&mut Vec<u8>>,
) -> usize {
    trace!("query ({category}, {index})");
    let mut sink = Sink::new(output);
    match category {
        // Largest necessary buffer for any single request.
        // TODO: compute this from the largest cursor record instead of a fixed bound.
        0 => {
            trace!("{} cursors", registry.cursor_count());
            if registry.cursor_count() > 0 {
                sink.written = 200;
            }
        }
        WTI_INTERFACE => interface_info(registry, index, &mut sink),
        WTI_DEFCONTEXT | WTI_DEFSYSCTX | WTI_DDCTXS => {
            context_info(registry.context(), index, &mut sink);
        }
        WTI_DEVICES => device_info(registry.device(), index, &mut sink),
        WTI_CURSORS..=WTI_CURSORS_LAST => {
            let slot = (category - WTI_CURSORS) as usize;
            if slot >= registry.cursor_count() {
                warn!(
                    "requested cursor information for nonexistent cursor {slot}; only {} cursors",
                    registry.cursor_count(),
                );
            } else if let Some(cursor) = registry.cursor(slot) {
                cursor_info(cursor, index, &mut sink);
            }
        }
        _ => debug!("unhandled category {category}"),
    }
    sink.finish()
}

const WTI_CURSORS_LAST: u32 = WTI_CURSORS + crate::cursor::CURSOR_MAX as u32 - 1;

fn interface_info(registry: &Registry, index: u32, sink: &mut Sink<'_>) {
    match index {
        IFC_WINTABID => sink.put_wstr(WINTAB_ID),
        // Specification 1.1.
        IFC_SPECVERSION => sink.put_u16(0x01 | (0x01 << 8)),
        // Implementation 1.0.
        IFC_IMPLVERSION => sink.put_u16(0x01 << 8),
        IFC_NDEVICES => sink.put_u32(1),
        IFC_NCURSORS => {
            #[allow(clippy::cast_possible_truncation)]
            sink.put_u32(registry.cursor_count() as u32);
        }
        _ => debug!("unhandled interface index {index}"),
    }
}

fn context_info(context: &SystemContext, index: u32, sink: &mut Sink<'_>) {
    match index {
        0 => whole_context(context, sink),
        CTX_NAME => sink.put_wstr(&context.name),
        CTX_OPTIONS => sink.put_u32(context.options.bits()),
        CTX_STATUS => sink.put_u32(context.status.bits()),
        CTX_LOCKS => sink.put_u32(context.locks.bits()),
        CTX_MSGBASE => sink.put_u32(context.msg_base),
        CTX_DEVICE => sink.put_u32(context.device),
        CTX_PKTRATE => sink.put_u32(context.pkt_rate),
        CTX_PKTDATA => sink.put_u32(context.pkt_data.bits()),
        CTX_PKTMODE => sink.put_u32(context.pkt_mode.bits()),
        CTX_MOVEMASK => sink.put_u32(context.move_mask.bits()),
        CTX_BTNDNMASK => sink.put_u32(context.btn_dn_mask),
        CTX_BTNUPMASK => sink.put_u32(context.btn_up_mask),
        CTX_INORGX => sink.put_i32(context.in_org_x),
        CTX_INORGY => sink.put_i32(context.in_org_y),
        CTX_INORGZ => sink.put_i32(context.in_org_z),
        CTX_INEXTX => sink.put_i32(context.in_ext_x),
        CTX_INEXTY => sink.put_i32(context.in_ext_y),
        CTX_INEXTZ => sink.put_i32(context.in_ext_z),
        CTX_OUTORGX => sink.put_i32(context.out_org_x),
        CTX_OUTORGY => sink.put_i32(context.out_org_y),
        CTX_OUTORGZ => sink.put_i32(context.out_org_z),
        CTX_OUTEXTX => sink.put_i32(context.out_ext_x),
        CTX_OUTEXTY => sink.put_i32(context.out_ext_y),
        CTX_OUTEXTZ => sink.put_i32(context.out_ext_z),
        CTX_SENSX => sink.put_i32(context.sens_x),
        CTX_SENSY => sink.put_i32(context.sens_y),
        CTX_SENSZ => sink.put_i32(context.sens_z),
        CTX_SYSMODE => sink.put_i32(context.sys_mode),
        CTX_SYSORGX => sink.put_i32(context.sys_org_x),
        CTX_SYSORGY => sink.put_i32(context.sys_org_y),
        CTX_SYSEXTX => sink.put_i32(context.sys_ext_x),
        CTX_SYSEXTY => sink.put_i32(context.sys_ext_y),
        CTX_SYSSENSX => sink.put_i32(context.sys_sens_x),
        CTX_SYSSENSY => sink.put_i32(context.sys_sens_y),
        _ => debug!("unhandled context index {index}"),
    }
}

/// The whole context record, fields in wire declaration order.
fn whole_context(context: &SystemContext, sink: &mut Sink<'_>) {
    sink.put_wstr_fixed(&context.name, CONTEXT_NAME_UNITS);
    sink.put_u32(context.options.bits());
    sink.put_u32(context.status.bits());
    sink.put_u32(context.locks.bits());
    sink.put_u32(context.msg_base);
    sink.put_u32(context.device);
    sink.put_u32(context.pkt_rate);
    sink.put_u32(context.pkt_data.bits());
    sink.put_u32(context.pkt_mode.bits());
    sink.put_u32(context.move_mask.bits());
    sink.put_u32(context.btn_dn_mask);
    sink.put_u32(context.btn_up_mask);
    sink.put_i32(context.in_org_x);
    sink.put_i32(context.in_org_y);
    sink.put_i32(context.in_org_z);
    sink.put_i32(context.in_ext_x);
    sink.put_i32(context.in_ext_y);
    sink.put_i32(context.in_ext_z);
    sink.put_i32(context.out_org_x);
    sink.put_i32(context.out_org_y);
    sink.put_i32(context.out_org_z);
    sink.put_i32(context.out_ext_x);
    sink.put_i32(context.out_ext_y);
    sink.put_i32(context.out_ext_z);
    sink.put_i32(context.sens_x);
    sink.put_i32(context.sens_y);
    sink.put_i32(context.sens_z);
    sink.put_i32(context.sys_mode);
    sink.put_i32(context.sys_org_x);
    sink.put_i32(context.sys_org_y);
    sink.put_i32(context.sys_ext_x);
    sink.put_i32(context.sys_ext_y);
    sink.put_i32(context.sys_sens_x);
    sink.put_i32(context.sys_sens_y);
}

fn device_info(device: &DeviceInfo, index: u32, sink: &mut Sink<'_>) {
    match index {
        DVC_NAME => sink.put_wstr(&device.name),
        DVC_HARDWARE => sink.put_u32(device.hardware.bits()),
        DVC_NCSRTYPES => sink.put_u32(device.n_cursor_types),
        DVC_FIRSTCSR => sink.put_u32(device.first_cursor),
        DVC_PKTRATE => sink.put_u32(device.pkt_rate),
        DVC_PKTDATA => sink.put_u32(device.pkt_data.bits()),
        DVC_PKTMODE => sink.put_u32(device.pkt_mode.bits()),
        DVC_CSRDATA => sink.put_u32(device.csr_data.bits()),
        DVC_XMARGIN => sink.put_i32(device.x_margin),
        DVC_YMARGIN => sink.put_i32(device.y_margin),
        DVC_X => sink.put_axis(&device.x),
        DVC_Y => sink.put_axis(&device.y),
        DVC_NPRESSURE => sink.put_axis(&device.normal_pressure),
        DVC_ORIENTATION => {
            for axis in &device.orientation {
                sink.put_axis(axis);
            }
        }
        DVC_PNPID => sink.put_wstr(&device.pnp_id),
        // Z, margins beyond X/Y, tangential pressure and rotation are not
        // sensed by any supported hardware; zero-length by policy.
        DVC_ZMARGIN | DVC_Z | DVC_TPRESSURE | DVC_ROTATION => {}
        _ => debug!("unhandled device index {index}"),
    }
}

fn cursor_info(cursor: &Cursor, index: u32, sink: &mut Sink<'_>) {
    match index {
        CSR_NAME => sink.put_wstr(&cursor.name),
        CSR_ACTIVE => sink.put_bool(cursor.active),
        CSR_PKTDATA => sink.put_u32(cursor.pktdata.bits()),
        CSR_BUTTONS => sink.put_u8(cursor.buttons),
        CSR_BUTTONBITS => sink.put_u8(cursor.button_bits),
        CSR_BTNNAMES => {
            // A list of NUL-terminated names, terminated by an extra NUL.
            for name in &cursor.btn_names {
                sink.put_wstr(name);
            }
            sink.put_u16(0);
        }
        CSR_BUTTONMAP => {
            for &entry in &cursor.button_map {
                sink.put_u8(entry);
            }
        }
        CSR_SYSBTNMAP => {
            for &entry in &cursor.sys_btn_map {
                sink.put_u8(entry);
            }
        }
        CSR_NPBUTTON => sink.put_u8(cursor.np_button),
        CSR_NPBTNMARKS => {
            sink.put_u32(cursor.np_btn_marks[0]);
            sink.put_u32(cursor.np_btn_marks[1]);
        }
        CSR_TPBUTTON => sink.put_u8(cursor.tp_button),
        CSR_TPBTNMARKS => {
            sink.put_u32(cursor.tp_btn_marks[0]);
            sink.put_u32(cursor.tp_btn_marks[1]);
        }
        CSR_PHYSID => sink.put_u32(u32::from(cursor.phys_id)),
        CSR_MODE => sink.put_u32(cursor.mode),
        CSR_MINPKTDATA => sink.put_u32(cursor.min_pkt_data),
        CSR_MINBUTTONS => sink.put_u32(cursor.min_buttons),
        CSR_CAPABILITIES => sink.put_u32(cursor.capabilities.bits()),
        CSR_TYPE => sink.put_u32(cursor.cursor_type.tag()),
        // Pressure response curves are not synthesized; zero-length by policy.
        CSR_NPRESPONSE | CSR_TPRESPONSE => {}
        _ => debug!("unhandled cursor index {index}"),
    }
}

#[cfg(test)]
mod tests {
    use super::{query_info, Sink, CSR_TYPE, CTX_NAME, IFC_NCURSORS, WTI_CURSORS, WTI_INTERFACE};
    use crate::cursor::{Cursor, CursorType};
    use crate::registry::test_support::registry_with_cursors;
    use crate::registry::Registry;

    fn one_cursor_registry() -> Registry {
        registry_with_cursors(vec![Cursor {
            name: "Wacom Stylus".to_owned(),
            cursor_type: CursorType::Pen,
            active: true,
            ..Cursor::default()
        }])
    }

    #[test]
    fn probe_and_copy_agree_on_byte_counts() {
        let registry = one_cursor_registry();
        for (category, index) in [
            (WTI_INTERFACE, super::IFC_WINTABID),
            (WTI_INTERFACE, IFC_NCURSORS),
            (super::WTI_DEFSYSCTX, 0),
            (super::WTI_DEFSYSCTX, CTX_NAME),
            (super::WTI_DEVICES, super::DVC_X),
            (super::WTI_DEVICES, super::DVC_ORIENTATION),
            (WTI_CURSORS, CSR_TYPE),
            (WTI_CURSORS, super::CSR_BUTTONMAP),
        ] {
            let probed = query_info(&registry, category, index, None);
            let mut buffer = Vec::new();
            let copied = query_info(&registry, category, index, Some(&mut buffer));
            assert_eq!(probed, copied, "({category}, {index})");
            assert_eq!(buffer.len(), copied, "({category}, {index})");
        }
    }

    #[test]
    fn out_of_range_cursor_slots_answer_zero_bytes() {
        let registry = one_cursor_registry();
        assert_eq!(query_info(&registry, WTI_CURSORS + 1, CSR_TYPE, None), 0);
        assert_eq!(query_info(&registry, WTI_CURSORS + 9, CSR_TYPE, None), 0);
        assert!(query_info(&registry, WTI_CURSORS, CSR_TYPE, None) > 0);
    }

    #[test]
    fn unknown_requests_answer_zero_bytes() {
        let registry = one_cursor_registry();
        let mut buffer = Vec::new();
        assert_eq!(query_info(&registry, 9999, 0, Some(&mut buffer)), 0);
        assert_eq!(query_info(&registry, WTI_INTERFACE, 999, None), 0);
        assert!(buffer.is_empty());
    }

    #[test]
    fn whole_context_record_has_fixed_size() {
        let registry = Registry::default();
        // 40 UTF-16 name units plus 34 scalars.
        assert_eq!(query_info(&registry, super::WTI_DEFSYSCTX, 0, None), 216);
    }

    #[test]
    fn axis_fields_are_sixteen_bytes() {
        let registry = Registry::default();
        assert_eq!(query_info(&registry, super::WTI_DEVICES, super::DVC_X, None), 16);
        assert_eq!(
            query_info(&registry, super::WTI_DEVICES, super::DVC_ORIENTATION, None),
            48
        );
    }

    #[test]
    fn wstr_encoding_is_utf16_with_terminator() {
        let mut buffer = Vec::new();
        let mut sink = Sink::new(Some(&mut buffer));
        sink.put_wstr("ab");
        assert_eq!(sink.finish(), 6);
        assert_eq!(buffer, [b'a', 0, b'b', 0, 0, 0]);
    }

    #[test]
    fn fixed_wstr_truncates_and_pads() {
        let mut buffer = Vec::new();
        let mut sink = Sink::new(Some(&mut buffer));
        sink.put_wstr_fixed("abc", 3);
        // Room for two units plus the mandatory terminator.
        assert_eq!(sink.finish(), 6);
        assert_eq!(buffer, [b'a', 0, b'b', 0, 0, 0]);
    }

    #[test]
    fn size_probe_category_reports_a_bound_when_cursors_exist() {
        assert_eq!(query_info(&one_cursor_registry(), 0, 0, None), 200);
        assert_eq!(query_info(&Registry::default(), 0, 0, None), 0);
    }
}
