//! # The device registry
//!
//! Process-wide tablet state: the single system [device](crate::device), the system
//! [context](crate::context), and a fixed table of [cursor](crate::cursor) slots.
//! Populated once by [`Registry::classify`] from an enumeration snapshot, then
//! read-only for the lifetime of the driver.

use tracing::{error, trace, warn};

use crate::axis::{fix32, Unit};
use crate::classify;
use crate::context::{
    ContextLocks, ContextOptions, ContextStatus, SystemContext, DEFAULT_MSG_BASE,
};
use crate::cursor::{Cursor, CursorCaps, CursorType, CURSOR_MAX, MAX_NAME_LEN};
use crate::device::{DeviceInfo, HardwareCaps};
use crate::packet::Pkt;
use crate::platform::{ClassRecord, DeviceId, DeviceRecord, DeviceUse, PlatformImpl};

/// Name of the system context record.
pub const CONTEXT_NAME: &str = "wintabx Tablet Context";
/// Name of the system device record.
pub const DEVICE_NAME: &str = "wintabx Tablet Device";
/// Plug-and-Play id reported for the (never plug-and-play) emulated device.
pub const PNP_ID: &str = "non-pluginplay";

/// Packet fields this driver can populate.
fn supported_pkt_fields() -> Pkt {
    Pkt::CONTEXT
        | Pkt::STATUS
        | Pkt::SERIAL_NUMBER
        | Pkt::TIME
        | Pkt::CURSOR
        | Pkt::BUTTONS
        | Pkt::X
        | Pkt::Y
        | Pkt::NORMAL_PRESSURE
        | Pkt::ORIENTATION
}

/// The registry of everything discovery learned about the tablet.
///
/// The cursor table always holds [`CURSOR_MAX`] slots; slots at or beyond
/// [`cursor_count`](Self::cursor_count) are unpopulated defaults, except where
/// the compatibility slot fixup has parked a typed cursor there (see
/// [`Registry::fixup_slots`]).
pub struct Registry {
    pub(crate) device: DeviceInfo,
    pub(crate) context: SystemContext,
    cursors: Vec<Cursor>,
    count: usize,
}

impl Default for Registry {
    fn default() -> Self {
        let context = SystemContext {
            name: CONTEXT_NAME.to_owned(),
            options: ContextOptions::SYSTEM,
            status: ContextStatus::ON_TOP,
            locks: ContextLocks::IN_SIZE
                | ContextLocks::IN_ASPECT
                | ContextLocks::MARGIN
                | ContextLocks::SENSITIVITY
                | ContextLocks::SYS_OUT,
            msg_base: DEFAULT_MSG_BASE,
            device: 0,
            pkt_rate: 100,
            pkt_data: supported_pkt_fields(),
            move_mask: Pkt::BUTTONS | Pkt::X | Pkt::Y | Pkt::NORMAL_PRESSURE | Pkt::ORIENTATION,
            btn_dn_mask: 0xffff_ffff,
            btn_up_mask: 0xffff_ffff,
            sens_x: 0x1_0000,
            sens_y: 0x1_0000,
            sens_z: 0x1_0000,
            sys_sens_x: 0x1_0000,
            sys_sens_y: 0x1_0000,
            ..SystemContext::default()
        };
        let device = DeviceInfo {
            name: DEVICE_NAME.to_owned(),
            pnp_id: PNP_ID.to_owned(),
            hardware: HardwareCaps::HARDPROX | HardwareCaps::PHYSID_CURSORS,
            first_cursor: 0,
            pkt_rate: 100,
            pkt_data: supported_pkt_fields(),
            ..DeviceInfo::default()
        };
        Self {
            device,
            context,
            cursors: vec![Cursor::default(); CURSOR_MAX],
            count: 0,
        }
    }
}

impl Registry {
    /// Number of cursors discovery accepted.
    #[must_use]
    pub fn cursor_count(&self) -> usize {
        self.count
    }

    /// Read a cursor slot, populated or not. `None` only beyond
    /// [`CURSOR_MAX`].
    #[must_use]
    pub fn cursor(&self, slot: usize) -> Option<&Cursor> {
        self.cursors.get(slot)
    }

    #[must_use]
    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    #[must_use]
    pub fn context(&self) -> &SystemContext {
        &self.context
    }

    /// The populated cursor slots, in slot order. Covers the whole table, not
    /// just the first `count` slots, for the same reason as
    /// [`slot_by_device`](Self::slot_by_device).
    pub fn active_cursors(&self) -> impl Iterator<Item = &Cursor> {
        self.cursors.iter().filter(|cursor| cursor.active)
    }

    /// Resolve a raw event's device id to a cursor slot by linear scan over
    /// the fixed table.
    ///
    /// Scans every active slot, not just the first `count`: the compatibility
    /// fixup may park a cursor one past the populated prefix, and its events
    /// must still resolve.
    pub(crate) fn slot_by_device(&self, device: DeviceId) -> Option<usize> {
        let found = (0..CURSOR_MAX)
            .find(|&slot| self.cursors[slot].active && self.cursors[slot].phys_id == device);
        if found.is_none() {
            error!("could not map device id {device} to a cursor");
        }
        found
    }

    fn find_cursor_by_type(&self, cursor_type: CursorType, exclude: usize) -> Option<usize> {
        (0..self.count)
            .find(|&slot| slot != exclude && self.cursors[slot].cursor_type == cursor_type)
    }

    /// Enforce the slot assignments older clients hardcode: slot 1 must be the
    /// stylus and slot 2 the eraser. (Adobe Photoshop 7.0 relies on the eraser
    /// being cursor 2 or 5 and assumes the stylus is 1; if the server's device
    /// order differs, make it so.) Must run only after every device has been
    /// classified; running it again is a no-op.
    pub(crate) fn fixup_slots(&mut self) {
        if self.count >= 1 && self.cursors[1].cursor_type != CursorType::Pen {
            if let Some(stylus) = self.find_cursor_by_type(CursorType::Pen, 1) {
                self.cursors.swap(1, stylus);
                trace!("swapped cursor {stylus} into the stylus slot (1) for compatibility with older programs");
            }
        }
        if self.count >= 2 && self.cursors[2].cursor_type != CursorType::Eraser {
            if let Some(eraser) = self.find_cursor_by_type(CursorType::Eraser, 2) {
                self.cursors.swap(2, eraser);
                trace!("swapped cursor {eraser} into the eraser slot (2) for compatibility with older programs");
            }
        }
    }

    /// Populate the registry from an enumeration snapshot.
    ///
    /// Devices that fail any acceptance check are skipped with a log line and
    /// do not abort the scan. If no accepted device turns out to be a
    /// five-axis stylus, the whole discovery reports zero cursors - a tablet
    /// without pressure axes is not worth exposing to clients.
    #[allow(clippy::too_many_lines, clippy::cast_possible_truncation)]
    pub(crate) fn classify<E: PlatformImpl>(&mut self, records: &[DeviceRecord], extension: &mut E) {
        let mut slot = 0usize;
        let mut axis_read_complete = false;

        for record in records {
            trace!(
                "device {}: [name {}|type {:?}|use {}]",
                record.id,
                record.name,
                record.type_label,
                record.device_use.as_ref(),
            );
            if record.device_use != DeviceUse::Extension {
                continue;
            }
            if slot >= CURSOR_MAX {
                warn!("more than {CURSOR_MAX} extension devices; ignoring the rest");
                break;
            }

            // The name has to fit the fixed-size name fields of the query
            // surface.
            if record.name.len() >= MAX_NAME_LEN {
                error!("input device '{}' name too long - skipping", record.name);
                continue;
            }

            let mapping = match extension.button_mapping(record.id) {
                Ok(mapping) => mapping,
                Err(err) => {
                    warn!("unable to open device {}: {err}", record.name);
                    continue;
                }
            };
            if mapping.is_empty() {
                trace!("no buttons, non tablet device");
                continue;
            }

            let type_label = record.type_label.as_deref();
            if !classify::is_tablet_cursor(&record.name, type_label) {
                warn!(
                    "skipping device {} [name {}|type {:?}]; not apparently a tablet cursor type device",
                    record.id, record.name, record.type_label,
                );
                continue;
            }

            let cursor = &mut self.cursors[slot];
            *cursor = Cursor::default();
            cursor.name.clone_from(&record.name);

            let buttons = mapping.len().min(32) as u8;
            cursor.buttons = buttons;
            for (i, &logical) in mapping.iter().take(32).enumerate() {
                cursor.button_map[i] = logical;
                // Truncates to zero past bit 7, like the byte-wide map of the
                // emulated API.
                cursor.sys_btn_map[i] = u8::try_from(1u32 << i).unwrap_or(0);
            }

            cursor.active = true;
            cursor.pktdata = Pkt::TIME
                | Pkt::CURSOR
                | Pkt::BUTTONS
                | Pkt::X
                | Pkt::Y
                | Pkt::NORMAL_PRESSURE
                | Pkt::TANGENT_PRESSURE
                | Pkt::ORIENTATION;
            cursor.phys_id = record.id;
            cursor.np_button = 1;
            cursor.np_btn_marks = [0, 1];
            cursor.capabilities = CursorCaps::MULTIMODE;
            if classify::is_stylus(&record.name, type_label) {
                cursor.cursor_type = CursorType::Pen;
            }
            if classify::is_eraser(&record.name, type_label) {
                cursor.cursor_type = CursorType::Eraser;
            }

            for class in &record.classes {
                match class {
                    ClassRecord::Valuator { axes } => {
                        cursor.num_axes = u8::try_from(axes.len()).unwrap_or(u8::MAX);
                        for (i, axis) in axes.iter().enumerate() {
                            trace!(
                                "        axis {i}: [resolution {}|min_value {}|max_value {}]",
                                axis.resolution,
                                axis.min,
                                axis.max,
                            );
                        }
                        // The system device's capabilities are computed from
                        // the first pen-type device found. A more correct
                        // algorithm would require running a wide variety of
                        // tablets through their inputs; odds are it would
                        // condense to this one anyway.
                        if !axis_read_complete
                            && axes.len() >= 5
                            && cursor.cursor_type == CursorType::Pen
                        {
                            // Axis 0 is X.
                            self.device.x.min = axes[0].min;
                            self.device.x.max = axes[0].max;
                            self.device.x.unit = Unit::Inches;
                            self.device.x.resolution = axes[0].resolution;
                            self.context.in_org_x = axes[0].min;
                            self.context.sys_org_x = axes[0].min;
                            self.context.in_ext_x = axes[0].max;
                            self.context.sys_ext_x = axes[0].max;
                            // Axis 1 is Y.
                            self.device.y.min = axes[1].min;
                            self.device.y.max = axes[1].max;
                            self.device.y.unit = Unit::Inches;
                            self.device.y.resolution = axes[1].resolution;
                            self.context.in_org_y = axes[1].min;
                            self.context.sys_org_y = axes[1].min;
                            self.context.in_ext_y = axes[1].max;
                            self.context.sys_ext_y = axes[1].max;
                            // Axis 2 is normal pressure.
                            self.device.normal_pressure.min = axes[2].min;
                            self.device.normal_pressure.max = axes[2].max;
                            self.device.normal_pressure.unit = Unit::Inches;
                            self.device.normal_pressure.resolution = axes[2].resolution;
                            // Axes 3 and 4 are X and Y tilt, from which the
                            // azimuth/altitude orientation capability is
                            // synthesized.
                            if axes[3].max.abs().max(axes[4].max.abs()) != 0 {
                                self.device.orientation[0].min = 0;
                                self.device.orientation[0].max = 3600;
                                self.device.orientation[0].unit = Unit::Circle;
                                self.device.orientation[0].resolution = fix32(3600);
                                self.device.orientation[1].min = -1000;
                                self.device.orientation[1].max = 1000;
                                self.device.orientation[1].unit = Unit::Circle;
                                self.device.orientation[1].resolution = fix32(3600);
                            }
                            axis_read_complete = true;
                        }
                    }
                    ClassRecord::Buttons { count } => {
                        trace!("        button class: [num_buttons {count}]");
                        // The extension names no buttons; the device's own
                        // name stands in for each.
                        cursor.btn_names = vec![cursor.name.clone(); usize::from(buttons)];
                    }
                    ClassRecord::Keys { .. } => {}
                }
            }

            slot += 1;
        }

        if axis_read_complete {
            self.count = slot;
            self.device.n_cursor_types = slot as u32;
            self.fixup_slots();
        } else {
            warn!("did not find a valid stylus cursor with >= 5 axes, returning 0 valid devices");
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Registry;
    use crate::cursor::{Cursor, CURSOR_MAX};

    /// Build a registry directly from cursor values, bypassing discovery.
    pub(crate) fn registry_with_cursors(cursors: Vec<Cursor>) -> Registry {
        let mut registry = Registry::default();
        let count = cursors.len().min(CURSOR_MAX);
        for (slot, cursor) in cursors.into_iter().take(CURSOR_MAX).enumerate() {
            registry.cursors[slot] = cursor;
        }
        registry.count = count;
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::registry_with_cursors;
    use super::Registry;
    use crate::cursor::{Cursor, CursorType, CURSOR_MAX, MAX_NAME_LEN};
    use crate::platform::synthetic;
    use crate::platform::{AxisRecord, ClassRecord, DeviceRecord, DeviceUse};

    fn typed(name: &str, cursor_type: CursorType) -> Cursor {
        Cursor {
            name: name.to_owned(),
            cursor_type,
            active: true,
            ..Cursor::default()
        }
    }

    fn stylus_record(id: u8, name: &str) -> DeviceRecord {
        DeviceRecord {
            id,
            name: name.to_owned(),
            type_label: Some("STYLUS".to_owned()),
            device_use: DeviceUse::Extension,
            classes: vec![
                ClassRecord::Valuator {
                    axes: vec![
                        AxisRecord { min: 0, max: 10000, resolution: 2540 },
                        AxisRecord { min: 0, max: 10000, resolution: 2540 },
                        AxisRecord { min: 0, max: 1000, resolution: 1 },
                        AxisRecord { min: -64, max: 64, resolution: 1 },
                        AxisRecord { min: -64, max: 64, resolution: 1 },
                    ],
                },
                ClassRecord::Buttons { count: 2 },
            ],
        }
    }

    fn classify(records: Vec<DeviceRecord>) -> Registry {
        let (mut backend, _hub) = synthetic::Backend::new(records.clone());
        let mut registry = Registry::default();
        registry.classify(&records, &mut backend);
        registry
    }

    #[test]
    fn fixup_is_idempotent() {
        let mut registry = registry_with_cursors(vec![
            typed("eraser", CursorType::Eraser),
            typed("pad", CursorType::Unknown),
            typed("stylus", CursorType::Pen),
        ]);
        registry.fixup_slots();
        let first: Vec<_> = (0..CURSOR_MAX)
            .map(|slot| registry.cursor(slot).unwrap().cursor_type)
            .collect();
        registry.fixup_slots();
        let second: Vec<_> = (0..CURSOR_MAX)
            .map(|slot| registry.cursor(slot).unwrap().cursor_type)
            .collect();
        assert_eq!(registry.cursor(1).unwrap().cursor_type, CursorType::Pen);
        assert_eq!(registry.cursor(2).unwrap().cursor_type, CursorType::Eraser);
        assert_eq!(first, second);
    }

    #[test]
    fn name_at_exact_limit_is_rejected() {
        let long = stylus_record(2, &"x".repeat(MAX_NAME_LEN));
        let ok = {
            let mut record = stylus_record(3, &"y".repeat(MAX_NAME_LEN - 1));
            // Keep it classifiable despite the junk name.
            record.type_label = Some("STYLUS".to_owned());
            record
        };
        let registry = classify(vec![long, ok]);
        assert_eq!(registry.cursor_count(), 1);
        // The lone pen lands in the compatibility stylus slot.
        assert_eq!(registry.cursor(1).unwrap().name.len(), MAX_NAME_LEN - 1);
    }

    #[test]
    fn zero_button_devices_create_no_cursor() {
        let mut buttonless = stylus_record(2, "Wacom Stylus");
        buttonless.classes = vec![ClassRecord::Valuator {
            axes: vec![AxisRecord::default(); 5],
        }];
        let with_buttons = stylus_record(3, "Wacom Stylus");
        let registry = classify(vec![buttonless, with_buttons]);
        assert_eq!(registry.cursor_count(), 1);
        assert_eq!(registry.cursor(1).unwrap().phys_id, 3);
    }

    #[test]
    fn unopenable_devices_are_skipped() {
        let records = vec![stylus_record(2, "Wacom Stylus"), stylus_record(3, "Wacom Stylus")];
        let (mut backend, hub) = synthetic::Backend::new(records.clone());
        hub.refuse_open(2);
        let mut registry = Registry::default();
        registry.classify(&records, &mut backend);
        assert_eq!(registry.cursor_count(), 1);
        assert_eq!(registry.cursor(1).unwrap().phys_id, 3);
    }

    #[test]
    fn non_matching_names_are_excluded_entirely() {
        let mut mouse = stylus_record(2, "Logitech USB Receiver");
        mouse.type_label = Some("MOUSE".to_owned());
        let registry = classify(vec![mouse, stylus_record(3, "Wacom Stylus")]);
        assert_eq!(registry.cursor_count(), 1);
    }

    #[test]
    fn discovery_without_a_five_axis_pen_reports_zero_cursors() {
        let mut eraser_only = stylus_record(2, "Wacom Eraser");
        eraser_only.type_label = Some("ERASER".to_owned());
        let registry = classify(vec![eraser_only]);
        assert_eq!(registry.cursor_count(), 0);
        // The device axes were never seeded either.
        assert_eq!(registry.device().x.max, 0);
    }

    #[test]
    fn first_pen_seeds_device_axes_later_ones_ignored() {
        let mut second = stylus_record(3, "Wacom Stylus");
        if let ClassRecord::Valuator { axes } = &mut second.classes[0] {
            axes[0].max = 99; // Different range; must not overwrite the first.
        }
        let registry = classify(vec![stylus_record(2, "Wacom Stylus"), second]);
        assert_eq!(registry.cursor_count(), 2);
        assert_eq!(registry.device().x.max, 10000);
        assert_eq!(registry.context().in_ext_x, 10000);
    }

    #[test]
    fn sys_button_map_assigns_one_bit_per_button() {
        let mut record = stylus_record(2, "Wacom Stylus");
        record.classes[1] = ClassRecord::Buttons { count: 9 };
        let (mut backend, _hub) = synthetic::Backend::new(vec![record.clone()]);
        let mut registry = Registry::default();
        registry.classify(&[record], &mut backend);
        let cursor = registry.cursor(1).expect("fixup parks the pen in slot 1");
        assert_eq!(cursor.buttons, 9);
        assert_eq!(cursor.sys_btn_map[0], 1);
        assert_eq!(cursor.sys_btn_map[7], 0x80);
        // Bits past 7 truncate to zero in the byte-wide map.
        assert_eq!(cursor.sys_btn_map[8], 0);
        assert_eq!(cursor.btn_names.len(), 9);
        assert!(cursor.btn_names.iter().all(|name| name == "Wacom Stylus"));
    }
}
