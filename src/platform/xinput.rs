//! Live backend over the Xorg `XInput` extension, protocol 1.x.
//!
//! The 1.x protocol is the one that carries proximity events and per-device
//! open/button-mapping/state requests, so that is what this backend speaks.
//! Its one wire quirk matters here: an event's valuator data arrives in
//! trailing `DeviceValuator` events rather than inline, so the poll loop
//! reassembles each core event with its followers before handing it up.

use std::collections::HashMap;

use tracing::{trace, warn};
use x11rb::connection::{Connection, RequestConnection};
use x11rb::protocol::xinput::{self, ConnectionExt as _};
use x11rb::protocol::xproto::ConnectionExt as _;
use x11rb::rust_connection::RustConnection;

use crate::events::{RawEvent, RawKind};

use super::{
    AxisRecord, ClassRecord, DeviceId, DeviceRecord, DeviceUse, PlatformError, PlatformImpl,
    WindowId,
};

/// High bit of an event's device-id byte: valuator events follow.
const MORE_EVENTS: u8 = 0x80;
const DEVICE_ID_MASK: u8 = 0x7f;

/// A core event waiting for its trailing valuator data.
struct Pending {
    event: RawEvent,
    expect: u8,
    got: u8,
}

pub(crate) struct Backend {
    conn: RustConnection,
    started: std::time::Instant,
    /// Server-time to host-time offset, latched from the first event seen.
    bias_ms: u32,
    bias_known: bool,
    /// Valuator counts per attached device, for event reassembly.
    axes: HashMap<DeviceId, u8>,
    pending: Option<Pending>,
}

impl Backend {
    /// Connect to the display and verify the input extension is present.
    /// This is the one-time capability check every later operation relies on.
    pub(crate) fn connect() -> Result<Self, PlatformError> {
        let (conn, _screen) = x11rb::connect(None)?;
        conn.extension_information(xinput::X11_EXTENSION_NAME)?
            .ok_or(PlatformError::ExtensionUnavailable)?;
        let version = conn
            .xinput_get_extension_version(xinput::X11_EXTENSION_NAME.as_bytes())?
            .reply()?;
        trace!(
            "server supports input extension v{}.{}",
            version.server_major,
            version.server_minor,
        );
        Ok(Self {
            conn,
            started: std::time::Instant::now(),
            bias_ms: 0,
            bias_known: false,
            axes: HashMap::new(),
            pending: None,
        })
    }

    #[allow(clippy::cast_possible_truncation)]
    fn host_now_ms(&self) -> u32 {
        self.started.elapsed().as_millis() as u32
    }

    /// Begin a reassembly for a freshly received core event, flushing any
    /// previous one that is still waiting on valuators.
    fn begin(&mut self, out: &mut Vec<RawEvent>, kind: RawKind, device_id: u8, time: u32) {
        if let Some(pending) = self.pending.take() {
            out.push(pending.event);
        }
        if !self.bias_known {
            self.bias_known = true;
            self.bias_ms = self.host_now_ms().wrapping_sub(time);
        }

        let device = device_id & DEVICE_ID_MASK;
        let event = RawEvent::new(kind, device, time, &[]);
        let follows = device_id & MORE_EVENTS != 0;
        let carries_axes = !matches!(kind, RawKind::KeyPress | RawKind::KeyRelease);
        let expect = self.axes.get(&device).copied().unwrap_or(0).min(6);
        if follows && carries_axes && expect > 0 {
            self.pending = Some(Pending {
                event,
                expect,
                got: 0,
            });
        } else {
            out.push(event);
        }
    }

    /// Fold a trailing valuator event into the pending core event.
    fn merge_valuators(&mut self, out: &mut Vec<RawEvent>, valuator: &xinput::DeviceValuatorEvent) {
        let Some(pending) = &mut self.pending else {
            // Unsolicited valuator data; nothing to attach it to.
            return;
        };
        if valuator.device_id & DEVICE_ID_MASK != pending.event.device {
            warn!(
                "valuator data for device {} while device {} is pending",
                valuator.device_id & DEVICE_ID_MASK,
                pending.event.device,
            );
            return;
        }
        let first = usize::from(valuator.first_valuator);
        let count = usize::from(valuator.num_valuators).min(valuator.valuators.len());
        for (offset, &value) in valuator.valuators[..count].iter().enumerate() {
            if let Some(slot) = pending.event.axis_data.get_mut(first + offset) {
                *slot = value;
            }
        }
        #[allow(clippy::cast_possible_truncation)]
        {
            pending.got = pending.got.saturating_add(count as u8);
        }
        if pending.got >= pending.expect {
            if let Some(pending) = self.pending.take() {
                out.push(pending.event);
            }
        }
    }
}

fn map_use(device_use: xinput::DeviceUse) -> DeviceUse {
    if device_use == xinput::DeviceUse::IS_X_POINTER {
        DeviceUse::Pointer
    } else if device_use == xinput::DeviceUse::IS_X_KEYBOARD {
        DeviceUse::Keyboard
    } else if device_use == xinput::DeviceUse::IS_X_EXTENSION_DEVICE {
        DeviceUse::Extension
    } else if device_use == xinput::DeviceUse::IS_X_EXTENSION_KEYBOARD {
        DeviceUse::ExtensionKeyboard
    } else if device_use == xinput::DeviceUse::IS_X_EXTENSION_POINTER {
        DeviceUse::ExtensionPointer
    } else {
        DeviceUse::Other
    }
}

impl PlatformImpl for Backend {
    fn list_devices(&mut self) -> Result<Vec<DeviceRecord>, PlatformError> {
        let reply = self.conn.xinput_list_input_devices()?.reply()?;
        let mut records = Vec::with_capacity(reply.devices.len());
        let mut infos = reply.infos.iter();
        for (device, name) in reply.devices.iter().zip(&reply.names) {
            // The class descriptors are flattened across all devices;
            // each device owns the next `num_class_info` of them.
            let classes = infos
                .by_ref()
                .take(usize::from(device.num_class_info))
                .filter_map(|info| match &info.info {
                    xinput::InputInfoInfo::Valuator(valuator) => Some(ClassRecord::Valuator {
                        axes: valuator
                            .axes
                            .iter()
                            .map(|axis| AxisRecord {
                                min: axis.minimum,
                                max: axis.maximum,
                                resolution: axis.resolution,
                            })
                            .collect(),
                    }),
                    xinput::InputInfoInfo::Button(button) => Some(ClassRecord::Buttons {
                        count: button.num_buttons,
                    }),
                    xinput::InputInfoInfo::Key(key) => Some(ClassRecord::Keys {
                        count: key.num_keys,
                    }),
                    _ => None,
                })
                .collect();

            // The device's type atom, resolved to its name for the
            // classification heuristics.
            let type_label = if device.device_type == 0 {
                None
            } else {
                self.conn
                    .get_atom_name(device.device_type)?
                    .reply()
                    .ok()
                    .map(|atom| String::from_utf8_lossy(&atom.name).into_owned())
            };

            records.push(DeviceRecord {
                id: device.device_id,
                name: String::from_utf8_lossy(&name.name).into_owned(),
                type_label,
                device_use: map_use(device.device_use),
                classes,
            });
        }
        Ok(records)
    }

    fn button_mapping(
        &mut self,
        device: DeviceId,
    ) -> Result<smallvec::SmallVec<[u8; 32]>, PlatformError> {
        self.conn
            .xinput_open_device(device)?
            .reply()
            .map_err(|_| PlatformError::OpenDevice(device))?;
        let mapping = self
            .conn
            .xinput_get_device_button_mapping(device)?
            .reply()
            .map(|reply| reply.map.into_iter().collect())
            .map_err(|_| PlatformError::OpenDevice(device));
        let _ = self.conn.xinput_close_device(device);
        mapping
    }

    fn button_state(&mut self, device: DeviceId) -> Result<u32, PlatformError> {
        self.conn
            .xinput_open_device(device)?
            .reply()
            .map_err(|_| PlatformError::OpenDevice(device))?;
        let state = self.conn.xinput_query_device_state(device)?.reply();
        let _ = self.conn.xinput_close_device(device);
        let state = state.map_err(|_| PlatformError::OpenDevice(device))?;

        let mut mask = 0u32;
        for class in &state.classes {
            if let Some(buttons) = class.data.as_button() {
                for button in 0..usize::from(buttons.num_buttons).min(32) {
                    if buttons.buttons[button / 8] & (1 << (button % 8)) != 0 {
                        mask |= 1 << button;
                    }
                }
            }
        }
        Ok(mask)
    }

    fn attach(
        &mut self,
        window: WindowId,
        devices: &[(DeviceId, u8)],
    ) -> Result<(), PlatformError> {
        self.axes.clear();
        let mut classes: Vec<xinput::EventClass> = Vec::new();
        for &(device, num_axes) in devices {
            self.axes.insert(device, num_axes);
            let open = self
                .conn
                .xinput_open_device(device)?
                .reply()
                .map_err(|_| PlatformError::OpenDevice(device))?;
            // An event class selects one event type of one device:
            // device id in the high byte, event type in the low.
            let class_for = |offset: u8, base: u8| {
                (u32::from(device) << 8) | u32::from(base.wrapping_add(offset))
            };
            for info in &open.class_info {
                let base = info.event_type_base;
                if info.class_id == xinput::InputClass::KEY
                    || info.class_id == xinput::InputClass::BUTTON
                    || info.class_id == xinput::InputClass::PROXIMITY
                {
                    // Press/in and release/out are consecutive types.
                    classes.push(class_for(0, base));
                    classes.push(class_for(1, base));
                } else if info.class_id == xinput::InputClass::VALUATOR {
                    classes.push(class_for(0, base));
                }
            }
        }
        if !classes.is_empty() {
            self.conn
                .xinput_select_extension_event(window, &classes)?
                .check()?;
        }
        self.conn.flush()?;
        Ok(())
    }

    fn poll(&mut self) -> Result<Vec<RawEvent>, PlatformError> {
        use x11rb::protocol::Event;
        let mut out = Vec::new();
        while let Some(event) = self.conn.poll_for_event()? {
            match event {
                Event::XinputDeviceMotionNotify(e) => {
                    self.begin(&mut out, RawKind::Motion, e.device_id, e.time);
                }
                Event::XinputDeviceButtonPress(e) => {
                    self.begin(&mut out, RawKind::ButtonPress, e.device_id, e.time);
                }
                Event::XinputDeviceButtonRelease(e) => {
                    self.begin(&mut out, RawKind::ButtonRelease, e.device_id, e.time);
                }
                Event::XinputDeviceKeyPress(e) => {
                    self.begin(&mut out, RawKind::KeyPress, e.device_id, e.time);
                }
                Event::XinputDeviceKeyRelease(e) => {
                    self.begin(&mut out, RawKind::KeyRelease, e.device_id, e.time);
                }
                Event::XinputProximityIn(e) => {
                    self.begin(&mut out, RawKind::ProximityIn, e.device_id, e.time);
                }
                Event::XinputProximityOut(e) => {
                    self.begin(&mut out, RawKind::ProximityOut, e.device_id, e.time);
                }
                Event::XinputDeviceValuator(e) => {
                    self.merge_valuators(&mut out, &e);
                }
                _ => {}
            }
        }
        // Anything still pending has all the data it is going to get.
        if let Some(pending) = self.pending.take() {
            out.push(pending.event);
        }
        Ok(out)
    }

    fn time_bias(&self) -> u32 {
        self.bias_ms
    }
}
