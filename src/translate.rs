//! # Event translation
//!
//! Converts reassembled hardware events into the fixed packet layout. One
//! translator exists per driver; it owns the shared serial counter and the
//! per-cursor button-state cache.

use tracing::trace;

use crate::cursor::CURSOR_MAX;
use crate::events::{RawEvent, RawKind};
use crate::packet::{altitude_tenth_degrees, azimuth_tenth_degrees, Packet, Status};
use crate::registry::Registry;

/// Maps server event timestamps into the host time base.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Clock {
    pub bias_ms: u32,
}

impl Clock {
    pub(crate) fn to_host(self, server: u32) -> u32 {
        server.wrapping_add(self.bias_ms)
    }
}

/// Which notice the client window should receive for a translated event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NoticeKind {
    Packet,
    Proximity { entering: bool },
}

pub(crate) struct Translator {
    /// Shared across every event kind; incremented once per translated event.
    serial: u32,
    /// Cached button masks, indexed by cursor slot. Refreshed only when a
    /// button event fires for that cursor, so motion packets may carry a
    /// stale mask - known, kept behavior.
    button_state: [u32; CURSOR_MAX],
}

impl Translator {
    pub(crate) fn new() -> Self {
        Self {
            serial: 0,
            button_state: [0; CURSOR_MAX],
        }
    }

    pub(crate) fn set_button_state(&mut self, slot: usize, mask: u32) {
        if let Some(state) = self.button_state.get_mut(slot) {
            *state = mask;
        }
    }

    #[cfg(test)]
    pub(crate) fn button_state(&self, slot: usize) -> u32 {
        self.button_state[slot]
    }

    /// Translate one event for the cursor in `slot` into the packet layout.
    ///
    /// Key events produce nothing. The returned packet's `cursor` field is
    /// `slot`, which the caller has already validated against the registry.
    pub(crate) fn translate(
        &mut self,
        registry: &Registry,
        slot: usize,
        raw: &RawEvent,
        clock: Clock,
    ) -> Option<(Packet, NoticeKind)> {
        if matches!(raw.kind, RawKind::KeyPress | RawKind::KeyRelease) {
            trace!("received tablet key event; no translation");
            return None;
        }
        let cursor = registry.cursor(slot)?;

        trace!(
            "received tablet {} event; device id {}, cursor num {slot}",
            raw.kind.as_ref(),
            raw.device,
        );

        let mut packet = Packet::default();
        // The packet reports inverted whenever the cursor is the eraser.
        let inverted = cursor.is_inverted();
        if inverted {
            packet.status |= Status::INVERT;
        }
        if raw.kind == RawKind::ProximityOut {
            packet.status |= Status::PROXIMITY;
        }
        packet.time = clock.to_host(raw.time);
        packet.serial = self.serial;
        self.serial = self.serial.wrapping_add(1);
        #[allow(clippy::cast_possible_truncation)]
        {
            packet.cursor = slot as u32;
        }
        packet.x = raw.axis_data[0];
        packet.y = raw.axis_data[1];
        #[allow(clippy::cast_sign_loss)]
        {
            packet.normal_pressure = raw.axis_data[2] as u32;
        }
        packet.orientation.azimuth = azimuth_tenth_degrees(raw.axis_data[3], raw.axis_data[4]);
        packet.orientation.altitude =
            altitude_tenth_degrees(raw.axis_data[3], raw.axis_data[4], inverted);
        packet.buttons = self.button_state.get(slot).copied().unwrap_or(0);

        let notice = match raw.kind {
            RawKind::ProximityIn => NoticeKind::Proximity { entering: true },
            RawKind::ProximityOut => NoticeKind::Proximity { entering: false },
            _ => NoticeKind::Packet,
        };
        Some((packet, notice))
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, NoticeKind, Translator};
    use crate::cursor::{Cursor, CursorType};
    use crate::events::{RawEvent, RawKind};
    use crate::packet::Status;
    use crate::registry::test_support::registry_with_cursors;

    fn pen_and_eraser() -> crate::registry::Registry {
        registry_with_cursors(vec![
            Cursor {
                name: "Wacom Stylus".to_owned(),
                cursor_type: CursorType::Pen,
                phys_id: 2,
                active: true,
                ..Cursor::default()
            },
            Cursor {
                name: "Wacom Eraser".to_owned(),
                cursor_type: CursorType::Eraser,
                phys_id: 3,
                active: true,
                ..Cursor::default()
            },
        ])
    }

    #[test]
    fn motion_populates_the_packet() {
        let registry = pen_and_eraser();
        let mut translator = Translator::new();
        let raw = RawEvent::new(RawKind::Motion, 2, 1000, &[500, 501, 300, 10, 0]);
        let (packet, notice) = translator
            .translate(&registry, 0, &raw, Clock { bias_ms: 5 })
            .unwrap();
        assert_eq!(notice, NoticeKind::Packet);
        assert_eq!(packet.x, 500);
        assert_eq!(packet.y, 501);
        assert_eq!(packet.normal_pressure, 300);
        assert_eq!(packet.cursor, 0);
        assert_eq!(packet.time, 1005);
        assert_eq!(packet.status, Status::empty());
        assert_eq!(packet.orientation.azimuth, 900);
        assert_eq!(packet.orientation.altitude, 850);
        assert_eq!(packet.buttons, 0);
    }

    #[test]
    fn eraser_packets_invert_and_negate_altitude() {
        let registry = pen_and_eraser();
        let mut translator = Translator::new();
        let raw = RawEvent::new(RawKind::Motion, 3, 0, &[0, 0, 0, 10, 0]);
        let (packet, _) = translator
            .translate(&registry, 1, &raw, Clock::default())
            .unwrap();
        assert!(packet.status.contains(Status::INVERT));
        assert_eq!(packet.orientation.altitude, -850);
    }

    #[test]
    fn proximity_out_sets_the_leaving_bit() {
        let registry = pen_and_eraser();
        let mut translator = Translator::new();
        let raw = RawEvent::new(RawKind::ProximityOut, 2, 0, &[]);
        let (packet, notice) = translator
            .translate(&registry, 0, &raw, Clock::default())
            .unwrap();
        assert!(packet.status.contains(Status::PROXIMITY));
        assert_eq!(notice, NoticeKind::Proximity { entering: false });

        let raw = RawEvent::new(RawKind::ProximityIn, 2, 0, &[]);
        let (packet, notice) = translator
            .translate(&registry, 0, &raw, Clock::default())
            .unwrap();
        assert!(!packet.status.contains(Status::PROXIMITY));
        assert_eq!(notice, NoticeKind::Proximity { entering: true });
    }

    #[test]
    fn serial_is_shared_across_event_kinds() {
        let registry = pen_and_eraser();
        let mut translator = Translator::new();
        let kinds = [
            RawKind::Motion,
            RawKind::ButtonPress,
            RawKind::ProximityIn,
            RawKind::Motion,
        ];
        for (expected, kind) in kinds.into_iter().enumerate() {
            let raw = RawEvent::new(kind, 2, 0, &[]);
            let (packet, _) = translator
                .translate(&registry, 0, &raw, Clock::default())
                .unwrap();
            assert_eq!(packet.serial as usize, expected);
        }
    }

    #[test]
    fn key_events_translate_to_nothing() {
        let registry = pen_and_eraser();
        let mut translator = Translator::new();
        let raw = RawEvent::new(RawKind::KeyPress, 2, 0, &[]);
        assert!(translator
            .translate(&registry, 0, &raw, Clock::default())
            .is_none());
        // And they don't consume a serial number.
        let raw = RawEvent::new(RawKind::Motion, 2, 0, &[]);
        let (packet, _) = translator
            .translate(&registry, 0, &raw, Clock::default())
            .unwrap();
        assert_eq!(packet.serial, 0);
    }

    #[test]
    fn motion_reads_the_cached_button_mask_without_refreshing() {
        let registry = pen_and_eraser();
        let mut translator = Translator::new();
        translator.set_button_state(0, 0b101);
        let raw = RawEvent::new(RawKind::Motion, 2, 0, &[]);
        let (packet, _) = translator
            .translate(&registry, 0, &raw, Clock::default())
            .unwrap();
        assert_eq!(packet.buttons, 0b101);
        assert_eq!(translator.button_state(0), 0b101);
    }
}
