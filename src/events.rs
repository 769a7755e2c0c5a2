//! # Events
//!
//! The raw hardware events crossing the platform seam, and the notices the driver
//! posts back to the client window once a packet has been published.

use crate::platform::{DeviceId, WindowId};

/// The event kinds the driver subscribes to for every classified cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::AsRefStr, strum::IntoStaticStr)]
pub enum RawKind {
    Motion,
    ButtonPress,
    ButtonRelease,
    KeyPress,
    KeyRelease,
    ProximityIn,
    ProximityOut,
}

/// One hardware event, with its valuator data already reassembled.
///
/// Axis slots beyond what the device reports are zero; the positional meaning
/// (0 = X, 1 = Y, 2 = pressure, 3/4 = tilt) is fixed by the translation
/// pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: RawKind,
    pub device: DeviceId,
    /// Server timestamp, in the windowing system's time base.
    pub time: u32,
    pub axis_data: [i32; 6],
}

impl RawEvent {
    /// Build an event from a short axis slice, zero-padding the rest.
    #[must_use]
    pub fn new(kind: RawKind, device: DeviceId, time: u32, axes: &[i32]) -> Self {
        let mut axis_data = [0; 6];
        for (slot, value) in axis_data.iter_mut().zip(axes) {
            *slot = *value;
        }
        Self {
            kind,
            device,
            time,
            axis_data,
        }
    }
}

/// A one-way signal posted to the client window after the current packet has
/// been overwritten. The driver never waits for the client to consume it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notice {
    /// A new packet is available for polling.
    Packet { source: WindowId },
    /// The cursor entered or left detectable range.
    Proximity { source: WindowId, entering: bool },
}

impl Notice {
    /// The window this notice concerns.
    #[must_use]
    pub fn source(&self) -> WindowId {
        match *self {
            Self::Packet { source } | Self::Proximity { source, .. } => source,
        }
    }
    /// The message identifier a wintab client would receive for this notice,
    /// relative to the context's message base.
    #[must_use]
    pub fn message(&self, msg_base: u32) -> u32 {
        match self {
            Self::Packet { .. } => msg_base,
            Self::Proximity { .. } => msg_base + 5,
        }
    }
}

/// Host notification primitive: delivers notices to the client window.
///
/// Implementations must not block; delivery is fire-and-forget from the
/// event-dispatch path.
pub trait Notifier {
    fn post(&mut self, window: WindowId, notice: Notice);
}

/// Discards every notice. The default when no notifier is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn post(&mut self, _window: WindowId, _notice: Notice) {}
}

#[cfg(test)]
mod tests {
    use super::{Notice, RawEvent, RawKind};

    #[test]
    fn short_axis_slices_are_zero_padded() {
        let event = RawEvent::new(RawKind::Motion, 3, 10, &[500, 600]);
        assert_eq!(event.axis_data, [500, 600, 0, 0, 0, 0]);
    }

    #[test]
    fn notice_messages_offset_from_base() {
        let base = crate::context::DEFAULT_MSG_BASE;
        assert_eq!(Notice::Packet { source: 1 }.message(base), base);
        assert_eq!(
            Notice::Proximity {
                source: 1,
                entering: true
            }
            .message(base),
            base + 5
        );
    }
}
