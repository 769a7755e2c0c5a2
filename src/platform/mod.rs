//! The seam between the driver and the windowing system's input extension.
//!
//! Enumeration snapshots and events cross this boundary as plain data
//! ([`DeviceRecord`], [`crate::events::RawEvent`]); the live round trips
//! (device open, button mapping, state queries, event selection) go through
//! [`PlatformImpl`]. Exactly one live backend exists - the Xorg `XInput`
//! extension - plus the always-available [`synthetic`] backend for driving the
//! pipeline without a server.

pub mod synthetic;
#[cfg(xinput1)]
pub(crate) mod xinput;

use crate::events::RawEvent;

/// Opaque per-device identifier assigned by the extension. The join key
/// between raw events and cursor slots.
pub type DeviceId = u8;

/// Native window identifier.
pub type WindowId = u32;

/// How the server classifies an input device. Only [`Extension`]
/// (`DeviceUse::Extension`) devices are candidates for classification; core
/// pointers and keyboards are never tablets from the driver's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::AsRefStr, strum::IntoStaticStr)]
pub enum DeviceUse {
    Pointer,
    Keyboard,
    Extension,
    ExtensionKeyboard,
    ExtensionPointer,
    Other,
}

/// Range and resolution of one valuator, as reported by the extension.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AxisRecord {
    pub min: i32,
    pub max: i32,
    pub resolution: u32,
}

/// One input-class descriptor from a device's enumeration entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassRecord {
    Valuator { axes: Vec<AxisRecord> },
    Buttons { count: u16 },
    Keys { count: u16 },
}

/// Enumeration snapshot of one input device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceRecord {
    pub id: DeviceId,
    /// Displayable device name.
    pub name: String,
    /// Name of the device's type atom, when the server reports one.
    pub type_label: Option<String>,
    pub device_use: DeviceUse,
    pub classes: Vec<ClassRecord>,
}

#[derive(thiserror::Error, Debug)]
pub enum PlatformError {
    #[error("input extension is not available")]
    ExtensionUnavailable,
    #[error("device {0} could not be opened")]
    OpenDevice(DeviceId),
    #[cfg(xinput1)]
    #[error(transparent)]
    Connect(#[from] x11rb::errors::ConnectError),
    #[cfg(xinput1)]
    #[error(transparent)]
    Connection(#[from] x11rb::errors::ConnectionError),
    #[cfg(xinput1)]
    #[error(transparent)]
    Reply(#[from] x11rb::errors::ReplyError),
}

/// Failure to pull a native window id out of a `raw-window-handle` handle.
#[derive(thiserror::Error, Debug)]
pub enum HandleResolveError {
    /// The handle doesn't carry an X11 window.
    #[error("handle doesn't contain a supported window type")]
    Unsupported,
    #[error("{:?}", .0)]
    Handle(raw_window_handle::HandleError),
}
// #[from] thiserror attribute breaks horribly D:
impl From<raw_window_handle::HandleError> for HandleResolveError {
    fn from(value: raw_window_handle::HandleError) -> Self {
        Self::Handle(value)
    }
}

/// Resolve a native X window id from a `raw-window-handle` carrier.
#[allow(clippy::missing_errors_doc)]
pub fn window_from_handle(
    handle: &impl raw_window_handle::HasWindowHandle,
) -> Result<WindowId, HandleResolveError> {
    match handle.window_handle()?.as_raw() {
        raw_window_handle::RawWindowHandle::Xlib(xlib) => {
            // XIDs only occupy the low 32 bits, xlib just types them wide.
            u32::try_from(xlib.window).map_err(|_| HandleResolveError::Unsupported)
        }
        raw_window_handle::RawWindowHandle::Xcb(xcb) => Ok(xcb.window.get()),
        _ => Err(HandleResolveError::Unsupported),
    }
}

/// Trait every backend implements, giving the driver higher-level access to
/// the extension black box.
///
/// All round trips block without timeout; a hung server hangs the caller.
#[enum_dispatch::enum_dispatch]
pub(crate) trait PlatformImpl {
    /// Enumerate every input device on the connection.
    fn list_devices(&mut self) -> Result<Vec<DeviceRecord>, PlatformError>;
    /// Open a device and read its physical-to-logical button mapping. An empty
    /// mapping means the device has no buttons.
    fn button_mapping(&mut self, device: DeviceId)
        -> Result<smallvec::SmallVec<[u8; 32]>, PlatformError>;
    /// Query the device's current button state as a bitmask (bit `i` = button
    /// `i` down). Synchronous round trip.
    fn button_state(&mut self, device: DeviceId) -> Result<u32, PlatformError>;
    /// Subscribe the seven tablet event kinds for each listed device on the
    /// window. The per-device axis count is used to reassemble split wire
    /// events.
    fn attach(&mut self, window: WindowId, devices: &[(DeviceId, u8)])
        -> Result<(), PlatformError>;
    /// Drain pending events, reassembled and in delivery order.
    fn poll(&mut self) -> Result<Vec<RawEvent>, PlatformError>;
    /// Offset mapping server timestamps into the host time base.
    fn time_bias(&self) -> u32;
}

/// Static dispatch between compiled backends.
#[enum_dispatch::enum_dispatch(PlatformImpl)]
pub(crate) enum PlatformBackend {
    #[cfg(xinput1)]
    XInput(xinput::Backend),
    Synthetic(synthetic::Backend),
}
