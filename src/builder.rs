//! Builder-style configuration for constructing a [`Driver`].
//!
//! For a live X11 driver, `Builder::new().build_shared(handle)` is all you need.
//! `build_synthetic` produces a server-free driver plus the control handle for
//! injecting devices and events.

use crate::events::{Notifier, NullNotifier};
use crate::platform::{self, synthetic, DeviceRecord, PlatformBackend};
use crate::Driver;

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    /// The given handle doesn't use a supported connection type.
    /// This includes cases where the platform is otherwise supported but the
    /// feature was disabled at compile-time.
    #[error("handle doesn't contain a supported display type")]
    Unsupported,
    /// Failed to acquire a display handle.
    #[error("{:?}", .0)]
    HandleError(raw_window_handle::HandleError),
    /// Connecting to the server or probing the input extension failed.
    #[error(transparent)]
    Platform(#[from] platform::PlatformError),
}
// #[from] thiserror attribute breaks horribly D:
impl From<raw_window_handle::HandleError> for BuildError {
    fn from(value: raw_window_handle::HandleError) -> Self {
        Self::HandleError(value)
    }
}

/// Pre-construction configuration for a [`Driver`].
pub struct Builder {
    notifier: Box<dyn Notifier>,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            notifier: Box::new(NullNotifier),
        }
    }
}

/// # Configuration
impl Builder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the notification primitive that delivers packet-ready and
    /// proximity notices to the client window. Defaults to discarding them.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }
}

/// # Finishing
impl Builder {
    /// Build a live driver from a shared display handle carrier, such as an
    /// `Arc`'d `winit` window. The handle is only inspected to pick the
    /// backend; the driver maintains its own server connection.
    #[cfg(xinput1)]
    #[allow(clippy::missing_errors_doc)]
    pub fn build_shared(
        self,
        rwh: std::sync::Arc<impl raw_window_handle::HasDisplayHandle + 'static>,
    ) -> Result<Driver, BuildError> {
        match rwh.display_handle()?.as_raw() {
            raw_window_handle::RawDisplayHandle::Xlib(_)
            | raw_window_handle::RawDisplayHandle::Xcb(_) => {
                let backend = platform::xinput::Backend::connect()?;
                Ok(Driver::new(PlatformBackend::from(backend), self.notifier))
            }
            _ => Err(BuildError::Unsupported),
        }
    }

    /// Build a driver over the synthetic backend, returning the
    /// [`Hub`](synthetic::Hub) used to script events and button states.
    #[must_use]
    pub fn build_synthetic(self, records: Vec<DeviceRecord>) -> (Driver, synthetic::Hub) {
        let (backend, hub) = synthetic::Backend::new(records);
        (
            Driver::new(PlatformBackend::from(backend), self.notifier),
            hub,
        )
    }
}
