//! # Wintab tablet API emulation over X11 `XInput`
//!
//! Re-implements the tablet half of the Wintab driver surface on top of the Xorg
//! input extension: device discovery and classification, the cursor/device
//! capability registry, translation of raw hardware events into fixed-layout
//! packets, and the structured `(category, index)` query interface clients poll.
//!
//! The flow mirrors the emulated platform: [`Driver::load_tablet_info`] populates
//! the [registry](registry::Registry) once, [`Driver::attach_event_queue`] wires
//! event subscriptions to a window, [`Driver::pump`] translates whatever arrived
//! and overwrites the single *current packet*, and clients pull state back out
//! through [`Driver::get_current_packet`] and [`Driver::query_info`].
//!
//! Failures on the emulated surface degrade to "no data" - an absent extension
//! means zero cursors, an unknown query means zero bytes - never a fault. That
//! permissiveness is part of the contract being emulated.
//!
//! To get started, create a [`Builder`].

#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod axis;
pub mod builder;
pub(crate) mod classify;
pub mod context;
pub mod cursor;
pub mod device;
pub mod events;
pub mod packet;
pub mod platform;
pub mod query;
pub mod registry;
pub(crate) mod translate;

pub use builder::Builder;
pub use platform::{DeviceId, WindowId};

use std::sync::{Mutex, MutexGuard, PoisonError};

use events::{Notice, Notifier, RawKind};
use packet::Packet;
use platform::{PlatformBackend, PlatformImpl};
use translate::{Clock, NoticeKind, Translator};

/// Failure to wire event subscriptions to a window.
#[derive(thiserror::Error, Debug)]
pub enum AttachError {
    /// The owner window could not be resolved to a native window.
    #[error("owner window could not be resolved")]
    BadWindow,
    #[error(transparent)]
    Platform(#[from] platform::PlatformError),
}

/// Errors that may occur during event pumping.
#[derive(thiserror::Error, Debug)]
pub enum PumpError {
    #[error(transparent)]
    Platform(#[from] platform::PlatformError),
}

fn lock_packet(packet: &Mutex<Packet>) -> MutexGuard<'_, Packet> {
    packet.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The driver context: every piece of state the emulated driver kept
/// process-wide, owned by one object constructed through [`Builder`].
///
/// A single thread drives discovery and [`pump`](Self::pump); the packet
/// accessors take `&self` and may be called from anywhere, the current packet
/// being guarded against torn reads internally.
pub struct Driver {
    backend: PlatformBackend,
    registry: registry::Registry,
    translator: Translator,
    packet: Mutex<Packet>,
    notifier: Box<dyn Notifier>,
    default_window: Option<WindowId>,
    attached: Option<WindowId>,
}

impl Driver {
    pub(crate) fn new(backend: PlatformBackend, notifier: Box<dyn Notifier>) -> Self {
        Self {
            backend,
            registry: registry::Registry::default(),
            translator: Translator::new(),
            packet: Mutex::new(Packet::default()),
            notifier,
            default_window: None,
            attached: None,
        }
    }

    /// One-shot initialization: enumerate the extension's devices and populate
    /// the registry. `default_window` is where notices will be posted.
    ///
    /// Discovery failure is not an error: an unavailable extension or a
    /// tablet-free seat simply leaves the registry at zero cursors, and every
    /// later query degrades accordingly.
    pub fn load_tablet_info(&mut self, default_window: WindowId) {
        self.default_window = Some(default_window);
        self.registry = registry::Registry::default();
        let records = match self.backend.list_devices() {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!("input extension reported as not available: {err}");
                return;
            }
        };
        tracing::trace!("extension reports {} devices", records.len());
        self.registry.classify(&records, &mut self.backend);
    }

    /// Subscribe the tablet event kinds for every discovered cursor on
    /// `owner`. With zero cursors this is a successful no-op.
    ///
    /// There is no unsubscribe; delivery continues until the window or the
    /// connection is torn down.
    #[allow(clippy::missing_errors_doc)]
    pub fn attach_event_queue(&mut self, owner: WindowId) -> Result<(), AttachError> {
        if owner == 0 {
            return Err(AttachError::BadWindow);
        }
        tracing::trace!(
            "creating context for window {owner:#x}, {} cursors",
            self.registry.cursor_count(),
        );
        let devices: Vec<(DeviceId, u8)> = self
            .registry
            .active_cursors()
            .map(|cursor| (cursor.phys_id, cursor.num_axes))
            .collect();
        self.backend.attach(owner, &devices)?;
        self.attached = Some(owner);
        Ok(())
    }

    /// [`attach_event_queue`](Self::attach_event_queue), resolving the window
    /// from a `raw-window-handle` carrier.
    #[allow(clippy::missing_errors_doc)]
    pub fn attach_event_queue_handle(
        &mut self,
        owner: &impl raw_window_handle::HasWindowHandle,
    ) -> Result<(), AttachError> {
        let window = platform::window_from_handle(owner).map_err(|_| AttachError::BadWindow)?;
        self.attach_event_queue(window)
    }

    /// Drain and translate pending hardware events. Each translated event
    /// overwrites the current packet and posts a notice to the default window.
    ///
    /// Must be called from the thread that owns the driver; handlers run to
    /// completion here, and button events perform a synchronous button-state
    /// round trip.
    #[allow(clippy::missing_errors_doc)]
    pub fn pump(&mut self) -> Result<(), PumpError> {
        let raws = self.backend.poll()?;
        let clock = Clock {
            bias_ms: self.backend.time_bias(),
        };
        for raw in raws {
            if matches!(raw.kind, RawKind::KeyPress | RawKind::KeyRelease) {
                tracing::debug!("received tablet key event; not implemented");
                continue;
            }
            // A miss here means the server's device set changed under us;
            // drop the event and move on.
            let Some(slot) = self.registry.slot_by_device(raw.device) else {
                continue;
            };
            if matches!(raw.kind, RawKind::ButtonPress | RawKind::ButtonRelease) {
                match self.backend.button_state(raw.device) {
                    Ok(mask) => self.translator.set_button_state(slot, mask),
                    Err(err) => {
                        tracing::warn!(
                            "could not refresh button state for device {}: {err}",
                            raw.device,
                        );
                    }
                }
            }
            if let Some((packet, kind)) = self.translator.translate(&self.registry, slot, &raw, clock)
            {
                *lock_packet(&self.packet) = packet;
                if let Some(target) = self.default_window {
                    let source = self.attached.unwrap_or(target);
                    let notice = match kind {
                        NoticeKind::Packet => Notice::Packet { source },
                        NoticeKind::Proximity { entering } => {
                            Notice::Proximity { source, entering }
                        }
                    };
                    self.notifier.post(target, notice);
                }
            }
        }
        Ok(())
    }

    /// Copy of the current packet. Always succeeds; before any event has been
    /// translated this is the zero packet - there is no "no packet yet"
    /// distinction.
    #[must_use]
    pub fn get_current_packet(&self) -> Packet {
        *lock_packet(&self.packet)
    }

    /// The structured query entry point; see [`query`] for the categories and
    /// indices. `None` output is a size-only probe returning the byte count a
    /// copy would produce.
    pub fn query_info(&self, category: u32, index: u32, output: Option<&mut Vec<u8>>) -> usize {
        query::query_info(&self.registry, category, index, output)
    }

    /// Read access to everything discovery learned.
    #[must_use]
    pub fn registry(&self) -> &registry::Registry {
        &self.registry
    }
}
