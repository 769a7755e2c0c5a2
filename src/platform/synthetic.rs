//! A server-free backend driven entirely from code.
//!
//! Devices are described up front as [`DeviceRecord`]s; events and button
//! states are injected afterwards through the shared [`Hub`] handle. Useful
//! for exercising the full discovery and translation pipeline in headless
//! environments and tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::events::RawEvent;

use super::{ClassRecord, DeviceId, DeviceRecord, PlatformError, PlatformImpl, WindowId};

#[derive(Default)]
struct Shared {
    records: Vec<DeviceRecord>,
    queue: VecDeque<RawEvent>,
    button_states: HashMap<DeviceId, u32>,
    unopenable: HashSet<DeviceId>,
    attached: Option<(WindowId, Vec<(DeviceId, u8)>)>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Control handle for a synthetic backend. The handle and the backend share
/// one state, so pushes made here surface on the next driver pump.
pub struct Hub {
    shared: Arc<Mutex<Shared>>,
}

impl Hub {
    /// Queue a raw event for the next poll.
    pub fn push(&self, event: RawEvent) {
        lock(&self.shared).queue.push_back(event);
    }

    /// Script the button mask a state query for `device` will report.
    pub fn set_button_state(&self, device: DeviceId, mask: u32) {
        lock(&self.shared).button_states.insert(device, mask);
    }

    /// Make every open attempt for `device` fail, as an unresponsive or
    /// vanished device would.
    pub fn refuse_open(&self, device: DeviceId) {
        lock(&self.shared).unopenable.insert(device);
    }

    /// The window events were last attached to, if any.
    #[must_use]
    pub fn attached_window(&self) -> Option<WindowId> {
        lock(&self.shared).attached.as_ref().map(|(window, _)| *window)
    }

    /// The devices whose events were selected at the last attach.
    #[must_use]
    pub fn selected_devices(&self) -> Vec<DeviceId> {
        lock(&self.shared)
            .attached
            .as_ref()
            .map(|(_, devices)| devices.iter().map(|&(device, _)| device).collect())
            .unwrap_or_default()
    }
}

pub(crate) struct Backend {
    shared: Arc<Mutex<Shared>>,
}

impl Backend {
    pub(crate) fn new(records: Vec<DeviceRecord>) -> (Self, Hub) {
        let shared = Arc::new(Mutex::new(Shared {
            records,
            ..Shared::default()
        }));
        (
            Self {
                shared: Arc::clone(&shared),
            },
            Hub { shared },
        )
    }
}

impl PlatformImpl for Backend {
    fn list_devices(&mut self) -> Result<Vec<DeviceRecord>, PlatformError> {
        Ok(lock(&self.shared).records.clone())
    }

    fn button_mapping(
        &mut self,
        device: DeviceId,
    ) -> Result<smallvec::SmallVec<[u8; 32]>, PlatformError> {
        let shared = lock(&self.shared);
        if shared.unopenable.contains(&device) {
            return Err(PlatformError::OpenDevice(device));
        }
        let record = shared
            .records
            .iter()
            .find(|record| record.id == device)
            .ok_or(PlatformError::OpenDevice(device))?;
        let count = record
            .classes
            .iter()
            .find_map(|class| match class {
                ClassRecord::Buttons { count } => Some(*count),
                _ => None,
            })
            .unwrap_or(0);
        // Identity mapping, like an unconfigured server's.
        Ok((1..=count)
            .map(|button| u8::try_from(button).unwrap_or(u8::MAX))
            .collect())
    }

    fn button_state(&mut self, device: DeviceId) -> Result<u32, PlatformError> {
        let shared = lock(&self.shared);
        if shared.unopenable.contains(&device) {
            return Err(PlatformError::OpenDevice(device));
        }
        Ok(shared.button_states.get(&device).copied().unwrap_or(0))
    }

    fn attach(
        &mut self,
        window: WindowId,
        devices: &[(DeviceId, u8)],
    ) -> Result<(), PlatformError> {
        lock(&self.shared).attached = Some((window, devices.to_vec()));
        Ok(())
    }

    fn poll(&mut self) -> Result<Vec<RawEvent>, PlatformError> {
        Ok(lock(&self.shared).queue.drain(..).collect())
    }

    fn time_bias(&self) -> u32 {
        0
    }
}
