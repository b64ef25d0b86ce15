//! Virtualize a single game controller behind an XInput-style polling API
//!
//! The real input originates in a companion provider process reached over a
//! loopback UDP channel. This crate discovers that process, keeps the
//! connection alive, decodes its datagrams into a canonical snapshot and
//! answers synchronous queries from arbitrary caller threads.
//!
//! The first call to any query function lazily starts a single background
//! poller thread (blocking that caller for at most two seconds while
//! discovery completes). Every later query reads the shared controller
//! state under one lock. Callers probe device slots 0..=3; the smallest
//! slot ever probed becomes the canonical address of the one virtual
//! device, and all other slots read as disconnected.

mod error;
mod keystroke;
mod pad;
mod poller;
mod state;
mod transport;
mod wire;

#[cfg(test)]
mod testutil;

use std::sync::mpsc;
use std::sync::{Arc, Once};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::{debug, error, info};

pub use error::{Error, Result};
pub use pad::{
    buttons, vk, Capabilities, CapabilitiesEx, Edge, Gamepad, Keystroke, State, Vibration,
    DEVSUBTYPE_GAMEPAD, DEVTYPE_GAMEPAD, FLAG_GAMEPAD, PRODUCT_ID, VENDOR_ID,
};
pub use state::{MAX_SLOTS, SLOT_ANY};
pub use wire::{BRIDGE_PORT, PROVIDER_PORT};

use poller::Ports;
use state::Controller;

/// Ceiling on the first caller's wait for the discovery handshake
const STARTUP_TIMEOUT: Duration = Duration::from_secs(2);

/// One virtual controller plus its background poller
///
/// The process-wide instance behind the free functions is usually all a
/// host needs; an explicit runtime exists so the component has no ambient
/// global access of its own.
pub struct PadRuntime {
    controller: Arc<Controller>,
    ports: Ports,
    start: Once,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl PadRuntime {
    /// Runtime on the process-wide port pair
    pub fn new() -> Self {
        Self::with_ports(Ports::default())
    }

    pub(crate) fn with_ports(ports: Ports) -> Self {
        Self {
            controller: Arc::new(Controller::new()),
            ports,
            start: Once::new(),
            poller: Mutex::new(None),
        }
    }

    /// Idempotent lazy startup: the first caller spawns the poller thread
    /// and waits (bounded) for the discovery handshake; everyone else falls
    /// through immediately.
    fn ensure_started(&self) {
        self.start.call_once(|| {
            self.controller.set_running(true);
            let (ready_tx, ready_rx) = mpsc::channel();
            let controller = Arc::clone(&self.controller);
            let ports = self.ports;
            match thread::Builder::new()
                .name("xpad-bridge-poller".into())
                .spawn(move || poller::run(controller, ports, ready_tx))
            {
                Ok(handle) => {
                    *self.poller.lock() = Some(handle);
                    if ready_rx.recv_timeout(STARTUP_TIMEOUT).is_err() {
                        debug!("provider not ready within {STARTUP_TIMEOUT:?}, continuing");
                    }
                }
                Err(e) => {
                    error!("failed to spawn poller thread: {e}");
                    self.controller.set_running(false);
                }
            }
        });
    }

    fn validate_and_resolve(&self, slot: u32) -> Result<u32> {
        if slot >= MAX_SLOTS {
            return Err(Error::BadArgument);
        }
        Ok(self.controller.resolve_slot(slot))
    }

    /// Current snapshot for the addressed slot. The reserved guide bit is
    /// masked off; use [`PadRuntime::get_state_ex`] to see it.
    pub fn get_state(&self, slot: u32) -> Result<State> {
        self.ensure_started();
        let resolved = self.validate_and_resolve(slot)?;
        self.controller.read_state(resolved, false)
    }

    /// Like [`PadRuntime::get_state`] but exposes the reserved guide bit
    pub fn get_state_ex(&self, slot: u32) -> Result<State> {
        self.ensure_started();
        let resolved = self.validate_and_resolve(slot)?;
        self.controller.read_state(resolved, true)
    }

    /// Stored capabilities for the addressed slot, `flags` per [`FLAG_GAMEPAD`]
    pub fn get_capabilities(&self, slot: u32, flags: u32) -> Result<Capabilities> {
        self.get_capabilities_ex(slot, flags).map(|caps| caps.capabilities)
    }

    /// Capabilities plus fixed vendor/product identifiers
    pub fn get_capabilities_ex(&self, slot: u32, flags: u32) -> Result<CapabilitiesEx> {
        self.ensure_started();
        let resolved = self.validate_and_resolve(slot)?;
        self.controller.read_capabilities(resolved, flags)
    }

    /// Validate slot and connectivity; the vibration itself is discarded,
    /// this device has no force-feedback path.
    pub fn set_vibration(&self, slot: u32, _vibration: Vibration) -> Result<()> {
        self.ensure_started();
        let resolved = self.validate_and_resolve(slot)?;
        self.controller.check_connected(resolved)
    }

    /// Gate state and keystroke visibility. While disabled, state reads as
    /// neutral and no keystrokes are reported; ingestion continues
    /// unaffected. No effect while disconnected.
    pub fn set_enabled(&self, enabled: bool) {
        self.ensure_started();
        self.controller.set_enabled(enabled);
    }

    /// Next pending discrete event for the addressed slot, or `Ok(None)`
    /// when nothing changed since the last reported event. Also accepts the
    /// [`SLOT_ANY`] wildcard.
    pub fn get_keystroke(&self, slot: u32) -> Result<Option<Keystroke>> {
        self.ensure_started();
        let resolved = if slot == SLOT_ANY {
            0
        } else {
            self.validate_and_resolve(slot)?
        };
        self.controller.next_keystroke(resolved)
    }

    /// Battery reporting is not available on this device: validates the
    /// slot and connectivity, then always reports [`Error::NotSupported`].
    pub fn get_battery_information(&self, slot: u32) -> Result<()> {
        self.ensure_started();
        let resolved = self.validate_and_resolve(slot)?;
        self.controller.check_connected(resolved)?;
        Err(Error::NotSupported)
    }

    /// Headset audio device enumeration, same contract as
    /// [`PadRuntime::get_battery_information`]
    pub fn get_audio_device_ids(&self, slot: u32) -> Result<()> {
        self.ensure_started();
        let resolved = self.validate_and_resolve(slot)?;
        self.controller.check_connected(resolved)?;
        Err(Error::NotSupported)
    }

    /// Teardown: stop the poller (which sends the release notice and closes
    /// the socket on its way out) and reset all state, including the
    /// slot-remap value. Idempotent.
    pub fn shutdown(&self) {
        self.controller.set_running(false);
        let handle = self.poller.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("poller thread panicked during shutdown");
            }
        }
        self.controller.reset();
        info!("runtime shut down");
    }
}

impl Default for PadRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PadRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

static RUNTIME: Lazy<PadRuntime> = Lazy::new(PadRuntime::new);

/// See [`PadRuntime::get_state`]
pub fn get_state(slot: u32) -> Result<State> {
    RUNTIME.get_state(slot)
}

/// See [`PadRuntime::get_state_ex`]
pub fn get_state_ex(slot: u32) -> Result<State> {
    RUNTIME.get_state_ex(slot)
}

/// See [`PadRuntime::get_capabilities`]
pub fn get_capabilities(slot: u32, flags: u32) -> Result<Capabilities> {
    RUNTIME.get_capabilities(slot, flags)
}

/// See [`PadRuntime::get_capabilities_ex`]
pub fn get_capabilities_ex(slot: u32, flags: u32) -> Result<CapabilitiesEx> {
    RUNTIME.get_capabilities_ex(slot, flags)
}

/// See [`PadRuntime::set_vibration`]
pub fn set_vibration(slot: u32, vibration: Vibration) -> Result<()> {
    RUNTIME.set_vibration(slot, vibration)
}

/// See [`PadRuntime::set_enabled`]
pub fn set_enabled(enabled: bool) {
    RUNTIME.set_enabled(enabled)
}

/// See [`PadRuntime::get_keystroke`]
pub fn get_keystroke(slot: u32) -> Result<Option<Keystroke>> {
    RUNTIME.get_keystroke(slot)
}

/// See [`PadRuntime::get_battery_information`]
pub fn get_battery_information(slot: u32) -> Result<()> {
    RUNTIME.get_battery_information(slot)
}

/// See [`PadRuntime::get_audio_device_ids`]
pub fn get_audio_device_ids(slot: u32) -> Result<()> {
    RUNTIME.get_audio_device_ids(slot)
}

/// See [`PadRuntime::shutdown`]
pub fn shutdown() {
    RUNTIME.shutdown()
}
