//! Shared controller state and its lifecycle
//!
//! One process-wide virtual device, guarded by a single `parking_lot::Mutex`.
//! The poller thread is the only writer of the live snapshot; query callers
//! read it (and the keystroke synthesizer read-modify-writes its own
//! sub-record) under the same lock, so no torn reads are observable.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::keystroke;
use crate::pad::{buttons, Capabilities, CapabilitiesEx, Gamepad, Keystroke, State};
use crate::pad::{DEVSUBTYPE_GAMEPAD, FLAG_GAMEPAD, PRODUCT_ID, VENDOR_ID};
use crate::wire::StateUpdate;

/// Number of caller-visible device slots
pub const MAX_SLOTS: u32 = 4;

/// Wildcard slot accepted by the keystroke query
pub const SLOT_ANY: u32 = 0x00FF;

/// Initial slot-remap value. Deliberately coincides with the highest legal
/// slot index: a caller that probes slot 3 first makes slot 3 canonical.
/// Observed provider-compatible behavior, kept as-is.
const SLOT_SENTINEL: u8 = 3;

/// Lock-protected portion of the controller state
#[derive(Debug, Default)]
struct Shared {
    caps: Capabilities,
    state: State,
    /// State as of the most recently emitted keystroke
    last_keystroke: Gamepad,
    enabled: bool,
    connected: bool,
    /// Device id accepted by the discovery handshake; 0 while unbound
    id: i32,
}

/// The single virtualized controller
///
/// All mutation goes through methods; nothing outside this module touches
/// the lock or the remap byte directly.
#[derive(Debug)]
pub struct Controller {
    shared: Mutex<Shared>,
    /// Smallest slot index ever presented to a query (slot remap value)
    min_slot: AtomicU8,
    /// Cleared on teardown; the poller exits on its next iteration
    running: AtomicBool,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    pub fn new() -> Self {
        Self {
            shared: Mutex::new(Shared::default()),
            min_slot: AtomicU8::new(SLOT_SENTINEL),
            running: AtomicBool::new(false),
        }
    }

    /// Remap a validated slot index per the slot-remap rule: the smallest
    /// index ever queried becomes canonical and addresses the single device
    /// at slot 0; every other index stays as-is and reads as disconnected.
    pub fn resolve_slot(&self, index: u32) -> u32 {
        debug_assert!(index < MAX_SLOTS);
        let prev = self.min_slot.fetch_min(index as u8, Ordering::AcqRel);
        if index as u8 <= prev {
            0
        } else {
            index
        }
    }

    fn slot_connected(&self, resolved: u32, shared: &Shared) -> bool {
        resolved == 0 && shared.connected
    }

    /// Handle a discovery reply from the provider. A positive id binds the
    /// device and (if needed) transitions to connected with fresh
    /// capabilities; id 0 clears the binding. Negative ids are ignored.
    pub fn handle_device_reply(&self, device_id: i32) {
        let mut shared = self.shared.lock();
        if device_id > 0 {
            shared.id = device_id;
            if !shared.connected {
                shared.state = State::default();
                shared.last_keystroke = Gamepad::default();
                shared.caps = Capabilities::full_range();
                shared.connected = true;
                shared.enabled = true;
                info!(device_id, "provider device bound");
            }
        } else if device_id == 0 {
            if shared.connected {
                info!("provider reported no device, disconnecting");
            }
            shared.id = 0;
            shared.connected = false;
        }
    }

    /// Whether the device is currently connected (used by the poller to
    /// gate state ingestion).
    pub fn connected(&self) -> bool {
        self.shared.lock().connected
    }

    /// Apply a decoded state update.
    ///
    /// An invalid flag or an id that does not match the bound device is a
    /// hard consistency failure: the device is marked disconnected and the
    /// snapshot zeroed. The packet number increments only on acceptance.
    pub fn apply_state_update(&self, update: &StateUpdate) {
        let mut shared = self.shared.lock();
        if !update.valid || update.device_id != shared.id {
            warn!(
                claimed = update.device_id,
                bound = shared.id,
                valid = update.valid,
                "inconsistent state update, disconnecting"
            );
            shared.connected = false;
            shared.state = State::default();
            return;
        }
        shared.state.gamepad = update.to_gamepad();
        shared.state.packet_number = shared.state.packet_number.wrapping_add(1);
    }

    /// Read the snapshot for a resolved slot. The reserved guide bit is
    /// masked off unless `extended` is set. While the device is disabled the
    /// snapshot reads as neutral.
    pub fn read_state(&self, resolved: u32, extended: bool) -> Result<State> {
        let shared = self.shared.lock();
        if !self.slot_connected(resolved, &shared) {
            return Err(Error::DeviceNotConnected);
        }
        let mut state = shared.state;
        if !shared.enabled {
            state.gamepad = Gamepad::default();
        }
        if !extended {
            state.gamepad.buttons &= !buttons::GUIDE;
        }
        Ok(state)
    }

    /// Read capabilities plus vendor/product ids, honoring the gamepad
    /// class filter.
    pub fn read_capabilities(&self, resolved: u32, flags: u32) -> Result<CapabilitiesEx> {
        let shared = self.shared.lock();
        if !self.slot_connected(resolved, &shared) {
            return Err(Error::DeviceNotConnected);
        }
        if flags & FLAG_GAMEPAD != 0 && shared.caps.sub_type != DEVSUBTYPE_GAMEPAD {
            return Err(Error::DeviceNotConnected);
        }
        Ok(CapabilitiesEx {
            capabilities: shared.caps,
            vendor_id: VENDOR_ID,
            product_id: PRODUCT_ID,
        })
    }

    /// Check connectivity only (vibration and battery/audio stubs)
    pub fn check_connected(&self, resolved: u32) -> Result<()> {
        let shared = self.shared.lock();
        if !self.slot_connected(resolved, &shared) {
            return Err(Error::DeviceNotConnected);
        }
        Ok(())
    }

    /// Flip the `enabled` gate. No effect while disconnected, and never
    /// affects ingestion.
    pub fn set_enabled(&self, enabled: bool) {
        let mut shared = self.shared.lock();
        if !shared.connected {
            return;
        }
        shared.enabled = enabled;
    }

    /// Synthesize the next discrete event for a resolved slot, if any.
    ///
    /// The read of the current snapshot and the write of the last-keystroke
    /// record happen under one lock acquisition, so concurrent callers never
    /// claim the same transition twice.
    pub fn next_keystroke(&self, resolved: u32) -> Result<Option<Keystroke>> {
        let mut shared = self.shared.lock();
        if !self.slot_connected(resolved, &shared) {
            return Err(Error::DeviceNotConnected);
        }
        if !shared.enabled {
            return Ok(None);
        }
        let current = shared.state.gamepad;
        Ok(keystroke::next(&current, &mut shared.last_keystroke))
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    /// Reset to the initial disconnected state (teardown). Also restores
    /// the slot-remap sentinel so a later probe re-chooses the canonical
    /// slot.
    pub fn reset(&self) {
        let mut shared = self.shared.lock();
        *shared = Shared::default();
        self.min_slot.store(SLOT_SENTINEL, Ordering::Release);
        debug!("controller state reset");
    }
}
