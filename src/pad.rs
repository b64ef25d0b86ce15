//! Canonical gamepad data model
//!
//! Snapshot, capabilities and keystroke types shared by the decoder, the
//! controller state and the public query surface. The layout follows the
//! standard Xbox-style gamepad contract: a 16-bit button mask, two analog
//! triggers and four signed 16-bit thumbstick axes.

/// Button bit flags for the 16-bit button mask
///
/// These match the XInput wire values so that snapshots read through the
/// public surface are directly usable by XInput-aware callers.
pub mod buttons {
    pub const DPAD_UP: u16 = 0x0001;
    pub const DPAD_DOWN: u16 = 0x0002;
    pub const DPAD_LEFT: u16 = 0x0004;
    pub const DPAD_RIGHT: u16 = 0x0008;
    pub const START: u16 = 0x0010;
    pub const BACK: u16 = 0x0020;
    pub const LEFT_THUMB: u16 = 0x0040;
    pub const RIGHT_THUMB: u16 = 0x0080;
    pub const LEFT_SHOULDER: u16 = 0x0100;
    pub const RIGHT_SHOULDER: u16 = 0x0200;
    /// Reserved media/guide bit, exposed only by the extended state query
    pub const GUIDE: u16 = 0x0400;
    pub const A: u16 = 0x1000;
    pub const B: u16 = 0x2000;
    pub const X: u16 = 0x4000;
    pub const Y: u16 = 0x8000;
}

/// Virtual-key codes emitted by the keystroke synthesizer
///
/// Same numbering as the `VK_PAD_*` family so discrete events line up with
/// the XInput keystroke contract.
pub mod vk {
    pub const PAD_A: u16 = 0x5800;
    pub const PAD_B: u16 = 0x5801;
    pub const PAD_X: u16 = 0x5802;
    pub const PAD_Y: u16 = 0x5803;
    pub const PAD_RSHOULDER: u16 = 0x5804;
    pub const PAD_LSHOULDER: u16 = 0x5805;
    pub const PAD_LTRIGGER: u16 = 0x5806;
    pub const PAD_RTRIGGER: u16 = 0x5807;
    pub const PAD_DPAD_UP: u16 = 0x5810;
    pub const PAD_DPAD_DOWN: u16 = 0x5811;
    pub const PAD_DPAD_LEFT: u16 = 0x5812;
    pub const PAD_DPAD_RIGHT: u16 = 0x5813;
    pub const PAD_START: u16 = 0x5814;
    pub const PAD_BACK: u16 = 0x5815;
    pub const PAD_LTHUMB_PRESS: u16 = 0x5816;
    pub const PAD_RTHUMB_PRESS: u16 = 0x5817;
    /// Base of the left-stick direction block; octant offsets 0..=7 follow
    pub const PAD_LTHUMB_UP: u16 = 0x5820;
    pub const PAD_LTHUMB_DOWN: u16 = 0x5821;
    pub const PAD_LTHUMB_RIGHT: u16 = 0x5822;
    pub const PAD_LTHUMB_LEFT: u16 = 0x5823;
    pub const PAD_LTHUMB_UPLEFT: u16 = 0x5824;
    pub const PAD_LTHUMB_UPRIGHT: u16 = 0x5825;
    pub const PAD_LTHUMB_DOWNRIGHT: u16 = 0x5826;
    pub const PAD_LTHUMB_DOWNLEFT: u16 = 0x5827;
    /// Base of the right-stick direction block
    pub const PAD_RTHUMB_UP: u16 = 0x5830;
    pub const PAD_RTHUMB_DOWN: u16 = 0x5831;
    pub const PAD_RTHUMB_RIGHT: u16 = 0x5832;
    pub const PAD_RTHUMB_LEFT: u16 = 0x5833;
    pub const PAD_RTHUMB_UPLEFT: u16 = 0x5834;
    pub const PAD_RTHUMB_UPRIGHT: u16 = 0x5835;
    pub const PAD_RTHUMB_DOWNRIGHT: u16 = 0x5836;
    pub const PAD_RTHUMB_DOWNLEFT: u16 = 0x5837;
}

/// Device type reported by the capabilities queries
pub const DEVTYPE_GAMEPAD: u8 = 0x01;
/// Device subtype reported by the capabilities queries
pub const DEVSUBTYPE_GAMEPAD: u8 = 0x01;

/// Capability filter flag: caller only wants gamepad-class devices
pub const FLAG_GAMEPAD: u32 = 0x0001;

/// Vendor id reported by the extended capabilities query (Microsoft)
pub const VENDOR_ID: u16 = 0x045E;
/// Product id reported by the extended capabilities query (wireless Xbox 360 pad)
pub const PRODUCT_ID: u16 = 0x02A1;

/// Point-in-time button/trigger/axis state of the virtual pad
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Gamepad {
    /// Bitwise OR of [`buttons`] flags
    pub buttons: u16,
    /// Left trigger magnitude, 0..=255
    pub left_trigger: u8,
    /// Right trigger magnitude, 0..=255
    pub right_trigger: u8,
    /// Left stick X, negative = left
    pub thumb_lx: i16,
    /// Left stick Y, positive = up
    pub thumb_ly: i16,
    /// Right stick X
    pub thumb_rx: i16,
    /// Right stick Y, positive = up
    pub thumb_ry: i16,
}

/// Snapshot plus its packet sequence number
///
/// The packet number increments exactly once per state datagram accepted by
/// the decoder, so callers can detect change by comparing packet numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct State {
    pub packet_number: u32,
    pub gamepad: Gamepad,
}

/// Vibration request payload; accepted and discarded (no physical effect)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Vibration {
    pub left_motor_speed: u16,
    pub right_motor_speed: u16,
}

/// Static description of the device's supported controls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub device_type: u8,
    pub sub_type: u8,
    pub flags: u16,
    /// Resolution bitmasks: a set bit means the device populates it
    pub gamepad: Gamepad,
    pub vibration: Vibration,
}

impl Capabilities {
    /// Capabilities computed when the device transitions to connected: the
    /// provider exposes the full Xbox-style control set, so every field is
    /// reported at full resolution.
    pub fn full_range() -> Self {
        Self {
            device_type: DEVTYPE_GAMEPAD,
            sub_type: DEVSUBTYPE_GAMEPAD,
            flags: 0,
            gamepad: Gamepad {
                buttons: 0xFFFF,
                left_trigger: u8::MAX,
                right_trigger: u8::MAX,
                thumb_lx: !0,
                thumb_ly: !0,
                thumb_rx: !0,
                thumb_ry: !0,
            },
            vibration: Vibration::default(),
        }
    }
}

/// Capabilities plus fixed vendor/product identifiers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapabilitiesEx {
    pub capabilities: Capabilities,
    pub vendor_id: u16,
    pub product_id: u16,
}

/// Press or release side of a discrete keystroke event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Press,
    Release,
}

/// Discrete event synthesized from two consecutive snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keystroke {
    /// One of the [`vk`] codes
    pub virtual_key: u16,
    pub edge: Edge,
    /// Always 0: the single virtual device lives at slot 0
    pub user_index: u8,
    /// Unused by this device, always 0
    pub hid_code: u8,
}

impl Keystroke {
    pub(crate) fn press(virtual_key: u16) -> Self {
        Self { virtual_key, edge: Edge::Press, user_index: 0, hid_code: 0 }
    }

    pub(crate) fn release(virtual_key: u16) -> Self {
        Self { virtual_key, edge: Edge::Release, user_index: 0, hid_code: 0 }
    }
}
