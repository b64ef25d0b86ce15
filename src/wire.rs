//! Wire format shared with the companion provider process
//!
//! All traffic is fixed-size 64-byte UDP datagrams on the loopback
//! interface. The first byte of every datagram is a request code; integer
//! fields are little-endian. Decoding is pure: datagrams are translated into
//! [`Message`] values here and applied to controller state elsewhere.

use bytes::Buf;

use crate::pad::{buttons, Gamepad};

/// Port the provider process listens on for our requests
pub const PROVIDER_PORT: u16 = 7947;
/// Port this bridge binds to receive provider replies
pub const BRIDGE_PORT: u16 = 7949;
/// Fixed size of every datagram in both directions
pub const DATAGRAM_LEN: usize = 64;

/// Request codes carried in byte 0 of every datagram
pub mod request {
    /// Discovery: ask the provider for its device, reply carries the id
    pub const GET_DEVICE: u8 = 8;
    /// Continuous state update for the bound device
    pub const GET_DEVICE_STATE: u8 = 9;
    /// Teardown notice: we no longer want the device
    pub const RELEASE_DEVICE: u8 = 10;
}

/// Bit indices of the provider's button mask (its own numbering, remapped
/// to [`buttons`] flags on ingestion)
mod wire_button {
    pub const A: usize = 0;
    pub const B: usize = 1;
    pub const X: usize = 2;
    pub const Y: usize = 3;
    pub const L1: usize = 4;
    pub const R1: usize = 5;
    pub const SELECT: usize = 6;
    pub const START: usize = 7;
    pub const L3: usize = 8;
    pub const R3: usize = 9;
    /// Digital left trigger: full-scale magnitude when set, zero when clear
    pub const L2: usize = 10;
    /// Digital right trigger
    pub const R2: usize = 11;
}

/// D-pad direction codes, clockwise starting at Up; anything above 7 sets
/// no d-pad bits.
const DPAD_TABLE: [u16; 8] = [
    buttons::DPAD_UP,
    buttons::DPAD_UP | buttons::DPAD_RIGHT,
    buttons::DPAD_RIGHT,
    buttons::DPAD_RIGHT | buttons::DPAD_DOWN,
    buttons::DPAD_DOWN,
    buttons::DPAD_DOWN | buttons::DPAD_LEFT,
    buttons::DPAD_LEFT,
    buttons::DPAD_LEFT | buttons::DPAD_UP,
];

/// Decoded inbound datagram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    /// Discovery reply: id > 0 binds the device, id == 0 clears the binding
    DeviceReply { device_id: i32 },
    /// Continuous state update for the bound device
    StateUpdate(StateUpdate),
}

/// Raw fields of a state-update datagram, before consistency checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateUpdate {
    /// Validity flag from the provider; anything but 1 is a hard reject
    pub valid: bool,
    /// Device id this update claims to describe
    pub device_id: i32,
    buttons: u16,
    dpad: u8,
    thumb_lx: i16,
    thumb_ly: i16,
    thumb_rx: i16,
    thumb_ry: i16,
}

impl Message {
    /// Decode one inbound datagram. Returns `None` for unknown request
    /// codes and for datagrams too short to carry their fields.
    pub fn decode(datagram: &[u8]) -> Option<Message> {
        let (&tag, mut body) = datagram.split_first()?;
        match tag {
            request::GET_DEVICE => {
                if body.remaining() < 4 {
                    return None;
                }
                Some(Message::DeviceReply { device_id: body.get_i32_le() })
            }
            request::GET_DEVICE_STATE => {
                if body.remaining() < 16 {
                    return None;
                }
                let valid = body.get_u8() == 1;
                let device_id = body.get_i32_le();
                let buttons = body.get_u16_le();
                let dpad = body.get_u8();
                let thumb_lx = body.get_i16_le();
                let thumb_ly = body.get_i16_le();
                let thumb_rx = body.get_i16_le();
                let thumb_ry = body.get_i16_le();
                Some(Message::StateUpdate(StateUpdate {
                    valid,
                    device_id,
                    buttons,
                    dpad,
                    thumb_lx,
                    thumb_ly,
                    thumb_rx,
                    thumb_ry,
                }))
            }
            _ => None,
        }
    }
}

impl StateUpdate {
    /// Translate the raw fields into a canonical snapshot.
    ///
    /// Both Y axes are sign-inverted so that "up" is positive, and the two
    /// digital trigger bits become full-scale (255) or zero magnitudes.
    pub fn to_gamepad(&self) -> Gamepad {
        let mut mask = 0u16;
        let mappings = [
            (wire_button::A, buttons::A),
            (wire_button::B, buttons::B),
            (wire_button::X, buttons::X),
            (wire_button::Y, buttons::Y),
            (wire_button::L1, buttons::LEFT_SHOULDER),
            (wire_button::R1, buttons::RIGHT_SHOULDER),
            (wire_button::SELECT, buttons::BACK),
            (wire_button::START, buttons::START),
            (wire_button::L3, buttons::LEFT_THUMB),
            (wire_button::R3, buttons::RIGHT_THUMB),
        ];
        for (bit, flag) in mappings {
            if self.buttons & (1 << bit) != 0 {
                mask |= flag;
            }
        }
        if let Some(&dpad_bits) = DPAD_TABLE.get(self.dpad as usize) {
            mask |= dpad_bits;
        }

        Gamepad {
            buttons: mask,
            left_trigger: if self.buttons & (1 << wire_button::L2) != 0 { 255 } else { 0 },
            right_trigger: if self.buttons & (1 << wire_button::R2) != 0 { 255 } else { 0 },
            thumb_lx: self.thumb_lx,
            thumb_ly: self.thumb_ly.wrapping_neg(),
            thumb_rx: self.thumb_rx,
            thumb_ry: self.thumb_ry.wrapping_neg(),
        }
    }
}

/// Build the discovery request. Byte 1 is the provider's protocol version,
/// byte 2 asks to be included in subsequent state broadcasts.
pub fn encode_discovery() -> [u8; DATAGRAM_LEN] {
    let mut buf = [0u8; DATAGRAM_LEN];
    buf[0] = request::GET_DEVICE;
    buf[1] = 1;
    buf[2] = 1;
    buf
}

/// Build the release notice sent on teardown
pub fn encode_release() -> [u8; DATAGRAM_LEN] {
    let mut buf = [0u8; DATAGRAM_LEN];
    buf[0] = request::RELEASE_DEVICE;
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn state_datagram(
        valid: u8,
        id: i32,
        btns: u16,
        dpad: u8,
        axes: [i16; 4],
    ) -> [u8; DATAGRAM_LEN] {
        let mut buf = [0u8; DATAGRAM_LEN];
        buf[0] = request::GET_DEVICE_STATE;
        buf[1] = valid;
        buf[2..6].copy_from_slice(&id.to_le_bytes());
        buf[6..8].copy_from_slice(&btns.to_le_bytes());
        buf[8] = dpad;
        for (i, axis) in axes.iter().enumerate() {
            buf[9 + i * 2..11 + i * 2].copy_from_slice(&axis.to_le_bytes());
        }
        buf
    }

    #[test]
    fn decodes_device_reply() {
        let mut buf = [0u8; DATAGRAM_LEN];
        buf[0] = request::GET_DEVICE;
        buf[1..5].copy_from_slice(&7i32.to_le_bytes());
        assert_eq!(Message::decode(&buf), Some(Message::DeviceReply { device_id: 7 }));
    }

    #[test]
    fn rejects_unknown_tag_and_short_datagrams() {
        assert_eq!(Message::decode(&[]), None);
        assert_eq!(Message::decode(&[42, 0, 0, 0, 0]), None);
        assert_eq!(Message::decode(&[request::GET_DEVICE, 1, 2]), None);
        assert_eq!(Message::decode(&[request::GET_DEVICE_STATE, 1, 0, 0]), None);
    }

    #[test]
    fn maps_wire_buttons_to_xinput_flags() {
        let buf = state_datagram(1, 1, 0b11_1111_1111, 0xFF, [0; 4]);
        let Some(Message::StateUpdate(update)) = Message::decode(&buf) else {
            panic!("expected state update");
        };
        let pad = update.to_gamepad();
        assert_eq!(
            pad.buttons,
            buttons::A
                | buttons::B
                | buttons::X
                | buttons::Y
                | buttons::LEFT_SHOULDER
                | buttons::RIGHT_SHOULDER
                | buttons::BACK
                | buttons::START
                | buttons::LEFT_THUMB
                | buttons::RIGHT_THUMB
        );
        assert_eq!(pad.left_trigger, 0);
        assert_eq!(pad.right_trigger, 0);
    }

    #[test]
    fn digital_trigger_bits_are_full_scale_or_zero() {
        let buf = state_datagram(1, 1, 1 << 10, 0xFF, [0; 4]);
        let Some(Message::StateUpdate(update)) = Message::decode(&buf) else {
            panic!("expected state update");
        };
        let pad = update.to_gamepad();
        assert_eq!(pad.left_trigger, 255);
        assert_eq!(pad.right_trigger, 0);

        let buf = state_datagram(1, 1, 1 << 11, 0xFF, [0; 4]);
        let Some(Message::StateUpdate(update)) = Message::decode(&buf) else {
            panic!("expected state update");
        };
        let pad = update.to_gamepad();
        assert_eq!(pad.left_trigger, 0);
        assert_eq!(pad.right_trigger, 255);
    }

    #[test]
    fn dpad_code_one_is_up_right() {
        let buf = state_datagram(1, 1, 0, 1, [0; 4]);
        let Some(Message::StateUpdate(update)) = Message::decode(&buf) else {
            panic!("expected state update");
        };
        assert_eq!(update.to_gamepad().buttons, buttons::DPAD_UP | buttons::DPAD_RIGHT);
    }

    #[test]
    fn dpad_codes_out_of_range_set_no_bits() {
        for dpad in [8u8, 9, 100, 255] {
            let buf = state_datagram(1, 1, 0, dpad, [0; 4]);
            let Some(Message::StateUpdate(update)) = Message::decode(&buf) else {
                panic!("expected state update");
            };
            assert_eq!(update.to_gamepad().buttons & 0x000F, 0);
        }
    }

    #[test]
    fn y_axes_are_sign_inverted() {
        let buf = state_datagram(1, 1, 0, 0xFF, [1000, 15000, -2000, -30000]);
        let Some(Message::StateUpdate(update)) = Message::decode(&buf) else {
            panic!("expected state update");
        };
        let pad = update.to_gamepad();
        assert_eq!(pad.thumb_lx, 1000);
        assert_eq!(pad.thumb_ly, -15000);
        assert_eq!(pad.thumb_rx, -2000);
        assert_eq!(pad.thumb_ry, 30000);
    }

    #[test]
    fn outbound_requests_have_fixed_shape() {
        let discovery = encode_discovery();
        assert_eq!(discovery[0], request::GET_DEVICE);
        assert_eq!(&discovery[1..3], &[1, 1]);
        assert!(discovery[3..].iter().all(|&b| b == 0));

        let release = encode_release();
        assert_eq!(release[0], request::RELEASE_DEVICE);
        assert!(release[1..].iter().all(|&b| b == 0));
    }

    proptest! {
        #[test]
        fn decode_never_panics(data in proptest::collection::vec(any::<u8>(), 0..80)) {
            let _ = Message::decode(&data);
        }

        #[test]
        fn x_axes_pass_through_and_y_axes_negate(
            lx in any::<i16>(), ly in any::<i16>(),
            rx in any::<i16>(), ry in any::<i16>(),
        ) {
            let buf = state_datagram(1, 1, 0, 0xFF, [lx, ly, rx, ry]);
            let Some(Message::StateUpdate(update)) = Message::decode(&buf) else {
                panic!("expected state update");
            };
            let pad = update.to_gamepad();
            prop_assert_eq!(pad.thumb_lx, lx);
            prop_assert_eq!(pad.thumb_ly, ly.wrapping_neg());
            prop_assert_eq!(pad.thumb_rx, rx);
            prop_assert_eq!(pad.thumb_ry, ry.wrapping_neg());
        }
    }
}
