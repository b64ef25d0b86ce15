//! Edge-triggered keystroke synthesis
//!
//! Turns the difference between the live snapshot and the last-reported
//! snapshot into at most one discrete press/release event per call, in a
//! fixed priority order: buttons and d-pad first, then triggers, then the
//! two thumbsticks. Deterministic even when several inputs changed between
//! polls.

use crate::pad::{buttons, vk, Edge, Gamepad, Keystroke};

/// Trigger magnitudes above this count as "on" for edge detection
const TRIGGER_THRESHOLD: u8 = 30;

/// Stick axis magnitudes at or below this are neutral
const STICK_DEADZONE: i16 = 20000;

/// Fixed evaluation order for the fourteen button/d-pad bits. The first bit
/// whose membership differs between the snapshots wins; the guide bit never
/// produces an event.
const BUTTON_ORDER: [(u16, u16); 14] = [
    (buttons::DPAD_UP, vk::PAD_DPAD_UP),
    (buttons::DPAD_DOWN, vk::PAD_DPAD_DOWN),
    (buttons::DPAD_LEFT, vk::PAD_DPAD_LEFT),
    (buttons::DPAD_RIGHT, vk::PAD_DPAD_RIGHT),
    (buttons::START, vk::PAD_START),
    (buttons::BACK, vk::PAD_BACK),
    (buttons::LEFT_THUMB, vk::PAD_LTHUMB_PRESS),
    (buttons::RIGHT_THUMB, vk::PAD_RTHUMB_PRESS),
    (buttons::LEFT_SHOULDER, vk::PAD_LSHOULDER),
    (buttons::RIGHT_SHOULDER, vk::PAD_RSHOULDER),
    (buttons::A, vk::PAD_A),
    (buttons::B, vk::PAD_B),
    (buttons::X, vk::PAD_X),
    (buttons::Y, vk::PAD_Y),
];

/// Deadzone-thresholded classification of one stick axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AxisClass {
    Negative,
    Neutral,
    Positive,
}

fn classify(value: i16) -> AxisClass {
    if value > STICK_DEADZONE {
        AxisClass::Positive
    } else if value < -STICK_DEADZONE {
        AxisClass::Negative
    } else {
        AxisClass::Neutral
    }
}

fn trigger_on(value: u8) -> bool {
    value > TRIGGER_THRESHOLD
}

/// Virtual-key offset for a non-neutral (x, y) classification pair. The
/// offsets index the UP/DOWN/RIGHT/LEFT/UPLEFT/UPRIGHT/DOWNRIGHT/DOWNLEFT
/// block that follows each stick's base virtual key.
fn octant_offset(x: AxisClass, y: AxisClass) -> u16 {
    use AxisClass::*;
    match (x, y) {
        (Neutral, Positive) => 0,
        (Neutral, Negative) => 1,
        (Positive, Neutral) => 2,
        (Negative, Neutral) => 3,
        (Negative, Positive) => 4,
        (Positive, Positive) => 5,
        (Positive, Negative) => 6,
        (Negative, Negative) => 7,
        // Caller guarantees at least one axis is non-neutral
        (Neutral, Neutral) => 0,
    }
}

/// Direction virtual key for a stick position, `None` inside the deadzone
fn stick_vk(base_vk: u16, x: i16, y: i16) -> Option<u16> {
    let (cx, cy) = (classify(x), classify(y));
    if cx == AxisClass::Neutral && cy == AxisClass::Neutral {
        return None;
    }
    Some(base_vk + octant_offset(cx, cy))
}

/// Octant edge detection for one stick.
///
/// A direction change with a previous non-null direction emits the release
/// and resets the stored axes to neutral, so the press for the new octant
/// arrives on the following call rather than being conflated with it.
fn check_stick(
    cur_x: i16,
    cur_y: i16,
    last_x: &mut i16,
    last_y: &mut i16,
    base_vk: u16,
) -> Option<Keystroke> {
    let cur_vk = stick_vk(base_vk, cur_x, cur_y);
    let last_vk = stick_vk(base_vk, *last_x, *last_y);

    if cur_vk != last_vk {
        if let Some(prev) = last_vk {
            *last_x = 0;
            *last_y = 0;
            return Some(Keystroke::release(prev));
        }
        *last_x = cur_x;
        *last_y = cur_y;
        return cur_vk.map(Keystroke::press);
    }

    // Same octant (or both neutral): track drift without emitting
    *last_x = cur_x;
    *last_y = cur_y;
    None
}

/// Synthesize the next pending keystroke, updating `last` for exactly the
/// one control that produced it. Returns `None` when nothing changed.
pub(crate) fn next(cur: &Gamepad, last: &mut Gamepad) -> Option<Keystroke> {
    for (mask, key) in BUTTON_ORDER {
        if (cur.buttons ^ last.buttons) & mask != 0 {
            return Some(if cur.buttons & mask != 0 {
                last.buttons |= mask;
                Keystroke::press(key)
            } else {
                last.buttons &= !mask;
                Keystroke::release(key)
            });
        }
    }

    if trigger_on(cur.left_trigger) != trigger_on(last.left_trigger) {
        let edge = if trigger_on(cur.left_trigger) { Edge::Press } else { Edge::Release };
        last.left_trigger = cur.left_trigger;
        return Some(Keystroke { virtual_key: vk::PAD_LTRIGGER, edge, user_index: 0, hid_code: 0 });
    }

    if trigger_on(cur.right_trigger) != trigger_on(last.right_trigger) {
        let edge = if trigger_on(cur.right_trigger) { Edge::Press } else { Edge::Release };
        last.right_trigger = cur.right_trigger;
        return Some(Keystroke { virtual_key: vk::PAD_RTRIGGER, edge, user_index: 0, hid_code: 0 });
    }

    if let Some(keystroke) = check_stick(
        cur.thumb_lx,
        cur.thumb_ly,
        &mut last.thumb_lx,
        &mut last.thumb_ly,
        vk::PAD_LTHUMB_UP,
    ) {
        return Some(keystroke);
    }

    check_stick(
        cur.thumb_rx,
        cur.thumb_ry,
        &mut last.thumb_rx,
        &mut last.thumb_ry,
        vk::PAD_RTHUMB_UP,
    )
}
