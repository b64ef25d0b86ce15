//! Test doubles shared by the poller and public-surface tests

use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::thread;
use std::time::{Duration, Instant};

use crate::wire::{request, DATAGRAM_LEN};

/// Route crate logs to the test harness; safe to call from every test
pub(crate) fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Stand-in for the companion provider process on an ephemeral loopback port
pub(crate) struct FakeProvider {
    pub socket: UdpSocket,
    bridge: Option<SocketAddr>,
}

impl FakeProvider {
    pub fn start() -> Self {
        let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        socket.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        Self { socket, bridge: None }
    }

    pub fn port(&self) -> u16 {
        self.socket.local_addr().unwrap().port()
    }

    /// Block until a request with the given code arrives, remembering the
    /// bridge's source address for replies.
    pub fn expect_request(&mut self, code: u8) {
        let mut buf = [0u8; DATAGRAM_LEN];
        loop {
            let (_, from) = self.socket.recv_from(&mut buf).unwrap();
            if buf[0] == code {
                self.bridge = Some(from);
                return;
            }
        }
    }

    pub fn send_device_reply(&self, device_id: i32) {
        let mut buf = [0u8; DATAGRAM_LEN];
        buf[0] = request::GET_DEVICE;
        buf[1..5].copy_from_slice(&device_id.to_le_bytes());
        self.socket.send_to(&buf, self.bridge.unwrap()).unwrap();
    }

    /// Valid state update for `device_id` with the given wire button mask
    /// and a neutral d-pad.
    pub fn send_state(&self, device_id: i32, wire_buttons: u16) {
        let mut buf = [0u8; DATAGRAM_LEN];
        buf[0] = request::GET_DEVICE_STATE;
        buf[1] = 1;
        buf[2..6].copy_from_slice(&device_id.to_le_bytes());
        buf[6..8].copy_from_slice(&wire_buttons.to_le_bytes());
        buf[8] = 0xFF;
        self.socket.send_to(&buf, self.bridge.unwrap()).unwrap();
    }
}

/// Poll `condition` for up to two seconds
pub(crate) fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}
