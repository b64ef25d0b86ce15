//! Discovery and state-ingestion loop
//!
//! A single background thread owns the transport, performs discovery,
//! resends the discovery request as a keepalive, and feeds decoded state
//! updates into the shared controller. Cooperative: the loop checks the
//! controller's running flag every iteration and never blocks on the
//! network call itself.

use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{error, info, trace, warn};

use crate::state::Controller;
use crate::transport::Transport;
use crate::wire::{Message, BRIDGE_PORT, DATAGRAM_LEN, PROVIDER_PORT};

/// Resend discovery after this long without any inbound datagram; guards
/// against a provider that restarted or never replied.
const DISCOVERY_INTERVAL: Duration = Duration::from_millis(2000);

/// Idle sleep between non-blocking receive attempts
const IDLE_SLEEP: Duration = Duration::from_millis(16);

/// Port pair the poller talks over. The public surface always uses the
/// process-wide constants; tests inject ephemeral ports.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Ports {
    pub local: u16,
    pub provider: u16,
}

impl Default for Ports {
    fn default() -> Self {
        Self { local: BRIDGE_PORT, provider: PROVIDER_PORT }
    }
}

/// Poller thread body. `ready` is signalled once the first discovery reply
/// has been handled, or immediately when the transport cannot be set up, so
/// the triggering caller's bounded wait always completes.
pub(crate) fn run(controller: Arc<Controller>, ports: Ports, ready: Sender<()>) {
    let transport = match Transport::bind(ports.local, ports.provider) {
        Ok(transport) => transport,
        Err(e) => {
            warn!("transport unavailable, reporting no device: {e:#}");
            let _ = ready.send(());
            return;
        }
    };

    if let Err(e) = transport.send_discovery() {
        warn!("initial discovery request failed: {e}");
    }
    let mut last_discovery = Instant::now();
    let mut signalled = false;
    let mut buf = [0u8; DATAGRAM_LEN];

    while controller.is_running() {
        match transport.try_recv(&mut buf) {
            Ok(Some(len)) => match Message::decode(&buf[..len]) {
                Some(Message::DeviceReply { device_id }) => {
                    controller.handle_device_reply(device_id);
                    if !signalled {
                        signalled = true;
                        let _ = ready.send(());
                    }
                }
                Some(Message::StateUpdate(update)) => {
                    // State for an unbound device is dropped; the hard
                    // id/validity check runs only while connected.
                    if controller.connected() {
                        controller.apply_state_update(&update);
                    }
                }
                None => trace!(len, "ignoring unrecognized datagram"),
            },
            Ok(None) => {
                if last_discovery.elapsed() >= DISCOVERY_INTERVAL {
                    trace!("discovery keepalive");
                    if let Err(e) = transport.send_discovery() {
                        warn!("discovery keepalive failed: {e}");
                    }
                    last_discovery = Instant::now();
                }
                thread::sleep(IDLE_SLEEP);
            }
            Err(e) => {
                error!("socket error, stopping poller: {e}");
                break;
            }
        }
    }

    // The socket stays owned by this thread to the end: the release notice
    // goes out here and the transport drops with the stack frame.
    let _ = transport.send_release();
    info!("poller stopped");
}
