//! Loopback datagram transport to the provider process
//!
//! Owns the non-blocking UDP socket. Only the poller thread touches it:
//! query callers never see the socket, they read controller state.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};

use anyhow::Context;
use tracing::debug;

use crate::wire::{self, DATAGRAM_LEN};

pub(crate) struct Transport {
    socket: UdpSocket,
    provider: SocketAddr,
}

impl Transport {
    /// Bind the local receive port in non-blocking mode. Failure here is
    /// surfaced to the caller as "no device", never as a process error.
    pub fn bind(local_port: u16, provider_port: u16) -> anyhow::Result<Self> {
        let local = SocketAddrV4::new(Ipv4Addr::LOCALHOST, local_port);
        let socket = UdpSocket::bind(local)
            .with_context(|| format!("binding udp {local}"))?;
        socket
            .set_nonblocking(true)
            .context("setting socket non-blocking")?;
        let provider = SocketAddr::from((Ipv4Addr::LOCALHOST, provider_port));
        debug!(%local, %provider, "transport bound");
        Ok(Self { socket, provider })
    }

    /// Local port actually bound (relevant when bound to port 0 in tests)
    #[cfg(test)]
    pub fn local_port(&self) -> u16 {
        self.socket.local_addr().map(|a| a.port()).unwrap_or(0)
    }

    /// Send the fixed discovery request, asking the provider for its device
    /// and for inclusion in subsequent state broadcasts.
    pub fn send_discovery(&self) -> io::Result<()> {
        self.socket.send_to(&wire::encode_discovery(), self.provider)?;
        Ok(())
    }

    /// Send the release notice on teardown
    pub fn send_release(&self) -> io::Result<()> {
        self.socket.send_to(&wire::encode_release(), self.provider)?;
        Ok(())
    }

    /// Non-blocking receive: `Ok(Some(n))` for a datagram of `n` bytes,
    /// `Ok(None)` when nothing is pending. Never suspends the caller.
    pub fn try_recv(&self, buf: &mut [u8; DATAGRAM_LEN]) -> io::Result<Option<usize>> {
        match self.socket.recv_from(buf) {
            Ok((n, _)) => Ok(Some(n)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }
}
