//! The event loop: a single-threaded `poll(2)` dispatcher over the
//! control socket and, when enabled, the legacy name-service socket. No
//! timers, no background threads — a descriptor becomes readable, its
//! callback drains exactly one datagram, and the loop waits again.

use std::os::unix::io::AsRawFd;

use registry::{handler::Wire, Handler};

use crate::transport::Endpoint;

/// Read buffer sized well above either wire format's maximum length (20
/// and 24 bytes respectively); oversized datagrams are simply truncated
/// by `recvfrom`, which the codec then rejects as malformed.
const BUF_LEN: usize = 4096;

pub struct EventLoop {
    ctrl: Endpoint,
    legacy: Option<Endpoint>,
    handler: Handler,
}

impl EventLoop {
    pub fn new(ctrl: Endpoint, legacy: Option<Endpoint>, handler: Handler) -> Self {
        Self { ctrl, legacy, handler }
    }

    /// Runs until the control socket hits a fatal recv error (§4.F).
    pub fn run(&mut self) -> std::io::Result<()> {
        loop {
            let mut fds = vec![libc::pollfd { fd: self.ctrl.as_raw_fd(), events: libc::POLLIN, revents: 0 }];
            if let Some(legacy) = &self.legacy {
                fds.push(libc::pollfd { fd: legacy.as_raw_fd(), events: libc::POLLIN, revents: 0 });
            }

            let rc = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, -1) };
            if rc < 0 {
                let err = std::io::Error::last_os_error();
                if err.kind() == std::io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }

            if fds[0].revents & libc::POLLIN != 0 && !self.drain_ctrl()? {
                return Ok(());
            }

            if fds.len() > 1 && fds[1].revents & libc::POLLIN != 0 {
                self.drain_legacy();
            }
        }
    }

    /// Drains one datagram from the control socket. Returns `Ok(false)`
    /// on the fatal-recv condition that ends the loop.
    fn drain_ctrl(&mut self) -> std::io::Result<bool> {
        let mut buf = [0u8; BUF_LEN];
        let (src, len) = match self.ctrl.recv(&mut buf) {
            Ok(v) => v,
            Err(e) => {
                log::error!("fatal error receiving on the control socket: {e}");
                return Ok(false);
            }
        };

        let packet = match codec::control::ControlPacket::decode(&buf[..len]) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("discarding malformed control packet from {src:?}: {e}");
                return Ok(true);
            }
        };

        let outbound = self.handler.handle_control(src, packet);
        self.send_all(outbound);
        Ok(true)
    }

    /// Drains one datagram from the legacy name-service socket, if bound.
    fn drain_legacy(&mut self) {
        let Some(legacy) = &self.legacy else { return };

        let mut buf = [0u8; BUF_LEN];
        let (src, len) = match legacy.recv(&mut buf) {
            Ok(v) => v,
            Err(e) => {
                log::error!("error receiving on the legacy name-service socket: {e}");
                return;
            }
        };

        let packet = match codec::lookup::LookupPacket::decode(&buf[..len]) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("discarding malformed lookup packet from {src:?}: {e}");
                return;
            }
        };

        let outbound = self.handler.handle_lookup(src, packet);
        self.send_all(outbound);
    }

    fn send_all(&self, outbound: Vec<registry::Outbound>) {
        for msg in outbound {
            let result = match msg.wire {
                Wire::Control => self.ctrl.send(msg.dest, &msg.bytes),
                Wire::Legacy => match &self.legacy {
                    Some(legacy) => legacy.send(msg.dest, &msg.bytes),
                    None => {
                        log::warn!("dropping legacy-wire packet to {:?}: legacy port not bound", msg.dest);
                        continue;
                    }
                },
            };

            if let Err(e) = result {
                log::warn!("send to {:?} failed: {e}", msg.dest);
            }
        }
    }
}

/// Convenience used by startup to send the initial `HELLO` broadcast
/// before entering the loop.
pub fn broadcast_hello(ctrl: &Endpoint) -> std::io::Result<()> {
    let bytes = codec::control::ControlPacket::Hello.encode();
    ctrl.broadcast_ctrl(&bytes).map(|_| ())
}
