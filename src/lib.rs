pub mod config;
pub mod eventloop;
pub mod transport;

use anyhow::{Context, Result};
use registry::{
    addr::{CTRL_PORT, NS_PORT},
    Handler,
};

use self::{eventloop::EventLoop, transport::Endpoint};

/// Binds the control socket (and, best-effort, the legacy name-service
/// socket), discovers the local node-id, announces with a `HELLO`
/// broadcast, and runs the event loop. Returns once the loop observes a
/// fatal error on the control socket.
///
/// The original daemon forks here so the invoking shell sees a
/// conventional "binds, then returns control" daemonization. A rewrite in
/// this language leaves backgrounding to the caller (a supervisor, or a
/// `&` in the shell) instead of forking, per the design note in §9 — this
/// function's only externally observable contract is that it does not
/// return until the socket closes.
pub fn startup() -> Result<()> {
    let ctrl = Endpoint::bind(CTRL_PORT).context("binding the control socket")?;
    let local_node = ctrl.local_node().context("discovering the local node-id")?;

    let legacy = match Endpoint::bind(NS_PORT) {
        Ok(ep) => Some(ep),
        Err(e) => {
            log::warn!("legacy name-service port not bound, continuing without it: {e}");
            None
        }
    };

    eventloop::broadcast_hello(&ctrl).context("broadcasting the initial HELLO")?;

    let handler = Handler::new(local_node);
    let mut event_loop = EventLoop::new(ctrl, legacy, handler);

    event_loop.run().context("event loop terminated")
}
