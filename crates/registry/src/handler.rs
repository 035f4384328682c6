//! The protocol handler: the single place that turns an inbound control
//! packet into registry/subscription mutations and a list of outbound
//! packets. This type never touches a socket — it is a pure function of
//! its own state, which is what makes it straightforward to drive from
//! tests without a fabric underneath.

use crate::{
    addr::QrtrAddr,
    registry::{Filter, Registry, Server},
    subscriptions::SubscriptionTable,
};
use codec::control::{ClientFields, ControlPacket, ServerFields};
use codec::lookup::LookupPacket;

/// Which bound socket an `Outbound` must be sent on. A legacy `QUERY`
/// reply has to go out of the name-service port even when it was
/// produced by code that otherwise shares the control-packet path, so the
/// wire family travels with the packet rather than being inferred from
/// whatever socket happened to receive the triggering datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wire {
    Control,
    Legacy,
}

/// A packet this node needs to send, addressed to a fabric endpoint. The
/// caller (the event loop) owns turning this into a `sendto` on the
/// socket named by `wire`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub dest: QrtrAddr,
    pub wire: Wire,
    pub bytes: Vec<u8>,
}

impl Outbound {
    pub(crate) fn control(dest: QrtrAddr, packet: ControlPacket) -> Self {
        Self {
            dest,
            wire: Wire::Control,
            bytes: packet.encode().to_vec(),
        }
    }

    pub(crate) fn lookup(dest: QrtrAddr, packet: LookupPacket) -> Self {
        Self {
            dest,
            wire: Wire::Legacy,
            bytes: packet.encode().to_vec(),
        }
    }
}

/// Owns the registry and subscription table and reacts to every control
/// command named in `Cmd`. `local_node` is this node's own id, discovered
/// once at startup (component B) and never changed afterwards — it is
/// what distinguishes "a server published on me" (broadcast-worthy) from
/// "a server a peer told me about" (recorded, not re-announced).
pub struct Handler {
    pub registry: Registry,
    pub subscriptions: SubscriptionTable,
    local_node: u32,
}

impl Handler {
    pub fn new(local_node: u32) -> Self {
        Self {
            registry: Registry::default(),
            subscriptions: SubscriptionTable::default(),
            local_node,
        }
    }

    pub fn local_node(&self) -> u32 {
        self.local_node
    }

    /// Dispatches one control packet received from `src`.
    pub fn handle_control(&mut self, src: QrtrAddr, packet: ControlPacket) -> Vec<Outbound> {
        match packet {
            ControlPacket::Hello => self.on_hello(src),
            ControlPacket::Bye => self.on_bye(src.node),
            ControlPacket::DelClient(f) => self.on_del_client(QrtrAddr::new(f.node, f.port)),
            ControlPacket::NewServer(f) => self.on_new_server(f),
            ControlPacket::DelServer(f) => self.on_del_server(f),
            ControlPacket::NewLookup { service, instance } => self.on_new_lookup(src, service, instance),
            ControlPacket::DelLookup { service, instance } => {
                self.subscriptions.remove_matching(src, service, instance);
                Vec::new()
            }
            // RESUME_TX is a transport-level flow-control hint the handler
            // has no state for; EXIT and an inbound LOOKUP_RESULT (this
            // node is never itself a lookup subscriber over the control
            // port) are accepted and ignored.
            ControlPacket::ResumeTx | ControlPacket::Exit | ControlPacket::Ping | ControlPacket::LookupResult(_) => {
                Vec::new()
            }
        }
    }

    /// `HELLO`: echo back, then replay every server this node itself
    /// publishes so the new peer learns about them without waiting for a
    /// `NEW_SERVER` broadcast.
    fn on_hello(&mut self, src: QrtrAddr) -> Vec<Outbound> {
        let mut out = vec![Outbound::control(src, ControlPacket::Hello)];
        for srv in self.registry.services_on(self.local_node) {
            out.push(Outbound::control(src, ControlPacket::NewServer(server_fields(&srv))));
        }
        out
    }

    /// `BYE`: the node at `node` has disappeared. Purge everything it
    /// published and tell every locally-hosted service its client state
    /// for that node is gone. No lookup subscriber is notified here —
    /// subscribers only ever hear about departures through `DEL_SERVER`.
    fn on_bye(&mut self, node: u32) -> Vec<Outbound> {
        self.registry.purge_node(node);

        self.registry
            .services_on(self.local_node)
            .into_iter()
            .map(|local| Outbound::control(local.addr(), ControlPacket::Bye))
            .collect()
    }

    /// `DEL_CLIENT`: a single client of `who` disconnected. Cancels its
    /// lookups, removes the server it published (if any) and broadcasts
    /// the departure when that server was local, then forwards the
    /// notification to every locally-hosted service so they can drop
    /// their own per-client state.
    fn on_del_client(&mut self, who: QrtrAddr) -> Vec<Outbound> {
        self.subscriptions.remove_by_subscriber(who);

        let mut out = Vec::new();

        if let Some(srv) = self.registry.remove(who.node, who.port) {
            if srv.node == self.local_node {
                out.push(Outbound::control(
                    QrtrAddr::broadcast_ctrl(),
                    ControlPacket::DelServer(server_fields(&srv)),
                ));
            }
        }

        out.extend(self.registry.services_on(self.local_node).into_iter().map(|local| {
            Outbound::control(
                local.addr(),
                ControlPacket::DelClient(ClientFields { node: who.node, port: who.port }),
            )
        }));

        out
    }

    /// `NEW_SERVER`: validate and record the publication (I1-I3, P1-P3),
    /// broadcast it on if it is ours, and notify every outstanding lookup
    /// it satisfies (P5).
    fn on_new_server(&mut self, f: ServerFields) -> Vec<Outbound> {
        let outcome = match self.registry.add(f.service, f.instance, f.node, f.port) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("rejecting NEW_SERVER {f:?}: {e}");
                return Vec::new();
            }
        };

        let mut out = Vec::new();

        if outcome.server.node == self.local_node {
            out.push(Outbound::control(QrtrAddr::broadcast_ctrl(), ControlPacket::NewServer(f)));
        }

        for lookup in self.subscriptions.matching(&outcome.server) {
            out.push(Outbound::control(
                lookup.subscriber,
                ControlPacket::LookupResult(server_fields(&outcome.server)),
            ));
        }

        out
    }

    /// `DEL_SERVER`: drop the record at `(node, port)` and, if it was
    /// ours, broadcast the departure. Lookup subscribers are not
    /// notified of departures (P4) — a caller that wants liveness must
    /// poll.
    fn on_del_server(&mut self, f: ServerFields) -> Vec<Outbound> {
        match self.registry.remove(f.node, f.port) {
            Some(srv) if srv.node == self.local_node => {
                vec![Outbound::control(QrtrAddr::broadcast_ctrl(), ControlPacket::DelServer(server_fields(&srv)))]
            }
            Some(_) => Vec::new(),
            None => {
                log::warn!("DEL_SERVER for unknown (node={}, port={})", f.node, f.port);
                Vec::new()
            }
        }
    }

    /// `NEW_LOOKUP`: record the subscription, then reply with an
    /// immediate snapshot of every currently-matching server followed by
    /// an all-zero terminator (P5, P9).
    fn on_new_lookup(&mut self, src: QrtrAddr, service: u32, instance: u32) -> Vec<Outbound> {
        self.subscriptions.add(src, service, instance);

        let filter = Filter { service, instance, ifilter: 0 };
        let mut out: Vec<Outbound> = self
            .registry
            .query(&filter)
            .into_iter()
            .map(|srv| Outbound::control(src, ControlPacket::LookupResult(server_fields(&srv))))
            .collect();

        out.push(Outbound::control(src, ControlPacket::LookupResult(ServerFields::default())));
        out
    }
}

fn server_fields(srv: &Server) -> ServerFields {
    ServerFields {
        service: srv.service,
        instance: srv.instance,
        node: srv.node,
        port: srv.port,
    }
}

/// Reusable by the legacy translator (`legacy.rs`), which maps `PUBLISH`
/// onto the same validated insert-and-fan-out path a `NEW_SERVER` control
/// packet would take.
impl Handler {
    pub(crate) fn publish(&mut self, node: u32, port: u32, service: u32, instance: u32) -> Vec<Outbound> {
        self.on_new_server(ServerFields { service, instance, node, port })
    }

    pub(crate) fn unpublish(&mut self, node: u32, port: u32) -> Vec<Outbound> {
        self.on_del_server(ServerFields { service: 0, instance: 0, node, port })
    }
}
