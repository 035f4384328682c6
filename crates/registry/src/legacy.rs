//! Translates the legacy lookup-protocol packet (spec component A's
//! `LookupPacket`) onto the same handler operations a modern control
//! packet would drive. Kept deliberately thin: every state change still
//! goes through `Handler`'s validated control-packet paths, so the two
//! protocols can never disagree about what counts as a valid publish.

use crate::{addr::QrtrAddr, handler::{Handler, Outbound}, registry::Filter};
use codec::lookup::LookupPacket;

impl Handler {
    /// Dispatches one legacy lookup packet received from `src` on the
    /// name-service port.
    pub fn handle_lookup(&mut self, src: QrtrAddr, packet: LookupPacket) -> Vec<Outbound> {
        match packet {
            LookupPacket::Publish { service, instance } => self.publish(src.node, src.port, service, instance),
            LookupPacket::Bye { .. } => self.unpublish(src.node, src.port),
            LookupPacket::Query { service, instance, ifilter } => self.query(src, service, instance, ifilter),
            // RESET announces a fresh client to the legacy port; this
            // daemon keeps no per-client state for it beyond what
            // PUBLISH/BYE already track, so there is nothing to do.
            LookupPacket::Reset => Vec::new(),
            // NOTICE only ever flows from the name service to a client,
            // never the other way; a client sending one is ignored.
            LookupPacket::Notice { .. } => Vec::new(),
        }
    }

    /// `QUERY`: a one-shot snapshot burst, replying with descending `seq`
    /// numbers and a `seq == 0` terminator — the legacy equivalent of a
    /// `NEW_LOOKUP`'s initial snapshot, without registering a standing
    /// subscription.
    fn query(&mut self, src: QrtrAddr, service: u32, instance: u32, ifilter: u32) -> Vec<Outbound> {
        let matches = self.registry.query(&Filter { service, instance, ifilter });
        let mut seq = matches.len() as u32;

        let mut out: Vec<Outbound> = matches
            .into_iter()
            .map(|srv| {
                let notice = LookupPacket::Notice {
                    seq,
                    service: srv.service,
                    instance: srv.instance,
                    node: srv.node,
                    port: srv.port,
                };
                seq -= 1;
                Outbound::lookup(src, notice)
            })
            .collect();

        out.push(Outbound::lookup(
            src,
            LookupPacket::Notice { seq: 0, service: 0, instance: 0, node: 0, port: 0 },
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Server;

    fn addr(node: u32, port: u32) -> QrtrAddr {
        QrtrAddr::new(node, port)
    }

    #[test]
    fn publish_registers_sender_as_node_port() {
        let mut h = Handler::new(1);
        h.handle_lookup(addr(1, 500), LookupPacket::Publish { service: 7, instance: 1 });

        let found = h.registry.query(&Filter { service: 7, ..Default::default() });
        assert_eq!(found, vec![Server { service: 7, instance: 1, node: 1, port: 500 }]);
    }

    #[test]
    fn bye_unpublishes_sender() {
        let mut h = Handler::new(1);
        h.handle_lookup(addr(1, 500), LookupPacket::Publish { service: 7, instance: 1 });
        h.handle_lookup(addr(1, 500), LookupPacket::Bye { service: 7, instance: 1 });

        assert!(h.registry.query(&Filter::default()).is_empty());
    }

    #[test]
    fn query_bursts_with_descending_seq_and_zero_terminator() {
        let mut h = Handler::new(1);
        h.handle_lookup(addr(1, 500), LookupPacket::Publish { service: 7, instance: 1 });
        h.handle_lookup(addr(1, 600), LookupPacket::Publish { service: 7, instance: 2 });

        let out = h.handle_lookup(addr(9, 1), LookupPacket::Query { service: 7, instance: 0, ifilter: 0 });
        assert_eq!(out.len(), 3);
        assert_eq!(out.last().unwrap().bytes, LookupPacket::Notice { seq: 0, service: 0, instance: 0, node: 0, port: 0 }.encode());
    }
}
