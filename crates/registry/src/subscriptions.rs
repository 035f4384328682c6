//! The subscription table: outstanding `NEW_LOOKUP` registrations.

use crate::{addr::QrtrAddr, registry::Server};

/// An outstanding lookup subscription. A `service`/`instance` of zero is a
/// wildcard for that dimension (I4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    pub subscriber: QrtrAddr,
    pub service: u32,
    pub instance: u32,
}

/// Live fan-out match used by `NEW_SERVER` (component D). Unlike the
/// registry's general filter (`registry::matches`), there is no instance
/// mask here — only the zero-means-wildcard rule on each side.
pub fn matches_server(lookup: &Lookup, srv: &Server) -> bool {
    (lookup.service == 0 || lookup.service == srv.service)
        && (lookup.instance == 0 || lookup.instance == srv.instance)
}

/// An append-only list of outstanding lookups. Duplicates are legal and
/// are not deduplicated — each is notified independently.
#[derive(Default)]
pub struct SubscriptionTable {
    lookups: Vec<Lookup>,
}

impl SubscriptionTable {
    pub fn add(&mut self, subscriber: QrtrAddr, service: u32, instance: u32) {
        self.lookups.push(Lookup {
            subscriber,
            service,
            instance,
        });
    }

    /// Removes every lookup from `subscriber` whose `service` matches and
    /// whose stored `instance` is either zero or equal to `instance`. The
    /// asymmetry is intentional: a `DEL_LOOKUP` with a wildcard instance
    /// only cancels prior wildcard subscriptions for that service, never
    /// an exact one.
    pub fn remove_matching(&mut self, subscriber: QrtrAddr, service: u32, instance: u32) {
        self.lookups.retain(|l| {
            !(l.subscriber == subscriber
                && l.service == service
                && (l.instance == 0 || l.instance == instance))
        });
    }

    /// Removes every lookup registered by `subscriber` (used on
    /// `DEL_CLIENT`, P6).
    pub fn remove_by_subscriber(&mut self, subscriber: QrtrAddr) {
        self.lookups.retain(|l| l.subscriber != subscriber);
    }

    /// Every lookup whose filter matches `srv` (P5).
    pub fn matching(&self, srv: &Server) -> impl Iterator<Item = &Lookup> {
        self.lookups.iter().filter(move |l| matches_server(l, srv))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(node: u32, port: u32) -> QrtrAddr {
        QrtrAddr::new(node, port)
    }

    #[test]
    fn wildcard_del_lookup_only_cancels_wildcard_subscriptions() {
        let mut table = SubscriptionTable::default();
        let who = addr(0, 10);

        table.add(who, 7, 0); // wildcard instance
        table.add(who, 7, 5); // exact instance

        table.remove_matching(who, 7, 0);

        let srv = Server { service: 7, instance: 5, node: 1, port: 1 };
        let remaining: Vec<_> = table.matching(&srv).collect();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].instance, 5);
    }

    #[test]
    fn del_client_clears_all_of_a_subscribers_lookups() {
        let mut table = SubscriptionTable::default();
        let who = addr(0, 10);
        table.add(who, 1, 0);
        table.add(who, 2, 0);
        table.remove_by_subscriber(who);

        let srv = Server { service: 1, instance: 0, node: 1, port: 1 };
        assert_eq!(table.matching(&srv).count(), 0);
    }

    #[test]
    fn duplicates_are_each_notified() {
        let mut table = SubscriptionTable::default();
        let who = addr(0, 10);
        table.add(who, 1, 0);
        table.add(who, 1, 0);

        let srv = Server { service: 1, instance: 9, node: 1, port: 1 };
        assert_eq!(table.matching(&srv).count(), 2);
    }
}
