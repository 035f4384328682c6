//! The two-level registry: nodes, each holding the servers published on
//! them, keyed by port.

use crate::{addr::QrtrAddr, error::Error};

use std::ops::{Deref, DerefMut};

use ahash::{HashMap, HashMapExt};

/// A thin newtype over a `HashMap`, pre-sized so the common case (a
/// handful of services per node) never triggers a reallocation. Kept as
/// its own type, rather than a bare `HashMap` alias, so the capacity
/// policy lives in one place.
pub struct Table<K, V>(HashMap<K, V>);

impl<K, V> Default for Table<K, V> {
    fn default() -> Self {
        Self(HashMap::with_capacity(16))
    }
}

impl<K, V> Deref for Table<K, V> {
    type Target = HashMap<K, V>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<K, V> DerefMut for Table<K, V> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// A published service: `(service, instance)` reachable at `(node, port)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Server {
    pub service: u32,
    pub instance: u32,
    pub node: u32,
    pub port: u32,
}

impl Server {
    pub fn addr(&self) -> QrtrAddr {
        QrtrAddr::new(self.node, self.port)
    }
}

/// All servers published on a single node, keyed by port (I2: unique
/// within a node).
#[derive(Default)]
pub struct Node {
    pub id: u32,
    pub services: Table<u32, Server>,
}

/// A filter over `(service, instance)`, as used by `NEW_LOOKUP`'s initial
/// snapshot and the legacy `QUERY` packet (spec §4.E).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Filter {
    pub service: u32,
    pub instance: u32,
    pub ifilter: u32,
}

/// Evaluates the filter predicate against a candidate server (P8).
///
/// 1. A non-zero `service` must match exactly.
/// 2. The instance mask defaults to "exact match" (`!0`) when the caller
///    asked for a specific instance without supplying a mask, and to
///    "any instance" (`0`) otherwise.
/// 3. The candidate's instance, masked, must equal the filter's instance.
pub fn matches(srv: &Server, f: &Filter) -> bool {
    if f.service != 0 && srv.service != f.service {
        return false;
    }

    let mask = if f.ifilter == 0 && f.instance != 0 {
        u32::MAX
    } else {
        f.ifilter
    };

    (srv.instance & mask) == f.instance
}

/// Outcome of `Registry::add`, distinguishing a fresh insert from a
/// same-`(node, port)` replacement so a caller can tell the two apart
/// without a second lookup.
pub struct AddOutcome {
    pub server: Server,
    pub replaced: Option<Server>,
}

/// The authoritative, single-owner service registry. There is exactly one
/// reader/writer (the event-loop callback), so no interior mutability is
/// used anywhere in this type — every mutating operation takes `&mut self`.
#[derive(Default)]
pub struct Registry {
    nodes: Table<u32, Node>,
}

impl Registry {
    /// Looks up or lazily creates the node record for `id`. A node is
    /// never destroyed once created (an empty node record is cheap to
    /// keep and avoids churn on flapping peers).
    pub fn get_or_create_node(&mut self, id: u32) -> &mut Node {
        self.nodes.entry(id).or_insert_with(|| Node {
            id,
            services: Table::default(),
        })
    }

    pub fn get_node(&self, id: u32) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Inserts or replaces a server record (I1, I2, I3, P1, P2, P3).
    pub fn add(&mut self, service: u32, instance: u32, node: u32, port: u32) -> Result<AddOutcome, Error> {
        if service == 0 || port == 0 {
            return Err(Error::InvalidArgument);
        }

        let server = Server {
            service,
            instance,
            node,
            port,
        };

        let replaced = self.get_or_create_node(node).services.insert(port, server);

        Ok(AddOutcome { server, replaced })
    }

    /// Removes the server at `(node, port)`, if any.
    pub fn remove(&mut self, node: u32, port: u32) -> Option<Server> {
        self.nodes.get_mut(&node).and_then(|n| n.services.remove(&port))
    }

    /// Removes every server published on `node` (used by `BYE`). The node
    /// record itself is kept, empty, per the registry's retention policy.
    pub fn purge_node(&mut self, node: u32) -> Vec<Server> {
        match self.nodes.get_mut(&node) {
            Some(n) => {
                let removed: Vec<Server> = n.services.values().copied().collect();
                n.services.clear();
                removed
            }
            None => Vec::new(),
        }
    }

    /// Enumerates every server matching `filter`, across all nodes. The
    /// result is collected eagerly: the registry does not support
    /// enumeration concurrent with mutation.
    pub fn query(&self, filter: &Filter) -> Vec<Server> {
        self.nodes
            .values()
            .flat_map(|n| n.services.values())
            .filter(|s| matches(s, filter))
            .copied()
            .collect()
    }

    /// All servers published on `node`, in insertion-unordered iteration
    /// order (used for the `HELLO` handshake's catalog replay).
    pub fn services_on(&self, node: u32) -> Vec<Server> {
        self.get_node(node)
            .map(|n| n.services.values().copied().collect())
            .unwrap_or_default()
    }
}
