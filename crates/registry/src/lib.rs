//! The name-service core: a two-level registry of published servers, a
//! table of outstanding lookup subscriptions, and a protocol handler that
//! reacts to control packets and legacy lookup packets by mutating both
//! and producing the outbound packets a caller needs to send. Nothing in
//! this crate touches a socket — that is `qrtr-ns`'s job.

pub mod addr;
pub mod error;
pub mod handler;
pub mod legacy;
pub mod registry;
pub mod subscriptions;

pub use addr::QrtrAddr;
pub use error::Error;
pub use handler::{Handler, Outbound, Wire};
pub use registry::{Filter, Registry, Server};
pub use subscriptions::{Lookup, SubscriptionTable};
