use std::fmt;

/// Errors raised by the registry and protocol handler. None of these are
/// fatal to the daemon — the caller logs and moves on, per the error
/// handling design: a single malformed or rejected datagram never aborts
/// the event loop.
#[derive(Debug)]
pub enum Error {
    /// A datagram failed to decode as a control or lookup packet.
    Decode(codec::Error),
    /// `NEW_SERVER`/`PUBLISH` with `service == 0` or `port == 0`.
    InvalidArgument,
    /// `DEL_SERVER`/`BYE` for an `(node, port)` that has no server record.
    NotFound,
    /// A send/recv on the underlying socket failed.
    Transport(std::io::Error),
    /// Allocation failure while growing a table.
    ResourceExhausted,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "decode error: {e}"),
            Self::InvalidArgument => write!(f, "invalid argument: service and port must be non-zero"),
            Self::NotFound => write!(f, "no server record at the given (node, port)"),
            Self::Transport(e) => write!(f, "transport error: {e}"),
            Self::ResourceExhausted => write!(f, "resource exhausted while growing a table"),
        }
    }
}

impl std::error::Error for Error {}

impl From<codec::Error> for Error {
    fn from(value: codec::Error) -> Self {
        Self::Decode(value)
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Transport(value)
    }
}
