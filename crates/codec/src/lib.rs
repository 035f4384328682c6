//! Wire codec for the two binary protocols spoken on the QRTR fabric:
//!
//! - the **control** protocol, exchanged between control ports (kernel and
//!   peer name-service daemons);
//! - the legacy **lookup** protocol, exchanged between local clients and the
//!   name-service port.
//!
//! Both are fixed-layout, little-endian, and carry no length prefix beyond
//! the datagram boundary itself — the kernel fabric preserves datagram
//! boundaries, so a single `recvfrom` yields exactly one packet.

pub mod control;
pub mod lookup;

use std::fmt;

/// Decode failure. All variants are non-fatal to the daemon: the offending
/// datagram is discarded and logged, per the error handling design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Fewer than 4 bytes were received; not even a command/type tag fits.
    ShortPacket,
    /// The packet's tag requires more bytes than were delivered.
    TruncatedPayload,
    /// The control packet's `cmd` field did not match a known command.
    UnknownCommand(u32),
    /// The lookup packet's `type` field did not match a known type.
    UnknownType(u32),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShortPacket => write!(f, "packet shorter than a command tag"),
            Self::TruncatedPayload => write!(f, "packet too short for its tag's payload"),
            Self::UnknownCommand(cmd) => write!(f, "unknown control command {cmd}"),
            Self::UnknownType(ty) => write!(f, "unknown lookup packet type {ty}"),
        }
    }
}

impl std::error::Error for Error {}

#[inline(always)]
pub(crate) fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

#[inline(always)]
pub(crate) fn write_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}
