//! The legacy lookup-protocol packet, exchanged between local clients and
//! the name-service port. Unlike the control packet, the payload size
//! depends on the tag: `RESET`/`BYE`/`PUBLISH` are short, `NOTICE` is the
//! largest arm. Encoding always produces the `LEN` (largest-arm) size,
//! zero-padded; decoding only requires the bytes the tag actually needs.

use crate::{Error, read_u32, write_u32};
use num_enum::TryFromPrimitive;

/// On-wire length of a lookup packet: the 4-byte type tag plus the
/// largest union arm (`NOTICE`'s five `u32`s).
pub const LEN: usize = 4 + 5 * 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
pub enum Type {
    Reset = 0,
    Publish = 1,
    Query = 3,
    Notice = 4,
    Bye = 5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupPacket {
    Reset,
    Publish { service: u32, instance: u32 },
    Query { service: u32, instance: u32, ifilter: u32 },
    /// `seq == 0` signals the end of a query's burst of notices.
    Notice {
        seq: u32,
        service: u32,
        instance: u32,
        node: u32,
        port: u32,
    },
    Bye { service: u32, instance: u32 },
}

impl LookupPacket {
    pub fn kind(&self) -> Type {
        match self {
            Self::Reset => Type::Reset,
            Self::Publish { .. } => Type::Publish,
            Self::Query { .. } => Type::Query,
            Self::Notice { .. } => Type::Notice,
            Self::Bye { .. } => Type::Bye,
        }
    }

    pub fn encode(&self) -> [u8; LEN] {
        let mut buf = [0u8; LEN];
        write_u32(&mut buf, 0, self.kind() as u32);

        match self {
            Self::Reset => {}
            Self::Publish { service, instance } | Self::Bye { service, instance } => {
                write_u32(&mut buf, 4, *service);
                write_u32(&mut buf, 8, *instance);
            }
            Self::Query {
                service,
                instance,
                ifilter,
            } => {
                write_u32(&mut buf, 4, *service);
                write_u32(&mut buf, 8, *instance);
                write_u32(&mut buf, 12, *ifilter);
            }
            Self::Notice {
                seq,
                service,
                instance,
                node,
                port,
            } => {
                write_u32(&mut buf, 4, *seq);
                write_u32(&mut buf, 8, *service);
                write_u32(&mut buf, 12, *instance);
                write_u32(&mut buf, 16, *node);
                write_u32(&mut buf, 20, *port);
            }
        }

        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        if buf.len() < 4 {
            return Err(Error::ShortPacket);
        }

        let kind = Type::try_from(read_u32(buf, 0)).map_err(|e| Error::UnknownType(e.number))?;

        let required = match kind {
            Type::Reset => 4,
            Type::Publish | Type::Bye => 12,
            Type::Query => 16,
            Type::Notice => 24,
        };

        if buf.len() < required {
            return Err(Error::TruncatedPayload);
        }

        Ok(match kind {
            Type::Reset => Self::Reset,
            Type::Publish => Self::Publish {
                service: read_u32(buf, 4),
                instance: read_u32(buf, 8),
            },
            Type::Bye => Self::Bye {
                service: read_u32(buf, 4),
                instance: read_u32(buf, 8),
            },
            Type::Query => Self::Query {
                service: read_u32(buf, 4),
                instance: read_u32(buf, 8),
                ifilter: read_u32(buf, 12),
            },
            Type::Notice => Self::Notice {
                seq: read_u32(buf, 4),
                service: read_u32(buf, 8),
                instance: read_u32(buf, 12),
                node: read_u32(buf, 16),
                port: read_u32(buf, 20),
            },
        })
    }
}
