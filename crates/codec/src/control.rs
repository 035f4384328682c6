//! The control packet: a fixed 20-byte, little-endian message exchanged
//! between control ports. Offset 0 carries the command; offset 4 carries
//! one of two unions depending on the command (`server` or `client`).

use crate::{Error, read_u32, write_u32};
use num_enum::TryFromPrimitive;

/// On-wire length of a control packet. Encoding always produces exactly
/// this many bytes, zero-padding commands that carry no payload — this
/// matches what the kernel and peer daemons actually put on the wire.
/// Decoding is more lenient: a 4-byte datagram is accepted for commands
/// that carry no payload.
pub const LEN: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
pub enum Cmd {
    Hello = 2,
    Bye = 3,
    NewServer = 4,
    DelServer = 5,
    DelClient = 6,
    ResumeTx = 7,
    Exit = 8,
    Ping = 9,
    NewLookup = 10,
    DelLookup = 11,
    LookupResult = 12,
}

/// The `{service, instance, node, port}` union arm, used by `NEW_SERVER`,
/// `DEL_SERVER`, `NEW_LOOKUP`, `DEL_LOOKUP` and `LOOKUP_RESULT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServerFields {
    pub service: u32,
    pub instance: u32,
    pub node: u32,
    pub port: u32,
}

/// The `{node, port}` union arm, used by `DEL_CLIENT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClientFields {
    pub node: u32,
    pub port: u32,
}

/// A decoded control packet, tagged by command with exactly the fields
/// that command's wire layout carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPacket {
    Hello,
    Bye,
    NewServer(ServerFields),
    DelServer(ServerFields),
    DelClient(ClientFields),
    ResumeTx,
    Exit,
    Ping,
    /// A subscription request. `node`/`port` are unused on this direction
    /// of the wire (the subscriber is the packet's source address, not an
    /// in-band field) and are always encoded as zero.
    NewLookup { service: u32, instance: u32 },
    /// Cancels a prior `NewLookup`. Same field shape as `NewLookup`.
    DelLookup { service: u32, instance: u32 },
    /// A notification sent to a lookup subscriber. All-zero fields signal
    /// the end of an initial snapshot.
    LookupResult(ServerFields),
}

impl ControlPacket {
    pub fn cmd(&self) -> Cmd {
        match self {
            Self::Hello => Cmd::Hello,
            Self::Bye => Cmd::Bye,
            Self::NewServer(_) => Cmd::NewServer,
            Self::DelServer(_) => Cmd::DelServer,
            Self::DelClient(_) => Cmd::DelClient,
            Self::ResumeTx => Cmd::ResumeTx,
            Self::Exit => Cmd::Exit,
            Self::Ping => Cmd::Ping,
            Self::NewLookup { .. } => Cmd::NewLookup,
            Self::DelLookup { .. } => Cmd::DelLookup,
            Self::LookupResult(_) => Cmd::LookupResult,
        }
    }

    /// Encodes this packet as a fixed `LEN`-byte little-endian buffer.
    pub fn encode(&self) -> [u8; LEN] {
        let mut buf = [0u8; LEN];
        write_u32(&mut buf, 0, self.cmd() as u32);

        match self {
            Self::Hello | Self::Bye | Self::ResumeTx | Self::Exit | Self::Ping => {}
            Self::NewServer(f) | Self::DelServer(f) | Self::LookupResult(f) => {
                write_server_fields(&mut buf, f)
            }
            Self::DelClient(f) => {
                write_u32(&mut buf, 4, f.node);
                write_u32(&mut buf, 8, f.port);
            }
            Self::NewLookup { service, instance } | Self::DelLookup { service, instance } => {
                write_server_fields(
                    &mut buf,
                    &ServerFields {
                        service: *service,
                        instance: *instance,
                        node: 0,
                        port: 0,
                    },
                )
            }
        }

        buf
    }

    /// Decodes a control packet from a received datagram. Accepts a
    /// 4-byte datagram for commands with no payload; all other commands
    /// require the full `LEN` bytes.
    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        if buf.len() < 4 {
            return Err(Error::ShortPacket);
        }

        let cmd = Cmd::try_from(read_u32(buf, 0)).map_err(|e| Error::UnknownCommand(e.number))?;

        let needs_payload = !matches!(
            cmd,
            Cmd::Hello | Cmd::Bye | Cmd::ResumeTx | Cmd::Exit | Cmd::Ping
        );

        if needs_payload && buf.len() < LEN {
            return Err(Error::TruncatedPayload);
        }

        Ok(match cmd {
            Cmd::Hello => Self::Hello,
            Cmd::Bye => Self::Bye,
            Cmd::ResumeTx => Self::ResumeTx,
            Cmd::Exit => Self::Exit,
            Cmd::Ping => Self::Ping,
            Cmd::NewServer => Self::NewServer(read_server_fields(buf)),
            Cmd::DelServer => Self::DelServer(read_server_fields(buf)),
            Cmd::LookupResult => Self::LookupResult(read_server_fields(buf)),
            Cmd::DelClient => Self::DelClient(ClientFields {
                node: read_u32(buf, 4),
                port: read_u32(buf, 8),
            }),
            Cmd::NewLookup => {
                let f = read_server_fields(buf);
                Self::NewLookup {
                    service: f.service,
                    instance: f.instance,
                }
            }
            Cmd::DelLookup => {
                let f = read_server_fields(buf);
                Self::DelLookup {
                    service: f.service,
                    instance: f.instance,
                }
            }
        })
    }
}

fn read_server_fields(buf: &[u8]) -> ServerFields {
    ServerFields {
        service: read_u32(buf, 4),
        instance: read_u32(buf, 8),
        node: read_u32(buf, 12),
        port: read_u32(buf, 16),
    }
}

fn write_server_fields(buf: &mut [u8], f: &ServerFields) {
    write_u32(buf, 4, f.service);
    write_u32(buf, 8, f.instance);
    write_u32(buf, 12, f.node);
    write_u32(buf, 16, f.port);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_lookup_result() {
        let original = ControlPacket::LookupResult(ServerFields {
            service: 0x12345678,
            instance: 0x9ABCDEF0,
            node: 7,
            port: 300,
        });

        let bytes = original.encode();
        assert_eq!(bytes.len(), LEN);

        let decoded = ControlPacket::decode(&bytes).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn round_trips_every_variant() {
        let samples = [
            ControlPacket::Hello,
            ControlPacket::Bye,
            ControlPacket::ResumeTx,
            ControlPacket::Exit,
            ControlPacket::Ping,
            ControlPacket::NewServer(ServerFields {
                service: 1,
                instance: 0x10001,
                node: 2,
                port: 100,
            }),
            ControlPacket::DelServer(ServerFields {
                service: 1,
                instance: 0x10001,
                node: 2,
                port: 100,
            }),
            ControlPacket::DelClient(ClientFields { node: 5, port: 300 }),
            ControlPacket::NewLookup {
                service: 3,
                instance: 0,
            },
            ControlPacket::DelLookup {
                service: 3,
                instance: 7,
            },
        ];

        for sample in samples {
            let bytes = sample.encode();
            assert_eq!(ControlPacket::decode(&bytes).unwrap(), sample);
        }
    }

    #[test]
    fn accepts_short_datagram_for_payload_free_commands() {
        let bytes = (Cmd::Hello as u32).to_le_bytes();
        assert_eq!(ControlPacket::decode(&bytes).unwrap(), ControlPacket::Hello);
    }

    #[test]
    fn rejects_short_datagram_for_payload_commands() {
        let mut bytes = [0u8; 10];
        write_u32(&mut bytes, 0, Cmd::NewServer as u32);
        assert_eq!(
            ControlPacket::decode(&bytes),
            Err(Error::TruncatedPayload)
        );
    }

    #[test]
    fn rejects_unknown_command() {
        let bytes = 0xFFFFu32.to_le_bytes();
        assert_eq!(
            ControlPacket::decode(&bytes),
            Err(Error::UnknownCommand(0xFFFF))
        );
    }

    #[test]
    fn rejects_empty_datagram() {
        assert_eq!(ControlPacket::decode(&[]), Err(Error::ShortPacket));
    }
}
