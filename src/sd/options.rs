use crate::codec::{SomeIpSerialize, SomeIpDeserialize};
use std::io::{Result, Write, Read};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

pub const PROTO_TCP: u8 = 0x06;
pub const PROTO_UDP: u8 = 0x11;

const IPV4_ENDPOINT: u8 = 0x04;
const IPV6_ENDPOINT: u8 = 0x06;

/// Endpoint options; anything else is carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdOption {
    Ipv4Endpoint {
        address: Ipv4Addr,
        transport_proto: u8,
        port: u16,
    },
    Ipv6Endpoint {
        address: Ipv6Addr,
        transport_proto: u8,
        port: u16,
    },
    Unknown {
        type_id: u8,
        /// Bytes after the type field
        data: Vec<u8>,
    },
}

impl SdOption {
    pub fn endpoint(&self) -> Option<SocketAddr> {
        match self {
            SdOption::Ipv4Endpoint { address, port, .. } => Some(SocketAddr::from((*address, *port))),
            SdOption::Ipv6Endpoint { address, port, .. } => Some(SocketAddr::from((*address, *port))),
            SdOption::Unknown { .. } => None,
        }
    }
}

impl SomeIpSerialize for SdOption {
    // [Len:2][Type:1][Res:1][Addr][Res:1][L4:1][Port:2]; Len counts bytes after Type.
    fn serialize<W: Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            SdOption::Ipv4Endpoint { address, transport_proto, port } => {
                writer.write_all(&0x0009u16.to_be_bytes())?;
                writer.write_all(&[IPV4_ENDPOINT, 0x00])?;
                writer.write_all(&address.octets())?;
                writer.write_all(&[0x00, *transport_proto])?;
                writer.write_all(&port.to_be_bytes())
            }
            SdOption::Ipv6Endpoint { address, transport_proto, port } => {
                writer.write_all(&0x0015u16.to_be_bytes())?;
                writer.write_all(&[IPV6_ENDPOINT, 0x00])?;
                writer.write_all(&address.octets())?;
                writer.write_all(&[0x00, *transport_proto])?;
                writer.write_all(&port.to_be_bytes())
            }
            SdOption::Unknown { type_id, data } => {
                writer.write_all(&(data.len() as u16).to_be_bytes())?;
                writer.write_all(&[*type_id])?;
                writer.write_all(data)
            }
        }
    }
}

impl SomeIpDeserialize for SdOption {
    fn deserialize<R: Read>(reader: &mut R) -> Result<Self> {
        let mut head = [0u8; 3];
        reader.read_exact(&mut head)?;
        let length = u16::from_be_bytes([head[0], head[1]]);
        let type_id = head[2];

        let mut data = vec![0u8; length as usize];
        reader.read_exact(&mut data)?;

        match type_id {
            IPV4_ENDPOINT if data.len() >= 9 => Ok(SdOption::Ipv4Endpoint {
                address: Ipv4Addr::new(data[1], data[2], data[3], data[4]),
                transport_proto: data[6],
                port: u16::from_be_bytes([data[7], data[8]]),
            }),
            IPV6_ENDPOINT if data.len() >= 21 => {
                let mut octets = [0u8; 16];
                octets.copy_from_slice(&data[1..17]);
                Ok(SdOption::Ipv6Endpoint {
                    address: Ipv6Addr::from(octets),
                    transport_proto: data[18],
                    port: u16::from_be_bytes([data[19], data[20]]),
                })
            }
            _ => Ok(SdOption::Unknown { type_id, data }),
        }
    }
}
