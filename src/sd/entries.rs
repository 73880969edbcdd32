use crate::codec::{SomeIpSerialize, SomeIpDeserialize};
use std::io::{Result, Write, Read};

/// SD entry types (AUTOSAR SOME/IP-SD).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EntryType {
    FindService = 0x00,
    /// Offer, or Stop Offer when the TTL is zero
    OfferService = 0x01,
    SubscribeEventgroup = 0x06,
    SubscribeEventgroupAck = 0x07,
    Unknown = 0xFF,
}

impl EntryType {
    pub fn is_service_entry(&self) -> bool {
        matches!(self, EntryType::FindService | EntryType::OfferService)
    }
}

impl From<u8> for EntryType {
    fn from(v: u8) -> Self {
        match v {
            0x00 => EntryType::FindService,
            0x01 => EntryType::OfferService,
            0x06 => EntryType::SubscribeEventgroup,
            0x07 => EntryType::SubscribeEventgroupAck,
            _ => EntryType::Unknown,
        }
    }
}

/// A 16-byte service entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdEntry {
    pub entry_type: EntryType,
    pub index_1: u8,
    pub index_2: u8,
    pub number_of_opts_1: u8,
    pub number_of_opts_2: u8,
    pub service_id: u16,
    pub instance_id: u16,
    pub major_version: u8,
    /// Lease in seconds; only the low 24 bits are transmitted.
    pub ttl: u32,
    pub minor_version: u32,
}

impl SdEntry {
    pub const LENGTH: u32 = 16;
    pub const MAX_TTL: u32 = 0x00FF_FFFF;
    pub const ANY_INSTANCE: u16 = 0xFFFF;
    pub const ANY_MAJOR: u8 = 0xFF;

    /// OfferService entry referencing `option_count` options from index 0.
    pub fn offer(service_id: u16, instance_id: u16, major_version: u8, minor_version: u32, ttl: u32, option_count: u8) -> Self {
        SdEntry {
            entry_type: EntryType::OfferService,
            index_1: 0,
            index_2: 0,
            number_of_opts_1: option_count,
            number_of_opts_2: 0,
            service_id,
            instance_id,
            major_version,
            ttl: ttl.min(Self::MAX_TTL),
            minor_version,
        }
    }

    pub fn stop_offer(service_id: u16, instance_id: u16, major_version: u8, minor_version: u32) -> Self {
        Self::offer(service_id, instance_id, major_version, minor_version, 0, 0)
    }

    pub fn is_stop_offer(&self) -> bool {
        self.entry_type == EntryType::OfferService && self.ttl == 0
    }
}

impl SomeIpSerialize for SdEntry {
    fn serialize<W: Write>(&self, writer: &mut W) -> Result<()> {
        let opts_byte = (self.number_of_opts_1 << 4) | (self.number_of_opts_2 & 0x0F);
        writer.write_all(&[self.entry_type as u8, self.index_1, self.index_2, opts_byte])?;
        writer.write_all(&self.service_id.to_be_bytes())?;
        writer.write_all(&self.instance_id.to_be_bytes())?;
        writer.write_all(&[self.major_version])?;
        writer.write_all(&self.ttl.to_be_bytes()[1..4])?;
        writer.write_all(&self.minor_version.to_be_bytes())
    }
}

impl SomeIpDeserialize for SdEntry {
    fn deserialize<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; 16];
        reader.read_exact(&mut buf)?;

        Ok(SdEntry {
            entry_type: buf[0].into(),
            index_1: buf[1],
            index_2: buf[2],
            number_of_opts_1: buf[3] >> 4,
            number_of_opts_2: buf[3] & 0x0F,
            service_id: u16::from_be_bytes([buf[4], buf[5]]),
            instance_id: u16::from_be_bytes([buf[6], buf[7]]),
            major_version: buf[8],
            ttl: u32::from_be_bytes([0, buf[9], buf[10], buf[11]]),
            minor_version: u32::from_be_bytes([buf[12], buf[13], buf[14], buf[15]]),
        })
    }
}
