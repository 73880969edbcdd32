use crate::codec::{SomeIpSerialize, SomeIpDeserialize};
use crate::sd::entries::SdEntry;
use crate::sd::options::SdOption;
use std::io::{Error, ErrorKind, Result, Write, Read};

/// SD payload: flags, entries array, options array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdPacket {
    pub flags: u8,
    pub entries: Vec<SdEntry>,
    pub options: Vec<SdOption>,
}

impl SdPacket {
    pub const REBOOT_FLAG: u8 = 0x80;
    pub const UNICAST_FLAG: u8 = 0x40;

    pub fn new(entries: Vec<SdEntry>, options: Vec<SdOption>) -> Self {
        SdPacket { flags: Self::REBOOT_FLAG, entries, options }
    }

    /// Options referenced by both option runs of `entry`. Runs pointing
    /// outside the options array are skipped.
    pub fn options_for(&self, entry: &SdEntry) -> Vec<SdOption> {
        let runs = [
            (entry.index_1 as usize, entry.number_of_opts_1 as usize),
            (entry.index_2 as usize, entry.number_of_opts_2 as usize),
        ];

        runs.iter()
            .filter(|(_, count)| *count > 0)
            .filter_map(|(start, count)| self.options.get(*start..start + count))
            .flatten()
            .cloned()
            .collect()
    }
}

impl SomeIpSerialize for SdPacket {
    fn serialize<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[self.flags, 0x00, 0x00, 0x00])?;

        let mut entries = Vec::new();
        for entry in &self.entries {
            entry.serialize(&mut entries)?;
        }
        writer.write_all(&(entries.len() as u32).to_be_bytes())?;
        writer.write_all(&entries)?;

        let mut options = Vec::new();
        for option in &self.options {
            option.serialize(&mut options)?;
        }
        writer.write_all(&(options.len() as u32).to_be_bytes())?;
        writer.write_all(&options)
    }
}

impl SomeIpDeserialize for SdPacket {
    fn deserialize<R: Read>(reader: &mut R) -> Result<Self> {
        let flags = u32::deserialize(reader)?.to_be_bytes()[0];

        let entries_len = u32::deserialize(reader)?;
        if entries_len % SdEntry::LENGTH != 0 {
            return Err(Error::new(ErrorKind::InvalidData, "entries array length is not a multiple of 16"));
        }
        let entries = (0..entries_len / SdEntry::LENGTH)
            .map(|_| SdEntry::deserialize(reader))
            .collect::<Result<Vec<_>>>()?;

        let options_len = u32::deserialize(reader)?;
        let mut options_reader = reader.take(options_len as u64);
        let mut options = Vec::new();
        // Take returns EOF once the declared array length is consumed
        while options_reader.limit() > 0 {
            options.push(SdOption::deserialize(&mut options_reader)?);
        }

        Ok(SdPacket { flags, entries, options })
    }
}
