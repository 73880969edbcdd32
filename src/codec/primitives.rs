use super::traits::{SomeIpSerialize, SomeIpDeserialize};
use std::io::{Result, Write, Read};

/// Append a 16-bit value in network byte order.
pub fn inject_u16(buffer: &mut Vec<u8>, value: u16) {
    buffer.extend_from_slice(&value.to_be_bytes());
}

/// Append a 32-bit value in network byte order.
pub fn inject_u32(buffer: &mut Vec<u8>, value: u32) {
    buffer.extend_from_slice(&value.to_be_bytes());
}

/// Append `tail` to `buffer`, consuming it.
pub fn concat(buffer: &mut Vec<u8>, mut tail: Vec<u8>) {
    if buffer.is_empty() {
        *buffer = tail;
    } else {
        buffer.append(&mut tail);
    }
}

macro_rules! impl_primitive {
    ($type:ty, $bytes:expr) => {
        impl SomeIpSerialize for $type {
            fn serialize<W: Write>(&self, writer: &mut W) -> Result<()> {
                writer.write_all(&self.to_be_bytes())
            }
        }

        impl SomeIpDeserialize for $type {
            fn deserialize<R: Read>(reader: &mut R) -> Result<Self> {
                let mut buf = [0u8; $bytes];
                reader.read_exact(&mut buf)?;
                Ok(<$type>::from_be_bytes(buf))
            }
        }
    };
}

impl_primitive!(u8, 1);
impl_primitive!(u16, 2);
impl_primitive!(u32, 4);
impl_primitive!(u64, 8);

// 0x00 = false, anything else = true
impl SomeIpSerialize for bool {
    fn serialize<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[*self as u8])
    }
}

impl SomeIpDeserialize for bool {
    fn deserialize<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; 1];
        reader.read_exact(&mut buf)?;
        Ok(buf[0] != 0)
    }
}
