use std::io::{Result, Write, Read};

/// Types with a big-endian SOME/IP wire representation.
pub trait SomeIpSerialize {
    fn serialize<W: Write>(&self, writer: &mut W) -> Result<()>;

    /// Serialize into a fresh buffer. Writing into a `Vec` cannot fail.
    fn to_vec(&self) -> Vec<u8> {
        let mut buffer = Vec::new();
        let _ = self.serialize(&mut buffer);
        buffer
    }
}

pub trait SomeIpDeserialize: Sized {
    fn deserialize<R: Read>(reader: &mut R) -> Result<Self>;
}
