// Raw 517-byte configuration block as exchanged with the device

use super::{CodecError, CodecResult};
use std::fmt;

/// Size of a configuration block in bytes
pub const RECORD_SIZE: usize = 517;

/// Magic bytes at the start of every valid block
pub const MAGIC: &[u8] = b"HELLO";

/// Raw configuration block.
///
/// The buffer may hold anything read from a port or a file so that a bad
/// capture can still be dumped; [`RawRecord::validate`] enforces the size and
/// magic before the block is decoded, encoded against, or sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    data: Vec<u8>,
}

impl RawRecord {
    /// Wrap bytes without checking them
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Wrap bytes, failing unless they form a valid block
    pub fn from_bytes(data: Vec<u8>) -> CodecResult<Self> {
        let record = Self::new(data);
        record.validate()?;
        Ok(record)
    }

    /// A block of `RECORD_SIZE` bytes holding the magic followed by 0xFF fill.
    ///
    /// Useful as a template when no capture from the device is available.
    pub fn blank() -> Self {
        let mut data = vec![0xFFu8; RECORD_SIZE];
        data[..MAGIC.len()].copy_from_slice(MAGIC);
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check length and magic
    pub fn validate(&self) -> CodecResult<()> {
        if self.data.len() != RECORD_SIZE {
            return Err(CodecError::Format(format!(
                "expected {} bytes, got {}",
                RECORD_SIZE,
                self.data.len()
            )));
        }
        if &self.data[..MAGIC.len()] != MAGIC {
            return Err(CodecError::Format(format!(
                "bad magic {:02X?}",
                &self.data[..MAGIC.len()]
            )));
        }
        Ok(())
    }

    /// Get `length` bytes starting at `start`
    pub fn get(&self, start: usize, length: usize) -> Option<&[u8]> {
        self.data.get(start..start.checked_add(length)?)
    }

    /// Get the entire block as raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the record, returning the owned bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Bytes sent after the write command: the block minus its first six bytes
    pub fn write_payload(&self) -> &[u8] {
        self.data.get(6..).unwrap_or(&[])
    }

    /// Hex dump of the block, `hexdump -C` style
    pub fn printable(&self) -> String {
        hexdump(&self.data)
    }
}

impl From<Vec<u8>> for RawRecord {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl AsRef<[u8]> for RawRecord {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Display for RawRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawRecord({} bytes)", self.data.len())
    }
}

fn hexdump(data: &[u8]) -> String {
    let mut output = String::new();

    for (i, chunk) in data.chunks(16).enumerate() {
        output.push_str(&format!("{:08x}  ", i * 16));

        for (j, byte) in chunk.iter().enumerate() {
            if j == 8 {
                output.push(' ');
            }
            output.push_str(&format!("{:02x} ", byte));
        }

        // Pad a short final line so the ASCII column lines up
        for j in chunk.len()..16 {
            if j == 8 {
                output.push(' ');
            }
            output.push_str("   ");
        }

        output.push_str(" |");
        for &byte in chunk {
            if (0x20..=0x7e).contains(&byte) {
                output.push(byte as char);
            } else {
                output.push('.');
            }
        }
        output.push_str("|\n");
    }

    output
}
