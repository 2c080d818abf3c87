//! Apploader header
//!
//! 32-byte record at partition offset 0x2440:
//!
//! | Offset | Size | Field        |
//! |--------|------|--------------|
//! | 0x00   | 16   | revision     |
//! | 0x10   | 4    | entry point  |
//! | 0x14   | 4    | code size    |
//! | 0x18   | 4    | trailer size |
//! | 0x1C   | 4    | padding      |

use crate::error::{BootError, Result};
use crate::types::{read_be_u32, APPLOADER_HEADER_SIZE, LOADER_REGION_SIZE};
use core::fmt;

/// Parsed apploader header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApploaderHeader {
    /// Build revision tag (usually a date string)
    pub revision: [u8; 16],
    /// Apploader entry routine, never dereferenced here
    pub entry: u32,
    /// Code size in bytes
    pub code_size: u32,
    /// Trailer size in bytes
    pub trailer_size: u32,
    code_len: u32,
}

impl ApploaderHeader {
    /// Parse the raw header
    ///
    /// Fails with `InvalidHeader` if the record is short, the sizes overflow,
    /// or the code would not fit the loader region.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < APPLOADER_HEADER_SIZE {
            return Err(BootError::InvalidHeader);
        }

        let mut revision = [0u8; 16];
        revision.copy_from_slice(&data[..16]);
        let entry = read_be_u32(data, 0x10);
        let code_size = read_be_u32(data, 0x14);
        let trailer_size = read_be_u32(data, 0x18);

        let code_len = code_size
            .checked_add(trailer_size)
            .ok_or(BootError::InvalidHeader)?;
        if code_len > LOADER_REGION_SIZE {
            return Err(BootError::InvalidHeader);
        }

        Ok(Self {
            revision,
            entry,
            code_size,
            trailer_size,
            code_len,
        })
    }

    /// Bytes of loader code to fetch (`code_size + trailer_size`)
    pub fn code_len(&self) -> u32 {
        self.code_len
    }

    /// Revision as text, up to the first NUL
    pub fn revision_str(&self) -> &str {
        let end = self.revision.iter().position(|&b| b == 0).unwrap_or(16);
        core::str::from_utf8(&self.revision[..end]).unwrap_or("")
    }
}

impl fmt::Display for ApploaderHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "apploader {} entry={:#010x} size={:#x} trailer={:#x}",
            self.revision_str(),
            self.entry,
            self.code_size,
            self.trailer_size
        )
    }
}
