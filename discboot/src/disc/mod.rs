//! Disc header parsing
//!
//! The first 0x20 bytes of every disc carry the title identifier and a magic
//! word telling Wii and GameCube discs apart.

pub mod partition;

use crate::error::{BootError, Result};
use crate::medium::Medium;
use crate::types::{
    read_be_u32, DiscKind, TitleId, DISC_HEADER_SIZE, GC_MAGIC, GC_MAGIC_OFFSET, TITLE_ID_LEN,
    WII_MAGIC, WII_MAGIC_OFFSET,
};

/// GameCube discs with this id carry no magic but are still bootable
const GC_MAGICLESS_ID: &[u8; TITLE_ID_LEN] = b"GCOPDV";

/// Parsed disc header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscHeader {
    /// Title identifier
    pub title_id: TitleId,
    /// Disc number (multi-disc games)
    pub disc_number: u8,
    /// Disc version
    pub version: u8,
    /// Wii magic word
    pub wii_magic: u32,
    /// GameCube magic word
    pub gc_magic: u32,
}

impl DiscHeader {
    /// Parse from the first 0x20 bytes of the disc
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < DISC_HEADER_SIZE {
            return Err(BootError::UnknownDisc);
        }
        let title_id = TitleId::from_bytes(data).ok_or(BootError::UnknownDisc)?;
        Ok(Self {
            title_id,
            disc_number: data[6],
            version: data[7],
            wii_magic: read_be_u32(data, WII_MAGIC_OFFSET),
            gc_magic: read_be_u32(data, GC_MAGIC_OFFSET),
        })
    }

    /// Disc family, if the magic is recognised
    ///
    /// Wii takes precedence when both words are set.
    pub fn kind(&self) -> Option<DiscKind> {
        if self.wii_magic == WII_MAGIC {
            Some(DiscKind::Wii)
        } else if self.gc_magic == GC_MAGIC || self.title_id.as_bytes() == GC_MAGICLESS_ID {
            Some(DiscKind::GameCube)
        } else {
            None
        }
    }
}

/// Read the disc header at offset 0
pub fn read_header<M: Medium>(medium: &mut M) -> Result<DiscHeader> {
    let mut buffer = [0u8; DISC_HEADER_SIZE];
    medium
        .read(&mut buffer, 0)
        .map_err(|_| BootError::MediumRead)?;
    DiscHeader::parse(&buffer)
}

/// Read the six-byte title identifier
pub fn read_title_id<M: Medium>(medium: &mut M) -> Result<TitleId> {
    let mut buffer = [0u8; TITLE_ID_LEN];
    medium
        .read(&mut buffer, 0)
        .map_err(|_| BootError::MediumRead)?;
    Ok(TitleId(buffer))
}

/// Detect the disc family
pub fn detect<M: Medium>(medium: &mut M) -> Result<DiscKind> {
    let header = read_header(medium)?;
    header.kind().ok_or(BootError::UnknownDisc)
}
