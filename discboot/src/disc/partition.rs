//! Wii partition table lookup
//!
//! The partition info record at 0x40000 points at a table of
//! `{offset >> 2, kind}` pairs. The boot path only wants the first data
//! partition, in table order.

use crate::error::{BootError, Result};
use crate::medium::Medium;
use crate::types::{read_be_u32, MAX_PARTITIONS, PARTITION_INFO_OFFSET};

/// Size of the partition info record (first group plus padding)
const INFO_RECORD_SIZE: usize = 0x20;

/// Size of one partition table entry
const ENTRY_SIZE: usize = 8;

/// Partition offsets on disc are stored in 4-byte units
const OFFSET_SHIFT: u32 = 2;

/// Signature type that opens a raw partition's ticket (RSA-2048)
pub const TICKET_SIGNATURE_RSA2048: u32 = 0x0001_0001;

/// Partition kind as stored in the table
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PartitionKind {
    /// Game data
    Data,
    /// System update
    Update,
    /// Installable channel
    Channel,
    /// Anything else
    Other(u32),
}

impl PartitionKind {
    /// Decode the raw table value
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => PartitionKind::Data,
            1 => PartitionKind::Update,
            2 => PartitionKind::Channel,
            other => PartitionKind::Other(other),
        }
    }

    /// Encode back to the raw table value
    pub fn to_raw(self) -> u32 {
        match self {
            PartitionKind::Data => 0,
            PartitionKind::Update => 1,
            PartitionKind::Channel => 2,
            PartitionKind::Other(raw) => raw,
        }
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            PartitionKind::Data => "Data",
            PartitionKind::Update => "Update",
            PartitionKind::Channel => "Channel",
            PartitionKind::Other(_) => "Unknown",
        }
    }
}

/// One partition table entry
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PartitionEntry {
    /// Absolute byte offset of the partition
    pub offset: u64,
    /// Partition kind
    pub kind: PartitionKind,
}

impl PartitionEntry {
    /// Decode an 8-byte table entry
    pub fn parse(data: &[u8]) -> Self {
        Self {
            offset: u64::from(read_be_u32(data, 0)) << OFFSET_SHIFT,
            kind: PartitionKind::from_raw(read_be_u32(data, 4)),
        }
    }
}

/// Partition table read from the disc, in table order
pub struct PartitionTable {
    entries: [Option<PartitionEntry>; MAX_PARTITIONS],
    count: usize,
}

impl PartitionTable {
    /// Empty table
    pub const fn new() -> Self {
        Self {
            entries: [None; MAX_PARTITIONS],
            count: 0,
        }
    }

    /// Append an entry; returns `false` once the table is full
    pub fn push(&mut self, entry: PartitionEntry) -> bool {
        if self.count >= MAX_PARTITIONS {
            return false;
        }
        self.entries[self.count] = Some(entry);
        self.count += 1;
        true
    }

    /// Number of entries
    pub fn count(&self) -> usize {
        self.count
    }

    /// Entry at `index`
    pub fn get(&self, index: usize) -> Option<&PartitionEntry> {
        if index < self.count {
            self.entries[index].as_ref()
        } else {
            None
        }
    }

    /// Entries in table order
    pub fn iter(&self) -> impl Iterator<Item = &PartitionEntry> {
        self.entries[..self.count].iter().filter_map(|e| e.as_ref())
    }

    /// First data partition in table order
    pub fn find_data(&self) -> Option<&PartitionEntry> {
        self.iter().find(|e| e.kind == PartitionKind::Data)
    }
}

impl Default for PartitionTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Read the partition table
///
/// Reported counts above [`MAX_PARTITIONS`] are clamped.
pub fn read_table<M: Medium>(medium: &mut M) -> Result<PartitionTable> {
    let mut info = [0u8; INFO_RECORD_SIZE];
    medium
        .read(&mut info, PARTITION_INFO_OFFSET)
        .map_err(|_| BootError::MediumRead)?;

    let reported = read_be_u32(&info, 0) as usize;
    let table_offset = u64::from(read_be_u32(&info, 4)) << OFFSET_SHIFT;

    let count = if reported > MAX_PARTITIONS {
        log::warn!(
            "partition table reports {} entries, reading first {}",
            reported,
            MAX_PARTITIONS
        );
        MAX_PARTITIONS
    } else {
        reported
    };

    let mut raw = [0u8; ENTRY_SIZE * MAX_PARTITIONS];
    let raw = &mut raw[..count * ENTRY_SIZE];
    medium
        .read(raw, table_offset)
        .map_err(|_| BootError::MediumRead)?;

    let mut table = PartitionTable::new();
    for chunk in raw.chunks_exact(ENTRY_SIZE) {
        table.push(PartitionEntry::parse(chunk));
    }
    Ok(table)
}

/// Does the partition at `base` read back as a raw ticket?
///
/// Decrypted partition data starts with a copy of the disc header. A raw
/// partition starts with its ticket, whose first word is the signature type.
pub fn is_raw_partition<M: Medium>(medium: &mut M, base: u64) -> Result<bool> {
    let mut word = [0u8; 4];
    medium
        .read(&mut word, base)
        .map_err(|_| BootError::MediumRead)?;
    Ok(u32::from_be_bytes(word) == TICKET_SIGNATURE_RSA2048)
}

/// Find the data partition and position the drive on it
///
/// # Returns
/// Absolute byte offset of the first data partition in table order
pub fn resolve<M: Medium>(medium: &mut M) -> Result<u64> {
    let table = read_table(medium)?;

    let offset = match table.find_data() {
        Some(entry) => entry.offset,
        None => {
            log::warn!("no data partition among {} entries", table.count());
            return Err(BootError::PartitionNotFound);
        }
    };

    medium.seek(offset).map_err(|_| BootError::MediumRead)?;
    log::info!("data partition at {:#x}", offset);
    Ok(offset)
}
