use crate::common::{MemoryBlockDevice, SECTOR};
use discboot::medium::BlockMedium;
use discboot::types::{
    APPLOADER_CODE_OFFSET, APPLOADER_HEADER_OFFSET, GC_MAGIC, GC_MAGIC_OFFSET,
    PARTITION_INFO_OFFSET, WII_MAGIC, WII_MAGIC_OFFSET,
};
use discboot::disc::partition::TICKET_SIGNATURE_RSA2048;

/// Partition table placed right after the info record
const TABLE_OFFSET: u64 = PARTITION_INFO_OFFSET + 0x20;

enum Family {
    Wii,
    GameCube,
    Blank,
}

/// Lays out a disc image: header, partition table, apploader and payload
pub struct DiscBuilder {
    family: Family,
    id: [u8; 6],
    partitions: Vec<(u64, u32)>,
    reported_count: Option<u32>,
    apploader: Option<(u32, u32, u32)>,
    payload: Vec<(u64, Vec<u8>)>,
    encrypted: bool,
}

impl DiscBuilder {
    pub fn wii(id: &[u8; 6]) -> Self {
        Self::with_family(Family::Wii, id)
    }

    pub fn gamecube(id: &[u8; 6]) -> Self {
        Self::with_family(Family::GameCube, id)
    }

    /// No magic at all
    pub fn blank(id: &[u8; 6]) -> Self {
        Self::with_family(Family::Blank, id)
    }

    fn with_family(family: Family, id: &[u8; 6]) -> Self {
        Self {
            family,
            id: *id,
            partitions: Vec::new(),
            reported_count: None,
            apploader: None,
            payload: Vec::new(),
            encrypted: false,
        }
    }

    /// Add a partition table entry (byte offset, raw kind)
    pub fn partition(mut self, offset: u64, kind: u32) -> Self {
        self.partitions.push((offset, kind));
        self
    }

    /// Override the entry count written to the info record
    pub fn reported_count(mut self, count: u32) -> Self {
        self.reported_count = Some(count);
        self
    }

    /// Apploader header and code in the boot partition
    pub fn apploader(mut self, entry: u32, code_size: u32, trailer_size: u32) -> Self {
        self.apploader = Some((entry, code_size, trailer_size));
        self
    }

    /// Bytes at a partition-relative offset
    pub fn payload(mut self, offset: u64, bytes: Vec<u8>) -> Self {
        self.payload.push((offset, bytes));
        self
    }

    /// Start the boot partition with a ticket, as a retail image does
    pub fn encrypted(mut self) -> Self {
        self.encrypted = true;
        self
    }

    /// Offset the apploader and payload are placed at
    pub fn boot_base(&self) -> u64 {
        match self.family {
            Family::Wii => self
                .partitions
                .iter()
                .find(|(_, kind)| *kind == 0)
                .map_or(0, |(offset, _)| *offset),
            _ => 0,
        }
    }

    pub fn build(self) -> MemoryBlockDevice {
        let base = self.boot_base();

        let mut end = TABLE_OFFSET + 8 * self.partitions.len() as u64;
        if self.encrypted {
            end = end.max(base + 4);
        }
        if let Some((_, size, trailer)) = self.apploader {
            end = end.max(base + APPLOADER_CODE_OFFSET + u64::from(size + trailer));
        }
        for (offset, bytes) in &self.payload {
            end = end.max(base + offset + bytes.len() as u64);
        }
        let len = (end as usize).div_ceil(SECTOR) * SECTOR;
        let mut data = vec![0u8; len];

        data[..6].copy_from_slice(&self.id);
        match self.family {
            Family::Wii => put_u32(&mut data, WII_MAGIC_OFFSET as u64, WII_MAGIC),
            Family::GameCube => put_u32(&mut data, GC_MAGIC_OFFSET as u64, GC_MAGIC),
            Family::Blank => {}
        }

        if matches!(self.family, Family::Wii) {
            let count = self
                .reported_count
                .unwrap_or(self.partitions.len() as u32);
            put_u32(&mut data, PARTITION_INFO_OFFSET, count);
            put_u32(&mut data, PARTITION_INFO_OFFSET + 4, (TABLE_OFFSET >> 2) as u32);
            for (i, (offset, kind)) in self.partitions.iter().enumerate() {
                let at = TABLE_OFFSET + 8 * i as u64;
                put_u32(&mut data, at, (offset >> 2) as u32);
                put_u32(&mut data, at + 4, *kind);
            }
        }

        if let Some((entry, size, trailer)) = self.apploader {
            let header = (base + APPLOADER_HEADER_OFFSET) as usize;
            data[header..header + 10].copy_from_slice(b"2009/05/13");
            put_u32(&mut data, base + APPLOADER_HEADER_OFFSET + 0x10, entry);
            put_u32(&mut data, base + APPLOADER_HEADER_OFFSET + 0x14, size);
            put_u32(&mut data, base + APPLOADER_HEADER_OFFSET + 0x18, trailer);
            let code = (base + APPLOADER_CODE_OFFSET) as usize;
            for (i, byte) in data[code..code + (size + trailer) as usize]
                .iter_mut()
                .enumerate()
            {
                *byte = (i % 251) as u8 + 1;
            }
        }

        if self.encrypted {
            put_u32(&mut data, base, TICKET_SIGNATURE_RSA2048);
        }

        for (offset, bytes) in &self.payload {
            let at = (base + offset) as usize;
            data[at..at + bytes.len()].copy_from_slice(bytes);
        }

        MemoryBlockDevice::new(data)
    }

    /// Build and wrap as a byte-addressed medium
    pub fn medium(self) -> BlockMedium<MemoryBlockDevice> {
        BlockMedium::new(self.build())
    }
}

fn put_u32(data: &mut [u8], offset: u64, value: u32) {
    let at = offset as usize;
    data[at..at + 4].copy_from_slice(&value.to_be_bytes());
}
