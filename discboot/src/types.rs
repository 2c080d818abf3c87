//! Common types and constants for disc booting

use core::fmt;

/// Length of the disc title identifier
pub const TITLE_ID_LEN: usize = 6;

/// Size of the disc header record we inspect (id + magic words)
pub const DISC_HEADER_SIZE: usize = 0x20;

/// Byte offset of the Wii magic word in the disc header
pub const WII_MAGIC_OFFSET: usize = 0x18;

/// Byte offset of the GameCube magic word in the disc header
pub const GC_MAGIC_OFFSET: usize = 0x1C;

/// Wii disc magic
pub const WII_MAGIC: u32 = 0x5D1C_9EA3;

/// GameCube disc magic
pub const GC_MAGIC: u32 = 0xC233_9F3D;

/// Byte offset of the partition info record on a Wii disc
pub const PARTITION_INFO_OFFSET: u64 = 0x4_0000;

/// Maximum partition table entries read
pub const MAX_PARTITIONS: usize = 32;

/// Partition-relative byte offset of the apploader header
pub const APPLOADER_HEADER_OFFSET: u64 = 0x2440;

/// Partition-relative byte offset of the apploader code
pub const APPLOADER_CODE_OFFSET: u64 = 0x2460;

/// Size of the apploader header record
pub const APPLOADER_HEADER_SIZE: usize = 0x20;

/// Guest address the apploader code is loaded to
pub const LOADER_REGION_ADDRESS: u32 = 0x8120_0000;

/// Largest apploader (code + trailer) the loader region accepts
pub const LOADER_REGION_SIZE: u32 = 0x0020_0000;

/// Read a big-endian `u32` at `offset`
///
/// Callers guarantee `offset + 4 <= data.len()`.
pub(crate) fn read_be_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Six-byte disc title identifier (e.g. `SMNE01`)
///
/// Layout: system code, two-byte game code, region code, two-byte maker code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TitleId(pub [u8; TITLE_ID_LEN]);

impl TitleId {
    /// Build from the first six bytes of a buffer
    ///
    /// Returns `None` if the buffer is shorter than six bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let mut id = [0u8; TITLE_ID_LEN];
        id.copy_from_slice(bytes.get(..TITLE_ID_LEN)?);
        Some(Self(id))
    }

    /// Raw identifier bytes
    pub fn as_bytes(&self) -> &[u8; TITLE_ID_LEN] {
        &self.0
    }

    /// Does the identifier start with `prefix`?
    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.0.starts_with(prefix)
    }

    /// Region character (fourth byte)
    pub fn region(&self) -> u8 {
        self.0[3]
    }
}

impl fmt::Display for TitleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            let c = if b.is_ascii_graphic() { b as char } else { '.' };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// Disc family, decided by the header magic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscKind {
    /// Wii disc (partitioned)
    Wii,
    /// GameCube disc (unpartitioned)
    GameCube,
}

/// Apploader state machine stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BootStage {
    /// Nothing done yet
    #[default]
    Idle,
    /// Apploader header read
    HeaderRead,
    /// Apploader code loaded and made executable
    LoaderCodeLoaded,
    /// Apploader entered and initialised
    LifecycleStarted,
    /// Payload chunks are being streamed
    Streaming,
    /// Entry point obtained
    Finalized,
    /// Boot aborted
    Failed,
}

/// Counters collected during one boot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BootReport {
    /// Chunks delivered by the apploader
    pub chunks: u32,
    /// Total bytes streamed
    pub bytes: u64,
    /// Patch instructions applied, each counted in the chunk holding its target
    pub patches_applied: u32,
    /// Signature scanner replacements
    pub signatures_replaced: u32,
    /// URLs downgraded by the protocol fix
    pub urls_downgraded: u32,
    /// Whether the hook got installed
    pub hook_installed: bool,
    /// Chunk reads that reported failure
    pub stream_read_failures: u32,
}
