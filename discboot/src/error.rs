//! Error types for disc boot operations

use core::fmt;

/// Result type for disc boot operations
pub type Result<T> = core::result::Result<T, BootError>;

/// Errors that abort a boot
///
/// Medium reads before streaming, an unmapped guest window at any stage and,
/// under the strict stream policy, chunk reads are hard errors. Patches,
/// signature scans and hook attempts never fail a boot; they are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootError {
    /// I/O error reading from the medium
    MediumRead,

    /// No data partition in the partition table
    PartitionNotFound,

    /// Apploader header describes code that cannot be loaded
    InvalidHeader,

    /// Guest memory has no mapping for a requested window
    UnmappedWindow,

    /// Disc header carries neither the Wii nor the GameCube magic
    UnknownDisc,

    /// Loader runtime could not enter the apploader
    LoaderEntryFailed,

    /// Partition reads return raw encrypted data
    EncryptedPartition,
}

impl fmt::Display for BootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MediumRead => write!(f, "I/O error reading medium"),
            Self::PartitionNotFound => write!(f, "No data partition found"),
            Self::InvalidHeader => write!(f, "Invalid apploader header"),
            Self::UnmappedWindow => write!(f, "Window not mapped in guest memory"),
            Self::UnknownDisc => write!(f, "Unknown disc type"),
            Self::LoaderEntryFailed => write!(f, "Apploader entry failed"),
            Self::EncryptedPartition => {
                write!(f, "Partition is encrypted, medium must serve decrypted data")
            }
        }
    }
}
