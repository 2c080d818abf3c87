//! Medium read layer
//!
//! Everything above this module reads the disc through [`Medium`]: blocking,
//! byte-addressed reads at absolute offsets. Retry policy, decryption and the
//! drive interface itself belong to the implementor.
//!
//! Wii partitions are encrypted on disc. Once the boot path has resolved a
//! partition at `base`, a read at `base + offset` must return byte `offset` of
//! the partition's decrypted data, the way the drive interface serves a
//! partition after opening it. [`BlockMedium`] over a raw image does not
//! decrypt; it is only bootable for GameCube discs and for images whose
//! partitions are already stored decrypted.

pub mod block;
pub mod view;

pub use block::BlockMedium;
pub use view::PartitionView;

use core::fmt;

/// Byte-addressed, read-only disc access
pub trait Medium {
    /// Error reported by a failed read
    type Error: fmt::Debug;

    /// Fill `buffer` from byte `offset`
    ///
    /// # Returns
    /// Number of bytes read
    fn read(&mut self, buffer: &mut [u8], offset: u64) -> Result<usize, Self::Error>;

    /// Position the drive at `offset`
    ///
    /// Drives that have no use for the hint can keep the default.
    fn seek(&mut self, _offset: u64) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<M: Medium + ?Sized> Medium for &mut M {
    type Error = M::Error;

    fn read(&mut self, buffer: &mut [u8], offset: u64) -> Result<usize, Self::Error> {
        (**self).read(buffer, offset)
    }

    fn seek(&mut self, offset: u64) -> Result<(), Self::Error> {
        (**self).seek(offset)
    }
}
