//! Partition-relative reads

use super::Medium;

/// A [`Medium`] whose offsets start at a partition base
///
/// Adds `base` and nothing else: the wrapped medium must already serve
/// decrypted partition data there.
pub struct PartitionView<M: Medium> {
    medium: M,
    base: u64,
}

impl<M: Medium> PartitionView<M> {
    /// Open a view at byte offset `base`
    pub fn new(medium: M, base: u64) -> Self {
        Self { medium, base }
    }

    /// Absolute byte offset of the partition
    pub fn base(&self) -> u64 {
        self.base
    }

    /// Close the view
    pub fn into_inner(self) -> M {
        self.medium
    }
}

impl<M: Medium> Medium for PartitionView<M> {
    type Error = M::Error;

    fn read(&mut self, buffer: &mut [u8], offset: u64) -> Result<usize, Self::Error> {
        self.medium.read(buffer, self.base + offset)
    }

    fn seek(&mut self, offset: u64) -> Result<(), Self::Error> {
        self.medium.seek(self.base + offset)
    }
}
