//! Byte reads over a block device
//!
//! Presents any `gpt_disk_io::BlockIo` as a [`Medium`]. Block-aligned runs go
//! straight into the caller's buffer; partial blocks at either end go through
//! a one-block bounce buffer.

use super::Medium;
use alloc::vec;
use alloc::vec::Vec;
use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;

/// [`Medium`] adapter for a block device
pub struct BlockMedium<B: BlockIo> {
    block_io: B,
    block_size: u64,
    bounce: Vec<u8>,
}

impl<B: BlockIo> BlockMedium<B> {
    /// Wrap a block device
    pub fn new(block_io: B) -> Self {
        let block_size = u64::from(block_io.block_size().to_u32());
        Self {
            block_io,
            block_size,
            bounce: vec![0u8; block_size as usize],
        }
    }

    /// Block size in bytes
    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    /// Get the underlying device back
    pub fn into_inner(self) -> B {
        self.block_io
    }
}

impl<B: BlockIo> Medium for BlockMedium<B> {
    type Error = B::Error;

    fn read(&mut self, buffer: &mut [u8], offset: u64) -> Result<usize, Self::Error> {
        let block_size = self.block_size;
        let mut done = 0usize;

        while done < buffer.len() {
            let position = offset + done as u64;
            let lba = position / block_size;
            let within = (position % block_size) as usize;
            let remaining = buffer.len() - done;

            if within == 0 && remaining as u64 >= block_size {
                // Whole blocks: read in place
                let whole = (remaining as u64 / block_size * block_size) as usize;
                self.block_io
                    .read_blocks(Lba(lba), &mut buffer[done..done + whole])?;
                done += whole;
            } else {
                self.block_io.read_blocks(Lba(lba), &mut self.bounce)?;
                let len = core::cmp::min(block_size as usize - within, remaining);
                buffer[done..done + len].copy_from_slice(&self.bounce[within..within + len]);
                done += len;
            }
        }

        Ok(done)
    }
}
