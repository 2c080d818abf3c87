//! Disc image file as a `gpt_disk_io::BlockIo`

use gpt_disk_io::BlockIo;
use gpt_disk_types::{BlockSize, Lba};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Optical disc sector size
pub const SECTOR_SIZE: u32 = 2048;

/// Read-only image file
///
/// Images are not always a whole number of sectors long; the tail of the
/// last block reads as zeroes.
pub struct ImageFile {
    file: File,
    len: u64,
}

impl ImageFile {
    /// Open an image for reading
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self { file, len })
    }

    /// Image length in bytes
    pub fn len(&self) -> u64 {
        self.len
    }
}

impl BlockIo for ImageFile {
    type Error = io::Error;

    fn block_size(&self) -> BlockSize {
        BlockSize::new(SECTOR_SIZE).unwrap_or(BlockSize::BS_512)
    }

    fn num_blocks(&mut self) -> Result<u64, Self::Error> {
        Ok(self.len.div_ceil(u64::from(SECTOR_SIZE)))
    }

    fn read_blocks(&mut self, start_lba: Lba, dst: &mut [u8]) -> Result<(), Self::Error> {
        let offset = start_lba.0 * u64::from(SECTOR_SIZE);
        if offset >= self.len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "read beyond end of image",
            ));
        }

        let available = core::cmp::min((self.len - offset) as usize, dst.len());
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(&mut dst[..available])?;
        dst[available..].fill(0);
        Ok(())
    }

    fn write_blocks(&mut self, _start_lba: Lba, _src: &[u8]) -> Result<(), Self::Error> {
        Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "disc images are opened read-only",
        ))
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
