//! Common test utilities: in-memory disc, guest memory and a scripted apploader

#![allow(dead_code)]

pub mod builder;
pub use builder::DiscBuilder;

use discboot::apploader::{Apploader, ChunkRequest, GuestMemory, LoaderRuntime, Report};
use discboot::medium::Medium;
use discboot::BootError;
use gpt_disk_io::BlockIo;
use gpt_disk_types::{BlockSize, Lba};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

/// Disc sector size used by the test images
pub const SECTOR: usize = 2048;

/// In-memory block device for testing
#[derive(Debug, Clone)]
pub struct MemoryBlockDevice {
    pub data: Vec<u8>,
    pub block_size: usize,
}

impl MemoryBlockDevice {
    /// Create a new memory block device from raw data
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            block_size: SECTOR,
        }
    }
}

impl BlockIo for MemoryBlockDevice {
    type Error = io::Error;

    fn block_size(&self) -> BlockSize {
        BlockSize::new(self.block_size as u32).expect("valid block size")
    }

    fn num_blocks(&mut self) -> Result<u64, Self::Error> {
        Ok((self.data.len() / self.block_size) as u64)
    }

    fn read_blocks(&mut self, start_lba: Lba, dst: &mut [u8]) -> Result<(), Self::Error> {
        let offset = start_lba.0 as usize * self.block_size;
        if offset + dst.len() > self.data.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "read beyond end of device",
            ));
        }
        dst.copy_from_slice(&self.data[offset..offset + dst.len()]);
        Ok(())
    }

    fn write_blocks(&mut self, start_lba: Lba, src: &[u8]) -> Result<(), Self::Error> {
        let offset = start_lba.0 as usize * self.block_size;
        if offset + src.len() > self.data.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "write beyond end of device",
            ));
        }
        self.data[offset..offset + src.len()].copy_from_slice(src);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Error from [`RecordingMedium`]
#[derive(Debug)]
pub enum TestMediumError {
    /// Failure injected by the test
    Injected,
    /// Underlying medium failed
    Inner,
}

/// Medium wrapper that records reads and seeks and can fail on demand
pub struct RecordingMedium<M: Medium> {
    pub inner: M,
    pub reads: Vec<(u64, usize)>,
    pub seeks: Vec<u64>,
    pub fail_at: Vec<u64>,
}

impl<M: Medium> RecordingMedium<M> {
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            reads: Vec::new(),
            seeks: Vec::new(),
            fail_at: Vec::new(),
        }
    }

    /// Fail every read starting at `offset`
    pub fn failing_at(mut self, offset: u64) -> Self {
        self.fail_at.push(offset);
        self
    }
}

impl<M: Medium> Medium for RecordingMedium<M> {
    type Error = TestMediumError;

    fn read(&mut self, buffer: &mut [u8], offset: u64) -> Result<usize, Self::Error> {
        self.reads.push((offset, buffer.len()));
        if self.fail_at.contains(&offset) {
            return Err(TestMediumError::Injected);
        }
        self.inner
            .read(buffer, offset)
            .map_err(|_| TestMediumError::Inner)
    }

    fn seek(&mut self, offset: u64) -> Result<(), Self::Error> {
        self.seeks.push(offset);
        Ok(())
    }
}

/// Sparse guest memory made of independent regions
#[derive(Default)]
pub struct FakeMemory {
    pub regions: Vec<(u32, Vec<u8>)>,
    pub synced: Vec<(u32, usize)>,
}

impl FakeMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `len` zeroed bytes at `base`
    pub fn with_region(mut self, base: u32, len: usize) -> Self {
        self.regions.push((base, vec![0u8; len]));
        self
    }

    /// Copy of `len` bytes at `address`
    pub fn read(&self, address: u32, len: usize) -> Vec<u8> {
        for (base, bytes) in &self.regions {
            if address >= *base && (address - *base) as usize + len <= bytes.len() {
                let start = (address - *base) as usize;
                return bytes[start..start + len].to_vec();
            }
        }
        panic!("address {:#x} not mapped", address);
    }

    /// Big-endian word at `address`
    pub fn word(&self, address: u32) -> u32 {
        let b = self.read(address, 4);
        u32::from_be_bytes([b[0], b[1], b[2], b[3]])
    }
}

impl GuestMemory for FakeMemory {
    fn window(&mut self, address: u32, len: usize) -> Option<&mut [u8]> {
        for (base, bytes) in self.regions.iter_mut() {
            if address >= *base && (address - *base) as usize + len <= bytes.len() {
                let start = (address - *base) as usize;
                return Some(&mut bytes[start..start + len]);
            }
        }
        None
    }

    fn sync_for_execution(&mut self, address: u32, len: usize) {
        self.synced.push((address, len));
    }
}

/// What the scripted apploader saw
#[derive(Debug, Default)]
pub struct LoaderTrace {
    pub entered_at: Option<u32>,
    pub init_calls: u32,
    pub main_calls: u32,
    pub final_calls: u32,
}

/// Apploader that hands out a fixed list of chunks
pub struct ScriptedApploader {
    chunks: VecDeque<ChunkRequest>,
    entry_point: u32,
    trace: Rc<RefCell<LoaderTrace>>,
}

impl Apploader for ScriptedApploader {
    fn init(&mut self, report: Report) {
        self.trace.borrow_mut().init_calls += 1;
        report(format_args!("scripted apploader with {} chunks", self.chunks.len()));
    }

    fn main(&mut self) -> Option<ChunkRequest> {
        self.trace.borrow_mut().main_calls += 1;
        self.chunks.pop_front()
    }

    fn finalize(&mut self) -> u32 {
        self.trace.borrow_mut().final_calls += 1;
        self.entry_point
    }
}

/// Runtime producing a [`ScriptedApploader`]
pub struct ScriptedRuntime {
    pub chunks: Vec<ChunkRequest>,
    pub entry_point: u32,
    pub trace: Rc<RefCell<LoaderTrace>>,
    pub refuse: bool,
}

impl ScriptedRuntime {
    pub fn new(chunks: Vec<ChunkRequest>, entry_point: u32) -> Self {
        Self {
            chunks,
            entry_point,
            trace: Rc::new(RefCell::new(LoaderTrace::default())),
            refuse: false,
        }
    }
}

impl LoaderRuntime for ScriptedRuntime {
    type Loader = ScriptedApploader;

    fn enter(&mut self, entry: u32) -> Result<ScriptedApploader, BootError> {
        if self.refuse {
            return Err(BootError::LoaderEntryFailed);
        }
        self.trace.borrow_mut().entered_at = Some(entry);
        Ok(ScriptedApploader {
            chunks: self.chunks.iter().copied().collect(),
            entry_point: self.entry_point,
            trace: Rc::clone(&self.trace),
        })
    }
}

/// Shorthand for a chunk request
pub fn chunk(destination: u32, length: u32, offset: u64) -> ChunkRequest {
    ChunkRequest {
        destination,
        length,
        offset,
    }
}

/// Deterministic filler bytes for payload regions
pub fn filler(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(7).wrapping_add(seed)).collect()
}
