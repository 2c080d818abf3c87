//! Payload patching
//!
//! Patch instructions address the payload by absolute offset, but the
//! apploader hands the payload over in arbitrary chunks. [`apply`] maps each
//! instruction onto whichever chunk is currently in hand and writes the bytes
//! that fall inside it. Nothing tracks whether a target is ever reached.

pub mod https;
pub mod registry;
pub mod signature;

use crate::config::PatchPolicy;
use crate::types::read_be_u32;

/// Width of a patched word
const WORD: u64 = 4;

/// One word replacement at an absolute payload offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchInstruction {
    /// Payload offset of the first byte
    pub target: u64,
    /// Word expected at the target before patching
    pub expected: u32,
    /// Word written at the target
    pub replacement: u32,
}

impl PatchInstruction {
    /// Create an instruction
    pub const fn new(target: u64, expected: u32, replacement: u32) -> Self {
        Self {
            target,
            expected,
            replacement,
        }
    }

    /// Does any byte of the target word fall in `[base, base + len)`?
    pub fn touches(&self, base: u64, len: usize) -> bool {
        self.target < base + len as u64 && self.target + WORD > base
    }

    /// Is the first byte of the target in `[base, base + len)`?
    pub fn starts_in(&self, base: u64, len: usize) -> bool {
        self.target >= base && self.target < base + len as u64
    }

    /// Is the whole target word in `[base, base + len)`?
    pub fn contained_in(&self, base: u64, len: usize) -> bool {
        self.target >= base && self.target + WORD <= base + len as u64
    }
}

/// Named, ordered list of patch instructions for one title
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchSet<'a> {
    /// Human-readable name for logs
    pub name: &'a str,
    /// Instructions, applied in order
    pub instructions: &'a [PatchInstruction],
}

impl<'a> PatchSet<'a> {
    /// Create a patch set
    pub const fn new(name: &'a str, instructions: &'a [PatchInstruction]) -> Self {
        Self { name, instructions }
    }

    /// Number of instructions
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Is the set empty?
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// Apply `set` to a window holding payload bytes `[base, base + window.len())`
///
/// With [`PatchPolicy::Blind`] each byte of the big-endian replacement is
/// written if its own offset is inside the window, so a word split across two
/// chunks is completed by the second one. [`PatchPolicy::Verified`] writes
/// only whole words that currently read as `expected`.
///
/// # Returns
/// Number of instructions whose target offset lies in this window, so a word
/// split across two chunks is counted once
pub fn apply(set: &PatchSet<'_>, window: &mut [u8], base: u64, policy: PatchPolicy) -> usize {
    let len = window.len();
    let mut applied = 0;

    for instruction in set.instructions {
        let written = match policy {
            PatchPolicy::Blind => write_blind(instruction, window, base),
            PatchPolicy::Verified => write_verified(instruction, window, base),
        };
        if written {
            applied += 1;
            log::debug!(
                "{}: patched {:#x} -> {:08x}",
                set.name,
                instruction.target,
                instruction.replacement
            );
        } else if policy == PatchPolicy::Verified && instruction.touches(base, len) {
            log::warn!(
                "{}: skipped {:#x}, word not verifiable in this chunk",
                set.name,
                instruction.target
            );
        }
    }

    applied
}

/// Returns `true` if the target's first byte is in the window
fn write_blind(instruction: &PatchInstruction, window: &mut [u8], base: u64) -> bool {
    if !instruction.touches(base, window.len()) {
        return false;
    }

    let bytes = instruction.replacement.to_be_bytes();
    for (n, &byte) in bytes.iter().enumerate() {
        let absolute = instruction.target + n as u64;
        if absolute < base {
            continue;
        }
        let at = (absolute - base) as usize;
        if at < window.len() {
            window[at] = byte;
        }
    }
    instruction.starts_in(base, window.len())
}

fn write_verified(instruction: &PatchInstruction, window: &mut [u8], base: u64) -> bool {
    if !instruction.contained_in(base, window.len()) {
        return false;
    }

    let at = (instruction.target - base) as usize;
    if read_be_u32(window, at) != instruction.expected {
        return false;
    }
    window[at..at + WORD as usize].copy_from_slice(&instruction.replacement.to_be_bytes());
    true
}
