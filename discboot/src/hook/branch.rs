//! Branch hook: turn a routine's `blr` into a jump to the code handler

use super::HookInjector;
use crate::apploader::GuestMemory;
use crate::types::read_be_u32;
use alloc::vec::Vec;

/// `blr`
const BLR: u32 = 0x4E80_0020;

/// Unconditional relative branch opcode
const B_OPCODE: u32 = 0x4800_0000;

/// 24-bit word-aligned displacement field of `b`
const B_DISPLACEMENT_MASK: u32 = 0x03FF_FFFC;

/// Default code handler entry in low memory
pub const DEFAULT_HANDLER: u32 = 0x8000_18A8;

/// Video interface retrace sequence, called once per frame by every title
pub const VI_RETRACE_SIGNATURE: &[u32] = &[0x7CE3_3B78, 0x3887_0034, 0x38A7_0038, 0x38C7_004C];

/// Encode `b target` placed at `from`
pub fn encode_branch(from: u32, target: u32) -> u32 {
    B_OPCODE | (target.wrapping_sub(from) & B_DISPLACEMENT_MASK)
}

/// Hook that patches the first `blr` after a signature into `b handler`
pub struct BranchHook {
    signature: &'static [u32],
    handler: u32,
    payload_address: u32,
    payload: Vec<u8>,
}

impl BranchHook {
    /// Hook the VI retrace routine into `handler`
    pub fn new(handler: u32) -> Self {
        Self {
            signature: VI_RETRACE_SIGNATURE,
            handler,
            payload_address: handler,
            payload: Vec::new(),
        }
    }

    /// Use a different routine signature
    pub fn with_signature(mut self, signature: &'static [u32]) -> Self {
        self.signature = signature;
        self
    }

    /// Bytes copied to guest `address` after streaming (the handler itself,
    /// cheat code lists, ...)
    pub fn with_payload(mut self, address: u32, payload: Vec<u8>) -> Self {
        self.payload_address = address;
        self.payload = payload;
        self
    }

    /// Window offset of the first aligned signature match
    fn find_signature(&self, window: &[u8]) -> Option<usize> {
        let sig_len = self.signature.len() * 4;
        if sig_len == 0 || sig_len > window.len() {
            return None;
        }
        (0..=window.len() - sig_len).step_by(4).find(|&at| {
            self.signature
                .iter()
                .enumerate()
                .all(|(i, &word)| read_be_u32(window, at + i * 4) == word)
        })
    }
}

impl Default for BranchHook {
    fn default() -> Self {
        Self::new(DEFAULT_HANDLER)
    }
}

impl HookInjector for BranchHook {
    fn inject(&mut self, window: &mut [u8], address: u32) -> bool {
        let start = match self.find_signature(window) {
            Some(at) => at,
            None => return false,
        };

        let mut at = start;
        while at + 4 <= window.len() {
            if read_be_u32(window, at) == BLR {
                let from = address.wrapping_add(at as u32);
                let branch = encode_branch(from, self.handler);
                window[at..at + 4].copy_from_slice(&branch.to_be_bytes());
                log::debug!("hooked blr at {:#010x} -> {:#010x}", from, self.handler);
                return true;
            }
            at += 4;
        }

        log::warn!("hook signature at {:#x} has no blr in this chunk", start);
        false
    }

    fn finish(&mut self, memory: &mut dyn GuestMemory) {
        if self.payload.is_empty() {
            return;
        }
        let len = self.payload.len();
        match memory.window(self.payload_address, len) {
            Some(dst) => {
                dst.copy_from_slice(&self.payload);
                memory.sync_for_execution(self.payload_address, len);
                log::info!("hook payload ({} bytes) at {:#010x}", len, self.payload_address);
            }
            None => log::warn!("hook payload address {:#010x} not mapped", self.payload_address),
        }
    }
}
