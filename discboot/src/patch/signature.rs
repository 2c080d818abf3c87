//! Signature scan-and-replace
//!
//! Candidates are word aligned, relative to the window start. A match that
//! straddles two chunks is never seen.

/// Instruction alignment of candidate positions
const SCAN_STRIDE: usize = 4;

/// Error 001 anti-piracy check: `bne +0xC` around the failure path
pub const PROTECTION_001_PATTERN: [u8; 16] = [
    0x40, 0x82, 0x00, 0x0C, 0x38, 0x60, 0x00, 0x01, 0x48, 0x00, 0x02, 0x44, 0x38, 0x61, 0x00, 0x18,
];

/// Same sequence with the branch shortened to `bne +0x4`
pub const PROTECTION_001_PATCH: [u8; 16] = [
    0x40, 0x82, 0x00, 0x04, 0x38, 0x60, 0x00, 0x01, 0x48, 0x00, 0x02, 0x44, 0x38, 0x61, 0x00, 0x18,
];

/// Offset of the first aligned occurrence of `pattern` in `window`
pub fn find_aligned(window: &[u8], pattern: &[u8]) -> Option<usize> {
    if pattern.is_empty() || pattern.len() > window.len() {
        return None;
    }
    let last = window.len() - pattern.len();
    (0..=last)
        .step_by(SCAN_STRIDE)
        .find(|&at| &window[at..at + pattern.len()] == pattern)
}

/// Replace the first aligned occurrence of `pattern` with `replacement`
///
/// # Returns
/// `true` if a replacement was made; the window is untouched otherwise
pub fn scan_and_replace(window: &mut [u8], pattern: &[u8], replacement: &[u8]) -> bool {
    if pattern.len() != replacement.len() {
        return false;
    }
    match find_aligned(window, pattern) {
        Some(at) => {
            window[at..at + replacement.len()].copy_from_slice(replacement);
            log::debug!("signature replaced at window offset {:#x}", at);
            true
        }
        None => false,
    }
}

/// Neutralise the error 001 check if it is in this window
pub fn remove_001_protection(window: &mut [u8]) -> bool {
    scan_and_replace(window, &PROTECTION_001_PATTERN, &PROTECTION_001_PATCH)
}
