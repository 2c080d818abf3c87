//! Boot configuration
//!
//! Defaults reproduce the stock loader behaviour: blind patch writes,
//! unchecked chunk reads, both stock fixes enabled, hooks off.

/// How patch instructions are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatchPolicy {
    /// Overwrite the target word without looking at it
    #[default]
    Blind,
    /// Only write when the whole word is in the window and equals `expected`
    Verified,
}

/// What to do when a streamed chunk fails to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamReadPolicy {
    /// Log and keep going with whatever the window holds
    #[default]
    Unchecked,
    /// Abort the boot with `MediumRead`
    Strict,
}

/// Per-boot settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootConfig {
    /// Install the hook on the first chunk that takes it
    pub hooks: bool,
    /// Patch write policy
    pub patch_policy: PatchPolicy,
    /// Chunk read failure policy
    pub stream_reads: StreamReadPolicy,
    /// Neutralise the 001 anti-piracy check
    pub protection_fix: bool,
    /// Rewrite `https://` URLs to `http://`
    pub https_fix: bool,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            hooks: false,
            patch_policy: PatchPolicy::Blind,
            stream_reads: StreamReadPolicy::Unchecked,
            protection_fix: true,
            https_fix: true,
        }
    }
}

impl BootConfig {
    /// Enable or disable hook injection
    pub fn with_hooks(mut self, hooks: bool) -> Self {
        self.hooks = hooks;
        self
    }

    /// Set the patch write policy
    pub fn with_patch_policy(mut self, policy: PatchPolicy) -> Self {
        self.patch_policy = policy;
        self
    }

    /// Set the chunk read failure policy
    pub fn with_stream_reads(mut self, policy: StreamReadPolicy) -> Self {
        self.stream_reads = policy;
        self
    }
}
