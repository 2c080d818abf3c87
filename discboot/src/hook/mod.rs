//! One-shot hook injection
//!
//! A hook redirects a routine the game calls every frame into a code handler
//! placed in low memory. It must be installed exactly once per boot: the
//! boot session owns a [`HookState`] and every attempt goes through
//! [`inject_once`].

pub mod branch;

pub use branch::BranchHook;

use crate::apploader::GuestMemory;

/// Whether the hook has been installed during this boot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HookState {
    installed: bool,
}

impl HookState {
    /// Fresh state for a new boot
    pub const fn new() -> Self {
        Self { installed: false }
    }

    /// Has the hook been installed?
    pub fn installed(&self) -> bool {
        self.installed
    }
}

/// Installs hook code into streamed payload windows
pub trait HookInjector {
    /// Try to install the hook into `window`, loaded at guest `address`
    ///
    /// # Returns
    /// `true` once the hook is in place
    fn inject(&mut self, window: &mut [u8], address: u32) -> bool;

    /// Runs once after streaming if `inject` succeeded
    fn finish(&mut self, _memory: &mut dyn GuestMemory) {}
}

/// Attempt injection unless the hook is already installed
///
/// `state` flips to installed on the first successful attempt and never
/// flips back; later calls do not reach the injector.
///
/// # Returns
/// `true` if this call installed the hook
pub fn inject_once(
    state: &mut HookState,
    injector: &mut dyn HookInjector,
    window: &mut [u8],
    address: u32,
) -> bool {
    if state.installed {
        return false;
    }
    if injector.inject(window, address) {
        state.installed = true;
        log::info!("hook installed in chunk at {:#010x}", address);
        true
    } else {
        false
    }
}
