//! Disc Boot Loader
//!
//! A `no_std` implementation of the optical-disc boot path: find the game
//! partition, stream the game through the disc's own apploader, and patch
//! the payload in flight.
//!
//! # Overview
//!
//! Booting a disc means handing control to a small vendor program (the
//! apploader) stored on the disc itself. The apploader tells us, one chunk at
//! a time, which bytes of the disc to copy where. This crate provides:
//! - Disc header parsing (title identifier, Wii / GameCube detection)
//! - Partition table lookup for the data partition
//! - The apploader lifecycle (`init` / `main` / `final`) driven as an iterator
//! - Title-keyed word patches applied to each chunk as it arrives
//! - Signature scan-and-replace and the `https://` protocol fix
//! - One-shot hook injection
//!
//! # Architecture
//!
//! The implementation is layered:
//! 1. **Medium layer** - Byte reads over a `gpt_disk_io::BlockIo` device
//! 2. **Disc layer** - Header and partition table parsing
//! 3. **Patch layer** - Patch sets, signature scanner, protocol fix
//! 4. **Hook layer** - At-most-once hook installation
//! 5. **Apploader layer** - The streaming state machine
//!
//! # Usage
//!
//! ```ignore
//! use discboot::{boot, BootSession, BootConfig};
//!
//! let mut session = BootSession::new(BootConfig::default());
//! let entry = boot::boot_entry_point(&mut medium, &mut runtime, &mut memory, &mut session);
//! if entry == 0 {
//!     // fall back to the system menu
//! }
//! ```

#![no_std]
#![warn(missing_docs)]

extern crate alloc;

pub mod apploader;
pub mod boot;
pub mod config;
pub mod disc;
pub mod error;
pub mod hook;
pub mod logger;
pub mod medium;
pub mod patch;
pub mod types;

pub use apploader::{BootSession, ChunkRequest};
pub use config::{BootConfig, PatchPolicy, StreamReadPolicy};
pub use error::{BootError, Result};
pub use types::{BootReport, BootStage, TitleId};

// High-level API exports
pub use boot::{boot, boot_entry_point};
pub use disc::partition::resolve;
pub use hook::inject_once;
pub use patch::apply;
pub use patch::signature::scan_and_replace;
