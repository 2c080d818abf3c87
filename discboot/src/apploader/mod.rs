//! Apploader streaming
//!
//! The apploader is vendor code stored on the disc. We load it, ask it for
//! its three lifecycle routines, then call `main` until it stops handing out
//! chunks. Every chunk is read from the disc into the window the apploader
//! names and patched before the apploader sees it again. `final` returns the
//! game's entry point.
//!
//! Stages: `Idle -> HeaderRead -> LoaderCodeLoaded -> LifecycleStarted ->
//! Streaming -> Finalized`, or `Failed` from any stage.
//!
//! Header and loader code failures always abort the boot. Inside the chunk
//! loop a destination the guest memory cannot map aborts too, as does a
//! failed chunk read under [`StreamReadPolicy::Strict`]. Patches, scans and
//! the hook are best effort.

pub mod header;

pub use header::ApploaderHeader;

use crate::config::{BootConfig, StreamReadPolicy};
use crate::error::{BootError, Result};
use crate::hook::{self, HookInjector, HookState};
use crate::medium::Medium;
use crate::patch::{self, https, signature, PatchSet};
use crate::types::{
    BootReport, BootStage, APPLOADER_CODE_OFFSET, APPLOADER_HEADER_OFFSET, APPLOADER_HEADER_SIZE,
    LOADER_REGION_ADDRESS,
};
use alloc::boxed::Box;
use core::fmt;

/// Report callback handed to the apploader's `init`
pub type Report = fn(fmt::Arguments<'_>);

/// One payload chunk the apploader wants loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRequest {
    /// Guest address to load to
    pub destination: u32,
    /// Length in bytes
    pub length: u32,
    /// Payload byte offset to read from
    pub offset: u64,
}

/// The apploader's lifecycle routines
pub trait Apploader {
    /// `init(report)`
    fn init(&mut self, report: Report);

    /// `main()`: next chunk, or `None` when loading is complete
    fn main(&mut self) -> Option<ChunkRequest>;

    /// `final()`: the game's entry point
    fn finalize(&mut self) -> u32;
}

/// Turns loaded apploader code into callable routines
pub trait LoaderRuntime {
    /// Routines obtained from the apploader entry
    type Loader: Apploader;

    /// Call the apploader entry at `entry`
    fn enter(&mut self, entry: u32) -> Result<Self::Loader>;
}

/// Guest memory the payload is streamed into
pub trait GuestMemory {
    /// Mutable view of `len` bytes at guest `address`
    fn window(&mut self, address: u32, len: usize) -> Option<&mut [u8]>;

    /// Make `[address, address + len)` coherent for instruction fetch
    fn sync_for_execution(&mut self, address: u32, len: usize);
}

/// Chunks yielded by repeatedly calling `main`
///
/// Fused: once `main` signals completion it is not called again.
pub struct ChunkStream<'a, A: Apploader> {
    loader: &'a mut A,
    done: bool,
}

impl<'a, A: Apploader> ChunkStream<'a, A> {
    /// Stream chunks from an initialised apploader
    pub fn new(loader: &'a mut A) -> Self {
        Self {
            loader,
            done: false,
        }
    }
}

impl<A: Apploader> Iterator for ChunkStream<'_, A> {
    type Item = ChunkRequest;

    fn next(&mut self) -> Option<ChunkRequest> {
        if self.done {
            return None;
        }
        let chunk = self.loader.main();
        if chunk.is_none() {
            self.done = true;
        }
        chunk
    }
}

/// State carried through a boot
///
/// A session can be reused: [`run`] clears the stage, counters, hook gate and
/// header before it starts. Config, patch set and injector carry over.
pub struct BootSession<'a> {
    /// Settings for this boot
    pub config: BootConfig,
    patch_set: Option<PatchSet<'a>>,
    hook: HookState,
    injector: Option<Box<dyn HookInjector + 'a>>,
    stage: BootStage,
    report: BootReport,
    header: Option<ApploaderHeader>,
}

impl<'a> BootSession<'a> {
    /// New session, nothing selected yet
    pub fn new(config: BootConfig) -> Self {
        Self {
            config,
            patch_set: None,
            hook: HookState::new(),
            injector: None,
            stage: BootStage::Idle,
            report: BootReport::default(),
            header: None,
        }
    }

    /// Use `set` for this boot
    pub fn with_patch_set(mut self, set: PatchSet<'a>) -> Self {
        self.patch_set = Some(set);
        self
    }

    /// Use `injector` when hooks are enabled
    pub fn with_injector(mut self, injector: Box<dyn HookInjector + 'a>) -> Self {
        self.injector = Some(injector);
        self
    }

    /// Select the patch set, unless one is already active
    ///
    /// The set cannot change once streaming has started.
    pub fn select_patch_set(&mut self, set: Option<PatchSet<'a>>) {
        if self.patch_set.is_some() || self.stage != BootStage::Idle {
            return;
        }
        self.patch_set = set;
    }

    /// Active patch set
    pub fn patch_set(&self) -> Option<&PatchSet<'a>> {
        self.patch_set.as_ref()
    }

    /// Current stage
    pub fn stage(&self) -> BootStage {
        self.stage
    }

    /// Counters so far
    pub fn report(&self) -> &BootReport {
        &self.report
    }

    /// Hook gate
    pub fn hook_state(&self) -> &HookState {
        &self.hook
    }

    /// Apploader header, once read
    pub fn header(&self) -> Option<&ApploaderHeader> {
        self.header.as_ref()
    }

    /// Forget the progress of a previous boot
    pub fn reset(&mut self) {
        self.stage = BootStage::Idle;
        self.report = BootReport::default();
        self.hook = HookState::new();
        self.header = None;
    }

    fn enter(&mut self, stage: BootStage) {
        log::debug!("apploader: {:?} -> {:?}", self.stage, stage);
        self.stage = stage;
    }

    /// Patch engine and hook for a freshly read window
    pub fn patch_chunk(&mut self, window: &mut [u8], chunk: &ChunkRequest) {
        if let Some(set) = self.patch_set.as_ref() {
            let applied = patch::apply(set, window, chunk.offset, self.config.patch_policy);
            self.report.patches_applied += applied as u32;
        }

        if self.config.hooks && !self.hook.installed() {
            if let Some(injector) = self.injector.as_deref_mut() {
                if hook::inject_once(&mut self.hook, injector, window, chunk.destination) {
                    self.report.hook_installed = true;
                }
            }
        }
    }

    /// Signature scanner and protocol fix, after the window was synced
    ///
    /// # Returns
    /// `true` if the window changed
    pub fn fix_chunk(&mut self, window: &mut [u8]) -> bool {
        let mut changed = false;

        if self.config.protection_fix && signature::remove_001_protection(window) {
            self.report.signatures_replaced += 1;
            changed = true;
        }

        if self.config.https_fix {
            let urls = https::downgrade_urls(window);
            if urls > 0 {
                self.report.urls_downgraded += urls as u32;
                changed = true;
            }
        }

        changed
    }
}

fn report(args: fmt::Arguments<'_>) {
    log::info!(target: "apploader", "{}", args);
}

/// Run the apploader from `medium` and return the game's entry point
///
/// `medium` must already be positioned on the boot partition: offsets are
/// partition relative.
pub fn run<M, R, G>(
    medium: &mut M,
    runtime: &mut R,
    memory: &mut G,
    session: &mut BootSession<'_>,
) -> Result<u32>
where
    M: Medium,
    R: LoaderRuntime,
    G: GuestMemory,
{
    session.reset();
    match run_stages(medium, runtime, memory, session) {
        Ok(entry) => Ok(entry),
        Err(err) => {
            log::error!("apploader failed in {:?}: {}", session.stage, err);
            session.enter(BootStage::Failed);
            Err(err)
        }
    }
}

fn run_stages<M, R, G>(
    medium: &mut M,
    runtime: &mut R,
    memory: &mut G,
    session: &mut BootSession<'_>,
) -> Result<u32>
where
    M: Medium,
    R: LoaderRuntime,
    G: GuestMemory,
{
    // Header
    let mut raw = [0u8; APPLOADER_HEADER_SIZE];
    medium
        .read(&mut raw, APPLOADER_HEADER_OFFSET)
        .map_err(|_| BootError::MediumRead)?;
    let header = ApploaderHeader::parse(&raw)?;
    log::info!("{}", header);
    session.header = Some(header);
    session.enter(BootStage::HeaderRead);

    // Loader code
    let code_len = header.code_len() as usize;
    let region = memory
        .window(LOADER_REGION_ADDRESS, code_len)
        .ok_or(BootError::UnmappedWindow)?;
    medium
        .read(region, APPLOADER_CODE_OFFSET)
        .map_err(|_| BootError::MediumRead)?;
    memory.sync_for_execution(LOADER_REGION_ADDRESS, code_len);
    session.enter(BootStage::LoaderCodeLoaded);

    // Lifecycle
    let mut loader = runtime.enter(header.entry)?;
    loader.init(report);
    session.enter(BootStage::LifecycleStarted);

    // Streaming
    session.enter(BootStage::Streaming);
    for chunk in ChunkStream::new(&mut loader) {
        stream_chunk(medium, memory, session, &chunk)?;
    }

    if session.config.hooks && session.hook.installed() {
        if let Some(injector) = session.injector.as_deref_mut() {
            injector.finish(memory);
        }
    }

    // Final
    let entry = loader.finalize();
    session.enter(BootStage::Finalized);
    log::info!(
        "entry point {:#010x} after {} chunks ({} patches)",
        entry,
        session.report.chunks,
        session.report.patches_applied
    );
    Ok(entry)
}

fn stream_chunk<M, G>(
    medium: &mut M,
    memory: &mut G,
    session: &mut BootSession<'_>,
    chunk: &ChunkRequest,
) -> Result<()>
where
    M: Medium,
    G: GuestMemory,
{
    let len = chunk.length as usize;

    #[cfg(feature = "trace")]
    log::trace!(
        "chunk {:#x}+{:#x} -> {:#010x}",
        chunk.offset,
        chunk.length,
        chunk.destination
    );

    let window = memory
        .window(chunk.destination, len)
        .ok_or(BootError::UnmappedWindow)?;

    if medium.read(window, chunk.offset).is_err() {
        session.report.stream_read_failures += 1;
        match session.config.stream_reads {
            StreamReadPolicy::Strict => return Err(BootError::MediumRead),
            StreamReadPolicy::Unchecked => {
                log::warn!("chunk read at {:#x} failed, continuing", chunk.offset)
            }
        }
    }

    session.patch_chunk(window, chunk);
    memory.sync_for_execution(chunk.destination, len);

    let window = memory
        .window(chunk.destination, len)
        .ok_or(BootError::UnmappedWindow)?;
    if session.fix_chunk(window) {
        memory.sync_for_execution(chunk.destination, len);
    }

    session.report.chunks += 1;
    session.report.bytes += len as u64;
    Ok(())
}
