//! Disc boot sequence
//!
//! Glue between the disc layer and the apploader: pick the patch set from the
//! title id, open the data partition on Wii discs, stream the game.

use crate::apploader::{self, BootSession, GuestMemory, LoaderRuntime};
use crate::disc::{self, partition};
use crate::error::{BootError, Result};
use crate::medium::{Medium, PartitionView};
use crate::patch::registry;
use crate::types::DiscKind;

/// Boot the disc in `medium`
///
/// A patch set already on the session is kept, including one selected by an
/// earlier boot on the same session; otherwise one is selected from the
/// built-in registry by title id.
///
/// # Returns
/// The game's entry point
pub fn boot<M, R, G>(
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
    let header = disc::read_header(medium)?;
    let kind = header.kind().ok_or(BootError::UnknownDisc)?;
    log::info!("disc {} ({:?})", header.title_id, kind);

    session.reset();
    session.select_patch_set(registry::select(&header.title_id));

    match kind {
        DiscKind::Wii => {
            let base = partition::resolve(medium)?;
            if partition::is_raw_partition(medium, base)? {
                return Err(BootError::EncryptedPartition);
            }
            let mut view = PartitionView::new(&mut *medium, base);
            apploader::run(&mut view, runtime, memory, session)
        }
        DiscKind::GameCube => apploader::run(medium, runtime, memory, session),
    }
}

/// [`boot`] collapsed to the entry point contract: `0` means no entry point
pub fn boot_entry_point<M, R, G>(
    medium: &mut M,
    runtime: &mut R,
    memory: &mut G,
    session: &mut BootSession<'_>,
) -> u32
where
    M: Medium,
    R: LoaderRuntime,
    G: GuestMemory,
{
    match boot(medium, runtime, memory, session) {
        Ok(entry) => entry,
        Err(err) => {
            log::error!("boot failed: {}", err);
            0
        }
    }
}
