//! Bringing an archived subgraph back into a live store.

use codex_foundation::{EntityId, Error, ErrorKind, Result};
use codex_storage::EntityStore;
use tracing::info_span;

use crate::config::TransferConfig;
use crate::passes::{Direction, transfer};
use crate::report::TransferReport;

/// Copies everything reachable from `roots` in `archive` into `live`.
///
/// Each archived entity is matched against `live` by correlation key and
/// handled according to [`TransferConfig::merge`]. Copies that are created
/// carry the correlation key as their `origin`, so importing the same batch
/// again under [`MergePolicy::Skip`](crate::MergePolicy::Skip) finds them and
/// creates nothing.
///
/// # Errors
///
/// Returns an error only if the transfer cannot start. Per-entity failures
/// are reported in [`TransferReport::failures`].
pub fn import_subgraph<A, L>(
    archive: &A,
    roots: &[EntityId],
    live: &mut L,
    config: &TransferConfig,
) -> Result<TransferReport>
where
    A: EntityStore + ?Sized,
    L: EntityStore + ?Sized,
{
    let _span =
        info_span!("import_subgraph", roots = roots.len(), merge = ?config.merge).entered();
    transfer(archive, roots, live, config, Direction::Import)
}

/// Imports the batch recorded in `archive` under `label`.
///
/// # Errors
///
/// Returns [`ErrorKind::ManifestNotFound`] if no manifest has that label.
pub fn import_manifest<A, L>(
    archive: &A,
    label: &str,
    live: &mut L,
    config: &TransferConfig,
) -> Result<TransferReport>
where
    A: EntityStore + ?Sized,
    L: EntityStore + ?Sized,
{
    let manifest = archive
        .manifest(label)
        .ok_or_else(|| Error::new(ErrorKind::ManifestNotFound(label.to_string())))?;
    import_subgraph(archive, &manifest.roots, live, config)
}
