//! Copying a subgraph out of a live store.

use codex_foundation::{EntityId, Result};
use codex_storage::EntityStore;
use tracing::info_span;

use crate::config::TransferConfig;
use crate::passes::{Direction, transfer};
use crate::report::TransferReport;

/// Copies everything reachable from `roots` in `source` into `target`.
///
/// Every collected entity is created afresh in `target` with `origin` set to
/// its source identifier, then its relationship fields and inline tokens are
/// rewritten to the new identifiers. Writes are independent; a refused write
/// is recorded in the report and the rest continue. When
/// [`TransferConfig::record_manifest`] is set, the batch is recorded in
/// `target` under that label.
///
/// # Errors
///
/// Returns an error only if the transfer cannot start. Per-entity failures
/// are reported in [`TransferReport::failures`].
pub fn export_subgraph<S, T>(
    source: &S,
    roots: &[EntityId],
    target: &mut T,
    config: &TransferConfig,
) -> Result<TransferReport>
where
    S: EntityStore + ?Sized,
    T: EntityStore + ?Sized,
{
    let _span = info_span!("export_subgraph", roots = roots.len()).entered();
    transfer(source, roots, target, config, Direction::Export)
}
