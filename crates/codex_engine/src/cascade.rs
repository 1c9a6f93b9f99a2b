//! Pre-delete cleanup of inbound references.
//!
//! Inbound references are not indexed. Cleanup scans every entity of every
//! kind that could hold a reference to the target, which costs O(N) per
//! delete but leaves no secondary index to keep consistent.

use std::collections::BTreeSet;

use codex_foundation::{EntityId, EntityKind, Error, Result};
use codex_storage::{EntityStore, RelationField};
use tracing::{debug, info, info_span, warn};

use crate::changes::ChangeSet;
use crate::config::EngineConfig;
use crate::mutation::write_payload;
use crate::report::{KindTally, Tallies, WriteFailure, render_tallies};

/// What a cleanup pass did.
#[derive(Debug)]
pub struct CleanupReport {
    /// The entity whose references were stripped.
    pub target: EntityId,
    /// Its kind.
    pub kind: EntityKind,
    /// Entities written.
    pub changes: ChangeSet,
    /// Outcome counts per scanned kind.
    pub tallies: Tallies,
    /// Writes the store refused.
    pub failures: Vec<WriteFailure>,
}

impl CleanupReport {
    /// Returns the tally for `kind`.
    #[must_use]
    pub fn tally(&self, kind: EntityKind) -> KindTally {
        self.tallies.get(&kind).copied().unwrap_or_default()
    }

    /// Returns true if every write went through.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary with per-kind counts.
    #[must_use]
    pub fn summary(&self) -> String {
        let counts = render_tallies(&self.tallies);
        if counts.is_empty() {
            format!("cleanup of {} {}: nothing referenced it", self.kind, self.target)
        } else {
            format!("cleanup of {} {}:\n{counts}", self.kind, self.target)
        }
    }
}

/// Strips every reference to `target` from the rest of the store.
///
/// Call this immediately before deleting `target`. Each holder is written
/// independently; failures are collected and do not stop the scan.
///
/// # Errors
///
/// Returns `EntityNotFound` if `target` does not exist.
pub fn cascade_delete<S: EntityStore + ?Sized>(
    store: &mut S,
    config: &EngineConfig,
    target: EntityId,
) -> Result<CleanupReport> {
    let kind = store
        .kind_of(target)
        .ok_or_else(|| Error::entity_not_found(target))?;
    Ok(strip_references(store, config, target, kind))
}

/// Strips every reference to `id`, treating it as an entity of `kind`.
///
/// Unlike [`cascade_delete`] this works for identifiers whose entity is
/// already gone, which is how repair clears dangling references.
pub fn strip_references<S: EntityStore + ?Sized>(
    store: &mut S,
    config: &EngineConfig,
    id: EntityId,
    kind: EntityKind,
) -> CleanupReport {
    let _span = info_span!("cascade", target = %id, %kind).entered();
    let fields: Vec<RelationField> = RelationField::referencing(kind).collect();
    let owners: BTreeSet<EntityKind> = fields.iter().map(|f| f.owner()).collect();

    let mut report = CleanupReport {
        target: id,
        kind,
        changes: ChangeSet::new(),
        tallies: Tallies::new(),
        failures: Vec::new(),
    };

    for owner in owners {
        let tally = report.tallies.entry(owner).or_default();
        for mut holder in store.query(owner, &|e| e.id != id) {
            let mut changed = false;
            for &field in fields.iter().filter(|f| f.owner() == owner) {
                // Removing from a single-valued field nullifies it.
                changed |= holder.payload.remove(field, id);
            }
            if !changed {
                tally.skipped += 1;
                continue;
            }
            match write_payload(store, config, holder.id, holder.payload) {
                Ok(()) => {
                    debug!(holder = %holder.id, "stripped reference");
                    tally.succeeded += 1;
                    report.changes.insert(holder.id);
                }
                Err(error) => {
                    warn!(holder = %holder.id, %error, "cleanup write failed");
                    tally.failed += 1;
                    report.failures.push(WriteFailure {
                        entity: holder.id,
                        kind: owner,
                        error,
                    });
                }
            }
        }
    }

    info!(
        written = report.changes.len(),
        failed = report.failures.len(),
        "cleanup finished"
    );
    report
}
