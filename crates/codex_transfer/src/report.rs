//! Transfer reports.

use std::collections::BTreeSet;
use std::fmt;

use codex_engine::{KindTally, RepairReport, Tallies, WriteFailure, render_tallies};
use codex_foundation::{EntityId, EntityKind};
use codex_storage::Manifest;

use crate::idmap::IdentifierMap;

/// How many identifiers pass 2 touched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RewriteStats {
    /// Relationship identifiers translated through the map.
    pub relinked: usize,
    /// Unmapped relationship identifiers left in place.
    pub kept_external: usize,
    /// Unmapped relationship identifiers removed.
    pub dropped: usize,
    /// Inline tokens translated.
    pub text_rewritten: usize,
    /// Unmapped inline tokens collapsed to their label.
    pub text_dropped: usize,
    /// Live entities updated to point back at a written entity.
    pub mirrored: usize,
}

impl fmt::Display for RewriteStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} relinked, {} external, {} dropped, {} mirrored; \
             {} inline rewritten, {} inline dropped",
            self.relinked,
            self.kept_external,
            self.dropped,
            self.mirrored,
            self.text_rewritten,
            self.text_dropped
        )
    }
}

/// What an export or import did.
///
/// In the tallies, `succeeded` counts entities copied or overwritten and
/// `skipped` counts entities mapped onto an existing live counterpart.
#[derive(Debug, Default)]
pub struct TransferReport {
    /// Source identifier to target identifier.
    pub map: IdentifierMap,
    /// Outcome counts per kind.
    pub tallies: Tallies,
    /// Identifiers the traversal could not resolve.
    pub missing: BTreeSet<EntityId>,
    /// Pass 2 statistics.
    pub rewrites: RewriteStats,
    /// Writes the target store refused.
    pub failures: Vec<WriteFailure>,
    /// Manifest recorded in the target store, if any.
    pub manifest: Option<Manifest>,
    /// Repair pass run after an import, if any.
    pub repair: Option<RepairReport>,
}

impl TransferReport {
    /// Returns the tally for `kind`.
    #[must_use]
    pub fn tally(&self, kind: EntityKind) -> KindTally {
        self.tallies.get(&kind).copied().unwrap_or_default()
    }

    /// Entities written to the target.
    #[must_use]
    pub fn copied(&self) -> usize {
        self.tallies.values().map(|t| t.succeeded).sum()
    }

    /// Entities mapped onto existing ones without a write.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.tallies.values().map(|t| t.skipped).sum()
    }

    /// Returns true if nothing failed and nothing was missing.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.missing.is_empty()
    }

    /// Human-readable summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "{} copied, {} skipped, {} failed, {} missing",
            self.copied(),
            self.skipped(),
            self.failures.len(),
            self.missing.len()
        )];
        let tallies = render_tallies(&self.tallies);
        if !tallies.is_empty() {
            lines.push(tallies);
        }
        lines.push(format!("  rewrites: {}", self.rewrites));
        if let Some(manifest) = &self.manifest {
            lines.push(format!(
                "  manifest {:?} lists {} entities",
                manifest.label,
                manifest.len()
            ));
        }
        if let Some(repair) = &self.repair {
            lines.push(format!("  {}", repair.summary()));
        }
        lines.join("\n")
    }
}
