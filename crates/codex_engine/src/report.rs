//! Per-kind tallies for multi-write operations.

use std::collections::BTreeMap;
use std::fmt;

use codex_foundation::{EntityId, EntityKind, Error};

/// Outcome counts for one entity kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KindTally {
    /// Writes that went through.
    pub succeeded: usize,
    /// Entities looked at that needed no write.
    pub skipped: usize,
    /// Writes the store refused.
    pub failed: usize,
}

impl KindTally {
    /// Total entities accounted for.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded + self.skipped + self.failed
    }
}

impl fmt::Display for KindTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ok, {} skipped, {} failed",
            self.succeeded, self.skipped, self.failed
        )
    }
}

/// A store write that failed inside a multi-write operation.
#[derive(Debug)]
pub struct WriteFailure {
    /// The entity whose write failed.
    pub entity: EntityId,
    /// Its kind.
    pub kind: EntityKind,
    /// What the store reported.
    pub error: Error,
}

/// Tallies keyed by kind, shared by cleanup, repair and transfer reports.
pub type Tallies = BTreeMap<EntityKind, KindTally>;

/// Renders tallies one kind per line, skipping kinds with nothing to report.
#[must_use]
pub fn render_tallies(tallies: &Tallies) -> String {
    tallies
        .iter()
        .filter(|(_, tally)| tally.total() > 0)
        .map(|(kind, tally)| format!("  {kind}: {tally}"))
        .collect::<Vec<_>>()
        .join("\n")
}
