//! Manual whole-graph repair, for when a graph has drifted out of sync.
//!
//! Repair works on a snapshot in memory and writes back only the entities
//! whose payload changed. Fixes are applied in this order:
//!
//! 1. Drop self, duplicate, dangling and wrongly-kinded references.
//! 2. Break group membership loops at their closing edge.
//! 3. Restore inverses. For many-to-one pairs the single-valued side wins;
//!    for many-to-many pairs the union wins.

use std::collections::{BTreeMap, BTreeSet};

use codex_foundation::{EntityId, EntityKind};
use codex_storage::{Cardinality, Entity, EntityStore, RelationField};
use tracing::{info, info_span, warn};

use crate::changes::ChangeSet;
use crate::config::EngineConfig;
use crate::invariants::{InvariantViolation, audit, group_cycles, snapshot};
use crate::mutation::write_payload;
use crate::report::{KindTally, Tallies, WriteFailure, render_tallies};

/// What a repair pass found and did.
#[derive(Debug, Default)]
pub struct RepairReport {
    /// Violations present before repair.
    pub found: Vec<InvariantViolation>,
    /// Entities written.
    pub changes: ChangeSet,
    /// Outcome counts per kind.
    pub tallies: Tallies,
    /// Writes the store refused.
    pub failures: Vec<WriteFailure>,
}

impl RepairReport {
    /// Returns the tally for `kind`.
    #[must_use]
    pub fn tally(&self, kind: EntityKind) -> KindTally {
        self.tallies.get(&kind).copied().unwrap_or_default()
    }

    /// Human-readable summary.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.found.is_empty() {
            return "graph is consistent".to_string();
        }
        format!(
            "repaired {} violation(s) across {} entit(ies):\n{}",
            self.found.len(),
            self.changes.len(),
            render_tallies(&self.tallies)
        )
    }
}

fn strip_local(work: &mut BTreeMap<EntityId, Entity>) {
    let kinds: BTreeMap<EntityId, EntityKind> =
        work.iter().map(|(id, e)| (*id, e.kind())).collect();
    for entity in work.values_mut() {
        let own = entity.id;
        for field in RelationField::fields_for(entity.kind()) {
            let mut seen = BTreeSet::new();
            entity.payload.retain(field, |target| {
                target != own
                    && kinds.get(&target).is_some_and(|kind| field.accepts(*kind))
                    && seen.insert(target)
            });
        }
    }
}

fn break_cycles(work: &mut BTreeMap<EntityId, Entity>) {
    loop {
        let cycles = group_cycles(work);
        if cycles.is_empty() {
            return;
        }
        for cycle in cycles {
            let [.., holder, closing] = cycle.as_slice() else {
                continue;
            };
            if let Some(group) = work.get_mut(holder) {
                warn!(group = %holder, member = %closing, "breaking membership loop");
                group.payload.remove(RelationField::GroupMembers, *closing);
            }
        }
    }
}

enum Fix {
    Insert(EntityId, RelationField, EntityId),
    Remove(EntityId, RelationField, EntityId),
}

fn restore_inverses(work: &mut BTreeMap<EntityId, Entity>) {
    let mut fixes = Vec::new();
    for entity in work.values() {
        for field in RelationField::fields_for(entity.kind()) {
            let Some(inverse) = field.inverse() else {
                continue;
            };
            for &target in entity.refs(field) {
                let Some(other) = work.get(&target) else {
                    continue;
                };
                if other.holds(inverse, entity.id) {
                    continue;
                }
                match field.cardinality() {
                    Cardinality::ManyToOne | Cardinality::ManyToMany => {
                        fixes.push(Fix::Insert(target, inverse, entity.id));
                    }
                    Cardinality::OneToMany => fixes.push(Fix::Remove(entity.id, field, target)),
                    Cardinality::Directed => {}
                }
            }
        }
    }
    for fix in fixes {
        match fix {
            Fix::Insert(holder, field, target) => {
                if let Some(entity) = work.get_mut(&holder) {
                    entity.payload.insert(field, target);
                }
            }
            Fix::Remove(holder, field, target) => {
                if let Some(entity) = work.get_mut(&holder) {
                    entity.payload.remove(field, target);
                }
            }
        }
    }
}

/// Restores every graph invariant.
///
/// Each changed entity is written independently; failures are collected in
/// the report and the remaining writes still happen.
pub fn repair<S: EntityStore + ?Sized>(store: &mut S, config: &EngineConfig) -> RepairReport {
    let _span = info_span!("repair").entered();
    let original = snapshot(store);
    let mut report = RepairReport {
        found: audit(&original),
        ..RepairReport::default()
    };
    if report.found.is_empty() {
        return report;
    }

    let mut work = original.clone();
    strip_local(&mut work);
    break_cycles(&mut work);
    restore_inverses(&mut work);

    for (id, entity) in work {
        let kind = entity.kind();
        let tally = report.tallies.entry(kind).or_default();
        if original.get(&id).map(|e| &e.payload) == Some(&entity.payload) {
            tally.skipped += 1;
            continue;
        }
        match write_payload(store, config, id, entity.payload) {
            Ok(()) => {
                tally.succeeded += 1;
                report.changes.insert(id);
            }
            Err(error) => {
                warn!(entity = %id, %error, "repair write failed");
                tally.failed += 1;
                report.failures.push(WriteFailure {
                    entity: id,
                    kind,
                    error,
                });
            }
        }
    }

    info!(
        found = report.found.len(),
        written = report.changes.len(),
        failed = report.failures.len(),
        "repair finished"
    );
    report
}
