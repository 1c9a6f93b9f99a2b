//! The two-pass copy shared by export and import.

use codex_engine::{EngineConfig, WriteFailure, link, repair, unlink};
use codex_foundation::{EntityId, EntityKind, Result};
use codex_storage::{Entity, EntityDraft, EntityStore, Manifest, Payload, RelationField};
use tracing::{debug, info, warn};

use crate::closure::{Subgraph, collect_subgraph};
use crate::config::{DanglingPolicy, MergePolicy, TransferConfig};
use crate::idmap::IdentifierMap;
use crate::report::{RewriteStats, TransferReport};
use crate::text::InlineReferences;

/// Which way entities are flowing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    /// Live store to archive. Every entity is copied.
    Export,
    /// Archive to live store. Existing counterparts follow the merge policy.
    Import,
}

/// An entity placed in the target by pass 1 and awaiting its pass 2 write.
struct Placement {
    source: EntityId,
    target: EntityId,
    origin: Option<EntityId>,
    /// Payload of an overwritten live entity, before the overwrite.
    previous: Option<Payload>,
}

/// An entity pass 2 wrote.
struct Written {
    id: EntityId,
    previous: Option<Payload>,
    payload: Payload,
}

/// Runs both passes and returns the report.
pub(crate) fn transfer<S, T>(
    source: &S,
    roots: &[EntityId],
    target: &mut T,
    config: &TransferConfig,
    direction: Direction,
) -> Result<TransferReport>
where
    S: EntityStore + ?Sized,
    T: EntityStore + ?Sized,
{
    let inline = InlineReferences::new()?;
    let subgraph = collect_subgraph(source, roots, config)?;
    let mut report = TransferReport {
        missing: subgraph.missing.clone(),
        ..TransferReport::default()
    };

    let placements = place(&subgraph, target, config, direction, &mut report);
    let written = relink(&subgraph, &placements, target, config, &inline, &mut report);
    if direction == Direction::Import {
        mirror_inverses(target, &written, &mut report);
    }

    if let Some(label) = &config.record_manifest {
        let manifest = manifest_for(label, &subgraph, &report.map);
        match target.record_manifest(manifest.clone()) {
            Ok(()) => report.manifest = Some(manifest),
            Err(error) => warn!(label = %label, %error, "manifest could not be recorded"),
        }
    }

    if direction == Direction::Import && config.repair_after_import {
        report.repair = Some(repair(target, &EngineConfig::default()));
    }

    info!(
        collected = subgraph.len(),
        copied = report.copied(),
        skipped = report.skipped(),
        failed = report.failures.len(),
        missing = report.missing.len(),
        "transfer finished"
    );
    Ok(report)
}

/// Pass 1: give every collected entity an identity in the target.
fn place<T: EntityStore + ?Sized>(
    subgraph: &Subgraph,
    target: &mut T,
    config: &TransferConfig,
    direction: Direction,
    report: &mut TransferReport,
) -> Vec<Placement> {
    let mut placements = Vec::with_capacity(subgraph.len());

    for entity in subgraph.iter() {
        let kind = entity.kind();
        let key = entity.correlation_key();
        let origin = match direction {
            Direction::Export => entity.id,
            Direction::Import => key,
        };

        let existing = match (direction, config.merge) {
            (Direction::Import, MergePolicy::Skip | MergePolicy::Overwrite) => {
                counterpart(target, kind, key)
            }
            _ => None,
        };

        if let Some(existing) = existing {
            report.map.insert(entity.id, existing.id);
            if config.merge == MergePolicy::Skip {
                debug!(from = %entity.id, to = %existing.id, "mapped onto existing entity");
                report.tallies.entry(kind).or_default().skipped += 1;
            } else {
                placements.push(Placement {
                    source: entity.id,
                    target: existing.id,
                    origin: existing.origin,
                    previous: Some(existing.payload.clone()),
                });
            }
            continue;
        }

        let draft = EntityDraft::copy_of(entity).with_origin(origin);
        match target.create(draft) {
            Ok(new) => {
                debug!(from = %entity.id, to = %new, "copied");
                report.map.insert(entity.id, new);
                placements.push(Placement {
                    source: entity.id,
                    target: new,
                    origin: Some(origin),
                    previous: None,
                });
            }
            Err(error) => {
                warn!(entity = %entity.id, %error, "copy failed");
                report.tallies.entry(kind).or_default().failed += 1;
                report.failures.push(WriteFailure {
                    entity: entity.id,
                    kind,
                    error,
                });
            }
        }
    }
    placements
}

/// The live entity an archived one corresponds to. An exact id match wins
/// over an entity that merely carries the key as its origin.
fn counterpart<T: EntityStore + ?Sized>(
    target: &T,
    kind: EntityKind,
    key: EntityId,
) -> Option<Entity> {
    target
        .find_correlated(kind, key)
        .into_iter()
        .min_by_key(|candidate| (candidate.id != key, candidate.id))
}

/// Pass 2: rewrite relationship fields and inline tokens, then write.
///
/// Returns the entities that were written.
fn relink<T: EntityStore + ?Sized>(
    subgraph: &Subgraph,
    placements: &[Placement],
    target: &mut T,
    config: &TransferConfig,
    inline: &InlineReferences,
    report: &mut TransferReport,
) -> Vec<Written> {
    let map = &report.map;
    let mut stats = RewriteStats::default();
    let mut writes = Vec::with_capacity(placements.len());

    for placement in placements {
        let Some(original) = subgraph.entities.get(&placement.source) else {
            continue;
        };
        let mut payload = original.payload.clone();
        for field in RelationField::fields_for(original.kind()) {
            payload.rewrite(field, |id| match (map.lookup(id), config.dangling) {
                (Some(new), _) => {
                    stats.relinked += 1;
                    Some(new)
                }
                (None, DanglingPolicy::KeepExternal) => {
                    stats.kept_external += 1;
                    Some(id)
                }
                (None, DanglingPolicy::NoDangling) => {
                    stats.dropped += 1;
                    None
                }
            });
        }

        let mut description = original.description.clone();
        let mut notes = original.notes.clone();
        if config.rewrite_text {
            for text in [&mut description, &mut notes] {
                let out = inline.rewrite(text, map, config.dangling);
                stats.text_rewritten += out.rewritten;
                stats.text_dropped += out.dropped;
                *text = out.text;
            }
        }

        writes.push((
            placement.previous.clone(),
            Entity {
                id: placement.target,
                name: original.name.clone(),
                description,
                notes,
                origin: placement.origin,
                payload,
            },
        ));
    }

    report.rewrites = stats;
    let mut written = Vec::with_capacity(writes.len());
    for (previous, entity) in writes {
        let kind = entity.kind();
        let id = entity.id;
        let payload = entity.payload.clone();
        match target.update(entity) {
            Ok(()) => {
                report.tallies.entry(kind).or_default().succeeded += 1;
                written.push(Written {
                    id,
                    previous,
                    payload,
                });
            }
            Err(error) => {
                warn!(entity = %id, %error, "relink write failed");
                report.tallies.entry(kind).or_default().failed += 1;
                report.failures.push(WriteFailure {
                    entity: id,
                    kind,
                    error,
                });
            }
        }
    }
    written
}

/// Makes every live entity on the far side of a written edge point back.
///
/// Counterparts mapped under `Skip` are never rewritten, and an overwrite
/// drops edges whose far side still points at the overwritten entity. Both
/// are settled here with pairwise link and unlink calls, so the live store
/// keeps its inverses without a full repair.
fn mirror_inverses<T: EntityStore + ?Sized>(
    target: &mut T,
    written: &[Written],
    report: &mut TransferReport,
) {
    let engine = EngineConfig::default();
    for entry in written {
        let kind = entry.payload.kind();
        let mut results = Vec::new();
        if let Some(previous) = &entry.previous {
            for (field, old) in previous.references() {
                if field.inverse().is_some() && !entry.payload.refs(field).contains(&old) {
                    results.push((old, unlink(target, &engine, entry.id, field, old)));
                }
            }
        }
        for (field, other) in entry.payload.references() {
            if field.inverse().is_some() && target.contains(other) {
                results.push((other, link(target, &engine, entry.id, field, other)));
            }
        }
        for (other, result) in results {
            match result {
                Ok(changes) if changes.contains(other) => report.rewrites.mirrored += 1,
                Ok(_) => {}
                Err(error) => {
                    warn!(entity = %entry.id, %other, %error, "could not mirror inverse");
                    report.failures.push(WriteFailure {
                        entity: entry.id,
                        kind,
                        error,
                    });
                }
            }
        }
    }
}

fn manifest_for(label: &str, subgraph: &Subgraph, map: &IdentifierMap) -> Manifest {
    let roots = subgraph.roots.iter().filter_map(|id| map.lookup(*id)).collect();
    let mut manifest = Manifest::new(label).with_roots(roots);
    for entity in subgraph.iter() {
        if let Some(new) = map.lookup(entity.id) {
            manifest.enlist(entity.kind(), new);
        }
    }
    manifest
}
