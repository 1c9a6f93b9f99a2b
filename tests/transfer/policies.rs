//! Integration tests for transfer policies
//!
//! Dangling references, merge behaviour, and text-reference following.

use codex_engine::{EngineConfig, cascade_delete, invariant_violations, link, unlink};
use codex_foundation::{EntityKind, ErrorKind};
use codex_storage::{EntityDraft, EntityStore, MemoryStore, RelationField};
use codex_transfer::{
    DanglingPolicy, MergePolicy, TransferConfig, export_subgraph, import_manifest,
};

use crate::vale;

/// A live store where Tam's associates include an npc that no longer exists.
fn with_ghost() -> (MemoryStore, crate::Vale, codex_foundation::EntityId) {
    let mut live = MemoryStore::new(1);
    let v = vale(&mut live);
    let ghost = live.create(EntityDraft::new(EntityKind::Npc, "Ghost")).unwrap();
    let mut tam = live.get(v.tam).unwrap();
    tam.payload.insert(RelationField::NpcAssociates, ghost);
    tam.notes.push_str(&format!(" Haunted by @UUID[{ghost}]{{a ghost}}."));
    live.update(tam).unwrap();
    live.delete(ghost).unwrap();
    (live, v, ghost)
}

// =============================================================================
// Dangling References
// =============================================================================

#[test]
fn keep_external_leaves_missing_ids_in_place() {
    let (live, v, ghost) = with_ghost();
    let mut archive = MemoryStore::new(2);

    let report = export_subgraph(&live, &[v.tam], &mut archive, &TransferConfig::default())
        .unwrap();

    assert!(report.missing.contains(&ghost));
    assert!(!report.is_clean());
    assert_eq!(report.rewrites.kept_external, 1);
    let copy = archive.get(report.map.translate(v.tam)).unwrap();
    assert!(copy.holds(RelationField::NpcAssociates, ghost));
    assert!(copy.notes.contains(&format!("@UUID[{ghost}]{{a ghost}}")));
}

#[test]
fn no_dangling_strips_missing_ids_and_collapses_tokens() {
    let (live, v, ghost) = with_ghost();
    let mut archive = MemoryStore::new(2);
    let config = TransferConfig::default().with_dangling(DanglingPolicy::NoDangling);

    let report = export_subgraph(&live, &[v.tam], &mut archive, &config).unwrap();

    assert_eq!(report.rewrites.dropped, 1);
    assert_eq!(report.rewrites.text_dropped, 1);
    let copy = archive.get(report.map.translate(v.tam)).unwrap();
    assert!(!copy.holds(RelationField::NpcAssociates, ghost));
    assert!(copy.notes.ends_with("Haunted by a ghost."));
    assert!(invariant_violations(&archive).is_empty());
}

// =============================================================================
// Merge Policies
// =============================================================================

#[test]
fn overwrite_restores_the_archived_state() {
    let mut live = MemoryStore::new(1);
    let v = vale(&mut live);
    let mut archive = MemoryStore::new(2);
    let config = TransferConfig::archive("vale");
    export_subgraph(&live, &[v.region, v.cabal], &mut archive, &config).unwrap();

    let engine_config = EngineConfig::default();
    unlink(&mut live, &engine_config, v.mill, RelationField::LocationNpcs, v.tam).unwrap();
    let mut tam = live.get(v.tam).unwrap();
    tam.name = "Renamed".to_string();
    live.update(tam).unwrap();
    let count = live.len();

    let report = import_manifest(&archive, "vale", &mut live, &TransferConfig::restore()).unwrap();

    assert_eq!(live.len(), count);
    assert_eq!(report.map.translate(report.map.invert().translate(v.tam)), v.tam);
    let tam = live.get(v.tam).unwrap();
    assert_eq!(tam.name, "Miller Tam");
    assert!(tam.holds(RelationField::NpcLocations, v.mill));
    assert!(live.get(v.mill).unwrap().holds(RelationField::LocationNpcs, v.tam));
    assert!(report.repair.is_some());
    assert!(invariant_violations(&live).is_empty());
}

#[test]
fn skip_keeps_local_edits() {
    let mut live = MemoryStore::new(1);
    let v = vale(&mut live);
    let mut archive = MemoryStore::new(2);
    export_subgraph(&live, &[v.ida], &mut archive, &TransferConfig::archive("ida")).unwrap();

    let mut ida = live.get(v.ida).unwrap();
    ida.description = "Changed locally.".to_string();
    live.update(ida).unwrap();

    let config = TransferConfig::default().with_merge(MergePolicy::Skip);
    let report = import_manifest(&archive, "ida", &mut live, &config).unwrap();

    assert_eq!(report.copied(), 0);
    assert_eq!(live.get(v.ida).unwrap().description, "Changed locally.");
}

#[test]
fn skip_import_points_live_counterparts_at_new_copies() {
    let mut live = MemoryStore::new(1);
    let engine_config = EngineConfig::default();
    let mill = live.create(EntityDraft::new(EntityKind::Location, "Old Mill")).unwrap();
    let tam = live.create(EntityDraft::new(EntityKind::Npc, "Miller Tam")).unwrap();
    link(&mut live, &engine_config, mill, RelationField::LocationNpcs, tam).unwrap();

    let mut archive = MemoryStore::new(2);
    export_subgraph(&live, &[mill], &mut archive, &TransferConfig::archive("mill")).unwrap();

    // The mill is lost locally; Tam survives.
    cascade_delete(&mut live, &engine_config, mill).unwrap();
    live.delete(mill).unwrap();

    let report = import_manifest(&archive, "mill", &mut live, &TransferConfig::default()).unwrap();

    assert_eq!(report.copied(), 1);
    assert_eq!(report.skipped(), 1);
    assert_eq!(report.rewrites.mirrored, 1);
    let archived_mill = archive.manifest("mill").unwrap().roots[0];
    let new_mill = report.map.translate(archived_mill);
    assert!(live.get(new_mill).unwrap().holds(RelationField::LocationNpcs, tam));
    assert!(live.get(tam).unwrap().holds(RelationField::NpcLocations, new_mill));
    assert!(invariant_violations(&live).is_empty());
}

#[test]
fn overwrite_without_repair_keeps_inverses() {
    let mut live = MemoryStore::new(1);
    let v = vale(&mut live);
    let mut archive = MemoryStore::new(2);
    export_subgraph(&live, &[v.mill], &mut archive, &TransferConfig::archive("mill")).unwrap();

    // Wren arrives after the export, so the archive knows nothing of her.
    let engine_config = EngineConfig::default();
    let wren = live.create(EntityDraft::new(EntityKind::Npc, "Wren")).unwrap();
    link(&mut live, &engine_config, v.mill, RelationField::LocationNpcs, wren).unwrap();

    let config = TransferConfig::default().with_merge(MergePolicy::Overwrite);
    let report = import_manifest(&archive, "mill", &mut live, &config).unwrap();

    assert!(report.repair.is_none());
    let mill = live.get(v.mill).unwrap();
    assert!(mill.holds(RelationField::LocationNpcs, v.tam));
    assert!(!mill.holds(RelationField::LocationNpcs, wren));
    assert!(live.get(wren).unwrap().refs(RelationField::NpcLocations).is_empty());
    assert!(invariant_violations(&live).is_empty());
}

#[test]
fn unknown_manifest_is_an_error() {
    let live = MemoryStore::new(1);
    let mut target = MemoryStore::new(2);
    let err = import_manifest(&live, "nope", &mut target, &TransferConfig::default()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ManifestNotFound(ref label) if label == "nope"));
    assert!(target.is_empty());
}

// =============================================================================
// Text References
// =============================================================================

#[test]
fn text_references_pull_in_entities_only_when_followed() {
    let mut live = MemoryStore::new(1);
    let hermit = live.create(EntityDraft::new(EntityKind::Npc, "Hermit")).unwrap();
    let cave = live
        .create(
            EntityDraft::new(EntityKind::Location, "Cave")
                .with_description(format!("Home of @UUID[{hermit}]{{the hermit}}.")),
        )
        .unwrap();

    let mut plain = MemoryStore::new(2);
    let report = export_subgraph(&live, &[cave], &mut plain, &TransferConfig::default()).unwrap();
    assert_eq!(report.copied(), 1);
    let copy = plain.get(report.map.translate(cave)).unwrap();
    assert!(copy.description.contains(&hermit.to_string()));

    let mut followed = MemoryStore::new(2);
    let config = TransferConfig::default().with_follow_text_references(true);
    let report = export_subgraph(&live, &[cave], &mut followed, &config).unwrap();
    assert_eq!(report.copied(), 2);
    let copy = followed.get(report.map.translate(cave)).unwrap();
    let new_hermit = report.map.translate(hermit);
    assert_ne!(new_hermit, hermit);
    assert!(copy.description.contains(&format!("@UUID[{new_hermit}]{{the hermit}}")));
}
