//! Integration tests for export followed by import
//!
//! A round trip through an archive must reproduce the same graph under new
//! identifiers.

use codex_engine::invariant_violations;
use codex_foundation::EntityKind;
use codex_storage::{EntityStore, MemoryStore, RelationField};
use codex_transfer::{
    IdentifierMap, InlineReferences, MergePolicy, TransferConfig, collect_subgraph,
    export_subgraph, import_manifest,
};

use crate::vale;

/// Checks that `map` carries `from` onto `to` with every field preserved.
fn assert_isomorphic(from: &MemoryStore, to: &MemoryStore, map: &IdentifierMap) {
    assert_eq!(map.len(), from.len());
    for original in from.all() {
        let copy = to.get(map.translate(original.id)).unwrap();
        assert_eq!(copy.name, original.name);
        assert_eq!(copy.kind(), original.kind());
        for field in RelationField::fields_for(original.kind()) {
            let expected: Vec<_> =
                original.refs(field).iter().map(|id| map.translate(*id)).collect();
            assert_eq!(copy.refs(field), expected.as_slice(), "{} {field}", original.name);
        }
    }
}

#[test]
fn membership_is_only_followed_out_of_the_group() {
    let mut live = MemoryStore::new(1);
    let v = vale(&mut live);

    let from_mill = collect_subgraph(&live, &[v.mill], &TransferConfig::default()).unwrap();
    assert_eq!(from_mill.len(), live.len() - 1);
    assert!(!from_mill.contains(v.cabal));
    assert!(from_mill.missing.is_empty());

    let from_cabal = collect_subgraph(&live, &[v.cabal], &TransferConfig::default()).unwrap();
    assert_eq!(from_cabal.len(), live.len());
    assert_eq!(from_cabal.order.first(), Some(&v.cabal));
}

#[test]
fn export_then_import_into_an_empty_store_is_isomorphic() {
    let mut live = MemoryStore::new(1);
    let v = vale(&mut live);
    let mut archive = MemoryStore::new(2);
    let mut restored = MemoryStore::new(3);

    let roots = [v.region, v.cabal];
    let out =
        export_subgraph(&live, &roots, &mut archive, &TransferConfig::archive("vale")).unwrap();
    let back =
        import_manifest(&archive, "vale", &mut restored, &TransferConfig::default()).unwrap();

    assert!(out.is_clean());
    assert!(back.is_clean());
    assert_eq!(out.copied(), live.len());
    assert_eq!(back.copied(), live.len());
    assert_isomorphic(&live, &archive, &out.map);
    assert_isomorphic(&live, &restored, &out.map.compose(&back.map));
    assert!(invariant_violations(&restored).is_empty());
}

#[test]
fn copies_remember_where_they_came_from() {
    let mut live = MemoryStore::new(1);
    let v = vale(&mut live);
    let mut archive = MemoryStore::new(2);
    let out = export_subgraph(&live, &[v.tam], &mut archive, &TransferConfig::default()).unwrap();

    for (old, new) in out.map.iter() {
        assert_eq!(archive.get(new).unwrap().origin, Some(old));
    }
}

#[test]
fn inline_tokens_follow_the_copy() {
    let mut live = MemoryStore::new(1);
    let v = vale(&mut live);
    let mut archive = MemoryStore::new(2);
    let out = export_subgraph(&live, &[v.tam], &mut archive, &TransferConfig::default()).unwrap();

    let copy = archive.get(out.map.translate(v.tam)).unwrap();
    let inline = InlineReferences::new().unwrap();
    let ids = inline.ids(&copy.notes);
    assert_eq!(ids, vec![out.map.translate(v.stall), out.map.translate(v.square)]);
    assert!(copy.notes.contains("{the stall}"));
    assert_eq!(out.rewrites.text_rewritten, 2);
}

#[test]
fn reimport_with_skip_creates_nothing() {
    let mut live = MemoryStore::new(1);
    let v = vale(&mut live);
    let mut archive = MemoryStore::new(2);
    let config = TransferConfig::archive("vale");
    export_subgraph(&live, &[v.region, v.cabal], &mut archive, &config).unwrap();
    let before = live.all();

    let report =
        import_manifest(&archive, "vale", &mut live, &TransferConfig::default()).unwrap();

    assert_eq!(report.copied(), 0);
    assert_eq!(report.skipped(), before.len());
    assert_eq!(live.all(), before);
    assert_eq!(report.map.translate(report.map.invert().translate(v.mill)), v.mill);
}

#[test]
fn reimport_with_create_new_duplicates_the_batch() {
    let mut live = MemoryStore::new(1);
    let v = vale(&mut live);
    let mut archive = MemoryStore::new(2);
    let config = TransferConfig::archive("vale");
    export_subgraph(&live, &[v.region, v.cabal], &mut archive, &config).unwrap();
    let count = live.len();

    let config = TransferConfig::default().with_merge(MergePolicy::CreateNew);
    let report = import_manifest(&archive, "vale", &mut live, &config).unwrap();

    assert_eq!(report.copied(), count);
    assert_eq!(live.len(), count * 2);
    assert_eq!(live.query(EntityKind::Region, &|_| true).len(), 2);
    assert!(invariant_violations(&live).is_empty());
}
