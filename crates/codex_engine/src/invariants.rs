//! Whole-graph audit.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use codex_foundation::{EntityId, EntityKind};
use codex_storage::{Entity, EntityStore, RelationField};

use crate::nesting::walk;

/// A broken graph invariant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A field holds an identifier that resolves to nothing.
    DanglingReference {
        /// Holder.
        entity: EntityId,
        /// Field on the holder.
        field: RelationField,
        /// The missing identifier.
        missing: EntityId,
    },
    /// A field holds its own entity.
    SelfReference {
        /// Holder.
        entity: EntityId,
        /// Field on the holder.
        field: RelationField,
    },
    /// A collection holds the same identifier twice.
    DuplicateReference {
        /// Holder.
        entity: EntityId,
        /// Field on the holder.
        field: RelationField,
        /// The repeated identifier.
        target: EntityId,
    },
    /// The referenced entity does not point back.
    MissingInverse {
        /// Holder.
        entity: EntityId,
        /// Field on the holder.
        field: RelationField,
        /// Referenced entity.
        target: EntityId,
        /// Field on the target that should hold `entity`.
        inverse: RelationField,
    },
    /// A field references an entity of a kind it does not accept.
    KindMismatch {
        /// Holder.
        entity: EntityId,
        /// Field on the holder.
        field: RelationField,
        /// Referenced entity.
        target: EntityId,
        /// Its kind.
        kind: EntityKind,
    },
    /// Group memberships loop back on themselves.
    GroupCycle {
        /// The loop, starting and ending on the same group.
        path: Vec<EntityId>,
    },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingReference {
                entity,
                field,
                missing,
            } => write!(f, "{entity} {field} holds missing {missing}"),
            Self::SelfReference { entity, field } => write!(f, "{entity} {field} holds itself"),
            Self::DuplicateReference {
                entity,
                field,
                target,
            } => write!(f, "{entity} {field} holds {target} more than once"),
            Self::MissingInverse {
                entity,
                field,
                target,
                inverse,
            } => write!(
                f,
                "{entity} {field} holds {target} but {target} {inverse} does not hold {entity}"
            ),
            Self::KindMismatch {
                entity,
                field,
                target,
                kind,
            } => write!(f, "{entity} {field} holds {target}, a {kind}"),
            Self::GroupCycle { path } => {
                let rendered: Vec<_> = path.iter().map(EntityId::to_string).collect();
                write!(f, "group cycle {}", rendered.join(" -> "))
            }
        }
    }
}

/// Audits a snapshot of the graph keyed by identifier.
pub(crate) fn audit(entities: &BTreeMap<EntityId, Entity>) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    for entity in entities.values() {
        for field in RelationField::fields_for(entity.kind()) {
            let refs = entity.refs(field);
            let mut seen = BTreeSet::new();
            for &target in refs {
                if target == entity.id {
                    violations.push(InvariantViolation::SelfReference {
                        entity: entity.id,
                        field,
                    });
                    continue;
                }
                if !seen.insert(target) {
                    violations.push(InvariantViolation::DuplicateReference {
                        entity: entity.id,
                        field,
                        target,
                    });
                    continue;
                }
                let Some(other) = entities.get(&target) else {
                    violations.push(InvariantViolation::DanglingReference {
                        entity: entity.id,
                        field,
                        missing: target,
                    });
                    continue;
                };
                if !field.accepts(other.kind()) {
                    violations.push(InvariantViolation::KindMismatch {
                        entity: entity.id,
                        field,
                        target,
                        kind: other.kind(),
                    });
                    continue;
                }
                if let Some(inverse) = field.inverse() {
                    if !other.holds(inverse, entity.id) {
                        violations.push(InvariantViolation::MissingInverse {
                            entity: entity.id,
                            field,
                            target,
                            inverse,
                        });
                    }
                }
            }
        }
    }

    violations.extend(
        group_cycles(entities)
            .into_iter()
            .map(|path| InvariantViolation::GroupCycle { path }),
    );
    violations
}

/// Finds each distinct membership loop once.
pub(crate) fn group_cycles(entities: &BTreeMap<EntityId, Entity>) -> Vec<Vec<EntityId>> {
    let members = |id: EntityId| {
        entities
            .get(&id)
            .filter(|e| e.kind() == EntityKind::Group)
            .map(|e| e.refs(RelationField::GroupMembers).to_vec())
    };

    let mut found: BTreeSet<BTreeSet<EntityId>> = BTreeSet::new();
    let mut cycles = Vec::new();
    for group in entities.values().filter(|e| e.kind() == EntityKind::Group) {
        let Err(path) = walk(group.id, &members) else {
            continue;
        };
        let Some(&closing) = path.last() else {
            continue;
        };
        let start = path.iter().position(|id| *id == closing).unwrap_or(0);
        let cycle = path[start..].to_vec();
        if found.insert(cycle.iter().copied().collect()) {
            cycles.push(cycle);
        }
    }
    cycles
}

/// Snapshot of every entity in the store, keyed by identifier.
pub(crate) fn snapshot<S: EntityStore + ?Sized>(store: &S) -> BTreeMap<EntityId, Entity> {
    store.all().into_iter().map(|e| (e.id, e)).collect()
}

/// Lists every invariant the store currently breaks.
///
/// The audit only reads; see [`repair`](crate::repair) to fix what it finds.
pub fn invariant_violations<S: EntityStore + ?Sized>(store: &S) -> Vec<InvariantViolation> {
    audit(&snapshot(store))
}
