//! Cycle and duplicate prevention for nested groups.
//!
//! Group membership is one-directional, so nothing on the member side stops a
//! group from ending up inside itself. The guard expands memberships with a
//! depth-first walk that only reports a cycle when an identifier already on
//! the current path comes round again; two branches reaching the same entity
//! form a diamond, which is legal.

use std::collections::BTreeSet;

use codex_foundation::{EntityId, EntityKind, MembershipRejection};
use codex_storage::{EntityStore, RelationField};
use tracing::trace;

/// Members of `id` if it is a group, `None` otherwise.
pub(crate) fn group_members<S: EntityStore + ?Sized>(
    store: &S,
    id: EntityId,
) -> Option<Vec<EntityId>> {
    store
        .get(id)
        .filter(|e| e.kind() == EntityKind::Group)
        .map(|e| e.refs(RelationField::GroupMembers).to_vec())
}

/// Walks memberships from `root` using `members` to resolve nested groups.
///
/// Returns everything reachable below `root`, or the offending path if the
/// walk revisits an identifier on its own path.
pub(crate) fn walk(
    root: EntityId,
    members: &dyn Fn(EntityId) -> Option<Vec<EntityId>>,
) -> Result<BTreeSet<EntityId>, Vec<EntityId>> {
    fn visit(
        id: EntityId,
        members: &dyn Fn(EntityId) -> Option<Vec<EntityId>>,
        path: &mut Vec<EntityId>,
        seen: &mut BTreeSet<EntityId>,
    ) -> Result<(), Vec<EntityId>> {
        if path.contains(&id) {
            let mut cycle = path.clone();
            cycle.push(id);
            return Err(cycle);
        }
        let Some(children) = members(id) else {
            return Ok(());
        };
        path.push(id);
        for child in children {
            trace!(parent = %id, %child, "expanding member");
            if seen.insert(child) || path.contains(&child) {
                visit(child, members, path, seen)?;
            }
        }
        path.pop();
        Ok(())
    }

    let mut path = Vec::new();
    let mut seen = BTreeSet::new();
    visit(root, members, &mut path, &mut seen)?;
    seen.remove(&root);
    Ok(seen)
}

/// Finds a membership path from `from` down to `to`.
pub(crate) fn find_path(
    from: EntityId,
    to: EntityId,
    members: &dyn Fn(EntityId) -> Option<Vec<EntityId>>,
) -> Option<Vec<EntityId>> {
    fn search(
        id: EntityId,
        to: EntityId,
        members: &dyn Fn(EntityId) -> Option<Vec<EntityId>>,
        path: &mut Vec<EntityId>,
    ) -> bool {
        path.push(id);
        if id == to {
            return true;
        }
        if path[..path.len() - 1].contains(&id) {
            path.pop();
            return false;
        }
        for child in members(id).unwrap_or_default() {
            if search(child, to, members, path) {
                return true;
            }
        }
        path.pop();
        false
    }

    let mut path = Vec::new();
    search(from, to, members, &mut path).then_some(path)
}

/// Expands a group's membership through every nested group.
///
/// # Errors
///
/// Returns the membership path that closes a cycle, if one already exists.
pub fn expand_members<S: EntityStore + ?Sized>(
    store: &S,
    group: EntityId,
) -> Result<BTreeSet<EntityId>, Vec<EntityId>> {
    walk(group, &|id| group_members(store, id))
}

/// Decides whether `candidate` may join `group`.
///
/// Only on success may the caller append `candidate` to `group`'s members.
///
/// # Errors
///
/// - `SelfMembership` if `candidate == group`
/// - `UnknownGroup` / `NotAGroup` / `UnknownCandidate` for unresolvable inputs
/// - `AlreadyMember` if `candidate` is a direct member
/// - `Cycle` if `candidate` is a group that already reaches `group`
/// - `Duplicate` if an attached nested group already contains `candidate`
pub fn can_add_member<S: EntityStore + ?Sized>(
    store: &S,
    group: EntityId,
    candidate: EntityId,
) -> Result<(), MembershipRejection> {
    let members = group_members(store, group).unwrap_or_default();
    can_add_member_to(store, group, &members, candidate)
}

/// Decides whether `candidate` may join `group` when `group` directly holds
/// exactly `members`, whatever the store currently says.
///
/// An edit written to the store before it is reconciled already contains its
/// new members; checking against the membership from before the edit keeps
/// such additions under the guard.
///
/// # Errors
///
/// Same as [`can_add_member`].
pub fn can_add_member_to<S: EntityStore + ?Sized>(
    store: &S,
    group: EntityId,
    members: &[EntityId],
    candidate: EntityId,
) -> Result<(), MembershipRejection> {
    if candidate == group {
        return Err(MembershipRejection::SelfMembership { group });
    }
    let kind = store
        .kind_of(group)
        .ok_or(MembershipRejection::UnknownGroup(group))?;
    if kind != EntityKind::Group {
        return Err(MembershipRejection::NotAGroup { id: group, kind });
    }
    let candidate_kind = store
        .kind_of(candidate)
        .ok_or(MembershipRejection::UnknownCandidate(candidate))?;
    if members.contains(&candidate) {
        return Err(MembershipRejection::AlreadyMember { group, candidate });
    }

    let resolve = |id: EntityId| {
        if id == group {
            Some(members.to_vec())
        } else {
            group_members(store, id)
        }
    };

    if candidate_kind == EntityKind::Group {
        let closing = match walk(candidate, &resolve) {
            Ok(reachable) if reachable.contains(&group) => Some(
                find_path(candidate, group, &resolve).unwrap_or_else(|| vec![candidate, group]),
            ),
            Ok(_) => None,
            Err(path) => Some(path),
        };
        if let Some(path) = closing {
            return Err(MembershipRejection::Cycle {
                group,
                candidate,
                path,
            });
        }
    }

    for &member in members {
        if store.kind_of(member) != Some(EntityKind::Group) {
            continue;
        }
        if walk(member, &resolve).unwrap_or_default().contains(&candidate) {
            return Err(MembershipRejection::Duplicate {
                group,
                candidate,
                via: member,
            });
        }
    }
    Ok(())
}
