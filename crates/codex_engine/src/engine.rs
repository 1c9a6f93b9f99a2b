//! The engine façade.

use std::collections::VecDeque;

use codex_foundation::{EntityId, EntityKind, Error, MembershipRejection, Result};
use codex_storage::{EntityDraft, EntityStore, Payload, RelationField};
use tracing::{debug, debug_span, info, info_span, warn};

use crate::cascade::{CleanupReport, cascade_delete, strip_references};
use crate::changes::{ChangeSet, ScopeId, UpdateNotice};
use crate::config::EngineConfig;
use crate::invariants::{InvariantViolation, invariant_violations};
use crate::mutation::{link, unlink, write_payload};
use crate::nesting::can_add_member;
use crate::reconcile::{OpFailure, ReconcileOutcome, reconcile};
use crate::repair::{RepairReport, repair};

/// What a round of notification processing did.
#[derive(Debug, Default)]
pub struct ProcessStats {
    /// External notices reconciled.
    pub reconciled: usize,
    /// Consequence notices dropped.
    pub suppressed: usize,
    /// External notices whose entity no longer exists.
    pub stale: usize,
    /// Every entity written while processing.
    pub changes: ChangeSet,
    /// Operations that failed during reconciliation.
    pub failures: Vec<OpFailure>,
}

/// Owns a store and serializes every graph mutation through it.
///
/// Each public mutating call opens a fresh [`ScopeId`]. When
/// [`EngineConfig::queue_notifications`] is on, every entity the call writes
/// is queued as an [`UpdateNotice`] tagged with that scope, next to notices
/// external editors push through [`Engine::notify_update`].
/// [`Engine::process_notifications`] reconciles only the external ones, so a
/// write caused by reconciliation is never reconciled again.
#[derive(Debug)]
pub struct Engine<S: EntityStore> {
    store: S,
    config: EngineConfig,
    queue: VecDeque<UpdateNotice>,
    next_scope: u64,
}

impl<S: EntityStore> Engine<S> {
    /// Creates an engine with the default configuration.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    /// Creates an engine with the given configuration.
    #[must_use]
    pub fn with_config(store: S, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            queue: VecDeque::new(),
            next_scope: 0,
        }
    }

    /// Returns the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the store for direct edits.
    ///
    /// Relationship edits made here bypass the engine; report them with
    /// [`Engine::notify_update`].
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Consumes the engine, returning the store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replaces the configuration.
    pub fn set_config(&mut self, config: EngineConfig) {
        self.config = config;
    }

    fn open_scope(&mut self) -> ScopeId {
        self.next_scope += 1;
        ScopeId(self.next_scope)
    }

    fn close_scope(&mut self, scope: ScopeId, changes: &ChangeSet) {
        if !self.config.queue_notifications {
            return;
        }
        for id in changes.iter() {
            self.queue.push_back(UpdateNotice::consequence(id, scope));
        }
    }

    fn scoped<T>(
        &mut self,
        op: impl FnOnce(&mut S, &EngineConfig) -> Result<T>,
        changes_of: impl Fn(&T) -> &ChangeSet,
    ) -> Result<T> {
        let scope = self.open_scope();
        let result = op(&mut self.store, &self.config);
        if let Ok(value) = &result {
            let changes = changes_of(value).clone();
            self.close_scope(scope, &changes);
        }
        result
    }

    /// Creates an entity.
    ///
    /// Any relationship references in the draft's payload are established
    /// through the engine after the entity exists, so both sides end up
    /// linked.
    ///
    /// # Errors
    ///
    /// Returns an error if the store refuses the create.
    pub fn create(&mut self, draft: EntityDraft) -> Result<EntityId> {
        let _span = debug_span!("create", kind = %draft.kind(), name = %draft.name).entered();
        let kind = draft.kind();
        let wanted = draft.payload.clone();
        let id = self.store.create(draft.with_payload(Payload::empty(kind)))?;
        debug!(%id, "created");
        let empty = Payload::empty(kind);
        if wanted != empty {
            let outcome = self.reconcile(id, &empty, &wanted)?;
            for failure in &outcome.failures {
                warn!(%id, op = %failure.op, error = %failure.error, "initial link failed");
            }
        }
        Ok(id)
    }

    /// Links `b` into `a.field`. See [`link`].
    ///
    /// # Errors
    ///
    /// See [`link`].
    pub fn link(&mut self, a: EntityId, field: RelationField, b: EntityId) -> Result<ChangeSet> {
        let _span = debug_span!("link", %a, %field, %b).entered();
        self.scoped(|store, config| link(store, config, a, field, b), |c| c)
    }

    /// Unlinks `b` from `a.field`. See [`unlink`].
    ///
    /// # Errors
    ///
    /// See [`unlink`].
    pub fn unlink(&mut self, a: EntityId, field: RelationField, b: EntityId) -> Result<ChangeSet> {
        let _span = debug_span!("unlink", %a, %field, %b).entered();
        self.scoped(|store, config| unlink(store, config, a, field, b), |c| c)
    }

    /// Reconciles an edit of `entity`. See [`reconcile`].
    ///
    /// # Errors
    ///
    /// See [`reconcile`].
    pub fn reconcile(
        &mut self,
        entity: EntityId,
        before: &Payload,
        after: &Payload,
    ) -> Result<ReconcileOutcome> {
        let _span = debug_span!("reconcile", %entity).entered();
        self.scoped(
            |store, config| reconcile(store, config, entity, before, after),
            |outcome| &outcome.changes,
        )
    }

    /// Replaces the contents of one field, reconciling the difference.
    ///
    /// # Errors
    ///
    /// Returns an error if `entity` does not exist or does not own `field`.
    pub fn edit(
        &mut self,
        entity: EntityId,
        field: RelationField,
        targets: &[EntityId],
    ) -> Result<ReconcileOutcome> {
        let current = self
            .store
            .get(entity)
            .ok_or_else(|| Error::entity_not_found(entity))?;
        if current.kind() != field.owner() {
            return Err(Error::field_mismatch(entity, current.kind(), field.name()));
        }
        let mut after = current.payload.clone();
        after.assign(field, targets);
        self.reconcile(entity, &current.payload, &after)
    }

    /// Strips every reference to `target` without deleting it. See [`cascade_delete`].
    ///
    /// # Errors
    ///
    /// See [`cascade_delete`].
    pub fn cascade_delete(&mut self, target: EntityId) -> Result<CleanupReport> {
        self.scoped(
            |store, config| cascade_delete(store, config, target),
            |report| &report.changes,
        )
    }

    /// Strips every reference to an identifier whose entity is already gone.
    pub fn forget(&mut self, id: EntityId, kind: EntityKind) -> CleanupReport {
        let scope = self.open_scope();
        let report = strip_references(&mut self.store, &self.config, id, kind);
        self.close_scope(scope, &report.changes);
        report
    }

    /// Deletes an entity after stripping every reference to it.
    ///
    /// The delete happens even if some cleanup writes fail; the returned
    /// report lists them.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if `target` does not exist, or the store's
    /// error if the delete itself fails.
    pub fn delete(&mut self, target: EntityId) -> Result<CleanupReport> {
        let _span = info_span!("delete", %target).entered();
        let scope = self.open_scope();
        let mut report = cascade_delete(&mut self.store, &self.config, target)?;
        if !report.is_complete() {
            warn!(
                failed = report.failures.len(),
                "cleanup incomplete; deleting anyway"
            );
        }
        self.store.delete(target)?;
        report.changes.insert(target);
        info!(%target, written = report.changes.len(), "deleted");
        self.close_scope(scope, &report.changes);
        Ok(report)
    }

    /// Checks whether `candidate` may join `group`. See [`can_add_member`].
    ///
    /// # Errors
    ///
    /// See [`can_add_member`].
    pub fn can_add_member(
        &self,
        group: EntityId,
        candidate: EntityId,
    ) -> std::result::Result<(), MembershipRejection> {
        can_add_member(&self.store, group, candidate)
    }

    /// Adds `candidate` to `group` if the nesting guard allows it.
    ///
    /// # Errors
    ///
    /// Returns `MembershipRejected` with the guard's reason, or a store error.
    pub fn add_member(&mut self, group: EntityId, candidate: EntityId) -> Result<ChangeSet> {
        let _span = debug_span!("add_member", %group, %candidate).entered();
        if let Err(reason) = can_add_member(&self.store, group, candidate) {
            warn!(%reason, "membership rejected");
            return Err(reason.into());
        }
        self.scoped(
            |store, config| {
                let mut entity = store
                    .get(group)
                    .ok_or_else(|| Error::entity_not_found(group))?;
                let mut changes = ChangeSet::new();
                if entity.payload.insert(RelationField::GroupMembers, candidate) {
                    write_payload(store, config, group, entity.payload)?;
                    changes.insert(group);
                }
                Ok(changes)
            },
            |c| c,
        )
    }

    /// Removes `member` from `group`. Removing a non-member is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if `group` does not exist or is not a group.
    pub fn remove_member(&mut self, group: EntityId, member: EntityId) -> Result<ChangeSet> {
        self.unlink(group, RelationField::GroupMembers, member)
    }

    /// Lists every invariant the store currently breaks.
    #[must_use]
    pub fn invariant_violations(&self) -> Vec<InvariantViolation> {
        invariant_violations(&self.store)
    }

    /// Restores every graph invariant. See [`repair`].
    pub fn repair(&mut self) -> RepairReport {
        let scope = self.open_scope();
        let report = repair(&mut self.store, &self.config);
        self.close_scope(scope, &report.changes);
        report
    }

    /// Reports an edit made directly on the store.
    ///
    /// `before` is the entity's payload prior to the edit; the store already
    /// holds the new one. The edit is reconciled by the next call to
    /// [`Engine::process_notifications`].
    pub fn notify_update(&mut self, entity: EntityId, before: Payload) {
        self.queue.push_back(UpdateNotice::external(entity, before));
    }

    /// Number of notices waiting.
    #[must_use]
    pub fn pending_notifications(&self) -> usize {
        self.queue.len()
    }

    /// Drains the notification queue.
    ///
    /// External notices are reconciled against the store's current payload.
    /// Notices carrying a scope came from the engine's own writes and are
    /// dropped, including the ones queued while this call runs.
    pub fn process_notifications(&mut self) -> ProcessStats {
        let _span = debug_span!("process_notifications").entered();
        let mut stats = ProcessStats::default();
        while let Some(notice) = self.queue.pop_front() {
            let Some(before) = notice.before.filter(|_| notice.scope.is_none()) else {
                stats.suppressed += 1;
                continue;
            };
            let Some(current) = self.store.get(notice.entity) else {
                warn!(entity = %notice.entity, "notice for an entity that no longer exists");
                stats.stale += 1;
                continue;
            };
            match self.reconcile(notice.entity, &before, &current.payload) {
                Ok(outcome) => {
                    stats.reconciled += 1;
                    stats.changes.merge(outcome.changes);
                    stats.failures.extend(outcome.failures);
                }
                Err(error) => {
                    warn!(entity = %notice.entity, %error, "could not reconcile notice");
                    stats.stale += 1;
                }
            }
        }
        debug!(
            reconciled = stats.reconciled,
            suppressed = stats.suppressed,
            "notifications processed"
        );
        stats
    }
}
