//! Transfer configuration.

/// What to do with a reference whose target was not part of the transfer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DanglingPolicy {
    /// Leave the identifier as it was. It may point at nothing in the target.
    #[default]
    KeepExternal,
    /// Remove it. One-valued fields become empty and inline tokens collapse
    /// to their label.
    NoDangling,
}

/// How an import treats an archived entity that already has a live counterpart.
///
/// Counterparts are found by correlation key: the archived entity's `origin`,
/// or its own id when it has none.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// Map onto the live entity and leave it untouched.
    #[default]
    Skip,
    /// Replace the live entity's content, keeping its id.
    Overwrite,
    /// Always create a fresh copy.
    CreateNew,
}

/// Configuration for export and import.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferConfig {
    /// Policy for references that leave the transferred set.
    pub dangling: DanglingPolicy,
    /// Policy for archived entities that already exist in the live store.
    pub merge: MergePolicy,
    /// Rewrite inline reference tokens in description and notes.
    pub rewrite_text: bool,
    /// Treat inline reference tokens as edges during closure traversal.
    pub follow_text_references: bool,
    /// Record a manifest under this label in the target store.
    pub record_manifest: Option<String>,
    /// Run a repair pass on the target store after an import.
    pub repair_after_import: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            dangling: DanglingPolicy::KeepExternal,
            merge: MergePolicy::Skip,
            rewrite_text: true,
            follow_text_references: false,
            record_manifest: None,
            repair_after_import: false,
        }
    }
}

impl TransferConfig {
    /// Creates a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset for archiving: records a manifest and keeps the copy self-contained.
    #[must_use]
    pub fn archive(label: impl Into<String>) -> Self {
        Self {
            dangling: DanglingPolicy::NoDangling,
            follow_text_references: true,
            record_manifest: Some(label.into()),
            ..Self::default()
        }
    }

    /// Preset for restoring a batch over live data.
    #[must_use]
    pub fn restore() -> Self {
        Self {
            merge: MergePolicy::Overwrite,
            repair_after_import: true,
            ..Self::default()
        }
    }

    /// Sets the dangling reference policy.
    #[must_use]
    pub fn with_dangling(mut self, dangling: DanglingPolicy) -> Self {
        self.dangling = dangling;
        self
    }

    /// Sets the merge policy.
    #[must_use]
    pub fn with_merge(mut self, merge: MergePolicy) -> Self {
        self.merge = merge;
        self
    }

    /// Sets whether inline tokens are rewritten.
    #[must_use]
    pub fn with_rewrite_text(mut self, rewrite: bool) -> Self {
        self.rewrite_text = rewrite;
        self
    }

    /// Sets whether inline tokens are followed during traversal.
    #[must_use]
    pub fn with_follow_text_references(mut self, follow: bool) -> Self {
        self.follow_text_references = follow;
        self
    }

    /// Records a manifest under `label`.
    #[must_use]
    pub fn with_manifest(mut self, label: impl Into<String>) -> Self {
        self.record_manifest = Some(label.into());
        self
    }

    /// Sets whether imports end with a repair pass.
    #[must_use]
    pub fn with_repair_after_import(mut self, repair: bool) -> Self {
        self.repair_after_import = repair;
        self
    }
}
