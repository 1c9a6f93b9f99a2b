//! Session state for the REPL.
//!
//! A session owns the live store (behind an [`Engine`]), an archive store that
//! `export` and `import` copy to and from, and the paths both are saved to.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use codex_engine::{Engine, EngineConfig};
use codex_foundation::{EntityId, EntityKind};
use codex_storage::{Entity, EntityDraft, EntityStore, MemoryStore, RelationField};
use codex_transfer::{TransferConfig, export_subgraph, import_manifest};
use tracing::info;

use crate::command::{Command, CommandError, HELP, MemberAction};
use crate::serialize::{load_from_file, save_to_file};

/// Session state for an interactive or scripted run.
pub struct Session {
    /// The live store and its engine.
    engine: Engine<MemoryStore>,

    /// Batches copied out with `export`.
    archive: MemoryStore,

    /// Where `save` and `load` put the live store.
    store_path: Option<PathBuf>,

    /// Where `save` puts the archive.
    archive_path: Option<PathBuf>,

    /// Settings for `export` and `import`.
    transfer: TransferConfig,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(0, EngineConfig::default())
    }
}

impl Session {
    /// Creates a session with empty stores.
    #[must_use]
    pub fn new(seed: u64, config: EngineConfig) -> Self {
        Self {
            engine: Engine::with_config(MemoryStore::new(seed), config),
            archive: MemoryStore::new(seed.wrapping_add(1)),
            store_path: None,
            archive_path: None,
            transfer: TransferConfig::default(),
        }
    }

    /// Opens a session on store files, starting empty where a file does not
    /// exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read.
    pub fn open(
        store_path: Option<PathBuf>,
        archive_path: Option<PathBuf>,
        seed: u64,
        config: EngineConfig,
    ) -> Result<Self, CommandError> {
        let mut session = Self::new(seed, config);
        if let Some(path) = &store_path {
            if path.exists() {
                session.engine = Engine::with_config(load_from_file(path)?, config);
            }
        }
        if let Some(path) = &archive_path {
            if path.exists() {
                session.archive = load_from_file(path)?;
            }
        }
        session.store_path = store_path;
        session.archive_path = archive_path;
        Ok(session)
    }

    /// Returns the engine.
    #[must_use]
    pub fn engine(&self) -> &Engine<MemoryStore> {
        &self.engine
    }

    /// Returns the engine mutably.
    pub fn engine_mut(&mut self) -> &mut Engine<MemoryStore> {
        &mut self.engine
    }

    /// Returns the live store.
    #[must_use]
    pub fn store(&self) -> &MemoryStore {
        self.engine.store()
    }

    /// Returns the archive store.
    #[must_use]
    pub fn archive(&self) -> &MemoryStore {
        &self.archive
    }

    /// Sets the transfer settings used by `export` and `import`.
    pub fn set_transfer_config(&mut self, transfer: TransferConfig) {
        self.transfer = transfer;
    }

    /// Resolves an id or a unique name in the live store.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing matches or the name is shared.
    pub fn resolve(&self, word: &str) -> Result<EntityId, CommandError> {
        if let Ok(id) = EntityId::parse(word) {
            if self.store().contains(id) {
                return Ok(id);
            }
        }
        match self.store().find_by_name(word).as_slice() {
            [] => Err(CommandError::UnknownName(word.to_string())),
            [entity] => Ok(entity.id),
            many => Err(CommandError::AmbiguousName {
                name: word.to_string(),
                count: many.len(),
            }),
        }
    }

    fn resolve_all(&self, words: &[String]) -> Result<Vec<EntityId>, CommandError> {
        words.iter().map(|w| self.resolve(w)).collect()
    }

    fn field_of(&self, id: EntityId, name: &str) -> Result<RelationField, CommandError> {
        let kind = self
            .store()
            .kind_of(id)
            .ok_or_else(|| CommandError::UnknownName(id.to_string()))?;
        Ok(RelationField::lookup(kind, name)?)
    }

    /// Runs one command and returns the text to print.
    ///
    /// `quit` is the caller's business and prints nothing here.
    ///
    /// # Errors
    ///
    /// Returns an error if an argument does not resolve or the operation fails.
    pub fn execute(&mut self, command: Command) -> Result<String, CommandError> {
        match command {
            Command::New { kind, name } => {
                let id = self.engine.create(EntityDraft::new(kind, name.clone()))?;
                Ok(format!("created {kind} {name} [{id}]"))
            }
            Command::Link { a, field, b } => {
                let a = self.resolve(&a)?;
                let field = self.field_of(a, &field)?;
                let b = self.resolve(&b)?;
                let changes = self.engine.link(a, field, b)?;
                Ok(format!("linked ({} entities changed)", changes.len()))
            }
            Command::Unlink { a, field, b } => {
                let a = self.resolve(&a)?;
                let field = self.field_of(a, &field)?;
                let b = self.resolve(&b)?;
                let changes = self.engine.unlink(a, field, b)?;
                Ok(format!("unlinked ({} entities changed)", changes.len()))
            }
            Command::Edit {
                entity,
                field,
                targets,
            } => {
                let entity = self.resolve(&entity)?;
                let field = self.field_of(entity, &field)?;
                let targets = self.resolve_all(&targets)?;
                let outcome = self.engine.edit(entity, field, &targets)?;
                let mut out = format!(
                    "{} ops, {} entities changed",
                    outcome.ops.len(),
                    outcome.changes.len()
                );
                for failure in &outcome.failures {
                    let _ = write!(out, "\n  failed {}: {}", failure.op, failure.error);
                }
                Ok(out)
            }
            Command::Member {
                action,
                group,
                member,
            } => {
                let group = self.resolve(&group)?;
                let member = self.resolve(&member)?;
                let changes = match action {
                    MemberAction::Add => self.engine.add_member(group, member)?,
                    MemberAction::Remove => self.engine.remove_member(group, member)?,
                };
                Ok(format!("membership updated ({} entities changed)", changes.len()))
            }
            Command::Delete(entity) => {
                let id = self.resolve(&entity)?;
                let report = self.engine.delete(id)?;
                Ok(report.summary())
            }
            Command::Show(entity) => {
                let id = self.resolve(&entity)?;
                let entity = self
                    .store()
                    .get(id)
                    .ok_or_else(|| CommandError::UnknownName(entity.clone()))?;
                Ok(self.describe(&entity))
            }
            Command::List(kind) => Ok(self.list(kind)),
            Command::Check => {
                let violations = self.engine.invariant_violations();
                if violations.is_empty() {
                    return Ok("graph is consistent".to_string());
                }
                let lines: Vec<_> = violations.iter().map(|v| format!("  {v}")).collect();
                Ok(format!("{} violation(s):\n{}", violations.len(), lines.join("\n")))
            }
            Command::Repair => Ok(self.engine.repair().summary()),
            Command::Export { label, roots } => {
                let roots = self.resolve_all(&roots)?;
                let config = self.transfer.clone().with_manifest(label);
                let report =
                    export_subgraph(self.engine.store(), &roots, &mut self.archive, &config)?;
                Ok(report.summary())
            }
            Command::Import { label } => {
                let live = self.engine.store_mut();
                let report = import_manifest(&self.archive, &label, live, &self.transfer)?;
                Ok(report.summary())
            }
            Command::Save(path) => self.save(path.as_deref()),
            Command::Load(path) => self.load(path.as_deref()),
            Command::Help => Ok(HELP.to_string()),
            Command::Quit => Ok(String::new()),
        }
    }

    fn label(&self, id: EntityId) -> String {
        match self.store().get(id) {
            Some(entity) => format!("{} [{id}]", entity.name),
            None => format!("<missing> [{id}]"),
        }
    }

    fn describe(&self, entity: &Entity) -> String {
        let mut out = format!("{} {} [{}]", entity.kind(), entity.name, entity.id);
        if let Some(origin) = entity.origin {
            let _ = write!(out, "\n  origin: {origin}");
        }
        for field in RelationField::fields_for(entity.kind()) {
            let refs = entity.refs(field);
            if refs.is_empty() {
                continue;
            }
            let names: Vec<_> = refs.iter().map(|id| self.label(*id)).collect();
            let _ = write!(out, "\n  {}: {}", field.short_name(), names.join(", "));
        }
        if !entity.description.is_empty() {
            let _ = write!(out, "\n  description: {}", entity.description);
        }
        if !entity.notes.is_empty() {
            let _ = write!(out, "\n  notes: {}", entity.notes);
        }
        out
    }

    fn list(&self, kind: Option<EntityKind>) -> String {
        let lines: Vec<_> = self
            .store()
            .iter()
            .filter(|e| kind.is_none_or(|k| e.kind() == k))
            .map(|e| format!("  {:<8} {} {}", e.kind().as_str(), e.id, e.name))
            .collect();
        if lines.is_empty() {
            "no entities".to_string()
        } else {
            lines.join("\n")
        }
    }

    fn save(&mut self, path: Option<&Path>) -> Result<String, CommandError> {
        if let Some(path) = path {
            self.store_path = Some(path.to_path_buf());
        }
        let store_path = self.store_path.as_ref().ok_or(CommandError::NoStorePath)?;
        save_to_file(self.engine.store(), store_path)?;
        let mut out = format!(
            "saved {} entities to {}",
            self.store().len(),
            store_path.display()
        );
        if let Some(archive_path) = &self.archive_path {
            save_to_file(&self.archive, archive_path)?;
            let _ = write!(out, "\nsaved archive to {}", archive_path.display());
        }
        info!(path = %store_path.display(), "store saved");
        Ok(out)
    }

    fn load(&mut self, path: Option<&Path>) -> Result<String, CommandError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => self.store_path.clone().ok_or(CommandError::NoStorePath)?,
        };
        let store = load_from_file(&path)?;
        let config = *self.engine.config();
        self.engine = Engine::with_config(store, config);
        self.store_path = Some(path.clone());
        info!(path = %path.display(), "store loaded");
        Ok(format!("loaded {} entities from {}", self.store().len(), path.display()))
    }
}
