//! The line command language.
//!
//! One command per line. Arguments are separated by whitespace; double quotes
//! group words, so `link "Old Mill" npcs "Miller Tam"` names two entities.
//! Entities may be addressed by id or by unique name.

use std::path::PathBuf;

use codex_foundation::{EntityKind, Error};
use thiserror::Error as ThisError;

/// Summary printed by `help`.
pub const HELP: &str = "\
commands:
  new <kind> <name>                 create an entity (region, location, shop, npc, group)
  link <a> <field> <b>              link a to b through a's field
  unlink <a> <field> <b>            remove that link
  edit <entity> <field> <ids...>    replace a field's contents (reconciled)
  member add|remove <group> <id>    change group membership
  delete <entity>                   clean up references, then delete
  show <entity>                     print one entity
  list [kind]                       list entities
  check                             list broken graph invariants
  repair                            fix broken graph invariants
  export <label> <roots...>         copy a subgraph into the archive
  import <label>                    bring an archived batch back
  save [path]                       write the store (and archive) to disk
  load [path]                       read the store from disk
  help                              show this text
  quit                              leave";

/// Direction of a `member` command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberAction {
    /// Add a member.
    Add,
    /// Remove a member.
    Remove,
}

/// A parsed command. Entity arguments are unresolved names or ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `new <kind> <name>`
    New {
        /// Kind to create.
        kind: EntityKind,
        /// Display name.
        name: String,
    },
    /// `link <a> <field> <b>`
    Link {
        /// Holder.
        a: String,
        /// Field on the holder.
        field: String,
        /// Target.
        b: String,
    },
    /// `unlink <a> <field> <b>`
    Unlink {
        /// Holder.
        a: String,
        /// Field on the holder.
        field: String,
        /// Target.
        b: String,
    },
    /// `edit <entity> <field> <ids...>`
    Edit {
        /// Entity to edit.
        entity: String,
        /// Field to replace.
        field: String,
        /// New contents, possibly empty.
        targets: Vec<String>,
    },
    /// `member add|remove <group> <id>`
    Member {
        /// Add or remove.
        action: MemberAction,
        /// The group.
        group: String,
        /// The member.
        member: String,
    },
    /// `delete <entity>`
    Delete(String),
    /// `show <entity>`
    Show(String),
    /// `list [kind]`
    List(Option<EntityKind>),
    /// `check`
    Check,
    /// `repair`
    Repair,
    /// `export <label> <roots...>`
    Export {
        /// Manifest label.
        label: String,
        /// Root entities.
        roots: Vec<String>,
    },
    /// `import <label>`
    Import {
        /// Manifest label.
        label: String,
    },
    /// `save [path]`
    Save(Option<PathBuf>),
    /// `load [path]`
    Load(Option<PathBuf>),
    /// `help`
    Help,
    /// `quit`
    Quit,
}

/// Errors from parsing or running a command.
#[derive(Debug, ThisError)]
pub enum CommandError {
    /// The line was empty.
    #[error("empty command")]
    Empty,

    /// The first word is not a command.
    #[error("unknown command {0:?} (try `help`)")]
    UnknownCommand(String),

    /// Arguments do not fit the command.
    #[error("usage: {0}")]
    Usage(&'static str),

    /// Not an entity kind.
    #[error("unknown kind {0:?}")]
    UnknownKind(String),

    /// A double quote was opened and never closed.
    #[error("unterminated quote")]
    UnterminatedQuote,

    /// No entity has this id or name.
    #[error("no entity with id or name {0:?}")]
    UnknownName(String),

    /// Several entities share this name.
    #[error("{count} entities are named {name:?}; use an id")]
    AmbiguousName {
        /// The name.
        name: String,
        /// How many entities carry it.
        count: usize,
    },

    /// `save` or `load` without a path and none configured.
    #[error("no store file configured; pass a path")]
    NoStorePath,

    /// The operation itself failed.
    #[error(transparent)]
    Codex(#[from] Error),

    /// A script line failed.
    #[error("{location}: {source}")]
    Script {
        /// `file:line` of the failing command.
        location: String,
        /// What went wrong.
        #[source]
        source: Box<CommandError>,
    },
}

/// Splits a line into words, honouring double quotes.
///
/// # Errors
///
/// Returns [`CommandError::UnterminatedQuote`] if a quote is left open.
pub fn tokenize(line: &str) -> Result<Vec<String>, CommandError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut in_word = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if quoted {
        return Err(CommandError::UnterminatedQuote);
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

fn kind(word: &str) -> Result<EntityKind, CommandError> {
    word.parse()
        .map_err(|_| CommandError::UnknownKind(word.to_string()))
}

/// Parses one command line.
///
/// # Errors
///
/// Returns an error if the line is empty, names an unknown command, or has
/// the wrong arguments.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let words = tokenize(line)?;
    let Some((head, args)) = words.split_first() else {
        return Err(CommandError::Empty);
    };

    let command = match (head.to_ascii_lowercase().as_str(), args) {
        ("new", [k, name @ ..]) if !name.is_empty() => Command::New {
            kind: kind(k)?,
            name: name.join(" "),
        },
        ("new", _) => return Err(CommandError::Usage("new <kind> <name>")),
        ("link", [a, field, b]) => Command::Link {
            a: a.clone(),
            field: field.clone(),
            b: b.clone(),
        },
        ("link", _) => return Err(CommandError::Usage("link <a> <field> <b>")),
        ("unlink", [a, field, b]) => Command::Unlink {
            a: a.clone(),
            field: field.clone(),
            b: b.clone(),
        },
        ("unlink", _) => return Err(CommandError::Usage("unlink <a> <field> <b>")),
        ("edit", [entity, field, targets @ ..]) => Command::Edit {
            entity: entity.clone(),
            field: field.clone(),
            targets: targets.to_vec(),
        },
        ("edit", _) => return Err(CommandError::Usage("edit <entity> <field> <ids...>")),
        ("member", [action, group, member]) => {
            let action = match action.to_ascii_lowercase().as_str() {
                "add" => MemberAction::Add,
                "remove" => MemberAction::Remove,
                _ => return Err(CommandError::Usage("member add|remove <group> <id>")),
            };
            Command::Member {
                action,
                group: group.clone(),
                member: member.clone(),
            }
        }
        ("member", _) => return Err(CommandError::Usage("member add|remove <group> <id>")),
        ("delete", [entity]) => Command::Delete(entity.clone()),
        ("delete", _) => return Err(CommandError::Usage("delete <entity>")),
        ("show", [entity]) => Command::Show(entity.clone()),
        ("show", _) => return Err(CommandError::Usage("show <entity>")),
        ("list", []) => Command::List(None),
        ("list", [k]) => Command::List(Some(kind(k)?)),
        ("list", _) => return Err(CommandError::Usage("list [kind]")),
        ("check", []) => Command::Check,
        ("repair", []) => Command::Repair,
        ("export", [label, roots @ ..]) if !roots.is_empty() => Command::Export {
            label: label.clone(),
            roots: roots.to_vec(),
        },
        ("export", _) => return Err(CommandError::Usage("export <label> <roots...>")),
        ("import", [label]) => Command::Import {
            label: label.clone(),
        },
        ("import", _) => return Err(CommandError::Usage("import <label>")),
        ("save", []) => Command::Save(None),
        ("save", [path]) => Command::Save(Some(PathBuf::from(path))),
        ("load", []) => Command::Load(None),
        ("load", [path]) => Command::Load(Some(PathBuf::from(path))),
        ("help" | "?", _) => Command::Help,
        ("quit" | "exit", _) => Command::Quit,
        ("check" | "repair" | "save" | "load", _) => {
            return Err(CommandError::Usage("check | repair | save [path] | load [path]"));
        }
        _ => return Err(CommandError::UnknownCommand(head.clone())),
    };
    Ok(command)
}

/// Words offered by completion: commands, kinds and field names.
#[must_use]
pub fn vocabulary() -> Vec<String> {
    let commands = [
        "new", "link", "unlink", "edit", "member", "add", "remove", "delete", "show", "list",
        "check", "repair", "export", "import", "save", "load", "help", "quit",
    ];
    let mut words: Vec<String> = commands.iter().map(ToString::to_string).collect();
    words.extend(EntityKind::ALL.iter().map(ToString::to_string));
    for kind in EntityKind::ALL {
        for field in codex_storage::RelationField::fields_for(kind) {
            let name = field.short_name().to_string();
            if !words.contains(&name) {
                words.push(name);
            }
        }
    }
    words
}
