//! Inline reference tokens in free text.
//!
//! Descriptions and notes may embed references as `@UUID[<id>]`, optionally
//! followed by a display label: `@UUID[<id>]{Old Mill}`. The identifier may
//! carry a document prefix, as in `@UUID[JournalEntry.<id>]`, which survives a
//! rewrite. Tokens whose target is not a well-formed entity identifier point
//! outside the graph and are never touched.

use codex_foundation::{EntityId, Error, Result};
use regex_lite::{Captures, Regex};

use crate::config::DanglingPolicy;
use crate::idmap::IdentifierMap;

const TOKEN_PATTERN: &str = r"@UUID\[(?:([A-Za-z]+)\.)?([^\]]+)\](?:\{([^}]*)\})?";

/// Result of rewriting one piece of text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rewritten {
    /// The rewritten text.
    pub text: String,
    /// Tokens translated through the map.
    pub rewritten: usize,
    /// Unmapped tokens left in place.
    pub kept: usize,
    /// Unmapped tokens collapsed to their label.
    pub dropped: usize,
}

impl Rewritten {
    /// Returns true if any token was translated or dropped.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.rewritten + self.dropped > 0
    }
}

/// Matcher for inline reference tokens.
#[derive(Clone, Debug)]
pub struct InlineReferences {
    pattern: Regex,
}

impl InlineReferences {
    /// Compiles the token pattern.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the pattern fails to compile.
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(TOKEN_PATTERN)
            .map_err(|e| Error::internal(format!("inline reference pattern: {e}")))?;
        Ok(Self { pattern })
    }

    /// Lists the entity identifiers referenced by `text`, in order of appearance.
    #[must_use]
    pub fn ids(&self, text: &str) -> Vec<EntityId> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(2))
            .filter_map(|m| EntityId::parse(m.as_str()).ok())
            .collect()
    }

    /// Rewrites every token in `text` through `map`.
    ///
    /// Mapped tokens keep their label. Unmapped tokens follow `policy`.
    #[must_use]
    pub fn rewrite(&self, text: &str, map: &IdentifierMap, policy: DanglingPolicy) -> Rewritten {
        let mut rewritten = 0;
        let mut kept = 0;
        let mut dropped = 0;
        let replaced = self.pattern.replace_all(text, |caps: &Captures<'_>| {
            let whole = caps.get(0).map_or("", |m| m.as_str());
            let Some(id) = caps.get(2).and_then(|m| EntityId::parse(m.as_str()).ok()) else {
                return whole.to_string();
            };
            let document = caps.get(1).map_or_else(String::new, |m| format!("{}.", m.as_str()));
            let label = caps.get(3).map(|m| m.as_str());
            match (map.lookup(id), policy) {
                (Some(new), _) => {
                    rewritten += 1;
                    match label {
                        Some(label) => format!("@UUID[{document}{new}]{{{label}}}"),
                        None => format!("@UUID[{document}{new}]"),
                    }
                }
                (None, DanglingPolicy::KeepExternal) => {
                    kept += 1;
                    whole.to_string()
                }
                (None, DanglingPolicy::NoDangling) => {
                    dropped += 1;
                    label.unwrap_or_default().to_string()
                }
            }
        });
        Rewritten {
            text: replaced.into_owned(),
            rewritten,
            kept,
            dropped,
        }
    }
}
