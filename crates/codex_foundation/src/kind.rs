//! The closed set of campaign entity kinds.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind, Result};

/// Kind of a campaign entity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EntityKind {
    /// A geographic region grouping locations.
    Region,
    /// A place: a town, a dungeon, a mill.
    Location,
    /// A shop, optionally situated in one location.
    Shop,
    /// A non-player character.
    Npc,
    /// A recursively nestable collection of any entities.
    Group,
}

impl EntityKind {
    /// Every kind, in schema order.
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Region,
        EntityKind::Location,
        EntityKind::Shop,
        EntityKind::Npc,
        EntityKind::Group,
    ];

    /// Returns the lowercase name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Region => "region",
            Self::Location => "location",
            Self::Shop => "shop",
            Self::Npc => "npc",
            Self::Group => "group",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::new(ErrorKind::Internal(format!("unknown entity kind: {s}"))))
    }
}
