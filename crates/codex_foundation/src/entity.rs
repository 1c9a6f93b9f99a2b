//! Stable global entity identifiers.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, ErrorKind, Result};

/// Length of every entity identifier, in ASCII characters.
pub const ID_LEN: usize = 16;

/// Stable global identifier of a campaign entity.
///
/// Identifiers are exactly [`ID_LEN`] ASCII alphanumeric characters. They are
/// never reused by a store and survive serialization unchanged, which is what
/// lets export and import translate them through an identifier map.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct EntityId([u8; ID_LEN]);

impl EntityId {
    /// Parses an identifier from its textual form.
    ///
    /// # Errors
    ///
    /// Returns `InvalidId` if the text is not exactly [`ID_LEN`] ASCII
    /// alphanumeric characters.
    pub fn parse(text: &str) -> Result<Self> {
        let bytes = text.as_bytes();
        if bytes.len() != ID_LEN || !bytes.iter().all(u8::is_ascii_alphanumeric) {
            return Err(Error::new(ErrorKind::InvalidId(text.to_string())));
        }
        let mut raw = [0u8; ID_LEN];
        raw.copy_from_slice(bytes);
        Ok(Self(raw))
    }

    /// Builds an identifier from raw bytes, validating the alphabet.
    #[must_use]
    pub fn from_bytes(raw: [u8; ID_LEN]) -> Option<Self> {
        raw.iter()
            .all(u8::is_ascii_alphanumeric)
            .then_some(Self(raw))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Construction guarantees ASCII, so this never falls back.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl FromStr for EntityId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.as_str())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
mod serde_support {
    use super::EntityId;
    use serde::de::{self, Visitor};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::fmt;

    impl Serialize for EntityId {
        fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.serialize_str(self.as_str())
        }
    }

    impl<'de> Deserialize<'de> for EntityId {
        fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            struct IdVisitor;

            impl Visitor<'_> for IdVisitor {
                type Value = EntityId;

                fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                    formatter.write_str("a 16 character alphanumeric entity id")
                }

                fn visit_str<E>(self, value: &str) -> std::result::Result<EntityId, E>
                where
                    E: de::Error,
                {
                    EntityId::parse(value).map_err(E::custom)
                }
            }

            deserializer.deserialize_str(IdVisitor)
        }
    }
}
