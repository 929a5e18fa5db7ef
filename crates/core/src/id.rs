//! Strongly-typed identifiers used across the domain.
//!
//! Variations and options exist in two states: freshly created in an editing
//! session (a [`DraftId`]) or loaded from / saved to the store (a
//! [`PersistedId`]). The distinction is carried in the type rather than in a
//! string prefix, so combination keys cannot silently mix the two.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};

/// Delimiter used to join option ids into a combination key.
pub const KEY_DELIMITER: char = '|';

/// Prefix drafts render with; reserved, so persisted ids never start with it.
pub const DRAFT_PREFIX: &str = "draft-";

/// Client-side identifier for an entity that has not been persisted yet.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftId(Uuid);

impl DraftId {
    /// Create a new identifier.
    ///
    /// Uses UUIDv7 (time-ordered), so ids are never reused within a session.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DraftId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for DraftId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for DraftId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl FromStr for DraftId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::from_str(s)
            .map_err(|e| DomainError::invalid_id(format!("DraftId: {e}")))?;
        Ok(Self(uuid))
    }
}

/// Identifier assigned by the persistence layer.
///
/// Never empty, never contains [`KEY_DELIMITER`] and never starts with
/// [`DRAFT_PREFIX`], so it can always take part in a combination key without
/// colliding with a draft.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PersistedId(String);

impl PersistedId {
    pub fn new(value: impl Into<String>) -> DomainResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::invalid_id("persisted id cannot be empty"));
        }
        if value.contains(KEY_DELIMITER) {
            return Err(DomainError::invalid_id(format!(
                "persisted id `{value}` contains the key delimiter `{KEY_DELIMITER}`"
            )));
        }
        if value.starts_with(DRAFT_PREFIX) {
            return Err(DomainError::invalid_id(format!(
                "persisted id `{value}` uses the reserved prefix `{DRAFT_PREFIX}`"
            )));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PersistedId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PersistedId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PersistedId> for String {
    fn from(value: PersistedId) -> Self {
        value.0
    }
}

macro_rules! impl_session_id {
    ($t:ident, $name:literal) => {
        #[doc = concat!("Identifier of a ", $name, ": persisted, or a draft created in this session.")]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $t {
            Persisted(PersistedId),
            Draft(DraftId),
        }

        impl $t {
            /// A fresh draft identifier.
            pub fn draft() -> Self {
                Self::Draft(DraftId::new())
            }

            /// Wrap an identifier issued by the store, validating it.
            pub fn persisted(value: impl Into<String>) -> DomainResult<Self> {
                PersistedId::new(value)
                    .map(Self::Persisted)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))
            }

            pub fn is_draft(&self) -> bool {
                matches!(self, Self::Draft(_))
            }

            pub fn as_draft(&self) -> Option<DraftId> {
                match self {
                    Self::Draft(id) => Some(*id),
                    Self::Persisted(_) => None,
                }
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                match self {
                    Self::Persisted(id) => core::fmt::Display::fmt(id, f),
                    Self::Draft(id) => write!(f, "{DRAFT_PREFIX}{id}"),
                }
            }
        }

        impl From<PersistedId> for $t {
            fn from(value: PersistedId) -> Self {
                Self::Persisted(value)
            }
        }

        impl From<DraftId> for $t {
            fn from(value: DraftId) -> Self {
                Self::Draft(value)
            }
        }
    };
}

impl_session_id!(VariationId, "variation");
impl_session_id!(OptionId, "option");

/// Identifier of a persisted price variant row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceVariantId(PersistedId);

impl PriceVariantId {
    pub fn new(value: impl Into<String>) -> DomainResult<Self> {
        PersistedId::new(value).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl core::fmt::Display for PriceVariantId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persisted_id_rejects_blank_and_delimiter() {
        assert!(matches!(PersistedId::new("  "), Err(DomainError::InvalidId(_))));
        assert!(matches!(PersistedId::new("a|b"), Err(DomainError::InvalidId(_))));
        assert!(matches!(PersistedId::new("draft-x"), Err(DomainError::InvalidId(_))));
        assert_eq!(PersistedId::new("opt_1").unwrap().as_str(), "opt_1");
    }

    #[test]
    fn persisted_id_cannot_impersonate_a_draft() {
        let draft = OptionId::draft();
        let err = OptionId::persisted(draft.to_string()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(_)));

        // Ids that merely contain the word are fine.
        assert!(OptionId::persisted("predraft-1").is_ok());
    }

    #[test]
    fn draft_ids_are_unique() {
        let a = OptionId::draft();
        let b = OptionId::draft();
        assert_ne!(a, b);
        assert!(a.is_draft());
    }

    #[test]
    fn display_renders_persisted_verbatim_and_drafts_prefixed() {
        let persisted = OptionId::persisted("clx9abc").unwrap();
        assert_eq!(persisted.to_string(), "clx9abc");

        let uuid = Uuid::nil();
        let draft = OptionId::Draft(DraftId::from_uuid(uuid));
        assert_eq!(draft.to_string(), format!("draft-{uuid}"));
    }

    #[test]
    fn persisted_and_draft_never_compare_equal() {
        let uuid = Uuid::now_v7();
        let draft = VariationId::Draft(DraftId::from_uuid(uuid));
        let persisted = VariationId::persisted(uuid.to_string()).unwrap();
        assert_ne!(draft, persisted);
    }

    #[test]
    fn deserializing_invalid_persisted_id_fails() {
        let ok: OptionId = serde_json::from_str(r#"{"persisted":"opt-1"}"#).unwrap();
        assert_eq!(ok, OptionId::persisted("opt-1").unwrap());

        let bad = serde_json::from_str::<OptionId>(r#"{"persisted":"a|b"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn draft_id_parses_from_uuid_string() {
        let id = DraftId::new();
        let parsed: DraftId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<DraftId>().is_err());
    }
}
