//! Normalized lookup keys for matching free-text labels against records.

use serde::{Deserialize, Serialize};

use crate::value_object::ValueObject;

/// A trimmed, case-folded identifying string (record name, SKU, or alias).
///
/// Construction is the only normalization point: every comparison between a
/// detector label and a stored identifier goes through `AliasKey`, so lookups are
/// insensitive to case and surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasKey(String);

impl AliasKey {
    /// Normalize a raw string. Returns `None` for strings that are blank after trimming.
    pub fn normalize(raw: &str) -> Option<Self> {
        let key = raw.trim().to_lowercase();
        if key.is_empty() {
            None
        } else {
            Some(Self(key))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for AliasKey {}

impl core::fmt::Display for AliasKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AliasKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
