//! Hand-maintained menu overrides.
//!
//! Some locations are known to carry the item even when their menu pages
//! say otherwise (or cannot be read). The table is loaded once, never
//! mutated, and consulted before any page is fetched.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{FinderError, Result};

/// Current table format version.
pub const OVERRIDE_TABLE_VERSION: u32 = 1;

/// Identifier → ground truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideTable {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    entries: HashMap<String, bool>,
}

fn default_version() -> u32 {
    OVERRIDE_TABLE_VERSION
}

impl Default for OverrideTable {
    fn default() -> Self {
        Self::empty()
    }
}

impl OverrideTable {
    /// No overrides at all.
    pub fn empty() -> Self {
        Self {
            version: OVERRIDE_TABLE_VERSION,
            entries: HashMap::new(),
        }
    }

    /// The entries shipped with the finder.
    pub fn builtin() -> Self {
        Self::from_entries([("018678", true)])
    }

    pub fn from_entries<K: Into<String>>(entries: impl IntoIterator<Item = (K, bool)>) -> Self {
        Self {
            version: OVERRIDE_TABLE_VERSION,
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Parse `{"version": 1, "entries": {"018678": true}}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a table from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| FinderError::OverrideTable {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// True only for identifiers explicitly marked positive.
    pub fn is_positive(&self, identifier: &str) -> bool {
        self.entries.get(identifier).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
