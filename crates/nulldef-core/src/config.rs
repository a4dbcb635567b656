//! # Policy Configuration
//!
//! File-backed settings for a [`FilterPolicy`]:
//!
//! ```yaml
//! marker: mandatory
//! empty_collections: retain   # or: discard (default)
//! ```
//!
//! Files ending in `.yaml`/`.yml` are read as YAML, everything else as JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::codec::load_file;
use crate::error::DefenseError;
use crate::policy::{FilterPolicy, DEFAULT_MARKER};

/// What an empty mandatory collection means.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyCollections {
    /// Empty collections invalidate their owner.
    #[default]
    Discard,
    /// Empty collections are accepted.
    Retain,
}

/// Serializable form of a [`FilterPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// Tag that marks mandatory fields and types.
    pub marker: String,
    /// Treatment of empty mandatory collections.
    pub empty_collections: EmptyCollections,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            empty_collections: EmptyCollections::Discard,
        }
    }
}

impl PolicyConfig {
    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `DefenseError::DocumentLoad` if the file cannot be read or
    /// parsed, including unknown keys.
    pub fn load(path: &Path) -> Result<Self, DefenseError> {
        let config: Self = load_file(path)?;
        tracing::debug!(
            path = %path.display(),
            marker = %config.marker,
            empty_collections = ?config.empty_collections,
            "loaded policy configuration"
        );
        Ok(config)
    }

    /// Build the policy.
    ///
    /// # Errors
    ///
    /// Returns `DefenseError::InvalidConfiguration` if the marker is empty.
    pub fn into_policy(self) -> Result<FilterPolicy, DefenseError> {
        let policy = FilterPolicy::new(self.marker)?;
        Ok(match self.empty_collections {
            EmptyCollections::Discard => policy.discard_empty_collections(),
            EmptyCollections::Retain => policy.retain_empty_collections(),
        })
    }
}

impl TryFrom<PolicyConfig> for FilterPolicy {
    type Error = DefenseError;

    fn try_from(config: PolicyConfig) -> Result<Self, Self::Error> {
        config.into_policy()
    }
}
