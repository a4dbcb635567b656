//! # Filter Policy
//!
//! The configuration shared by every defensive decoder of a session: the
//! marker that tags mandatory fields and types, and whether a mandatory
//! collection that is empty after absent-entry removal invalidates its owner.
//!
//! ## Lifecycle
//!
//! The builder methods consume and return the policy, so the flag is decided
//! once during setup. After [`FilterPolicy::decoder`] hands the policy to a
//! [`DefensiveDecoder`] it sits behind an `Arc` and is read-only.

use std::sync::Arc;

use crate::codec::Codec;
use crate::decoder::DefensiveDecoder;
use crate::error::DefenseError;

/// Tag used when no marker is configured explicitly.
pub const DEFAULT_MARKER: &str = "mandatory";

/// Mandatory marker plus the collection-emptiness flag.
///
/// Discards empty collections by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPolicy {
    marker: String,
    discard_empty_collections: bool,
}

impl FilterPolicy {
    /// Create a policy keyed on `marker`.
    ///
    /// # Errors
    ///
    /// Returns `DefenseError::InvalidConfiguration` if the marker is empty or
    /// whitespace-only.
    pub fn new(marker: impl Into<String>) -> Result<Self, DefenseError> {
        let marker = marker.into();
        if marker.trim().is_empty() {
            return Err(DefenseError::InvalidConfiguration(
                "mandatory marker cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            marker,
            discard_empty_collections: true,
        })
    }

    /// Treat a mandatory collection with no entries as invalid.
    pub fn discard_empty_collections(mut self) -> Self {
        self.discard_empty_collections = true;
        self
    }

    /// Accept a mandatory collection with no entries (e.g. empty search results).
    pub fn retain_empty_collections(mut self) -> Self {
        self.discard_empty_collections = false;
        self
    }

    /// The tag identifying mandatory fields and class-level mandatory types.
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Returns true if empty mandatory collections invalidate their owner.
    pub fn discards_empty_collections(&self) -> bool {
        self.discard_empty_collections
    }

    /// Install this policy around `codec`, producing the session's decoder.
    pub fn decoder<C: Codec>(self, codec: C) -> DefensiveDecoder<C> {
        DefensiveDecoder::new(codec, Arc::new(self))
    }
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            discard_empty_collections: true,
        }
    }
}
