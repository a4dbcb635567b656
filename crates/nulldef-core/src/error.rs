//! # Error Types
//!
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - A decoded instance that fails its mandatory-field checks is **not** an
//!   error. The decoder returns `Ok(None)` for it.
//! - Codec errors raised while materializing a value are propagated by the
//!   [`DefensiveDecoder`](crate::DefensiveDecoder) in the codec's own error
//!   type. [`DefenseError`] wraps them only where the format is chosen at
//!   runtime (see [`Format`](crate::Format)).
//! - Configuration errors are fatal at setup time.

use thiserror::Error;

/// Top-level error type for nulldef.
#[derive(Error, Debug)]
pub enum DefenseError {
    /// The policy or schema could not be built from the given settings.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A document was filtered as a type the schema does not declare.
    #[error("unknown type '{0}' in document schema")]
    UnknownType(String),

    /// A document root did not have the shape its declared type requires.
    #[error("document for type '{type_name}' must be an object, found {found}")]
    UnexpectedShape {
        /// Declared root type.
        type_name: String,
        /// JSON kind that was found instead.
        found: &'static str,
    },

    /// A configuration, schema, or input file could not be read or parsed.
    #[error("document load error for '{path}': {reason}")]
    DocumentLoad {
        /// Path of the file that failed to load.
        path: String,
        /// Reason the file could not be loaded.
        reason: String,
    },

    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML encoding or decoding failed.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
