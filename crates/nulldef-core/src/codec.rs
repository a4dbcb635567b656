//! # Codecs
//!
//! The underlying decoder/encoder consumed by [`DefensiveDecoder`]. A codec
//! turns raw bytes into `Option<T>` (a literal null document decodes to
//! `None`) and back. It knows nothing about mandatory fields.
//!
//! [`JsonCodec`] and [`YamlCodec`] keep their native error types so the
//! defensive layer can propagate them unchanged. [`Format`] picks one at
//! runtime, e.g. from a file extension, and reports through [`DefenseError`].
//!
//! [`DefensiveDecoder`]: crate::DefensiveDecoder

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::DefenseError;

/// Decode raw input into `T` and encode `T` into raw output.
pub trait Codec {
    /// Error raised by the underlying format.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Materialize a value. A null document yields `Ok(None)`.
    fn decode<T: DeserializeOwned>(&self, source: &[u8]) -> Result<Option<T>, Self::Error>;

    /// Serialize a value.
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, Self::Error>;
}

/// JSON via `serde_json`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    /// Compact output.
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Pretty-printed output.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Codec for JsonCodec {
    type Error = serde_json::Error;

    fn decode<T: DeserializeOwned>(&self, source: &[u8]) -> Result<Option<T>, Self::Error> {
        serde_json::from_slice(source)
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, Self::Error> {
        if self.pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        }
    }
}

/// YAML via `serde_yaml`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct YamlCodec;

impl Codec for YamlCodec {
    type Error = serde_yaml::Error;

    fn decode<T: DeserializeOwned>(&self, source: &[u8]) -> Result<Option<T>, Self::Error> {
        serde_yaml::from_slice(source)
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, Self::Error> {
        serde_yaml::to_string(value).map(String::into_bytes)
    }
}

/// Interchange format chosen at runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// JSON, pretty-printed on output.
    #[default]
    Json,
    /// YAML.
    Yaml,
}

impl Format {
    /// `.yaml`/`.yml` files are YAML; everything else is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
            "yaml" | "yml" => Format::Yaml,
            _ => Format::Json,
        }
    }
}

impl Codec for Format {
    type Error = DefenseError;

    fn decode<T: DeserializeOwned>(&self, source: &[u8]) -> Result<Option<T>, Self::Error> {
        match self {
            Format::Json => Ok(JsonCodec::pretty().decode(source)?),
            Format::Yaml => Ok(YamlCodec.decode(source)?),
        }
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, Self::Error> {
        match self {
            Format::Json => Ok(JsonCodec::pretty().encode(value)?),
            Format::Yaml => Ok(YamlCodec.encode(value)?),
        }
    }
}

/// Read and parse a configuration or schema file, choosing the format from
/// its extension.
///
/// # Errors
///
/// Returns `DefenseError::DocumentLoad` if the file cannot be read, cannot be
/// parsed, or holds a null document.
pub(crate) fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T, DefenseError> {
    let load_error = |reason: String| DefenseError::DocumentLoad {
        path: path.display().to_string(),
        reason,
    };

    let content =
        std::fs::read(path).map_err(|e| load_error(format!("cannot read file: {e}")))?;

    let format = Format::from_path(path);
    let parsed = match format {
        Format::Yaml => YamlCodec
            .decode(&content)
            .map_err(|e| load_error(format!("invalid YAML: {e}")))?,
        Format::Json => JsonCodec::new()
            .decode(&content)
            .map_err(|e| load_error(format!("invalid JSON: {e}")))?,
    };

    parsed.ok_or_else(|| load_error("document is empty".to_string()))
}
