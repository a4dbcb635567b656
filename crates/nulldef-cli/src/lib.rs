//! # nulldef-cli: Command-Line Filtering
//!
//! Provides the `nulldef` command-line interface over the document mode of
//! `nulldef-core`: a JSON or YAML document is filtered against a schema file
//! describing which fields are mandatory.
//!
//! ## Subcommands
//!
//! - `nulldef filter`: print the filtered document, or `null` if the root
//!   was discarded.
//! - `nulldef check`: print nothing; exit 0 if the root survives, 2 if not.
//!
//! ```bash
//! nulldef filter --schema family.schema.yaml --root Parent family.json
//! nulldef check --schema family.schema.yaml --root Parent --retain-empty family.yaml
//! ```

pub mod filter;
