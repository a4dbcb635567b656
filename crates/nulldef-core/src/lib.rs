//! # nulldef-core: Defensive Decoding
//!
//! Decoding adapter that drops objects whose mandatory fields did not survive
//! deserialization. A serde codec materializes the value; the validation pass
//! then walks it bottom-up and nulls out, strips or rejects whatever breaks
//! the mandatory-field invariants. Callers see `Ok(None)` instead of a
//! half-populated value.
//!
//! ## Key Design Principles
//!
//! 1. **Descriptors, not reflection.** A type opts in by implementing
//!    [`Defend`], usually through [`defend!`]. Field order in the descriptor
//!    is the order checks run.
//!
//! 2. **Rejection is not an error.** A discarded value is `Ok(None)`. Errors
//!    are reserved for the codec and for bad configuration.
//!
//! 3. **Codec errors propagate unchanged.** [`DefensiveDecoder`] returns the
//!    wrapped [`Codec`]'s own error type.
//!
//! 4. **Immutable policy.** A [`FilterPolicy`] is fixed at construction and
//!    shared behind an `Arc`, so one decoder serves any number of threads.
//!
//! ## Crate Policy
//!
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod codec;
pub mod config;
pub mod decoder;
pub mod descriptor;
pub mod document;
pub mod error;
pub mod filter;
pub mod policy;

mod macros;

// Re-export primary types for ergonomic imports.
pub use codec::{Codec, Format, JsonCodec, YamlCodec};
pub use config::{EmptyCollections, PolicyConfig};
pub use decoder::DefensiveDecoder;
pub use descriptor::{
    CollectionSlot, Defend, Entries, Entry, Field, MapValues, ObjectSlot, Slot, Tags,
};
pub use document::{Document, DocumentSchema, FieldKind, FieldSchema, TypeSchema};
pub use error::DefenseError;
pub use filter::{RejectReason, Rejection, Verdict};
pub use policy::{FilterPolicy, DEFAULT_MARKER};
