//! # Validation Pass
//!
//! Enforces mandatory-field invariants on a materialized value.
//!
//! ## Algorithm
//!
//! 1. Nested values are inspected first, field by field in declared order.
//!    A rejected nullable object becomes `None`; a rejected collection entry
//!    becomes absent, or is removed when its type cannot be absent. Map values
//!    are treated like collection entries. A rejected embedded object rejects
//!    the owner with [`RejectReason::InvalidNested`].
//! 2. Mandatory checks run in declared order. A field is checked when the type
//!    carries the policy marker or the field does. Primitive slots are never
//!    checked. The first failing field short-circuits:
//!    - absent value → [`RejectReason::Absent`];
//!    - checked collection: absent entries are stripped in place, then an
//!      empty collection → [`RejectReason::EmptyCollection`] unless the policy
//!      retains empty collections;
//!    - unreadable field → [`RejectReason::Inaccessible`], logged at `warn`.
//!
//! Unchecked collections keep their absent entries. Rejection is a normal
//! outcome, not an error.

use std::fmt;

use crate::descriptor::{Defend, Field, Slot};
use crate::policy::FilterPolicy;

/// Outcome of the pass on one value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Verdict {
    /// Every mandatory field holds.
    Accepted,
    /// The first mandatory field that failed.
    Rejected(Rejection),
}

impl Verdict {
    /// Returns true if the value was accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }

    /// The rejection, if any.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Verdict::Accepted => None,
            Verdict::Rejected(rejection) => Some(rejection),
        }
    }
}

/// Why a value was discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Type of the discarded value.
    pub type_name: String,
    /// Field that failed its check.
    pub field: String,
    /// Which check failed.
    pub reason: RejectReason,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}: {}", self.type_name, self.field, self.reason)
    }
}

/// The check a rejected field failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The field resolved to absent.
    Absent,
    /// The collection had no entries once absent entries were removed.
    EmptyCollection,
    /// The field could not be read.
    Inaccessible(String),
    /// A nested value that cannot be absent failed its own checks.
    InvalidNested,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Absent => write!(f, "mandatory field is absent"),
            RejectReason::EmptyCollection => write!(f, "mandatory collection is empty"),
            RejectReason::Inaccessible(reason) => write!(f, "field could not be read: {reason}"),
            RejectReason::InvalidNested => write!(f, "nested value is invalid"),
        }
    }
}

impl FilterPolicy {
    /// Run the pass on `value`.
    ///
    /// Mutates only what the pass owns: rejected nested values are replaced
    /// with absent (or dropped from collections) and absent entries are
    /// removed from checked collections.
    pub fn inspect<T: Defend + ?Sized>(&self, value: &mut T) -> Verdict {
        let class_level = value.type_tags().contains(self.marker());
        let failure = {
            let mut fields = value.fields();
            self.examine(&mut fields, class_level)
        };
        match failure {
            None => Verdict::Accepted,
            Some((field, reason)) => Verdict::Rejected(Rejection {
                type_name: value.type_name().to_string(),
                field,
                reason,
            }),
        }
    }

    /// Run the pass on an owned value, returning it only if accepted.
    pub fn filter<T: Defend>(&self, mut value: T) -> Option<T> {
        match self.inspect(&mut value) {
            Verdict::Accepted => Some(value),
            Verdict::Rejected(rejection) => {
                tracing::debug!(%rejection, "discarding value");
                None
            }
        }
    }

    fn examine(
        &self,
        fields: &mut [Field<'_>],
        class_level: bool,
    ) -> Option<(String, RejectReason)> {
        for field in fields.iter_mut() {
            if !field.slot.defend_nested(self) {
                return Some((field.name.to_string(), RejectReason::InvalidNested));
            }
        }

        for field in fields.iter_mut() {
            if !class_level && !field.tags.contains(self.marker()) {
                continue;
            }
            let failed = match &mut field.slot {
                Slot::Primitive => None,
                Slot::Value { present } => (!*present).then_some(RejectReason::Absent),
                Slot::Object(object) => (!object.is_present()).then_some(RejectReason::Absent),
                Slot::Collection(collection) => {
                    if collection.is_present() {
                        collection.strip_absent();
                        (self.discards_empty_collections() && collection.is_empty())
                            .then_some(RejectReason::EmptyCollection)
                    } else {
                        Some(RejectReason::Absent)
                    }
                }
                Slot::Inaccessible { reason } => {
                    tracing::warn!(
                        field = field.name,
                        %reason,
                        "field could not be read; treating it as absent"
                    );
                    Some(RejectReason::Inaccessible(reason.clone()))
                }
            };
            if let Some(reason) = failed {
                return Some((field.name.to_string(), reason));
            }
        }
        None
    }
}

/// Run the pass on a nested value. Returns false if it was rejected.
///
/// Used by descriptors for nested objects and collection entries.
pub fn defend_nested<T: Defend + ?Sized>(value: &mut T, policy: &FilterPolicy) -> bool {
    match policy.inspect(value) {
        Verdict::Accepted => true,
        Verdict::Rejected(rejection) => {
            tracing::trace!(%rejection, "nested value invalidated");
            false
        }
    }
}
