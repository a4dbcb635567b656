//! # Field Descriptors
//!
//! Compile-time description of the fields of a decoded type. A type that
//! implements [`Defend`] lists its declared fields in order, each with its
//! tag set and a [`Slot`] giving access to the current value.
//!
//! ## Slot Kinds
//!
//! | Rust field type            | Constructor                   | Checked for         |
//! |----------------------------|-------------------------------|---------------------|
//! | `u32`, `bool`, `String`    | [`Slot::primitive`]           | never               |
//! | `Option<T>` (scalar)       | [`Slot::value`]               | absence             |
//! | `Option<T: Defend>`        | [`Slot::object`]              | absence             |
//! | `T: Defend`                | [`Slot::embedded`]            | never absent        |
//! | `Vec<T>`, sets, deques     | [`Slot::collection`]          | emptiness           |
//! | `Option<Vec<T>>`, …        | [`Slot::nullable_collection`] | absence, emptiness  |
//! | `BTreeMap<K, V>`, `HashMap` | [`Slot::map`]                 | never absent        |
//! | `Option<BTreeMap<K, V>>`, … | [`Slot::nullable_map`]        | absence             |
//!
//! Types that cannot represent absence are exempt from the mandatory check.
//! Map values are inspected like collection entries, but a mandatory map is
//! only checked for absence: an empty map is valid.
//! A nullable number (`Option<i64>`) is a [`Slot::value`] and is checked like
//! any other nullable field.
//!
//! Nested objects and collection entries are themselves inspected before the
//! owner's mandatory checks run, which is what makes the pass bottom-up.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;

use crate::filter::defend_nested;
use crate::policy::FilterPolicy;

/// A decoded type whose fields can be inspected by the filtering pass.
///
/// Usually generated with [`defend!`](crate::defend); hand-written impls
/// must list fields in a stable, declared order.
pub trait Defend {
    /// Name used in rejections and diagnostics.
    fn type_name(&self) -> &str;

    /// Type-level tags. A type tagged with the policy marker has every field
    /// treated as mandatory.
    fn type_tags(&self) -> Tags<'_> {
        Tags::NONE
    }

    /// Declared fields, in declaration order.
    fn fields(&mut self) -> Vec<Field<'_>>;
}

/// Tag set attached to a field or a type.
#[derive(Debug, Clone, Copy)]
pub enum Tags<'a> {
    /// Tags known at compile time.
    Static(&'static [&'static str]),
    /// Tags loaded at runtime (see [`DocumentSchema`](crate::DocumentSchema)).
    Owned(&'a [String]),
}

impl Tags<'static> {
    /// The empty tag set.
    pub const NONE: Self = Tags::Static(&[]);
}

impl Tags<'_> {
    /// Returns true if the set contains `tag`.
    pub fn contains(&self, tag: &str) -> bool {
        match self {
            Tags::Static(tags) => tags.iter().any(|t| *t == tag),
            Tags::Owned(tags) => tags.iter().any(|t| t == tag),
        }
    }
}

/// One declared field of a [`Defend`] type.
pub struct Field<'a> {
    /// Field name as declared.
    pub name: &'a str,
    /// Tags carried by the field.
    pub tags: Tags<'a>,
    /// Access to the field's current value.
    pub slot: Slot<'a>,
}

impl<'a> Field<'a> {
    /// Describe a field.
    pub fn new(name: &'a str, tags: Tags<'a>, slot: Slot<'a>) -> Self {
        Self { name, tags, slot }
    }
}

/// Access to a field's value, classified by what the pass may do with it.
pub enum Slot<'a> {
    /// The type cannot represent absence; exempt from mandatory checks.
    Primitive,
    /// Nullable scalar.
    Value {
        /// Whether the value is present.
        present: bool,
    },
    /// Nested composite value.
    Object(Box<dyn ObjectSlot + 'a>),
    /// Sequence or set of entries.
    Collection(Box<dyn CollectionSlot + 'a>),
    /// The descriptor could not read the field. Treated as absent.
    Inaccessible {
        /// Why the field could not be read.
        reason: String,
    },
}

impl<'a> Slot<'a> {
    /// Field whose type cannot be absent.
    pub fn primitive<T: ?Sized>(_value: &'a mut T) -> Self {
        Slot::Primitive
    }

    /// Nullable scalar field.
    pub fn value<T>(value: &'a mut Option<T>) -> Self {
        Slot::Value {
            present: value.is_some(),
        }
    }

    /// Nullable nested object. Set to `None` when the nested value is rejected.
    pub fn object<T: Defend>(value: &'a mut Option<T>) -> Self {
        Slot::Object(Box::new(NullableObject(value)))
    }

    /// Non-nullable nested object. A rejected nested value cannot be replaced
    /// with absent, so it rejects the owner.
    pub fn embedded<T: Defend>(value: &'a mut T) -> Self {
        Slot::Object(Box::new(EmbeddedObject(value)))
    }

    /// Collection field that is always present.
    pub fn collection<C: Entries>(value: &'a mut C) -> Self {
        Slot::Collection(Box::new(PresentCollection(value)))
    }

    /// Collection field that may itself be absent.
    pub fn nullable_collection<C: Entries>(value: &'a mut Option<C>) -> Self {
        Slot::Collection(Box::new(NullableCollection(value)))
    }

    /// Map field that is always present. Rejected values become absent, or
    /// their key is removed when the value type cannot be absent.
    pub fn map<M: MapValues>(value: &'a mut M) -> Self {
        Slot::Object(Box::new(PresentMap(value)))
    }

    /// Map field that may itself be absent.
    pub fn nullable_map<M: MapValues>(value: &'a mut Option<M>) -> Self {
        Slot::Object(Box::new(NullableMap(value)))
    }

    /// Field that could not be read.
    pub fn inaccessible(reason: impl Into<String>) -> Self {
        Slot::Inaccessible {
            reason: reason.into(),
        }
    }

    /// Inspect nested values. Returns false if a nested value was rejected
    /// and this slot cannot hold an absent value in its place.
    pub(crate) fn defend_nested(&mut self, policy: &FilterPolicy) -> bool {
        match self {
            Slot::Object(object) => object.defend(policy),
            Slot::Collection(collection) => {
                collection.defend_entries(policy);
                true
            }
            Slot::Primitive | Slot::Value { .. } | Slot::Inaccessible { .. } => true,
        }
    }
}

/// A nested composite field.
pub trait ObjectSlot {
    /// Whether the field holds a value.
    fn is_present(&self) -> bool;

    /// Run the pass on the nested value, replacing it with absent when
    /// rejected. Returns false if it was rejected and cannot be absent.
    fn defend(&mut self, policy: &FilterPolicy) -> bool;
}

/// A collection field.
pub trait CollectionSlot {
    /// Whether the collection itself is present.
    fn is_present(&self) -> bool;

    /// Run the pass on every entry. Rejected entries become absent, or are
    /// removed when the entry type cannot be absent.
    fn defend_entries(&mut self, policy: &FilterPolicy);

    /// Remove absent entries in place, returning how many were removed.
    fn strip_absent(&mut self) -> usize;

    /// Whether the collection has no entries. An absent collection is empty.
    fn is_empty(&self) -> bool;
}

struct NullableObject<'a, T>(&'a mut Option<T>);

impl<T: Defend> ObjectSlot for NullableObject<'_, T> {
    fn is_present(&self) -> bool {
        self.0.is_some()
    }

    fn defend(&mut self, policy: &FilterPolicy) -> bool {
        let rejected = match self.0.as_mut() {
            Some(inner) => !defend_nested(inner, policy),
            None => false,
        };
        if rejected {
            *self.0 = None;
        }
        true
    }
}

struct EmbeddedObject<'a, T>(&'a mut T);

impl<T: Defend> ObjectSlot for EmbeddedObject<'_, T> {
    fn is_present(&self) -> bool {
        true
    }

    fn defend(&mut self, policy: &FilterPolicy) -> bool {
        defend_nested(&mut *self.0, policy)
    }
}

struct PresentMap<'a, M>(&'a mut M);

impl<M: MapValues> ObjectSlot for PresentMap<'_, M> {
    fn is_present(&self) -> bool {
        true
    }

    fn defend(&mut self, policy: &FilterPolicy) -> bool {
        self.0.defend_values(policy);
        true
    }
}

struct NullableMap<'a, M>(&'a mut Option<M>);

impl<M: MapValues> ObjectSlot for NullableMap<'_, M> {
    fn is_present(&self) -> bool {
        self.0.is_some()
    }

    fn defend(&mut self, policy: &FilterPolicy) -> bool {
        if let Some(map) = self.0.as_mut() {
            map.defend_values(policy);
        }
        true
    }
}

struct PresentCollection<'a, C>(&'a mut C);

impl<C: Entries> CollectionSlot for PresentCollection<'_, C> {
    fn is_present(&self) -> bool {
        true
    }

    fn defend_entries(&mut self, policy: &FilterPolicy) {
        self.0.defend_entries(policy);
    }

    fn strip_absent(&mut self) -> usize {
        self.0.strip_absent()
    }

    fn is_empty(&self) -> bool {
        self.0.entry_count() == 0
    }
}

struct NullableCollection<'a, C>(&'a mut Option<C>);

impl<C: Entries> CollectionSlot for NullableCollection<'_, C> {
    fn is_present(&self) -> bool {
        self.0.is_some()
    }

    fn defend_entries(&mut self, policy: &FilterPolicy) {
        if let Some(entries) = self.0.as_mut() {
            entries.defend_entries(policy);
        }
    }

    fn strip_absent(&mut self) -> usize {
        self.0.as_mut().map_or(0, Entries::strip_absent)
    }

    fn is_empty(&self) -> bool {
        self.0.as_ref().map_or(true, |entries| entries.entry_count() == 0)
    }
}

/// An entry of a collection field.
///
/// Scalars use the default methods. Composite types get an impl from
/// [`defend!`](crate::defend) that runs the pass on the entry.
pub trait Entry {
    /// Run the pass on the entry. Returns false when the entry was rejected
    /// and must be removed because it cannot hold an absent value.
    fn defend_entry(&mut self, _policy: &FilterPolicy) -> bool {
        true
    }

    /// Whether the entry is absent.
    fn is_absent(&self) -> bool {
        false
    }
}

impl<T: Entry> Entry for Option<T> {
    fn defend_entry(&mut self, policy: &FilterPolicy) -> bool {
        let rejected = match self {
            Some(inner) => !inner.defend_entry(policy),
            None => false,
        };
        if rejected {
            *self = None;
        }
        true
    }

    fn is_absent(&self) -> bool {
        self.is_none()
    }
}

impl<T: Entry> Entry for Box<T> {
    fn defend_entry(&mut self, policy: &FilterPolicy) -> bool {
        (**self).defend_entry(policy)
    }

    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }
}

impl<T: Defend + ?Sized> Defend for Box<T> {
    fn type_name(&self) -> &str {
        (**self).type_name()
    }

    fn type_tags(&self) -> Tags<'_> {
        (**self).type_tags()
    }

    fn fields(&mut self) -> Vec<Field<'_>> {
        (**self).fields()
    }
}

impl Entry for serde_json::Value {
    fn is_absent(&self) -> bool {
        self.is_null()
    }
}

macro_rules! impl_scalar_entry {
    ($($ty:ty),* $(,)?) => {
        $(impl Entry for $ty {})*
    };
}

impl_scalar_entry!(
    String, bool, char, f32, f64, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128,
    usize,
);

/// A collection type usable as a collection field.
pub trait Entries {
    /// Run the pass on every entry, dropping entries that were rejected and
    /// cannot be absent.
    fn defend_entries(&mut self, policy: &FilterPolicy);

    /// Remove absent entries, returning how many were removed.
    fn strip_absent(&mut self) -> usize;

    /// Number of entries.
    fn entry_count(&self) -> usize;
}

impl<T: Entry> Entries for Vec<T> {
    fn defend_entries(&mut self, policy: &FilterPolicy) {
        self.retain_mut(|entry| entry.defend_entry(policy));
    }

    fn strip_absent(&mut self) -> usize {
        let before = self.len();
        self.retain(|entry| !entry.is_absent());
        before - self.len()
    }

    fn entry_count(&self) -> usize {
        self.len()
    }
}

impl<T: Entry> Entries for VecDeque<T> {
    fn defend_entries(&mut self, policy: &FilterPolicy) {
        self.retain_mut(|entry| entry.defend_entry(policy));
    }

    fn strip_absent(&mut self) -> usize {
        let before = self.len();
        self.retain(|entry| !entry.is_absent());
        before - self.len()
    }

    fn entry_count(&self) -> usize {
        self.len()
    }
}

// Set entries are immutable in place; they are drained, inspected, and
// collected back so that ordering reflects any change to their contents.
impl<T: Entry + Ord> Entries for BTreeSet<T> {
    fn defend_entries(&mut self, policy: &FilterPolicy) {
        let entries = std::mem::take(self);
        *self = entries
            .into_iter()
            .filter_map(|mut entry| entry.defend_entry(policy).then_some(entry))
            .collect();
    }

    fn strip_absent(&mut self) -> usize {
        let before = self.len();
        self.retain(|entry| !entry.is_absent());
        before - self.len()
    }

    fn entry_count(&self) -> usize {
        self.len()
    }
}

impl<T: Entry + Eq + Hash> Entries for HashSet<T> {
    fn defend_entries(&mut self, policy: &FilterPolicy) {
        let entries = std::mem::take(self);
        *self = entries
            .into_iter()
            .filter_map(|mut entry| entry.defend_entry(policy).then_some(entry))
            .collect();
    }

    fn strip_absent(&mut self) -> usize {
        let before = self.len();
        self.retain(|entry| !entry.is_absent());
        before - self.len()
    }

    fn entry_count(&self) -> usize {
        self.len()
    }
}

/// A map type usable as a map field. Values are inspected; keys are not.
pub trait MapValues {
    /// Run the pass on every value, removing entries whose value was rejected
    /// and cannot be absent.
    fn defend_values(&mut self, policy: &FilterPolicy);
}

impl<K: Ord, V: Entry> MapValues for BTreeMap<K, V> {
    fn defend_values(&mut self, policy: &FilterPolicy) {
        self.retain(|_, value| value.defend_entry(policy));
    }
}

impl<K, V: Entry, S> MapValues for HashMap<K, V, S> {
    fn defend_values(&mut self, policy: &FilterPolicy) {
        self.retain(|_, value| value.defend_entry(policy));
    }
}
