//! # Document Mode
//!
//! Runtime field descriptors for untyped `serde_json::Value` documents, so
//! the same validation pass can run where no Rust type exists (the CLI).
//!
//! ## Schema Format
//!
//! ```yaml
//! types:
//!   Parent:
//!     fields:
//!       - { name: name, tags: [mandatory] }
//!       - { name: children, tags: [mandatory], kind: collection, type: Child }
//!   Child:
//!     tags: [mandatory]          # every field of Child is mandatory
//!     fields:
//!       - { name: name }
//!       - { name: age, kind: primitive }
//! ```
//!
//! `kind` is one of `primitive`, `value` (default), `object`, `collection`.
//! `object` fields must name a `type`; `collection` fields may name the type
//! of their entries.
//!
//! ## Absence
//!
//! A missing key and an explicit `null` are both absent. A rejected nested
//! object is replaced with `null`; absent entries are removed from checked
//! arrays. Values whose JSON shape does not match their kind are left as
//! decoded: a non-object where an object is declared is not inspected, and a
//! non-array collection counts as present and non-empty.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::codec::load_file;
use crate::descriptor::{CollectionSlot, Defend, Field, ObjectSlot, Slot, Tags};
use crate::error::DefenseError;
use crate::filter::{defend_nested, Verdict};
use crate::policy::FilterPolicy;

/// Named type descriptors for untyped documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentSchema {
    /// Type descriptors by name.
    #[serde(default)]
    pub types: BTreeMap<String, TypeSchema>,
}

/// Descriptor of one document type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeSchema {
    /// Type-level tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Fields in inspection order.
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

/// Descriptor of one document field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSchema {
    /// Object key.
    pub name: String,
    /// Field tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// How the value is inspected.
    #[serde(default)]
    pub kind: FieldKind,
    /// Nested type for `object` fields and `collection` entries.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

/// Kind of a document field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Exempt from mandatory checks.
    Primitive,
    /// Nullable scalar.
    #[default]
    Value,
    /// Nested object of a declared type.
    Object,
    /// Array, optionally of a declared type.
    Collection,
}

impl DocumentSchema {
    /// Load and validate a schema file (YAML or JSON by extension).
    ///
    /// # Errors
    ///
    /// Returns `DefenseError::DocumentLoad` if the file cannot be read or
    /// parsed, and `DefenseError::InvalidConfiguration` if it fails
    /// [`validate`](Self::validate).
    pub fn load(path: &Path) -> Result<Self, DefenseError> {
        let schema: Self = load_file(path)?;
        schema.validate()?;
        tracing::debug!(
            path = %path.display(),
            types = schema.types.len(),
            "loaded document schema"
        );
        Ok(schema)
    }

    /// Look up a type descriptor.
    pub fn get(&self, type_name: &str) -> Option<&TypeSchema> {
        self.types.get(type_name)
    }

    /// Check that every type reference resolves and field names are unique.
    ///
    /// # Errors
    ///
    /// Returns `DefenseError::InvalidConfiguration` describing the first
    /// offending field.
    pub fn validate(&self) -> Result<(), DefenseError> {
        for (type_name, ty) in &self.types {
            let mut seen = BTreeSet::new();
            for field in &ty.fields {
                let location = format!("{type_name}.{}", field.name);
                if !seen.insert(field.name.as_str()) {
                    return Err(DefenseError::InvalidConfiguration(format!(
                        "duplicate field {location}"
                    )));
                }
                match (field.kind, field.type_name.as_deref()) {
                    (FieldKind::Object, None) => {
                        return Err(DefenseError::InvalidConfiguration(format!(
                            "object field {location} must name its type"
                        )));
                    }
                    (FieldKind::Object | FieldKind::Collection, Some(nested))
                        if !self.types.contains_key(nested) =>
                    {
                        return Err(DefenseError::InvalidConfiguration(format!(
                            "field {location} refers to unknown type '{nested}'"
                        )));
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

/// A JSON object viewed through its [`TypeSchema`].
pub struct Document<'a> {
    schema: &'a DocumentSchema,
    type_name: &'a str,
    ty: &'a TypeSchema,
    fields: &'a mut Map<String, Value>,
}

impl<'a> Document<'a> {
    /// View `fields` as an instance of `type_name`.
    ///
    /// # Errors
    ///
    /// Returns `DefenseError::UnknownType` if the schema has no such type.
    pub fn new(
        schema: &'a DocumentSchema,
        type_name: &str,
        fields: &'a mut Map<String, Value>,
    ) -> Result<Self, DefenseError> {
        let (type_name, ty) = schema
            .types
            .get_key_value(type_name)
            .ok_or_else(|| DefenseError::UnknownType(type_name.to_string()))?;
        Ok(Self {
            schema,
            type_name,
            ty,
            fields,
        })
    }
}

impl Defend for Document<'_> {
    fn type_name(&self) -> &str {
        self.type_name
    }

    fn type_tags(&self) -> Tags<'_> {
        Tags::Owned(&self.ty.tags)
    }

    fn fields(&mut self) -> Vec<Field<'_>> {
        let schema = self.schema;
        let mut values: HashMap<&str, &mut Value> = self
            .fields
            .iter_mut()
            .map(|(key, value)| (key.as_str(), value))
            .collect();

        self.ty
            .fields
            .iter()
            .map(|field| {
                let value = values.remove(field.name.as_str());
                Field::new(
                    &field.name,
                    Tags::Owned(&field.tags),
                    slot_for(schema, field, value),
                )
            })
            .collect()
    }
}

fn slot_for<'v>(
    schema: &'v DocumentSchema,
    field: &'v FieldSchema,
    value: Option<&'v mut Value>,
) -> Slot<'v> {
    let type_name = field.type_name.as_deref();
    match field.kind {
        FieldKind::Primitive => Slot::Primitive,
        FieldKind::Value => Slot::Value {
            present: value.is_some_and(|v| !v.is_null()),
        },
        FieldKind::Object => Slot::Object(Box::new(DocumentObject {
            schema,
            type_name,
            value,
        })),
        FieldKind::Collection => Slot::Collection(Box::new(DocumentArray {
            schema,
            type_name,
            value,
        })),
    }
}

/// Inspect `value` as `type_name`. Returns false if it was rejected.
fn defend_value(
    policy: &FilterPolicy,
    schema: &DocumentSchema,
    type_name: &str,
    value: &mut Value,
) -> bool {
    let Value::Object(fields) = value else {
        return true;
    };
    match Document::new(schema, type_name, fields) {
        Ok(mut document) => defend_nested(&mut document, policy),
        Err(error) => {
            tracing::warn!(%error, "nested value has no type descriptor; rejecting it");
            false
        }
    }
}

struct DocumentObject<'a> {
    schema: &'a DocumentSchema,
    type_name: Option<&'a str>,
    value: Option<&'a mut Value>,
}

impl ObjectSlot for DocumentObject<'_> {
    fn is_present(&self) -> bool {
        self.value.as_deref().is_some_and(|v| !v.is_null())
    }

    fn defend(&mut self, policy: &FilterPolicy) -> bool {
        if let (Some(value), Some(type_name)) = (self.value.as_deref_mut(), self.type_name) {
            if !defend_value(policy, self.schema, type_name, value) {
                *value = Value::Null;
            }
        }
        true
    }
}

struct DocumentArray<'a> {
    schema: &'a DocumentSchema,
    type_name: Option<&'a str>,
    value: Option<&'a mut Value>,
}

impl CollectionSlot for DocumentArray<'_> {
    fn is_present(&self) -> bool {
        self.value.as_deref().is_some_and(|v| !v.is_null())
    }

    fn defend_entries(&mut self, policy: &FilterPolicy) {
        if let (Some(Value::Array(entries)), Some(type_name)) =
            (self.value.as_deref_mut(), self.type_name)
        {
            for entry in entries.iter_mut() {
                if !defend_value(policy, self.schema, type_name, entry) {
                    *entry = Value::Null;
                }
            }
        }
    }

    fn strip_absent(&mut self) -> usize {
        match self.value.as_deref_mut() {
            Some(Value::Array(entries)) => {
                let before = entries.len();
                entries.retain(|entry| !entry.is_null());
                before - entries.len()
            }
            _ => 0,
        }
    }

    fn is_empty(&self) -> bool {
        match self.value.as_deref() {
            Some(Value::Array(entries)) => entries.is_empty(),
            Some(Value::Null) | None => true,
            Some(_) => false,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl FilterPolicy {
    /// Filter an untyped document whose root is an instance of `root`.
    ///
    /// # Errors
    ///
    /// Returns `DefenseError::InvalidConfiguration` if the schema fails
    /// [`DocumentSchema::validate`], `DefenseError::UnknownType` if it does
    /// not declare `root`, and `DefenseError::UnexpectedShape` if the document
    /// is neither an object nor null. A rejected root is `Ok(None)`.
    pub fn filter_document(
        &self,
        schema: &DocumentSchema,
        root: &str,
        mut value: Value,
    ) -> Result<Option<Value>, DefenseError> {
        schema.validate()?;
        if schema.get(root).is_none() {
            return Err(DefenseError::UnknownType(root.to_string()));
        }

        let verdict = match &mut value {
            Value::Null => return Ok(None),
            Value::Object(fields) => {
                self.inspect(&mut Document::new(schema, root, fields)?)
            }
            other => {
                return Err(DefenseError::UnexpectedShape {
                    type_name: root.to_string(),
                    found: json_kind(other),
                })
            }
        };

        match verdict {
            Verdict::Accepted => Ok(Some(value)),
            Verdict::Rejected(rejection) => {
                tracing::debug!(%rejection, "discarding document");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FAMILY: &str = r#"
types:
  Parent:
    fields:
      - { name: name, tags: [mandatory] }
      - { name: children, tags: [mandatory], kind: collection, type: Child }
  Child:
    fields:
      - { name: name, tags: [mandatory] }
      - { name: isMale, kind: primitive }
      - { name: age, tags: [mandatory], kind: primitive }
      - { name: language, tags: [mandatory], kind: object, type: Language }
  Language:
    fields:
      - { name: knownLanguages, tags: [mandatory], kind: collection }
  Address:
    tags: [mandatory]
    fields:
      - { name: street }
      - { name: floor, kind: primitive }
"#;

    fn family() -> DocumentSchema {
        let schema: DocumentSchema = serde_yaml::from_str(FAMILY).unwrap();
        schema.validate().unwrap();
        schema
    }

    fn child(name: &str, languages: Value) -> Value {
        json!({"name": name, "age": 4, "language": {"knownLanguages": languages}})
    }

    #[test]
    fn accepts_valid_document() {
        let doc = json!({"name": "VenomVendor", "children": [child("Ann", json!(["Telugu"]))]});
        let filtered = FilterPolicy::default()
            .filter_document(&family(), "Parent", doc.clone())
            .unwrap();
        assert_eq!(filtered, Some(doc));
    }

    #[test]
    fn missing_key_is_absent() {
        let doc = json!({"children": [child("Ann", json!(["Telugu"]))]});
        let filtered = FilterPolicy::default()
            .filter_document(&family(), "Parent", doc)
            .unwrap();
        assert!(filtered.is_none());
    }

    #[test]
    fn invalid_entries_are_removed() {
        let doc = json!({
            "name": "VenomVendor",
            "children": [
                child("Ann", json!(["Telugu"])),
                {"age": 3, "language": {"knownLanguages": ["Hindi"]}},
                null,
                child("Queen", json!([null, "Tamil"]))
            ]
        });
        let filtered = FilterPolicy::default()
            .filter_document(&family(), "Parent", doc)
            .unwrap()
            .unwrap();
        let children = filtered["children"].as_array().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[1]["name"], "Queen");
        assert_eq!(children[1]["language"]["knownLanguages"], json!(["Tamil"]));
    }

    #[test]
    fn empty_collections_follow_policy() {
        let doc = json!({"name": "p", "children": [child("Ann", json!([])), child("Bo", json!([null]))]});
        let schema = family();
        assert!(FilterPolicy::default()
            .filter_document(&schema, "Parent", doc.clone())
            .unwrap()
            .is_none());

        let retained = FilterPolicy::default()
            .retain_empty_collections()
            .filter_document(&schema, "Parent", doc)
            .unwrap()
            .unwrap();
        assert_eq!(retained["children"].as_array().unwrap().len(), 2);
        assert_eq!(retained["children"][1]["language"]["knownLanguages"], json!([]));
    }

    #[test]
    fn class_level_tags_apply() {
        let schema = family();
        let policy = FilterPolicy::default();
        assert!(policy
            .filter_document(&schema, "Address", json!({"floor": null}))
            .unwrap()
            .is_none());
        assert!(policy
            .filter_document(&schema, "Address", json!({"street": "Main"}))
            .unwrap()
            .is_some());
    }

    #[test]
    fn unknown_root_type() {
        let err = FilterPolicy::default()
            .filter_document(&family(), "Nope", json!({}))
            .unwrap_err();
        assert!(matches!(err, DefenseError::UnknownType(ref t) if t == "Nope"));
    }

    #[test]
    fn non_object_root_is_rejected_as_error() {
        let err = FilterPolicy::default()
            .filter_document(&family(), "Parent", json!([1, 2]))
            .unwrap_err();
        assert!(matches!(err, DefenseError::UnexpectedShape { found: "array", .. }));
    }

    #[test]
    fn null_root_is_absent() {
        let filtered = FilterPolicy::default()
            .filter_document(&family(), "Parent", Value::Null)
            .unwrap();
        assert!(filtered.is_none());
    }

    #[test]
    fn validate_rejects_dangling_types() {
        let schema: DocumentSchema = serde_yaml::from_str(
            "types:\n  A:\n    fields:\n      - { name: b, kind: object, type: B }\n",
        )
        .unwrap();
        let err = schema.validate().unwrap_err();
        assert!(err.to_string().contains("unknown type 'B'"), "got: {err}");
    }

    #[test]
    fn unvalidated_schema_with_dangling_type_is_an_error() {
        let schema = DocumentSchema {
            types: [(
                "P".to_string(),
                TypeSchema {
                    tags: vec![],
                    fields: vec![FieldSchema {
                        name: "c".to_string(),
                        tags: vec!["mandatory".to_string()],
                        kind: FieldKind::Object,
                        type_name: Some("Missing".to_string()),
                    }],
                },
            )]
            .into_iter()
            .collect(),
        };
        let err = FilterPolicy::default()
            .filter_document(&schema, "P", json!({"c": {"x": null}}))
            .unwrap_err();
        assert!(
            matches!(
                err,
                DefenseError::InvalidConfiguration(ref msg) if msg.contains("unknown type 'Missing'")
            ),
            "Expected InvalidConfiguration, got: {err}"
        );
    }

    #[test]
    fn nested_value_without_descriptor_is_rejected() {
        let schema: DocumentSchema = serde_yaml::from_str(
            "types:\n  P:\n    fields:\n      - { name: c, kind: object, type: Missing }\n",
        )
        .unwrap();
        let mut value = json!({"x": 1});
        assert!(!defend_value(&FilterPolicy::default(), &schema, "Missing", &mut value));
    }

    #[test]
    fn validate_rejects_untyped_objects() {
        let schema: DocumentSchema =
            serde_yaml::from_str("types:\n  A:\n    fields:\n      - { name: b, kind: object }\n")
                .unwrap();
        assert!(schema.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_fields() {
        let schema: DocumentSchema =
            serde_yaml::from_str("types:\n  A:\n    fields:\n      - { name: b }\n      - { name: b }\n")
                .unwrap();
        let err = schema.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate field A.b"), "got: {err}");
    }
}
