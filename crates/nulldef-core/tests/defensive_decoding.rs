//! Integration test: decode the family fixtures through a defensive decoder.
//!
//! Each fixture exercises one way a document can lose mandatory data in
//! transit, and checks what survives: the whole parent, a subset of the
//! children, or nothing at all.

use nulldef_core::{defend, DefensiveDecoder, FilterPolicy, Format, JsonCodec, PolicyConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Language {
    #[serde(default)]
    known_languages: Vec<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Child {
    name: Option<String>,
    #[serde(default)]
    is_male: bool,
    #[serde(default)]
    age: u32,
    language: Option<Language>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Parent {
    name: Option<String>,
    children: Option<Vec<Option<Child>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Household {
    title: Option<String>,
    members: Option<BTreeMap<String, Child>>,
    guardians: BTreeMap<String, Option<Child>>,
}

defend! {
    Household {
        title [mandatory]: value,
        members [mandatory]: nullable_map,
        guardians: map,
    }
    Language {
        known_languages [mandatory]: collection,
    }
    Child {
        name [mandatory]: value,
        is_male: primitive,
        age [mandatory]: primitive,
        language [mandatory]: object,
    }
    Parent {
        name [mandatory]: value,
        children [mandatory]: nullable_collection,
    }
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn read_fixture(name: &str) -> Vec<u8> {
    std::fs::read(fixture(name)).expect("fixture should exist")
}

fn decoder() -> DefensiveDecoder<JsonCodec> {
    FilterPolicy::default().decoder(JsonCodec::new())
}

fn children(parent: &Parent) -> Vec<&Child> {
    parent
        .children
        .as_ref()
        .expect("children should be present")
        .iter()
        .map(|child| child.as_ref().expect("absent children are stripped"))
        .collect()
}

#[test]
fn test_valid_document_matches_plain_decoding() {
    let input = read_fixture("valid.json");
    let plain: Parent = serde_json::from_slice(&input).unwrap();

    let parent: Parent = decoder().decode_slice(&input).unwrap().unwrap();

    assert_eq!(parent, plain);
    assert_eq!(children(&parent).len(), 2);
}

#[test]
fn test_missing_parent_name_discards_parent() {
    let parent: Option<Parent> = decoder()
        .decode_slice(&read_fixture("missing-parent-name.json"))
        .unwrap();
    assert!(parent.is_none());
}

#[test]
fn test_children_without_name_are_removed() {
    let parent: Parent = decoder()
        .decode_slice(&read_fixture("missing-name-in-child.json"))
        .unwrap()
        .unwrap();

    let children = children(&parent);
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].name.as_deref(), Some("Queen"));
}

#[test]
fn test_no_child_with_languages_discards_parent() {
    let parent: Option<Parent> = decoder()
        .decode_slice(&read_fixture("missing-known-language-no-child.json"))
        .unwrap();
    assert!(parent.is_none());
}

#[test]
fn test_only_child_with_languages_survives() {
    let parent: Parent = decoder()
        .decode_slice(&read_fixture("missing-known-language-one-child.json"))
        .unwrap()
        .unwrap();

    let children = children(&parent);
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].name.as_deref(), Some("Queen"));
    let language = children[0].language.as_ref().unwrap();
    assert_eq!(language.known_languages, vec![Some("Telugu".to_string())]);
}

#[test]
fn test_retained_empty_collections_keep_all_children() {
    let decoder = FilterPolicy::default()
        .retain_empty_collections()
        .decoder(JsonCodec::new());

    let parent: Parent = decoder
        .decode_slice(&read_fixture("missing-known-language-one-child.json"))
        .unwrap()
        .unwrap();

    let children = children(&parent);
    assert_eq!(children.len(), 3);
    // Absent entries are still stripped from mandatory collections.
    for child in children {
        let language = child.language.as_ref().unwrap();
        assert!(language.known_languages.iter().all(Option::is_some));
    }
}

#[test]
fn test_retain_policy_from_config_file() {
    let policy = PolicyConfig::load(&fixture("policy-retain.yaml"))
        .unwrap()
        .into_policy()
        .unwrap();
    assert!(!policy.discards_empty_collections());

    let parent: Option<Parent> = policy
        .decoder(JsonCodec::new())
        .decode_slice(&read_fixture("missing-known-language-no-child.json"))
        .unwrap();
    assert_eq!(children(&parent.unwrap()).len(), 2);
}

#[test]
fn test_missing_primitives_are_not_checked() {
    let input = read_fixture("valid-missing-primitive.json");
    let plain: Parent = serde_json::from_slice(&input).unwrap();

    let parent: Parent = decoder().decode_slice(&input).unwrap().unwrap();

    assert_eq!(parent, plain);
    assert!(children(&parent).iter().all(|child| child.age == 0));
}

#[test]
fn test_null_entries_in_children_are_stripped() {
    let input = r#"{"name":"VenomVendor","children":[null,{"name":"King","language":{"knownLanguages":["English"]}},null]}"#;
    let parent: Parent = decoder().decode_str(input).unwrap().unwrap();
    assert_eq!(children(&parent).len(), 1);
}

#[test]
fn test_yaml_decodes_like_json() {
    let decoder = FilterPolicy::default().decoder(Format::Yaml);
    let from_yaml: Parent = decoder
        .decode_slice(&read_fixture("valid.yaml"))
        .unwrap()
        .unwrap();
    let from_json: Parent = serde_json::from_slice(&read_fixture("valid.json")).unwrap();
    assert_eq!(from_yaml, from_json);
}

#[test]
fn test_round_trip_preserves_accepted_value() {
    let parent: Parent = decoder()
        .decode_slice(&read_fixture("valid.json"))
        .unwrap()
        .unwrap();

    let bytes = decoder().encode(Some(&parent)).unwrap().unwrap();
    let again: Parent = decoder().decode_slice(&bytes).unwrap().unwrap();
    assert_eq!(again, parent);
}

#[test]
fn test_encoding_does_not_filter() {
    let parent = Parent {
        name: Some("VenomVendor".to_string()),
        children: None,
    };
    let bytes = decoder().encode(Some(&parent)).unwrap().unwrap();
    let json = String::from_utf8(bytes).unwrap();
    assert!(json.contains("children"), "got: {json}");
}

#[test]
fn test_invalid_map_values_are_filtered() {
    let input = r#"{
        "title": "t",
        "members": {
            "a": {"name": null, "language": {"knownLanguages": ["English"]}},
            "b": {"name": "Bo", "language": {"knownLanguages": ["Hindi"]}}
        },
        "guardians": {
            "x": {"name": "Xi", "language": {"knownLanguages": []}},
            "y": null
        }
    }"#;
    let household: Household = decoder().decode_str(input).unwrap().unwrap();

    let members = household.members.as_ref().unwrap();
    assert_eq!(members.keys().collect::<Vec<_>>(), vec!["b"]);
    assert_eq!(household.guardians.len(), 2);
    assert!(household.guardians.values().all(Option::is_none));
}

#[test]
fn test_absent_mandatory_map_discards_owner() {
    let household: Option<Household> = decoder()
        .decode_str(r#"{"title": "t", "guardians": {}}"#)
        .unwrap();
    assert!(household.is_none());
}
