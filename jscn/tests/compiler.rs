//! End-to-end scenarios compiling JSCN source straight to a JSON Schema
//! document, and the cross-module invariants that are awkward to state
//! inside a single unit test.

use jscn::{Definitions, Error, Schema};
use pretty_assertions::assert_eq;
use serde_json::json;

const DRAFT07: &str = "http://json-schema.org/draft-07/schema#";

fn compile(src: &str) -> serde_json::Value {
    Schema::new(src).unwrap().jsonschema().unwrap()
}

#[test]
fn scenario_bare_boolean() {
    assert_eq!(
        compile("boolean"),
        json!({ "$schema": DRAFT07, "type": "boolean" })
    );
}

#[test]
fn scenario_zero_or_more_array() {
    assert_eq!(
        compile("[integer*]"),
        json!({ "$schema": DRAFT07, "type": "array", "items": { "type": "integer" } })
    );
}

#[test]
fn scenario_tuple_with_one_or_more_tail_and_cardinal() {
    assert_eq!(
        compile("[integer, boolean+]{4}"),
        json!({
            "$schema": DRAFT07,
            "type": "array",
            "minItems": 4,
            "maxItems": 4,
            "items": [{ "type": "integer" }],
            "additionalItems": { "type": "boolean" }
        })
    );
}

#[test]
fn scenario_literal_or_chain_lowers_to_enum() {
    assert_eq!(
        compile("`1` | `2`"),
        json!({ "$schema": DRAFT07, "enum": [1, 2] })
    );
}

#[test]
fn scenario_only_kv_restriction_with_two_definitions() {
    let doc = compile("{only <id>: <byte>} where id = r\"[a-z]+\" and byte = integer{0, 0xff}");
    assert_eq!(doc["type"], "object");
    assert_eq!(doc["propertyNames"], json!({ "$ref": "#/definitions/id" }));
    assert_eq!(doc["additionalProperties"], json!({ "$ref": "#/definitions/byte" }));
    assert_eq!(
        doc["definitions"]["id"],
        json!({ "type": "string", "pattern": "[a-z]+" })
    );
    assert_eq!(
        doc["definitions"]["byte"],
        json!({ "type": "integer", "minimum": 0, "maximum": 255 })
    );
}

#[test]
fn scenario_conditional_on_country() {
    let doc = compile(
        r#"if {"country": "USA"} then {postcode: r"\d{5}(-\d{4})?"} else {postcode: string}"#,
    );
    assert!(doc.get("if").is_some());
    assert!(doc.get("then").is_some());
    assert!(doc.get("else").is_some());
    assert_eq!(
        doc["if"]["properties"]["country"],
        json!({ "const": "USA" })
    );
    assert_eq!(
        doc["then"]["properties"]["postcode"]["pattern"],
        json!(r"\d{5}(-\d{4})?")
    );
    assert_eq!(doc["else"]["properties"]["postcode"], json!({ "type": "string" }));
}

#[test]
fn negative_unresolved_reference() {
    let err = Schema::new("<missing>").unwrap().jsonschema().unwrap_err();
    assert!(matches!(err, Error::UnresolvedReference { .. }));
}

#[test]
fn negative_invalid_cardinal() {
    let err = Schema::new("integer{5, 3}").unwrap_err();
    assert!(matches!(err, Error::InvalidCardinal { .. }));
}

#[test]
fn negative_definition_conflict_on_merge() {
    let a = Schema::new("<x> where x = integer").unwrap();
    let b = Schema::new("<x> where x = number").unwrap();
    let err = (a | b).unwrap_err();
    assert!(matches!(err, Error::DefinitionConflict { .. }));
}

#[test]
fn invariant_parser_determinism() {
    let src = "{only <id>: string} where id = r\"[a-z]+\"";
    assert_eq!(Schema::new(src).unwrap(), Schema::new(src).unwrap());
}

#[test]
fn invariant_jsonschema_is_pure() {
    let schema = Schema::new("{a: boolean, b?: [integer*]}").unwrap();
    assert_eq!(schema.jsonschema().unwrap(), schema.jsonschema().unwrap());
}

#[test]
fn invariant_disjoint_or_union_is_defs_union() {
    let a = Schema::new("<x> where x = boolean").unwrap();
    let b = Schema::new("<y> where y = number").unwrap();
    let combined = (a.clone() | b.clone()).unwrap();
    assert_eq!(combined.definitions().len(), 2);
    assert_eq!(combined.definitions()["x"], *a.definitions().get("x").unwrap());
    assert_eq!(combined.definitions()["y"], *b.definitions().get("y").unwrap());
}

#[test]
fn invariant_disjoint_and_union_is_defs_union() {
    let a = Schema::new("<x> where x = boolean").unwrap();
    let b = Schema::new("<y> where y = number").unwrap();
    let combined = (a & b).unwrap();
    assert_eq!(combined.definitions().len(), 2);
}

#[test]
fn invariant_every_ref_resolves_within_emitted_definitions() {
    let doc = compile("<a> where a = {next: <a>?}");
    let defs = doc["definitions"].as_object().unwrap();
    for (_, value) in defs {
        if let Some(target) = value.get("properties").and_then(|p| p.get("next")) {
            let pointer = target["$ref"].as_str().unwrap();
            let name = pointer.rsplit('/').next().unwrap();
            assert!(defs.contains_key(name));
        }
    }
}

#[test]
fn definitions_standalone_combines_with_schema() {
    let defs = Definitions::new("byte = integer{0,0xff}").unwrap();
    let schema = Schema::new("<byte>").unwrap();
    let combined = (defs | schema).unwrap();
    let doc = combined.jsonschema().unwrap();
    assert_eq!(doc["$ref"], json!("#/definitions/byte"));
    assert_eq!(
        doc["definitions"]["byte"],
        json!({ "type": "integer", "minimum": 0, "maximum": 255 })
    );
}
