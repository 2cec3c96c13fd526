//! Lowers a parsed [`crate::ast::Type`] tree into a JSON Schema draft-07
//! document.
//!
//! Reachability is tracked inline while lowering the root, rather than as a
//! separate pruning pass: a `Ref` is only expanded into the emitted
//! `definitions` map the first time it is actually encountered, and a
//! definition's own body is lowered (and its own refs discovered) at that
//! same moment. A definition that is itself unreachable from the root never
//! has its body lowered at all, so a dangling reference inside it is never
//! reported — only reachable errors surface, matching the rest of the
//! compiler's "resolve at the point of use" stance.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::{json, Map, Value as Json};

use crate::ast::{
    ArrayRepeat, Cardinal, Defs, Keyword, NameConstraint, ObjectRestriction, Schema, Type,
};
use crate::error::{Error, Result};

const DRAFT07: &str = "http://json-schema.org/draft-07/schema#";

struct Lowerer<'a> {
    defs: &'a Defs,
    reached: HashSet<String>,
    lowered_defs: IndexMap<String, Json>,
}

impl<'a> Lowerer<'a> {
    fn new(defs: &'a Defs) -> Self {
        Self {
            defs,
            reached: HashSet::new(),
            lowered_defs: IndexMap::new(),
        }
    }

    fn lower_ref(&mut self, name: &str) -> Result<Json> {
        if !self.defs.contains_key(name) {
            return Err(Error::unresolved_reference(name));
        }
        if self.reached.insert(name.to_string()) {
            let body = &self.defs[name];
            let lowered = self.lower_type(body)?;
            self.lowered_defs.insert(name.to_string(), lowered);
        }
        Ok(json!({ "$ref": format!("#/definitions/{name}") }))
    }

    fn lower_name_constraint(&mut self, nc: &NameConstraint) -> Result<Json> {
        match nc {
            NameConstraint::Regex(pattern) => Ok(json!({ "type": "string", "pattern": pattern })),
            NameConstraint::Ref(name) => self.lower_ref(name),
        }
    }

    fn lower_type(&mut self, ty: &Type) -> Result<Json> {
        match ty {
            Type::Literal(value) => Ok(json!({ "const": value })),
            Type::Enum(values) => Ok(json!({ "enum": values })),
            Type::Keyword(Keyword::Boolean) => Ok(json!({ "type": "boolean" })),
            Type::Keyword(Keyword::Number) => Ok(json!({ "type": "number" })),
            Type::Keyword(Keyword::Null) => Ok(json!({ "type": "null" })),
            Type::Keyword(Keyword::Object) => Ok(json!({ "type": "object" })),
            Type::Keyword(Keyword::Array) => Ok(json!({ "type": "array" })),
            Type::Keyword(Keyword::Forbidden) => Ok(Json::Bool(false)),
            Type::Str(cardinal) => {
                let mut obj = Map::new();
                obj.insert("type".into(), json!("string"));
                insert_cardinal(&mut obj, cardinal, "minLength", "maxLength");
                Ok(Json::Object(obj))
            }
            Type::IntegerCard {
                min,
                max,
                multiple_of,
            } => {
                let mut obj = Map::new();
                obj.insert("type".into(), json!("integer"));
                if let Some(min) = min {
                    obj.insert("minimum".into(), json!(min));
                }
                if let Some(max) = max {
                    obj.insert("maximum".into(), json!(max));
                }
                if let Some(k) = multiple_of {
                    obj.insert("multipleOf".into(), json!(k));
                }
                Ok(Json::Object(obj))
            }
            Type::Regex(pattern) => Ok(json!({ "type": "string", "pattern": pattern })),
            Type::Format(name) => Ok(json!({ "type": "string", "format": name })),
            Type::Ref(name) => self.lower_ref(name),
            Type::Not(inner) => {
                let inner = self.lower_type(inner)?;
                Ok(json!({ "not": inner }))
            }
            Type::AllOf(children) => {
                let lowered = children
                    .iter()
                    .map(|c| self.lower_type(c))
                    .collect::<Result<Vec<_>>>()?;
                Ok(json!({ "allOf": lowered }))
            }
            Type::AnyOf(children) => {
                let lowered = children
                    .iter()
                    .map(|c| self.lower_type(c))
                    .collect::<Result<Vec<_>>>()?;
                Ok(json!({ "anyOf": lowered }))
            }
            Type::Conditional {
                branches,
                else_branch,
            } => self.lower_conditional(branches, else_branch.as_deref()),
            Type::Object {
                properties,
                restriction,
                cardinal,
            } => self.lower_object(properties, restriction, cardinal),
            Type::Array {
                items,
                repeat,
                only,
                unique,
                cardinal,
            } => self.lower_array(items, repeat, *only, *unique, cardinal),
        }
    }

    /// `if C0 then T0 (elif Ci then Ti)* (else E)?`, built from the
    /// innermost branch outward so each `elif` nests inside the preceding
    /// branch's `else`.
    fn lower_conditional(
        &mut self,
        branches: &[(Type, Type)],
        else_branch: Option<&Type>,
    ) -> Result<Json> {
        let mut current = match else_branch {
            Some(e) => Some(self.lower_type(e)?),
            None => None,
        };
        for (cond, then) in branches.iter().rev() {
            let mut obj = Map::new();
            obj.insert("if".into(), self.lower_type(cond)?);
            obj.insert("then".into(), self.lower_type(then)?);
            if let Some(els) = current.take() {
                obj.insert("else".into(), els);
            }
            current = Some(Json::Object(obj));
        }
        // `branches` is never empty: the grammar requires at least one
        // `if ... then ...` to form a Conditional.
        Ok(current.expect("conditional with no branches"))
    }

    fn lower_object(
        &mut self,
        properties: &[crate::ast::ObjectProperty],
        restriction: &ObjectRestriction,
        cardinal: &Cardinal,
    ) -> Result<Json> {
        let mut obj = Map::new();
        obj.insert("type".into(), json!("object"));

        if !properties.is_empty() {
            let mut props = Map::new();
            let mut required = Vec::new();
            for p in properties {
                let is_forbidden = matches!(p.value, Type::Keyword(Keyword::Forbidden));
                props.insert(p.key.clone(), self.lower_type(&p.value)?);
                if !p.optional && !is_forbidden {
                    required.push(json!(p.key));
                }
            }
            obj.insert("properties".into(), Json::Object(props));
            if !required.is_empty() {
                obj.insert("required".into(), Json::Array(required));
            }
        }

        match restriction {
            ObjectRestriction::None => {}
            ObjectRestriction::OnlyListed => {
                obj.insert("additionalProperties".into(), json!(false));
            }
            ObjectRestriction::OnlyNames(nc) => {
                let lowered = self.lower_name_constraint(nc)?;
                obj.insert("propertyNames".into(), lowered);
            }
            ObjectRestriction::OnlyKV(nc, value_ty) => {
                if let Some(nc) = nc {
                    let lowered = self.lower_name_constraint(nc)?;
                    obj.insert("propertyNames".into(), lowered);
                }
                let lowered = self.lower_type(value_ty)?;
                obj.insert("additionalProperties".into(), lowered);
            }
        }

        insert_cardinal(&mut obj, cardinal, "minProperties", "maxProperties");
        Ok(Json::Object(obj))
    }

    fn lower_array(
        &mut self,
        items: &[Type],
        repeat: &ArrayRepeat,
        only: bool,
        unique: bool,
        cardinal: &Cardinal,
    ) -> Result<Json> {
        let mut obj = Map::new();
        obj.insert("type".into(), json!("array"));

        let k = items.len();
        let mut min_items = cardinal.min;
        let max_items = cardinal.max;

        match repeat {
            ArrayRepeat::Closed => {
                if k > 0 {
                    let lowered = items
                        .iter()
                        .map(|t| self.lower_type(t))
                        .collect::<Result<Vec<_>>>()?;
                    obj.insert("items".into(), Json::Array(lowered));
                    if only {
                        obj.insert("additionalItems".into(), json!(false));
                    }
                }
            }
            ArrayRepeat::ZeroOrMore(tail) | ArrayRepeat::OneOrMore(tail) => {
                if k == 0 {
                    let tail = self.lower_type(tail)?;
                    obj.insert("items".into(), tail);
                } else {
                    let lowered = items
                        .iter()
                        .map(|t| self.lower_type(t))
                        .collect::<Result<Vec<_>>>()?;
                    obj.insert("items".into(), Json::Array(lowered));
                    let tail = self.lower_type(tail)?;
                    obj.insert("additionalItems".into(), tail);
                }
                if matches!(repeat, ArrayRepeat::OneOrMore(_)) {
                    let forced = if k == 0 { 1 } else { k as i64 + 1 };
                    min_items = Some(min_items.map_or(forced, |m| m.max(forced)));
                }
            }
        }

        // A closed tuple with no explicit cardinal needs no bounds: the
        // listed item count already pins the array's length.
        let suppress_bounds =
            matches!(repeat, ArrayRepeat::Closed) && k > 0 && cardinal.min.is_none() && cardinal.max.is_none();
        if !suppress_bounds {
            if let Some(min) = min_items {
                obj.insert("minItems".into(), json!(min));
            }
            if let Some(max) = max_items {
                obj.insert("maxItems".into(), json!(max));
            }
        }

        if unique {
            obj.insert("uniqueItems".into(), json!(true));
        }

        Ok(Json::Object(obj))
    }
}

fn insert_cardinal(obj: &mut Map<String, Json>, cardinal: &Cardinal, min_key: &str, max_key: &str) {
    if let Some(min) = cardinal.min {
        obj.insert(min_key.into(), json!(min));
    }
    if let Some(max) = cardinal.max {
        obj.insert(max_key.into(), json!(max));
    }
}

/// If `root` lowers to a JSON object, its keys are merged directly into the
/// document alongside `$schema`. The only type whose lowering is not an
/// object is a bare `forbidden` keyword (`false`); there, `false` is nested
/// as the sole member of an `allOf` array so the mandatory `$schema` key and
/// the "always fails" semantics can coexist in one object.
fn merge_root(doc: &mut Map<String, Json>, root: Json) {
    match root {
        Json::Object(map) => doc.extend(map),
        other => {
            doc.insert("allOf".into(), Json::Array(vec![other]));
        }
    }
}

/// Lowers a full [`Schema`] into a JSON Schema draft-07 document: `$schema`,
/// the root type's own keys, and a `definitions` map containing only the
/// definitions transitively reachable from the root (in their original
/// declaration order).
pub fn lower_schema(schema: &Schema) -> Result<Json> {
    let mut lowerer = Lowerer::new(&schema.defs);
    let root = lowerer.lower_type(&schema.root)?;

    let mut doc = Map::new();
    doc.insert("$schema".into(), json!(DRAFT07));
    merge_root(&mut doc, root);

    if !lowerer.reached.is_empty() {
        let mut defs_obj = Map::new();
        for name in schema.defs.keys() {
            if let Some(lowered) = lowerer.lowered_defs.get(name) {
                defs_obj.insert(name.clone(), lowered.clone());
            }
        }
        doc.insert("definitions".into(), Json::Object(defs_obj));
    }

    Ok(Json::Object(doc))
}

/// Lowers every declared definition independently, with no reachability
/// pruning and no `$schema`/root wrapper. Used by the CLI's
/// `--definitions-only` mode, where the caller wants to see the whole
/// `where` clause regardless of whether a root type would ever reach it.
pub fn lower_all_definitions(defs: &Defs) -> Result<Json> {
    let mut lowerer = Lowerer::new(defs);
    let mut map = Map::new();
    for (name, ty) in defs {
        map.insert(name.clone(), lowerer.lower_type(ty)?);
    }
    Ok(Json::Object(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_schema;
    use pretty_assertions::assert_eq;

    fn lower(src: &str) -> Json {
        lower_schema(&parse_schema(src).unwrap()).unwrap()
    }

    #[test]
    fn lowers_bare_boolean() {
        assert_eq!(
            lower("boolean"),
            json!({ "$schema": DRAFT07, "type": "boolean" })
        );
    }

    #[test]
    fn lowers_zero_or_more_array_with_no_bounds() {
        assert_eq!(
            lower("[integer*]"),
            json!({
                "$schema": DRAFT07,
                "type": "array",
                "items": { "type": "integer" }
            })
        );
    }

    #[test]
    fn one_or_more_forces_minitems_combined_with_explicit_cardinal() {
        assert_eq!(
            lower("[integer, boolean+]{4}"),
            json!({
                "$schema": DRAFT07,
                "type": "array",
                "items": [{ "type": "integer" }],
                "additionalItems": { "type": "boolean" },
                "minItems": 4,
                "maxItems": 4
            })
        );
    }

    #[test]
    fn closed_tuple_with_no_cardinal_has_no_bounds() {
        let out = lower("[integer, boolean]");
        assert!(out.get("minItems").is_none());
        assert!(out.get("maxItems").is_none());
    }

    #[test]
    fn literal_chain_lowers_to_enum_not_anyof() {
        assert_eq!(
            lower("`1` | `2` | `3`"),
            json!({ "$schema": DRAFT07, "enum": [1, 2, 3] })
        );
    }

    #[test]
    fn only_listed_object_forbids_additional_properties() {
        assert_eq!(
            lower("{only a: boolean}"),
            json!({
                "$schema": DRAFT07,
                "type": "object",
                "properties": { "a": { "type": "boolean" } },
                "required": ["a"],
                "additionalProperties": false
            })
        );
    }

    #[test]
    fn optional_property_is_excluded_from_required() {
        let out = lower("{a: boolean, b?: boolean}");
        assert_eq!(out["required"], json!(["a"]));
    }

    #[test]
    fn forbidden_property_value_is_excluded_from_required_and_lowers_to_false() {
        let out = lower("{a: boolean, b: forbidden}");
        assert_eq!(out["properties"]["b"], json!(false));
        assert_eq!(out["required"], json!(["a"]));
    }

    #[test]
    fn reference_emits_ref_and_prunes_unreached_definitions() {
        let out = lower("<a> where a = boolean and b = number");
        assert_eq!(out["$ref"], json!("#/definitions/a"));
        let defs = out["definitions"].as_object().unwrap();
        assert_eq!(defs.len(), 1);
        assert!(defs.contains_key("a"));
        assert!(!defs.contains_key("b"));
    }

    #[test]
    fn self_referential_definition_does_not_infinite_loop() {
        let out = lower("<node> where node = {next: <node>?}");
        let node = &out["definitions"]["node"];
        assert_eq!(node["properties"]["next"]["$ref"], json!("#/definitions/node"));
    }

    #[test]
    fn bare_forbidden_root_wraps_false_in_allof() {
        assert_eq!(
            lower("forbidden"),
            json!({ "$schema": DRAFT07, "allOf": [false] })
        );
    }

    #[test]
    fn conditional_elif_chain_nests_right_associatively() {
        let out = lower(
            r#"if {a: `true`} then boolean elif {b: `true`} then number else null"#,
        );
        assert_eq!(out["if"]["properties"]["a"]["const"], json!(true));
        assert_eq!(out["then"], json!({ "type": "boolean" }));
        assert_eq!(out["else"]["if"]["properties"]["b"]["const"], json!(true));
        assert_eq!(out["else"]["then"], json!({ "type": "number" }));
        assert_eq!(out["else"]["else"], json!({ "type": "null" }));
    }

    #[test]
    fn unresolved_reference_surfaces_only_when_reached() {
        // `missing` is never referenced from the root, so it must not be
        // reported even though it would fail to resolve.
        let result = lower_schema(&parse_schema("boolean where a = <missing>").unwrap());
        assert!(result.is_ok());
    }
}
