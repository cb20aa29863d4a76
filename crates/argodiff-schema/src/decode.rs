//! The recursive decode/encode interpreter.
//!
//! Decoding is value-driven: the interpreter walks the input, not the graph,
//! so cyclic schemas terminate on any finite input. Encoding mirrors the
//! same structure and must not fail for any value a prior successful decode
//! produced against the same type.

use chrono::DateTime;
use serde_json::Value as JsonValue;
use thiserror::Error;

use argodiff_types::DomainValue;

use crate::node::{ExtraFields, PrimitiveKind, TypeNode};
use crate::registry::Registry;

/// Errors raised while decoding or encoding against a registered type.
#[derive(Debug, Clone, Error)]
pub enum SchemaError {
    /// The input does not match the schema. Fatal for the whole document:
    /// a partially-valid inventory is not trustworthy.
    #[error("schema violation at {path}: expected {expected}, got {actual}")]
    Violation {
        path: String,
        expected: String,
        actual: String,
    },
    /// The named top-level type is not registered.
    #[error("unknown schema type: {0}")]
    UnknownType(String),
    /// The document is not JSON at all.
    #[error("invalid json: {0}")]
    Json(String),
}

/// Where in the document a violation occurred, e.g. `[3].metadata.name`.
#[derive(Debug, Default)]
struct Path(Vec<Seg>);

#[derive(Debug)]
enum Seg {
    Key(String),
    Index(usize),
}

impl Path {
    fn push_key(&mut self, key: &str) {
        self.0.push(Seg::Key(key.to_string()));
    }

    fn push_index(&mut self, index: usize) {
        self.0.push(Seg::Index(index));
    }

    fn pop(&mut self) {
        self.0.pop();
    }

    fn render(&self) -> String {
        if self.0.is_empty() {
            return "$".to_string();
        }
        let mut out = String::new();
        for seg in &self.0 {
            match seg {
                Seg::Index(index) => {
                    out.push_str(&format!("[{index}]"));
                }
                Seg::Key(key) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(key);
                }
            }
        }
        out
    }
}

const RENDER_LIMIT: usize = 120;

fn render_json(value: &JsonValue) -> String {
    let mut rendered = value.to_string();
    if rendered.len() > RENDER_LIMIT {
        // Truncate on a char boundary
        let mut end = RENDER_LIMIT;
        while !rendered.is_char_boundary(end) {
            end -= 1;
        }
        rendered.truncate(end);
        rendered.push('…');
    }
    rendered
}

fn render_domain(value: &DomainValue) -> String {
    match value {
        DomainValue::Absent => "absent".to_string(),
        other => render_json(&other.to_json()),
    }
}

fn mismatch(path: &Path, node: &TypeNode, input: Option<&JsonValue>) -> SchemaError {
    SchemaError::Violation {
        path: path.render(),
        expected: node.expected(),
        actual: match input {
            Some(value) => render_json(value),
            None => "missing field".to_string(),
        },
    }
}

fn encode_mismatch(path: &Path, node: &TypeNode, value: &DomainValue) -> SchemaError {
    SchemaError::Violation {
        path: path.render(),
        expected: node.expected(),
        actual: render_domain(value),
    }
}

impl Registry {
    /// Decode `input` against the registered type `type_name`.
    pub fn decode(&self, input: &JsonValue, type_name: &str) -> Result<DomainValue, SchemaError> {
        let node = self
            .get(type_name)
            .ok_or_else(|| SchemaError::UnknownType(type_name.to_string()))?;
        let mut path = Path::default();
        self.decode_at(Some(input), node, &mut path)
    }

    /// Encode a previously-decoded value back to JSON against `type_name`.
    pub fn encode(&self, value: &DomainValue, type_name: &str) -> Result<JsonValue, SchemaError> {
        let node = self
            .get(type_name)
            .ok_or_else(|| SchemaError::UnknownType(type_name.to_string()))?;
        let mut path = Path::default();
        Ok(self
            .encode_at(value, node, &mut path)?
            .unwrap_or(JsonValue::Null))
    }

    /// Decode one position. `input` is `None` for a declared field missing
    /// from its enclosing object; only `Absent` (usually via a union)
    /// accepts that.
    fn decode_at(
        &self,
        input: Option<&JsonValue>,
        node: &TypeNode,
        path: &mut Path,
    ) -> Result<DomainValue, SchemaError> {
        match node {
            TypeNode::Ref(name) => {
                // The registry checked every reference at build time.
                let resolved = self
                    .get(name)
                    .ok_or_else(|| SchemaError::UnknownType((*name).to_string()))?;
                self.decode_at(input, resolved, path)
            }
            TypeNode::Absent => match input {
                None => Ok(DomainValue::Absent),
                Some(_) => Err(mismatch(path, node, input)),
            },
            TypeNode::UnionOf(members) => {
                for member in members {
                    if let Ok(value) = self.decode_at(input, member, path) {
                        return Ok(value);
                    }
                }
                Err(mismatch(path, node, input))
            }
            TypeNode::Primitive(kind) => {
                let value = require(input, node, path)?;
                self.decode_primitive(*kind, value, node, path)
            }
            TypeNode::ArrayOf(inner) => {
                let value = require(input, node, path)?;
                let JsonValue::Array(elements) = value else {
                    return Err(mismatch(path, node, Some(value)));
                };
                let mut items = Vec::with_capacity(elements.len());
                for (index, element) in elements.iter().enumerate() {
                    path.push_index(index);
                    let decoded = self.decode_at(Some(element), inner, path);
                    path.pop();
                    items.push(decoded?);
                }
                Ok(DomainValue::Array(items))
            }
            TypeNode::ObjectOf { fields, extra } => {
                let value = require(input, node, path)?;
                let JsonValue::Object(map) = value else {
                    return Err(mismatch(path, node, Some(value)));
                };
                let mut out = Vec::with_capacity(map.len().max(fields.len()));
                for declared in fields {
                    path.push_key(declared.name);
                    let decoded = self.decode_at(map.get(declared.name), &declared.node, path);
                    path.pop();
                    out.push((declared.name.to_string(), decoded?));
                }
                if let ExtraFields::Capture(inner) = extra {
                    for (key, extra_value) in map {
                        if fields.iter().any(|f| f.name == key.as_str()) {
                            continue;
                        }
                        path.push_key(key);
                        let decoded = self.decode_at(Some(extra_value), inner, path);
                        path.pop();
                        out.push((key.clone(), decoded?));
                    }
                }
                Ok(DomainValue::Object(out))
            }
            TypeNode::EnumOf(values) => {
                let value = require(input, node, path)?;
                if values.contains(value) {
                    Ok(DomainValue::from_json(value))
                } else {
                    Err(mismatch(path, node, Some(value)))
                }
            }
            TypeNode::Any => {
                let value = require(input, node, path)?;
                Ok(DomainValue::from_json(value))
            }
        }
    }

    fn decode_primitive(
        &self,
        kind: PrimitiveKind,
        value: &JsonValue,
        node: &TypeNode,
        path: &Path,
    ) -> Result<DomainValue, SchemaError> {
        match (kind, value) {
            (PrimitiveKind::Str, JsonValue::String(s)) => Ok(DomainValue::Str(s.clone())),
            (PrimitiveKind::Num, JsonValue::Number(n)) => Ok(DomainValue::Num(n.clone())),
            (PrimitiveKind::Bool, JsonValue::Bool(b)) => Ok(DomainValue::Bool(*b)),
            // A present null on a date field is the absent-date marker.
            (PrimitiveKind::Date, JsonValue::Null) => Ok(DomainValue::Date(None)),
            (PrimitiveKind::Date, JsonValue::String(s)) => DateTime::parse_from_rfc3339(s)
                .map(|ts| DomainValue::Date(Some(ts)))
                .map_err(|_| mismatch(path, node, Some(value))),
            _ => Err(mismatch(path, node, Some(value))),
        }
    }

    /// Encode one position. `Ok(None)` means "omit this field entirely",
    /// which is how `Absent` encodes.
    fn encode_at(
        &self,
        value: &DomainValue,
        node: &TypeNode,
        path: &mut Path,
    ) -> Result<Option<JsonValue>, SchemaError> {
        match node {
            TypeNode::Ref(name) => {
                let resolved = self
                    .get(name)
                    .ok_or_else(|| SchemaError::UnknownType((*name).to_string()))?;
                self.encode_at(value, resolved, path)
            }
            TypeNode::Absent => {
                if value.is_absent() {
                    Ok(None)
                } else {
                    Err(encode_mismatch(path, node, value))
                }
            }
            TypeNode::UnionOf(members) => {
                for member in members {
                    if let Ok(out) = self.encode_at(value, member, path) {
                        return Ok(out);
                    }
                }
                Err(encode_mismatch(path, node, value))
            }
            TypeNode::Primitive(kind) => {
                let matches = matches!(
                    (kind, value),
                    (PrimitiveKind::Str, DomainValue::Str(_))
                        | (PrimitiveKind::Num, DomainValue::Num(_))
                        | (PrimitiveKind::Bool, DomainValue::Bool(_))
                        | (PrimitiveKind::Date, DomainValue::Date(_))
                );
                if matches {
                    Ok(Some(value.to_json()))
                } else {
                    Err(encode_mismatch(path, node, value))
                }
            }
            TypeNode::ArrayOf(inner) => {
                let DomainValue::Array(items) = value else {
                    return Err(encode_mismatch(path, node, value));
                };
                let mut out = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    path.push_index(index);
                    let encoded = self.encode_at(item, inner, path);
                    path.pop();
                    out.push(encoded?.unwrap_or(JsonValue::Null));
                }
                Ok(Some(JsonValue::Array(out)))
            }
            TypeNode::ObjectOf { fields, extra } => {
                let DomainValue::Object(entries) = value else {
                    return Err(encode_mismatch(path, node, value));
                };
                let mut map = serde_json::Map::new();
                for (key, entry) in entries {
                    if entry.is_absent() {
                        continue;
                    }
                    let entry_node = match fields.iter().find(|f| f.name == key.as_str()) {
                        Some(declared) => &declared.node,
                        None => match extra {
                            ExtraFields::Capture(inner) => inner.as_ref(),
                            // Undeclared fields are dropped when the type
                            // does not capture extras.
                            ExtraFields::Deny => continue,
                        },
                    };
                    path.push_key(key);
                    let encoded = self.encode_at(entry, entry_node, path);
                    path.pop();
                    if let Some(json) = encoded? {
                        map.insert(key.clone(), json);
                    }
                }
                Ok(Some(JsonValue::Object(map)))
            }
            TypeNode::EnumOf(values) => {
                let json = value.to_json();
                if values.contains(&json) {
                    Ok(Some(json))
                } else {
                    Err(encode_mismatch(path, node, value))
                }
            }
            TypeNode::Any => Ok(Some(value.to_json())),
        }
    }
}

fn require<'a>(
    input: Option<&'a JsonValue>,
    node: &TypeNode,
    path: &Path,
) -> Result<&'a JsonValue, SchemaError> {
    input.ok_or_else(|| mismatch(path, node, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{
        array, closed_object, date, field, literals, map_of, number, object, opt_field, refer,
        string, union,
    };
    use serde_json::json;

    fn sample_registry() -> Registry {
        Registry::builder()
            .register(
                "App",
                object(vec![
                    field("name", string()),
                    opt_field("path", string()),
                    opt_field("labels", map_of(string())),
                    opt_field("createdAt", date()),
                    opt_field("replicas", number()),
                ]),
            )
            .register("Apps", array(refer("App")))
            .build()
            .expect("sample registry should build")
    }

    #[test]
    fn decode_encode_round_trip() {
        let registry = sample_registry();
        let doc = json!([
            {"name": "guestbook", "path": "apps/guestbook", "labels": {"env": "prod"}},
            {"name": "billing", "createdAt": "2021-02-18T16:52:20Z", "replicas": 3}
        ]);
        let decoded = registry.decode(&doc, "Apps").expect("decode should succeed");
        let encoded = registry.encode(&decoded, "Apps").expect("encode should succeed");
        assert_eq!(encoded, doc);
    }

    #[test]
    fn missing_required_field_reports_path() {
        let registry = sample_registry();
        let doc = json!([{"name": "ok"}, {"path": "no-name"}]);
        let err = registry.decode(&doc, "Apps").expect_err("decode should fail");
        match err {
            SchemaError::Violation { path, actual, .. } => {
                assert_eq!(path, "[1].name");
                assert_eq!(actual, "missing field");
            }
            other => panic!("expected violation, got {other:?}"),
        }
    }

    #[test]
    fn no_default_is_filled_for_missing_fields() {
        let registry = sample_registry();
        let err = registry
            .decode(&json!({}), "App")
            .expect_err("decode should fail");
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn extra_fields_are_captured_and_round_trip() {
        let registry = sample_registry();
        let doc = json!({"name": "x", "extraField": "x", "nested": {"deep": [1, 2]}});
        let decoded = registry.decode(&doc, "App").expect("decode should succeed");
        let encoded = registry.encode(&decoded, "App").expect("encode should succeed");
        assert_eq!(encoded, doc);
    }

    #[test]
    fn closed_object_ignores_and_drops_extras() {
        let registry = Registry::builder()
            .register("Closed", closed_object(vec![field("keep", string())]))
            .build()
            .expect("registry should build");
        let doc = json!({"keep": "yes", "drop": "me"});
        let decoded = registry.decode(&doc, "Closed").expect("decode should succeed");
        assert!(decoded.get("drop").is_none());
        let encoded = registry.encode(&decoded, "Closed").expect("encode should succeed");
        assert_eq!(encoded, json!({"keep": "yes"}));
    }

    #[test]
    fn union_members_resolve_in_declared_order() {
        // A timestamp string matches both members; first declared wins.
        let registry = Registry::builder()
            .register("Either", union(vec![string(), date()]))
            .build()
            .expect("registry should build");
        let decoded = registry
            .decode(&json!("2021-02-18T16:52:20Z"), "Either")
            .expect("decode should succeed");
        assert!(matches!(decoded, DomainValue::Str(_)));
    }

    #[test]
    fn union_failure_lists_member_set() {
        let registry = Registry::builder()
            .register("Either", union(vec![string(), number()]))
            .build()
            .expect("registry should build");
        let err = registry
            .decode(&json!(true), "Either")
            .expect_err("decode should fail");
        assert!(err.to_string().contains("one of: string | number"));
    }

    #[test]
    fn enum_rejects_unlisted_values() {
        let registry = Registry::builder()
            .register("Level", literals(vec!["low".into(), "high".into()]))
            .build()
            .expect("registry should build");
        assert!(registry.decode(&json!("low"), "Level").is_ok());
        let err = registry
            .decode(&json!("medium"), "Level")
            .expect_err("decode should fail");
        assert!(err.to_string().contains("\"low\""));
        assert!(err.to_string().contains("\"high\""));
    }

    #[test]
    fn date_null_is_absent_date_not_error() {
        let registry = Registry::builder()
            .register("When", date())
            .build()
            .expect("registry should build");
        let decoded = registry.decode(&json!(null), "When").expect("null date is allowed");
        assert_eq!(decoded, DomainValue::Date(None));
        assert_eq!(registry.encode(&decoded, "When").expect("encode"), json!(null));
    }

    #[test]
    fn date_rejects_non_timestamp_values() {
        let registry = Registry::builder()
            .register("When", date())
            .build()
            .expect("registry should build");
        assert!(registry.decode(&json!("not a date"), "When").is_err());
        assert!(registry.decode(&json!(12345), "When").is_err());
    }

    #[test]
    fn array_violation_includes_offending_index() {
        let registry = Registry::builder()
            .register("Nums", array(number()))
            .build()
            .expect("registry should build");
        let err = registry
            .decode(&json!([1, 2, "three"]), "Nums")
            .expect_err("decode should fail");
        assert!(err.to_string().contains("[2]"));
    }

    #[test]
    fn optional_absent_versus_present_null() {
        let registry = Registry::builder()
            .register("Rec", object(vec![opt_field("maybe", string())]))
            .build()
            .expect("registry should build");
        // Missing decodes to Absent and is omitted on encode.
        let decoded = registry.decode(&json!({}), "Rec").expect("decode");
        assert!(decoded.get("maybe").expect("declared field").is_absent());
        assert_eq!(registry.encode(&decoded, "Rec").expect("encode"), json!({}));
        // Present null is NOT accepted by `optional(string())`.
        assert!(registry.decode(&json!({ "maybe": null }), "Rec").is_err());
    }

    #[test]
    fn value_driven_recursion_terminates_on_cycles() {
        let registry = Registry::builder()
            .register("Node", object(vec![opt_field("next", refer("Node"))]))
            .build()
            .expect("registry should build");
        let doc = json!({"next": {"next": {}}});
        let decoded = registry.decode(&doc, "Node").expect("decode should succeed");
        assert_eq!(registry.encode(&decoded, "Node").expect("encode"), doc);
    }
}
