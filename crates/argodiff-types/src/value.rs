//! DomainValue — the decoded in-memory representation of a JSON document.
//!
//! Produced by schema decoding, consumed to re-encode. The representation is
//! richer than raw JSON in two ways: timestamps are parsed (`Date`), and a
//! field legitimately missing from input decodes to an explicit `Absent`
//! marker, distinct from a present `null`.

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde_json::Value as JsonValue;

/// A decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainValue {
    Null,
    Bool(bool),
    /// Numbers keep their JSON representation so integers survive a
    /// round trip without becoming floats.
    Num(serde_json::Number),
    Str(String),
    /// A parsed timestamp. `None` is the absent-date marker: JSON `null`
    /// on a date-typed field, re-encoded as `null`.
    Date(Option<DateTime<FixedOffset>>),
    Array(Vec<DomainValue>),
    /// Fields in declaration order, captured extras appended after.
    Object(Vec<(String, DomainValue)>),
    /// A declared optional field that was missing from input. Omitted
    /// entirely on encode, which is what distinguishes it from `Null`.
    Absent,
}

impl DomainValue {
    /// Look up a field of an object by name.
    pub fn get(&self, name: &str) -> Option<&DomainValue> {
        match self {
            DomainValue::Object(fields) => fields
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Follow a chain of object fields, stopping at the first miss.
    pub fn get_path(&self, path: &[&str]) -> Option<&DomainValue> {
        let mut current = self;
        for name in path {
            current = current.get(name)?;
        }
        Some(current)
    }

    /// The string content, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DomainValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// True for the absent marker.
    pub fn is_absent(&self) -> bool {
        matches!(self, DomainValue::Absent)
    }

    /// Convert raw JSON verbatim, with no schema applied.
    ///
    /// Used for catch-all capture of undeclared fields: no dates are parsed
    /// and nothing becomes `Absent`, so `to_json` reproduces the input
    /// exactly.
    pub fn from_json(json: &JsonValue) -> DomainValue {
        match json {
            JsonValue::Null => DomainValue::Null,
            JsonValue::Bool(b) => DomainValue::Bool(*b),
            JsonValue::Number(n) => DomainValue::Num(n.clone()),
            JsonValue::String(s) => DomainValue::Str(s.clone()),
            JsonValue::Array(items) => {
                DomainValue::Array(items.iter().map(DomainValue::from_json).collect())
            }
            JsonValue::Object(map) => DomainValue::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), DomainValue::from_json(value)))
                    .collect(),
            ),
        }
    }

    /// Convert back to raw JSON.
    ///
    /// `Absent` values inside objects are omitted; a free-standing `Absent`
    /// becomes `null` (it has no field to be omitted from). Dates serialize
    /// to their canonical RFC 3339 form with a `Z` suffix.
    pub fn to_json(&self) -> JsonValue {
        match self {
            DomainValue::Null => JsonValue::Null,
            DomainValue::Bool(b) => JsonValue::Bool(*b),
            DomainValue::Num(n) => JsonValue::Number(n.clone()),
            DomainValue::Str(s) => JsonValue::String(s.clone()),
            DomainValue::Date(None) => JsonValue::Null,
            DomainValue::Date(Some(ts)) => {
                JsonValue::String(ts.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            DomainValue::Array(items) => {
                JsonValue::Array(items.iter().map(DomainValue::to_json).collect())
            }
            DomainValue::Object(fields) => {
                let mut map = serde_json::Map::new();
                for (key, value) in fields {
                    if value.is_absent() {
                        continue;
                    }
                    map.insert(key.clone(), value.to_json());
                }
                JsonValue::Object(map)
            }
            DomainValue::Absent => JsonValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_round_trips_verbatim() {
        let json = json!({
            "name": "guestbook",
            "replicas": 3,
            "labels": {"env": "prod"},
            "tags": ["a", "b"],
            "deleted": null
        });
        let value = DomainValue::from_json(&json);
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn absent_fields_are_omitted_on_encode() {
        let value = DomainValue::Object(vec![
            ("name".to_string(), DomainValue::Str("app".to_string())),
            ("path".to_string(), DomainValue::Absent),
        ]);
        assert_eq!(value.to_json(), json!({"name": "app"}));
    }

    #[test]
    fn absent_is_distinct_from_null() {
        let value = DomainValue::Object(vec![
            ("a".to_string(), DomainValue::Null),
            ("b".to_string(), DomainValue::Absent),
        ]);
        assert_eq!(value.to_json(), json!({"a": null}));
    }

    #[test]
    fn date_encodes_canonical_rfc3339() {
        let ts = DateTime::parse_from_rfc3339("2021-02-18T16:52:20Z").unwrap();
        assert_eq!(
            DomainValue::Date(Some(ts)).to_json(),
            json!("2021-02-18T16:52:20Z")
        );
        assert_eq!(DomainValue::Date(None).to_json(), json!(null));
    }

    #[test]
    fn get_path_walks_nested_objects() {
        let value = DomainValue::from_json(&json!({
            "metadata": {"name": "guestbook"}
        }));
        assert_eq!(
            value.get_path(&["metadata", "name"]).and_then(|v| v.as_str()),
            Some("guestbook")
        );
        assert!(value.get_path(&["metadata", "missing"]).is_none());
    }
}
