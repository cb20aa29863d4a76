//! The schema graph: a closed set of node variants plus builder helpers.
//!
//! Optionality is not a field attribute. It is expressed as a union with
//! the `Absent` marker, so "value or missing" and true type alternation
//! (`string | enum`) share one mechanism.

use serde_json::Value as JsonValue;

/// Kinds of JSON primitives a schema can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    /// A JSON string.
    Str,
    /// A JSON number (integer or float).
    Num,
    /// A JSON boolean.
    Bool,
    /// An RFC 3339 timestamp string. JSON `null` is permitted and decodes
    /// to the absent-date marker.
    Date,
}

impl PrimitiveKind {
    /// Human-readable kind name for violation messages.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Str => "string",
            PrimitiveKind::Num => "number",
            PrimitiveKind::Bool => "boolean",
            PrimitiveKind::Date => "date",
        }
    }
}

/// What to do with input fields an object type does not declare.
///
/// Extra-field handling is explicit per object type, never implicit.
#[derive(Debug, Clone)]
pub enum ExtraFields {
    /// Preserve undeclared fields verbatim, decoding each against the given
    /// node (usually `Any`). Captured fields survive a decode/encode round
    /// trip.
    Capture(Box<TypeNode>),
    /// Ignore undeclared fields on decode; drop them on encode.
    Deny,
}

/// One declared field of an object type.
#[derive(Debug, Clone)]
pub struct Field {
    /// JSON field name.
    pub name: &'static str,
    /// The field's type. Wrap in `optional(..)` to allow the field to be
    /// missing from input.
    pub node: TypeNode,
}

/// A node in the statically-declared, mutually-recursive schema graph.
#[derive(Debug, Clone)]
pub enum TypeNode {
    /// A JSON primitive of the given kind.
    Primitive(PrimitiveKind),
    /// A sequence whose elements all match the inner node.
    ArrayOf(Box<TypeNode>),
    /// An object with declared fields and an explicit extra-field policy.
    ObjectOf {
        fields: Vec<Field>,
        extra: ExtraFields,
    },
    /// Alternatives, tried in declared order; the first that decodes wins.
    UnionOf(Vec<TypeNode>),
    /// A closed set of literal values, matched exactly.
    EnumOf(Vec<JsonValue>),
    /// A reference to a registered type, resolved at registry build time.
    Ref(&'static str),
    /// Matches only a *missing* field. Union member expressing optionality;
    /// never matches a present `null`.
    Absent,
    /// Matches any present value verbatim. Used for catch-all capture.
    Any,
}

impl TypeNode {
    /// Short description of what this node expects, for violation messages.
    pub fn expected(&self) -> String {
        match self {
            TypeNode::Primitive(kind) => kind.name().to_string(),
            TypeNode::ArrayOf(_) => "array".to_string(),
            TypeNode::ObjectOf { .. } => "object".to_string(),
            TypeNode::UnionOf(members) => {
                let names: Vec<String> = members.iter().map(TypeNode::expected).collect();
                format!("one of: {}", names.join(" | "))
            }
            TypeNode::EnumOf(values) => {
                let names: Vec<String> = values.iter().map(JsonValue::to_string).collect();
                format!("enum of: {}", names.join(", "))
            }
            TypeNode::Ref(name) => (*name).to_string(),
            TypeNode::Absent => "absent".to_string(),
            TypeNode::Any => "any value".to_string(),
        }
    }
}

/// A required string field type.
pub fn string() -> TypeNode {
    TypeNode::Primitive(PrimitiveKind::Str)
}

/// A required number field type.
pub fn number() -> TypeNode {
    TypeNode::Primitive(PrimitiveKind::Num)
}

/// A required boolean field type.
pub fn boolean() -> TypeNode {
    TypeNode::Primitive(PrimitiveKind::Bool)
}

/// A timestamp field type.
pub fn date() -> TypeNode {
    TypeNode::Primitive(PrimitiveKind::Date)
}

/// An array of `inner`.
pub fn array(inner: TypeNode) -> TypeNode {
    TypeNode::ArrayOf(Box::new(inner))
}

/// An object with declared fields, preserving undeclared fields verbatim.
pub fn object(fields: Vec<Field>) -> TypeNode {
    TypeNode::ObjectOf {
        fields,
        extra: ExtraFields::Capture(Box::new(TypeNode::Any)),
    }
}

/// An object with declared fields that ignores undeclared fields.
pub fn closed_object(fields: Vec<Field>) -> TypeNode {
    TypeNode::ObjectOf {
        fields,
        extra: ExtraFields::Deny,
    }
}

/// A string-keyed map whose values all match `inner`.
pub fn map_of(inner: TypeNode) -> TypeNode {
    TypeNode::ObjectOf {
        fields: Vec::new(),
        extra: ExtraFields::Capture(Box::new(inner)),
    }
}

/// A union of alternatives, tried in declared order.
pub fn union(members: Vec<TypeNode>) -> TypeNode {
    TypeNode::UnionOf(members)
}

/// `inner` or missing. The `Absent` member is declared first so a missing
/// field resolves without trying the value alternative.
pub fn optional(inner: TypeNode) -> TypeNode {
    TypeNode::UnionOf(vec![TypeNode::Absent, inner])
}

/// A closed set of literal values.
pub fn literals(values: Vec<JsonValue>) -> TypeNode {
    TypeNode::EnumOf(values)
}

/// A reference to a registered type name.
pub fn refer(name: &'static str) -> TypeNode {
    TypeNode::Ref(name)
}

/// A declared field.
pub fn field(name: &'static str, node: TypeNode) -> Field {
    Field { name, node }
}

/// A declared field that may be missing from input.
pub fn opt_field(name: &'static str, node: TypeNode) -> Field {
    Field {
        name,
        node: optional(node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_puts_absent_first() {
        match optional(string()) {
            TypeNode::UnionOf(members) => {
                assert!(matches!(members[0], TypeNode::Absent));
                assert!(matches!(members[1], TypeNode::Primitive(PrimitiveKind::Str)));
            }
            other => panic!("expected union, got {other:?}"),
        }
    }

    #[test]
    fn expected_describes_unions() {
        let node = union(vec![string(), number()]);
        assert_eq!(node.expected(), "one of: string | number");
    }

    #[test]
    fn expected_describes_enums() {
        let node = literals(vec!["Synced".into(), "OutOfSync".into()]);
        assert_eq!(node.expected(), "enum of: \"Synced\", \"OutOfSync\"");
    }
}
