//! Registry — the name → node table behind `Ref` resolution.
//!
//! Built once at startup and immutable thereafter; shared by reference with
//! no synchronization. An unresolved reference is a programming error and
//! aborts construction; it is never deferred to decode time.

use std::collections::HashMap;

use thiserror::Error;

use crate::node::{ExtraFields, TypeNode};

/// Errors raised while building a registry. These indicate a defect in the
/// schema declaration itself, not in any input data.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    #[error("type {referrer} references unregistered type {reference}")]
    UnresolvedRef {
        referrer: String,
        reference: String,
    },
    #[error("type {0} registered twice")]
    DuplicateType(String),
}

/// Process-wide mapping from name to schema node.
#[derive(Debug)]
pub struct Registry {
    nodes: HashMap<&'static str, TypeNode>,
}

/// Accumulates type declarations before reference checking.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    nodes: HashMap<&'static str, TypeNode>,
    order: Vec<&'static str>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a named type. Redeclaring a name is an error at build time.
    pub fn register(mut self, name: &'static str, node: TypeNode) -> Self {
        self.nodes.insert(name, node);
        self.order.push(name);
        self
    }

    /// Check every reference and freeze the registry.
    pub fn build(self) -> Result<Registry, RegistryError> {
        let mut seen = std::collections::HashSet::new();
        for name in &self.order {
            if !seen.insert(*name) {
                return Err(RegistryError::DuplicateType((*name).to_string()));
            }
        }
        for (name, node) in &self.nodes {
            check_refs(name, node, &self.nodes)?;
        }
        Ok(Registry { nodes: self.nodes })
    }
}

fn check_refs(
    referrer: &str,
    node: &TypeNode,
    nodes: &HashMap<&'static str, TypeNode>,
) -> Result<(), RegistryError> {
    match node {
        TypeNode::Ref(reference) => {
            if !nodes.contains_key(reference) {
                return Err(RegistryError::UnresolvedRef {
                    referrer: referrer.to_string(),
                    reference: (*reference).to_string(),
                });
            }
            Ok(())
        }
        TypeNode::ArrayOf(inner) => check_refs(referrer, inner, nodes),
        TypeNode::ObjectOf { fields, extra } => {
            for field in fields {
                check_refs(referrer, &field.node, nodes)?;
            }
            if let ExtraFields::Capture(inner) = extra {
                check_refs(referrer, inner, nodes)?;
            }
            Ok(())
        }
        TypeNode::UnionOf(members) => {
            for member in members {
                check_refs(referrer, member, nodes)?;
            }
            Ok(())
        }
        TypeNode::Primitive(_) | TypeNode::EnumOf(_) | TypeNode::Absent | TypeNode::Any => Ok(()),
    }
}

impl Registry {
    /// Start declaring types.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Resolve a registered type by name.
    pub fn get(&self, name: &str) -> Option<&TypeNode> {
        self.nodes.get(name)
    }

    /// Names of all registered types, for diagnostics and tests.
    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.nodes.keys().copied()
    }
}
