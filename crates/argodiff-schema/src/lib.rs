//! argodiff-schema: declarative type graph and strict JSON validation.
//!
//! The argocd CLI emits JSON that is untyped at the boundary. This crate
//! rejects drift loudly instead of misinterpreting it silently: a declarative,
//! mutually-recursive schema graph ([`TypeNode`]) is interpreted over input
//! values to produce typed [`DomainValue`]s, and the transformation is
//! bidirectional (`encode` is the structural inverse of `decode`).
//!
//! - **node**: the schema graph and its builder helpers
//! - **registry**: name → node table, resolved and checked once at startup
//! - **decode**: the recursive decode/encode interpreter
//! - **argo**: the registered Argo Application inventory schema
//!
//! Recursion follows the *value* shape, not the schema graph, so cycles in
//! the graph are fine: a reference is only followed as deep as the input
//! actually nests.

pub mod argo;
pub mod decode;
pub mod node;
pub mod registry;

pub use argodiff_types::DomainValue;
pub use argo::AppRecord;
pub use decode::SchemaError;
pub use node::{ExtraFields, Field, PrimitiveKind, TypeNode};
pub use registry::{Registry, RegistryError};
