//! The registered Argo Application inventory schema.
//!
//! Mirrors the shape of `argocd app list --output=json`. Every object type
//! captures undeclared fields verbatim, so anything a newer argocd adds
//! survives a decode/encode round trip instead of being silently dropped.
//! Declared-and-required is reserved for the fields the rest of the system
//! actually navigates by; drift on those fails the decode loudly.

use std::sync::OnceLock;

use serde_json::Value as JsonValue;

use argodiff_types::DomainValue;

use crate::decode::SchemaError;
use crate::node::{
    array, boolean, date, field, map_of, number, object, opt_field, refer, string, TypeNode,
};
use crate::registry::{Registry, RegistryError};

/// Name of the top-level inventory type: an array of Applications.
pub const INVENTORY: &str = "Inventory";

/// Name of the per-record Application type.
pub const APPLICATION: &str = "Application";

/// Declare the Application type graph.
pub fn build_registry() -> Result<Registry, RegistryError> {
    Registry::builder()
        .register(INVENTORY, array(refer(APPLICATION)))
        .register(
            APPLICATION,
            object(vec![
                field("metadata", refer("Metadata")),
                field("spec", refer("Spec")),
                field("status", refer("Status")),
                opt_field("operation", TypeNode::Any),
            ]),
        )
        .register(
            "Metadata",
            object(vec![
                field("name", string()),
                opt_field("namespace", string()),
                opt_field("uid", string()),
                opt_field("resourceVersion", string()),
                opt_field("generation", number()),
                opt_field("creationTimestamp", date()),
                opt_field("annotations", map_of(string())),
                opt_field("labels", map_of(string())),
                opt_field("finalizers", array(string())),
            ]),
        )
        .register(
            "Spec",
            object(vec![
                field("source", refer("Source")),
                opt_field("destination", refer("Destination")),
                opt_field("project", string()),
                opt_field("syncPolicy", refer("SyncPolicy")),
                opt_field("ignoreDifferences", array(refer("IgnoreDifference"))),
            ]),
        )
        .register(
            "Source",
            object(vec![
                field("repoURL", string()),
                opt_field("path", string()),
                opt_field("targetRevision", string()),
                opt_field("chart", string()),
                opt_field("helm", refer("Helm")),
                opt_field("directory", refer("Directory")),
            ]),
        )
        .register(
            "Helm",
            object(vec![
                opt_field("valueFiles", array(string())),
                opt_field("values", string()),
                opt_field("skipCrds", boolean()),
                opt_field("releaseName", string()),
            ]),
        )
        .register(
            "Directory",
            object(vec![
                opt_field("recurse", boolean()),
                opt_field("jsonnet", TypeNode::Any),
            ]),
        )
        .register(
            "Destination",
            object(vec![
                opt_field("namespace", string()),
                opt_field("name", string()),
                opt_field("server", string()),
            ]),
        )
        .register(
            "SyncPolicy",
            object(vec![
                opt_field("automated", refer("Automated")),
                opt_field("syncOptions", array(string())),
            ]),
        )
        .register(
            "Automated",
            object(vec![
                opt_field("prune", boolean()),
                opt_field("selfHeal", boolean()),
            ]),
        )
        .register(
            "IgnoreDifference",
            object(vec![
                field("kind", string()),
                opt_field("group", string()),
                opt_field("managedFieldsManagers", array(string())),
                opt_field("jsonPointers", array(string())),
                opt_field("jqPathExpressions", array(string())),
            ]),
        )
        .register(
            "Status",
            object(vec![
                field("sync", refer("SyncStatus")),
                opt_field("health", refer("HealthStatus")),
                opt_field("resources", array(refer("ResourceStatus"))),
                opt_field("history", array(refer("RevisionHistory"))),
                opt_field("reconciledAt", date()),
                opt_field("operationState", refer("OperationState")),
                opt_field("sourceType", string()),
                opt_field("summary", refer("Summary")),
                opt_field("conditions", array(refer("Condition"))),
            ]),
        )
        .register(
            "SyncStatus",
            object(vec![
                // Open string set: argocd may add values, so this is a
                // free-form string, not an enum.
                field("status", string()),
                opt_field("comparedTo", refer("ComparedTo")),
                opt_field("revision", string()),
            ]),
        )
        .register(
            "ComparedTo",
            object(vec![
                field("source", refer("Source")),
                opt_field("destination", refer("Destination")),
            ]),
        )
        .register(
            "HealthStatus",
            object(vec![
                field("status", string()),
                opt_field("message", string()),
            ]),
        )
        .register(
            "ResourceStatus",
            object(vec![
                field("kind", string()),
                field("name", string()),
                opt_field("group", string()),
                opt_field("version", string()),
                opt_field("namespace", string()),
                opt_field("status", string()),
                opt_field("health", refer("HealthStatus")),
                opt_field("hook", boolean()),
                opt_field("requiresPruning", boolean()),
            ]),
        )
        .register(
            "RevisionHistory",
            object(vec![
                field("revision", string()),
                opt_field("id", number()),
                opt_field("deployedAt", date()),
                opt_field("deployStartedAt", date()),
                opt_field("source", refer("Source")),
            ]),
        )
        .register(
            "OperationState",
            object(vec![
                field("phase", string()),
                opt_field("message", string()),
                opt_field("startedAt", date()),
                opt_field("finishedAt", date()),
                opt_field("retryCount", number()),
                opt_field("syncResult", refer("SyncResult")),
                opt_field("operation", TypeNode::Any),
            ]),
        )
        .register(
            "SyncResult",
            object(vec![
                field("revision", string()),
                opt_field("source", refer("Source")),
                opt_field("resources", array(refer("ResourceResult"))),
            ]),
        )
        .register(
            "ResourceResult",
            object(vec![
                opt_field("group", string()),
                opt_field("version", string()),
                opt_field("kind", string()),
                opt_field("namespace", string()),
                opt_field("name", string()),
                opt_field("status", string()),
                opt_field("message", string()),
                opt_field("hookPhase", string()),
                opt_field("syncPhase", string()),
                opt_field("hookType", string()),
            ]),
        )
        .register("Summary", object(vec![opt_field("images", array(string()))]))
        .register(
            "Condition",
            object(vec![
                field("type", string()),
                field("message", string()),
                opt_field("lastTransitionTime", date()),
            ]),
        )
        .build()
}

/// The process-wide Application registry, built once on first use.
///
/// A build failure here is a defect in the declarations above, not a data
/// error, and aborts immediately.
pub fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        build_registry().expect("argo schema registry declarations are consistent")
    })
}

/// One decoded Application record with the fields the driver navigates by
/// extracted up front.
#[derive(Debug, Clone, PartialEq)]
pub struct AppRecord {
    name: String,
    local_path: Option<String>,
    sync_status: String,
    value: DomainValue,
}

impl AppRecord {
    /// Wrap a value decoded against [`APPLICATION`].
    pub fn new(value: DomainValue) -> Self {
        let name = value
            .get_path(&["metadata", "name"])
            .and_then(DomainValue::as_str)
            .unwrap_or_default()
            .to_string();
        let local_path = value
            .get_path(&["spec", "source", "path"])
            .and_then(DomainValue::as_str)
            .map(str::to_string);
        let sync_status = value
            .get_path(&["status", "sync", "status"])
            .and_then(DomainValue::as_str)
            .unwrap_or_default()
            .to_string();
        Self {
            name,
            local_path,
            sync_status,
            value,
        }
    }

    /// The app name (`metadata.name`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The repo-relative manifest path (`spec.source.path`), when present.
    pub fn local_path(&self) -> Option<&str> {
        self.local_path.as_deref()
    }

    /// The raw sync status string (`status.sync.status`).
    pub fn sync_status(&self) -> &str {
        &self.sync_status
    }

    /// True when argocd reports the app as `Synced`.
    pub fn is_synced(&self) -> bool {
        self.sync_status == "Synced"
    }

    /// The full decoded record, captured extras included.
    pub fn value(&self) -> &DomainValue {
        &self.value
    }
}

/// Parse and decode the full `app list --output=json` payload.
pub fn decode_inventory(registry: &Registry, text: &str) -> Result<Vec<AppRecord>, SchemaError> {
    let json: JsonValue =
        serde_json::from_str(text).map_err(|err| SchemaError::Json(err.to_string()))?;
    let decoded = registry.decode(&json, INVENTORY)?;
    let items = match decoded {
        DomainValue::Array(items) => items,
        // INVENTORY is declared as an array; decode can produce nothing else.
        _ => unreachable!("inventory decodes to an array"),
    };
    Ok(items.into_iter().map(AppRecord::new).collect())
}

/// Re-encode decoded records back to the inventory JSON shape.
pub fn encode_inventory(
    registry: &Registry,
    records: &[AppRecord],
) -> Result<JsonValue, SchemaError> {
    let items = DomainValue::Array(records.iter().map(|record| record.value.clone()).collect());
    registry.encode(&items, INVENTORY)
}
