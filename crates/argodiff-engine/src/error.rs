//! Engine errors.
//!
//! Only pre-dispatch problems surface as errors: a malformed inventory means
//! none of the computed tasks are trustworthy. Per-task failures are data
//! (`Outcome::Failed` in the aggregate), never errors that unwind.

use thiserror::Error;

/// Errors that abort a run (as opposed to per-task failures, which do not).
#[derive(Debug, Error)]
pub enum EngineError {
    /// The inventory did not decode against the Application schema.
    #[error("inventory rejected: {0}")]
    Inventory(#[from] argodiff_schema::SchemaError),
    /// The inventory listing call itself failed.
    #[error("listing applications failed: {0}")]
    Listing(String),
    /// Downloading or installing the argocd binary failed.
    #[error("argocd install failed: {0}")]
    Install(String),
    /// Publishing the rendered report failed.
    #[error("posting comment failed: {0}")]
    Post(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
