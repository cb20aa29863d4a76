//! Outcome — the classified result of one diff task.
//!
//! argocd overloads its exit status: `app diff` exits non-zero both when
//! differences exist and when execution genuinely failed. The classifier
//! resolves that ambiguity into this closed tri-state union so the workaround
//! is visible and independently testable.

use serde::{Deserialize, Serialize};

/// Classified per-task result: clean, diff found, or failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The app matched its live state; no differences.
    Clean,
    /// Differences were found; the diff text is the payload, not an error.
    DiffFound {
        /// Raw diff text from stdout.
        diff: String,
    },
    /// The invocation genuinely failed.
    Failed {
        /// Captured stderr, for diagnostics.
        stderr: String,
        /// What kind of failure this was.
        detail: FailureDetail,
    },
}

/// The failure mode behind an `Outcome::Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureDetail {
    /// The process ran (or failed to spawn) and produced no diff output.
    Process {
        /// Exit code reported by the process.
        code: i64,
        /// Spawn/await error, when the process never ran at all.
        spawn_error: Option<String>,
    },
    /// The executor itself panicked; the panic was caught at the task
    /// boundary so sibling tasks were unaffected.
    Panicked {
        /// Panic message, best effort.
        message: String,
    },
    /// The task was not started (or not finished) before the configured
    /// dispatch deadline.
    DeadlineExpired,
}

impl Outcome {
    /// True for `Failed`, the only variant that makes the overall run fail.
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }

    /// True when there is diff text to show.
    pub fn has_diff(&self) -> bool {
        matches!(self, Outcome::DiffFound { .. })
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Clean => write!(f, "clean"),
            Outcome::DiffFound { .. } => write!(f, "diff found"),
            Outcome::Failed { .. } => write!(f, "failed"),
        }
    }
}
