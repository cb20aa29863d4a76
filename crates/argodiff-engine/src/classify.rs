//! Outcome classification — resolving argocd's ambiguous exit code.
//!
//! `argocd app diff` exits non-zero both when differences exist and when
//! execution genuinely failed (argo-cd issue #3588). The exit code alone is
//! therefore not trustworthy for this operation; the presence of diff text
//! on stdout is the actual signal of success-with-differences. This rule is
//! a deliberate workaround for that external contract and must be preserved
//! exactly.

use argodiff_types::{FailureDetail, Outcome, RawResult};

/// Map one raw process result to its tri-state outcome.
///
/// - exit 0 → `Clean`
/// - non-zero with stdout → `DiffFound` (the diff is the payload)
/// - non-zero without stdout → `Failed`
pub fn classify(result: RawResult) -> Outcome {
    if result.ok() {
        return Outcome::Clean;
    }
    if !result.out.is_empty() {
        return Outcome::DiffFound { diff: result.out };
    }
    Outcome::Failed {
        stderr: result.err,
        detail: FailureDetail::Process {
            code: result.code,
            spawn_error: result.spawn_error,
        },
    }
}
