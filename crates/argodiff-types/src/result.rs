//! RawResult — the captured result of one external process invocation.
//!
//! Produced by the process executor for every task, consumed by the outcome
//! classifier. Raw and unredacted: redaction happens at the display boundary,
//! never before classification.

use serde::{Deserialize, Serialize};

/// The captured output of a single process invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResult {
    /// Exit code. 0 means success. -1 when the process was killed by a
    /// signal and no code was reported.
    pub code: i64,
    /// Raw standard output as a string.
    pub out: String,
    /// Raw standard error as a string.
    pub err: String,
    /// Set when the process could not be spawned or awaited at all,
    /// as opposed to running and exiting non-zero.
    pub spawn_error: Option<String>,
}

impl RawResult {
    /// Create a result from raw output streams.
    pub fn from_output(code: i64, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            code,
            out: stdout.into(),
            err: stderr.into(),
            spawn_error: None,
        }
    }

    /// Create a successful result with output.
    pub fn success(out: impl Into<String>) -> Self {
        Self::from_output(0, out, "")
    }

    /// Create a result for a process that failed to spawn or be awaited.
    ///
    /// Exit code 127 by convention (command not found / not runnable).
    pub fn spawn_failure(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            code: 127,
            out: String::new(),
            err: String::new(),
            spawn_error: Some(message),
        }
    }

    /// True if the process ran and exited with code 0.
    pub fn ok(&self) -> bool {
        self.code == 0 && self.spawn_error.is_none()
    }
}
