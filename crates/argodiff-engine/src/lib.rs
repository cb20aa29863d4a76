//! argodiff-engine: the orchestration core.
//!
//! Runs one `argocd app diff` per inventory record under a bounded
//! concurrency cap, classifies each invocation, and aggregates outcomes in
//! submission order:
//!
//! ```text
//! inventory JSON ──▶ schema decode ──▶ one Task per app
//!                                          │
//!                                    dispatch (≤ limit in flight)
//!                                          │
//!                               executor ──▶ RawResult ──▶ classify
//!                                          │
//!                                    Collector (submission order)
//!                                          │
//!                                      Aggregate ──▶ report
//! ```
//!
//! A single misbehaving task never aborts the batch; a malformed inventory
//! aborts the run before anything is dispatched.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod exec;
pub mod install;
pub mod redact;
pub mod report;

pub use aggregate::{Aggregate, Collector};
pub use classify::classify;
pub use config::{diff_command, Config};
pub use dispatch::{dispatch, DispatchOptions, Task};
pub use driver::run_diffs;
pub use error::EngineError;
pub use exec::{ArgoCli, Executor};
pub use redact::Redactor;
pub use report::{render_comment, GithubPoster, ReportContext};
