//! Bounded dispatch — parallel diff execution under a concurrency cap.
//!
//! Tasks are spawned in submission order, each behind a semaphore permit, so
//! at most `limit` executor calls are in flight at any instant. A panic
//! inside one task is caught at the join boundary and becomes that task's
//! `Failed` outcome; sibling tasks are unaffected. Results land in
//! submission order regardless of completion order.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use argodiff_schema::AppRecord;
use argodiff_types::{FailureDetail, Outcome};

use crate::aggregate::{Aggregate, Collector};
use crate::classify::classify;
use crate::exec::Executor;

/// One unit of dispatch: the command to run and the record it came from.
/// Immutable once created; consumed exactly once.
#[derive(Debug, Clone)]
pub struct Task {
    /// The app name, which is the task's identifying key.
    pub name: String,
    /// The argocd subcommand line to execute.
    pub command: String,
    /// The originating inventory record.
    pub app: AppRecord,
}

impl Task {
    pub fn new(command: impl Into<String>, app: AppRecord) -> Self {
        Self {
            name: app.name().to_string(),
            command: command.into(),
            app,
        }
    }
}

/// Dispatch parameters.
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// Maximum number of executor calls in flight. Clamped to at least 1.
    pub limit: usize,
    /// Optional soft deadline: tasks not yet started when it expires are
    /// recorded as failed without being started. In-flight tasks are
    /// allowed to finish.
    pub deadline: Option<Duration>,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            limit: 8,
            deadline: None,
        }
    }
}

/// Run every task through the executor, at most `options.limit` at a time,
/// classifying each raw result. Returns the finalized aggregate in
/// submission order.
pub async fn dispatch(
    tasks: Vec<Task>,
    options: &DispatchOptions,
    executor: Arc<dyn Executor>,
) -> Aggregate {
    let limit = options.limit.max(1);
    let deadline = options
        .deadline
        .map(|duration| tokio::time::Instant::now() + duration);

    let semaphore = Arc::new(Semaphore::new(limit));
    let collector = Arc::new(Collector::new(tasks.len()));
    let mut handles = Vec::with_capacity(tasks.len());

    for (index, task) in tasks.into_iter().enumerate() {
        // Acquire before spawning: submission order is the permit order,
        // and nothing beyond the cap ever starts.
        let acquired = match deadline {
            Some(deadline) => {
                match tokio::time::timeout_at(deadline, semaphore.clone().acquire_owned()).await {
                    Ok(acquired) => acquired,
                    Err(_) => {
                        tracing::warn!(task = %task.name, "deadline expired before start");
                        collector
                            .record(
                                index,
                                task,
                                Outcome::Failed {
                                    stderr: String::new(),
                                    detail: FailureDetail::DeadlineExpired,
                                },
                            )
                            .await;
                        continue;
                    }
                }
            }
            None => semaphore.clone().acquire_owned().await,
        };

        // Keep a copy for the join-error path; the task itself moves into
        // the spawned future.
        let fallback = task.clone();
        let executor = executor.clone();
        let collector_handle = collector.clone();

        let handle = tokio::spawn(async move {
            // acquire_owned only fails when the semaphore is closed, which
            // never happens here; holding the Ok keeps the permit alive for
            // the duration of the task.
            let _permit = acquired;
            tracing::info!(task = %task.name, "running: argocd {}", task.command);
            let raw = executor.run(&task.command).await;
            let outcome = classify(raw);
            collector_handle.record(index, task, outcome).await;
        });
        handles.push((index, fallback, handle));
    }

    for (index, fallback, handle) in handles {
        if let Err(join_error) = handle.await {
            let message = if join_error.is_panic() {
                format!("task panicked: {join_error}")
            } else {
                join_error.to_string()
            };
            tracing::warn!(task = %fallback.name, "{message}");
            collector
                .record(
                    index,
                    fallback,
                    Outcome::Failed {
                        stderr: String::new(),
                        detail: FailureDetail::Panicked { message },
                    },
                )
                .await;
        }
    }

    collector.finalize().await
}
