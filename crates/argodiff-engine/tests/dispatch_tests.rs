//! Dispatcher tests with instrumented fake executors.
//!
//! No real argocd here: the executor seam is what these tests exercise.
//! Overlap stays under the cap, ordering is by submission, and one
//! misbehaving task never takes the batch down.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use argodiff_engine::{dispatch, DispatchOptions, Executor, Task};
use argodiff_schema::AppRecord;
use argodiff_types::{DomainValue, FailureDetail, Outcome, RawResult};

fn task(name: &str) -> Task {
    let app = AppRecord::new(DomainValue::from_json(&json!({
        "metadata": {"name": name}
    })));
    Task::new(format!("app diff {name}"), app)
}

fn tasks(count: usize) -> Vec<Task> {
    (0..count).map(|index| task(&format!("app-{index}"))).collect()
}

/// Counts how many `run` calls overlap.
struct CountingExecutor {
    current: AtomicUsize,
    max_overlap: AtomicUsize,
}

impl CountingExecutor {
    fn new() -> Self {
        Self {
            current: AtomicUsize::new(0),
            max_overlap: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Executor for CountingExecutor {
    async fn run(&self, _command: &str) -> RawResult {
        let in_flight = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_overlap.fetch_max(in_flight, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        RawResult::success("")
    }
}

#[tokio::test]
async fn overlap_never_exceeds_the_limit() {
    let executor = Arc::new(CountingExecutor::new());
    let options = DispatchOptions {
        limit: 3,
        deadline: None,
    };

    let aggregate = dispatch(tasks(10), &options, executor.clone()).await;

    assert_eq!(aggregate.len(), 10);
    let names: Vec<&str> = aggregate
        .entries()
        .iter()
        .map(|(task, _)| task.name.as_str())
        .collect();
    let expected: Vec<String> = (0..10).map(|index| format!("app-{index}")).collect();
    assert_eq!(names, expected);
    let max = executor.max_overlap.load(Ordering::SeqCst);
    assert!(max <= 3, "observed {max} overlapping executor calls");
    // The cap is actually used, not accidentally serialized.
    assert!(max >= 2, "expected some overlap, observed {max}");
}

/// Finishes later tasks first, so completion order is the reverse of
/// submission order.
struct ReversingExecutor;

#[async_trait]
impl Executor for ReversingExecutor {
    async fn run(&self, command: &str) -> RawResult {
        let index: u64 = command
            .rsplit('-')
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(60 - index * 10)).await;
        RawResult::from_output(1, format!("diff for {command}"), "")
    }
}

#[tokio::test]
async fn results_keep_submission_order_regardless_of_completion_order() {
    let options = DispatchOptions {
        limit: 6,
        deadline: None,
    };
    let aggregate = dispatch(tasks(6), &options, Arc::new(ReversingExecutor)).await;

    let names: Vec<&str> = aggregate
        .entries()
        .iter()
        .map(|(task, _)| task.name.as_str())
        .collect();
    assert_eq!(names, vec!["app-0", "app-1", "app-2", "app-3", "app-4", "app-5"]);
    for (task, outcome) in aggregate.entries() {
        assert_eq!(
            outcome,
            &Outcome::DiffFound {
                diff: format!("diff for app diff {}", task.name)
            }
        );
    }
}

/// Panics on one specific task.
struct PanickingExecutor;

#[async_trait]
impl Executor for PanickingExecutor {
    async fn run(&self, command: &str) -> RawResult {
        if command.ends_with("app-3") {
            panic!("executor exploded");
        }
        RawResult::success("")
    }
}

#[tokio::test]
async fn one_panicking_task_does_not_abort_the_batch() {
    let options = DispatchOptions {
        limit: 4,
        deadline: None,
    };
    let aggregate = dispatch(tasks(10), &options, Arc::new(PanickingExecutor)).await;

    assert_eq!(aggregate.len(), 10);
    assert_eq!(aggregate.failed_count(), 1);
    for (index, (task, outcome)) in aggregate.entries().iter().enumerate() {
        if index == 3 {
            match outcome {
                Outcome::Failed { detail, .. } => {
                    assert!(matches!(detail, FailureDetail::Panicked { .. }));
                }
                other => panic!("task {} should have failed, got {other:?}", task.name),
            }
        } else {
            assert_eq!(outcome, &Outcome::Clean, "task {} was affected", task.name);
        }
    }
}

/// Slow enough that a short deadline expires while the first task runs.
struct SlowExecutor;

#[async_trait]
impl Executor for SlowExecutor {
    async fn run(&self, _command: &str) -> RawResult {
        tokio::time::sleep(Duration::from_millis(200)).await;
        RawResult::success("")
    }
}

#[tokio::test]
async fn deadline_fails_unstarted_tasks_and_finishes_in_flight_ones() {
    let options = DispatchOptions {
        limit: 1,
        deadline: Some(Duration::from_millis(50)),
    };
    let aggregate = dispatch(tasks(3), &options, Arc::new(SlowExecutor)).await;

    assert_eq!(aggregate.len(), 3);
    // The first task started before the deadline and ran to completion.
    assert_eq!(aggregate.entries()[0].1, Outcome::Clean);
    // The rest never started.
    for (task, outcome) in &aggregate.entries()[1..] {
        match outcome {
            Outcome::Failed { detail, .. } => {
                assert_eq!(
                    detail,
                    &FailureDetail::DeadlineExpired,
                    "task {} should have timed out",
                    task.name
                );
            }
            other => panic!("task {} should have timed out, got {other:?}", task.name),
        }
    }
    assert_eq!(aggregate.failed_count(), 2);
}

#[tokio::test]
async fn zero_limit_is_clamped_to_one() {
    let options = DispatchOptions {
        limit: 0,
        deadline: None,
    };
    let executor = Arc::new(CountingExecutor::new());
    let aggregate = dispatch(tasks(3), &options, executor.clone()).await;
    assert_eq!(aggregate.len(), 3);
    assert_eq!(executor.max_overlap.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_task_list_yields_empty_aggregate() {
    let aggregate = dispatch(
        Vec::new(),
        &DispatchOptions::default(),
        Arc::new(CountingExecutor::new()),
    )
    .await;
    assert!(aggregate.is_empty());
    assert_eq!(aggregate.failed_count(), 0);
}
