//! Result accumulation keyed by submission index.
//!
//! Tasks complete in any order; the collector pins each outcome to the slot
//! of the task that produced it, so the finalized aggregate is deterministic
//! regardless of scheduling. Misuse (a double record, or finalizing before
//! every task has reported) is a programming error and panics.

use tokio::sync::Mutex;

use argodiff_types::Outcome;

use crate::dispatch::Task;

/// The finalized, ordered collection of per-task outcomes.
#[derive(Debug)]
pub struct Aggregate {
    entries: Vec<(Task, Outcome)>,
    failed: usize,
}

impl Aggregate {
    /// All `(task, outcome)` pairs, in submission order.
    pub fn entries(&self) -> &[(Task, Outcome)] {
        &self.entries
    }

    /// Number of `Failed` outcomes. The overall run fails iff this is
    /// non-zero.
    pub fn failed_count(&self) -> usize {
        self.failed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Append-only accumulation buffer shared by in-flight tasks.
#[derive(Debug)]
pub struct Collector {
    slots: Mutex<Vec<Option<(Task, Outcome)>>>,
}

impl Collector {
    /// A collector expecting exactly `capacity` records.
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots: Mutex::new(slots),
        }
    }

    /// Record the outcome for the task submitted at `index`.
    pub async fn record(&self, index: usize, task: Task, outcome: Outcome) {
        let mut slots = self.slots.lock().await;
        assert!(index < slots.len(), "task index {index} out of range");
        assert!(
            slots[index].is_none(),
            "task index {index} recorded twice"
        );
        slots[index] = Some((task, outcome));
    }

    /// Take the immutable snapshot. Every task must have reported.
    pub async fn finalize(&self) -> Aggregate {
        let mut slots = self.slots.lock().await;
        let entries: Vec<(Task, Outcome)> = std::mem::take(&mut *slots)
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| panic!("finalize before task {index} reported"))
            })
            .collect();
        let failed = entries
            .iter()
            .filter(|(_, outcome)| outcome.is_failure())
            .count();
        Aggregate { entries, failed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argodiff_schema::AppRecord;
    use argodiff_types::{DomainValue, FailureDetail};
    use serde_json::json;

    fn task(name: &str) -> Task {
        let app = AppRecord::new(DomainValue::from_json(
            &json!({"metadata": {"name": name}}),
        ));
        Task::new(format!("app diff {name}"), app)
    }

    #[tokio::test]
    async fn records_land_in_submission_order() {
        let collector = Collector::new(3);
        // Completion order deliberately reversed.
        collector.record(2, task("c"), Outcome::Clean).await;
        collector
            .record(
                1,
                task("b"),
                Outcome::Failed {
                    stderr: "boom".to_string(),
                    detail: FailureDetail::DeadlineExpired,
                },
            )
            .await;
        collector.record(0, task("a"), Outcome::Clean).await;

        let aggregate = collector.finalize().await;
        let names: Vec<&str> = aggregate
            .entries()
            .iter()
            .map(|(task, _)| task.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(aggregate.failed_count(), 1);
    }

    #[tokio::test]
    #[should_panic(expected = "recorded twice")]
    async fn double_record_panics() {
        let collector = Collector::new(1);
        collector.record(0, task("a"), Outcome::Clean).await;
        collector.record(0, task("a"), Outcome::Clean).await;
    }

    #[tokio::test]
    #[should_panic(expected = "finalize before task 1 reported")]
    async fn early_finalize_panics() {
        let collector = Collector::new(2);
        collector.record(0, task("a"), Outcome::Clean).await;
        collector.finalize().await;
    }

    #[tokio::test]
    async fn empty_collector_finalizes_empty() {
        let aggregate = Collector::new(0).finalize().await;
        assert!(aggregate.is_empty());
        assert_eq!(aggregate.failed_count(), 0);
    }
}
