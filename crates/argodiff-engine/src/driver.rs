//! The orchestration driver: inventory in, aggregate out.
//!
//! Decoding happens before anything is dispatched. A malformed inventory is
//! a configuration error, not a per-task error: none of the tasks computed
//! from it would be trustworthy, so the run aborts immediately.

use std::sync::Arc;

use argodiff_schema::{argo, AppRecord};

use crate::aggregate::Aggregate;
use crate::dispatch::{dispatch, DispatchOptions, Task};
use crate::error::EngineError;
use crate::exec::Executor;

/// Decode the inventory, build one task per app, and dispatch them all.
pub async fn run_diffs<F>(
    inventory_json: &str,
    options: &DispatchOptions,
    command_builder: F,
    executor: Arc<dyn Executor>,
) -> Result<Aggregate, EngineError>
where
    F: Fn(&AppRecord) -> String,
{
    let records = argo::decode_inventory(argo::registry(), inventory_json)?;
    tracing::info!(
        "found apps: {}",
        records
            .iter()
            .map(AppRecord::name)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let tasks: Vec<Task> = records
        .into_iter()
        .map(|app| Task::new(command_builder(&app), app))
        .collect();

    Ok(dispatch(tasks, options, executor).await)
}
