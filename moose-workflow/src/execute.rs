//! `executeTask`: races a task's future against a
//! cancellation signal, emitting a heartbeat at least every 5 s so the
//! orchestrator doesn't consider the worker dead mid-task.

use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::revival::revive_dates;
use crate::task::TaskDefinition;

/// Maximum gap between heartbeats during task execution.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// Run one task to completion, cancellation, or failure.
///
/// On cancellation, `task.on_cancel` (if any) is invoked with the current
/// `(state, input)` and this returns `Ok([])` — the empty array a
/// cancelled activity returns.
pub async fn execute_task(
    task: &TaskDefinition,
    workflow_name: &str,
    state: Value,
    input: Value,
    cancel: CancellationToken,
    mut on_heartbeat: impl FnMut(),
) -> Result<Value, String> {
    let span = moose_core::logging::task_scope(workflow_name, &task.name);
    async move {
        let mut revived_input = input.clone();
        revive_dates(&mut revived_input);

        let task_future = task.handler.call(state.clone(), revived_input.clone());
        tokio::pin!(task_future);
        let mut ticker = tokio::time::interval(HEARTBEAT_INTERVAL);
        ticker.tick().await; // first tick fires immediately; consume it so heartbeats land on-interval, not instantly

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    if let Some(on_cancel) = &task.on_cancel {
                        on_cancel.on_cancel(state.clone(), revived_input.clone()).await;
                    }
                    return Ok(Value::Array(Vec::new()));
                }
                result = &mut task_future => return result,
                _ = ticker.tick() => on_heartbeat(),
            }
        }
    }
    .instrument(span)
    .await
}
