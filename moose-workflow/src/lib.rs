//! Workflow activity runner: `hasWorkflow`,
//! `getWorkflowByName`, `getTaskForWorkflow`, `executeTask`.

mod execute;
mod registry;
mod revival;
mod task;

pub use execute::{execute_task, HEARTBEAT_INTERVAL};
pub use registry::WorkflowRegistry;
pub use revival::revive_dates;
pub use task::{CancelHandler, SharedCancelHandler, SharedTaskHandler, TaskDefinition, TaskHandler, WorkflowDefinition};
