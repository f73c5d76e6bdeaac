//! Task handler traits: each workflow task is a function
//! from `(state, input)` to a result, plus an optional cancellation
//! handler invoked with the same pair.

use std::sync::Arc;

use serde_json::Value;

#[async_trait::async_trait]
pub trait TaskHandler: Send + Sync {
    async fn call(&self, state: Value, input: Value) -> Result<Value, String>;
}

#[async_trait::async_trait]
pub trait CancelHandler: Send + Sync {
    async fn on_cancel(&self, state: Value, input: Value);
}

pub type SharedTaskHandler = Arc<dyn TaskHandler>;
pub type SharedCancelHandler = Arc<dyn CancelHandler>;

/// One task within a workflow.
#[derive(Clone)]
pub struct TaskDefinition {
    pub name: String,
    pub handler: SharedTaskHandler,
    pub on_cancel: Option<SharedCancelHandler>,
}

/// A workflow: a named, ordered set of tasks.
#[derive(Clone)]
pub struct WorkflowDefinition {
    pub name: String,
    pub tasks: Vec<TaskDefinition>,
}

impl WorkflowDefinition {
    pub fn task(&self, task_name: &str) -> Option<&TaskDefinition> {
        self.tasks.iter().find(|t| t.name == task_name)
    }
}
