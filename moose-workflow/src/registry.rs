//! Workflow activity runner's own registry: the four
//! activities the orchestrator calls, backed by a simple name-keyed map
//! built once at startup.

use std::collections::HashMap;

use crate::task::{TaskDefinition, WorkflowDefinition};

#[derive(Default)]
pub struct WorkflowRegistry {
    workflows: HashMap<String, WorkflowDefinition>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, workflow: WorkflowDefinition) {
        self.workflows.insert(workflow.name.clone(), workflow);
    }

    /// Activity: `hasWorkflow(name)`.
    pub fn has_workflow(&self, name: &str) -> bool {
        self.workflows.contains_key(name)
    }

    /// Activity: `getWorkflowByName(name)`.
    pub fn get_workflow_by_name(&self, name: &str) -> Option<&WorkflowDefinition> {
        self.workflows.get(name)
    }

    /// Activity: `getTaskForWorkflow(workflow, task)`.
    pub fn get_task_for_workflow(&self, workflow: &str, task: &str) -> Option<&TaskDefinition> {
        self.workflows.get(workflow)?.task(task)
    }
}
