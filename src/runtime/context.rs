use std::sync::Arc;

use crate::{
    Result,
    common::Shutdown,
    graph::WorkflowNode,
    run::{RunId, RunTracker, WorkflowRunLogOutput},
};

/// What a [`NodeExecutor`](crate::NodeExecutor) sees of the run it executes in.
#[derive(Clone)]
pub struct NodeContext {
    run_id: RunId,
    workflow_id: String,
    node: WorkflowNode,
    runs: Arc<RunTracker>,
    cancel: Arc<Shutdown>,
}

impl NodeContext {
    pub(crate) fn new(
        run_id: RunId,
        workflow_id: String,
        node: WorkflowNode,
        runs: Arc<RunTracker>,
        cancel: Arc<Shutdown>,
    ) -> Self {
        Self {
            run_id,
            workflow_id,
            node,
            runs,
            cancel,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn workflow_id(&self) -> &str {
        &self.workflow_id
    }

    pub fn node(&self) -> &WorkflowNode {
        &self.node
    }

    pub fn provider_type(&self) -> Option<&str> {
        self.node.provider_type.as_deref()
    }

    /// Appends an output to this node's run log.
    pub fn emit(
        &self,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<()> {
        self.runs.append_output(&self.run_id, &self.node.id, WorkflowRunLogOutput::new(title, content))
    }

    /// Appends an output carrying an error. The node itself is not failed by this.
    pub fn emit_error(
        &self,
        title: impl Into<String>,
        content: impl Into<String>,
        error: impl Into<String>,
    ) -> Result<()> {
        self.runs.append_output(&self.run_id, &self.node.id, WorkflowRunLogOutput::new(title, content).with_error(error))
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_shutdown()
    }
}
