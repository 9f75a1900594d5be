//! Run dispatcher for executing the nodes of one workflow run.
//!
//! The dispatcher begins the root node, then walks the tree below it. When a node finishes,
//! its children start concurrently; a failed node records its error and its
//! subtree is skipped. Once every reachable node is done the run completes,
//! failed with the first recorded error or succeeded.

use std::sync::Arc;

use futures::{
    FutureExt,
    future::{BoxFuture, join_all},
};
use tracing::{debug, info, warn};

use crate::{
    DeployflowError,
    common::Shutdown,
    graph::{NodeId, Workflow, WorkflowNode},
    run::{RunId, RunStatus, RunTracker},
    runtime::{NodeContext, NodeExecutor},
};

pub(crate) const CANCELLED: &str = "run cancelled";

pub struct Dispatcher {
    run_id: RunId,
    workflow: Arc<Workflow>,
    runs: Arc<RunTracker>,
    executor: Arc<dyn NodeExecutor>,
    cancel: Arc<Shutdown>,
}

impl Dispatcher {
    pub fn new(
        run_id: RunId,
        workflow: Arc<Workflow>,
        runs: Arc<RunTracker>,
        executor: Arc<dyn NodeExecutor>,
        cancel: Arc<Shutdown>,
    ) -> Self {
        Self {
            run_id,
            workflow,
            runs,
            executor,
            cancel,
        }
    }

    /// Executes the whole tree and completes the run.
    ///
    /// The root node begins first, so every dispatched run is running before
    /// any outcome is recorded.
    pub async fn execute(self: Arc<Self>) {
        info!("run {} of workflow {} started", self.run_id, self.workflow.id());
        let root = self.workflow.root();
        if let Err(e) = self.runs.begin_node(&self.run_id, &root.id, &root.name) {
            warn!("run {} could not begin: {}", self.run_id, e);
            return;
        }
        self.workflow.record_run(&self.run_id, RunStatus::Running);
        self.clone().walk(root.id).await;

        let run = match self.runs.get_run(&self.run_id) {
            Ok(run) => run,
            Err(e) => {
                warn!("run {} vanished before completion: {}", self.run_id, e);
                return;
            }
        };
        if run.is_terminal() {
            debug!("run {} was completed externally", self.run_id);
            self.workflow.record_run(&self.run_id, run.status);
            return;
        }

        let (status, error) = if self.cancel.is_shutdown() {
            (RunStatus::Failed, Some(CANCELLED.to_string()))
        } else if let Some(e) = run.first_error() {
            (RunStatus::Failed, Some(e.to_string()))
        } else {
            (RunStatus::Succeeded, None)
        };

        match self.runs.complete_run(&self.run_id, status, error) {
            Ok(run) => {
                info!("run {} of workflow {} finished: {}", self.run_id, self.workflow.id(), run.status);
                self.workflow.record_run(&self.run_id, run.status);
            }
            Err(e) => warn!("run {} could not be completed: {}", self.run_id, e),
        }
    }

    /// Runs the children of `parent_id` concurrently.
    fn walk(
        self: Arc<Self>,
        parent_id: NodeId,
    ) -> BoxFuture<'static, ()> {
        async move {
            let children = match self.workflow.children_of(&parent_id) {
                Ok(children) => children,
                Err(e) => {
                    warn!("run {}: {}", self.run_id, e);
                    return;
                }
            };
            join_all(children.into_iter().map(|child| self.clone().run_node(child))).await;
        }
        .boxed()
    }

    async fn run_node(
        self: Arc<Self>,
        node: WorkflowNode,
    ) {
        if self.cancel.is_shutdown() {
            return;
        }
        if let Err(e) = self.runs.begin_node(&self.run_id, &node.id, &node.name) {
            warn!("run {}: node {} not started: {}", self.run_id, node.id, e);
            return;
        }

        let ctx = NodeContext::new(self.run_id.clone(), self.workflow.id().to_string(), node.clone(), self.runs.clone(), self.cancel.clone());
        let result = tokio::select! {
            result = self.executor.execute(&ctx) => result,
            _ = self.cancel.wait() => Err(DeployflowError::Engine(CANCELLED.to_string())),
        };

        match result {
            Ok(()) => self.walk(node.id).await,
            Err(e) => {
                warn!("run {}: node {} ({}) failed: {}", self.run_id, node.id, node.name, e);
                if let Err(e) = self.runs.fail_node(&self.run_id, &node.id, &e.to_string()) {
                    warn!("run {}: failure of node {} not recorded: {}", self.run_id, node.id, e);
                }
            }
        }
    }
}
