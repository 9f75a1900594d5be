//! Run log model.
//!
//! `RunTracker` keeps every run behind its own mutex and indexes runs by
//! workflow. The registry lock is only taken to look a run up, so appends to
//! unrelated runs never wait on each other.

mod record;
mod status;

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock},
};

use tracing::{debug, trace};

pub use record::{RunId, TRIGGER_AUTO, TRIGGER_MANUAL, WorkflowRun, WorkflowRunLog, WorkflowRunLogOutput};
pub use status::RunStatus;

use crate::{
    DeployflowError, Result, ShareLock,
    events::{RunEvent, RunEventKind},
    runtime::Channel,
    utils,
};

type RunSlot = Arc<Mutex<WorkflowRun>>;

#[derive(Default)]
struct Registry {
    runs: HashMap<RunId, RunSlot>,
    by_workflow: HashMap<String, Vec<RunId>>,
}

pub struct RunTracker {
    registry: ShareLock<Registry>,
    channel: Arc<Channel>,
}

impl RunTracker {
    pub fn new(channel: Arc<Channel>) -> Self {
        Self {
            registry: Arc::new(RwLock::new(Registry::default())),
            channel,
        }
    }

    /// Creates a pending run for `workflow_id`.
    ///
    /// The workflow is referenced, not checked: runs may outlive their workflow.
    pub fn start_run(
        &self,
        workflow_id: &str,
        trigger: &str,
    ) -> WorkflowRun {
        let run = {
            let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
            let id = loop {
                let id = utils::longid();
                if !registry.runs.contains_key(&id) {
                    break id;
                }
            };
            let run = WorkflowRun::new(id.clone(), workflow_id, trigger);
            registry.runs.insert(id.clone(), Arc::new(Mutex::new(run.clone())));
            registry.by_workflow.entry(workflow_id.to_string()).or_default().push(id);
            run
        };

        debug!("run {} of workflow {} created, trigger: {}", run.id, workflow_id, trigger);
        self.publish(RunEvent::new(
            &run.id,
            workflow_id,
            None,
            RunEventKind::Started {
                trigger: trigger.to_string(),
            },
        ));
        run
    }

    pub fn begin_node(
        &self,
        run_id: &str,
        node_id: &str,
        node_name: &str,
    ) -> Result<()> {
        trace!("run::begin_node({}, {})", run_id, node_id);
        let slot = self.slot(run_id)?;
        let workflow_id = {
            let mut run = lock(&slot);
            let was_pending = run.status == RunStatus::Pending;
            run.begin_node(node_id, node_name)?;
            if was_pending {
                debug!("run {} is running", run_id);
            }
            run.workflow_id.clone()
        };

        self.publish(RunEvent::new(
            run_id,
            &workflow_id,
            Some(node_id),
            RunEventKind::NodeBegan {
                node_name: node_name.to_string(),
            },
        ));
        Ok(())
    }

    pub fn append_output(
        &self,
        run_id: &str,
        node_id: &str,
        output: WorkflowRunLogOutput,
    ) -> Result<()> {
        trace!("run::append_output({}, {}, {})", run_id, node_id, output.title);
        let slot = self.slot(run_id)?;
        let workflow_id = {
            let mut run = lock(&slot);
            run.append_output(node_id, output.clone())?;
            run.workflow_id.clone()
        };

        self.publish(RunEvent::new(run_id, &workflow_id, Some(node_id), RunEventKind::Output(output)));
        Ok(())
    }

    pub fn fail_node(
        &self,
        run_id: &str,
        node_id: &str,
        error: &str,
    ) -> Result<()> {
        trace!("run::fail_node({}, {})", run_id, node_id);
        let slot = self.slot(run_id)?;
        let workflow_id = {
            let mut run = lock(&slot);
            run.fail_node(node_id, error)?;
            run.workflow_id.clone()
        };

        self.publish(RunEvent::new(
            run_id,
            &workflow_id,
            Some(node_id),
            RunEventKind::NodeFailed {
                error: error.to_string(),
            },
        ));
        Ok(())
    }

    /// Sets the terminal status of a run. A second call fails with `InvalidState`.
    pub fn complete_run(
        &self,
        run_id: &str,
        outcome: RunStatus,
        error: Option<String>,
    ) -> Result<WorkflowRun> {
        let slot = self.slot(run_id)?;
        let run = {
            let mut run = lock(&slot);
            run.complete(outcome, error)?;
            run.clone()
        };

        debug!("run {} completed: {}", run_id, run.status);
        self.publish(RunEvent::new(
            run_id,
            &run.workflow_id,
            None,
            RunEventKind::Completed {
                status: run.status,
                error: run.error.clone(),
            },
        ));
        Ok(run)
    }

    /// Drops a run that never left `Pending`, as if it had not been started.
    ///
    /// Used for runs that were never handed to a worker. Fails with `InvalidState`
    /// once the run has begun.
    pub fn discard_run(
        &self,
        run_id: &str,
        reason: &str,
    ) -> Result<WorkflowRun> {
        let run = {
            let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
            let slot = registry.runs.get(run_id).cloned().ok_or_else(|| DeployflowError::NotFound(format!("run {} not found", run_id)))?;
            let run = lock(&slot).clone();
            if run.status != RunStatus::Pending {
                return Err(DeployflowError::InvalidState(format!("run {} is {} and cannot be discarded", run_id, run.status)));
            }
            registry.runs.remove(run_id);
            if let Some(ids) = registry.by_workflow.get_mut(&run.workflow_id) {
                ids.retain(|id| id != run_id);
            }
            run
        };

        debug!("run {} discarded: {}", run_id, reason);
        self.publish(RunEvent::new(
            run_id,
            &run.workflow_id,
            None,
            RunEventKind::Discarded {
                reason: reason.to_string(),
            },
        ));
        Ok(run)
    }

    /// Snapshot of a run.
    pub fn get_run(
        &self,
        run_id: &str,
    ) -> Result<WorkflowRun> {
        Ok(lock(&self.slot(run_id)?).clone())
    }

    /// Snapshots of all runs of a workflow, oldest first.
    pub fn list_runs(
        &self,
        workflow_id: &str,
    ) -> Vec<WorkflowRun> {
        let slots: Vec<RunSlot> = {
            let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
            registry
                .by_workflow
                .get(workflow_id)
                .map(|ids| ids.iter().filter_map(|id| registry.runs.get(id).cloned()).collect())
                .unwrap_or_default()
        };
        slots.iter().map(|slot| lock(slot).clone()).collect()
    }

    /// The id of the newest non-terminal run of a workflow, if any.
    pub fn active_run(
        &self,
        workflow_id: &str,
    ) -> Option<RunId> {
        self.list_runs(workflow_id).into_iter().rev().find(|r| !r.is_terminal()).map(|r| r.id)
    }

    fn slot(
        &self,
        run_id: &str,
    ) -> Result<RunSlot> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .runs
            .get(run_id)
            .cloned()
            .ok_or_else(|| DeployflowError::NotFound(format!("run {} not found", run_id)))
    }

    fn publish(
        &self,
        event: RunEvent,
    ) {
        // no subscribers is not an error
        let _ = self.channel.publish(event);
    }
}

fn lock(slot: &RunSlot) -> MutexGuard<'_, WorkflowRun> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
