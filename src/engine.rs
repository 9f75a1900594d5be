//! Workflow engine - the main entry point for Deployflow.
//!
//! The engine ties the catalog, the workflow store and the run tracker
//! together and executes runs on a pool of workers:
//! - Building workflows from menu or picker selections
//! - Queueing runs and refusing to start a workflow that is already running
//! - Starting enabled `auto` workflows on their cron schedule
//! - Cancelling in-flight runs
//! - Graceful shutdown coordination

mod scheduler;

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, PoisonError, RwLock,
        atomic::{AtomicBool, Ordering},
    },
};

use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use scheduler::Scheduler;

use crate::{
    Config, DeployflowError, Result, ShareLock,
    catalog::NodeCatalog,
    common::{Queue, Shutdown},
    dispatcher::Dispatcher,
    graph::{AddNodeCommand, Workflow, WorkflowNode, WorkflowStore},
    menu::{self, MenuItem},
    picker::ProviderPicker,
    run::{RunId, RunStatus, RunTracker, TRIGGER_AUTO},
    runtime::{Channel, NodeExecutor},
    utils,
};

struct RunRequest {
    run_id: RunId,
    workflow: Arc<Workflow>,
    cancel: Arc<Shutdown>,
}

/// Creates runs and hands them to the workers. Shared with scheduled jobs.
struct Submitter {
    workflows: Arc<WorkflowStore>,
    runs: Arc<RunTracker>,
    /// Runs waiting for a worker.
    queue: Arc<Queue<RunRequest>>,
    /// Cancel signals of queued and executing runs.
    active: ShareLock<HashMap<RunId, Arc<Shutdown>>>,
    /// Serializes the "already running" check with run creation.
    guard: Mutex<()>,
    running: AtomicBool,
}

impl Submitter {
    fn submit(
        &self,
        workflow_id: &str,
        trigger: &str,
    ) -> Result<RunId> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(DeployflowError::Engine("Engine is not running".to_string()));
        }
        let workflow = self.workflows.get(workflow_id)?;

        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(active) = self.runs.active_run(workflow_id) {
            return Err(DeployflowError::InvalidState(format!("workflow {} is running (run {})", workflow_id, active)));
        }
        // senders are serialized by the guard, so the queue can only drain from here on
        if self.queue.is_full() {
            return Err(DeployflowError::Queue(format!("run queue is full, workflow {} not started", workflow_id)));
        }

        let run = self.runs.start_run(workflow_id, trigger);
        let cancel = Arc::new(Shutdown::new());
        self.active.write().unwrap_or_else(PoisonError::into_inner).insert(run.id.clone(), cancel.clone());
        workflow.record_run(&run.id, RunStatus::Pending);

        let request = RunRequest {
            run_id: run.id.clone(),
            workflow: workflow.clone(),
            cancel,
        };
        if let Err(e) = self.queue.try_send(request) {
            warn!("run {} rejected: {}", run.id, e);
            self.drop_pending(&run.id, &workflow, &e.to_string());
            return Err(e);
        }

        debug!("run {} queued, {} waiting", run.id, self.queue.len());
        Ok(run.id)
    }

    /// Removes a run that never reached a worker.
    fn drop_pending(
        &self,
        run_id: &str,
        workflow: &Workflow,
        reason: &str,
    ) {
        self.active.write().unwrap_or_else(PoisonError::into_inner).remove(run_id);
        workflow.forget_run(run_id);
        if let Err(e) = self.runs.discard_run(run_id, reason) {
            warn!("run {} not discarded: {}", run_id, e);
        }
    }

    fn cancel_signal(
        &self,
        run_id: &str,
    ) -> Option<Arc<Shutdown>> {
        self.active.read().unwrap_or_else(PoisonError::into_inner).get(run_id).cloned()
    }
}

/// The main workflow engine.
///
/// # Example
///
/// ```rust,ignore
/// let engine = EngineBuilder::new().executor(Arc::new(MyExecutor)).build()?;
/// engine.launch();
///
/// let workflow = engine.create_workflow("renew example.com");
/// engine.add_node(workflow.id(), &AddNodeCommand::new("apply", None, workflow.root().id))?;
///
/// let run_id = engine.run(workflow.id(), TRIGGER_MANUAL)?;
/// ```
pub struct Engine {
    catalog: Arc<NodeCatalog>,
    submitter: Arc<Submitter>,
    /// Event channel for broadcasting run events.
    channel: Arc<Channel>,
    scheduler: Scheduler,
    executor: Arc<dyn NodeExecutor>,
    worker_number: u16,

    runtime: Arc<Runtime>,
    shutdown: Arc<Shutdown>,
}

impl Engine {
    pub(crate) fn new(
        config: Config,
        catalog: Arc<NodeCatalog>,
        executor: Arc<dyn NodeExecutor>,
        runtime: Arc<Runtime>,
    ) -> Self {
        let channel = Arc::new(Channel::new());
        let submitter = Submitter {
            workflows: Arc::new(WorkflowStore::new(catalog.clone())),
            runs: Arc::new(RunTracker::new(channel.clone())),
            queue: Queue::new(config.run_queue_size),
            active: Arc::new(RwLock::new(HashMap::new())),
            guard: Mutex::new(()),
            running: AtomicBool::new(false),
        };

        Self {
            catalog,
            submitter: Arc::new(submitter),
            channel,
            scheduler: Scheduler::new(),
            executor,
            worker_number: config.worker_number,
            runtime,
            shutdown: Arc::new(Shutdown::new()),
        }
    }

    /// Starts the event listener, the run workers and the schedules of enabled `auto` workflows.
    pub fn launch(&self) {
        if self.submitter.running.swap(true, Ordering::SeqCst) {
            return;
        }

        self.channel.listen(&self.runtime);

        for worker in 0..self.worker_number {
            let submitter = self.submitter.clone();
            let shutdown = self.shutdown.clone();
            let executor = self.executor.clone();

            self.runtime.spawn(async move {
                loop {
                    tokio::select! {
                        _ = shutdown.wait() => break,
                        Some(req) = submitter.queue.next_async() => {
                            debug!("worker {} picked run {}", worker, req.run_id);
                            let run_id = req.run_id.clone();
                            let dispatcher = Arc::new(Dispatcher::new(req.run_id, req.workflow, submitter.runs.clone(), executor.clone(), req.cancel));
                            dispatcher.execute().await;
                            submitter.active.write().unwrap_or_else(PoisonError::into_inner).remove(&run_id);
                        }
                    }
                }
            });
        }

        info!("engine launched with {} workers", self.worker_number);
        let scheduled = self.init_schedule();
        info!("{} workflow schedules started", scheduled);
    }

    /// Stops the workers and schedules, cancels executing runs and discards queued ones.
    pub fn shutdown(&self) {
        if !self.submitter.running.swap(false, Ordering::SeqCst) {
            return;
        }

        self.scheduler.stop();
        for cancel in self.submitter.active.read().unwrap_or_else(PoisonError::into_inner).values() {
            cancel.shutdown();
        }
        self.shutdown.shutdown();

        while let Some(req) = self.submitter.queue.try_next() {
            self.submitter.drop_pending(&req.run_id, &req.workflow, "engine shut down");
        }
        self.channel.shutdown();
        info!("engine shut down");
    }

    pub fn is_running(&self) -> bool {
        self.submitter.running.load(Ordering::SeqCst)
    }

    pub fn catalog(&self) -> Arc<NodeCatalog> {
        self.catalog.clone()
    }

    pub fn workflows(&self) -> Arc<WorkflowStore> {
        self.submitter.workflows.clone()
    }

    pub fn runs(&self) -> Arc<RunTracker> {
        self.submitter.runs.clone()
    }

    /// Returns a reference to the event channel.
    pub fn channel(&self) -> Arc<Channel> {
        self.channel.clone()
    }

    /// The add-node menu for the engine's catalog.
    pub fn menu(&self) -> Vec<MenuItem> {
        menu::project(&self.catalog)
    }

    /// A provider picker over the providers of `node_type`.
    pub fn picker(
        &self,
        node_type: &str,
    ) -> ProviderPicker {
        ProviderPicker::new(&self.catalog, node_type)
    }

    pub fn create_workflow(
        &self,
        name: &str,
    ) -> Arc<Workflow> {
        self.submitter.workflows.create(name)
    }

    pub fn add_node(
        &self,
        workflow_id: &str,
        cmd: &AddNodeCommand,
    ) -> Result<WorkflowNode> {
        self.submitter.workflows.add_node(workflow_id, cmd)
    }

    /// Queues a run of `workflow_id` and returns its id.
    ///
    /// Fails with `InvalidState` while another run of the same workflow is pending or running,
    /// and with `Queue` when every queue slot is taken. A rejected run leaves no record.
    pub fn run(
        &self,
        workflow_id: &str,
        trigger: &str,
    ) -> Result<RunId> {
        self.submitter.submit(workflow_id, trigger)
    }

    /// Cancels a queued or executing run. Nodes already executing are interrupted.
    pub fn cancel(
        &self,
        run_id: &str,
    ) -> Result<()> {
        match self.submitter.cancel_signal(run_id) {
            Some(cancel) => {
                info!("cancelling run {}", run_id);
                cancel.shutdown();
                Ok(())
            }
            None => Err(DeployflowError::NotFound(format!("run {} is not in flight", run_id))),
        }
    }

    /// Sets how a workflow is started and updates its schedule.
    pub fn set_trigger(
        &self,
        workflow_id: &str,
        trigger: &str,
        trigger_cron: Option<&str>,
        enabled: bool,
    ) -> Result<bool> {
        let workflow = self.submitter.workflows.get(workflow_id)?;
        workflow.set_trigger(trigger, trigger_cron)?;
        workflow.set_enabled(enabled);
        self.schedule(workflow_id)
    }

    /// Registers the workflow with the scheduler when it is an enabled `auto` workflow,
    /// and removes its job otherwise. Returns whether it is scheduled.
    pub fn schedule(
        &self,
        workflow_id: &str,
    ) -> Result<bool> {
        let workflow = self.submitter.workflows.get(workflow_id)?;
        let cron = match workflow.trigger_cron() {
            Some(expr) if workflow.is_enabled_auto() => utils::schedule::parse_cron(&expr)?,
            _ => {
                self.scheduler.remove(workflow_id);
                return Ok(false);
            }
        };

        let submitter = self.submitter.clone();
        let id = workflow_id.to_string();
        self.scheduler.add(&self.runtime, workflow_id, cron, move || match submitter.submit(&id, TRIGGER_AUTO) {
            Ok(run_id) => info!("scheduled run {} of workflow {} queued", run_id, id),
            Err(e) => warn!("scheduled run of workflow {} not started: {}", id, e),
        });
        Ok(true)
    }

    /// Schedules every enabled `auto` workflow in the store. Returns how many were scheduled.
    pub fn init_schedule(&self) -> usize {
        let mut scheduled = 0;
        for workflow in self.submitter.workflows.list_enabled_auto() {
            match self.schedule(workflow.id()) {
                Ok(true) => scheduled += 1,
                Ok(false) => {}
                Err(e) => warn!("workflow {} not scheduled: {}", workflow.id(), e),
            }
        }
        scheduled
    }

    pub fn is_scheduled(
        &self,
        workflow_id: &str,
    ) -> bool {
        self.scheduler.contains(workflow_id)
    }
}
