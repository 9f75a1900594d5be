//! Workflow graph store.
//!
//! `WorkflowStore` is the registry of workflow graphs. The registry lock is held
//! only to look a workflow up; each graph then carries its own lock, so
//! mutations of unrelated workflows proceed independently.

pub mod node;
mod workflow;

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use tracing::{debug, trace};

pub use node::{AddNodeCommand, NodeId, WorkflowNode};
pub use workflow::{Workflow, WorkflowId};

use crate::{DeployflowError, Result, ShareLock, catalog::NodeCatalog, model::WorkflowModel, utils};

pub struct WorkflowStore {
    catalog: Arc<NodeCatalog>,
    workflows: ShareLock<HashMap<WorkflowId, Arc<Workflow>>>,
}

impl WorkflowStore {
    pub fn new(catalog: Arc<NodeCatalog>) -> Self {
        Self {
            catalog,
            workflows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn catalog(&self) -> Arc<NodeCatalog> {
        self.catalog.clone()
    }

    /// Creates an empty workflow holding only its root node.
    pub fn create(
        &self,
        name: &str,
    ) -> Arc<Workflow> {
        let mut workflows = self.workflows.write().unwrap_or_else(PoisonError::into_inner);
        let id = loop {
            let id = utils::longid();
            if !workflows.contains_key(&id) {
                break id;
            }
        };

        let workflow = Arc::new(Workflow::new(id.clone(), name, self.catalog.clone()));
        workflows.insert(id, workflow.clone());
        debug!("workflow {} created", workflow.id());
        workflow
    }

    /// Registers a workflow rebuilt from a snapshot, replacing any previous graph with the same id.
    pub fn import(
        &self,
        model: &WorkflowModel,
    ) -> Result<Arc<Workflow>> {
        trace!("store::import({})", model.id);
        let workflow = Arc::new(Workflow::from_model(model, self.catalog.clone())?);
        self.workflows.write().unwrap_or_else(PoisonError::into_inner).insert(model.id.clone(), workflow.clone());
        Ok(workflow)
    }

    pub fn get(
        &self,
        id: &str,
    ) -> Result<Arc<Workflow>> {
        self.workflows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| DeployflowError::NotFound(format!("workflow {} not found", id)))
    }

    pub fn remove(
        &self,
        id: &str,
    ) -> Result<Arc<Workflow>> {
        self.workflows
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .ok_or_else(|| DeployflowError::NotFound(format!("workflow {} not found", id)))
    }

    pub fn list(&self) -> Vec<Arc<Workflow>> {
        self.workflows.read().unwrap_or_else(PoisonError::into_inner).values().cloned().collect()
    }

    /// Workflows the scheduler should start on their cron expression.
    pub fn list_enabled_auto(&self) -> Vec<Arc<Workflow>> {
        self.list().into_iter().filter(|w| w.is_enabled_auto()).collect()
    }

    pub fn add_node(
        &self,
        workflow_id: &str,
        cmd: &AddNodeCommand,
    ) -> Result<WorkflowNode> {
        self.get(workflow_id)?.add_node(cmd)
    }

    pub fn get_node(
        &self,
        workflow_id: &str,
        node_id: &str,
    ) -> Result<WorkflowNode> {
        self.get(workflow_id)?.get_node(node_id)
    }
}
