use serde::{Deserialize, Serialize};

use crate::{DeployflowError, Result, model::NodeModel, run::RunStatus};

/// Serialized snapshot of a workflow graph.
///
/// Nodes are listed so that every parent precedes its children, the root first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkflowModel {
    pub id: String,
    pub name: String,
    /// `manual` or `auto`; empty means `manual`
    #[serde(default)]
    pub trigger: String,
    /// cron expression for `auto` workflows, five or six fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_cron: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<LastRun>,
    pub nodes: Vec<NodeModel>,
}

/// The most recent run started for a workflow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LastRun {
    pub run_id: String,
    pub status: RunStatus,
    /// time the run was queued, in milliseconds
    pub time: i64,
}

impl WorkflowModel {
    pub fn from_json(s: &str) -> Result<Self> {
        let workflow = serde_json::from_str::<WorkflowModel>(s);
        match workflow {
            Ok(v) => Ok(v),
            Err(e) => Err(DeployflowError::Convert(format!("{}", e))),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
