//! Run records and their state machine.
//!
//! `WorkflowRun` enforces the status transitions on its own; `RunTracker` only
//! adds locking, lookup and event publication on top.

use serde::{Deserialize, Serialize};

use crate::{DeployflowError, Result, graph::NodeId, run::RunStatus, utils};

/// run id
pub type RunId = String;

/// Trigger for a run started by hand.
pub const TRIGGER_MANUAL: &str = "manual";
/// Trigger for a run started by a schedule.
pub const TRIGGER_AUTO: &str = "auto";

/// One unit of observable progress from a node, such as one provider call.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRunLogOutput {
    /// timestamp in milliseconds
    pub time: i64,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkflowRunLogOutput {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            time: utils::time::time_millis(),
            title: title.into(),
            content: content.into(),
            error: None,
        }
    }

    pub fn with_error(
        mut self,
        error: impl Into<String>,
    ) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Activity of one node during a run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRunLog {
    pub node_id: NodeId,
    /// node display name at execution time
    pub node_name: String,
    pub outputs: Vec<WorkflowRunLogOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRun {
    pub id: RunId,
    pub workflow_id: String,
    pub status: RunStatus,
    pub trigger: String,
    /// timestamp in milliseconds
    pub started_at: i64,
    /// timestamp in milliseconds, set once the run is terminal
    pub ended_at: Option<i64>,
    /// in execution order
    pub logs: Vec<WorkflowRunLog>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkflowRun {
    pub fn new(
        id: RunId,
        workflow_id: impl Into<String>,
        trigger: impl Into<String>,
    ) -> Self {
        Self {
            id,
            workflow_id: workflow_id.into(),
            status: RunStatus::Pending,
            trigger: trigger.into(),
            started_at: utils::time::time_millis(),
            ended_at: None,
            logs: Vec::new(),
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Opens a log entry for `node_id`, moving a pending run to running.
    pub fn begin_node(
        &mut self,
        node_id: &str,
        node_name: &str,
    ) -> Result<()> {
        self.ensure_active()?;

        self.logs.push(WorkflowRunLog {
            node_id: node_id.to_string(),
            node_name: node_name.to_string(),
            outputs: Vec::new(),
            error: None,
        });
        if self.status == RunStatus::Pending {
            self.status = RunStatus::Running;
        }
        Ok(())
    }

    /// Appends an output to the most recent log entry of `node_id`.
    pub fn append_output(
        &mut self,
        node_id: &str,
        output: WorkflowRunLogOutput,
    ) -> Result<()> {
        self.ensure_active()?;
        self.latest_log_mut(node_id)?.outputs.push(output);
        Ok(())
    }

    /// Records a node-level failure on the most recent log entry of `node_id`.
    pub fn fail_node(
        &mut self,
        node_id: &str,
        error: impl Into<String>,
    ) -> Result<()> {
        self.ensure_active()?;
        self.latest_log_mut(node_id)?.error = Some(error.into());
        Ok(())
    }

    /// Moves a running run to `outcome`. Terminal status is set exactly once.
    ///
    /// A run that never began a node is still `Pending` and cannot complete.
    pub fn complete(
        &mut self,
        outcome: RunStatus,
        error: Option<String>,
    ) -> Result<()> {
        self.ensure_active()?;
        match (outcome, &error) {
            (RunStatus::Succeeded, Some(_)) => {
                return Err(DeployflowError::InvalidArgument(format!("run {} cannot succeed with an error", self.id)));
            }
            (RunStatus::Pending | RunStatus::Running, _) => {
                return Err(DeployflowError::InvalidArgument(format!("'{}' is not a terminal run status", outcome)));
            }
            _ => {}
        }
        if self.status == RunStatus::Pending {
            return Err(DeployflowError::InvalidState(format!("run {} has not begun any node", self.id)));
        }

        self.status = outcome;
        self.ended_at = Some(utils::time::time_millis());
        self.error = error;
        Ok(())
    }

    /// The most recent log entry for `node_id`.
    pub fn log(
        &self,
        node_id: &str,
    ) -> Option<&WorkflowRunLog> {
        self.logs.iter().rev().find(|l| l.node_id == node_id)
    }

    /// The first failure recorded by any node, in execution order.
    pub fn first_error(&self) -> Option<&str> {
        self.logs.iter().find_map(|log| {
            log.error.as_deref().or_else(|| log.outputs.iter().find_map(|o| o.error.as_deref()))
        })
    }

    fn ensure_active(&self) -> Result<()> {
        if self.is_terminal() {
            return Err(DeployflowError::InvalidState(format!("run {} is already {}", self.id, self.status)));
        }
        Ok(())
    }

    fn latest_log_mut(
        &mut self,
        node_id: &str,
    ) -> Result<&mut WorkflowRunLog> {
        let run_id = &self.id;
        self.logs
            .iter_mut()
            .rev()
            .find(|l| l.node_id == node_id)
            .ok_or_else(|| DeployflowError::NotFound(format!("node {} has not begun in run {}", node_id, run_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_run() -> WorkflowRun {
        WorkflowRun::new("r1".to_string(), "w1", TRIGGER_MANUAL)
    }

    #[test]
    fn test_run_lifecycle() {
        let mut run = create_test_run();
        assert_eq!(run.status, RunStatus::Pending);
        assert!(run.ended_at.is_none());
        assert!(run.logs.is_empty());

        run.begin_node("n1", "Step 1").unwrap();
        assert_eq!(run.status, RunStatus::Running);

        run.append_output("n1", WorkflowRunLogOutput::new("call", "ok")).unwrap();
        assert_eq!(run.log("n1").unwrap().outputs.len(), 1);

        run.complete(RunStatus::Succeeded, None).unwrap();
        assert_eq!(run.status, RunStatus::Succeeded);
        assert!(run.ended_at.is_some());

        let err = run.complete(RunStatus::Failed, Some("late".into())).unwrap_err();
        assert!(err.is_invalid_state());
        assert_eq!(run.status, RunStatus::Succeeded);
        assert_eq!(run.error, None);
    }

    #[test]
    fn test_begin_node_only_transitions_once() {
        let mut run = create_test_run();
        run.begin_node("n1", "Step 1").unwrap();
        run.begin_node("n2", "Step 2").unwrap();
        assert_eq!(run.status, RunStatus::Running);
        assert_eq!(run.logs.len(), 2);
    }

    #[test]
    fn test_begin_node_on_terminal_run() {
        let mut run = create_test_run();
        run.begin_node("n1", "Step 1").unwrap();
        run.complete(RunStatus::Failed, Some("boom".into())).unwrap();
        assert!(run.begin_node("n2", "Step 2").unwrap_err().is_invalid_state());
        assert_eq!(run.logs.len(), 1);
    }

    #[test]
    fn test_complete_pending_run() {
        let mut run = create_test_run();
        assert!(run.complete(RunStatus::Succeeded, None).unwrap_err().is_invalid_state());
        assert!(run.complete(RunStatus::Failed, Some("boom".into())).unwrap_err().is_invalid_state());
        assert_eq!(run.status, RunStatus::Pending);
        assert!(run.ended_at.is_none());
        assert_eq!(run.error, None);
    }

    #[test]
    fn test_append_output_before_begin() {
        let mut run = create_test_run();
        assert!(run.append_output("n1", WorkflowRunLogOutput::new("call", "ok")).unwrap_err().is_not_found());
        assert!(run.fail_node("n1", "boom").unwrap_err().is_not_found());
    }

    #[test]
    fn test_outputs_keep_call_order() {
        let mut run = create_test_run();
        run.begin_node("n1", "Step 1").unwrap();
        for i in 0..5 {
            run.append_output("n1", WorkflowRunLogOutput::new(format!("call {}", i), "ok")).unwrap();
        }
        let titles: Vec<_> = run.log("n1").unwrap().outputs.iter().map(|o| o.title.clone()).collect();
        assert_eq!(titles, vec!["call 0", "call 1", "call 2", "call 3", "call 4"]);
    }

    #[test]
    fn test_repeated_node_appends_to_latest_entry() {
        let mut run = create_test_run();
        run.begin_node("n1", "Step 1").unwrap();
        run.append_output("n1", WorkflowRunLogOutput::new("first", "")).unwrap();
        run.begin_node("n1", "Step 1").unwrap();
        run.append_output("n1", WorkflowRunLogOutput::new("second", "")).unwrap();

        assert_eq!(run.logs.len(), 2);
        assert_eq!(run.logs[0].outputs[0].title, "first");
        assert_eq!(run.logs[0].outputs.len(), 1);
        assert_eq!(run.logs[1].outputs[0].title, "second");
    }

    #[test]
    fn test_complete_rejects_bad_outcomes() {
        let mut run = create_test_run();
        assert!(run.complete(RunStatus::Running, None).unwrap_err().is_invalid_argument());
        assert!(run.complete(RunStatus::Succeeded, Some("oops".into())).unwrap_err().is_invalid_argument());
        assert_eq!(run.status, RunStatus::Pending);

        run.begin_node("n1", "Step 1").unwrap();
        assert!(run.complete(RunStatus::Pending, None).unwrap_err().is_invalid_argument());
        run.complete(RunStatus::Failed, Some("deploy failed".into())).unwrap();
        assert_eq!(run.error.as_deref(), Some("deploy failed"));
    }

    #[test]
    fn test_first_error() {
        let mut run = create_test_run();
        run.begin_node("n1", "Step 1").unwrap();
        run.append_output("n1", WorkflowRunLogOutput::new("call", "ok")).unwrap();
        assert_eq!(run.first_error(), None);

        run.begin_node("n2", "Step 2").unwrap();
        run.append_output("n2", WorkflowRunLogOutput::new("call", "").with_error("timeout")).unwrap();
        run.begin_node("n3", "Step 3").unwrap();
        run.fail_node("n3", "denied").unwrap();

        assert_eq!(run.first_error(), Some("timeout"));
    }

    #[test]
    fn test_run_serialization() {
        let mut run = create_test_run();
        run.begin_node("n1", "Step 1").unwrap();
        let value = serde_json::to_value(&run).unwrap();
        assert_eq!(value["status"], "running");
        assert_eq!(value["logs"][0]["node_name"], "Step 1");
        assert!(value.get("error").is_none());
    }
}
