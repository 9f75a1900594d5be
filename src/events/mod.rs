//! Event types for run tracking.
//!
//! Every transition recorded by the run tracker is broadcast as a `RunEvent`
//! so that callers can follow a run without polling.

use crate::{
    graph::NodeId,
    run::{RunId, RunStatus, WorkflowRunLogOutput},
    utils,
};

#[derive(Debug, Clone, PartialEq)]
pub enum RunEventKind {
    Started {
        trigger: String,
    },
    NodeBegan {
        node_name: String,
    },
    Output(WorkflowRunLogOutput),
    NodeFailed {
        error: String,
    },
    Completed {
        status: RunStatus,
        error: Option<String>,
    },
    /// the run was dropped before any node began
    Discarded {
        reason: String,
    },
}

impl RunEventKind {
    pub fn str(&self) -> &str {
        match self {
            RunEventKind::Started { .. } => "Started",
            RunEventKind::NodeBegan { .. } => "NodeBegan",
            RunEventKind::Output(_) => "Output",
            RunEventKind::NodeFailed { .. } => "NodeFailed",
            RunEventKind::Completed { .. } => "Completed",
            RunEventKind::Discarded { .. } => "Discarded",
        }
    }
}

/// Event message with run and node context.
#[derive(Debug, Clone, PartialEq)]
pub struct RunEvent {
    pub run_id: RunId,
    pub workflow_id: String,
    /// `None` for run-level events
    pub node_id: Option<NodeId>,
    pub kind: RunEventKind,
    /// timestamp in milliseconds
    pub timestamp: i64,
}

impl RunEvent {
    pub fn new(
        run_id: &str,
        workflow_id: &str,
        node_id: Option<&str>,
        kind: RunEventKind,
    ) -> Self {
        Self {
            run_id: run_id.to_string(),
            workflow_id: workflow_id.to_string(),
            node_id: node_id.map(String::from),
            kind,
            timestamp: utils::time::time_millis(),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.kind, RunEventKind::Completed { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, RunEventKind::Completed { status: RunStatus::Failed, .. })
    }
}
