use serde::{Deserialize, Serialize};

use crate::model::NodeModel;

/// node id
pub type NodeId = String;

/// A single step of a workflow graph.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WorkflowNode {
    /// node id, unique within its workflow
    pub id: NodeId,
    /// display name, snapshotted into run logs
    pub name: String,
    /// node type code from the catalog
    pub node_type: String,
    /// provider code, only for branch types
    pub provider_type: Option<String>,
    /// owning node, `None` only for the root
    pub parent_id: Option<NodeId>,
}

impl WorkflowNode {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

impl From<&WorkflowNode> for NodeModel {
    fn from(node: &WorkflowNode) -> Self {
        NodeModel {
            id: node.id.clone(),
            name: node.name.clone(),
            node_type: node.node_type.clone(),
            provider_type: node.provider_type.clone(),
            parent_id: node.parent_id.clone(),
        }
    }
}

/// Request to insert a node as the last child of `parent_id`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AddNodeCommand {
    pub node_type: String,
    pub provider_type: Option<String>,
    pub parent_id: NodeId,
    /// overrides the display name derived from the catalog
    #[serde(default)]
    pub name: Option<String>,
}

impl AddNodeCommand {
    pub fn new(
        node_type: impl Into<String>,
        provider_type: Option<String>,
        parent_id: impl Into<NodeId>,
    ) -> Self {
        Self {
            node_type: node_type.into(),
            provider_type,
            parent_id: parent_id.into(),
            name: None,
        }
    }

    pub fn with_name(
        mut self,
        name: impl Into<String>,
    ) -> Self {
        self.name = Some(name.into());
        self
    }
}
