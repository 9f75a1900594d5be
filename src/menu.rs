//! Add-node menu derived from the node catalog.
//!
//! Leaf node types become selectable top-level items. Branch node types
//! expand into one selectable child per provider.

use serde::{Deserialize, Serialize};

use crate::{
    catalog::{IconDescriptor, NodeCatalog, NodeKind},
    graph::{AddNodeCommand, NodeId},
};

/// A resolved user choice of node type and optional provider.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub node_type: String,
    pub provider_type: Option<String>,
}

impl Selection {
    pub fn into_command(
        self,
        parent_id: impl Into<NodeId>,
    ) -> AddNodeCommand {
        AddNodeCommand::new(self.node_type, self.provider_type, parent_id)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    /// node type code, or provider code for children
    pub key: String,
    pub label: String,
    pub icon: IconDescriptor,
    /// `None` for items that only expand into children
    pub action: Option<Selection>,
    pub children: Vec<MenuItem>,
}

/// Projects the catalog into a two-level menu, in registration order.
pub fn project(catalog: &NodeCatalog) -> Vec<MenuItem> {
    catalog
        .list_node_types()
        .iter()
        .map(|descriptor| match &descriptor.kind {
            NodeKind::Leaf => MenuItem {
                key: descriptor.node_type.clone(),
                label: descriptor.name.clone(),
                icon: descriptor.icon.clone(),
                action: Some(Selection {
                    node_type: descriptor.node_type.clone(),
                    provider_type: None,
                }),
                children: Vec::new(),
            },
            NodeKind::Branch(providers) => MenuItem {
                key: descriptor.node_type.clone(),
                label: descriptor.name.clone(),
                icon: descriptor.icon.clone(),
                action: None,
                children: providers
                    .iter()
                    .map(|provider| MenuItem {
                        key: provider.provider_type.clone(),
                        label: provider.name.clone(),
                        icon: provider.icon.clone(),
                        action: Some(Selection {
                            node_type: descriptor.node_type.clone(),
                            provider_type: Some(provider.provider_type.clone()),
                        }),
                        children: Vec::new(),
                    })
                    .collect(),
            },
        })
        .collect()
}
