//! Static registry of node types and their deploy providers.
//!
//! The catalog is built once from a seed table and shared through `Arc`.
//! Lookups never fail: an unknown node type simply has no descriptor and
//! no providers.

mod descriptor;

use std::collections::{HashMap, HashSet};

use tracing::trace;

pub use descriptor::{IconDescriptor, IconType, NodeKind, NodeTypeDescriptor, ProviderDescriptor};

use crate::{
    DeployflowError, Result,
    model::{CatalogModel, IconModel, NodeTypeModel},
};

/// Node type code of the implicit root node every workflow starts with.
pub const ROOT_NODE_TYPE: &str = "start";
/// Display name of the implicit root node.
pub const ROOT_NODE_NAME: &str = "Start";

const BUILTIN_SEED: &str = include_str!("seed.toml");

#[derive(Debug, Clone, Default)]
pub struct NodeCatalog {
    node_types: Vec<NodeTypeDescriptor>,
    index: HashMap<String, usize>,
}

impl NodeCatalog {
    /// Builds a catalog from a seed table, rejecting duplicate or reserved codes.
    pub fn from_model(model: &CatalogModel) -> Result<Self> {
        let mut node_types = Vec::with_capacity(model.node_types.len());
        let mut index = HashMap::new();

        for item in &model.node_types {
            let descriptor = node_type_from_model(item)?;
            if index.insert(descriptor.node_type.clone(), node_types.len()).is_some() {
                return Err(DeployflowError::Config(format!("duplicate node type '{}' in catalog", descriptor.node_type)));
            }
            node_types.push(descriptor);
        }

        trace!("catalog::from_model({} node types)", node_types.len());
        Ok(Self {
            node_types,
            index,
        })
    }

    /// Loads the seed table bundled with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_model(&CatalogModel::from_toml(BUILTIN_SEED)?)
    }

    /// All node types in registration order.
    pub fn list_node_types(&self) -> &[NodeTypeDescriptor] {
        &self.node_types
    }

    /// Providers of `node_type` in registration order; empty for leaf or unknown types.
    pub fn list_providers(
        &self,
        node_type: &str,
    ) -> &[ProviderDescriptor] {
        self.get(node_type).map(|d| d.providers()).unwrap_or(&[])
    }

    pub fn get(
        &self,
        node_type: &str,
    ) -> Option<&NodeTypeDescriptor> {
        self.index.get(node_type).map(|idx| &self.node_types[*idx])
    }

    pub fn contains(
        &self,
        node_type: &str,
    ) -> bool {
        self.index.contains_key(node_type)
    }

    pub fn is_empty(&self) -> bool {
        self.node_types.is_empty()
    }

    /// Checks that `provider_type` may be attached to a node of `node_type`.
    ///
    /// Returns the node type descriptor on success.
    pub fn validate(
        &self,
        node_type: &str,
        provider_type: Option<&str>,
    ) -> Result<&NodeTypeDescriptor> {
        let descriptor = self.get(node_type).ok_or_else(|| DeployflowError::InvalidArgument(format!("unknown node type '{}'", node_type)))?;

        if let Some(provider_type) = provider_type {
            if !descriptor.is_branch() {
                return Err(DeployflowError::InvalidArgument(format!(
                    "node type '{}' does not accept a provider, got '{}'",
                    node_type, provider_type
                )));
            }
            if descriptor.provider(provider_type).is_none() {
                return Err(DeployflowError::InvalidArgument(format!(
                    "provider '{}' is not registered for node type '{}'",
                    provider_type, node_type
                )));
            }
        }

        Ok(descriptor)
    }
}

fn node_type_from_model(item: &NodeTypeModel) -> Result<NodeTypeDescriptor> {
    if item.node_type.trim().is_empty() {
        return Err(DeployflowError::Config("node type code must not be empty".into()));
    }
    if item.node_type == ROOT_NODE_TYPE {
        return Err(DeployflowError::Config(format!("node type '{}' is reserved for the root node", ROOT_NODE_TYPE)));
    }

    let kind = match &item.providers {
        None => NodeKind::Leaf,
        Some(providers) => {
            let mut seen = HashSet::new();
            let mut descriptors = Vec::with_capacity(providers.len());
            for p in providers {
                if p.provider_type.trim().is_empty() {
                    return Err(DeployflowError::Config(format!("empty provider type under node type '{}'", item.node_type)));
                }
                if !seen.insert(p.provider_type.as_str()) {
                    return Err(DeployflowError::Config(format!(
                        "duplicate provider '{}' under node type '{}'",
                        p.provider_type, item.node_type
                    )));
                }
                descriptors.push(ProviderDescriptor {
                    provider_type: p.provider_type.clone(),
                    name: p.name.clone(),
                    icon: icon_from_model(&p.icon)?,
                });
            }
            NodeKind::Branch(descriptors)
        }
    };

    Ok(NodeTypeDescriptor {
        node_type: item.node_type.clone(),
        name: item.name.clone(),
        icon: icon_from_model(&item.icon)?,
        kind,
    })
}

fn icon_from_model(icon: &IconModel) -> Result<IconDescriptor> {
    let icon_type = if icon.icon_type.is_empty() {
        IconType::default()
    } else {
        icon.icon_type.parse::<IconType>().map_err(|_| DeployflowError::Config(format!("unknown icon type '{}'", icon.icon_type)))?
    };

    Ok(IconDescriptor {
        icon_type,
        name: icon.name.clone(),
    })
}
