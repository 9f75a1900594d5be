mod catalog;
mod node;
mod workflow;

pub use catalog::{CatalogModel, IconModel, NodeTypeModel, ProviderModel};
pub use node::NodeModel;
pub use workflow::{LastRun, WorkflowModel};
