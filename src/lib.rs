//! # Deployflow
//!
//! Deployflow builds certificate deployment workflows as trees of typed nodes
//! and tracks every execution of them as a run with per-node logs.
//!
//! ## Core Features
//!
//! - **Node Catalog**: registry of node types, some of which fan out into selectable providers
//! - **Workflow Graph**: rooted trees of nodes, grown one child at a time
//! - **Run Tracking**: status, timestamps and ordered per-node output for every execution
//! - **Picker and Menu**: searchable provider lists and an add-node menu derived from the catalog
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use deployflow::{EngineBuilder, TRIGGER_MANUAL};
//!
//! let engine = EngineBuilder::new().executor(Arc::new(MyExecutor)).build()?;
//! engine.launch();
//!
//! let workflow = engine.create_workflow("renew example.com");
//! let cmd = engine.picker("deploy").resolve("ssh", &workflow.root().id);
//! engine.add_node(workflow.id(), &cmd)?;
//!
//! let run = engine.run(workflow.id(), TRIGGER_MANUAL)?;
//! ```

mod builder;
mod catalog;
mod common;
mod config;
mod dispatcher;
mod engine;
mod error;
mod events;
mod graph;
mod menu;
mod model;
mod picker;
mod run;
mod runtime;
mod utils;

use std::sync::{Arc, RwLock};

pub use builder::EngineBuilder;
pub use catalog::{IconDescriptor, IconType, NodeCatalog, NodeKind, NodeTypeDescriptor, ProviderDescriptor, ROOT_NODE_NAME, ROOT_NODE_TYPE};
pub use config::{CatalogConfig, Config};
pub use engine::Engine;
pub use error::DeployflowError;
pub use events::{RunEvent, RunEventKind};
pub use graph::{AddNodeCommand, NodeId, Workflow, WorkflowId, WorkflowNode, WorkflowStore};
pub use menu::{MenuItem, Selection, project as project_menu};
pub use model::*;
pub use picker::ProviderPicker;
pub use run::{RunId, RunStatus, RunTracker, TRIGGER_AUTO, TRIGGER_MANUAL, WorkflowRun, WorkflowRunLog, WorkflowRunLogOutput};
pub use runtime::{Channel, ChannelEvent, ChannelOptions, NodeContext, NodeExecutor};

/// Result type alias for Deployflow operations.
pub type Result<T> = std::result::Result<T, DeployflowError>;

/// Thread-safe shared lock wrapper using Arc<RwLock<T>>.
pub(crate) type ShareLock<T> = Arc<RwLock<T>>;
