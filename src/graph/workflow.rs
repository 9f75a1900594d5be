//! Workflow graph: a rooted, insert-only tree of typed nodes.
//!
//! Nodes live in a petgraph `DiGraph` with one edge per parent/child link and a
//! side index from node id to graph index. The whole graph sits behind one
//! `RwLock`, so inserts are atomic and serialize per workflow while unrelated
//! workflows never contend.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
};
use tracing::trace;

use crate::{
    DeployflowError, Result, ShareLock,
    catalog::{NodeCatalog, ROOT_NODE_NAME, ROOT_NODE_TYPE},
    graph::node::{AddNodeCommand, NodeId, WorkflowNode},
    model::{LastRun, NodeModel, WorkflowModel},
    run::{RunStatus, TRIGGER_AUTO, TRIGGER_MANUAL},
    utils,
};

/// workflow id
pub type WorkflowId = String;

#[derive(Debug)]
struct Tree {
    graph: DiGraph<WorkflowNode, ()>,
    index: HashMap<NodeId, NodeIndex>,
    root: NodeIndex,
}

impl Tree {
    fn with_root(root: WorkflowNode) -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();
        let id = root.id.clone();
        let root = graph.add_node(root);
        index.insert(id, root);
        Self {
            graph,
            index,
            root,
        }
    }

    fn find(
        &self,
        id: &str,
    ) -> Result<NodeIndex> {
        self.index.get(id).copied().ok_or_else(|| DeployflowError::NotFound(format!("node {} not found", id)))
    }

    fn insert(
        &mut self,
        parent: NodeIndex,
        node: WorkflowNode,
    ) {
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, ());
        self.index.insert(id, idx);
    }

    /// Children in insertion order.
    fn children(
        &self,
        idx: NodeIndex,
    ) -> Vec<NodeIndex> {
        // petgraph lists neighbors most recent first
        let mut children: Vec<_> = self.graph.neighbors_directed(idx, Direction::Outgoing).collect();
        children.reverse();
        children
    }

    fn parent(
        &self,
        idx: NodeIndex,
    ) -> Option<NodeIndex> {
        self.graph.neighbors_directed(idx, Direction::Incoming).next()
    }

    fn fresh_id(&self) -> NodeId {
        loop {
            let id = utils::shortid();
            if !self.index.contains_key(&id) {
                return id;
            }
        }
    }
}

/// How a workflow is started, and what its latest run did.
#[derive(Debug, Clone)]
struct Settings {
    trigger: String,
    trigger_cron: Option<String>,
    enabled: bool,
    last_run: Option<LastRun>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            trigger: TRIGGER_MANUAL.to_string(),
            trigger_cron: None,
            enabled: false,
            last_run: None,
        }
    }
}

/// A workflow graph owned by the workflow store.
#[derive(Debug)]
pub struct Workflow {
    id: WorkflowId,
    name: String,
    catalog: Arc<NodeCatalog>,
    tree: ShareLock<Tree>,
    settings: ShareLock<Settings>,
}

impl Workflow {
    /// Creates a workflow holding only its root node.
    pub fn new(
        id: WorkflowId,
        name: impl Into<String>,
        catalog: Arc<NodeCatalog>,
    ) -> Self {
        let root = WorkflowNode {
            id: utils::shortid(),
            name: ROOT_NODE_NAME.to_string(),
            node_type: ROOT_NODE_TYPE.to_string(),
            provider_type: None,
            parent_id: None,
        };

        Self {
            id,
            name: name.into(),
            catalog,
            tree: Arc::new(RwLock::new(Tree::with_root(root))),
            settings: Arc::new(RwLock::new(Settings::default())),
        }
    }

    /// Rebuilds a workflow from a snapshot, validating it node by node.
    ///
    /// The first node must be the root; every other node must reference a
    /// parent listed before it.
    pub fn from_model(
        model: &WorkflowModel,
        catalog: Arc<NodeCatalog>,
    ) -> Result<Self> {
        if model.id.is_empty() {
            return Err(DeployflowError::InvalidArgument("missing id in workflow".into()));
        }
        let (root, rest) = model.nodes.split_first().ok_or_else(|| DeployflowError::InvalidArgument(format!("workflow {} has no root node", model.id)))?;
        if root.parent_id.is_some() || root.node_type != ROOT_NODE_TYPE {
            return Err(DeployflowError::InvalidArgument(format!(
                "first node of workflow {} must be a '{}' root without parent",
                model.id, ROOT_NODE_TYPE
            )));
        }

        let mut tree = Tree::with_root(node_from_model(root, None));
        for item in rest {
            if item.id.is_empty() {
                return Err(DeployflowError::InvalidArgument("node id must not be empty".into()));
            }
            if tree.index.contains_key(&item.id) {
                return Err(DeployflowError::InvalidArgument(format!("duplicate node id {}", item.id)));
            }
            let parent_id = item.parent_id.as_deref().ok_or_else(|| DeployflowError::InvalidArgument(format!("node {} has no parent", item.id)))?;
            let parent = tree.index.get(parent_id).copied().ok_or_else(|| {
                DeployflowError::InvalidArgument(format!("node {} references unknown parent {}", item.id, parent_id))
            })?;
            catalog.validate(&item.node_type, item.provider_type.as_deref())?;
            tree.insert(parent, node_from_model(item, Some(parent_id.to_string())));
        }

        let trigger = if model.trigger.is_empty() { TRIGGER_MANUAL } else { model.trigger.as_str() };
        let trigger_cron = validate_trigger(trigger, model.trigger_cron.as_deref())?;

        Ok(Self {
            id: model.id.clone(),
            name: model.name.clone(),
            catalog,
            tree: Arc::new(RwLock::new(tree)),
            settings: Arc::new(RwLock::new(Settings {
                trigger: trigger.to_string(),
                trigger_cron,
                enabled: model.enabled,
                last_run: model.last_run.clone(),
            })),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trigger(&self) -> String {
        self.settings().trigger.clone()
    }

    pub fn trigger_cron(&self) -> Option<String> {
        self.settings().trigger_cron.clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.settings().enabled
    }

    /// Enabled `auto` workflows are started by the engine's scheduler.
    pub fn is_enabled_auto(&self) -> bool {
        let settings = self.settings();
        settings.enabled && settings.trigger == TRIGGER_AUTO && settings.trigger_cron.is_some()
    }

    /// Sets how the workflow is started.
    ///
    /// `auto` needs a valid cron expression; `manual` drops any expression given.
    pub fn set_trigger(
        &self,
        trigger: &str,
        trigger_cron: Option<&str>,
    ) -> Result<()> {
        trace!("workflow::set_trigger({}, {}, {:?})", self.id, trigger, trigger_cron);
        let trigger_cron = validate_trigger(trigger, trigger_cron)?;
        let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        settings.trigger = trigger.to_string();
        settings.trigger_cron = trigger_cron;
        Ok(())
    }

    pub fn set_enabled(
        &self,
        enabled: bool,
    ) {
        self.settings.write().unwrap_or_else(PoisonError::into_inner).enabled = enabled;
    }

    pub fn last_run(&self) -> Option<LastRun> {
        self.settings().last_run.clone()
    }

    /// Records the status of the latest run; a new run id resets the run time.
    pub(crate) fn record_run(
        &self,
        run_id: &str,
        status: RunStatus,
    ) {
        let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        let time = match &settings.last_run {
            Some(last) if last.run_id == run_id => last.time,
            _ => utils::time::time_millis(),
        };
        settings.last_run = Some(LastRun {
            run_id: run_id.to_string(),
            status,
            time,
        });
    }

    /// Clears the latest run if it is `run_id`, for runs that were dropped before starting.
    pub(crate) fn forget_run(
        &self,
        run_id: &str,
    ) {
        let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        if settings.last_run.as_ref().is_some_and(|last| last.run_id == run_id) {
            settings.last_run = None;
        }
    }

    /// Inserts a node as the last child of `cmd.parent_id`.
    ///
    /// Fails with `InvalidArgument` for a type or provider the catalog rejects and
    /// `NotFound` for a missing parent. Nothing is inserted on failure.
    pub fn add_node(
        &self,
        cmd: &AddNodeCommand,
    ) -> Result<WorkflowNode> {
        trace!("workflow::add_node({}, {}, {:?}, {})", self.id, cmd.node_type, cmd.provider_type, cmd.parent_id);
        let descriptor = self.catalog.validate(&cmd.node_type, cmd.provider_type.as_deref())?;
        let name = match (&cmd.name, cmd.provider_type.as_deref().and_then(|p| descriptor.provider(p))) {
            (Some(name), _) => name.clone(),
            (None, Some(provider)) => format!("{}: {}", descriptor.name, provider.name),
            (None, None) => descriptor.name.clone(),
        };

        let mut tree = self.write();
        let parent = tree.find(&cmd.parent_id)?;
        let node = WorkflowNode {
            id: tree.fresh_id(),
            name,
            node_type: cmd.node_type.clone(),
            provider_type: cmd.provider_type.clone(),
            parent_id: Some(cmd.parent_id.clone()),
        };
        tree.insert(parent, node.clone());

        Ok(node)
    }

    pub fn get_node(
        &self,
        id: &str,
    ) -> Result<WorkflowNode> {
        let tree = self.read();
        let idx = tree.find(id)?;
        Ok(tree.graph[idx].clone())
    }

    pub fn contains(
        &self,
        id: &str,
    ) -> bool {
        self.read().index.contains_key(id)
    }

    pub fn root(&self) -> WorkflowNode {
        let tree = self.read();
        tree.graph[tree.root].clone()
    }

    /// Children of `id` in insertion order.
    pub fn children_of(
        &self,
        id: &str,
    ) -> Result<Vec<WorkflowNode>> {
        let tree = self.read();
        let idx = tree.find(id)?;
        Ok(tree.children(idx).into_iter().map(|c| tree.graph[c].clone()).collect())
    }

    /// Parent of `id`, `None` for the root.
    pub fn parent_of(
        &self,
        id: &str,
    ) -> Result<Option<WorkflowNode>> {
        let tree = self.read();
        let idx = tree.find(id)?;
        Ok(tree.parent(idx).map(|p| tree.graph[p].clone()))
    }

    /// Ancestors of `id`, nearest first, ending with the root.
    pub fn ancestors_of(
        &self,
        id: &str,
    ) -> Result<Vec<WorkflowNode>> {
        let tree = self.read();
        let mut idx = tree.find(id)?;
        let mut ancestors = Vec::new();
        while let Some(parent) = tree.parent(idx) {
            ancestors.push(tree.graph[parent].clone());
            idx = parent;
        }
        Ok(ancestors)
    }

    /// All nodes breadth-first from the root, siblings in insertion order.
    pub fn nodes(&self) -> Vec<WorkflowNode> {
        let tree = self.read();
        let mut nodes = Vec::with_capacity(tree.graph.node_count());
        let mut queue = VecDeque::from([tree.root]);
        while let Some(idx) = queue.pop_front() {
            nodes.push(tree.graph[idx].clone());
            queue.extend(tree.children(idx));
        }
        nodes
    }

    pub fn node_count(&self) -> usize {
        self.read().graph.node_count()
    }

    pub fn to_model(&self) -> WorkflowModel {
        let settings = self.settings().clone();
        WorkflowModel {
            id: self.id.clone(),
            name: self.name.clone(),
            trigger: settings.trigger,
            trigger_cron: settings.trigger_cron,
            enabled: settings.enabled,
            last_run: settings.last_run,
            nodes: self.nodes().iter().map(NodeModel::from).collect(),
        }
    }

    /// Output a human-readable representation of the workflow tree
    pub fn schema(&self) -> String {
        let tree = self.read();
        let mut lines = Vec::new();

        lines.push(format!("=== Workflow {} ({}) ===", self.name, self.id));
        lines.push(format!("Nodes: {}", tree.graph.node_count()));

        let mut stack = vec![(tree.root, 0usize)];
        let mut visited = HashSet::new();
        while let Some((idx, depth)) = stack.pop() {
            if !visited.insert(idx) {
                continue;
            }
            let node = &tree.graph[idx];
            let provider = node.provider_type.as_deref().map(|p| format!(", provider: {}", p)).unwrap_or_default();
            lines.push(format!("{}[{}] {} (type: {}{})", "  ".repeat(depth), node.id, node.name, node.node_type, provider));
            for child in tree.children(idx).into_iter().rev() {
                stack.push((child, depth + 1));
            }
        }

        lines.join("\n")
    }

    fn read(&self) -> RwLockReadGuard<'_, Tree> {
        self.tree.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tree> {
        self.tree.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn settings(&self) -> RwLockReadGuard<'_, Settings> {
        self.settings.read().unwrap_or_else(PoisonError::into_inner)
    }
}

fn validate_trigger(
    trigger: &str,
    trigger_cron: Option<&str>,
) -> Result<Option<String>> {
    match (trigger, trigger_cron) {
        (TRIGGER_MANUAL, _) => Ok(None),
        (TRIGGER_AUTO, Some(expr)) => {
            utils::schedule::parse_cron(expr)?;
            Ok(Some(expr.trim().to_string()))
        }
        (TRIGGER_AUTO, None) => Err(DeployflowError::InvalidArgument("auto trigger requires a cron expression".into())),
        (other, _) => Err(DeployflowError::InvalidArgument(format!("unknown trigger '{}'", other))),
    }
}

fn node_from_model(
    item: &NodeModel,
    parent_id: Option<NodeId>,
) -> WorkflowNode {
    WorkflowNode {
        id: item.id.clone(),
        name: item.name.clone(),
        node_type: item.node_type.clone(),
        provider_type: item.provider_type.clone(),
        parent_id,
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use petgraph::algo::is_cyclic_directed;

    use super::*;
    use crate::catalog::tests::sample_catalog;

    fn create_test_workflow() -> Workflow {
        Workflow::new("w1".to_string(), "test", Arc::new(sample_catalog()))
    }

    #[test]
    fn test_new_workflow_has_root() {
        let workflow = create_test_workflow();
        let root = workflow.root();
        assert!(root.is_root());
        assert_eq!(root.node_type, ROOT_NODE_TYPE);
        assert_eq!(workflow.node_count(), 1);
        assert!(workflow.children_of(&root.id).unwrap().is_empty());
    }

    #[test]
    fn test_add_leaf_and_branch_nodes() {
        let workflow = create_test_workflow();
        let root = workflow.root();

        let webhook = workflow.add_node(&AddNodeCommand::new("webhook", None, root.id.clone())).unwrap();
        assert_eq!(webhook.provider_type, None);
        assert_eq!(webhook.parent_id.as_deref(), Some(root.id.as_str()));
        assert_eq!(webhook.name, "Webhook");

        let deploy = workflow.add_node(&AddNodeCommand::new("deploy", Some("aws".into()), root.id.clone())).unwrap();
        assert_eq!(deploy.provider_type.as_deref(), Some("aws"));
        assert_eq!(deploy.name, "Deploy: Amazon Web Services");

        let err = workflow.add_node(&AddNodeCommand::new("deploy", Some("gcp".into()), root.id.clone())).unwrap_err();
        assert!(err.is_invalid_argument());

        assert_eq!(workflow.get_node(&deploy.id).unwrap(), deploy);
        assert_eq!(workflow.node_count(), 3);
    }

    #[test]
    fn test_add_node_name_override() {
        let workflow = create_test_workflow();
        let root = workflow.root();
        let node = workflow.add_node(&AddNodeCommand::new("webhook", None, root.id).with_name("Notify ops")).unwrap();
        assert_eq!(node.name, "Notify ops");
    }

    #[test]
    fn test_provider_on_leaf_rejected() {
        let workflow = create_test_workflow();
        let root = workflow.root();
        let err = workflow.add_node(&AddNodeCommand::new("webhook", Some("aws".into()), root.id)).unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(workflow.node_count(), 1);
    }

    #[test]
    fn test_unknown_parent_leaves_graph_unchanged() {
        let workflow = create_test_workflow();
        let before = workflow.to_model();

        let err = workflow.add_node(&AddNodeCommand::new("webhook", None, "missing")).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(workflow.to_model(), before);
    }

    #[test]
    fn test_get_node_missing() {
        let workflow = create_test_workflow();
        assert!(workflow.get_node("missing").unwrap_err().is_not_found());
        assert!(workflow.children_of("missing").unwrap_err().is_not_found());
    }

    #[test]
    fn test_structural_queries() {
        let workflow = create_test_workflow();
        let root = workflow.root();
        let a = workflow.add_node(&AddNodeCommand::new("webhook", None, root.id.clone())).unwrap();
        let b = workflow.add_node(&AddNodeCommand::new("deploy", Some("local".into()), a.id.clone())).unwrap();
        let c = workflow.add_node(&AddNodeCommand::new("deploy", Some("aws".into()), a.id.clone())).unwrap();
        let d = workflow.add_node(&AddNodeCommand::new("webhook", None, c.id.clone())).unwrap();

        let children: Vec<_> = workflow.children_of(&a.id).unwrap().into_iter().map(|n| n.id).collect();
        assert_eq!(children, vec![b.id.clone(), c.id.clone()]);

        let ancestors: Vec<_> = workflow.ancestors_of(&d.id).unwrap().into_iter().map(|n| n.id).collect();
        assert_eq!(ancestors, vec![c.id.clone(), a.id.clone(), root.id.clone()]);

        assert_eq!(workflow.parent_of(&root.id).unwrap(), None);
        assert_eq!(workflow.parent_of(&b.id).unwrap().unwrap().id, a.id);

        let order: Vec<_> = workflow.nodes().into_iter().map(|n| n.id).collect();
        assert_eq!(order, vec![root.id, a.id, b.id, c.id, d.id]);
    }

    #[test]
    fn test_tree_shape_after_many_inserts() {
        let workflow = create_test_workflow();
        let mut ids = vec![workflow.root().id];
        for i in 0..50 {
            let parent = ids[(i * 7) % ids.len()].clone();
            let node = workflow.add_node(&AddNodeCommand::new("webhook", None, parent)).unwrap();
            ids.push(node.id);
        }

        let nodes = workflow.nodes();
        assert_eq!(nodes.len(), 51);
        assert_eq!(nodes.iter().filter(|n| n.is_root()).count(), 1);

        let unique: HashSet<_> = nodes.iter().map(|n| n.id.clone()).collect();
        assert_eq!(unique.len(), 51);

        // every node reaches the root by parent links
        for node in &nodes {
            let ancestors = workflow.ancestors_of(&node.id).unwrap();
            if !node.is_root() {
                assert!(ancestors.last().unwrap().is_root());
            }
        }
        assert!(!is_cyclic_directed(&workflow.read().graph));
    }

    #[test]
    fn test_concurrent_inserts_under_same_parent() {
        let workflow = Arc::new(create_test_workflow());
        let root = workflow.root();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let workflow = workflow.clone();
                let parent = root.id.clone();
                thread::spawn(move || (0..25).map(|_| workflow.add_node(&AddNodeCommand::new("webhook", None, parent.clone())).unwrap().id).collect::<Vec<_>>())
            })
            .collect();

        let mut per_thread = Vec::new();
        for handle in handles {
            per_thread.push(handle.join().unwrap());
        }

        let children: Vec<_> = workflow.children_of(&root.id).unwrap().into_iter().map(|n| n.id).collect();
        assert_eq!(children.len(), 200);

        // each caller's inserts keep their relative order
        for ids in per_thread {
            let positions: Vec<_> = ids.iter().map(|id| children.iter().position(|c| c == id).unwrap()).collect();
            assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_model_roundtrip_preserves_ids() {
        let workflow = create_test_workflow();
        let root = workflow.root();
        let a = workflow.add_node(&AddNodeCommand::new("deploy", Some("local".into()), root.id.clone())).unwrap();
        workflow.add_node(&AddNodeCommand::new("webhook", None, a.id.clone())).unwrap();

        let json = workflow.to_model().to_json().unwrap();
        let restored = Workflow::from_model(&WorkflowModel::from_json(&json).unwrap(), Arc::new(sample_catalog())).unwrap();
        assert_eq!(restored.to_model(), workflow.to_model());
        assert_eq!(restored.children_of(&a.id).unwrap().len(), 1);
    }

    #[test]
    fn test_from_model_rejects_bad_snapshots() {
        let catalog = Arc::new(sample_catalog());
        let root = NodeModel {
            id: "r".into(),
            name: "Start".into(),
            node_type: ROOT_NODE_TYPE.into(),
            provider_type: None,
            parent_id: None,
        };
        let child = |id: &str, parent: Option<&str>| NodeModel {
            id: id.into(),
            name: "Webhook".into(),
            node_type: "webhook".into(),
            provider_type: None,
            parent_id: parent.map(String::from),
        };

        let orphan = WorkflowModel {
            id: "w".into(),
            name: "w".into(),
            nodes: vec![root.clone(), child("a", Some("missing"))],
            ..Default::default()
        };
        assert!(Workflow::from_model(&orphan, catalog.clone()).unwrap_err().is_invalid_argument());

        let duplicate = WorkflowModel {
            id: "w".into(),
            name: "w".into(),
            nodes: vec![root.clone(), child("a", Some("r")), child("a", Some("r"))],
            ..Default::default()
        };
        assert!(Workflow::from_model(&duplicate, catalog.clone()).is_err());

        let two_roots = WorkflowModel {
            id: "w".into(),
            name: "w".into(),
            nodes: vec![root.clone(), child("a", None)],
            ..Default::default()
        };
        assert!(Workflow::from_model(&two_roots, catalog.clone()).is_err());

        let empty = WorkflowModel {
            id: "w".into(),
            name: "w".into(),
            nodes: vec![],
            ..Default::default()
        };
        assert!(Workflow::from_model(&empty, catalog.clone()).is_err());

        let no_cron = WorkflowModel {
            id: "w".into(),
            name: "w".into(),
            trigger: TRIGGER_AUTO.into(),
            nodes: vec![root.clone()],
            ..Default::default()
        };
        assert!(Workflow::from_model(&no_cron, catalog).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_trigger_settings() {
        let workflow = create_test_workflow();
        assert_eq!(workflow.trigger(), TRIGGER_MANUAL);
        assert!(!workflow.is_enabled_auto());

        workflow.set_trigger(TRIGGER_AUTO, Some("0 3 * * *")).unwrap();
        assert!(!workflow.is_enabled_auto());
        workflow.set_enabled(true);
        assert!(workflow.is_enabled_auto());
        assert_eq!(workflow.trigger_cron().as_deref(), Some("0 3 * * *"));

        assert!(workflow.set_trigger(TRIGGER_AUTO, Some("not a cron")).unwrap_err().is_invalid_argument());
        assert!(workflow.set_trigger(TRIGGER_AUTO, None).unwrap_err().is_invalid_argument());
        assert!(workflow.set_trigger("webhook", None).unwrap_err().is_invalid_argument());
        // rejected updates leave the settings untouched
        assert!(workflow.is_enabled_auto());

        workflow.set_trigger(TRIGGER_MANUAL, Some("0 3 * * *")).unwrap();
        assert_eq!(workflow.trigger_cron(), None);
        assert!(!workflow.is_enabled_auto());
    }

    #[test]
    fn test_record_and_forget_run() {
        let workflow = create_test_workflow();
        assert_eq!(workflow.last_run(), None);

        workflow.record_run("r1", RunStatus::Pending);
        let queued = workflow.last_run().unwrap();
        workflow.record_run("r1", RunStatus::Succeeded);
        let done = workflow.last_run().unwrap();
        assert_eq!(done.status, RunStatus::Succeeded);
        assert_eq!(done.time, queued.time);

        workflow.forget_run("other");
        assert!(workflow.last_run().is_some());
        workflow.forget_run("r1");
        assert_eq!(workflow.last_run(), None);
    }

    #[test]
    fn test_settings_survive_model_roundtrip() {
        let workflow = create_test_workflow();
        workflow.set_trigger(TRIGGER_AUTO, Some("*/5 * * * *")).unwrap();
        workflow.set_enabled(true);
        workflow.record_run("r1", RunStatus::Failed);

        let restored = Workflow::from_model(&workflow.to_model(), Arc::new(sample_catalog())).unwrap();
        assert!(restored.is_enabled_auto());
        assert_eq!(restored.last_run(), workflow.last_run());
        assert!(format!("{:?}", restored).starts_with("Workflow"));
    }

    #[test]
    fn test_schema_lists_nodes() {
        let workflow = create_test_workflow();
        let root = workflow.root();
        workflow.add_node(&AddNodeCommand::new("deploy", Some("aws".into()), root.id)).unwrap();
        let schema = workflow.schema();
        assert!(schema.contains("Nodes: 2"));
        assert!(schema.contains("provider: aws"));
    }
}
