// src/dag/graph.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::errors::DeckError;
use crate::target::TaskOutput;
use crate::task::{Task, TaskIdentity};

/// Index of a node inside an [`ExecutionGraph`].
pub type NodeId = usize;

/// What resolution learned about a node before anything ran.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Discovered but not examined yet.
    Unresolved,
    /// Output missing; the task has to run.
    Incomplete(TaskOutput),
    /// Output already complete; the task is memoized for this pass.
    UpToDate(TaskOutput),
    /// `output()` or `dependencies()` failed.
    Failed(Arc<DeckError>),
}

/// Internal node structure: stores the task plus immediate deps and dependents.
struct DagNode<T> {
    task: Arc<T>,
    identity: TaskIdentity,
    resolution: Resolution,
    /// Direct dependencies: tasks that must be done before this one can run.
    deps: Vec<NodeId>,
    /// Direct dependents: tasks that depend on this one.
    dependents: Vec<NodeId>,
}

/// Deduplicated DAG of tasks reachable from the roots of one pass.
///
/// Nodes are keyed by [`TaskIdentity`]; inserting a task whose identity is
/// already present returns the existing node, so every unit of work appears
/// exactly once no matter how many paths reach it.
pub struct ExecutionGraph<T> {
    nodes: Vec<DagNode<T>>,
    index: HashMap<TaskIdentity, NodeId>,
    roots: Vec<NodeId>,
}

impl<T> fmt::Debug for ExecutionGraph<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionGraph")
            .field("nodes", &self.nodes.iter().map(|n| &n.identity).collect::<Vec<_>>())
            .field("roots", &self.roots)
            .finish()
    }
}

impl<T: Task> ExecutionGraph<T> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            roots: Vec::new(),
        }
    }

    /// Insert `task` unless a node with the same identity exists.
    ///
    /// Returns the node id and whether it was newly created.
    pub(crate) fn insert(&mut self, task: T) -> (NodeId, bool) {
        let identity = task.identity();
        if let Some(&id) = self.index.get(&identity) {
            return (id, false);
        }

        let id = self.nodes.len();
        self.index.insert(identity.clone(), id);
        self.nodes.push(DagNode {
            task: Arc::new(task),
            identity,
            resolution: Resolution::Unresolved,
            deps: Vec::new(),
            dependents: Vec::new(),
        });
        (id, true)
    }
}

impl<T> ExecutionGraph<T> {
    pub(crate) fn mark_root(&mut self, id: NodeId) {
        if !self.roots.contains(&id) {
            self.roots.push(id);
        }
    }

    /// Record that `dependent` requires `dep`.
    pub(crate) fn add_edge(&mut self, dependent: NodeId, dep: NodeId) {
        if self.nodes[dependent].deps.contains(&dep) {
            return;
        }
        self.nodes[dependent].deps.push(dep);
        self.nodes[dep].dependents.push(dependent);
    }

    pub(crate) fn set_resolution(&mut self, id: NodeId, resolution: Resolution) {
        self.nodes[id].resolution = resolution;
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node ids, in the order resolution discovered them.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        0..self.nodes.len()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn lookup(&self, identity: &TaskIdentity) -> Option<NodeId> {
        self.index.get(identity).copied()
    }

    pub fn identity(&self, id: NodeId) -> &TaskIdentity {
        &self.nodes[id].identity
    }

    pub fn task(&self, id: NodeId) -> &Arc<T> {
        &self.nodes[id].task
    }

    /// Declared output, if `output()` succeeded during resolution.
    pub fn output(&self, id: NodeId) -> Option<&TaskOutput> {
        match &self.nodes[id].resolution {
            Resolution::Incomplete(output) | Resolution::UpToDate(output) => Some(output),
            Resolution::Unresolved | Resolution::Failed(_) => None,
        }
    }

    pub fn resolution(&self, id: NodeId) -> &Resolution {
        &self.nodes[id].resolution
    }

    /// Immediate dependencies of a node, in declaration order.
    pub fn dependencies_of(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].deps
    }

    /// Immediate dependents of a node.
    pub fn dependents_of(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].dependents
    }

    /// Identities of the immediate dependencies of the task with `identity`.
    pub fn dependency_identities(&self, identity: &TaskIdentity) -> Vec<&TaskIdentity> {
        self.lookup(identity)
            .map(|id| {
                self.dependencies_of(id)
                    .iter()
                    .map(|&dep| self.identity(dep))
                    .collect()
            })
            .unwrap_or_default()
    }
}
