// src/dag/resolve.rs

//! Resolve phase: expand roots into an [`ExecutionGraph`].

use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::{debug, warn};

use crate::dag::graph::{ExecutionGraph, NodeId, Resolution};
use crate::errors::{Result, StructuralError};
use crate::task::{Task, TaskIdentity};

/// Build the execution graph reachable from `roots`.
///
/// Each distinct task (by identity) is visited once: its `output()` is
/// computed, checked for completeness and, only if incomplete, its
/// `dependencies()` are expanded. A complete task is memoized and nothing
/// below it is examined.
///
/// Errors from a task's own `output()`/`dependencies()` mark that node as
/// failed and resolution carries on. Structural problems abort the whole
/// pass: a dependency cycle, two identities declaring one output path, or an
/// output path that another task reads as an input.
pub fn resolve<T: Task>(roots: Vec<T>) -> Result<ExecutionGraph<T>> {
    let mut graph = ExecutionGraph::new();
    let mut claims = Claims::default();
    let mut queue: VecDeque<NodeId> = VecDeque::new();

    for root in roots {
        let (id, is_new) = graph.insert(root);
        graph.mark_root(id);
        if is_new {
            queue.push_back(id);
        }
    }

    while let Some(id) = queue.pop_front() {
        let task = Arc::clone(graph.task(id));
        let identity = graph.identity(id).clone();

        let output = match task.output() {
            Ok(output) => output,
            Err(err) if err.is_structural() => return Err(err),
            Err(err) => {
                warn!(task = %identity, error = %err, "could not determine task output");
                graph.set_resolution(id, Resolution::Failed(Arc::new(err)));
                continue;
            }
        };

        for path in output.owned_paths() {
            claims.write(path, &identity)?;
        }
        for path in task.inputs() {
            claims.read(&path, &identity)?;
        }

        if output.is_complete() {
            debug!(task = %identity, "output already complete; memoized");
            graph.set_resolution(id, Resolution::UpToDate(output));
            continue;
        }
        graph.set_resolution(id, Resolution::Incomplete(output));

        let deps = match task.dependencies() {
            Ok(deps) => deps,
            Err(err) if err.is_structural() => return Err(err),
            Err(err) => {
                warn!(task = %identity, error = %err, "could not determine task dependencies");
                graph.set_resolution(id, Resolution::Failed(Arc::new(err)));
                continue;
            }
        };

        debug!(task = %identity, deps = deps.len(), "expanded dependencies");

        for dep in deps {
            let (dep_id, is_new) = graph.insert(dep);
            if dep_id == id {
                return Err(StructuralError::Cycle(identity).into());
            }
            graph.add_edge(id, dep_id);
            if is_new {
                queue.push_back(dep_id);
            }
        }
    }

    ensure_acyclic(&graph)?;
    Ok(graph)
}

#[derive(Debug)]
enum Claim {
    Writes(TaskIdentity),
    Reads(TaskIdentity),
}

impl Claim {
    fn holder(&self) -> &TaskIdentity {
        match self {
            Claim::Writes(id) | Claim::Reads(id) => id,
        }
    }
}

/// Which task writes, or first reads, each path seen so far.
#[derive(Debug, Default)]
struct Claims(HashMap<PathBuf, Claim>);

impl Claims {
    fn write(&mut self, path: &Path, identity: &TaskIdentity) -> Result<()> {
        match self.0.entry(path.to_path_buf()) {
            Entry::Occupied(existing) => Err(collision(path, existing.get(), identity)),
            Entry::Vacant(slot) => {
                slot.insert(Claim::Writes(identity.clone()));
                Ok(())
            }
        }
    }

    fn read(&mut self, path: &Path, identity: &TaskIdentity) -> Result<()> {
        match self.0.entry(path.to_path_buf()) {
            Entry::Occupied(existing) => match existing.get() {
                Claim::Writes(_) => Err(collision(path, existing.get(), identity)),
                Claim::Reads(_) => Ok(()),
            },
            Entry::Vacant(slot) => {
                slot.insert(Claim::Reads(identity.clone()));
                Ok(())
            }
        }
    }
}

fn collision(path: &Path, existing: &Claim, identity: &TaskIdentity) -> crate::errors::DeckError {
    StructuralError::PathCollision {
        path: path.to_path_buf(),
        first: existing.holder().clone(),
        second: identity.clone(),
    }
    .into()
}

fn ensure_acyclic<T>(graph: &ExecutionGraph<T>) -> Result<()> {
    // Edge direction: dep -> dependent.
    let mut g: DiGraphMap<NodeId, ()> = DiGraphMap::new();

    for id in graph.node_ids() {
        g.add_node(id);
        for &dep in graph.dependencies_of(id) {
            g.add_edge(dep, id, ());
        }
    }

    // A topological sort will fail if there is a cycle.
    match toposort(&g, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(StructuralError::Cycle(graph.identity(cycle.node_id()).clone()).into()),
    }
}
