use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;

use deckbuild::dag::{Scheduler, TaskState, resolve};
use deckbuild::engine::TaskOutcome;
use deckbuild::errors::DeckError;
use deckbuild_test_utils::fake_task::{FakeSpec, FakeTask, FakeWorld};

/// A random DAG over `task_0..task_{n-1}` plus an aggregate root over all
/// of them. Acyclic because task N may only depend on tasks 0..N-1.
#[derive(Debug, Clone)]
struct DagCase {
    deps: Vec<Vec<usize>>,
    failing: HashSet<usize>,
    complete: HashSet<usize>,
}

fn dag_case_strategy(max_tasks: usize) -> impl Strategy<Value = DagCase> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        (
            proptest::collection::vec(
                proptest::collection::vec(any::<usize>(), 0..num_tasks),
                num_tasks,
            ),
            proptest::collection::hash_set(0..num_tasks, 0..=num_tasks / 2),
            proptest::collection::hash_set(0..num_tasks, 0..=num_tasks / 2),
        )
            .prop_map(|(raw_deps, failing, complete)| {
                let deps = raw_deps
                    .into_iter()
                    .enumerate()
                    .map(|(i, potential)| {
                        let valid: HashSet<usize> = if i == 0 {
                            HashSet::new()
                        } else {
                            potential.into_iter().map(|d| d % i).collect()
                        };
                        let mut valid: Vec<usize> = valid.into_iter().collect();
                        valid.sort_unstable();
                        valid
                    })
                    .collect();
                DagCase {
                    deps,
                    failing,
                    complete,
                }
            })
    })
}

fn name(i: usize) -> String {
    format!("task_{i}")
}

fn build_world(case: &DagCase) -> (Arc<FakeWorld>, FakeTask) {
    let world = FakeWorld::new();
    for (i, deps) in case.deps.iter().enumerate() {
        world.define(
            &name(i),
            FakeSpec::writes(format!("/w/{}", name(i))).after(deps.iter().map(|&d| name(d))),
        );
        if case.complete.contains(&i) {
            world.fs().add_file(format!("/w/{}", name(i)), b"done".to_vec());
        }
    }
    let root = world.define(
        "root",
        FakeSpec::aggregate().after((0..case.deps.len()).map(name)),
    );
    (world, root)
}

fn index_of(scheduler: &Scheduler<FakeTask>, id: usize) -> Option<usize> {
    scheduler
        .graph()
        .identity(id)
        .param("name")
        .and_then(|n| n.strip_prefix("task_"))
        .and_then(|n| n.parse().ok())
}

proptest! {
    #[test]
    fn scheduler_respects_dependencies_and_terminates(
        case in dag_case_strategy(10),
        batch in 1..4usize,
        reverse in any::<bool>(),
    ) {
        let (_world, root) = build_world(&case);
        let graph = resolve(vec![root]).expect("acyclic by construction");
        let mut scheduler = Scheduler::new(graph);
        scheduler.start();

        let mut dispatched = HashSet::new();
        let mut rounds = 0;

        while !scheduler.is_finished() {
            rounds += 1;
            prop_assert!(rounds <= 100, "scheduler did not terminate");

            let mut ready = scheduler.take_ready(batch);
            prop_assert!(!ready.is_empty(), "stalled with nothing ready");
            prop_assert!(ready.len() <= batch);
            if reverse {
                ready.reverse();
            }

            for task in ready {
                prop_assert!(dispatched.insert(task.id), "dispatched twice");
                for &dep in scheduler.graph().dependencies_of(task.id) {
                    prop_assert_eq!(scheduler.state(dep), TaskState::Done);
                }

                let outcome = match index_of(&scheduler, task.id) {
                    Some(i) if case.failing.contains(&i) => {
                        TaskOutcome::Failed(Arc::new(DeckError::Config("boom".to_string())))
                    }
                    _ => TaskOutcome::Success { ran: true },
                };
                scheduler.handle_completion(task.id, outcome);
            }
        }

        let graph = scheduler.graph();
        for id in graph.node_ids() {
            let state = scheduler.state(id);
            let deps = graph.dependencies_of(id);
            match state {
                TaskState::Done => {
                    for &dep in deps {
                        prop_assert_eq!(scheduler.state(dep), TaskState::Done);
                    }
                }
                TaskState::Failed => {
                    let i = index_of(&scheduler, id);
                    prop_assert!(i.is_some_and(|i| case.failing.contains(&i)));
                }
                TaskState::Blocked => {
                    prop_assert!(!dispatched.contains(&id));
                    prop_assert!(deps.iter().any(|&d| matches!(
                        scheduler.state(d),
                        TaskState::Failed | TaskState::Blocked
                    )));
                }
                other => prop_assert!(false, "non-terminal state {:?}", other),
            }

            // Memoized tasks never reach a worker.
            if let Some(i) = index_of(&scheduler, id) {
                if case.complete.contains(&i) {
                    prop_assert!(!dispatched.contains(&id));
                    prop_assert_eq!(state, TaskState::Done);
                }
            }
        }

        let report = scheduler.report();
        let any_failed = report.failed().next().is_some();
        prop_assert_eq!(report.succeeded(), !any_failed);
    }
}
