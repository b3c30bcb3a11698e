//! Execution Planner
//!
//! Turns a catalog into something a dispatcher can launch:
//! - Layers of mutually independent executors (breadth-first, Kahn-style)
//! - A flat execution order, prioritised within each layer
//!
//! Dependencies are named items rather than direct edges, so instead of
//! in-degree counters the planner tracks the set of names already
//! available and peels off every executor whose requirements it covers.

use std::collections::BTreeSet;

use log::{debug, info};
use serde::Serialize;

use super::catalog::{build_catalog, Catalog, EntrySlot};
use super::error::{ResolveError, ScheduleError};
use super::model::{Executor, WorkflowDefinition};

/// Executors that may run concurrently, by index.
pub type ExecutionLayer = BTreeSet<usize>;

/// The result of resolving a definition on the submission path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionPlan {
    /// Layer `k` depends only on names produced by layers before it
    pub layers: Vec<ExecutionLayer>,
    /// Flat order consistent with `layers`
    pub order: Vec<usize>,
}

impl ExecutionPlan {
    /// Returns the layer depth an executor was scheduled at.
    pub fn depth_of(&self, index: usize) -> Option<usize> {
        self.layers.iter().position(|layer| layer.contains(&index))
    }

    /// Size of the widest layer, i.e. the most executors that can run at once.
    pub fn max_parallelism(&self) -> usize {
        self.layers.iter().map(BTreeSet::len).max().unwrap_or(0)
    }
}

/// Decomposes a catalog into ordered layers of independent executors.
///
/// Layer 0 needs nothing but the workflow inputs; each later layer needs
/// only names yielded by strictly earlier layers.
///
/// # Errors
///
/// * `Unschedulable` - some executors can never run (cycle or dangling requirement)
/// * `UnsatisfiedOutput` - a declared output is never produced
pub fn compute_layers(catalog: &Catalog) -> Result<Vec<ExecutionLayer>, ScheduleError> {
    let mut satisfied = BTreeSet::new();
    let mut remaining = BTreeSet::new();
    let mut outputs = None;
    for (slot, entry) in catalog.entries() {
        match slot {
            EntrySlot::InputBoundary => satisfied.extend(entry.yields.iter().cloned()),
            EntrySlot::Executor(i) => {
                remaining.insert(i);
            }
            EntrySlot::OutputBoundary => outputs = Some(entry),
        }
    }
    let mut layers = Vec::new();

    while !remaining.is_empty() {
        let layer: ExecutionLayer = remaining
            .iter()
            .copied()
            .filter(|&i| catalog.executors()[i].is_satisfied_by(&satisfied))
            .collect();

        if layer.is_empty() {
            return Err(ScheduleError::Unschedulable {
                pending: remaining.into_iter().collect(),
            });
        }

        for &i in &layer {
            satisfied.extend(catalog.executors()[i].yields.iter().cloned());
            remaining.remove(&i);
        }

        debug!("Layer {}: {:?}", layers.len(), layer);
        layers.push(layer);
    }

    if let Some(name) = outputs.and_then(|entry| entry.first_unmet(&satisfied)) {
        return Err(ScheduleError::UnsatisfiedOutput(name.to_string()));
    }

    info!(
        "Scheduled {} executors into {} layers",
        catalog.len(),
        layers.len()
    );
    Ok(layers)
}

/// Default intra-layer score: the declared priority, or negative infinity.
///
/// A NaN priority ranks like a missing one.
pub fn default_score(executor: &Executor) -> f64 {
    match executor.priority {
        Some(priority) if !priority.is_nan() => priority,
        _ => f64::NEG_INFINITY,
    }
}

/// Flattens layers into a single execution order.
///
/// Within a layer, executors are sorted by `score` descending so higher
/// priorities launch first; equal scores keep ascending index order.
/// Indices missing from `definition` score as negative infinity.
pub fn resolve_order<F>(
    definition: &WorkflowDefinition,
    layers: &[ExecutionLayer],
    score: F,
) -> Vec<usize>
where
    F: Fn(&Executor) -> f64,
{
    let mut order = Vec::with_capacity(layers.iter().map(BTreeSet::len).sum());

    for layer in layers {
        if layer.len() == 1 {
            order.extend(layer.iter().copied());
            continue;
        }

        let mut scored: Vec<(f64, usize)> = layer
            .iter()
            .map(|&i| {
                let value = definition
                    .executor(i)
                    .map(&score)
                    .unwrap_or(f64::NEG_INFINITY);
                (value, i)
            })
            .collect();

        // layer iteration is ascending, and the sort is stable
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        order.extend(scored.into_iter().map(|(_, i)| i));
    }

    debug!("Execution order: {:?}", order);
    order
}

/// Resolves a definition end to end with the default score.
///
/// Runs the catalog builder, the layering engine and the order resolver.
/// Nothing is returned unless every stage succeeds.
///
/// # Example
///
/// ```
/// use tesflow::workflow::{resolve, Executor, WorkflowDefinition};
///
/// let definition = WorkflowDefinition::from_executors(vec![
///     Executor::new(["make", "$$obj"]).yielding("obj", "/build/obj"),
///     Executor::new(["link", "$$obj", "$$bin"]).yielding("bin", "/build/bin"),
/// ])
/// .with_output("bin");
///
/// let plan = resolve(&definition).unwrap();
/// assert_eq!(plan.order, vec![0, 1]);
/// ```
pub fn resolve(definition: &WorkflowDefinition) -> Result<ExecutionPlan, ResolveError> {
    resolve_with(definition, default_score)
}

/// Resolves a definition end to end with a custom intra-layer score.
pub fn resolve_with<F>(
    definition: &WorkflowDefinition,
    score: F,
) -> Result<ExecutionPlan, ResolveError>
where
    F: Fn(&Executor) -> f64,
{
    let catalog = build_catalog(definition)?;
    let layers = compute_layers(&catalog)?;
    let order = resolve_order(definition, &layers, score);
    Ok(ExecutionPlan { layers, order })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::catalog::RequirementsYields;
    use crate::workflow::validator::validate_order;

    fn layer(indices: &[usize]) -> ExecutionLayer {
        indices.iter().copied().collect()
    }

    fn scenario_two() -> WorkflowDefinition {
        WorkflowDefinition::from_executors(vec![
            Executor::new(["produce", "$$out1"])
                .with_stdout("/tmp/$$out1")
                .yielding("out1", "/tmp/out1"),
            Executor::new(["consume", "$$out1", "$$out2"]).yielding("out2", "/tmp/out2"),
        ])
        .with_output("out2")
    }

    /// Diamond: 0 feeds 1 and 2, which both feed 3.
    fn diamond() -> WorkflowDefinition {
        WorkflowDefinition::from_executors(vec![
            Executor::new(["split", "$$src", "$$left", "$$right"])
                .yielding("left", "/l")
                .yielding("right", "/r"),
            Executor::new(["work", "$$left", "$$lout"]).yielding("lout", "/lo"),
            Executor::new(["work", "$$right", "$$rout"])
                .yielding("rout", "/ro")
                .with_priority(5.0),
            Executor::new(["merge", "$$lout", "$$rout", "$$merged"]).yielding("merged", "/m"),
        ])
        .with_input("src")
        .with_output("merged")
    }

    #[test]
    fn test_single_executor_single_layer() {
        let definition = WorkflowDefinition::from_executors(vec![Executor::new([
            "echo",
            "$$greeting",
        ])])
        .with_input("greeting");

        let catalog = build_catalog(&definition).unwrap();
        assert_eq!(compute_layers(&catalog).unwrap(), vec![layer(&[0])]);
    }

    #[test]
    fn test_chain_layers_and_order() {
        let definition = scenario_two();
        let catalog = build_catalog(&definition).unwrap();
        let layers = compute_layers(&catalog).unwrap();

        assert_eq!(layers, vec![layer(&[0]), layer(&[1])]);
        assert_eq!(resolve_order(&definition, &layers, default_score), vec![0, 1]);
    }

    #[test]
    fn test_diamond_layers() {
        let catalog = build_catalog(&diamond()).unwrap();
        let layers = compute_layers(&catalog).unwrap();
        assert_eq!(layers, vec![layer(&[0]), layer(&[1, 2]), layer(&[3])]);
    }

    #[test]
    fn test_priority_orders_within_layer() {
        let plan = resolve(&diamond()).unwrap();
        // executor 2 declares priority 5, executor 1 none
        assert_eq!(plan.order, vec![0, 2, 1, 3]);
        assert_eq!(plan.depth_of(2), Some(1));
        assert_eq!(plan.depth_of(9), None);
        assert_eq!(plan.max_parallelism(), 2);
    }

    #[test]
    fn test_equal_scores_keep_index_order() {
        let definition = WorkflowDefinition::from_executors(vec![
            Executor::new(["c"]).with_priority(1.0),
            Executor::new(["b"]),
            Executor::new(["a"]).with_priority(1.0),
            Executor::new(["d"]),
        ]);
        let plan = resolve(&definition).unwrap();

        assert_eq!(plan.layers, vec![layer(&[0, 1, 2, 3])]);
        assert_eq!(plan.order, vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_negative_priority_beats_missing_priority() {
        let definition = WorkflowDefinition::from_executors(vec![
            Executor::new(["a"]),
            Executor::new(["b"]).with_priority(-100.0),
        ]);
        assert_eq!(resolve(&definition).unwrap().order, vec![1, 0]);
    }

    #[test]
    fn test_custom_score() {
        let definition = WorkflowDefinition::from_executors(vec![
            Executor::new(["short"]),
            Executor::new(["much", "longer", "command"]),
        ]);
        let plan = resolve_with(&definition, |e| e.command.len() as f64).unwrap();
        assert_eq!(plan.order, vec![1, 0]);
    }

    #[test]
    fn test_cycle_is_unschedulable() {
        // 0 needs bb (only from 1), 1 needs aa (only from 0)
        let definition = WorkflowDefinition::from_executors(vec![
            Executor::new(["a", "$$bb", "$$aa"]).yielding("aa", "/a"),
            Executor::new(["b", "$$aa", "$$bb"]).yielding("bb", "/b"),
        ]);
        let catalog = build_catalog(&definition).unwrap();

        assert_eq!(
            compute_layers(&catalog),
            Err(ScheduleError::Unschedulable { pending: vec![0, 1] })
        );
    }

    #[test]
    fn test_cycle_behind_runnable_prefix() {
        let definition = WorkflowDefinition::from_executors(vec![
            Executor::new(["start", "$$seed"]).yielding("seed", "/s"),
            Executor::new(["a", "$$seed", "$$bb", "$$aa"]).yielding("aa", "/a"),
            Executor::new(["b", "$$aa", "$$bb"]).yielding("bb", "/b"),
        ]);
        let catalog = build_catalog(&definition).unwrap();

        assert_eq!(
            compute_layers(&catalog),
            Err(ScheduleError::Unschedulable { pending: vec![1, 2] })
        );
        assert!(matches!(
            resolve(&definition),
            Err(ResolveError::Schedule(ScheduleError::Unschedulable { .. }))
        ));
    }

    #[test]
    fn test_resolve_surfaces_catalog_errors() {
        let definition = WorkflowDefinition::from_executors(vec![Executor::new(["ls"])])
            .with_output("z");
        assert!(matches!(resolve(&definition), Err(ResolveError::Catalog(_))));
    }

    #[test]
    fn test_empty_definition_has_no_layers() {
        let plan = resolve(&WorkflowDefinition::new()).unwrap();
        assert!(plan.layers.is_empty());
        assert!(plan.order.is_empty());
        assert_eq!(plan.max_parallelism(), 0);
    }

    #[test]
    fn test_layers_are_topologically_sound() {
        let definition = diamond();
        let catalog = build_catalog(&definition).unwrap();
        let layers = compute_layers(&catalog).unwrap();

        let mut available = catalog.input().yields.clone();
        for layer in &layers {
            for &i in layer {
                assert!(catalog.executors()[i].is_satisfied_by(&available));
            }
            for &i in layer {
                available.extend(catalog.executors()[i].yields.iter().cloned());
            }
        }
    }

    #[test]
    fn test_layers_are_internally_independent() {
        let catalog = build_catalog(&diamond()).unwrap();
        for layer in compute_layers(&catalog).unwrap() {
            for &a in &layer {
                for &b in &layer {
                    let yields = &catalog.executors()[a].yields;
                    let needs = &catalog.executors()[b].requirements;
                    assert!(yields.is_disjoint(needs));
                }
            }
        }
    }

    #[test]
    fn test_resolved_orders_pass_validation() {
        for definition in [scenario_two(), diamond()] {
            let plan = resolve(&definition).unwrap();
            assert!(validate_order(&definition, &plan.order).is_ok());
        }
    }

    #[test]
    fn test_nan_priority_ranks_like_missing() {
        let definition = WorkflowDefinition::from_executors(vec![
            Executor::new(["a"]).with_priority(10.0),
            Executor::new(["b"]).with_priority(f64::NAN),
            Executor::new(["c"]),
        ]);

        assert_eq!(default_score(&definition.executors[1]), f64::NEG_INFINITY);
        assert_eq!(resolve(&definition).unwrap().order, vec![0, 1, 2]);
    }

    #[test]
    fn test_output_never_produced_by_layers() {
        let needs = |names: &[&str]| -> BTreeSet<String> {
            names.iter().map(|s| s.to_string()).collect()
        };
        let catalog = Catalog::from_parts(
            RequirementsYields::default(),
            vec![RequirementsYields {
                requirements: BTreeSet::new(),
                yields: needs(&["made"]),
            }],
            RequirementsYields {
                requirements: needs(&["made", "missing"]),
                yields: BTreeSet::new(),
            },
        );

        assert_eq!(
            compute_layers(&catalog),
            Err(ScheduleError::UnsatisfiedOutput("missing".to_string()))
        );
    }

    #[test]
    fn test_plan_serializes() {
        let plan = resolve(&scenario_two()).unwrap();
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["order"], serde_json::json!([0, 1]));
        assert_eq!(json["layers"], serde_json::json!([[0], [1]]));
    }
}
