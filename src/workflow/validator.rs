//! Execution Order Validation
//!
//! Checks an externally supplied execution order, such as a user-edited
//! override, against a definition. The catalog is rebuilt on every call;
//! nothing is shared with an earlier resolution, so orders from any source
//! can be checked.

use std::collections::BTreeSet;

use log::{debug, info, warn};

use super::catalog::{build_catalog, EntrySlot};
use super::error::OrderValidationError;
use super::model::WorkflowDefinition;

/// Validates that `order` is a valid topological order for `definition`.
///
/// Walks the order left to right, tracking which names are available:
/// 1. Every index must refer to an existing executor
/// 2. Every executor's requirements must already be available
/// 3. After the last executor, every declared output must be available
///
/// An order that repeats or leaves out executors is accepted as long as
/// the checks above hold; it is logged as a warning.
pub fn validate_order(
    definition: &WorkflowDefinition,
    order: &[usize],
) -> Result<(), OrderValidationError> {
    let catalog = build_catalog(definition)?;
    let mut satisfied = catalog
        .get(EntrySlot::InputBoundary)
        .map(|entry| entry.yields.clone())
        .unwrap_or_default();
    let mut visited = BTreeSet::new();

    for &index in order {
        let entry = catalog
            .get(EntrySlot::Executor(index))
            .ok_or(OrderValidationError::InvalidIndex {
                index,
                count: catalog.len(),
            })?;

        if let Some(name) = entry.first_unmet(&satisfied) {
            return Err(OrderValidationError::UnmetDependency {
                index,
                name: name.to_string(),
            });
        }

        if !visited.insert(index) {
            warn!("Executor {} appears more than once in the order", index);
        }
        satisfied.extend(entry.yields.iter().cloned());
        debug!("Executor {} satisfied, {} names available", index, satisfied.len());
    }

    let outputs = catalog.get(EntrySlot::OutputBoundary);
    if let Some(name) = outputs.and_then(|entry| entry.first_unmet(&satisfied)) {
        return Err(OrderValidationError::UnsatisfiedOutput(name.to_string()));
    }

    if visited.len() < catalog.len() {
        let skipped: Vec<usize> = (0..catalog.len()).filter(|i| !visited.contains(i)).collect();
        warn!("Order leaves out executors {:?}", skipped);
    }

    info!("Execution order of {} executors validated", order.len());
    Ok(())
}
