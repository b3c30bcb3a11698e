//! Requirements/Yields Catalog
//!
//! Derives, for every executor, the set of names it consumes and the set
//! it produces, and checks that naming is consistent across the whole
//! definition:
//! - Yield names are globally unique
//! - No executor both consumes and produces the same name
//! - stdout/stderr only reference the executor's own yields
//! - Every consumed name is produced somewhere or declared as an input
//! - Every declared output is produced by some executor
//!
//! Two synthetic boundary entries bracket the real executors: the input
//! boundary yields whatever no executor produces, the output boundary
//! requires every declared output.

use std::collections::BTreeSet;

use log::{debug, info, warn};

use super::error::CatalogError;
use super::metavars::scan;
use super::model::{Executor, WorkflowDefinition};

/// Names an entry needs before it can run and names it produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementsYields {
    pub requirements: BTreeSet<String>,
    pub yields: BTreeSet<String>,
}

impl RequirementsYields {
    /// Returns the first requirement not contained in `satisfied`.
    pub fn first_unmet(&self, satisfied: &BTreeSet<String>) -> Option<&str> {
        self.requirements
            .iter()
            .find(|name| !satisfied.contains(*name))
            .map(String::as_str)
    }

    /// Returns true if every requirement is contained in `satisfied`.
    pub fn is_satisfied_by(&self, satisfied: &BTreeSet<String>) -> bool {
        self.requirements.is_subset(satisfied)
    }
}

/// Position of an entry in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntrySlot {
    /// Items available before any executor runs
    InputBoundary,
    /// A real executor, by index in the definition
    Executor(usize),
    /// Items that must exist after every executor finished
    OutputBoundary,
}

/// The full requirements/yields catalog of a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    input: RequirementsYields,
    executors: Vec<RequirementsYields>,
    output: RequirementsYields,
}

impl Catalog {
    #[cfg(test)]
    pub(crate) fn from_parts(
        input: RequirementsYields,
        executors: Vec<RequirementsYields>,
        output: RequirementsYields,
    ) -> Self {
        Self {
            input,
            executors,
            output,
        }
    }

    /// The input boundary entry.
    pub fn input(&self) -> &RequirementsYields {
        &self.input
    }

    /// The output boundary entry.
    pub fn output(&self) -> &RequirementsYields {
        &self.output
    }

    /// Entries of the real executors, indexed like the definition.
    pub fn executors(&self) -> &[RequirementsYields] {
        &self.executors
    }

    /// Gets the entry of a real executor.
    pub fn executor(&self, index: usize) -> Option<&RequirementsYields> {
        self.executors.get(index)
    }

    /// Number of real executors.
    pub fn len(&self) -> usize {
        self.executors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }

    /// All entries in order: input boundary, executors, output boundary.
    pub fn entries(&self) -> impl Iterator<Item = (EntrySlot, &RequirementsYields)> {
        std::iter::once((EntrySlot::InputBoundary, &self.input))
            .chain(
                self.executors
                    .iter()
                    .enumerate()
                    .map(|(i, entry)| (EntrySlot::Executor(i), entry)),
            )
            .chain(std::iter::once((EntrySlot::OutputBoundary, &self.output)))
    }

    /// Looks up an entry by slot.
    pub fn get(&self, slot: EntrySlot) -> Option<&RequirementsYields> {
        match slot {
            EntrySlot::InputBoundary => Some(&self.input),
            EntrySlot::Executor(i) => self.executors.get(i),
            EntrySlot::OutputBoundary => Some(&self.output),
        }
    }
}

/// Builds the requirements/yields entry of one executor.
///
/// `seen_yields` is the running set of yield names declared by earlier
/// executors; this executor's yields are added to it.
fn executor_entry(
    index: usize,
    executor: &Executor,
    seen_yields: &mut BTreeSet<String>,
) -> Result<RequirementsYields, CatalogError> {
    let command_refs = scan(&executor.command_line());
    let stdin_refs = scan(executor.stdin.as_deref().unwrap_or(""));
    let mut expected_yields = scan(executor.stdout.as_deref().unwrap_or(""));
    expected_yields.extend(scan(executor.stderr.as_deref().unwrap_or("")));

    let mut declared = BTreeSet::new();
    for name in executor.yield_names() {
        if !seen_yields.insert(name.to_string()) {
            return Err(CatalogError::DuplicateYield(name.to_string()));
        }
        declared.insert(name.to_string());
    }

    let mut requirements = stdin_refs;
    requirements.extend(command_refs.difference(&declared).cloned());

    if let Some(name) = requirements.intersection(&declared).next() {
        return Err(CatalogError::ConflictingReference {
            executor: index,
            name: name.clone(),
        });
    }

    if let Some(name) = expected_yields.difference(&declared).next() {
        return Err(CatalogError::UndeclaredYield {
            executor: index,
            name: name.clone(),
        });
    }

    debug!(
        "Executor {}: requires {:?}, yields {:?}",
        index, requirements, declared
    );

    Ok(RequirementsYields {
        requirements,
        yields: declared,
    })
}

/// Builds the requirements/yields catalog of a definition.
///
/// The definition is only read. Any inconsistency aborts the whole build;
/// when several names violate the same rule the alphabetically first one
/// is reported.
pub fn build_catalog(definition: &WorkflowDefinition) -> Result<Catalog, CatalogError> {
    let mut seen_yields = BTreeSet::new();
    let mut executors = Vec::with_capacity(definition.len());

    for (index, executor) in definition.executors.iter().enumerate() {
        executors.push(executor_entry(index, executor, &mut seen_yields)?);
    }

    let all_requirements: BTreeSet<String> = executors
        .iter()
        .flat_map(|entry| entry.requirements.iter().cloned())
        .collect();

    // whatever no executor produces must come from the workflow boundary
    let implicit_inputs: BTreeSet<String> = all_requirements
        .difference(&seen_yields)
        .cloned()
        .collect();

    let declared_inputs: BTreeSet<String> =
        definition.input_names().map(str::to_string).collect();

    if let Some(name) = implicit_inputs.difference(&declared_inputs).next() {
        return Err(CatalogError::MissingInput(name.clone()));
    }

    for name in declared_inputs.difference(&implicit_inputs) {
        warn!("Workflow input '{}' is declared but never consumed", name);
    }

    let declared_outputs: BTreeSet<String> =
        definition.output_names().map(str::to_string).collect();

    if let Some(name) = declared_outputs.difference(&seen_yields).next() {
        return Err(CatalogError::UndeclaredOutput(name.clone()));
    }

    info!(
        "Catalog built: {} executors, {} implicit inputs, {} outputs",
        executors.len(),
        implicit_inputs.len(),
        declared_outputs.len()
    );

    Ok(Catalog {
        input: RequirementsYields {
            requirements: BTreeSet::new(),
            yields: implicit_inputs,
        },
        executors,
        output: RequirementsYields {
            requirements: declared_outputs,
            yields: BTreeSet::new(),
        },
    })
}
