//! Resolution Errors
//!
//! Every failure the resolver can report. All of them describe a
//! structurally invalid definition, so none are retryable; each variant
//! carries the offending name or executor index for diagnostics.

use thiserror::Error;

/// Structural problems caught when a definition is constructed or loaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("Executor {0} has an empty command")]
    EmptyCommand(usize),

    #[error("Executor {0} has a non-finite priority")]
    InvalidPriority(usize),

    #[error("Invalid {kind} name '{name}': names must match [a-zA-Z][a-zA-Z0-9_]+")]
    InvalidName { kind: &'static str, name: String },

    #[error("Workflow input '{0}' is declared more than once")]
    DuplicateInput(String),

    #[error("Workflow output '{0}' is declared more than once")]
    DuplicateOutput(String),
}

/// Failures while building the requirements/yields catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Yield '{0}' is declared more than once")]
    DuplicateYield(String),

    #[error("Executor {executor} both requires and yields '{name}'")]
    ConflictingReference { executor: usize, name: String },

    #[error("Executor {executor} writes to '$${name}' in stdout/stderr but never declares it as a yield")]
    UndeclaredYield { executor: usize, name: String },

    #[error("'{0}' is required but neither yielded by an executor nor declared as a workflow input")]
    MissingInput(String),

    #[error("Workflow output '{0}' is not yielded by any executor")]
    UndeclaredOutput(String),
}

/// Failures while decomposing the catalog into execution layers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("No executor can be scheduled among {pending:?} (cyclic or dangling dependency)")]
    Unschedulable { pending: Vec<usize> },

    #[error("Workflow output '{0}' is never produced")]
    UnsatisfiedOutput(String),
}

/// Failures while checking an externally supplied execution order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderValidationError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Executor index {index} is out of range (workflow has {count} executors)")]
    InvalidIndex { index: usize, count: usize },

    #[error("Executor {index} runs before '{name}' is available")]
    UnmetDependency { index: usize, name: String },

    #[error("Workflow output '{0}' is never produced by this order")]
    UnsatisfiedOutput(String),
}

/// Any failure on the combined submission path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Order(#[from] OrderValidationError),
}
