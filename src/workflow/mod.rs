//! Workflow Resolution Module
//!
//! Provides data structures and the dependency resolver for submitted
//! workflow definitions.
//!
//! # Structure
//!
//! - [`metavars`]: `$$name` reference scanning and substitution
//! - [`model`]: Core data structures (Executor, WorkflowDefinition)
//! - [`catalog`]: Per-executor requirements/yields and naming checks
//! - [`planner`]: Layering and execution order
//! - [`validator`]: Validation of externally supplied orders
//! - [`render`]: Concrete executors for the dispatcher
//! - [`parser`]: YAML/JSON loading and saving

pub mod catalog;
pub mod error;
pub mod metavars;
pub mod model;
pub mod parser;
pub mod planner;
pub mod render;
pub mod validator;

pub use catalog::{build_catalog, Catalog, EntrySlot, RequirementsYields};
pub use error::{CatalogError, DefinitionError, OrderValidationError, ResolveError, ScheduleError};
pub use metavars::{scan, substitute};
pub use model::{Executor, Input, Output, WorkflowDefinition, Yield};
pub use parser::{load_definition, save_definition, LoadError};
pub use planner::{
    compute_layers, default_score, resolve, resolve_order, resolve_with, ExecutionLayer,
    ExecutionPlan,
};
pub use render::{render_executor, RenderedExecutor};
pub use validator::validate_order;
