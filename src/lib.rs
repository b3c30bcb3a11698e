//! tesflow - Workflow Dependency Resolver
//!
//! Checks user-submitted workflow definitions for a task execution service
//! and plans how to run them. Executors exchange data through `$$name`
//! references; the resolver infers the data flow from those references,
//! rejects inconsistent or cyclic definitions, and produces both parallel
//! layers and a flat order for a sequential dispatcher.
//!
//! # Architecture
//!
//! Everything lives in the [`workflow`] module:
//!
//! - [`workflow::metavars`]: Reference scanning and substitution
//! - [`workflow::catalog`]: Requirements/yields catalog and naming checks
//! - [`workflow::planner`]: Layering engine and order resolver
//! - [`workflow::validator`]: Validation of overridden orders
//!
//! Resolution is a pure, synchronous computation over an in-memory
//! definition; it shares no state between calls.
//!
//! # Example
//!
//! ```rust,no_run
//! use tesflow::{load_definition, resolve, validate_order};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Load a definition from YAML
//!     let definition = load_definition("pipeline.yaml")?;
//!
//!     // Compute layers and the default order
//!     let plan = resolve(&definition)?;
//!     println!("{} layers, order {:?}", plan.layers.len(), plan.order);
//!
//!     // Check a caller-supplied override
//!     validate_order(&definition, &[0, 2, 1])?;
//!     Ok(())
//! }
//! ```

pub mod workflow;

// Re-export commonly used types
pub use workflow::model::{Executor, WorkflowDefinition};
pub use workflow::parser::load_definition;
pub use workflow::planner::{resolve, ExecutionPlan};
pub use workflow::validator::validate_order;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "tesflow";
