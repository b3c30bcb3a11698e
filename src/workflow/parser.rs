//! Definition Parser
//!
//! Handles loading and saving workflow definitions. YAML (`.yaml`/`.yml`)
//! and JSON (`.json`) are supported; the format is chosen by extension and
//! anything else is read as YAML.

use std::fs;
use std::path::Path;

use log::{debug, info};
use thiserror::Error;

use super::error::DefinitionError;
use super::model::WorkflowDefinition;

/// Failures while reading or writing a definition file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read definition file '{path}': {source}. Check that the file exists and is readable.")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write definition file '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse definition YAML: {0}. Check the file format.")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse definition JSON: {0}. Check the file format.")]
    Json(#[from] serde_json::Error),

    #[error("Invalid definition: {0}")]
    Definition(#[from] DefinitionError),
}

fn is_json(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// Parses a definition from text and checks its structure.
pub fn parse_definition(content: &str, json: bool) -> Result<WorkflowDefinition, LoadError> {
    let definition: WorkflowDefinition = if json {
        serde_json::from_str(content)?
    } else {
        serde_yaml::from_str(content)?
    };

    definition.validate()?;
    Ok(definition)
}

/// Loads a workflow definition from a file.
///
/// The definition is parsed and structurally validated; dependency
/// resolution is left to the caller.
///
/// # Example
///
/// ```rust,no_run
/// use tesflow::workflow::{load_definition, resolve};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let definition = load_definition("pipeline.yaml")?;
///     let plan = resolve(&definition)?;
///     println!("Execution order: {:?}", plan.order);
///     Ok(())
/// }
/// ```
pub fn load_definition(path: &str) -> Result<WorkflowDefinition, LoadError> {
    info!("Loading definition from: {}", path);

    let content = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_string(),
        source,
    })?;

    debug!("Definition content loaded ({} bytes)", content.len());

    let definition = parse_definition(&content, is_json(path))?;

    info!(
        "Parsed {} executors, {} inputs, {} outputs",
        definition.executors.len(),
        definition.inputs.len(),
        definition.outputs.len()
    );

    Ok(definition)
}

/// Saves a definition, as JSON if the path ends in `.json`, YAML otherwise.
pub fn save_definition(definition: &WorkflowDefinition, path: &str) -> Result<(), LoadError> {
    let content = if is_json(path) {
        serde_json::to_string_pretty(definition)?
    } else {
        serde_yaml::to_string(definition)?
    };

    fs::write(path, content).map_err(|source| LoadError::Write {
        path: path.to_string(),
        source,
    })?;
    info!("Definition saved to: {}", path);
    Ok(())
}
