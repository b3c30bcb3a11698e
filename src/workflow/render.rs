//! Executor Rendering
//!
//! Produces the concrete form of an executor a dispatcher launches:
//! every `$$name` in command tokens, stdin/stdout/stderr and yield paths
//! is replaced with its resolved value. References without a value are
//! kept verbatim so partial rendering is possible.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use super::metavars::{scan, substitute};
use super::model::{Executor, Yield};

/// An executor with metavariable values filled in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedExecutor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub command: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub yields: Vec<Yield>,
}

impl RenderedExecutor {
    /// Names still referenced after rendering.
    pub fn unresolved(&self) -> BTreeSet<String> {
        let mut names = scan(&self.command.join(" "));
        for template in [&self.stdin, &self.stdout, &self.stderr].into_iter().flatten() {
            names.extend(scan(template));
        }
        for y in &self.yields {
            names.extend(scan(&y.path));
        }
        names
    }

    /// Returns true if every reference was resolved.
    pub fn is_complete(&self) -> bool {
        self.unresolved().is_empty()
    }

    /// Command tokens joined with single spaces.
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

/// Renders one executor with the given values.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use tesflow::workflow::{render_executor, Executor};
///
/// let executor = Executor::new(["gzip", "-c", "$$raw"]).with_stdout("$$packed");
/// let values = HashMap::from([("raw".to_string(), "/in/a.txt".to_string())]);
///
/// let rendered = render_executor(&executor, &values);
/// assert_eq!(rendered.command, vec!["gzip", "-c", "/in/a.txt"]);
/// assert!(rendered.unresolved().contains("packed"));
/// ```
pub fn render_executor(executor: &Executor, values: &HashMap<String, String>) -> RenderedExecutor {
    let render = |template: &Option<String>| template.as_deref().map(|t| substitute(t, values));

    RenderedExecutor {
        image: executor.image.clone(),
        command: executor
            .command
            .iter()
            .map(|token| substitute(token, values))
            .collect(),
        stdin: render(&executor.stdin),
        stdout: render(&executor.stdout),
        stderr: render(&executor.stderr),
        yields: executor
            .yields
            .iter()
            .map(|y| Yield {
                name: y.name.clone(),
                path: substitute(&y.path, values),
            })
            .collect(),
    }
}
