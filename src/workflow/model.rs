//! Workflow Data Model
//!
//! Core data structures representing a submitted workflow definition.
//! Executors are identified by their position in `executors`; there is no
//! separate ID.
//!
//! # Example YAML Format
//!
//! ```yaml
//! inputs:
//!   - name: reads
//!     path: s3://bucket/reads.fastq
//!
//! executors:
//!   - image: biocontainers/fastqc
//!     command: [fastqc, $$reads, -o, $$qc_dir]
//!     yields:
//!       - name: qc_dir
//!         path: /outputs/qc
//!
//!   - image: alpine
//!     command: [tar, czf, $$report, $$qc_dir]
//!     stderr: /logs/$$tar_log
//!     priority: 10
//!     yields:
//!       - name: report
//!         path: /outputs/report.tgz
//!       - name: tar_log
//!         path: /logs/tar.log
//!
//! outputs:
//!   - name: report
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::error::DefinitionError;
use super::metavars::is_valid_name;

/// A named item produced by one executor.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Yield {
    /// Name consumers reference as `$$name`
    pub name: String,

    /// Where the dispatcher collects the item from
    #[serde(default)]
    pub path: String,
}

/// A data item available before any executor runs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Input {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A data item that must exist once every executor has finished.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Output {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Represents a single container-command step.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Executor {
    /// Container image the dispatcher launches (passed through untouched)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Command tokens, may contain `$$name` references
    pub command: Vec<String>,

    /// Path template fed to the command's standard input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdin: Option<String>,

    /// Path template capturing standard output; may only reference own yields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,

    /// Path template capturing standard error; may only reference own yields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,

    /// Items this executor produces
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub yields: Vec<Yield>,

    /// Scheduling hint within a layer, higher runs earlier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<f64>,
}

impl Executor {
    /// Creates an executor from command tokens.
    ///
    /// # Example
    ///
    /// ```
    /// use tesflow::workflow::Executor;
    ///
    /// let executor = Executor::new(["sort", "$$unsorted"])
    ///     .with_stdout("/out/$$sorted")
    ///     .yielding("sorted", "/out/sorted.txt")
    ///     .with_priority(5.0);
    /// assert_eq!(executor.yield_names(), vec!["sorted"]);
    /// ```
    pub fn new<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            image: None,
            command: command.into_iter().map(Into::into).collect(),
            stdin: None,
            stdout: None,
            stderr: None,
            yields: Vec::new(),
            priority: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }

    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = Some(stdout.into());
        self
    }

    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = Some(stderr.into());
        self
    }

    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Declares an item this executor produces.
    pub fn yielding(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.yields.push(Yield {
            name: name.into(),
            path: path.into(),
        });
        self
    }

    /// Command tokens joined with single spaces.
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }

    /// Names of declared yields, in declaration order.
    pub fn yield_names(&self) -> Vec<&str> {
        self.yields.iter().map(|y| y.name.as_str()).collect()
    }
}

/// A complete workflow submission: executors plus boundary inputs/outputs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct WorkflowDefinition {
    #[serde(default)]
    pub executors: Vec<Executor>,

    #[serde(default)]
    pub inputs: Vec<Input>,

    #[serde(default)]
    pub outputs: Vec<Output>,
}

impl WorkflowDefinition {
    /// Creates a new empty definition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a definition from a list of executors.
    pub fn from_executors(executors: Vec<Executor>) -> Self {
        Self {
            executors,
            ..Self::default()
        }
    }

    /// Appends an executor and returns its index.
    pub fn add_executor(&mut self, executor: Executor) -> usize {
        self.executors.push(executor);
        self.executors.len() - 1
    }

    /// Declares a workflow input.
    pub fn with_input(mut self, name: impl Into<String>) -> Self {
        self.inputs.push(Input {
            name: name.into(),
            path: None,
            description: None,
        });
        self
    }

    /// Declares a workflow output.
    pub fn with_output(mut self, name: impl Into<String>) -> Self {
        self.outputs.push(Output {
            name: name.into(),
            path: None,
            description: None,
        });
        self
    }

    /// Gets an executor by index.
    pub fn executor(&self, index: usize) -> Option<&Executor> {
        self.executors.get(index)
    }

    pub fn input_names(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(|i| i.name.as_str())
    }

    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|o| o.name.as_str())
    }

    /// Returns the number of executors.
    pub fn len(&self) -> usize {
        self.executors.len()
    }

    /// Returns true if the definition has no executors.
    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }

    /// Checks field-level structure.
    ///
    /// Performs the following checks:
    /// 1. Every executor has at least one command token and a finite priority
    /// 2. Yield, input and output names are referenceable as `$$name`
    /// 3. Input names are unique, output names are unique
    ///
    /// Cross-executor consistency (duplicate yields, missing inputs, cycles)
    /// is the catalog builder's and planner's job.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        for (index, executor) in self.executors.iter().enumerate() {
            if executor.command.iter().all(|token| token.trim().is_empty()) {
                return Err(DefinitionError::EmptyCommand(index));
            }
            if executor.priority.is_some_and(|p| !p.is_finite()) {
                return Err(DefinitionError::InvalidPriority(index));
            }
            for y in &executor.yields {
                check_name("yield", &y.name)?;
            }
        }

        let mut seen = HashSet::new();
        for name in self.input_names() {
            check_name("input", name)?;
            if !seen.insert(name) {
                return Err(DefinitionError::DuplicateInput(name.to_string()));
            }
        }

        let mut seen = HashSet::new();
        for name in self.output_names() {
            check_name("output", name)?;
            if !seen.insert(name) {
                return Err(DefinitionError::DuplicateOutput(name.to_string()));
            }
        }

        Ok(())
    }
}

fn check_name(kind: &'static str, name: &str) -> Result<(), DefinitionError> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(DefinitionError::InvalidName {
            kind,
            name: name.to_string(),
        })
    }
}
