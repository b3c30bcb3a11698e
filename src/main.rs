//! tesflow CLI Entry Point
//!
//! Provides a command-line interface to the resolver.
//!
//! # Usage
//!
//! ```bash
//! # Print layers and the default execution order
//! tesflow workflow.yaml
//!
//! # Check an overridden order instead
//! tesflow workflow.yaml --order 0,2,1
//!
//! # Render commands with resolved values
//! tesflow workflow.yaml --set reads=/data/r1.fq --set report=/out/r.tgz
//!
//! # Machine-readable plan
//! tesflow workflow.json --json
//! ```

use std::collections::HashMap;
use std::env;
use std::process::ExitCode;

use colored::Colorize;
use log::{error, info};

use tesflow::workflow::{load_definition, render_executor, resolve, validate_order};
use tesflow::workflow::{ExecutionPlan, WorkflowDefinition};
use tesflow::{APP_NAME, VERSION};

/// Default definition file used when none is specified.
const DEFAULT_DEFINITION: &str = "workflow.yaml";

/// Command-line configuration parsed from arguments.
#[derive(Debug, Default)]
struct Config {
    definition_path: String,
    order: Option<Vec<usize>>,
    values: HashMap<String, String>,
    json: bool,
    verbose: bool,
}

impl Config {
    fn new() -> Self {
        Self {
            definition_path: DEFAULT_DEFINITION.to_string(),
            ..Self::default()
        }
    }
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: tesflow [OPTIONS] <DEFINITION_FILE>");
    println!();
    println!("Arguments:");
    println!("  <DEFINITION_FILE>   Path to workflow definition (.yaml, .yml or .json)");
    println!();
    println!("Options:");
    println!("  --order I,J,K       Validate this execution order instead of computing one");
    println!("  --set NAME=VALUE    Value for a $$NAME reference when rendering (repeatable)");
    println!("  --json              Print the plan (or the validated order) as JSON");
    println!("  --verbose           Enable debug logging");
    println!("  --help              Show this help message");
    println!("  --version           Show version information");
    println!();
    println!("Examples:");
    println!("  tesflow pipeline.yaml");
    println!("  tesflow pipeline.yaml --order 0,2,1");
    println!("  tesflow pipeline.yaml --set reads=/data/r1.fq");
}

/// Parses a comma-separated list of executor indices.
fn parse_order(text: &str) -> Result<Vec<usize>, String> {
    text.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse()
                .map_err(|_| format!("Invalid executor index in order: {}", part))
        })
        .collect()
}

/// Parses a `NAME=VALUE` pair.
fn parse_value(text: &str) -> Result<(String, String), String> {
    let (name, value) = text
        .split_once('=')
        .ok_or_else(|| format!("Expected NAME=VALUE, got: {}", text))?;
    if name.is_empty() {
        return Err(format!("Missing name in: {}", text));
    }
    Ok((name.to_string(), value.to_string()))
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut config = Config::new();
    let mut positional_seen = false;
    let mut i = 1; // Skip program name

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", APP_NAME, VERSION);
                std::process::exit(0);
            }
            "--json" => {
                config.json = true;
            }
            "--verbose" | "-v" => {
                config.verbose = true;
            }
            "--order" => {
                i += 1;
                if i >= args.len() {
                    return Err("--order requires a list of indices".to_string());
                }
                config.order = Some(parse_order(&args[i])?);
            }
            "--set" => {
                i += 1;
                if i >= args.len() {
                    return Err("--set requires a NAME=VALUE argument".to_string());
                }
                let (name, value) = parse_value(&args[i])?;
                config.values.insert(name, value);
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => {
                if positional_seen {
                    return Err(format!("Unexpected argument: {}", arg));
                }
                config.definition_path = arg.clone();
                positional_seen = true;
            }
        }
        i += 1;
    }

    if config.order.is_some() && !config.values.is_empty() {
        return Err("--set has no effect with --order; nothing is rendered".to_string());
    }

    Ok(config)
}

/// Prints the plan for humans, rendering commands with the given values.
fn print_plan(
    definition: &WorkflowDefinition,
    plan: &ExecutionPlan,
    values: &HashMap<String, String>,
) {
    println!();
    println!("{}", "Execution layers".bold());
    for (depth, layer) in plan.layers.iter().enumerate() {
        let members: Vec<String> = layer.iter().map(|i| i.to_string()).collect();
        println!("  {} {}", format!("[{}]", depth).cyan(), members.join(", "));
    }

    println!();
    println!("{}", "Execution order".bold());
    for (position, &index) in plan.order.iter().enumerate() {
        let Some(executor) = definition.executor(index) else {
            continue;
        };
        let rendered = render_executor(executor, values);
        println!(
            "  {:>3}. {} {}",
            position + 1,
            format!("#{}", index).green(),
            rendered.command_line()
        );
        if !values.is_empty() && !rendered.is_complete() {
            let missing: Vec<String> = rendered.unresolved().into_iter().collect();
            println!("       {} {}", "unresolved:".yellow(), missing.join(", "));
        }
    }
    println!();
}

/// Main application entry point.
fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    // Parse arguments
    let config = parse_arguments(&args).map_err(|e| {
        eprintln!("Error: {}", e);
        eprintln!();
        print_usage();
        e
    })?;

    setup_logging(config.verbose);

    let definition = load_definition(&config.definition_path).map_err(|e| {
        error!("Failed to load definition: {}", e);
        format!(
            "Could not load definition from '{}': {}",
            config.definition_path, e
        )
    })?;

    if let Some(order) = &config.order {
        info!("Validating supplied order {:?}", order);
        validate_order(&definition, order)?;
        if config.json {
            let report = serde_json::json!({ "order": order, "valid": true });
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("{} order {:?} is valid", "OK".green().bold(), order);
        }
        return Ok(());
    }

    let plan = resolve(&definition)?;

    if config.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&definition, &plan, &config.values);
    }

    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
