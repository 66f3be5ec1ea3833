//! Command-line interface for phasespec
//! Rewrites phase-structured test files and inspects the result.
//!
//! Usage:
//!   phasespec transform `<path>` [--output `<file>`]   - Print or write the rewritten file
//!   phasespec source-map `<path>`                      - Print the line mapping as JSON
//!   phasespec check `<path>`...                        - Validate phase structure only
//!   phasespec truth-table --column `<name=v1,v2>`...   - Print a Where table of all combinations

use clap::{Arg, ArgAction, ArgMatches, Command};
use phasespec::{CompileHook, Pipeline, PipelineOptions, SourceMapRegistry, TruthTable};
use phasespec_config::{Loader, PhaseSpecConfig};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::process;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() {
    let matches = Command::new("phasespec")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Rewrites phase-structured tests into plain assertions and mock expectations")
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .help("Configuration file layered over the defaults"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log every pipeline stage"),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Reject test methods that are not phase-structured"),
        )
        .subcommand(
            Command::new("transform")
                .about("Rewrite a file and print the result")
                .arg(Arg::new("path").required(true).index(1))
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Write to this file instead of stdout"),
                ),
        )
        .subcommand(
            Command::new("source-map")
                .about("Rewrite a file and print its line mapping as JSON")
                .arg(Arg::new("path").required(true).index(1)),
        )
        .subcommand(
            Command::new("check")
                .about("Check that files rewrite cleanly")
                .arg(
                    Arg::new("paths")
                        .required(true)
                        .num_args(1..)
                        .index(1),
                ),
        )
        .subcommand(
            Command::new("truth-table")
                .about("Print every combination of column values as a Where table")
                .arg(
                    Arg::new("column")
                        .long("column")
                        .required(true)
                        .action(ArgAction::Append)
                        .help("Column and its values, e.g. 'valid=true,false'"),
                ),
        )
        .get_matches();

    let config = load_config(&matches);
    init_logging(&config, matches.get_flag("verbose"));

    match matches.subcommand() {
        Some(("transform", sub)) => handle_transform_command(&config, sub),
        Some(("source-map", sub)) => handle_source_map_command(&config, sub),
        Some(("check", sub)) => handle_check_command(&config, sub),
        Some(("truth-table", sub)) => handle_truth_table_command(sub),
        _ => unreachable!("clap requires a subcommand"),
    }
}

fn load_config(matches: &ArgMatches) -> PhaseSpecConfig {
    let mut loader = Loader::new().with_project_file(".");
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    if matches.get_flag("strict") {
        loader = loader
            .strict(true)
            .unwrap_or_else(|e| fail(format!("Invalid override: {}", e)));
    }
    loader
        .build()
        .unwrap_or_else(|e| fail(format!("Configuration error: {}", e)))
}

fn init_logging(config: &PhaseSpecConfig, verbose: bool) {
    let level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn pipeline(config: &PhaseSpecConfig, registry: Arc<SourceMapRegistry>) -> Pipeline {
    Pipeline::standard(
        PipelineOptions {
            strict: config.transform.strict,
            indent: config.output.indent,
        },
        registry,
    )
}

fn fail(message: String) -> ! {
    eprintln!("{}", message);
    process::exit(1);
}

/// Handle the transform command
fn handle_transform_command(config: &PhaseSpecConfig, matches: &ArgMatches) {
    let path = required(matches, "path");
    let source = read(path);
    let text = pipeline(config, Arc::new(SourceMapRegistry::new()))
        .transform(&source)
        .unwrap_or_else(|e| fail(format!("{}: {}", path, e)));

    match matches.get_one::<String>("output") {
        Some(output) => {
            fs::write(output, &text)
                .unwrap_or_else(|e| fail(format!("Error writing {}: {}", output, e)));
            debug!(output = output.as_str(), "wrote rewritten file");
        }
        None => print!("{}", text),
    }
}

/// Handle the source-map command
fn handle_source_map_command(config: &PhaseSpecConfig, matches: &ArgMatches) {
    let path = Path::new(required(matches, "path"));
    let registry = Arc::new(SourceMapRegistry::new());
    let artifact = CompileHook::new(config.hook_options(), registry.clone()).artifact_path(path);
    let artifact = artifact.to_string_lossy();

    pipeline(config, registry.clone())
        .transform_file(path, &artifact)
        .unwrap_or_else(|e| fail(format!("{}: {}", path.display(), e)));
    let Some(map) = registry.for_file_path(&artifact) else {
        fail(format!("{}: no source map was registered", path.display()));
    };
    let json = serde_json::to_string_pretty(map.as_ref())
        .unwrap_or_else(|e| fail(format!("Error formatting source map: {}", e)));
    println!("{}", json);
}

/// Handle the check command
fn handle_check_command(config: &PhaseSpecConfig, matches: &ArgMatches) {
    let pipeline = pipeline(config, Arc::new(SourceMapRegistry::new()));
    let mut failures = 0;
    for path in matches.get_many::<String>("paths").into_iter().flatten() {
        match pipeline.transform(&read(path)) {
            Ok(_) => println!("ok: {}", path),
            Err(e) => {
                failures += 1;
                eprintln!("{}: {}", path, e);
            }
        }
    }
    if failures > 0 {
        process::exit(1);
    }
}

/// Handle the truth-table command
fn handle_truth_table_command(matches: &ArgMatches) {
    let mut header = Vec::new();
    let mut values = HashMap::new();
    for column in matches.get_many::<String>("column").into_iter().flatten() {
        let Some((name, list)) = column.split_once('=') else {
            fail(format!("Column '{}' must look like name=v1,v2", column));
        };
        header.push(name.to_string());
        values.insert(
            name.to_string(),
            list.split(',').map(|value| value.trim().to_string()).collect(),
        );
    }
    println!("{}", TruthTable::new(header, &values));
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> &'a str {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .unwrap_or_else(|| fail(format!("Missing argument '{}'", name)))
}

fn read(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| fail(format!("Error reading {}: {}", path, e)))
}
