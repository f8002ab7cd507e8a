//! Binary entry point for graphkv.
//!
//! Runs single CRUD operations through the same binding a workload harness
//! uses, which makes it handy for smoke-testing a Neo4j deployment.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use graphkv::config::GraphkvConfig;
use graphkv::observability::{self, LoggingConfig};
use graphkv::{Db, FieldSet, GraphContext, Status};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

/// graphkv - Neo4j binding for key-value workload benchmarks.
#[derive(Parser)]
#[command(name = "graphkv")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Harness property such as `neo4j.url=bolt://db:7687`. Repeatable.
    #[arg(short = 'p', long = "property", global = true, value_parser = parse_property)]
    properties: Vec<(String, String)>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Open the connection and run a connectivity probe.
    Check,

    /// Read one record.
    Read {
        /// Table (node label).
        table: String,
        /// Record key.
        key: String,
        /// Fields to return (comma-separated). All fields when omitted.
        #[arg(short, long, value_delimiter = ',')]
        fields: Option<Vec<String>>,
    },

    /// Read records in key order.
    Scan {
        /// Table (node label).
        table: String,
        /// First key to include.
        start_key: String,
        /// Maximum number of records.
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,
        /// Fields to return (comma-separated). All fields when omitted.
        #[arg(short, long, value_delimiter = ',')]
        fields: Option<Vec<String>>,
    },

    /// Insert a record.
    Insert {
        /// Table (node label).
        table: String,
        /// Record key.
        key: String,
        /// Field values as `field=value`.
        #[arg(value_parser = parse_property)]
        values: Vec<(String, String)>,
    },

    /// Replace a record's fields.
    Update {
        /// Table (node label).
        table: String,
        /// Record key.
        key: String,
        /// Field values as `field=value`.
        #[arg(value_parser = parse_property)]
        values: Vec<(String, String)>,
    },

    /// Delete a record.
    Delete {
        /// Table (node label).
        table: String,
        /// Record key.
        key: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref(), &cli.properties) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let logging = LoggingConfig::from_settings(Some(&config.logging), cli.verbose);
    if let Err(e) = observability::init_logging(logging) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli.command, config) {
        Ok(status) if status.is_ok() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command and prints its JSON result.
fn run_command(command: Commands, config: GraphkvConfig) -> graphkv::Result<Status> {
    let context = Arc::new(GraphContext::neo4j(config.connection));
    let mut client = context.client();
    client.init()?;

    let (status, mut output) = match command {
        Commands::Check => (Status::Ok, json!({ "url": context.settings().url })),
        Commands::Read { table, key, fields } => {
            let fields = fields.map(|f| f.into_iter().collect::<HashSet<_>>());
            let mut record = FieldSet::new();
            let status = client.read(&table, &key, fields.as_ref(), &mut record);
            (status, json!({ "record": record }))
        },
        Commands::Scan {
            table,
            start_key,
            count,
            fields,
        } => {
            let fields = fields.map(|f| f.into_iter().collect::<HashSet<_>>());
            let mut records = Vec::new();
            let status = client.scan(&table, &start_key, count, fields.as_ref(), &mut records);
            (status, json!({ "records": records }))
        },
        Commands::Insert { table, key, values } => {
            (client.insert(&table, &key, &values.into_iter().collect()), json!({}))
        },
        Commands::Update { table, key, values } => {
            (client.update(&table, &key, &values.into_iter().collect()), json!({}))
        },
        Commands::Delete { table, key } => {
            (client.delete(&table, &key), json!({}))
        },
    };

    client.cleanup()?;

    output["status"] = json!(status);
    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("Failed to render result: {e}"),
    }
    Ok(status)
}

/// Loads configuration: explicit file, `GRAPHKV_CONFIG_PATH`, or the default
/// location, then environment overrides, then `-p` properties.
fn load_config(
    path: Option<&str>,
    properties: &[(String, String)],
) -> graphkv::Result<GraphkvConfig> {
    let config = match path {
        Some(config_path) => GraphkvConfig::load_from_file(Path::new(config_path))?.with_env_overrides(),
        None => GraphkvConfig::load_default(),
    };

    let properties: HashMap<String, String> = properties.iter().cloned().collect();
    config.with_properties(&properties)
}

/// Parses `key=value`.
fn parse_property(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
