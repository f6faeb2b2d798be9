//! Command-line front end for the intent parser.
//!
//! # Usage
//!
//! ```bash
//! # Parse one sentence
//! pm_intent_cli parse "passe les projets en cours en annulé"
//!
//! # Parse with known collaborators and an English query
//! pm_intent_cli parse "list projects with Nina" --collab Nina
//!
//! # Route a sequence of sentences against a project list (JSON array)
//! pm_intent_cli route --projects projects.json "liste les projets terminés" "met les à 80%"
//!
//! # Untyped JSON payload from stdin
//! echo '{"query": "combien de projets ?"}' | pm_intent_cli json
//! ```
//!
//! Logging follows `RUST_LOG`; a `.env` file is loaded when present.

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pm_intent::{
    CommandRouter, ParseContext, ParserConfig, Project, QueryParser, RouteContext,
};

#[derive(Parser)]
#[command(name = "pm_intent_cli")]
#[command(version = "0.1.0")]
#[command(about = "Parse and route project-management commands")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML parser configuration (defaults, then PM_INTENT_* variables)
    #[arg(long, global = true, env = "PM_INTENT_CONFIG")]
    config: Option<PathBuf>,

    /// Compact JSON instead of pretty-printed
    #[arg(long, global = true)]
    compact: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse one sentence into a structured command
    Parse {
        query: String,

        /// Known collaborator (repeatable)
        #[arg(long = "collab")]
        collabs: Vec<String>,

        /// Known style (repeatable)
        #[arg(long = "style")]
        styles: Vec<String>,
    },

    /// Route sentences in order, sharing conversation memory
    Route {
        /// JSON file holding the project list
        #[arg(short, long)]
        projects: PathBuf,

        #[arg(long, default_value = "cli")]
        user: String,

        #[arg(required = true)]
        queries: Vec<String>,
    },

    /// Parse an untyped JSON payload read from stdin
    Json,
}

fn load_config(path: Option<&PathBuf>) -> Result<ParserConfig> {
    match path {
        Some(path) => {
            let yaml = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            ParserConfig::from_yaml_str(&yaml)
        }
        None => Ok(ParserConfig::from_env()?),
    }
}

fn print_json<T: serde::Serialize>(value: &T, compact: bool) -> Result<()> {
    let out = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", out);
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Parse {
            query,
            collabs,
            styles,
        } => {
            let parser = QueryParser::new(config)?;
            let result = parser.parse(
                &query,
                &ParseContext {
                    available_collabs: &collabs,
                    available_styles: &styles,
                    ..Default::default()
                },
            );
            print_json(&result, cli.compact)
        }
        Commands::Route {
            projects,
            user,
            queries,
        } => {
            let raw = std::fs::read_to_string(&projects)
                .with_context(|| format!("Failed to read projects {}", projects.display()))?;
            let projects: Vec<Project> =
                serde_json::from_str(&raw).context("Projects file must be a JSON array")?;

            let mut collabs: Vec<String> = projects.iter().filter_map(|p| p.collab.clone()).collect();
            collabs.sort();
            collabs.dedup();
            let mut styles: Vec<String> = projects.iter().filter_map(|p| p.style.clone()).collect();
            styles.sort();
            styles.dedup();

            let router = CommandRouter::with_config(config)?;
            let ctx = RouteContext {
                user_id: user,
                projects,
                available_collabs: collabs,
                available_styles: styles,
                ..Default::default()
            };
            for query in &queries {
                let result = router.route(query, &ctx);
                print_json(&result, cli.compact)?;
            }
            Ok(())
        }
        Commands::Json => {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input)?;
            let payload: serde_json::Value =
                serde_json::from_str(&input).context("stdin is not valid JSON")?;
            let parser = QueryParser::new(config)?;
            print_json(&parser.parse_value(&payload), cli.compact)
        }
    }
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
