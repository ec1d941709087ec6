//! five-whys - 5 Whys root-cause analysis over MCP
//!
//! Runs as an MCP server on stdio by default, exposing a guided five-level
//! "why" interview as tools. With `--interactive` the same interview runs
//! directly in the terminal.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Invalid arguments, configuration or I/O failure

mod cli;
mod config;
mod engine;
mod error;
mod interactive;
mod mcp;
mod models;
mod report;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use engine::AnalysisEngine;
use interactive::SessionOptions;
use mcp::{get_tool_definitions, McpServer, ToolExecutor};
use report::RenderOptions;
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config and --list-tools early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }
    if args.list_tools {
        return handle_list_tools();
    }

    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(&args, &config);

    info!("five-whys v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    if !report::generator::is_valid_timestamp_format(&config.export.timestamp_format) {
        warn!(
            "Invalid timestamp format '{}', exports will use RFC 3339",
            config.export.timestamp_format
        );
    }

    let engine = AnalysisEngine::with_render_options(RenderOptions::from(&config.export));

    let outcome = if args.interactive {
        run_interactive(engine, &args, &config)
    } else {
        let mut server = McpServer::new(ToolExecutor::new(engine), &config.server);
        server.run_stdio().await
    };

    if let Err(e) = outcome {
        error!("five-whys failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .fivewhys.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the server name, export format and timestamps.");
    Ok(())
}

/// Handle --list-tools: print the tool catalogue as JSON.
fn handle_list_tools() -> Result<()> {
    let tools = serde_json::to_string_pretty(&get_tool_definitions())
        .context("Failed to serialize tool definitions")?;
    println!("{}", tools);
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr; stdout carries the MCP channel.
fn init_logging(args: &Args, config: &Config) {
    let level = if !args.quiet && config.general.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the interview in the terminal and deliver the export.
fn run_interactive(mut engine: AnalysisEngine, args: &Args, config: &Config) -> Result<()> {
    let options = SessionOptions {
        problem: args.problem.clone(),
        format: config.export.default_format,
    };

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let export = interactive::run_session(&mut engine, stdin.lock(), stdout.lock(), &options)?;

    let Some(export) = export else {
        println!("\nNo analysis to export.");
        return Ok(());
    };

    match args.output {
        Some(ref path) => {
            report::write_export(&export, path)?;
            println!(
                "\n✅ Analysis exported as {} to: {}",
                options.format,
                path.display()
            );
        }
        None => println!("\n{}", export),
    }

    if let Some(analysis) = engine.state().current_analysis.as_ref() {
        println!(
            "📊 {}: {}/{} questions answered",
            analysis.status_label(),
            analysis.answered_count(),
            models::MAX_DEPTH
        );
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is initialized, so problems are reported on stderr
/// directly.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Failed to load {}: {:#}. Using defaults.", CONFIG_FILE_NAME, e);
            Ok(Config::default())
        }
    }
}
