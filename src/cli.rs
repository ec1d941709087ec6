//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::ExportFormat;
use crate::report::generator::is_valid_timestamp_format;
use clap::Parser;
use std::path::PathBuf;

/// five-whys - guided 5 whys root-cause analysis
///
/// Runs as an MCP server on stdio by default, exposing the interview as
/// tools. Use --interactive to run the interview in the terminal instead.
///
/// Examples:
///   five-whys
///   five-whys --interactive
///   five-whys --interactive --problem "Server crashed" --format text
///   five-whys --interactive --output analysis.md
///   five-whys --list-tools
///   five-whys --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .fivewhys.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Run the interview in the terminal instead of serving MCP
    #[arg(short, long)]
    pub interactive: bool,

    /// Problem statement to start with (interactive mode)
    #[arg(short, long, value_name = "TEXT")]
    pub problem: Option<String>,

    /// Export format written when an interactive session ends
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<ExportFormat>,

    /// Write the interactive export to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// strftime pattern for timestamps in markdown and text exports
    #[arg(long, value_name = "FMT", env = "FIVEWHYS_TIMESTAMP_FORMAT")]
    pub timestamp_format: Option<String>,

    /// Print the MCP tool definitions as JSON and exit
    #[arg(long)]
    pub list_tools: bool,

    /// Generate a default .fivewhys.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config || self.list_tools {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.problem.is_some() && !self.interactive {
            return Err("--problem requires --interactive".to_string());
        }

        if let Some(ref problem) = self.problem {
            if problem.trim().is_empty() {
                return Err("Problem statement must not be empty".to_string());
            }
        }

        if self.output.is_some() && !self.interactive {
            return Err("--output requires --interactive".to_string());
        }

        if let Some(ref pattern) = self.timestamp_format {
            if !is_valid_timestamp_format(pattern) {
                return Err(format!("Invalid timestamp format: '{}'", pattern));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
impl Args {
    pub(crate) fn for_tests() -> Self {
        Args {
            config: None,
            verbose: false,
            quiet: false,
            interactive: false,
            problem: None,
            format: None,
            output: None,
            timestamp_format: None,
            list_tools: false,
            init_config: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args_are_valid() {
        assert!(Args::for_tests().validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = Args::for_tests();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_problem_requires_interactive() {
        let mut args = Args::for_tests();
        args.problem = Some("Server crashed".to_string());
        assert!(args.validate().is_err());

        args.interactive = true;
        assert!(args.validate().is_ok());

        args.problem = Some("   ".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_output_requires_interactive() {
        let mut args = Args::for_tests();
        args.output = Some(PathBuf::from("analysis.md"));
        assert!(args.validate().is_err());

        args.interactive = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_timestamp_format() {
        let mut args = Args::for_tests();
        args.timestamp_format = Some("%Y-%m-%d".to_string());
        assert!(args.validate().is_ok());

        args.timestamp_format = Some("%Q".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "five-whys",
            "--interactive",
            "--problem",
            "Server crashed",
            "--format",
            "text",
        ])
        .unwrap();
        assert!(args.interactive);
        assert_eq!(args.problem.as_deref(), Some("Server crashed"));
        assert_eq!(args.format, Some(ExportFormat::Text));
    }

    #[test]
    fn test_log_level() {
        let mut args = Args::for_tests();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
