//! CLI arguments and subcommands for proctree-monitor.
//!
//! This module defines the command-line interface structure using the clap
//! library, including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
    Text,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "proctree-monitor",
    about = "Real-time process tree monitor with hierarchy analysis",
    long_about = "Real-time process tree monitor with hierarchy analysis.\n\n\
                  Polls the host process list on a fixed interval, tracks which \
                  processes appeared and vanished between snapshots, and answers \
                  ancestor/descendant/depth queries for any tracked pid.",
    version = "0.1.0",
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: OutputFormat,

    /// Poll interval in milliseconds (measured between cycle completions)
    #[arg(short = 'i', long)]
    pub interval_ms: Option<u64>,

    /// Capture timeout in seconds for one process listing
    #[arg(long)]
    pub capture_timeout_secs: Option<u64>,

    /// Root pid used for depth computation
    #[arg(long)]
    pub root: Option<String>,

    /// Enable the downstream register server
    #[arg(long)]
    pub enable_register: bool,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll continuously and print a summary per cycle (default)
    Watch {
        /// Stop after this many completed cycles (0 = run until Ctrl-C)
        #[arg(short = 'n', long, default_value_t = 0)]
        cycles: u64,

        /// Print cycle summaries as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Capture one snapshot and print the hierarchy view of a pid
    Analyze {
        /// Pid to analyze
        pid: String,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Capture one snapshot and print the process tree
    Tree {
        /// Maximum tree depth to print
        #[arg(long, default_value_t = 5)]
        max_depth: usize,

        /// Pid to start from (defaults to the configured root)
        #[arg(long)]
        from: Option<String>,
    },

    /// Capture one snapshot and report source health
    Check,

    /// Generate a default configuration file
    Config {
        /// Output file path
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: OutputFormat,
    },
}
