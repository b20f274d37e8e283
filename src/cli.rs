//! CLI argument parsing for the TypeBleed reconstructor

use clap::{ArgGroup, Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for reconstruction reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "typebleed")]
#[command(version)]
#[command(about = "Reconstruct rendered character sets from per-character font requests", long_about = None)]
#[command(group(ArgGroup::new("source").required(true).args(["log", "api"])))]
pub struct Cli {
    /// JSON-lines access log or collector journal to replay
    #[arg(short = 'l', long = "log", value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Live collector base URL (e.g., http://localhost:8080)
    #[arg(short = 'a', long = "api", value_name = "URL")]
    pub api: Option<String>,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Show every captured code point
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Restrict word inference to these vocabulary categories (repeatable)
    #[arg(short = 'c', long = "category", value_name = "NAME")]
    pub categories: Vec<String>,

    /// Words shown per category (default: replay_word_limit from config)
    #[arg(long = "limit", value_name = "N")]
    pub limit: Option<usize>,

    /// Engine configuration file (TOML)
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Vocabulary file (TOML), overrides the config and the built-in list
    #[arg(long = "vocabulary", value_name = "FILE")]
    pub vocabulary: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
