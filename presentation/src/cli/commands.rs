//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use scout_domain::KeywordState;
use std::path::PathBuf;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Summary,
    /// JSON output
    Json,
}

/// Keyword state filter for `keywords list`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StateFilter {
    Discovered,
    Active,
    Used,
    Archived,
}

impl From<StateFilter> for KeywordState {
    fn from(filter: StateFilter) -> Self {
        match filter {
            StateFilter::Discovered => KeywordState::Discovered,
            StateFilter::Active => KeywordState::Active,
            StateFilter::Used => KeywordState::Used,
            StateFilter::Archived => KeywordState::Archived,
        }
    }
}

/// CLI arguments for trend-scout
#[derive(Parser, Debug)]
#[command(name = "trend-scout")]
#[command(author, version, about = "Multi-platform trend research with an evolving keyword catalog")]
#[command(long_about = r#"
trend-scout researches a batch of keywords across several platforms
(GitHub, YouTube, web search, arXiv, Hacker News, a research paper hub),
each reached through an MCP tool server.

A cycle has four phases:
1. Connect: start every enabled platform server
2. Research: run every keyword on every connected platform
3. Extract: derive new keywords from the collected content
4. Report: publish results to the configured sinks

Configuration files are loaded from (in priority order):
1. SCOUT_* environment variables (SCOUT_CYCLE__MAX_IN_FLIGHT=4)
2. --config <path>     Explicit config file
3. ./scout.toml        Project-level config
4. ~/.config/trend-scout/config.toml   Global config

Example:
  trend-scout run
  trend-scout keywords add "model context protocol" "graph rag"
  trend-scout keywords list --state archived
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary", global = true)]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one research cycle
    Run,

    /// Inspect or edit the keyword catalog
    Keywords {
        #[command(subcommand)]
        action: KeywordsCommand,
    },

    /// Show configured platforms and whether they are enabled
    Platforms,

    /// Show configuration file locations
    Config,
}

#[derive(Subcommand, Debug)]
pub enum KeywordsCommand {
    /// List keywords
    List {
        /// Only show keywords in this state
        #[arg(long, value_enum)]
        state: Option<StateFilter>,
    },

    /// Add keywords by hand
    Add {
        #[arg(required = true, value_name = "TEXT")]
        texts: Vec<String>,
    },

    /// Bring an archived keyword back
    Reactivate {
        #[arg(value_name = "TEXT")]
        text: String,
    },
}
