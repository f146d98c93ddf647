// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::default_config_path;
use crate::types::{Role, SeasonStatus};

/// Command-line arguments for `seasonflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "seasonflow",
    version,
    about = "Plan seasonal production tasks along their dependency graph.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path(), global = true)]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SEASONFLOW_LOG` or `info` is used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Who is acting; recorded in the activity log.
    #[arg(long, value_name = "ID", default_value = "cli", global = true)]
    pub actor: String,

    #[arg(long, value_enum, value_name = "ROLE", default_value = "member", global = true)]
    pub role: RoleArg,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Parse and validate the config, print the template library.
    Check,

    /// Write every configured template into the store.
    SyncTemplates,

    /// Create a season and materialize its snapshot.
    CreateSeason {
        #[arg(long)]
        name: String,
        #[arg(long)]
        buyer: String,
    },

    /// Complete a task and/or change its remarks.
    Update {
        /// Season name.
        #[arg(long)]
        season: String,
        /// Order code of the task inside the season.
        #[arg(long)]
        task: String,
        /// `YYYY-MM-DD` or RFC 3339.
        #[arg(long, value_name = "DATE")]
        completed_on: Option<String>,
        #[arg(long)]
        remarks: Option<String>,
    },

    /// Change a season's status.
    Status {
        #[arg(long)]
        season: String,
        #[arg(long, value_enum)]
        to: StatusArg,
    },

    /// Attach a file to a task.
    Attach {
        #[arg(long)]
        season: String,
        #[arg(long)]
        task: String,
        #[arg(long, value_name = "PATH")]
        file: PathBuf,
    },

    /// Print a season's snapshot.
    Show {
        #[arg(long)]
        season: String,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum RoleArg {
    Member,
    Manager,
    Admin,
}

impl From<RoleArg> for Role {
    fn from(r: RoleArg) -> Self {
        match r {
            RoleArg::Member => Role::Member,
            RoleArg::Manager => Role::Manager,
            RoleArg::Admin => Role::Admin,
        }
    }
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum StatusArg {
    Open,
    OnHold,
    Closed,
    Canceled,
}

impl From<StatusArg> for SeasonStatus {
    fn from(s: StatusArg) -> Self {
        match s {
            StatusArg::Open => SeasonStatus::Open,
            StatusArg::OnHold => SeasonStatus::OnHold,
            StatusArg::Closed => SeasonStatus::Closed,
            StatusArg::Canceled => SeasonStatus::Canceled,
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
