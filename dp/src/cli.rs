//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::domain::{PlanStatus, Specialist};

/// docplan - request classification and document execution planning
#[derive(Parser)]
#[command(
    name = "dp",
    about = "Classify customer-success requests and plan the documents that answer them",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Classify a request without creating a plan
    Classify {
        /// Free-text request
        query: String,

        /// Specialist the request was routed through
        #[arg(short, long)]
        specialist: Option<Specialist>,

        /// Customer entity the request is about
        #[arg(short, long)]
        entity: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: Format,
    },

    /// Classify a request and persist a pending execution plan
    Plan {
        /// Free-text request
        query: String,

        /// Customer entity the request is about
        #[arg(short, long)]
        entity: Option<String>,

        /// YAML methodology whose steps become the plan sections
        #[arg(short, long, value_name = "FILE")]
        methodology: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: Format,
    },

    /// Approve a pending plan
    Approve {
        /// Plan id
        plan_id: String,
    },

    /// Execute an approved plan
    Execute {
        /// Plan id
        plan_id: String,

        /// YAML section/destination overrides applied before execution
        #[arg(short, long, value_name = "FILE")]
        modifications: Option<PathBuf>,
    },

    /// Show a stored plan
    Show {
        /// Plan id
        plan_id: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: Format,
    },

    /// List stored plans
    List {
        /// Only plans in this status (pending, executing, completed, failed)
        #[arg(short, long)]
        status: Option<PlanStatus>,
    },

    /// List the task-type catalog
    Catalog,
}

/// Get the path to the log file
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docplan")
        .join("logs")
        .join("docplan.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// after_help text pointing at the log file
pub fn generate_after_help() -> String {
    format!("Logs are written to: {}\n", get_log_path().display())
}

/// Output format for classify/plan/show
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "Format::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
