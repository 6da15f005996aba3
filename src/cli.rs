//! CLI argument parsing for the evidence store.
//!
//! The CLI is thin: it parses arguments and hands them to `EvidenceService`,
//! so every rule is enforced in the library.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "evlog",
    version,
    about = "Finalize health logs, record revisions, and build submission packs",
    after_help = "Examples:\n  evlog log save --id 2024-03-04 --type daily --file day.json\n  evlog log finalize --id 2024-03-04 --type daily --profile me\n  evlog log revise --id 2024-03-04 --type daily --profile me --file fixed.json --category incorrect_value --note \"Pain score was entered one step too low\"\n  evlog pack create --profile me --title \"March\" --start 2024-03-01 --end 2024-03-31 --daily 2024-03-04",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Evidence store directory (defaults to the platform data directory)
    #[arg(long, value_name = "DIR", global = true)]
    pub store: Option<PathBuf>,

    /// Emit debug logs to stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evidence mode on/off
    #[command(subcommand)]
    Mode(ModeCommand),
    /// Save, finalize, and revise logs
    #[command(subcommand)]
    Log(LogCommand),
    /// Build and read submission packs
    #[command(subcommand)]
    Pack(PackCommand),
}

#[derive(Subcommand, Debug)]
pub enum ModeCommand {
    /// Turn evidence mode on
    Enable {
        #[arg(long, value_name = "ID")]
        profile: String,
    },
    /// Turn evidence mode off
    Disable,
    /// Show the evidence mode config
    Status,
}

/// Identifies one log.
#[derive(Args, Debug)]
pub struct LogRef {
    /// Log id
    #[arg(long, value_name = "ID")]
    pub id: String,

    /// Log type: daily or activity
    #[arg(long = "type", value_name = "TYPE")]
    pub log_type: String,
}

#[derive(Subcommand, Debug)]
pub enum LogCommand {
    /// Save a draft log from a JSON file (refused once finalized)
    Save {
        #[command(flatten)]
        log: LogRef,
        /// JSON file with the log content
        #[arg(long, value_name = "PATH")]
        file: PathBuf,
    },
    /// Finalize a log; this cannot be undone
    Finalize {
        #[command(flatten)]
        log: LogRef,
        #[arg(long, value_name = "ID")]
        profile: String,
    },
    /// Show finalization state and revision count
    Status {
        #[arg(long, value_name = "ID")]
        id: String,
    },
    /// Record a revision to a finalized log and apply it
    Revise(ReviseArgs),
    /// List revisions for a log, newest first
    Revisions {
        #[arg(long, value_name = "ID")]
        id: String,
    },
    /// List finalized logs
    Finalized {
        /// Only list this log type
        #[arg(long = "type", value_name = "TYPE")]
        log_type: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct ReviseArgs {
    #[command(flatten)]
    pub log: LogRef,

    #[arg(long, value_name = "ID")]
    pub profile: String,

    /// JSON file with the corrected log content
    #[arg(long, value_name = "PATH")]
    pub file: PathBuf,

    /// Reason category (typo_correction, missing_detail, late_entry, clarification, incorrect_value, other)
    #[arg(long, value_name = "CATEGORY")]
    pub category: String,

    /// Neutral reason for the change (at least 20 characters)
    #[arg(long, value_name = "TEXT")]
    pub note: Option<String>,

    /// Short summary of what changed
    #[arg(long, value_name = "TEXT")]
    pub summary: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum PackCommand {
    /// Create an immutable submission pack
    Create(PackCreateArgs),
    /// List submission packs
    List {
        #[arg(long, value_name = "ID")]
        profile: Option<String>,
    },
    /// Show one submission pack
    Show {
        #[arg(long, value_name = "ID")]
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct PackCreateArgs {
    #[arg(long, value_name = "ID")]
    pub profile: String,

    #[arg(long, value_name = "TEXT")]
    pub title: String,

    /// First day covered (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub start: String,

    /// Last day covered (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub end: String,

    /// Finalized daily log id to include (repeatable)
    #[arg(long = "daily", value_name = "ID")]
    pub daily: Vec<String>,

    /// Finalized activity log id to include (repeatable)
    #[arg(long = "activity", value_name = "ID")]
    pub activity: Vec<String>,

    /// Report id to include (repeatable)
    #[arg(long = "report", value_name = "ID")]
    pub report: Vec<String>,
}
