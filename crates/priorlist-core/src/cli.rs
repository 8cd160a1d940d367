use std::path::PathBuf;

use anyhow::anyhow;
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::sort::SortMode;
use crate::task::Priority;

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "priorlist",
    version,
    about = "PriorList: prioritized personal task list",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Configuration overrides, KEY=VALUE, repeatable.
    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    /// Alternate rc file.
    #[arg(long = "rcfile", global = true)]
    pub rcfile: Option<PathBuf>,

    /// Alternate data directory.
    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create an account and sign in.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign in with email and password.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out and drop the stored session.
    Logout,
    /// Show the signed-in account.
    Whoami,
    /// Request a password reset for an email address.
    ResetPassword {
        #[arg(long)]
        email: String,
    },
    /// Change the password of the signed-in account.
    Passwd {
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm: String,
    },
    /// Show tasks.
    List {
        /// Ordering: default, urgents, a-z, deadline. Persisted for next time.
        #[arg(long)]
        sort: Option<SortMode>,
        /// Case- and accent-insensitive title filter.
        #[arg(long)]
        search: Option<String>,
        /// Show the archive instead of the active list.
        #[arg(long)]
        archived: bool,
    },
    /// Add a task.
    Add {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// YYYY-MM-DD
        #[arg(long)]
        deadline: Option<NaiveDate>,
        #[arg(long, default_value = "medium")]
        priority: Priority,
    },
    /// Edit a task's fields.
    Edit {
        /// Task id, or an unambiguous prefix of one.
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        deadline: Option<NaiveDate>,
        /// Remove the deadline.
        #[arg(long, conflicts_with = "deadline")]
        clear_deadline: bool,
        #[arg(long)]
        priority: Option<Priority>,
    },
    /// Mark a task completed.
    Done { id: String },
    /// Mark a task not completed.
    Undone { id: String },
    /// Archive a completed task.
    Archive { id: String },
    /// Delete a task. Asks for --yes unless given.
    Delete {
        id: String,
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
    /// Permanently delete every archived task.
    ClearArchived,
    /// Set and persist the ordering without listing.
    Sort { mode: SortMode },
}

impl clap::builder::ValueParserFactory for SortMode {
    type Parser = clap::builder::ValueParser;

    fn value_parser() -> Self::Parser {
        clap::builder::ValueParser::new(|s: &str| s.parse::<SortMode>().map_err(|e| e.to_string()))
    }
}

impl clap::builder::ValueParserFactory for Priority {
    type Parser = clap::builder::ValueParser;

    fn value_parser() -> Self::Parser {
        clap::builder::ValueParser::new(|s: &str| s.parse::<Priority>().map_err(|e| e.to_string()))
    }
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("priorlist_core={default_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("failed to initialize tracing: {err}"))?;

    Ok(())
}
