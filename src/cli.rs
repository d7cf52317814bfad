//! Command-line interface definition using clap.

use crate::config::DEFAULT_CONFIG_FILE;
use crate::task::Priority;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Ward task board for hospital administration
#[derive(Parser, Debug)]
#[command(name = "wardboard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to the config file
    #[arg(short, long, env = "WARDBOARD_CONFIG", default_value = DEFAULT_CONFIG_FILE, global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default config, settings and empty task file
    Init,

    /// Add a task to the board
    Add {
        /// Task title
        #[arg(required = true)]
        title: String,

        /// Column to put it in (default: first column)
        #[arg(long)]
        column: Option<String>,

        #[arg(short, long, default_value = "medium")]
        priority: Priority,

        #[arg(long, default_value = "")]
        category: String,

        /// Due date (YYYY-MM-DD)
        #[arg(short, long)]
        due: Option<NaiveDate>,

        #[arg(short, long)]
        assignee: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Print the board column by column
    Show,

    /// Print every task in board order
    List,

    /// Move a task to another column or position
    Move {
        /// Task ID
        #[arg(required = true)]
        task: String,

        /// Destination column; appended at the end unless --before/--after is given
        #[arg(long)]
        to_column: Option<String>,

        /// Place the task directly above this one
        #[arg(long, conflicts_with = "after")]
        before: Option<String>,

        /// Place the task directly below this one
        #[arg(long)]
        after: Option<String>,
    },

    /// Task counts per column and priority
    Stats,

    /// Interactive board (default)
    Tui,
}

impl Cli {
    pub fn log_level(&self) -> tracing::Level {
        crate::logging::level_for(self.verbose)
    }
}
