//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_FILE;

#[derive(Parser)]
#[command(name = "restraint")]
#[command(author, version, about = "Block distracting websites for a set time")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    pub config: PathBuf,

    /// Hosts file to manage (overrides the config file)
    #[arg(long, global = true)]
    pub hosts: Option<PathBuf>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug output)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Block the listed websites and wait until the timer ends
    Start {
        /// Block length, e.g. 45m or 1h30m (default from config)
        #[arg(short, long)]
        duration: Option<String>,

        /// Blocklist file (default from config)
        #[arg(short, long)]
        list: Option<PathBuf>,
    },

    /// Lift the current block now
    Stop,

    /// Show whether a block is active
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Continue a block left by an earlier run, or clear it if expired
    Resume,

    /// Print the host entries a blocklist compiles to
    Compile {
        /// Blocklist file (default from config)
        #[arg(short, long)]
        list: Option<PathBuf>,
    },

    /// Edit the blocklist
    List {
        #[command(subcommand)]
        action: ListAction,
    },

    /// Replace the hosts file with the copy taken before the last block
    RestoreBackup,

    /// Show version
    Version,
}

#[derive(Subcommand)]
pub enum ListAction {
    /// Print the blocklist
    Show,
    /// Add a website
    Add {
        /// Domain or URL, e.g. reddit.com
        domain: String,
    },
    /// Remove a website
    Remove {
        /// Domain or URL
        domain: String,
    },
}
