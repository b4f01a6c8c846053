//! CLI argument definitions using clap
//!
//! Commands:
//! - segquorum decode --content <c>
//! - segquorum form --content <c> [--volume-type T]
//! - segquorum check-write --content <c> --write-quorum N ...
//! - segquorum history --config <path> --segment <id>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// segquorum - inspect segment memberships and their I/O quorum policy
#[derive(Parser, Debug)]
#[command(name = "segquorum")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a membership content string
    Decode {
        /// Membership in persisted content form
        #[arg(long)]
        content: String,
    },

    /// Classify a membership into its segment form
    Form {
        /// Membership in persisted content form
        #[arg(long)]
        content: String,

        /// Volume type (REGULAR, SMALL or LARGE)
        #[arg(long, default_value = "REGULAR")]
        volume_type: String,
    },

    /// Evaluate the generic write quorum for a set of acknowledgements
    CheckWrite {
        /// Membership in persisted content form
        #[arg(long)]
        content: String,

        #[arg(long)]
        write_quorum: u32,

        #[arg(long, default_value_t = 0)]
        good_secondaries: u32,

        #[arg(long, default_value_t = 0)]
        good_joining: u32,

        #[arg(long, default_value_t = 0)]
        good_arbiters: u32,
    },

    /// Print the latest persisted membership of a segment
    History {
        /// Path to configuration file
        #[arg(long, default_value = "./segquorum.json")]
        config: PathBuf,

        #[arg(long)]
        segment: u64,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
